//! `probe` - resolve the format a job would use, without downloading.

use anyhow::Result;

use fetchq_core::QualityTier;
use fetchq_core::utils::format_bytes;
use fetchq_download::{ProbeRunner, ResolvedFormat};

use super::parse_source;
use crate::bootstrap::CliContext;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext, source: &str, tier: QualityTier) -> Result<()> {
    let source = parse_source(source)?;
    let probe = ProbeRunner::new(ctx.backend.clone());

    println!("Probing {} at {tier}...", source.url());
    let resolved = probe
        .resolve(&source.url(), tier)
        .await
        .map_err(CliError::from)?;

    for line in render(&resolved) {
        println!("{line}");
    }
    Ok(())
}

pub fn render(resolved: &ResolvedFormat) -> Vec<String> {
    vec![
        format!("Selector: {}", resolved.selector()),
        format!("Filename: {}", resolved.filename),
        format!(
            "Size:     {}",
            resolved.size_bytes.map_or_else(|| "unknown".to_string(), format_bytes)
        ),
        format!("Attempts: {}", resolved.attempts),
    ]
}
