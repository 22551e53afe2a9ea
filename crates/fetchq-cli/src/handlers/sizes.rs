//! `sizes` - exact size per quality tier.

use anyhow::Result;

use fetchq_core::utils::format_bytes;
use fetchq_download::{ProbeRunner, SizeReport};

use super::parse_source;
use crate::bootstrap::CliContext;

pub async fn execute(ctx: &CliContext, source: &str) -> Result<()> {
    let source = parse_source(source)?;
    let report = ProbeRunner::new(ctx.backend.clone())
        .probe_sizes(&source.url())
        .await;

    for line in render(&report) {
        println!("{line}");
    }
    Ok(())
}

pub fn render(report: &SizeReport) -> Vec<String> {
    report
        .sizes
        .iter()
        .map(|s| {
            let size = s.bytes.map_or_else(|| "unavailable".to_string(), format_bytes);
            format!("{:>6}  {size}", s.tier.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetchq_core::QualityTier;
    use fetchq_download::TierSize;

    #[test]
    fn unknown_sizes_are_marked_unavailable() {
        let report = SizeReport {
            sizes: vec![
                TierSize {
                    tier: QualityTier::P1080,
                    bytes: Some(47_395_635),
                },
                TierSize {
                    tier: QualityTier::P360,
                    bytes: None,
                },
            ],
        };

        assert_eq!(render(&report), [" 1080p  45.2 MB", "  360p  unavailable"]);
    }
}
