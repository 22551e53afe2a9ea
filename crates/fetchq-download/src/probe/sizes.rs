//! Per-tier exact size reporting.

use futures_util::future::join_all;

use fetchq_core::QualityTier;
use fetchq_core::utils::format_bytes;

use super::ProbeRunner;

/// Probe result for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierSize {
    pub tier: QualityTier,
    pub bytes: Option<u64>,
}

/// Exact sizes for every tier, highest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeReport {
    pub sizes: Vec<TierSize>,
}

impl SizeReport {
    /// `(label, "45.2 MB")` for every tier with a known size.
    pub fn formatted(&self) -> impl Iterator<Item = (&'static str, String)> + '_ {
        self.sizes
            .iter()
            .filter_map(|s| s.bytes.map(|b| (s.tier.label(), format_bytes(b))))
    }

    /// Labels of tiers without a known size.
    pub fn unavailable(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sizes
            .iter()
            .filter(|s| s.bytes.is_none())
            .map(|s| s.tier.label())
    }
}

impl ProbeRunner {
    /// Probe every tier concurrently.
    pub async fn probe_sizes(&self, url: &str) -> SizeReport {
        let probes = QualityTier::ALL.into_iter().map(|tier| async move {
            TierSize {
                tier,
                bytes: self.exact_size(url, tier).await,
            }
        });
        SizeReport {
            sizes: join_all(probes).await,
        }
    }
}
