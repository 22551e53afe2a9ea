//! Probe runner.
//!
//! Walks a tier's format candidates in order and runs a metadata-only
//! probe for each until one is accepted. Job admission and size reporting
//! share [`ProbeRunner::first_viable`]; they only differ in what counts as
//! an acceptable probe.

mod sizes;

use std::sync::Arc;

use fetchq_core::{FetchBackend, FormatCandidate, ProbeOutput, QualityTier, QueueError, candidates_for};

pub use sizes::{SizeReport, TierSize};

/// Outcome of resolving a tier against a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFormat {
    pub tier: QualityTier,
    pub candidate: FormatCandidate,
    /// Filename the worker reported for the accepted selector.
    pub filename: String,
    pub size_bytes: Option<u64>,
    /// Candidates probed, the accepted one included.
    pub attempts: usize,
}

impl ResolvedFormat {
    pub fn selector(&self) -> &str {
        &self.candidate.selector
    }
}

/// Runs probes through a [`FetchBackend`]. Holds no state of its own.
#[derive(Clone)]
pub struct ProbeRunner {
    backend: Arc<dyn FetchBackend>,
}

impl ProbeRunner {
    pub fn new(backend: Arc<dyn FetchBackend>) -> Self {
        Self { backend }
    }

    /// Pick the first candidate whose probe succeeds with a filename.
    ///
    /// # Errors
    ///
    /// [`QueueError::NoViableFormat`] when every candidate failed.
    pub async fn resolve(&self, url: &str, tier: QualityTier) -> Result<ResolvedFormat, QueueError> {
        self.first_viable(url, tier, |output| !output.filename.trim().is_empty())
            .await
    }

    /// Exact size for `tier`, or `None` when no candidate reports one.
    ///
    /// Never estimates: a candidate without a positive size is skipped
    /// like a failed probe.
    pub async fn exact_size(&self, url: &str, tier: QualityTier) -> Option<u64> {
        self.first_viable(url, tier, |output| output.size_bytes.is_some_and(|n| n > 0))
            .await
            .ok()
            .and_then(|resolved| resolved.size_bytes)
    }

    /// Shared candidate walk; `accept` decides whether a successful probe
    /// is good enough to stop at.
    pub async fn first_viable<F>(
        &self,
        url: &str,
        tier: QualityTier,
        accept: F,
    ) -> Result<ResolvedFormat, QueueError>
    where
        F: Fn(&ProbeOutput) -> bool + Send + Sync,
    {
        let candidates = candidates_for(tier);
        let total = candidates.len();

        for (index, candidate) in candidates.into_iter().enumerate() {
            match self.backend.probe(url, &candidate.selector).await {
                Ok(output) if accept(&output) => {
                    tracing::debug!(
                        target: "fetchq.probe",
                        tier = %tier,
                        selector = %candidate.selector,
                        attempt = index + 1,
                        "Format accepted"
                    );
                    return Ok(ResolvedFormat {
                        tier,
                        candidate,
                        filename: output.filename.trim().to_string(),
                        size_bytes: output.size_bytes,
                        attempts: index + 1,
                    });
                }
                Ok(_) => {
                    tracing::debug!(
                        target: "fetchq.probe",
                        tier = %tier,
                        selector = %candidate.selector,
                        "Probe succeeded but was not usable"
                    );
                }
                Err(e) => {
                    tracing::debug!(
                        target: "fetchq.probe",
                        tier = %tier,
                        selector = %candidate.selector,
                        error = %e,
                        "Probe failed"
                    );
                }
            }
        }

        tracing::warn!(
            target: "fetchq.probe",
            tier = %tier,
            url,
            tried = total,
            "No viable format"
        );
        Err(QueueError::no_viable_format(tier, total))
    }
}
