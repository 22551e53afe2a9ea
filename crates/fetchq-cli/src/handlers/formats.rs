//! `formats` - print the selector candidates for a tier.

use fetchq_core::{CandidateKind, QualityTier, candidates_for};

pub fn execute(tier: QualityTier) {
    for line in render(tier) {
        println!("{line}");
    }
}

/// One numbered line per candidate, in probe order.
pub fn render(tier: QualityTier) -> Vec<String> {
    let mut lines = vec![format!("Format candidates for {tier}:")];
    lines.extend(
        candidates_for(tier)
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:>2}. {:<52} {}", i + 1, c.selector, kind_label(c.kind))),
    );
    lines
}

const fn kind_label(kind: CandidateKind) -> &'static str {
    match kind {
        CandidateKind::Preferred => "preferred",
        CandidateKind::AnyContainer => "any container",
        CandidateKind::Combined => "merged streams",
        CandidateKind::Degraded => "degraded",
        CandidateKind::LastResort => "last resort (next tier up)",
        CandidateKind::Emergency => "emergency",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_tier_lists_exact_then_degraded() {
        let lines = render(QualityTier::P720);
        assert_eq!(lines[0], "Format candidates for 720p:");
        assert_eq!(lines.len(), 5);
        assert!(lines[1].contains("best[height<=720][ext=mp4]"));
        assert!(lines[1].ends_with("preferred"));
        assert!(lines[4].contains("best[height<=480][ext=mp4]"));
        assert!(lines[4].ends_with("degraded"));
    }

    #[test]
    fn lowest_tier_shows_last_resort_entries() {
        let lines = render(QualityTier::P360);
        assert!(lines.iter().any(|l| l.contains("last resort")));
        assert!(lines.last().unwrap().ends_with("emergency"));
    }
}
