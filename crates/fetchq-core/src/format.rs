//! Quality tier to format-selector policy.
//!
//! [`candidates_for`] maps a tier to an ordered list of selector expressions
//! for the worker's `--format` flag. The first entries match the tier
//! exactly; later entries degrade. No entry may exceed the requested tier,
//! with one exception: the lowest tier may fall back to the tier directly
//! above it as a documented last resort.
//!
//! Pure and deterministic. The list is built fresh on every call.

use serde::Serialize;

use crate::job::QualityTier;

/// Container preferred for direct playback.
const PREFERRED_EXT: &str = "mp4";

/// Floor height for the emergency selector.
const EMERGENCY_MIN_HEIGHT: u32 = 240;

/// Why a candidate sits where it does in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateKind {
    /// Height-capped, preferred container.
    Preferred,
    /// Height-capped, any container.
    AnyContainer,
    /// Separate video and audio streams merged by the worker.
    Combined,
    /// Lower quality than requested.
    Degraded,
    /// Above the requested tier; lowest tier only.
    LastResort,
    /// Smallest stream at or above a floor height.
    Emergency,
}

/// One selector expression plus the bound it guarantees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatCandidate {
    pub selector: String,
    pub kind: CandidateKind,
    /// Upper bound on frame height, when the selector enforces one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_cap: Option<u32>,
}

impl FormatCandidate {
    fn capped(selector: String, kind: CandidateKind, cap: u32) -> Self {
        Self {
            selector,
            kind,
            height_cap: Some(cap),
        }
    }

    fn uncapped(selector: impl Into<String>, kind: CandidateKind) -> Self {
        Self {
            selector: selector.into(),
            kind,
            height_cap: None,
        }
    }

    /// Whether the candidate can return something above `tier`.
    #[must_use]
    pub fn may_exceed(&self, tier: QualityTier) -> bool {
        match self.height_cap {
            Some(cap) => cap > tier.height(),
            // `worst` variants pick the smallest stream, so only the
            // unbounded emergency selector can overshoot.
            None => self.kind == CandidateKind::Emergency,
        }
    }
}

/// Ordered selector candidates for `tier`, best match first.
#[must_use]
pub fn candidates_for(tier: QualityTier) -> Vec<FormatCandidate> {
    let h = tier.height();
    let mut list = vec![
        FormatCandidate::capped(
            format!("best[height<={h}][ext={PREFERRED_EXT}]"),
            CandidateKind::Preferred,
            h,
        ),
        FormatCandidate::capped(format!("best[height<={h}]"), CandidateKind::AnyContainer, h),
        FormatCandidate::capped(
            format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]"),
            CandidateKind::Combined,
            h,
        ),
    ];

    if let Some(lower) = tier.lower() {
        let l = lower.height();
        list.push(FormatCandidate::capped(
            format!("best[height<={l}][ext={PREFERRED_EXT}]"),
            CandidateKind::Degraded,
            l,
        ));
        return list;
    }

    list.push(FormatCandidate::uncapped(
        format!("worst[ext={PREFERRED_EXT}]"),
        CandidateKind::Degraded,
    ));
    list.push(FormatCandidate::uncapped("worst", CandidateKind::Degraded));

    if let Some(upper) = tier.higher() {
        let u = upper.height();
        list.push(FormatCandidate::capped(
            format!("best[height<={u}][ext={PREFERRED_EXT}]"),
            CandidateKind::LastResort,
            u,
        ));
        list.push(FormatCandidate::capped(
            format!("best[height<={u}]"),
            CandidateKind::LastResort,
            u,
        ));
    }

    list.push(FormatCandidate::uncapped(
        format!("worst[height>={EMERGENCY_MIN_HEIGHT}]"),
        CandidateKind::Emergency,
    ));
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selectors(tier: QualityTier) -> Vec<String> {
        candidates_for(tier).into_iter().map(|c| c.selector).collect()
    }

    #[test]
    fn every_tier_has_candidates_with_exact_match_first() {
        for tier in QualityTier::ALL {
            let list = candidates_for(tier);
            assert!(!list.is_empty());
            assert_eq!(list[0].kind, CandidateKind::Preferred);
            assert_eq!(list[0].height_cap, Some(tier.height()));
            assert_eq!(
                list[0].selector,
                format!("best[height<={}][ext=mp4]", tier.height())
            );
        }
    }

    #[test]
    fn only_lowest_tier_may_exceed_and_only_by_one_tier() {
        for tier in QualityTier::ALL {
            for candidate in candidates_for(tier) {
                if !candidate.may_exceed(tier) {
                    continue;
                }
                assert!(tier.is_lowest(), "{tier} has {candidate:?}");
                assert!(matches!(
                    candidate.kind,
                    CandidateKind::LastResort | CandidateKind::Emergency
                ));
                if let Some(cap) = candidate.height_cap {
                    assert_eq!(Some(cap), tier.higher().map(QualityTier::height));
                }
            }
        }
    }

    #[test]
    fn upper_tiers_degrade_one_step_down() {
        assert_eq!(
            selectors(QualityTier::P1080),
            vec![
                "best[height<=1080][ext=mp4]",
                "best[height<=1080]",
                "bestvideo[height<=1080]+bestaudio/best[height<=1080]",
                "best[height<=720][ext=mp4]",
            ]
        );
        let last = candidates_for(QualityTier::P480).pop().unwrap();
        assert_eq!(last.selector, "best[height<=360][ext=mp4]");
        assert_eq!(last.kind, CandidateKind::Degraded);
    }

    #[test]
    fn lowest_tier_ends_with_emergency_choice() {
        let list = candidates_for(QualityTier::P360);
        assert_eq!(list.len(), 8);
        assert_eq!(list[3].selector, "worst[ext=mp4]");
        assert_eq!(list[5].selector, "best[height<=480][ext=mp4]");
        let last = list.last().unwrap();
        assert_eq!(last.selector, "worst[height>=240]");
        assert_eq!(last.kind, CandidateKind::Emergency);
    }

    #[test]
    fn no_unrestricted_best_anywhere() {
        for tier in QualityTier::ALL {
            assert!(!selectors(tier).iter().any(|s| s == "best"));
        }
    }

    #[test]
    fn lists_are_deterministic() {
        assert_eq!(
            candidates_for(QualityTier::P720),
            candidates_for(QualityTier::P720)
        );
    }
}
