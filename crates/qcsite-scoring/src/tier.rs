use serde::{Deserialize, Serialize};

/// Recommendation tier derived from a warehouse score.
///
/// This is the only score→tier ladder in the workspace:
/// `>= 80` excellent, `>= 60` good, `>= 40` moderate, `>= 20` poor,
/// otherwise not recommended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTier {
    NotRecommended,
    Poor,
    Moderate,
    Good,
    Excellent,
}

impl RecommendationTier {
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => Self::Excellent,
            60..=79 => Self::Good,
            40..=59 => Self::Moderate,
            20..=39 => Self::Poor,
            _ => Self::NotRecommended,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Moderate => "moderate",
            Self::Poor => "poor",
            Self::NotRecommended => "not_recommended",
        }
    }

    /// Human-readable recommendation text for this tier.
    #[must_use]
    pub fn summary(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent - High priority warehouse location",
            Self::Good => "Good - Consider warehouse placement",
            Self::Moderate => "Moderate - Monitor for improvement",
            Self::Poor => "Poor - Low priority",
            Self::NotRecommended => "Not recommended - Insufficient data",
        }
    }
}

impl std::fmt::Display for RecommendationTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecommendationTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "excellent" => Ok(Self::Excellent),
            "good" => Ok(Self::Good),
            "moderate" => Ok(Self::Moderate),
            "poor" => Ok(Self::Poor),
            "not_recommended" => Ok(Self::NotRecommended),
            other => Err(format!("unknown recommendation tier: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_boundaries() {
        assert_eq!(RecommendationTier::from_score(100), RecommendationTier::Excellent);
        assert_eq!(RecommendationTier::from_score(80), RecommendationTier::Excellent);
        assert_eq!(RecommendationTier::from_score(79), RecommendationTier::Good);
        assert_eq!(RecommendationTier::from_score(60), RecommendationTier::Good);
        assert_eq!(RecommendationTier::from_score(59), RecommendationTier::Moderate);
        assert_eq!(RecommendationTier::from_score(40), RecommendationTier::Moderate);
        assert_eq!(RecommendationTier::from_score(39), RecommendationTier::Poor);
        assert_eq!(RecommendationTier::from_score(20), RecommendationTier::Poor);
        assert_eq!(RecommendationTier::from_score(19), RecommendationTier::NotRecommended);
        assert_eq!(RecommendationTier::from_score(0), RecommendationTier::NotRecommended);
    }

    #[test]
    fn tiers_order_by_quality() {
        assert!(RecommendationTier::Excellent > RecommendationTier::Good);
        assert!(RecommendationTier::Poor > RecommendationTier::NotRecommended);
    }

    #[test]
    fn string_round_trip_matches_serde_names() {
        for tier in [
            RecommendationTier::Excellent,
            RecommendationTier::Good,
            RecommendationTier::Moderate,
            RecommendationTier::Poor,
            RecommendationTier::NotRecommended,
        ] {
            let json = serde_json::to_string(&tier).unwrap();
            assert_eq!(json, format!("\"{}\"", tier.as_str()));
            assert_eq!(tier.as_str().parse::<RecommendationTier>().unwrap(), tier);
        }
    }

    #[test]
    fn unknown_tier_string_is_rejected() {
        assert!("high".parse::<RecommendationTier>().is_err());
    }
}
