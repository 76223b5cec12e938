//! Shared primitive types used across the entire generator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a synthetic user.
pub type UserId = String;

/// Opaque per-session identifier shared by all events in one session.
pub type SessionId = String;

/// Subscription level of a synthetic user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Free,
    Basic,
    Premium,
    Cancelled,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Free, Tier::Basic, Tier::Premium, Tier::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Basic => "Basic",
            Self::Premium => "Premium",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Lowercase plan name used by the `current_plan_tier` column.
    pub fn plan_name(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Basic => "basic",
            Self::Premium => "premium",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Basic | Self::Premium)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Behavioural classification within a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    ConversionReady,
    Champion,
    Engaged,
    Casual,
    AtRisk,
}

impl Segment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConversionReady => "conversion_ready",
            Self::Champion => "champion",
            Self::Engaged => "engaged",
            Self::Casual => "casual",
            Self::AtRisk => "at_risk",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product-led-growth trajectory label, derived from (tier, segment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Scenario {
    #[serde(rename = "CAC/Conversion")]
    CacConversion,
    #[serde(rename = "PLG/Upsell")]
    PlgUpsell,
    #[serde(rename = "Failed Conversion")]
    FailedConversion,
    Churn,
    Winback,
    Retention,
}

impl Scenario {
    /// Pure mapping; anything unmatched is Retention.
    pub fn derive(tier: Tier, segment: Segment) -> Self {
        match (tier, segment) {
            (Tier::Free, Segment::ConversionReady) => Self::CacConversion,
            (Tier::Basic, Segment::Champion) => Self::PlgUpsell,
            (Tier::Free, Segment::AtRisk) => Self::FailedConversion,
            (Tier::Basic | Tier::Premium, Segment::AtRisk) => Self::Churn,
            (Tier::Cancelled, _) => Self::Winback,
            _ => Self::Retention,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CacConversion => "CAC/Conversion",
            Self::PlgUpsell => "PLG/Upsell",
            Self::FailedConversion => "Failed Conversion",
            Self::Churn => "Churn",
            Self::Winback => "Winback",
            Self::Retention => "Retention",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementDepth {
    Surface,
    Moderate,
    Deep,
}

impl EngagementDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Surface => "surface",
            Self::Moderate => "moderate",
            Self::Deep => "deep",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Current,
    PastDue,
    Failed,
    #[serde(rename = "n/a")]
    NotApplicable,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::PastDue => "past_due",
            Self::Failed => "failed",
            Self::NotApplicable => "n/a",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageLimitProximity {
    Low,
    Medium,
    High,
    Exceeded,
}

impl UsageLimitProximity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Exceeded => "exceeded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCandidate {
    FreeToPaidCandidate,
    BasicToPremiumCandidate,
    ChurnRiskCandidate,
    WinbackCandidate,
    Stable,
}

impl TransitionCandidate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FreeToPaidCandidate => "free_to_paid_candidate",
            Self::BasicToPremiumCandidate => "basic_to_premium_candidate",
            Self::ChurnRiskCandidate => "churn_risk_candidate",
            Self::WinbackCandidate => "winback_candidate",
            Self::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSophistication {
    Basic,
    Intermediate,
    Advanced,
    Expert,
}

impl FeatureSophistication {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Expert => "expert",
        }
    }
}
