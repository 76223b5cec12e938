//! Metric synthesis: derived business and ML-feature signals per event.
//!
//! Every function here is total: an unmapped tier/segment/event_type
//! combination resolves to a documented default instead of failing.
//!
//! Stream usage:
//!   - weighted stream: payment status, engagement depth.
//!   - uniform stream:  everything else (jitter, ranges, catalog picks).

use crate::{
    config::{DepthWeights, IntRange, RealRange, ReferenceTables, UsageProfile},
    profile::UserProfile,
    rng::RandomStreams,
    types::{
        EngagementDepth, FeatureSophistication, PaymentStatus, Priority, Scenario, Segment, Tier,
        UsageLimitProximity,
    },
};
use serde::Serialize;

// ── Documented fallbacks ─────────────────────────────────────────────────────

pub const DEFAULT_SEGMENT_SCORE: i64 = 50;
pub const DEFAULT_CONVERSION_BASE: i64 = 10;
pub const DEFAULT_UPSELL_BASE: i64 = 20;
pub const DEFAULT_ENGAGEMENT_BASE: i64 = 30;
pub const DEFAULT_HEALTH_RANGE: IntRange = IntRange::new(30, 60);
pub const DEFAULT_DEPTH_WEIGHTS: DepthWeights = DepthWeights::new(0.7, 0.3, 0.0);
pub const DEFAULT_CLV_MONTHS: i64 = 12;
pub const DEFAULT_NEXT_BEST_ACTION: &str = "standard_engagement";
pub const DEFAULT_FEATURE_NAME: &str = "General Feature";

/// Propensity scores never exceed this after jitter.
pub const PROPENSITY_CAP: i64 = 95;

const PAYMENT_WEIGHTS: [(PaymentStatus, f64); 3] = [
    (PaymentStatus::Current, 0.92),
    (PaymentStatus::PastDue, 0.06),
    (PaymentStatus::Failed, 0.02),
];

// ── Event-type sets ──────────────────────────────────────────────────────────

const FREE_BUYING_INTENT: &[&str] = &["usage_limit_hit", "premium_feature_explore", "pricing_page_view"];
const BASIC_BUYING_INTENT: &[&str] = &["enterprise_trial", "team_management_view", "api_exploration"];
const UPSELL_INTENT: &[&str] = &["advanced_feature_usage", "enterprise_trial", "team_management_view"];

const HOT_LEAD_EVENTS: &[&str] = &["usage_limit_hit", "pricing_page_view"];
const CRITICAL_EVENTS: &[&str] = &["support_ticket_create", "payment_issue_check", "competitor_comparison"];

const PREMIUM_EXPOSURE_EVENTS: &[&str] = &[
    "premium_feature_explore",
    "enterprise_trial",
    "advanced_analytics",
    "api_integration",
    "automation_setup",
];
const LIMIT_PRESSURE_EVENTS: &[&str] = &["core_feature_usage", "data_export"];
const VALUE_EVENTS: &[&str] = &[
    "insight_discovery",
    "workflow_success",
    "share_result",
    "success_showcase",
    "report_generate",
];
const VIRAL_EVENTS: &[&str] = &["external_demo", "advanced_sharing", "thought_leadership", "referral_program"];
const FREE_EXPANSION_EVENTS: &[&str] = &["premium_feature_explore", "pricing_page_view", "paywall_encounter"];
const BASIC_EXPANSION_EVENTS: &[&str] = &[
    "enterprise_trial",
    "team_management_view",
    "api_exploration",
    "advanced_feature_usage",
];
const FRICTION_EVENTS: &[&str] = &[
    "error_event",
    "feature_abandon",
    "payment_issue_check",
    "support_ticket_create",
];
const HELP_EVENTS: &[&str] = &["help_search", "support_ticket_create", "account_reactivation_view"];
const CHURN_EVENTS: &[&str] = &["cost_review", "competitor_comparison", "declining_usage", "data_export_final"];
const FREE_CONVERSION_EVENTS: &[&str] = &["usage_limit_hit", "premium_feature_explore", "pricing_page_view"];

/// Only these event types report monthly API usage.
pub const API_EVENTS: &[&str] = &["api_integration", "api_exploration"];

fn is_in(event_type: &str, set: &[&str]) -> bool {
    set.contains(&event_type)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ── Output bundles ───────────────────────────────────────────────────────────

/// Behavioural flags attached to every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlgSignals {
    pub premium_feature_exposure: bool,
    pub usage_limit_proximity:    UsageLimitProximity,
    pub value_realization_event:  bool,
    pub viral_behavior:           bool,
    pub expansion_signal:         bool,
    pub friction_encountered:     bool,
    pub help_seeking_behavior:    bool,
    pub churn_risk_indicator:     bool,
    pub conversion_signal:        bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessMetrics {
    pub current_plan_tier:       &'static str,
    pub subscription_tier:       Tier,
    pub mrr_contribution:        i64,
    pub arr_contribution:        i64,
    pub customer_lifetime_value: i64,
    pub account_health_score:    i64,
    pub engagement_score:        i64,
    pub seat_utilization:        f64,
    pub storage_utilization:     f64,
    pub api_usage_monthly:       i64,
    pub integration_count:       i64,
    pub support_ticket_count:    i64,
}

// ── Synthesizer ──────────────────────────────────────────────────────────────

pub struct MetricSynthesizer<'t> {
    tables: &'t ReferenceTables,
}

impl<'t> MetricSynthesizer<'t> {
    pub fn new(tables: &'t ReferenceTables) -> Self {
        Self { tables }
    }

    /// Base range per event type, scaled by the tier's performance multiplier.
    pub fn response_time_ms(&self, tier: Tier, event_type: &str, streams: &mut RandomStreams) -> i64 {
        let range = self
            .tables
            .response_time_ms
            .get(event_type)
            .copied()
            .unwrap_or(self.tables.default_response_ms);
        let multiplier = self.tables.response_multiplier.get(tier).copied().unwrap_or(1.0);
        let base = streams.uniform.uniform_int(range.lo, range.hi);
        (base as f64 * multiplier) as i64
    }

    pub fn payment_status(&self, tier: Tier, streams: &mut RandomStreams) -> PaymentStatus {
        match tier {
            Tier::Basic | Tier::Premium => streams
                .weighted
                .weighted_choice(&PAYMENT_WEIGHTS)
                .copied()
                .unwrap_or(PaymentStatus::Current),
            Tier::Free => PaymentStatus::NotApplicable,
            Tier::Cancelled => PaymentStatus::Cancelled,
        }
    }

    /// Base score plus jitter in [-10, 15]. Deliberately left unclamped,
    /// so values may fall outside [0, 100].
    pub fn churn_risk_score(&self, tier: Tier, segment: Segment, streams: &mut RandomStreams) -> i64 {
        let base = self
            .tables
            .churn_risk_base
            .get(tier, segment)
            .copied()
            .unwrap_or(DEFAULT_SEGMENT_SCORE);
        base + streams.uniform.uniform_int(-10, 15)
    }

    /// Free→paid or Basic→Premium propensity. Zero for Premium and Cancelled.
    pub fn conversion_propensity(
        &self,
        tier: Tier,
        segment: Segment,
        event_type: &str,
        streams: &mut RandomStreams,
    ) -> i64 {
        let boost = match tier {
            Tier::Free if is_in(event_type, FREE_BUYING_INTENT) => 20,
            Tier::Basic if is_in(event_type, BASIC_BUYING_INTENT) => 15,
            Tier::Free | Tier::Basic => 0,
            Tier::Premium | Tier::Cancelled => return 0,
        };
        let base = self
            .tables
            .conversion_base
            .get(tier, segment)
            .copied()
            .unwrap_or(DEFAULT_CONVERSION_BASE);
        (base + boost + streams.uniform.uniform_int(-10, 10)).min(PROPENSITY_CAP)
    }

    /// Basic→Premium upsell propensity. Zero for every other tier.
    pub fn upsell_propensity(
        &self,
        tier: Tier,
        segment: Segment,
        event_type: &str,
        streams: &mut RandomStreams,
    ) -> i64 {
        if tier != Tier::Basic {
            return 0;
        }
        let base = self
            .tables
            .upsell_base
            .get(tier, segment)
            .copied()
            .unwrap_or(DEFAULT_UPSELL_BASE);
        let boost = if is_in(event_type, UPSELL_INTENT) { 20 } else { 0 };
        (base + boost + streams.uniform.uniform_int(-5, 10)).min(PROPENSITY_CAP)
    }

    /// Base score plus jitter in [-10, 10]. Unclamped, like churn risk.
    pub fn retention_probability(&self, tier: Tier, segment: Segment, streams: &mut RandomStreams) -> i64 {
        let base = self
            .tables
            .retention_base
            .get(tier, segment)
            .copied()
            .unwrap_or(DEFAULT_SEGMENT_SCORE);
        base + streams.uniform.uniform_int(-10, 10)
    }

    pub fn engagement_depth(
        &self,
        _event_type: &str,
        tier: Tier,
        segment: Segment,
        streams: &mut RandomStreams,
    ) -> EngagementDepth {
        let weights = self
            .tables
            .engagement_depth
            .get(tier, segment)
            .copied()
            .unwrap_or(DEFAULT_DEPTH_WEIGHTS);
        let options = [
            (EngagementDepth::Surface, weights.surface),
            (EngagementDepth::Moderate, weights.moderate),
            (EngagementDepth::Deep, weights.deep),
        ];
        streams
            .weighted
            .weighted_choice(&options)
            .copied()
            .unwrap_or(EngagementDepth::Surface)
    }

    /// Uniform pick from the scenario's action list. `_event_type` is
    /// accepted for interface compatibility and ignored.
    pub fn next_best_action(
        &self,
        scenario: Scenario,
        _event_type: &str,
        streams: &mut RandomStreams,
    ) -> String {
        match self.tables.next_best_actions.get(&scenario) {
            Some(actions) if !actions.is_empty() => streams.uniform.choose(actions).clone(),
            _ => DEFAULT_NEXT_BEST_ACTION.to_string(),
        }
    }

    /// First matching rule wins.
    pub fn intervention_priority(&self, tier: Tier, segment: Segment, event_type: &str) -> Priority {
        if segment == Segment::AtRisk && tier.is_paid() {
            return Priority::High;
        }
        if tier == Tier::Free
            && segment == Segment::ConversionReady
            && is_in(event_type, HOT_LEAD_EVENTS)
        {
            return Priority::High;
        }
        if is_in(event_type, CRITICAL_EVENTS) {
            return Priority::High;
        }
        if tier.is_paid() && matches!(segment, Segment::Engaged | Segment::Casual) {
            return Priority::Medium;
        }
        if tier == Tier::Free && matches!(segment, Segment::ConversionReady | Segment::Engaged) {
            return Priority::Medium;
        }
        Priority::Low
    }

    pub fn plg_signals(
        &self,
        event_type: &str,
        tier: Tier,
        segment: Segment,
        _scenario: Scenario,
        streams: &mut RandomStreams,
    ) -> PlgSignals {
        let usage_limit_proximity = if tier == Tier::Free && segment == Segment::ConversionReady {
            if event_type == "usage_limit_hit" {
                UsageLimitProximity::Exceeded
            } else if is_in(event_type, LIMIT_PRESSURE_EVENTS) {
                *streams
                    .uniform
                    .choose(&[UsageLimitProximity::Medium, UsageLimitProximity::High])
            } else {
                UsageLimitProximity::Low
            }
        } else {
            UsageLimitProximity::Low
        };

        let expansion_signal = match tier {
            Tier::Free => is_in(event_type, FREE_EXPANSION_EVENTS),
            Tier::Basic => is_in(event_type, BASIC_EXPANSION_EVENTS),
            Tier::Premium | Tier::Cancelled => false,
        };

        PlgSignals {
            premium_feature_exposure: is_in(event_type, PREMIUM_EXPOSURE_EVENTS),
            usage_limit_proximity,
            value_realization_event: is_in(event_type, VALUE_EVENTS),
            viral_behavior: is_in(event_type, VIRAL_EVENTS),
            expansion_signal,
            friction_encountered: is_in(event_type, FRICTION_EVENTS),
            help_seeking_behavior: is_in(event_type, HELP_EVENTS),
            churn_risk_indicator: is_in(event_type, CHURN_EVENTS),
            conversion_signal: tier == Tier::Free && is_in(event_type, FREE_CONVERSION_EVENTS),
        }
    }

    pub fn business_metrics(
        &self,
        profile: &UserProfile,
        event_type: &str,
        streams: &mut RandomStreams,
    ) -> BusinessMetrics {
        let (tier, segment) = (profile.tier, profile.segment);
        let mrr = self.mrr(tier);
        let clv_months = self.tables.clv_months.get(tier).copied().unwrap_or(DEFAULT_CLV_MONTHS);

        let health = self
            .tables
            .health_score
            .get(tier, segment)
            .copied()
            .unwrap_or(DEFAULT_HEALTH_RANGE);
        let account_health_score = streams.uniform.uniform_int(health.lo, health.hi);

        let engagement_base = self
            .tables
            .engagement_base
            .get(tier, segment)
            .copied()
            .unwrap_or(DEFAULT_ENGAGEMENT_BASE);
        let engagement_score = (engagement_base + streams.uniform.uniform_int(-10, 15)).clamp(0, 100);

        let usage = self.usage_profile(tier);
        let seat_utilization = round2(
            streams
                .uniform
                .uniform_real(usage.seat_utilization.lo, usage.seat_utilization.hi),
        );
        let storage_utilization = round2(
            streams
                .uniform
                .uniform_real(usage.storage_utilization.lo, usage.storage_utilization.hi),
        );
        let api_usage_monthly = if is_in(event_type, API_EVENTS) {
            streams.uniform.uniform_int(usage.api_usage.lo, usage.api_usage.hi)
        } else {
            0
        };
        let integration_count = streams
            .uniform
            .uniform_int(usage.integrations.lo, usage.integrations.hi);
        let support_ticket_count = streams
            .uniform
            .uniform_int(usage.support_tickets.lo, usage.support_tickets.hi);

        BusinessMetrics {
            current_plan_tier: tier.plan_name(),
            subscription_tier: tier,
            mrr_contribution: mrr,
            arr_contribution: mrr * 12,
            customer_lifetime_value: mrr * clv_months,
            account_health_score,
            engagement_score,
            seat_utilization,
            storage_utilization,
            api_usage_monthly,
            integration_count,
            support_ticket_count,
        }
    }

    pub fn mrr(&self, tier: Tier) -> i64 {
        self.tables.mrr.get(tier).copied().unwrap_or(0)
    }

    /// Falls back to the Free row, then to an all-zero profile.
    fn usage_profile(&self, tier: Tier) -> UsageProfile {
        self.tables
            .usage
            .get(tier)
            .or_else(|| self.tables.usage.get(Tier::Free))
            .copied()
            .unwrap_or(UsageProfile {
                seat_utilization:    RealRange::new(0.0, 0.0),
                storage_utilization: RealRange::new(0.0, 0.0),
                api_usage:           IntRange::new(0, 0),
                integrations:        IntRange::new(0, 0),
                support_tickets:     IntRange::new(0, 0),
            })
    }

    pub fn feature_name(&self, event_type: &str) -> String {
        self.tables
            .feature_names
            .get(event_type)
            .cloned()
            .unwrap_or_else(|| DEFAULT_FEATURE_NAME.to_string())
    }

    /// First level whose list contains the event type; intermediate otherwise.
    pub fn feature_sophistication(&self, event_type: &str) -> FeatureSophistication {
        self.tables
            .feature_sophistication
            .iter()
            .find(|(_, events)| events.iter().any(|e| e == event_type))
            .map(|(level, _)| *level)
            .unwrap_or(FeatureSophistication::Intermediate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intervention_priority_cascade_order() {
        let tables = ReferenceTables::builtin();
        let m = MetricSynthesizer::new(&tables);

        assert_eq!(m.intervention_priority(Tier::Premium, Segment::AtRisk, "login"), Priority::High);
        assert_eq!(
            m.intervention_priority(Tier::Free, Segment::ConversionReady, "pricing_page_view"),
            Priority::High
        );
        assert_eq!(m.intervention_priority(Tier::Free, Segment::Casual, "competitor_comparison"), Priority::High);
        assert_eq!(m.intervention_priority(Tier::Basic, Segment::Casual, "login"), Priority::Medium);
        assert_eq!(m.intervention_priority(Tier::Free, Segment::Engaged, "login"), Priority::Medium);
        assert_eq!(m.intervention_priority(Tier::Premium, Segment::Champion, "login"), Priority::Low);
        assert_eq!(m.intervention_priority(Tier::Cancelled, Segment::AtRisk, "login"), Priority::Low);
    }

    #[test]
    fn feature_lookups_fall_back() {
        let tables = ReferenceTables::builtin();
        let m = MetricSynthesizer::new(&tables);

        assert_eq!(m.feature_name("automation_setup"), "Workflow Automation");
        assert_eq!(m.feature_name("not_an_event"), DEFAULT_FEATURE_NAME);
        assert_eq!(m.feature_sophistication("automation_setup"), FeatureSophistication::Expert);
        assert_eq!(m.feature_sophistication("not_an_event"), FeatureSophistication::Intermediate);
    }

    #[test]
    fn expansion_signal_depends_on_tier() {
        let tables = ReferenceTables::builtin();
        let m = MetricSynthesizer::new(&tables);
        let mut streams = RandomStreams::seeded(1);

        let free = m.plg_signals("pricing_page_view", Tier::Free, Segment::Casual, Scenario::Retention, &mut streams);
        let basic = m.plg_signals("pricing_page_view", Tier::Basic, Segment::Casual, Scenario::Retention, &mut streams);
        assert!(free.expansion_signal && free.conversion_signal);
        assert!(!basic.expansion_signal && !basic.conversion_signal);

        let basic_trial =
            m.plg_signals("enterprise_trial", Tier::Basic, Segment::Champion, Scenario::PlgUpsell, &mut streams);
        assert!(basic_trial.expansion_signal && basic_trial.premium_feature_exposure);
    }

    #[test]
    fn usage_limit_proximity_only_for_free_conversion_ready() {
        let tables = ReferenceTables::builtin();
        let m = MetricSynthesizer::new(&tables);
        let mut streams = RandomStreams::seeded(5);

        let hit = m.plg_signals("usage_limit_hit", Tier::Free, Segment::ConversionReady, Scenario::CacConversion, &mut streams);
        assert_eq!(hit.usage_limit_proximity, UsageLimitProximity::Exceeded);

        let pressure =
            m.plg_signals("data_export", Tier::Free, Segment::ConversionReady, Scenario::CacConversion, &mut streams);
        assert!(matches!(
            pressure.usage_limit_proximity,
            UsageLimitProximity::Medium | UsageLimitProximity::High
        ));

        let other = m.plg_signals("usage_limit_hit", Tier::Free, Segment::Casual, Scenario::Retention, &mut streams);
        assert_eq!(other.usage_limit_proximity, UsageLimitProximity::Low);
    }
}
