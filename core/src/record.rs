//! Record assembly: one flat, wide telemetry row per event.
//!
//! RULE: Every row's tier/segment/scenario are copied from the owning
//! profile, never re-derived. Tier-specific context fields are optional
//! and stay `None` unless the (tier, event_type) pair calls for them.

use crate::{
    config::{IntRange, ReferenceTables},
    error::TelemetryResult,
    metrics::MetricSynthesizer,
    profile::UserProfile,
    rng::RandomStreams,
    types::{
        EngagementDepth, FeatureSophistication, PaymentStatus, Priority, Scenario, Segment,
        SessionId, Tier, TransitionCandidate, UsageLimitProximity, UserId,
    },
};
use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Serialize, Serializer};

pub const SOURCE_SYSTEM: &str = "plg_telemetry_generator_v2.0_tier_aware";
pub const COUNTRY: &str = "US";

// ── Context catalogs ─────────────────────────────────────────────────────────

const LIMIT_TYPES: &[&str] = &["reports", "data_export", "api_calls", "storage"];
const PLAN_SETS: &[&[&str]] = &[&["Basic"], &["Premium"], &["Basic", "Premium"]];
const TRIAL_FEATURES: &[&str] = &["advanced_analytics", "api_access", "team_management", "custom_branding"];
const AUTOMATION_TYPES: &[&str] = &["data_sync", "report_scheduling", "alert_system", "workflow_trigger"];
const INTEGRATION_TYPES: &[&str] = &["crm", "marketing_automation", "data_warehouse", "bi_tool"];
const CANCELLATION_REASONS: &[&str] = &["cost", "feature_gap", "competitor", "internal_change"];
const ERROR_CODES: &[&str] = &["ERR_404", "ERR_500", "ERR_TIMEOUT", "ERR_AUTH", "ERR_LIMIT"];
const ERROR_MESSAGES: &[&str] = &[
    "Resource not found",
    "Internal server error",
    "Request timeout",
    "Authentication failed",
    "Usage limit exceeded",
];
const EXPERIMENT_VARIANTS: &[&str] = &["control", "variant_a", "variant_b"];

const VALUE_EVENTS: &[&str] = &["insight_discovery", "workflow_success", "report_generate"];
const EXPORT_EVENTS: &[&str] = &["data_export", "data_export_final"];

fn conversion_value_range(tier: Tier) -> IntRange {
    match tier {
        Tier::Premium => IntRange::new(200, 1000),
        Tier::Basic => IntRange::new(50, 400),
        Tier::Free => IntRange::new(10, 100),
        Tier::Cancelled => IntRange::new(0, 20),
    }
}

fn file_size_range(tier: Tier) -> IntRange {
    match tier {
        Tier::Premium => IntRange::new(5_000_000, 50_000_000),
        Tier::Basic => IntRange::new(1_000_000, 10_000_000),
        Tier::Free => IntRange::new(100_000, 1_000_000),
        Tier::Cancelled => IntRange::new(0, 100_000),
    }
}

/// ISO-8601 with a trailing `Z`; microseconds only when non-zero.
pub fn iso_z(ts: &NaiveDateTime) -> String {
    if ts.nanosecond() == 0 {
        format!("{}Z", ts.format("%Y-%m-%dT%H:%M:%S"))
    } else {
        format!("{}Z", ts.format("%Y-%m-%dT%H:%M:%S%.6f"))
    }
}

fn serialize_iso_z<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&iso_z(ts))
}

// ── Row types ────────────────────────────────────────────────────────────────

/// Optional fields injected for specific (tier, event_type) pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TierContext {
    // Free
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_percentage: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_tier_limit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade_prompt_shown: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plans_viewed: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_on_page_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_intent_score: Option<i64>,

    // Basic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_feature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_days_remaining: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premium_upgrade_eligible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_team_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_limit_approached: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premium_team_features_explored: Option<bool>,

    // Premium
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automation_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premium_feature_utilized: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_calls_this_month: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enterprise_grade: Option<bool>,

    // Cancelled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_since_cancellation: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winback_offer_eligible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_retention_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reactivation_window: Option<bool>,

    // Any tier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier_related_error: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size_bytes: Option<i64>,
}

/// Auxiliary metadata carried as a JSON string in `custom_properties`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomProperties {
    pub session_pattern:           String,
    pub plg_scenario:              Scenario,
    pub tier_transition_candidate: TransitionCandidate,
    pub cohort:                    String,
    pub experiment_variant:        String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryEvent {
    // Core event fields
    pub event_id:   String,
    pub user_id:    UserId,
    pub session_id: SessionId,
    pub event_type: String,
    #[serde(serialize_with = "serialize_iso_z")]
    pub timestamp: NaiveDateTime,
    #[serde(serialize_with = "serialize_iso_z")]
    pub session_start_time: NaiveDateTime,
    pub session_duration_minutes: f64,

    // Product context
    pub product_name:     String,
    pub feature_name:     String,
    pub page_url:         String,
    pub device_type:      String,
    pub browser_name:     String,
    pub operating_system: String,
    pub response_time_ms: i64,

    // Geography
    pub geography_country: String,
    pub geography_region:  String,
    pub geography_city:    String,
    pub ip_address:        String,

    // Profile
    pub contact_external_id: String,
    pub user_email:          String,
    pub user_first_name:     String,
    pub user_last_name:      String,
    pub user_title:          String,
    pub user_department:     String,
    pub subscription_tier:   Tier,

    // Behaviour
    pub user_segment:           Segment,
    pub plg_scenario:           Scenario,
    pub session_type:           String,
    pub engagement_depth:       EngagementDepth,
    pub feature_sophistication: FeatureSophistication,

    pub business_hours_indicator: bool,
    pub mobile_usage_indicator:   bool,
    pub weekend_usage_indicator:  bool,

    // PLG signals
    pub premium_feature_exposure: bool,
    pub usage_limit_proximity:    UsageLimitProximity,
    pub value_realization_event:  bool,
    pub viral_behavior:           bool,
    pub expansion_signal:         bool,
    pub conversion_signal:        bool,
    pub friction_encountered:     bool,
    pub help_seeking_behavior:    bool,
    pub churn_risk_indicator:     bool,
    pub feature_adoption_success: bool,

    // Revenue
    pub current_plan_tier:       String,
    pub mrr_contribution:        i64,
    pub arr_contribution:        i64,
    pub customer_lifetime_value: i64,
    pub payment_status:          PaymentStatus,

    // Account health
    pub account_health_score: i64,
    pub engagement_score:     i64,
    pub seat_utilization:     f64,
    pub storage_utilization:  f64,
    pub api_usage_monthly:    i64,
    pub integration_count:    i64,
    pub support_ticket_count: i64,

    // Predictive features
    pub churn_risk_score:      i64,
    pub conversion_propensity: i64,
    pub upsell_propensity:     i64,
    pub retention_probability: i64,

    pub next_best_action:      String,
    pub intervention_priority: Priority,

    // Metadata
    pub is_demo_data:      bool,
    pub source_system:     String,
    pub custom_properties: String,

    #[serde(flatten)]
    pub context: TierContext,
}

// ── Assembler ────────────────────────────────────────────────────────────────

pub struct RecordAssembler<'t> {
    tables:  &'t ReferenceTables,
    metrics: MetricSynthesizer<'t>,
}

impl<'t> RecordAssembler<'t> {
    pub fn new(tables: &'t ReferenceTables) -> Self {
        Self {
            tables,
            metrics: MetricSynthesizer::new(tables),
        }
    }

    pub fn metrics(&self) -> &MetricSynthesizer<'t> {
        &self.metrics
    }

    /// Build one row. The only fallible step is encoding `custom_properties`.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        &self,
        profile: &UserProfile,
        event_type: &str,
        timestamp: NaiveDateTime,
        session_id: &str,
        session_start: NaiveDateTime,
        pattern_name: &str,
        streams: &mut RandomStreams,
    ) -> TelemetryResult<TelemetryEvent> {
        let (tier, segment, scenario) = (profile.tier, profile.segment, profile.scenario);
        let m = &self.metrics;
        let catalogs = &self.tables.catalogs;

        let event_id = format!(
            "evt_{}_{}",
            timestamp.format("%Y%m%d"),
            streams.uniform.hex_token(6)
        );
        let elapsed_seconds = (timestamp - session_start).num_microseconds().unwrap_or(0) as f64 / 1e6;
        let session_duration_minutes = (elapsed_seconds / 60.0 * 100.0).round() / 100.0;

        let business = m.business_metrics(profile, event_type, streams);
        let signals = m.plg_signals(event_type, tier, segment, scenario, streams);

        let product_name = streams.uniform.choose(&catalogs.product_names).clone();
        let device_type = streams.uniform.choose(&catalogs.device_types).clone();
        let browser_name = streams.uniform.choose(&catalogs.browsers).clone();
        let operating_system = streams.uniform.choose(&catalogs.operating_systems).clone();
        let response_time_ms = m.response_time_ms(tier, event_type, streams);

        let geography_region = streams.uniform.choose(&catalogs.regions).clone();
        let geography_city = streams.uniform.choose(&catalogs.cities).clone();
        let ip_address = format!("192.168.{}.xxx", streams.uniform.uniform_int(1, 255));

        let engagement_depth = m.engagement_depth(event_type, tier, segment, streams);
        let weekday = !matches!(timestamp.weekday(), Weekday::Sat | Weekday::Sun);
        let business_hours_indicator = (8..=18).contains(&timestamp.hour()) && weekday;
        let mobile_usage_indicator = streams.uniform.choose(&catalogs.device_types) == "mobile";

        let payment_status = m.payment_status(tier, streams);
        let churn_risk_score = m.churn_risk_score(tier, segment, streams);
        let conversion_propensity = m.conversion_propensity(tier, segment, event_type, streams);
        let upsell_propensity = m.upsell_propensity(tier, segment, event_type, streams);
        let retention_probability = m.retention_probability(tier, segment, streams);
        let next_best_action = m.next_best_action(scenario, event_type, streams);

        let custom = CustomProperties {
            session_pattern: pattern_name.to_string(),
            plg_scenario: scenario,
            tier_transition_candidate: is_tier_transition_candidate(profile, event_type),
            cohort: format!("2024-{:02}", streams.uniform.uniform_int(1, 12)),
            experiment_variant: streams.uniform.choose(EXPERIMENT_VARIANTS).to_string(),
        };
        let custom_properties = serde_json::to_string(&custom)?;

        let context = tier_context(tier, event_type, streams);

        Ok(TelemetryEvent {
            event_id,
            user_id: profile.user_id.clone(),
            session_id: session_id.to_string(),
            event_type: event_type.to_string(),
            timestamp,
            session_start_time: session_start,
            session_duration_minutes,

            product_name,
            feature_name: m.feature_name(event_type),
            page_url: format!("/app/{}", event_type.replace('_', "-")),
            device_type,
            browser_name,
            operating_system,
            response_time_ms,

            geography_country: COUNTRY.to_string(),
            geography_region,
            geography_city,
            ip_address,

            contact_external_id: profile.external_id.clone(),
            user_email: profile.email.clone(),
            user_first_name: profile.first_name.clone(),
            user_last_name: profile.last_name.clone(),
            user_title: profile.title.clone(),
            user_department: profile.department.clone(),
            subscription_tier: tier,

            user_segment: segment,
            plg_scenario: scenario,
            session_type: pattern_name.to_string(),
            engagement_depth,
            feature_sophistication: m.feature_sophistication(event_type),

            business_hours_indicator,
            mobile_usage_indicator,
            weekend_usage_indicator: !weekday,

            premium_feature_exposure: signals.premium_feature_exposure,
            usage_limit_proximity: signals.usage_limit_proximity,
            value_realization_event: signals.value_realization_event,
            viral_behavior: signals.viral_behavior,
            expansion_signal: signals.expansion_signal,
            conversion_signal: signals.conversion_signal,
            friction_encountered: signals.friction_encountered,
            help_seeking_behavior: signals.help_seeking_behavior,
            churn_risk_indicator: signals.churn_risk_indicator,
            feature_adoption_success: !signals.friction_encountered,

            current_plan_tier: business.current_plan_tier.to_string(),
            mrr_contribution: business.mrr_contribution,
            arr_contribution: business.arr_contribution,
            customer_lifetime_value: business.customer_lifetime_value,
            payment_status,

            account_health_score: business.account_health_score,
            engagement_score: business.engagement_score,
            seat_utilization: business.seat_utilization,
            storage_utilization: business.storage_utilization,
            api_usage_monthly: business.api_usage_monthly,
            integration_count: business.integration_count,
            support_ticket_count: business.support_ticket_count,

            churn_risk_score,
            conversion_propensity,
            upsell_propensity,
            retention_probability,

            next_best_action,
            intervention_priority: m.intervention_priority(tier, segment, event_type),

            is_demo_data: true,
            source_system: SOURCE_SYSTEM.to_string(),
            custom_properties,

            context,
        })
    }
}

/// Classify the profile's likely next tier move. `_event_type` is unused.
pub fn is_tier_transition_candidate(profile: &UserProfile, _event_type: &str) -> TransitionCandidate {
    match (profile.tier, profile.segment) {
        (Tier::Free, Segment::ConversionReady) => TransitionCandidate::FreeToPaidCandidate,
        (Tier::Basic, Segment::Champion) => TransitionCandidate::BasicToPremiumCandidate,
        (Tier::Basic | Tier::Premium, Segment::AtRisk) => TransitionCandidate::ChurnRiskCandidate,
        (Tier::Cancelled, _) => TransitionCandidate::WinbackCandidate,
        _ => TransitionCandidate::Stable,
    }
}

fn tier_context(tier: Tier, event_type: &str, streams: &mut RandomStreams) -> TierContext {
    let mut ctx = TierContext::default();
    let u = &mut streams.uniform;

    match (tier, event_type) {
        (Tier::Free, "usage_limit_hit") => {
            ctx.limit_type = Some(u.choose(LIMIT_TYPES).to_string());
            ctx.usage_percentage = Some(u.uniform_int(95, 120));
            ctx.free_tier_limit = Some(true);
            ctx.upgrade_prompt_shown = Some(true);
        }
        (Tier::Free, "pricing_page_view") => {
            let plans = u.choose(PLAN_SETS);
            ctx.plans_viewed = Some(plans.iter().map(|p| p.to_string()).collect());
            ctx.time_on_page_seconds = Some(u.uniform_int(30, 300));
            ctx.conversion_intent_score = Some(u.uniform_int(60, 95));
        }
        (Tier::Basic, "enterprise_trial") => {
            ctx.trial_feature = Some(u.choose(TRIAL_FEATURES).to_string());
            ctx.trial_days_remaining = Some(u.uniform_int(1, 14));
            ctx.premium_upgrade_eligible = Some(true);
        }
        (Tier::Basic, "team_management_view") => {
            ctx.current_team_size = Some(u.uniform_int(3, 15));
            ctx.team_limit_approached = Some(u.coin_flip());
            ctx.premium_team_features_explored = Some(true);
        }
        (Tier::Premium, "automation_setup") => {
            ctx.automation_type = Some(u.choose(AUTOMATION_TYPES).to_string());
            ctx.complexity_level = Some("advanced".to_string());
            ctx.premium_feature_utilized = Some(true);
        }
        (Tier::Premium, "api_integration") => {
            ctx.api_calls_this_month = Some(u.uniform_int(1000, 5000));
            ctx.integration_type = Some(u.choose(INTEGRATION_TYPES).to_string());
            ctx.enterprise_grade = Some(true);
        }
        (Tier::Cancelled, "account_reactivation_view") => {
            ctx.days_since_cancellation = Some(u.uniform_int(1, 90));
            ctx.cancellation_reason = Some(u.choose(CANCELLATION_REASONS).to_string());
            ctx.winback_offer_eligible = Some(true);
        }
        (Tier::Cancelled, "data_export_final") => {
            ctx.export_type = Some("account_closure".to_string());
            ctx.data_retention_days = Some(u.uniform_int(7, 30));
            ctx.reactivation_window = Some(true);
        }
        _ => {}
    }

    if VALUE_EVENTS.contains(&event_type) {
        let range = conversion_value_range(tier);
        ctx.conversion_value = Some(u.uniform_int(range.lo, range.hi));
    }

    if event_type == "error_event" {
        ctx.error_code = Some(u.choose(ERROR_CODES).to_string());
        ctx.error_message = Some(u.choose(ERROR_MESSAGES).to_string());
        // Only Free tier spends a draw on the coin flip.
        ctx.tier_related_error = Some(tier == Tier::Free && u.coin_flip());
    }

    if EXPORT_EVENTS.contains(&event_type) {
        let range = file_size_range(tier);
        ctx.file_size_bytes = Some(u.uniform_int(range.lo, range.hi));
    }

    ctx
}
