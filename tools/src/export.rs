//! CSV export of finished telemetry rows.
//!
//! Column order is fixed: core columns first, then every optional
//! tier-context column. Absent optional values are written as blanks.

use anyhow::Result;
use csv::Writer as CsvWriter;
use plg_telemetry_core::record::{iso_z, TelemetryEvent};
use std::io::Write;

pub const HEADER: [&str; 94] = [
    "event_id",
    "user_id",
    "session_id",
    "event_type",
    "timestamp",
    "session_start_time",
    "session_duration_minutes",
    "product_name",
    "feature_name",
    "page_url",
    "device_type",
    "browser_name",
    "operating_system",
    "response_time_ms",
    "geography_country",
    "geography_region",
    "geography_city",
    "ip_address",
    "contact_external_id",
    "user_email",
    "user_first_name",
    "user_last_name",
    "user_title",
    "user_department",
    "subscription_tier",
    "user_segment",
    "plg_scenario",
    "session_type",
    "engagement_depth",
    "feature_sophistication",
    "business_hours_indicator",
    "mobile_usage_indicator",
    "weekend_usage_indicator",
    "premium_feature_exposure",
    "usage_limit_proximity",
    "value_realization_event",
    "viral_behavior",
    "expansion_signal",
    "conversion_signal",
    "friction_encountered",
    "help_seeking_behavior",
    "churn_risk_indicator",
    "feature_adoption_success",
    "current_plan_tier",
    "mrr_contribution",
    "arr_contribution",
    "customer_lifetime_value",
    "payment_status",
    "account_health_score",
    "engagement_score",
    "seat_utilization",
    "storage_utilization",
    "api_usage_monthly",
    "integration_count",
    "support_ticket_count",
    "churn_risk_score",
    "conversion_propensity",
    "upsell_propensity",
    "retention_probability",
    "next_best_action",
    "intervention_priority",
    "is_demo_data",
    "source_system",
    "custom_properties",
    // tier context
    "limit_type",
    "usage_percentage",
    "free_tier_limit",
    "upgrade_prompt_shown",
    "plans_viewed",
    "time_on_page_seconds",
    "conversion_intent_score",
    "trial_feature",
    "trial_days_remaining",
    "premium_upgrade_eligible",
    "current_team_size",
    "team_limit_approached",
    "premium_team_features_explored",
    "automation_type",
    "complexity_level",
    "premium_feature_utilized",
    "api_calls_this_month",
    "integration_type",
    "enterprise_grade",
    "days_since_cancellation",
    "cancellation_reason",
    "winback_offer_eligible",
    "export_type",
    "data_retention_days",
    "reactivation_window",
    "conversion_value",
    "error_code",
    "error_message",
    "tier_related_error",
    "file_size_bytes",
];

fn flag(v: bool) -> String {
    if v { "True" } else { "False" }.to_string()
}

fn real(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

fn opt_int(v: Option<i64>) -> String {
    v.map(|n| n.to_string()).unwrap_or_default()
}

fn opt_flag(v: Option<bool>) -> String {
    v.map(flag).unwrap_or_default()
}

fn opt_text(v: &Option<String>) -> String {
    v.clone().unwrap_or_default()
}

/// One CSV row in `HEADER` order.
pub fn row(e: &TelemetryEvent) -> Result<Vec<String>> {
    let c = &e.context;
    let plans_viewed = match &c.plans_viewed {
        Some(plans) => serde_json::to_string(plans)?,
        None => String::new(),
    };

    let row = vec![
        e.event_id.clone(),
        e.user_id.clone(),
        e.session_id.clone(),
        e.event_type.clone(),
        iso_z(&e.timestamp),
        iso_z(&e.session_start_time),
        real(e.session_duration_minutes),
        e.product_name.clone(),
        e.feature_name.clone(),
        e.page_url.clone(),
        e.device_type.clone(),
        e.browser_name.clone(),
        e.operating_system.clone(),
        e.response_time_ms.to_string(),
        e.geography_country.clone(),
        e.geography_region.clone(),
        e.geography_city.clone(),
        e.ip_address.clone(),
        e.contact_external_id.clone(),
        e.user_email.clone(),
        e.user_first_name.clone(),
        e.user_last_name.clone(),
        e.user_title.clone(),
        e.user_department.clone(),
        e.subscription_tier.as_str().to_string(),
        e.user_segment.as_str().to_string(),
        e.plg_scenario.as_str().to_string(),
        e.session_type.clone(),
        e.engagement_depth.as_str().to_string(),
        e.feature_sophistication.as_str().to_string(),
        flag(e.business_hours_indicator),
        flag(e.mobile_usage_indicator),
        flag(e.weekend_usage_indicator),
        flag(e.premium_feature_exposure),
        e.usage_limit_proximity.as_str().to_string(),
        flag(e.value_realization_event),
        flag(e.viral_behavior),
        flag(e.expansion_signal),
        flag(e.conversion_signal),
        flag(e.friction_encountered),
        flag(e.help_seeking_behavior),
        flag(e.churn_risk_indicator),
        flag(e.feature_adoption_success),
        e.current_plan_tier.clone(),
        e.mrr_contribution.to_string(),
        e.arr_contribution.to_string(),
        e.customer_lifetime_value.to_string(),
        e.payment_status.as_str().to_string(),
        e.account_health_score.to_string(),
        e.engagement_score.to_string(),
        real(e.seat_utilization),
        real(e.storage_utilization),
        e.api_usage_monthly.to_string(),
        e.integration_count.to_string(),
        e.support_ticket_count.to_string(),
        e.churn_risk_score.to_string(),
        e.conversion_propensity.to_string(),
        e.upsell_propensity.to_string(),
        e.retention_probability.to_string(),
        e.next_best_action.clone(),
        e.intervention_priority.as_str().to_string(),
        flag(e.is_demo_data),
        e.source_system.clone(),
        e.custom_properties.clone(),
        opt_text(&c.limit_type),
        opt_int(c.usage_percentage),
        opt_flag(c.free_tier_limit),
        opt_flag(c.upgrade_prompt_shown),
        plans_viewed,
        opt_int(c.time_on_page_seconds),
        opt_int(c.conversion_intent_score),
        opt_text(&c.trial_feature),
        opt_int(c.trial_days_remaining),
        opt_flag(c.premium_upgrade_eligible),
        opt_int(c.current_team_size),
        opt_flag(c.team_limit_approached),
        opt_flag(c.premium_team_features_explored),
        opt_text(&c.automation_type),
        opt_text(&c.complexity_level),
        opt_flag(c.premium_feature_utilized),
        opt_int(c.api_calls_this_month),
        opt_text(&c.integration_type),
        opt_flag(c.enterprise_grade),
        opt_int(c.days_since_cancellation),
        opt_text(&c.cancellation_reason),
        opt_flag(c.winback_offer_eligible),
        opt_text(&c.export_type),
        opt_int(c.data_retention_days),
        opt_flag(c.reactivation_window),
        opt_int(c.conversion_value),
        opt_text(&c.error_code),
        opt_text(&c.error_message),
        opt_flag(c.tier_related_error),
        opt_int(c.file_size_bytes),
    ];
    debug_assert_eq!(row.len(), HEADER.len(), "Row column count mismatch");
    Ok(row)
}

/// Write the header and every event, then flush.
pub fn write_csv<W: Write>(events: &[TelemetryEvent], out: W) -> Result<()> {
    let mut wtr = CsvWriter::from_writer(out);
    wtr.write_record(HEADER)?;
    for e in events {
        wtr.write_record(&row(e)?)?;
    }
    wtr.flush()?;
    log::info!("wrote {} rows", events.len());
    Ok(())
}
