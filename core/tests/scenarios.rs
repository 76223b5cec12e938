//! End-to-end rows for fixed profiles, straight through the assembler.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use plg_telemetry_core::{
    config::ReferenceTables,
    profile::UserProfile,
    record::{RecordAssembler, TelemetryEvent},
    rng::RandomStreams,
    types::{PaymentStatus, Scenario, Segment, Tier, UsageLimitProximity},
};

fn profile(tier: Tier, segment: Segment) -> UserProfile {
    UserProfile {
        user_id: "user_riley_garcia_0042".into(),
        external_id: "EXT_000042".into(),
        first_name: "Riley".into(),
        last_name: "Garcia".into(),
        email: "riley.garcia@example.com".into(),
        phone: "555-300-3000".into(),
        tier,
        segment,
        title: "Director".into(),
        department: "Finance".into(),
        scenario: Scenario::derive(tier, segment),
    }
}

fn session_start() -> NaiveDateTime {
    // A Wednesday.
    NaiveDate::from_ymd_opt(2024, 6, 12).unwrap().and_hms_opt(10, 15, 0).unwrap()
}

fn run(p: &UserProfile, event_type: &str, n: usize, seed: u64) -> Vec<TelemetryEvent> {
    let tables = ReferenceTables::builtin();
    let assembler = RecordAssembler::new(&tables);
    let mut streams = RandomStreams::seeded(seed);
    let start = session_start();
    (0..n)
        .map(|i| {
            assembler
                .assemble(
                    p,
                    event_type,
                    start + Duration::seconds(90 * i as i64),
                    "sess_0123456789ab",
                    start,
                    "power_session",
                    &mut streams,
                )
                .expect("assemble")
        })
        .collect()
}

#[test]
fn premium_champion_automation_setup() {
    let p = profile(Tier::Premium, Segment::Champion);
    let automation_types = ["data_sync", "report_scheduling", "alert_system", "workflow_trigger"];

    for e in run(&p, "automation_setup", 100, 101) {
        let kind = e.context.automation_type.as_deref().expect("automation_type present");
        assert!(automation_types.contains(&kind), "unexpected automation type {kind}");
        assert_eq!(e.context.complexity_level.as_deref(), Some("advanced"));
        assert_eq!(e.context.premium_feature_utilized, Some(true));
        assert_eq!(e.mrr_contribution, 299);
        assert_eq!(e.arr_contribution, 299 * 12);
        assert_eq!(e.plg_scenario, Scenario::Retention);
        assert!(e.premium_feature_exposure);
        assert_eq!(e.feature_name, "Workflow Automation");
        assert_eq!(e.page_url, "/app/automation-setup");
        assert_eq!(e.conversion_propensity, 0);
        assert_eq!(e.upsell_propensity, 0);
    }
}

#[test]
fn cancelled_at_risk_is_winback() {
    let p = profile(Tier::Cancelled, Segment::AtRisk);

    for e in run(&p, "account_reactivation_view", 100, 202) {
        assert_eq!(e.plg_scenario, Scenario::Winback);
        assert_eq!(e.payment_status, PaymentStatus::Cancelled);
        assert_eq!(e.mrr_contribution, 0);
        assert!((5..=20).contains(&e.account_health_score), "health {}", e.account_health_score);
        assert!((1..=90).contains(&e.context.days_since_cancellation.unwrap()));
        assert_eq!(e.context.winback_offer_eligible, Some(true));

        let props: serde_json::Value = serde_json::from_str(&e.custom_properties).unwrap();
        assert_eq!(props["plg_scenario"], "Winback");
        assert_eq!(props["tier_transition_candidate"], "winback_candidate");
        assert_eq!(props["session_pattern"], "power_session");
    }
}

#[test]
fn free_conversion_ready_usage_limit_hit() {
    let p = profile(Tier::Free, Segment::ConversionReady);

    for e in run(&p, "usage_limit_hit", 50, 303) {
        assert_eq!(e.plg_scenario, Scenario::CacConversion);
        assert_eq!(e.usage_limit_proximity, UsageLimitProximity::Exceeded);
        assert!(e.conversion_signal && !e.expansion_signal);
        assert!((95..=120).contains(&e.context.usage_percentage.unwrap()));
        assert_eq!(e.context.upgrade_prompt_shown, Some(true));
        assert_eq!(e.payment_status, PaymentStatus::NotApplicable);
        // base 75 + intent boost 20 + jitter, capped
        assert!((85..=95).contains(&e.conversion_propensity), "conversion {}", e.conversion_propensity);
    }
}

#[test]
fn basic_enterprise_trial_and_exports() {
    let basic = profile(Tier::Basic, Segment::Champion);
    for e in run(&basic, "enterprise_trial", 30, 404) {
        assert!((1..=14).contains(&e.context.trial_days_remaining.unwrap()));
        assert_eq!(e.context.premium_upgrade_eligible, Some(true));
        assert!(e.expansion_signal);
        assert!(e.upsell_propensity <= 95 && e.upsell_propensity >= 85);
    }
    for e in run(&basic, "data_export", 30, 405) {
        let size = e.context.file_size_bytes.expect("file size present");
        assert!((1_000_000..=10_000_000).contains(&size));
        assert!(e.context.trial_feature.is_none());
    }
}

#[test]
fn error_event_carries_error_context() {
    let p = profile(Tier::Free, Segment::AtRisk);
    for e in run(&p, "error_event", 30, 505) {
        assert!(e.context.error_code.as_deref().unwrap().starts_with("ERR_"));
        assert!(e.context.error_message.is_some());
        assert!(e.context.tier_related_error.is_some());
        assert!(e.friction_encountered && !e.feature_adoption_success);
        assert_eq!(e.plg_scenario, Scenario::FailedConversion);
    }
}

#[test]
fn timing_and_calendar_fields() {
    let p = profile(Tier::Basic, Segment::Engaged);
    let events = run(&p, "report_generate", 3, 606);

    assert_eq!(events[0].session_duration_minutes, 0.0);
    assert_eq!(events[1].session_duration_minutes, 1.5);
    assert_eq!(events[2].session_duration_minutes, 3.0);
    for e in &events {
        assert!(e.business_hours_indicator, "Wednesday 10:15 is business hours");
        assert!(!e.weekend_usage_indicator);
        assert!(e.event_id.starts_with("evt_20240612_") && e.event_id.len() == 19);
        assert!(e.ip_address.starts_with("192.168.") && e.ip_address.ends_with(".xxx"));
        assert!((50..=400).contains(&e.context.conversion_value.unwrap()));
        assert!(e.value_realization_event);
        assert!(e.is_demo_data);
    }
}
