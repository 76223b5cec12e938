//! Documented bounds of every synthesized metric, across all valid
//! tier/segment pairs and every event type in the session catalog.

use plg_telemetry_core::{
    config::ReferenceTables,
    metrics::{MetricSynthesizer, PROPENSITY_CAP},
    profile::UserProfile,
    rng::RandomStreams,
    types::{PaymentStatus, Scenario, Segment, Tier},
};
use std::collections::BTreeSet;

fn profile(tier: Tier, segment: Segment) -> UserProfile {
    UserProfile {
        user_id: format!("user_test_{}_{}", tier.plan_name(), segment),
        external_id: "EXT_000000".into(),
        first_name: "Alex".into(),
        last_name: "Johnson".into(),
        email: "alex.johnson@example.com".into(),
        phone: "555-100-1000".into(),
        tier,
        segment,
        title: "Analyst".into(),
        department: "IT".into(),
        scenario: Scenario::derive(tier, segment),
    }
}

fn all_pairs(tables: &ReferenceTables) -> Vec<(Tier, Segment)> {
    Tier::ALL
        .iter()
        .flat_map(|t| tables.segments_for(*t).into_iter().map(move |s| (*t, s)))
        .collect()
}

fn all_event_types(tables: &ReferenceTables) -> BTreeSet<String> {
    tables
        .session_patterns
        .0
        .values()
        .flat_map(|segs| segs.values())
        .flat_map(|patterns| patterns.iter())
        .flat_map(|p| p.events.iter().cloned())
        .collect()
}

#[test]
fn propensities_respect_tier_gates_and_cap() {
    let tables = ReferenceTables::builtin();
    let m = MetricSynthesizer::new(&tables);
    let mut streams = RandomStreams::seeded(11);

    for (tier, segment) in all_pairs(&tables) {
        for event_type in all_event_types(&tables) {
            for _ in 0..5 {
                let conv = m.conversion_propensity(tier, segment, &event_type, &mut streams);
                let up = m.upsell_propensity(tier, segment, &event_type, &mut streams);

                if !matches!(tier, Tier::Free | Tier::Basic) {
                    assert_eq!(conv, 0, "{tier}/{segment}/{event_type}: conversion must be 0");
                }
                if tier != Tier::Basic {
                    assert_eq!(up, 0, "{tier}/{segment}/{event_type}: upsell must be 0");
                }
                assert!(conv <= PROPENSITY_CAP, "conversion {conv} above cap");
                assert!(up <= PROPENSITY_CAP, "upsell {up} above cap");
            }
        }
    }
}

#[test]
fn business_metrics_stay_in_range() {
    let tables = ReferenceTables::builtin();
    let m = MetricSynthesizer::new(&tables);
    let mut streams = RandomStreams::seeded(12);

    for (tier, segment) in all_pairs(&tables) {
        let p = profile(tier, segment);
        let health = *tables.health_score.get(tier, segment).unwrap();
        let usage = *tables.usage.get(tier).unwrap();

        for event_type in ["login", "api_integration", "api_exploration", "report_generate"] {
            for _ in 0..50 {
                let b = m.business_metrics(&p, event_type, &mut streams);

                let expected_mrr = match tier {
                    Tier::Free | Tier::Cancelled => 0,
                    Tier::Basic => 99,
                    Tier::Premium => 299,
                };
                assert_eq!(b.mrr_contribution, expected_mrr, "{tier}: wrong MRR");
                assert_eq!(b.arr_contribution, b.mrr_contribution * 12);
                assert_eq!(b.current_plan_tier, tier.plan_name());
                assert!((0..=100).contains(&b.engagement_score), "engagement {}", b.engagement_score);
                assert!(health.contains(b.account_health_score), "health {}", b.account_health_score);
                assert!(b.seat_utilization >= usage.seat_utilization.lo - 0.005);
                assert!(b.seat_utilization <= usage.seat_utilization.hi + 0.005);

                if event_type.starts_with("api_") {
                    assert!(usage.api_usage.contains(b.api_usage_monthly));
                } else {
                    assert_eq!(b.api_usage_monthly, 0, "{event_type} should not report API usage");
                }
            }
        }
    }
}

#[test]
fn clv_uses_tier_months() {
    let tables = ReferenceTables::builtin();
    let m = MetricSynthesizer::new(&tables);
    let mut streams = RandomStreams::seeded(13);

    let premium = m.business_metrics(&profile(Tier::Premium, Segment::Champion), "login", &mut streams);
    let basic = m.business_metrics(&profile(Tier::Basic, Segment::Engaged), "login", &mut streams);
    assert_eq!(premium.customer_lifetime_value, 299 * 36);
    assert_eq!(basic.customer_lifetime_value, 99 * 24);
}

#[test]
fn churn_and_retention_jitter_around_base_unclamped() {
    let tables = ReferenceTables::builtin();
    let m = MetricSynthesizer::new(&tables);
    let mut streams = RandomStreams::seeded(14);

    let mut churn_above_100 = false;
    for _ in 0..500 {
        let churn = m.churn_risk_score(Tier::Cancelled, Segment::AtRisk, &mut streams);
        assert!((85..=110).contains(&churn), "churn {churn}");
        churn_above_100 |= churn > 100;

        let retention = m.retention_probability(Tier::Cancelled, Segment::AtRisk, &mut streams);
        assert!((-5..=15).contains(&retention), "retention {retention}");
    }
    assert!(churn_above_100, "churn risk is left unclamped and can exceed 100");
}

#[test]
fn payment_status_follows_tier() {
    let tables = ReferenceTables::builtin();
    let m = MetricSynthesizer::new(&tables);
    let mut streams = RandomStreams::seeded(15);

    for _ in 0..200 {
        assert_eq!(m.payment_status(Tier::Free, &mut streams), PaymentStatus::NotApplicable);
        assert_eq!(m.payment_status(Tier::Cancelled, &mut streams), PaymentStatus::Cancelled);
        let paid = m.payment_status(Tier::Premium, &mut streams);
        assert!(matches!(
            paid,
            PaymentStatus::Current | PaymentStatus::PastDue | PaymentStatus::Failed
        ));
    }
}

#[test]
fn response_time_scales_with_tier() {
    let tables = ReferenceTables::builtin();
    let m = MetricSynthesizer::new(&tables);
    let mut streams = RandomStreams::seeded(16);

    for _ in 0..200 {
        let premium = m.response_time_ms(Tier::Premium, "login", &mut streams);
        assert!((349..=1400).contains(&premium), "premium login {premium}ms");
        let cancelled = m.response_time_ms(Tier::Cancelled, "login", &mut streams);
        assert!((650..=2600).contains(&cancelled), "cancelled login {cancelled}ms");
        let unknown = m.response_time_ms(Tier::Free, "not_in_table", &mut streams);
        assert!((300..=1800).contains(&unknown), "default range {unknown}ms");
    }
}

#[test]
fn next_best_action_comes_from_scenario_list() {
    let tables = ReferenceTables::builtin();
    let m = MetricSynthesizer::new(&tables);
    let mut streams = RandomStreams::seeded(17);

    let winback = &tables.next_best_actions[&Scenario::Winback];
    for _ in 0..50 {
        let action = m.next_best_action(Scenario::Winback, "login", &mut streams);
        assert!(winback.contains(&action), "unexpected action {action}");
    }

    let mut sparse = tables.clone();
    sparse.next_best_actions.clear();
    let m = MetricSynthesizer::new(&sparse);
    assert_eq!(m.next_best_action(Scenario::Churn, "login", &mut streams), "standard_engagement");
}
