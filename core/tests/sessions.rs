use chrono::{NaiveDate, NaiveDateTime, Timelike};
use plg_telemetry_core::{
    config::{GeneratorConfig, ReferenceTables},
    dataset::DatasetGenerator,
    profile::UserProfile,
    rng::RandomStreams,
    session::SessionExpander,
    types::{Scenario, Segment, Tier},
};
use std::collections::BTreeMap;

fn anchor() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 28).unwrap().and_hms_opt(12, 0, 0).unwrap()
}

fn profile(tier: Tier, segment: Segment) -> UserProfile {
    UserProfile {
        user_id: "user_casey_brown_0001".into(),
        external_id: "EXT_000001".into(),
        first_name: "Casey".into(),
        last_name: "Brown".into(),
        email: "casey.brown@example.com".into(),
        phone: "555-200-2000".into(),
        tier,
        segment,
        title: "Manager".into(),
        department: "Sales".into(),
        scenario: Scenario::derive(tier, segment),
    }
}

#[test]
fn first_step_sits_on_session_start_and_time_never_goes_back() {
    let tables = ReferenceTables::builtin();
    let expander = SessionExpander::new(&tables, anchor());
    let mut streams = RandomStreams::seeded(31);

    for tier in Tier::ALL {
        for segment in tables.segments_for(tier) {
            let p = profile(tier, segment);
            for s in expander.expand_sessions(&p, 5, &mut streams) {
                assert!(!s.steps.is_empty(), "{tier}/{segment}: empty session");
                assert_eq!(s.steps[0].timestamp, s.start, "first event must equal session start");
                assert!(
                    s.steps.windows(2).all(|w| w[0].timestamp <= w[1].timestamp),
                    "{tier}/{segment}: timestamps went backwards"
                );
            }
        }
    }
}

#[test]
fn session_starts_use_business_window() {
    let tables = ReferenceTables::builtin();
    let expander = SessionExpander::new(&tables, anchor());
    let mut streams = RandomStreams::seeded(32);

    for _ in 0..500 {
        let start = expander.session_start(&mut streams);
        assert!((7..=19).contains(&start.hour()), "hour {}", start.hour());
        assert_eq!(start.second(), 0);
        let days_back = (anchor().date() - start.date()).num_days();
        assert!((0..=30).contains(&days_back), "{days_back} days back");
    }
}

#[test]
fn gaps_follow_tier_range() {
    let tables = ReferenceTables::builtin();
    let expander = SessionExpander::new(&tables, anchor());
    let mut streams = RandomStreams::seeded(33);

    let p = profile(Tier::Premium, Segment::Champion);
    for s in expander.expand_sessions(&p, 20, &mut streams) {
        for w in s.steps.windows(2) {
            let gap = (w[1].timestamp - w[0].timestamp).num_milliseconds() as f64 / 60_000.0;
            assert!((0.5 - 1e-3..=3.0 + 1e-3).contains(&gap), "premium gap {gap} min");
        }
    }
}

#[test]
fn pattern_comes_from_tier_and_segment_table() {
    let tables = ReferenceTables::builtin();
    let expander = SessionExpander::new(&tables, anchor());
    let mut streams = RandomStreams::seeded(34);

    let p = profile(Tier::Cancelled, Segment::AtRisk);
    let allowed: Vec<_> = tables
        .session_patterns
        .get(Tier::Cancelled, Segment::AtRisk)
        .unwrap()
        .iter()
        .map(|pat| (pat.name.clone(), pat.events.clone()))
        .collect();
    for _ in 0..50 {
        let picked = expander.select_pattern(&p, &mut streams);
        assert!(allowed.contains(&picked), "unexpected pattern {}", picked.0);
    }
}

#[test]
fn missing_segment_falls_back_to_basic_usage() {
    let mut tables = ReferenceTables::builtin();
    tables.session_patterns.0.get_mut(&Tier::Basic).unwrap().clear();
    let expander = SessionExpander::new(&tables, anchor());
    let mut streams = RandomStreams::seeded(35);

    let (name, events) = expander.select_pattern(&profile(Tier::Basic, Segment::Engaged), &mut streams);
    assert_eq!(name, "basic_usage");
    assert_eq!(events, vec!["login", "dashboard_view", "logout"]);
}

#[test]
fn sessions_survive_global_sort_in_order() {
    let tables = ReferenceTables::builtin();
    let dataset = DatasetGenerator::new(&tables, GeneratorConfig::default_test())
        .generate()
        .unwrap();

    let mut by_session: BTreeMap<&str, Vec<_>> = BTreeMap::new();
    for e in &dataset.events {
        by_session.entry(e.session_id.as_str()).or_default().push(e);
    }
    for (sid, events) in by_session {
        let start = events[0].session_start_time;
        assert!(sid.starts_with("sess_") && sid.len() == 17, "session id {sid}");
        for e in &events {
            assert_eq!(e.session_start_time, start, "{sid}: mixed session starts");
            assert!(e.timestamp >= start, "{sid}: event before its session start");
            assert!(e.session_duration_minutes >= 0.0);
        }
        assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }
}

#[test]
fn tier_without_pattern_table_reads_free_patterns() {
    let mut tables = ReferenceTables::builtin();
    tables.session_patterns.0.remove(&Tier::Premium);
    let expander = SessionExpander::new(&tables, anchor());
    let mut streams = RandomStreams::seeded(17);

    for _ in 0..20 {
        let (name, events) = expander.select_pattern(&profile(Tier::Premium, Segment::Engaged), &mut streams);
        assert!(
            name == "steady_usage" || name == "exploration",
            "expected a Free engaged pattern, got {name}"
        );
        assert!(events.len() >= 5, "pattern {name} too short: {events:?}");
    }

    // Champion has no Free row, so the short fallback applies
    let (name, events) = expander.select_pattern(&profile(Tier::Premium, Segment::Champion), &mut streams);
    assert_eq!(name, "basic_usage");
    assert_eq!(events, vec!["login", "dashboard_view", "logout"]);
}
