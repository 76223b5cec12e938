//! Session expansion: turns a profile into timed event skeletons.
//!
//! RULE: Within a session, timestamps are non-decreasing and the first
//! event sits exactly on the session start. Across sessions and users
//! there is no ordering; the dataset driver sorts globally at the end.

use crate::{
    config::{RealRange, ReferenceTables, SessionPattern},
    profile::UserProfile,
    rng::RandomStreams,
    types::{SessionId, Tier},
};
use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};

/// Session start days are drawn from [0, LOOKBACK_DAYS] before the anchor.
pub const LOOKBACK_DAYS: i64 = 30;
pub const FIRST_SESSION_HOUR: i64 = 7;
pub const LAST_SESSION_HOUR: i64 = 19;

const FALLBACK_PATTERN_NAME: &str = "basic_usage";
const FALLBACK_PATTERN: [&str; 3] = ["login", "dashboard_view", "logout"];
const FALLBACK_GAP_MINUTES: RealRange = RealRange::new(1.0, 5.0);

#[derive(Debug, Clone, PartialEq)]
pub struct SessionStep {
    pub event_type: String,
    pub timestamp:  NaiveDateTime,
}

/// One session's worth of event tokens with timestamps, not yet enriched.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSkeleton {
    pub session_id:   SessionId,
    pub pattern_name: String,
    pub start:        NaiveDateTime,
    pub steps:        Vec<SessionStep>,
}

pub struct SessionExpander<'t> {
    tables: &'t ReferenceTables,
    anchor: NaiveDateTime,
}

impl<'t> SessionExpander<'t> {
    pub fn new(tables: &'t ReferenceTables, anchor: NaiveDateTime) -> Self {
        Self { tables, anchor }
    }

    pub fn expand_sessions(
        &self,
        profile: &UserProfile,
        session_count: usize,
        streams: &mut RandomStreams,
    ) -> Vec<SessionSkeleton> {
        (0..session_count)
            .map(|_| self.expand_one(profile, streams))
            .collect()
    }

    fn expand_one(&self, profile: &UserProfile, streams: &mut RandomStreams) -> SessionSkeleton {
        let (pattern_name, events) = self.select_pattern(profile, streams);
        let start = self.session_start(streams);
        let session_id = format!("sess_{}", streams.uniform.hex_token(12));

        let gap = self
            .tables
            .gap_minutes
            .get(profile.tier)
            .copied()
            .unwrap_or(FALLBACK_GAP_MINUTES);

        let mut current = start;
        let steps = events
            .into_iter()
            .enumerate()
            .map(|(i, event_type)| {
                if i > 0 {
                    let gap_minutes = streams.uniform.uniform_real(gap.lo, gap.hi);
                    current += minutes_to_duration(gap_minutes);
                }
                SessionStep { event_type, timestamp: current }
            })
            .collect();

        log::debug!(
            "session {session_id} for {}: pattern={pattern_name}",
            profile.user_id
        );

        SessionSkeleton {
            session_id,
            pattern_name,
            start,
            steps,
        }
    }

    /// Uniform pick among the tier/segment's named patterns.
    pub fn select_pattern(
        &self,
        profile: &UserProfile,
        streams: &mut RandomStreams,
    ) -> (String, Vec<String>) {
        // Unknown tier reads Free's table; unknown segment takes the fallback pattern.
        let by_tier = &self.tables.session_patterns.0;
        let patterns: &[SessionPattern] = by_tier
            .get(&profile.tier)
            .or_else(|| by_tier.get(&Tier::Free))
            .and_then(|segments| segments.get(&profile.segment))
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        if patterns.is_empty() {
            log::warn!(
                "no session patterns for {}/{}, using {FALLBACK_PATTERN_NAME}",
                profile.tier,
                profile.segment
            );
            return (
                FALLBACK_PATTERN_NAME.to_string(),
                FALLBACK_PATTERN.iter().map(|e| e.to_string()).collect(),
            );
        }

        let pattern = streams.uniform.choose(patterns);
        (pattern.name.clone(), pattern.events.clone())
    }

    /// A random day in the lookback window, business-ish hour, zero seconds.
    pub fn session_start(&self, streams: &mut RandomStreams) -> NaiveDateTime {
        let days_back = streams.uniform.uniform_int(0, LOOKBACK_DAYS);
        let hour = streams.uniform.uniform_int(FIRST_SESSION_HOUR, LAST_SESSION_HOUR) as u32;
        let minute = streams.uniform.uniform_int(0, 59) as u32;

        let day = (self.anchor - Duration::days(days_back)).date();
        let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default();
        let start = day.and_time(time);
        debug_assert_eq!(start.second(), 0);
        start
    }
}

/// Fractional minutes to a duration at microsecond precision.
fn minutes_to_duration(minutes: f64) -> Duration {
    Duration::microseconds((minutes * 60_000_000.0).round() as i64)
}
