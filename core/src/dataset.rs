//! Dataset driver: users → sessions → events, trimmed and time-sorted.
//!
//! ORDER (fixed, never reordered):
//!   1. Draw the per-tier session budget once for the whole dataset.
//!   2. For each user index: assign profile, size sessions, expand, assemble.
//!   3. Stop once at least `total_records` events exist.
//!   4. Truncate to exactly `total_records`, then stable-sort by timestamp.
//!
//! RULES:
//!   - The driver performs no file I/O; callers own export.
//!   - Same seed + same anchor + same tables = identical dataset.

use crate::{
    config::{GeneratorConfig, ReferenceTables},
    error::TelemetryResult,
    profile::{ProfileAssigner, UserProfile},
    record::{RecordAssembler, TelemetryEvent},
    rng::RandomStreams,
    session::SessionExpander,
    types::{Scenario, Segment, Tier},
};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

// ── Session budget ───────────────────────────────────────────────────────────

/// Base session count per tier, drawn once per dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionBudget {
    pub premium:   usize,
    pub basic:     usize,
    pub free:      usize,
    pub cancelled: usize,
}

impl SessionBudget {
    pub fn draw(streams: &mut RandomStreams) -> Self {
        let premium = streams.uniform.uniform_int(4, 8) as usize;
        let basic = streams.uniform.uniform_int(2, 5) as usize;
        let free = streams.uniform.uniform_int(1, 3) as usize;
        Self {
            premium,
            basic,
            free,
            cancelled: 1,
        }
    }

    pub fn base(&self, tier: Tier) -> usize {
        match tier {
            Tier::Premium => self.premium,
            Tier::Basic => self.basic,
            Tier::Free => self.free,
            Tier::Cancelled => self.cancelled,
        }
    }

    /// Champions get 1-2 extra sessions; at-risk users lose 1-2, floor of one.
    pub fn sessions_for(&self, profile: &UserProfile, streams: &mut RandomStreams) -> usize {
        let base = self.base(profile.tier);
        match profile.segment {
            Segment::Champion => base + streams.uniform.uniform_int(1, 2) as usize,
            Segment::AtRisk => base
                .saturating_sub(streams.uniform.uniform_int(1, 2) as usize)
                .max(1),
            _ => base,
        }
    }
}

// ── Output ───────────────────────────────────────────────────────────────────

pub struct Dataset {
    /// Exactly `total_records` events, ascending by timestamp.
    pub events:   Vec<TelemetryEvent>,
    /// Every profile generated, including users whose events were truncated away.
    pub profiles: Vec<UserProfile>,
    pub summary:  DatasetSummary,
}

/// Signal counts for one scenario, over the final event set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScenarioSignals {
    pub users:                    usize,
    pub events:                   usize,
    pub conversion_signals:       usize,
    pub expansion_signals:        usize,
    pub churn_indicators:         usize,
    pub value_realization_events: usize,
}

/// Per-tier means over the final event set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TierMeans {
    pub users:                      usize,
    pub events:                     usize,
    pub mean_mrr:                   f64,
    pub mean_engagement:            f64,
    pub mean_churn_risk:            f64,
    pub mean_conversion_propensity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub total_events:       usize,
    pub profiles_generated: usize,
    pub unique_users:       usize,
    pub unique_sessions:    usize,
    pub first_timestamp:    Option<NaiveDateTime>,
    pub last_timestamp:     Option<NaiveDateTime>,

    /// Counted over generated profiles, not events.
    pub users_per_tier:     BTreeMap<Tier, usize>,
    pub users_per_scenario: BTreeMap<Scenario, usize>,
    pub events_per_segment: BTreeMap<Segment, usize>,

    pub tier_means:       BTreeMap<Tier, TierMeans>,
    pub scenario_signals: BTreeMap<Scenario, ScenarioSignals>,

    pub free_conversion_signals: usize,
    pub basic_expansion_signals: usize,
    pub paid_churn_indicators:   usize,

    /// MRR summed once per user present in the events.
    pub total_mrr:         i64,
    pub mean_mrr_per_user: f64,
}

impl DatasetSummary {
    pub fn from_parts(profiles: &[UserProfile], events: &[TelemetryEvent]) -> Self {
        let mut s = DatasetSummary {
            total_events: events.len(),
            profiles_generated: profiles.len(),
            first_timestamp: events.iter().map(|e| e.timestamp).min(),
            last_timestamp: events.iter().map(|e| e.timestamp).max(),
            ..Default::default()
        };

        for p in profiles {
            *s.users_per_tier.entry(p.tier).or_default() += 1;
            *s.users_per_scenario.entry(p.scenario).or_default() += 1;
        }

        let mut sessions = BTreeSet::new();
        let mut user_mrr: BTreeMap<&str, i64> = BTreeMap::new();
        let mut tier_users: BTreeMap<Tier, BTreeSet<&str>> = BTreeMap::new();
        let mut scenario_users: BTreeMap<Scenario, BTreeSet<&str>> = BTreeMap::new();
        let mut tier_sums: BTreeMap<Tier, [i64; 4]> = BTreeMap::new();

        for e in events {
            sessions.insert(e.session_id.as_str());
            user_mrr.entry(e.user_id.as_str()).or_insert(e.mrr_contribution);
            *s.events_per_segment.entry(e.user_segment).or_default() += 1;

            tier_users.entry(e.subscription_tier).or_default().insert(e.user_id.as_str());
            let sums = tier_sums.entry(e.subscription_tier).or_default();
            sums[0] += e.mrr_contribution;
            sums[1] += e.engagement_score;
            sums[2] += e.churn_risk_score;
            sums[3] += e.conversion_propensity;
            s.tier_means.entry(e.subscription_tier).or_default().events += 1;

            scenario_users.entry(e.plg_scenario).or_default().insert(e.user_id.as_str());
            let sig = s.scenario_signals.entry(e.plg_scenario).or_default();
            sig.events += 1;
            sig.conversion_signals += e.conversion_signal as usize;
            sig.expansion_signals += e.expansion_signal as usize;
            sig.churn_indicators += e.churn_risk_indicator as usize;
            sig.value_realization_events += e.value_realization_event as usize;

            match e.subscription_tier {
                Tier::Free => s.free_conversion_signals += e.conversion_signal as usize,
                Tier::Basic => s.basic_expansion_signals += e.expansion_signal as usize,
                _ => {}
            }
            if e.subscription_tier.is_paid() {
                s.paid_churn_indicators += e.churn_risk_indicator as usize;
            }
        }

        for (tier, means) in s.tier_means.iter_mut() {
            let n = means.events.max(1) as f64;
            let sums = tier_sums.get(tier).copied().unwrap_or_default();
            means.users = tier_users.get(tier).map_or(0, BTreeSet::len);
            means.mean_mrr = round2(sums[0] as f64 / n);
            means.mean_engagement = round2(sums[1] as f64 / n);
            means.mean_churn_risk = round2(sums[2] as f64 / n);
            means.mean_conversion_propensity = round2(sums[3] as f64 / n);
        }
        for (scenario, sig) in s.scenario_signals.iter_mut() {
            sig.users = scenario_users.get(scenario).map_or(0, BTreeSet::len);
        }

        s.unique_sessions = sessions.len();
        s.unique_users = user_mrr.len();
        s.total_mrr = user_mrr.values().sum();
        s.mean_mrr_per_user = if user_mrr.is_empty() {
            0.0
        } else {
            round2(s.total_mrr as f64 / user_mrr.len() as f64)
        };
        s
    }

    /// Write the distributions to the log at info level.
    pub fn log(&self) {
        log::info!(
            "dataset: events={} users={} sessions={} profiles={}",
            self.total_events,
            self.unique_users,
            self.unique_sessions,
            self.profiles_generated
        );
        let users = self.profiles_generated.max(1) as f64;
        for (tier, count) in &self.users_per_tier {
            log::info!("  tier {tier}: {count} users ({:.1}%)", *count as f64 / users * 100.0);
        }
        for (scenario, count) in &self.users_per_scenario {
            log::info!("  scenario {scenario}: {count} users ({:.1}%)", *count as f64 / users * 100.0);
        }
        let events = self.total_events.max(1) as f64;
        for (segment, count) in &self.events_per_segment {
            log::info!("  segment {segment}: {count} events ({:.1}%)", *count as f64 / events * 100.0);
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ── Generator ────────────────────────────────────────────────────────────────

pub struct DatasetGenerator<'t> {
    config:    GeneratorConfig,
    assigner:  ProfileAssigner<'t>,
    expander:  SessionExpander<'t>,
    assembler: RecordAssembler<'t>,
}

impl<'t> DatasetGenerator<'t> {
    pub fn new(tables: &'t ReferenceTables, config: GeneratorConfig) -> Self {
        Self {
            assigner: ProfileAssigner::new(tables),
            expander: SessionExpander::new(tables, config.anchor),
            assembler: RecordAssembler::new(tables),
            config,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate with both streams derived from the configured seed.
    pub fn generate(&self) -> TelemetryResult<Dataset> {
        let mut streams = RandomStreams::seeded(self.config.seed);
        self.generate_with(&mut streams)
    }

    /// Generate from caller-supplied streams.
    pub fn generate_with(&self, streams: &mut RandomStreams) -> TelemetryResult<Dataset> {
        let total = self.config.total_records;
        let estimated_users = total / self.config.avg_events_per_user.max(1);
        log::info!(
            "generating {total} records (~{estimated_users} users, seed={}, anchor={})",
            self.config.seed,
            self.config.anchor
        );

        let mut events = Vec::with_capacity(total);
        let mut profiles = Vec::new();

        if total > 0 {
            let budget = SessionBudget::draw(streams);
            log::debug!("session budget: {budget:?}");

            let mut index = 0;
            while events.len() < total {
                let profile = self.assigner.assign_profile(index, streams);
                let session_count = budget.sessions_for(&profile, streams);
                log::debug!(
                    "user {index}: {} {}/{} sessions={session_count}",
                    profile.user_id,
                    profile.tier,
                    profile.segment
                );

                for skeleton in self.expander.expand_sessions(&profile, session_count, streams) {
                    for step in &skeleton.steps {
                        events.push(self.assembler.assemble(
                            &profile,
                            &step.event_type,
                            step.timestamp,
                            &skeleton.session_id,
                            skeleton.start,
                            &skeleton.pattern_name,
                            streams,
                        )?);
                    }
                }

                profiles.push(profile);
                index += 1;
            }
        }

        events.truncate(total);
        // Stable: ties keep generation order.
        events.sort_by_key(|e| e.timestamp);

        let summary = DatasetSummary::from_parts(&profiles, &events);
        summary.log();

        Ok(Dataset {
            events,
            profiles,
            summary,
        })
    }
}
