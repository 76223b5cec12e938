//! Reference tables and generator configuration.
//!
//! RULE: Tables are read-only once constructed. Every table is keyed by
//! typed tier/segment values and validated for completeness on load, so a
//! missing combination is caught before generation starts. Runtime lookups
//! still fall back to documented defaults.

use crate::{
    error::{TelemetryError, TelemetryResult},
    types::{FeatureSophistication, Scenario, Segment, Tier},
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const WEIGHT_TOLERANCE: f64 = 1e-6;

// ── Table primitives ───────────────────────────────────────────────

/// Inclusive integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    pub lo: i64,
    pub hi: i64,
}

impl IntRange {
    pub const fn new(lo: i64, hi: i64) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, v: i64) -> bool {
        self.lo <= v && v <= self.hi
    }
}

/// Closed real range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RealRange {
    pub lo: f64,
    pub hi: f64,
}

impl RealRange {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }
}

/// tier → value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierTable<T>(pub BTreeMap<Tier, T>);

impl<T> TierTable<T> {
    pub fn from_rows(rows: Vec<(Tier, T)>) -> Self {
        Self(rows.into_iter().collect())
    }

    pub fn get(&self, tier: Tier) -> Option<&T> {
        self.0.get(&tier)
    }
}

/// tier → segment → value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentTable<T>(pub BTreeMap<Tier, BTreeMap<Segment, T>>);

impl<T> SegmentTable<T> {
    pub fn from_rows(rows: Vec<(Tier, Vec<(Segment, T)>)>) -> Self {
        Self(
            rows.into_iter()
                .map(|(tier, segs)| (tier, segs.into_iter().collect()))
                .collect(),
        )
    }

    pub fn get(&self, tier: Tier, segment: Segment) -> Option<&T> {
        self.0.get(&tier).and_then(|m| m.get(&segment))
    }
}

/// A named, ordered template of event-type tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPattern {
    pub name: String,
    pub events: Vec<String>,
}

impl SessionPattern {
    pub fn new(name: &str, events: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            events: events.iter().map(|e| e.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthWeights {
    pub surface: f64,
    pub moderate: f64,
    pub deep: f64,
}

impl DepthWeights {
    pub const fn new(surface: f64, moderate: f64, deep: f64) -> Self {
        Self { surface, moderate, deep }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.surface, self.moderate, self.deep]
    }
}

/// Per-tier usage ranges feeding the business metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageProfile {
    pub seat_utilization:    RealRange,
    pub storage_utilization: RealRange,
    pub api_usage:           IntRange,
    pub integrations:        IntRange,
    pub support_tickets:     IntRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalogs {
    pub product_names:     Vec<String>,
    pub device_types:      Vec<String>,
    pub browsers:          Vec<String>,
    pub operating_systems: Vec<String>,
    pub regions:           Vec<String>,
    pub cities:            Vec<String>,
    pub first_names:       Vec<String>,
    pub last_names:        Vec<String>,
    pub departments:       Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleCatalog {
    pub premium_champion: Vec<String>,
    pub premium_other:    Vec<String>,
    pub basic_champion:   Vec<String>,
    pub basic_other:      Vec<String>,
    pub free:             Vec<String>,
    pub cancelled:        Vec<String>,
}

// ── Reference tables ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceTables {
    pub tier_weights:           Vec<(Tier, f64)>,
    pub segment_weights:        TierTable<Vec<(Segment, f64)>>,
    pub session_patterns:       SegmentTable<Vec<SessionPattern>>,
    pub gap_minutes:            TierTable<RealRange>,
    pub response_time_ms:       BTreeMap<String, IntRange>,
    pub default_response_ms:    IntRange,
    pub response_multiplier:    TierTable<f64>,
    pub churn_risk_base:        SegmentTable<i64>,
    pub retention_base:         SegmentTable<i64>,
    pub conversion_base:        SegmentTable<i64>,
    pub upsell_base:            SegmentTable<i64>,
    pub health_score:           SegmentTable<IntRange>,
    pub engagement_base:        SegmentTable<i64>,
    pub engagement_depth:       SegmentTable<DepthWeights>,
    pub usage:                  TierTable<UsageProfile>,
    pub mrr:                    TierTable<i64>,
    pub clv_months:             TierTable<i64>,
    pub next_best_actions:      BTreeMap<Scenario, Vec<String>>,
    pub feature_names:          BTreeMap<String, String>,
    pub feature_sophistication: Vec<(FeatureSophistication, Vec<String>)>,
    pub catalogs:               Catalogs,
    pub titles:                 TitleCatalog,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ReferenceTables {
    /// Load a JSON table file and validate it.
    /// In tests and by default, use ReferenceTables::builtin().
    pub fn load(path: &str) -> TelemetryResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| TelemetryError::Io {
            path: path.to_string(),
            source,
        })?;
        let tables: ReferenceTables = serde_json::from_str(&content)?;
        tables.validate()?;
        log::info!("loaded reference tables from {path}");
        Ok(tables)
    }

    pub fn to_json_pretty(&self) -> TelemetryResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Segments a user of `tier` may be assigned, in table order.
    pub fn segments_for(&self, tier: Tier) -> Vec<Segment> {
        self.segment_weights
            .get(tier)
            .map(|w| w.iter().map(|(s, _)| *s).collect())
            .unwrap_or_default()
    }

    /// Check every table for completeness against the tier/segment weights.
    pub fn validate(&self) -> TelemetryResult<()> {
        check_weights("tier_weights", self.tier_weights.iter().map(|(_, w)| *w))?;

        for tier in Tier::ALL {
            if !self.tier_weights.iter().any(|(t, _)| *t == tier) {
                return Err(missing("tier_weights", tier, None));
            }
            let segs = self
                .segment_weights
                .get(tier)
                .ok_or_else(|| missing("segment_weights", tier, None))?;
            check_weights(
                &format!("segment_weights.{tier}"),
                segs.iter().map(|(_, w)| *w),
            )?;

            let gap = self.gap_minutes.get(tier).ok_or_else(|| missing("gap_minutes", tier, None))?;
            check_real_range("gap_minutes", gap)?;
            self.response_multiplier
                .get(tier)
                .ok_or_else(|| missing("response_multiplier", tier, None))?;
            let usage = self.usage.get(tier).ok_or_else(|| missing("usage", tier, None))?;
            check_real_range("usage.seat_utilization", &usage.seat_utilization)?;
            check_real_range("usage.storage_utilization", &usage.storage_utilization)?;
            check_int_range("usage.api_usage", &usage.api_usage)?;
            check_int_range("usage.integrations", &usage.integrations)?;
            check_int_range("usage.support_tickets", &usage.support_tickets)?;
            self.mrr.get(tier).ok_or_else(|| missing("mrr", tier, None))?;
            self.clv_months.get(tier).ok_or_else(|| missing("clv_months", tier, None))?;

            for (segment, weight) in segs {
                if *weight <= 0.0 {
                    continue;
                }
                let patterns = self
                    .session_patterns
                    .get(tier, *segment)
                    .ok_or_else(|| missing("session_patterns", tier, Some(*segment)))?;
                if patterns.is_empty() || patterns.iter().any(|p| p.events.is_empty()) {
                    return Err(missing("session_patterns", tier, Some(*segment)));
                }
                self.churn_risk_base
                    .get(tier, *segment)
                    .ok_or_else(|| missing("churn_risk_base", tier, Some(*segment)))?;
                self.retention_base
                    .get(tier, *segment)
                    .ok_or_else(|| missing("retention_base", tier, Some(*segment)))?;
                self.engagement_base
                    .get(tier, *segment)
                    .ok_or_else(|| missing("engagement_base", tier, Some(*segment)))?;
                let health = self
                    .health_score
                    .get(tier, *segment)
                    .ok_or_else(|| missing("health_score", tier, Some(*segment)))?;
                check_int_range("health_score", health)?;
                let depth = self
                    .engagement_depth
                    .get(tier, *segment)
                    .ok_or_else(|| missing("engagement_depth", tier, Some(*segment)))?;
                check_weights(
                    &format!("engagement_depth.{tier}.{segment}"),
                    depth.as_array().into_iter(),
                )?;
            }
        }

        for (event_type, range) in &self.response_time_ms {
            check_int_range(&format!("response_time_ms.{event_type}"), range)?;
        }
        check_int_range("default_response_ms", &self.default_response_ms)?;

        let c = &self.catalogs;
        for (name, list) in [
            ("product_names", &c.product_names),
            ("device_types", &c.device_types),
            ("browsers", &c.browsers),
            ("operating_systems", &c.operating_systems),
            ("regions", &c.regions),
            ("cities", &c.cities),
            ("first_names", &c.first_names),
            ("last_names", &c.last_names),
            ("departments", &c.departments),
            ("titles.premium_champion", &self.titles.premium_champion),
            ("titles.premium_other", &self.titles.premium_other),
            ("titles.basic_champion", &self.titles.basic_champion),
            ("titles.basic_other", &self.titles.basic_other),
            ("titles.free", &self.titles.free),
            ("titles.cancelled", &self.titles.cancelled),
        ] {
            if list.is_empty() {
                return Err(anyhow::anyhow!("catalog '{name}' is empty").into());
            }
        }
        Ok(())
    }

    /// The hardcoded production tables.
    pub fn builtin() -> Self {
        use Segment::*;
        use Tier::*;

        let tier_weights = vec![(Free, 0.60), (Basic, 0.25), (Premium, 0.12), (Cancelled, 0.03)];

        let segment_weights = TierTable::from_rows(vec![
            (Free, vec![(ConversionReady, 0.15), (Engaged, 0.25), (Casual, 0.50), (AtRisk, 0.10)]),
            (Basic, vec![(Champion, 0.10), (Engaged, 0.60), (Casual, 0.25), (AtRisk, 0.05)]),
            (Premium, vec![(Champion, 0.70), (Engaged, 0.25), (Casual, 0.03), (AtRisk, 0.02)]),
            (Cancelled, vec![(AtRisk, 1.0)]),
        ]);

        let p = SessionPattern::new;
        let session_patterns = SegmentTable::from_rows(vec![
            (Free, vec![
                (ConversionReady, vec![
                    p("conversion_signal", &["login", "core_feature_usage", "usage_limit_hit", "premium_feature_explore", "pricing_page_view", "paywall_encounter", "logout"]),
                    p("value_realization", &["login", "workflow_start", "data_analysis", "insight_discovery", "share_result", "usage_limit_hit", "logout"]),
                ]),
                (Engaged, vec![
                    p("steady_usage", &["login", "dashboard_check", "basic_analytics", "report_generate", "logout"]),
                    p("exploration", &["login", "feature_discovery", "workflow_attempt", "basic_success", "logout"]),
                ]),
                (Casual, vec![
                    p("basic_usage", &["login", "dashboard_view", "basic_feature_try", "logout"]),
                    p("onboarding", &["login", "welcome_tour", "basic_feature_try", "help_view", "logout"]),
                ]),
                (AtRisk, vec![
                    p("declining_session", &["login", "dashboard_view", "feature_attempt", "error_event", "feature_abandon", "logout"]),
                    p("frustration", &["login", "feature_attempt", "error_event", "help_search", "logout"]),
                ]),
            ]),
            (Basic, vec![
                (Champion, vec![
                    p("upsell_exploration", &["login", "advanced_feature_usage", "team_management_view", "premium_feature_explore", "enterprise_trial", "logout"]),
                    p("power_usage", &["login", "advanced_analytics", "data_export", "team_sharing", "api_exploration", "logout"]),
                ]),
                (Engaged, vec![
                    p("steady_usage", &["login", "dashboard_analytics", "report_generate", "team_collaborate", "logout"]),
                    p("feature_adoption", &["login", "new_feature_try", "workflow_success", "share_result", "logout"]),
                ]),
                (Casual, vec![
                    p("basic_usage", &["login", "dashboard_check", "simple_report", "logout"]),
                    p("maintenance", &["login", "account_settings", "basic_feature", "logout"]),
                ]),
                (AtRisk, vec![
                    p("declining_usage", &["login", "dashboard_view", "payment_issue_check", "logout"]),
                    p("support_heavy", &["login", "feature_attempt", "error_event", "support_ticket_create", "logout"]),
                ]),
            ]),
            (Premium, vec![
                (Champion, vec![
                    p("power_session", &["login", "advanced_analytics", "custom_dashboard_create", "api_integration", "team_admin", "automation_setup", "logout"]),
                    p("collaboration", &["login", "team_workspace", "advanced_sharing", "cross_team_analytics", "enterprise_reporting", "logout"]),
                    p("viral_behavior", &["login", "success_showcase", "external_demo", "referral_program", "thought_leadership", "logout"]),
                ]),
                (Engaged, vec![
                    p("advanced_usage", &["login", "premium_analytics", "advanced_reporting", "team_management", "logout"]),
                    p("optimization", &["login", "workflow_optimization", "advanced_features", "performance_tuning", "logout"]),
                ]),
                (Casual, vec![
                    p("premium_basic", &["login", "premium_dashboard", "standard_analytics", "logout"]),
                ]),
                (AtRisk, vec![
                    p("value_questioning", &["login", "basic_feature_only", "cost_review", "competitor_comparison", "logout"]),
                ]),
            ]),
            (Cancelled, vec![
                (AtRisk, vec![
                    p("winback_attempt", &["login", "account_reactivation_view", "special_offer_view", "logout"]),
                    p("data_export", &["login", "data_export_final", "account_closure_prep", "logout"]),
                ]),
            ]),
        ]);

        let gap_minutes = TierTable::from_rows(vec![
            (Premium, RealRange::new(0.5, 3.0)),
            (Basic, RealRange::new(1.0, 5.0)),
            (Free, RealRange::new(2.0, 8.0)),
            (Cancelled, RealRange::new(5.0, 15.0)),
        ]);

        let response_time_ms = [
            ("login", IntRange::new(500, 2000)),
            ("dashboard_view", IntRange::new(300, 1500)),
            ("advanced_analytics", IntRange::new(1000, 5000)),
            ("api_integration", IntRange::new(200, 1000)),
            ("error_event", IntRange::new(50, 500)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let response_multiplier = TierTable::from_rows(vec![
            (Premium, 0.7),
            (Basic, 0.9),
            (Free, 1.0),
            (Cancelled, 1.3),
        ]);

        let churn_risk_base = SegmentTable::from_rows(vec![
            (Premium, vec![(Champion, 5), (Engaged, 10), (Casual, 25), (AtRisk, 60)]),
            (Basic, vec![(Champion, 15), (Engaged, 25), (Casual, 45), (AtRisk, 75)]),
            (Free, vec![(ConversionReady, 20), (Engaged, 35), (Casual, 55), (AtRisk, 85)]),
            (Cancelled, vec![(AtRisk, 95)]),
        ]);

        let retention_base = SegmentTable::from_rows(vec![
            (Premium, vec![(Champion, 95), (Engaged, 90), (Casual, 80), (AtRisk, 60)]),
            (Basic, vec![(Champion, 85), (Engaged, 75), (Casual, 60), (AtRisk, 40)]),
            (Free, vec![(ConversionReady, 70), (Engaged, 50), (Casual, 30), (AtRisk, 15)]),
            (Cancelled, vec![(AtRisk, 5)]),
        ]);

        let conversion_base = SegmentTable::from_rows(vec![
            (Free, vec![(ConversionReady, 75), (Engaged, 35), (Casual, 10), (AtRisk, 5)]),
            (Basic, vec![(Champion, 60), (Engaged, 25), (Casual, 5), (AtRisk, 2)]),
        ]);

        let upsell_base = SegmentTable::from_rows(vec![
            (Basic, vec![(Champion, 70), (Engaged, 40), (Casual, 15), (AtRisk, 5)]),
        ]);

        let r = IntRange::new;
        let health_score = SegmentTable::from_rows(vec![
            (Premium, vec![(Champion, r(80, 100)), (Engaged, r(70, 90)), (Casual, r(60, 80)), (AtRisk, r(30, 50))]),
            (Basic, vec![(Champion, r(70, 90)), (Engaged, r(60, 80)), (Casual, r(40, 70)), (AtRisk, r(20, 40))]),
            (Free, vec![(ConversionReady, r(50, 80)), (Engaged, r(40, 70)), (Casual, r(20, 50)), (AtRisk, r(10, 30))]),
            (Cancelled, vec![(AtRisk, r(5, 20))]),
        ]);

        let engagement_base = SegmentTable::from_rows(vec![
            (Premium, vec![(Champion, 85), (Engaged, 75), (Casual, 60), (AtRisk, 40)]),
            (Basic, vec![(Champion, 75), (Engaged, 65), (Casual, 45), (AtRisk, 25)]),
            (Free, vec![(ConversionReady, 70), (Engaged, 50), (Casual, 30), (AtRisk, 15)]),
            (Cancelled, vec![(AtRisk, 10)]),
        ]);

        let d = DepthWeights::new;
        let engagement_depth = SegmentTable::from_rows(vec![
            (Premium, vec![
                (Champion, d(0.05, 0.25, 0.70)),
                (Engaged, d(0.10, 0.50, 0.40)),
                (Casual, d(0.30, 0.60, 0.10)),
                (AtRisk, d(0.70, 0.30, 0.00)),
            ]),
            (Basic, vec![
                (Champion, d(0.10, 0.40, 0.50)),
                (Engaged, d(0.20, 0.60, 0.20)),
                (Casual, d(0.50, 0.40, 0.10)),
                (AtRisk, d(0.80, 0.20, 0.00)),
            ]),
            (Free, vec![
                (ConversionReady, d(0.15, 0.45, 0.40)),
                (Engaged, d(0.30, 0.50, 0.20)),
                (Casual, d(0.70, 0.30, 0.00)),
                (AtRisk, d(0.90, 0.10, 0.00)),
            ]),
            (Cancelled, vec![(AtRisk, d(0.95, 0.05, 0.00))]),
        ]);

        let usage = TierTable::from_rows(vec![
            (Premium, UsageProfile {
                seat_utilization:    RealRange::new(0.7, 0.95),
                storage_utilization: RealRange::new(0.6, 0.9),
                api_usage:           r(500, 2000),
                integrations:        r(3, 8),
                support_tickets:     r(0, 2),
            }),
            (Basic, UsageProfile {
                seat_utilization:    RealRange::new(0.5, 0.8),
                storage_utilization: RealRange::new(0.3, 0.7),
                api_usage:           r(50, 500),
                integrations:        r(1, 4),
                support_tickets:     r(0, 3),
            }),
            (Free, UsageProfile {
                seat_utilization:    RealRange::new(0.2, 0.6),
                storage_utilization: RealRange::new(0.1, 0.4),
                api_usage:           r(0, 50),
                integrations:        r(0, 1),
                support_tickets:     r(0, 4),
            }),
            (Cancelled, UsageProfile {
                seat_utilization:    RealRange::new(0.0, 0.1),
                storage_utilization: RealRange::new(0.0, 0.1),
                api_usage:           r(0, 0),
                integrations:        r(0, 0),
                support_tickets:     r(1, 5),
            }),
        ]);

        let mrr = TierTable::from_rows(vec![(Free, 0), (Basic, 99), (Premium, 299), (Cancelled, 0)]);
        let clv_months = TierTable::from_rows(vec![(Premium, 36), (Basic, 24), (Free, 0), (Cancelled, 0)]);

        let next_best_actions = [
            (Scenario::CacConversion, strings(&["upgrade_trial_offer", "usage_limit_education", "value_demonstration", "pricing_consultation"])),
            (Scenario::PlgUpsell, strings(&["premium_feature_demo", "team_expansion_consultation", "api_integration_support", "enterprise_trial"])),
            (Scenario::FailedConversion, strings(&["retention_outreach", "onboarding_restart", "success_coaching", "feature_education"])),
            (Scenario::Churn, strings(&["immediate_intervention", "value_recovery_program", "win_back_offer", "exit_interview"])),
            (Scenario::Winback, strings(&["reactivation_offer", "competitive_analysis", "success_story_sharing", "special_pricing"])),
            (Scenario::Retention, strings(&["engagement_optimization", "feature_recommendation", "success_measurement", "community_involvement"])),
        ]
        .into_iter()
        .collect();

        let feature_names = [
            ("login", "Authentication System"),
            ("logout", "Authentication System"),
            ("dashboard_view", "Executive Dashboard"),
            ("dashboard_check", "Quick Dashboard Check"),
            ("dashboard_analytics", "Analytics Dashboard"),
            ("premium_dashboard", "Premium Dashboard Suite"),
            ("basic_feature_try", "Basic Analytics"),
            ("basic_analytics", "Basic Reporting"),
            ("workflow_attempt", "Basic Workflow Engine"),
            ("welcome_tour", "Product Onboarding"),
            ("feature_discovery", "Feature Discovery"),
            ("core_feature_usage", "Core Analytics Engine"),
            ("usage_limit_hit", "Usage Limit System"),
            ("premium_feature_explore", "Premium Feature Preview"),
            ("pricing_page_view", "Pricing Information"),
            ("paywall_encounter", "Upgrade Prompts"),
            ("advanced_analytics", "Advanced Analytics Suite"),
            ("team_collaborate", "Team Collaboration"),
            ("data_export", "Data Export Engine"),
            ("report_generate", "Report Generator"),
            ("new_feature_try", "Feature Adoption"),
            ("team_management_view", "Team Management Console"),
            ("enterprise_trial", "Enterprise Feature Trial"),
            ("api_exploration", "API Gateway Preview"),
            ("advanced_feature_usage", "Advanced Feature Suite"),
            ("custom_dashboard_create", "Custom Dashboard Builder"),
            ("api_integration", "API Integration Hub"),
            ("automation_setup", "Workflow Automation"),
            ("team_admin", "Team Administration"),
            ("enterprise_reporting", "Enterprise Reporting Suite"),
            ("cross_team_analytics", "Cross-Team Analytics"),
            ("advanced_sharing", "Advanced Sharing & Permissions"),
            ("error_event", "Error Handling System"),
            ("feature_abandon", "User Experience Analytics"),
            ("support_ticket_create", "Support System"),
            ("payment_issue_check", "Payment Management"),
            ("competitor_comparison", "Competitive Analysis"),
            ("cost_review", "Cost Analysis Tools"),
            ("insight_discovery", "AI Insights Engine"),
            ("workflow_success", "Success Analytics"),
            ("share_result", "Results Sharing"),
            ("success_showcase", "Success Showcase"),
            ("external_demo", "External Demonstration"),
            ("account_reactivation_view", "Account Reactivation"),
            ("special_offer_view", "Winback Offers"),
            ("data_export_final", "Data Export & Migration"),
            ("account_closure_prep", "Account Closure"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let feature_sophistication = vec![
            (FeatureSophistication::Basic, strings(&["login", "logout", "dashboard_view", "basic_feature_try", "help_view"])),
            (FeatureSophistication::Intermediate, strings(&["data_analysis", "report_generate", "workflow_attempt", "core_feature_usage"])),
            (FeatureSophistication::Advanced, strings(&["advanced_analytics", "custom_dashboard_create", "api_integration", "team_sharing"])),
            (FeatureSophistication::Expert, strings(&["custom_configuration", "automation_setup", "enterprise_feature_trial", "admin_settings_explore"])),
        ];

        let catalogs = Catalogs {
            product_names:     strings(&["CloudTech Analytics Platform", "DataViz Pro", "Enterprise Dashboard"]),
            device_types:      strings(&["desktop", "mobile", "tablet", "api_client"]),
            browsers:          strings(&["Chrome", "Firefox", "Safari", "Edge"]),
            operating_systems: strings(&["Windows 11", "macOS", "iOS", "Android", "Linux"]),
            regions:           strings(&["CA", "NY", "TX", "WA", "FL", "IL", "GA", "MA", "OR", "CO"]),
            cities:            strings(&["San Francisco", "New York", "Austin", "Seattle", "Miami", "Chicago", "Atlanta", "Boston", "Portland", "Denver"]),
            first_names:       strings(&[
                "Alex", "Jordan", "Taylor", "Morgan", "Casey", "Riley", "Quinn", "Avery", "Cameron", "Drew",
                "Blake", "Sage", "River", "Phoenix", "Skyler", "Rowan", "Finley", "Harper", "Emery", "Parker",
            ]),
            last_names:        strings(&["Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez", "Martinez", "Hernandez"]),
            departments:       strings(&["Sales", "Marketing", "IT", "Operations", "Finance", "HR"]),
        };

        let titles = TitleCatalog {
            premium_champion: strings(&["VP Sales", "Director of Analytics", "Head of Data", "Chief Revenue Officer", "VP Marketing"]),
            premium_other:    strings(&["Senior Manager", "Director", "Principal Analyst", "Senior Director"]),
            basic_champion:   strings(&["Manager", "Senior Manager", "Team Lead", "Analytics Manager"]),
            basic_other:      strings(&["Manager", "Senior Analyst", "Team Lead", "Specialist"]),
            free:             strings(&["Analyst", "Associate", "Coordinator", "Specialist", "Junior Manager"]),
            cancelled:        strings(&["Former Manager", "Ex-Analyst", "Previous User"]),
        };

        Self {
            tier_weights,
            segment_weights,
            session_patterns,
            gap_minutes,
            response_time_ms,
            default_response_ms: IntRange::new(300, 1800),
            response_multiplier,
            churn_risk_base,
            retention_base,
            conversion_base,
            upsell_base,
            health_score,
            engagement_base,
            engagement_depth,
            usage,
            mrr,
            clv_months,
            next_best_actions,
            feature_names,
            feature_sophistication,
            catalogs,
            titles,
        }
    }
}

fn missing(table: &'static str, tier: Tier, segment: Option<Segment>) -> TelemetryError {
    TelemetryError::IncompleteTables {
        table,
        tier: tier.to_string(),
        segment: segment.map(|s| s.to_string()).unwrap_or_else(|| "*".into()),
    }
}

fn check_weights(table: &str, weights: impl Iterator<Item = f64>) -> TelemetryResult<()> {
    let mut sum = 0.0;
    for w in weights {
        if w < 0.0 {
            return Err(TelemetryError::InvalidWeights { table: table.to_string(), sum: w });
        }
        sum += w;
    }
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(TelemetryError::InvalidWeights { table: table.to_string(), sum });
    }
    Ok(())
}

fn check_int_range(table: &str, range: &IntRange) -> TelemetryResult<()> {
    if range.lo > range.hi {
        return Err(TelemetryError::InvalidRange {
            table: table.to_string(),
            lo: range.lo as f64,
            hi: range.hi as f64,
        });
    }
    Ok(())
}

fn check_real_range(table: &str, range: &RealRange) -> TelemetryResult<()> {
    if range.lo > range.hi {
        return Err(TelemetryError::InvalidRange { table: table.to_string(), lo: range.lo, hi: range.hi });
    }
    Ok(())
}

// ── Generator configuration ────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Master seed for every random stream.
    pub seed: u64,
    /// Exact number of events the dataset must contain.
    pub total_records: usize,
    /// Session start times fall within the 30 days before this instant.
    pub anchor: NaiveDateTime,
    /// Used only to estimate the user count for progress logging.
    pub avg_events_per_user: usize,
}

impl GeneratorConfig {
    pub fn new(seed: u64, total_records: usize, anchor: NaiveDateTime) -> Self {
        Self {
            seed,
            total_records,
            anchor,
            avg_events_per_user: 4,
        }
    }

    /// Fixed-anchor config for use in tests.
    pub fn default_test() -> Self {
        let anchor = NaiveDate::from_ymd_opt(2024, 6, 28)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid fixed anchor");
        Self::new(42, 200, anchor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_validate() {
        ReferenceTables::builtin().validate().expect("builtin tables must be complete");
    }

    #[test]
    fn json_round_trip_keeps_tables_valid() {
        let json = ReferenceTables::builtin().to_json_pretty().unwrap();
        let parsed: ReferenceTables = serde_json::from_str(&json).unwrap();
        parsed.validate().unwrap();
        assert_eq!(parsed.mrr.get(Tier::Premium), Some(&299));
    }

    #[test]
    fn missing_segment_patterns_are_rejected() {
        let mut tables = ReferenceTables::builtin();
        tables
            .session_patterns
            .0
            .get_mut(&Tier::Premium)
            .unwrap()
            .remove(&Segment::Casual);
        let err = tables.validate().unwrap_err();
        assert!(
            matches!(err, TelemetryError::IncompleteTables { table: "session_patterns", .. }),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn unbalanced_tier_weights_are_rejected() {
        let mut tables = ReferenceTables::builtin();
        tables.tier_weights[0].1 = 0.9;
        assert!(matches!(tables.validate(), Err(TelemetryError::InvalidWeights { .. })));
    }
}
