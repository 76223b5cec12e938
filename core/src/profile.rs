//! Profile assignment: tier, segment, identity and scenario per user.
//!
//! Tier and segment come from the weighted stream; identity fields and
//! titles come from the uniform stream. The scenario is never drawn: it is
//! a pure function of (tier, segment).

use crate::{
    config::ReferenceTables,
    name_generator::NameGenerator,
    rng::RandomStreams,
    types::{Scenario, Segment, Tier, UserId},
};
use serde::{Deserialize, Serialize};

/// Immutable once created; read-only input to every later step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id:     UserId,
    pub external_id: String,
    pub first_name:  String,
    pub last_name:   String,
    pub email:       String,
    pub phone:       String,
    pub tier:        Tier,
    pub segment:     Segment,
    pub title:       String,
    pub department:  String,
    pub scenario:    Scenario,
}

pub struct ProfileAssigner<'t> {
    tables: &'t ReferenceTables,
    names:  NameGenerator<'t>,
}

impl<'t> ProfileAssigner<'t> {
    pub fn new(tables: &'t ReferenceTables) -> Self {
        Self {
            tables,
            names: NameGenerator::new(&tables.catalogs, &tables.titles),
        }
    }

    pub fn assign_profile(&self, index: usize, streams: &mut RandomStreams) -> UserProfile {
        let tier = self.pick_tier(streams);
        let segment = self.pick_segment(tier, streams);

        let identity = self.names.generate_identity(streams.uniform.as_mut());
        let title = self.names.generate_title(tier, segment, streams.uniform.as_mut());

        UserProfile {
            user_id: format!(
                "user_{}_{}_{index:04}",
                identity.first_name.to_lowercase(),
                identity.last_name.to_lowercase()
            ),
            external_id: format!("EXT_{index:06}"),
            first_name: identity.first_name,
            last_name: identity.last_name,
            email: identity.email,
            phone: identity.phone,
            tier,
            segment,
            title,
            department: identity.department,
            scenario: Scenario::derive(tier, segment),
        }
    }

    /// Weighted draw over the tier table; Free when the table is empty.
    pub fn pick_tier(&self, streams: &mut RandomStreams) -> Tier {
        streams
            .weighted
            .weighted_choice(&self.tables.tier_weights)
            .copied()
            .unwrap_or(Tier::Free)
    }

    /// Weighted draw over the tier's segment table; casual when unmapped.
    pub fn pick_segment(&self, tier: Tier, streams: &mut RandomStreams) -> Segment {
        let Some(weights) = self.tables.segment_weights.get(tier) else {
            log::warn!("no segment weights for tier {tier}, defaulting to casual");
            return Segment::Casual;
        };
        streams
            .weighted
            .weighted_choice(weights)
            .copied()
            .unwrap_or(Segment::Casual)
    }
}
