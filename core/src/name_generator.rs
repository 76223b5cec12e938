//! Deterministic identity generation for synthetic users.
//!
//! Names come from the curated catalogs in the reference tables; all
//! generation is deterministic (same stream state = same identity).
//! Emails always use the reserved example.com domain.

use crate::{
    config::{Catalogs, TitleCatalog},
    rng::RandomSource,
    types::{Segment, Tier},
};

/// Title used when a tier's pool is empty.
pub const DEFAULT_TITLE: &str = "Specialist";

/// Identity fields for one synthetic user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub first_name: String,
    pub last_name:  String,
    pub email:      String,
    pub department: String,
    pub phone:      String,
}

pub struct NameGenerator<'t> {
    catalogs: &'t Catalogs,
    titles:   &'t TitleCatalog,
}

impl<'t> NameGenerator<'t> {
    pub fn new(catalogs: &'t Catalogs, titles: &'t TitleCatalog) -> Self {
        Self { catalogs, titles }
    }

    /// Draw first name, last name, department and phone in that order.
    pub fn generate_identity(&self, rng: &mut dyn RandomSource) -> Identity {
        let first_name = rng.choose(&self.catalogs.first_names).clone();
        let last_name = rng.choose(&self.catalogs.last_names).clone();
        let email = format!("{}.{}@example.com", first_name.to_lowercase(), last_name.to_lowercase());
        let department = rng.choose(&self.catalogs.departments).clone();
        let phone = format!(
            "555-{}-{}",
            rng.uniform_int(100, 999),
            rng.uniform_int(1000, 9999)
        );
        Identity {
            first_name,
            last_name,
            email,
            department,
            phone,
        }
    }

    /// Job title; seniority tracks tier, and champions skew senior.
    pub fn generate_title(&self, tier: Tier, segment: Segment, rng: &mut dyn RandomSource) -> String {
        let pool = match (tier, segment) {
            (Tier::Premium, Segment::Champion) => &self.titles.premium_champion,
            (Tier::Premium, _) => &self.titles.premium_other,
            (Tier::Basic, Segment::Champion) => &self.titles.basic_champion,
            (Tier::Basic, _) => &self.titles.basic_other,
            (Tier::Free, _) => &self.titles.free,
            (Tier::Cancelled, _) => &self.titles.cancelled,
        };
        if pool.is_empty() {
            return DEFAULT_TITLE.to_string();
        }
        rng.choose(pool).clone()
    }
}
