//! plg-telemetry-core: seeded synthesis of tier-aware product telemetry.
//!
//! Pipeline: ReferenceTables → ProfileAssigner → SessionExpander →
//! MetricSynthesizer → RecordAssembler, driven by DatasetGenerator.

pub mod config;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod name_generator;
pub mod profile;
pub mod record;
pub mod rng;
pub mod session;
pub mod types;
