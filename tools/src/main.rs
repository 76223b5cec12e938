//! telemetry-runner: headless dataset generator for tier-aware PLG telemetry.
//!
//! Usage:
//!   telemetry-runner --records 1000 --seed 42
//!   telemetry-runner --records 500 --anchor 2024-06-28T12:00:00 --output run.csv
//!   telemetry-runner --dump-tables tables.json

mod export;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use clap::Parser;
use plg_telemetry_core::{
    config::{GeneratorConfig, ReferenceTables},
    dataset::{Dataset, DatasetGenerator},
    types::Tier,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "telemetry-runner")]
#[command(about = "Tier-aware PLG product telemetry generator")]
struct Args {
    /// Number of event records to generate
    #[arg(long, default_value = "1000")]
    records: usize,

    /// Master seed for both random streams
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Lookback anchor (RFC 3339 or %Y-%m-%dT%H:%M:%S); defaults to now, UTC
    #[arg(long)]
    anchor: Option<String>,

    /// Output CSV file; defaults to a timestamped name
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON reference-table override
    #[arg(long)]
    tables: Option<String>,

    /// Write the active reference tables as JSON to this path and exit
    #[arg(long)]
    dump_tables: Option<PathBuf>,

    /// Skip the printed summary
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let tables = match &args.tables {
        Some(path) => ReferenceTables::load(path)?,
        None => {
            let tables = ReferenceTables::builtin();
            tables.validate()?;
            tables
        }
    };

    if let Some(path) = &args.dump_tables {
        std::fs::write(path, tables.to_json_pretty()?)
            .with_context(|| format!("Cannot write {}", path.display()))?;
        println!("Reference tables written to {}", path.display());
        return Ok(());
    }

    let anchor = match &args.anchor {
        Some(s) => parse_anchor(s)?,
        None => Utc::now().naive_utc(),
    };
    let output = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(format!(
            "tier_aware_plg_telemetry_{}.csv",
            Local::now().format("%Y%m%d_%H%M%S")
        ))
    });

    if !args.quiet {
        println!("Tier-aware PLG telemetry generator");
        println!("  records:  {}", args.records);
        println!("  seed:     {}", args.seed);
        println!("  anchor:   {anchor}");
        println!("  output:   {}", output.display());
        println!();
    }

    let config = GeneratorConfig::new(args.seed, args.records, anchor);
    let dataset = DatasetGenerator::new(&tables, config).generate()?;

    let file = File::create(&output).with_context(|| format!("Cannot create {}", output.display()))?;
    export::write_csv(&dataset.events, BufWriter::new(file))?;

    if !args.quiet {
        print_summary(&dataset);
        println!("\nDataset saved as: {}", output.display());
    }
    Ok(())
}

fn parse_anchor(s: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map_err(|e| anyhow!("Invalid --anchor '{s}': {e}"))
}

fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn print_summary(dataset: &Dataset) {
    let s = &dataset.summary;

    println!("=== Dataset Summary ===");
    println!("  Total records:    {}", s.total_events);
    println!("  Unique users:     {}", s.unique_users);
    println!("  Unique sessions:  {}", s.unique_sessions);
    if let (Some(first), Some(last)) = (s.first_timestamp, s.last_timestamp) {
        println!("  Date range:       {first} to {last}");
    }

    println!("\n=== Tier Distribution (users) ===");
    for (tier, count) in &s.users_per_tier {
        println!("  {tier:<10} {count:>5} ({:.1}%)", pct(*count, s.profiles_generated));
    }

    println!("\n=== Scenario Distribution (users) ===");
    for (scenario, count) in &s.users_per_scenario {
        println!("  {:<18} {count:>5} ({:.1}%)", scenario.as_str(), pct(*count, s.profiles_generated));
    }

    println!("\n=== Segment Distribution (events) ===");
    for (segment, count) in &s.events_per_segment {
        println!("  {:<18} {count:>5} ({:.1}%)", segment.as_str(), pct(*count, s.total_events));
    }

    println!("\n=== Tier Analytics ===");
    println!(
        "  {:<10} {:>6} {:>8} {:>11} {:>11} {:>11}",
        "tier", "users", "mrr", "engagement", "churn_risk", "conversion"
    );
    for (tier, m) in &s.tier_means {
        println!(
            "  {:<10} {:>6} {:>8.2} {:>11.2} {:>11.2} {:>11.2}",
            tier.as_str(),
            m.users,
            m.mean_mrr,
            m.mean_engagement,
            m.mean_churn_risk,
            m.mean_conversion_propensity
        );
    }

    println!("\n=== Scenario Signals ===");
    println!(
        "  {:<18} {:>6} {:>11} {:>10} {:>6} {:>6}",
        "scenario", "users", "conversion", "expansion", "churn", "value"
    );
    for (scenario, sig) in &s.scenario_signals {
        println!(
            "  {:<18} {:>6} {:>11} {:>10} {:>6} {:>6}",
            scenario.as_str(),
            sig.users,
            sig.conversion_signals,
            sig.expansion_signals,
            sig.churn_indicators,
            sig.value_realization_events
        );
    }

    println!("\n=== Sample Records ===");
    for e in dataset.events.iter().take(10) {
        println!(
            "  {:<22} {:<9} {:<16} {:<17} {:<26} {:>4} {:>4}",
            e.event_id,
            e.subscription_tier.as_str(),
            e.user_segment.as_str(),
            e.plg_scenario.as_str(),
            e.event_type,
            e.mrr_contribution,
            e.conversion_propensity
        );
    }

    let events_of = |tier| s.tier_means.get(&tier).map_or(0, |m| m.events);
    let free_events = events_of(Tier::Free);
    let basic_events = events_of(Tier::Basic);
    let paid_events = basic_events + events_of(Tier::Premium);

    println!("\n=== Tier Insights ===");
    println!(
        "  Free conversion signals: {} ({:.1}% of Free events)",
        s.free_conversion_signals,
        pct(s.free_conversion_signals, free_events)
    );
    println!(
        "  Basic upsell signals:    {} ({:.1}% of Basic events)",
        s.basic_expansion_signals,
        pct(s.basic_expansion_signals, basic_events)
    );
    println!(
        "  Paid churn indicators:   {} ({:.1}% of paid events)",
        s.paid_churn_indicators,
        pct(s.paid_churn_indicators, paid_events)
    );
    println!("  Total MRR represented:   ${:.2}", s.total_mrr as f64);
    println!("  Average MRR per user:    ${:.2}", s.mean_mrr_per_user);
}
