//! citysearch: command-line interface for citysearch-core
//!
//! Runs one-shot searches against the instant or full tier, resolves
//! previously selected display names, prints tier statistics, and drives
//! an interactive debounced session from stdin.
//!
//! Usage examples
//! --------------
//!
//! - Ranked search (full tier loaded on demand)
//!   $ citysearch search phoenix
//!
//! - Only the embedded instant tier
//!   $ citysearch search aus --instant-only
//!
//! - Restrict to a state
//!   $ citysearch search springfield --state IL
//!
//! - Interactive session (each stdin line is the current input)
//!   $ printf 'p\nph\nphoenix\n' | citysearch interactive
//!
//! Data source
//! -----------
//!
//! The full tier is read from `--dataset`, `CITYSEARCH_DATASET`, or the
//! `dataset` key of the config file, in that order. When it cannot be
//! loaded every command falls back to the instant tier.
mod args;

use crate::args::{CliArgs, Commands};
use anyhow::Context;
use citysearch_core::states::all_states;
use citysearch_core::text::query_len;
use citysearch_core::{
    CityIndex, CityRecord, CitySet, CoordinatorSettings, LookupConfig, QueryCoordinator,
    SearchOptions, Tier, TieredCityStore,
};
use clap::Parser;
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    let mut config =
        LookupConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    if let Some(dataset) = args.dataset {
        config.dataset = dataset;
        config.validate()?;
    }
    tracing::debug!(?config, "configuration resolved");

    let store = TieredCityStore::from_config(&config);

    match args.command {
        Commands::Search {
            query,
            state,
            limit,
            instant_only,
        } => {
            let (tier, set) = tier_set(&store, instant_only).await;
            let opts = SearchOptions { state_code: state };
            let limit = limit.unwrap_or(config.result_limit);
            let results = if query_len(&query) < config.min_query_chars {
                Vec::new()
            } else {
                CityIndex::new(set).search(&query, limit, &opts)
            };

            if args.json {
                let out = json!({ "query": query, "tier": tier, "results": results });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else if results.is_empty() {
                println!("No cities found matching: {query}");
            } else {
                for (i, city) in results.iter().enumerate() {
                    println!("{:>2}. {}", i + 1, describe(city));
                }
                println!("({tier} tier)");
            }
        }

        Commands::Lookup {
            display,
            instant_only,
        } => {
            let (tier, set) = tier_set(&store, instant_only).await;
            let index = CityIndex::new(set);
            match index.find_by_display_name(&display) {
                Some(city) if args.json => {
                    println!("{}", serde_json::to_string_pretty(city)?);
                }
                Some(city) => {
                    println!("City: {}", city.name);
                    println!("State: {} ({})", city.state_name, city.state_code);
                    println!("County: {}", city.county().unwrap_or("-"));
                    match city.population {
                        Some(p) => println!("Population: {p}"),
                        None => println!("Population: unknown"),
                    }
                    if let (Some(lat), Some(lng)) = (city.latitude, city.longitude) {
                        println!("Coordinates: {lat:.4}, {lng:.4}");
                    }
                    println!("Tier: {tier}");
                }
                None => anyhow::bail!("no city found for: {display}"),
            }
        }

        Commands::Stats {
            instant_only,
            by_state,
        } => {
            let instant_set = store.instant_set();
            let instant = instant_set.stats();
            let full_set = if instant_only {
                None
            } else {
                store.ensure_full_loaded().await;
                store.full_set()
            };
            let full = full_set.as_ref().map(|set| set.stats());
            // Per-state counts come from the best tier that loaded.
            let counted = full_set.as_ref().unwrap_or(&instant_set);

            if args.json {
                let mut out = json!({ "instant": instant, "full": full });
                if by_state {
                    let states: serde_json::Map<String, serde_json::Value> = counted
                        .state_counts()
                        .into_iter()
                        .map(|(code, n)| (code.to_string(), json!(n)))
                        .collect();
                    out["by_state"] = serde_json::Value::Object(states);
                }
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("Database statistics:");
                println!("  Instant tier: {} cities in {} states", instant.cities, instant.states);
                match full {
                    Some(full) => println!(
                        "  Full tier: {} cities in {} states",
                        full.cities, full.states
                    ),
                    None if instant_only => println!("  Full tier: not requested"),
                    None => println!("  Full tier: unavailable ({})", config.dataset),
                }
                if by_state {
                    println!("Cities per state:");
                    for (code, n) in counted.state_counts() {
                        println!("  {code}  {n}");
                    }
                }
            }
        }

        Commands::States => {
            if args.json {
                let out: Vec<_> = all_states()
                    .iter()
                    .map(|(code, name)| json!({ "code": code, "name": name }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                for (code, name) in all_states() {
                    println!("{code}  {name}");
                }
            }
        }

        Commands::Interactive { state } => {
            let mut settings = CoordinatorSettings::from(&config);
            settings.options = SearchOptions { state_code: state };
            run_interactive(store, settings, args.json).await?;
        }

        Commands::Config => {
            print!("{}", citysearch_core::config::example_config());
        }
    }

    Ok(())
}

/// The tier a one-shot command should search.
async fn tier_set(store: &TieredCityStore, instant_only: bool) -> (Tier, Arc<CitySet>) {
    if instant_only {
        return (Tier::Instant, store.instant_set());
    }
    let set = store.ensure_full_loaded().await;
    if store.is_full_loaded() {
        (Tier::Full, set)
    } else {
        (Tier::Instant, set)
    }
}

fn describe(city: &CityRecord) -> String {
    let mut line = city.display_name();
    if let Some(county) = city.county() {
        line.push_str(&format!(" ({county} County)"));
    }
    if let Some(population) = city.population {
        line.push_str(&format!(", pop. {population}"));
    }
    line
}

async fn run_interactive(
    store: TieredCityStore,
    settings: CoordinatorSettings,
    json: bool,
) -> anyhow::Result<()> {
    let (coordinator, mut updates) = QueryCoordinator::spawn(store, settings);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => coordinator.submit(line),
                None => break,
            },
            update = updates.recv() => match update {
                Some(update) => print_update(&update, json)?,
                None => return Ok(()),
            },
        }
    }

    // Stdin is closed: print what the last input still produces, then exit.
    coordinator.settled().await;
    while let Ok(update) = updates.try_recv() {
        print_update(&update, json)?;
    }
    Ok(())
}

fn print_update(update: &citysearch_core::SearchUpdate, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(update)?);
        return Ok(());
    }
    println!(
        "[#{} {} tier] {:?}: {} result(s)",
        update.seq,
        update.tier,
        update.query,
        update.results.len()
    );
    for city in &update.results {
        println!("    {}", describe(city));
    }
    Ok(())
}
