//! Basic usage example for citysearch-rs
//!
//! This example demonstrates how to:
//! - Search the instant tier with no I/O
//! - Load the full tier on demand
//! - Drive an interactive session through the query coordinator

use citysearch_rs::prelude::*;
use std::sync::Arc;
use std::time::Duration;

const EXTRA_CITIES: &str = "\
1,AZ,Arizona,Phoenix,Maricopa,33.45,-112.07,1608139
2,OR,Oregon,Phoenix,Jackson,42.27,-122.81,4475
3,NY,New York,Phoenix,Oswego,43.23,-76.30,2181
";

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== citysearch-rs Basic Usage Example ===\n");

    let store = TieredCityStore::new(Arc::new(StaticSource::new(EXTRA_CITIES)));
    println!("Instant tier: {} cities\n", store.instant_cities().len());

    // Example 1: instant search
    println!("--- Example 1: Instant search for \"spring\" ---");
    let instant = CityIndex::new(store.instant_set());
    for (i, city) in instant
        .search("spring", 5, &SearchOptions::default())
        .iter()
        .enumerate()
    {
        println!("{}. {} (pop. {:?})", i + 1, city.display_name(), city.population);
    }
    println!();

    // Example 2: restrict to a state by name
    println!("--- Example 2: Only Illinois ---");
    for city in instant.search("spring", 5, &SearchOptions::in_state("Illinois")) {
        println!("- {city}");
    }
    println!();

    // Example 3: full tier
    println!("--- Example 3: Full tier ---");
    let full = CityIndex::new(store.ensure_full_loaded().await);
    println!("Full tier: {} cities", full.len());
    for city in full.search("phoenix", 5, &SearchOptions::default()) {
        println!("- {city}");
    }
    if let Some(city) = full.find_by_display_name("Phoenix, OR") {
        println!("Selected value resolves to {} in {:?} County", city, city.county());
    }
    println!();

    // Example 4: coordinator
    println!("--- Example 4: Debounced session ---");
    let store = TieredCityStore::new(Arc::new(StaticSource::new(EXTRA_CITIES)));
    let settings = CoordinatorSettings {
        debounce: Duration::from_millis(50),
        ..CoordinatorSettings::default()
    };
    let (coordinator, mut updates) = QueryCoordinator::spawn(store, settings);
    for typed in ["p", "ph", "pho", "phoe"] {
        coordinator.submit(typed);
    }
    // Instant answer first, then the upgrade once the full tier is in.
    for _ in 0..2 {
        let Some(update) = updates.recv().await else {
            break;
        };
        println!(
            "#{} {:?} [{}]: {} results",
            update.seq,
            update.query,
            update.tier,
            update.results.len()
        );
    }

    Ok(())
}
