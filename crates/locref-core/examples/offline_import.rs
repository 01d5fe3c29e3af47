//! Offline import example for locref-core
//!
//! This example demonstrates how to:
//! - Run the import pipeline against local dataset files (no network)
//! - Read the per-level import report
//! - Resolve countries by code and walk the hierarchy
//! - Tell two same-named cities apart by their composite identity

use std::fs;

use locref_core::{refresh_location_data, resolver, DirSource, EntityKind, GeoStore, MemoryStore};

const SUBREGIONS: &str = r#"[
    {"id": 1, "name": "Americas", "wikiDataId": "Q828"},
    {"id": 2, "name": "Northern America", "region_id": 1, "wikiDataId": "Q2017699"}
]"#;

const COUNTRIES: &str = r#"[
    {"id": 233, "name": "United States", "iso2": "US", "iso3": "USA",
     "phonecode": "1", "capital": "Washington", "currency_name": "United States dollar",
     "region": "Americas", "subregion": "Northern America",
     "latitude": "38.00000000", "longitude": "-97.00000000"}
]"#;

const STATES: &str = r#"[
    {"id": 1416, "name": "Illinois", "country_code": "US", "iso2": "IL", "type": "state"},
    {"id": 4851, "name": "Ohio", "country_code": "US", "iso2": "OH", "type": "state"}
]"#;

const CITIES: &str = r#"[
    {"id": 1, "name": "Springfield", "state_name": "Illinois", "country_code": "US",
     "latitude": "39.80172000", "longitude": "-89.64371000"},
    {"id": 2, "name": "Springfield", "state_name": "Ohio", "country_code": "US"},
    {"id": 3, "name": "Chicago", "state_name": "Illinois", "country_code": "US"}
]"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== locref Offline Import Example ===\n");

    // Write a miniature dataset into a scratch directory.
    let dir = std::env::temp_dir().join("locref-offline-import");
    fs::create_dir_all(&dir)?;
    fs::write(dir.join("subregions.json"), SUBREGIONS)?;
    fs::write(dir.join("countries.json"), COUNTRIES)?;
    fs::write(dir.join("states.json"), STATES)?;
    fs::write(dir.join("cities.json"), CITIES)?;

    // Example 1: run the pipeline from the directory
    println!("--- Example 1: Import from a local directory ---");
    let source = DirSource::new(&dir);
    let mut store = MemoryStore::new();
    let report = refresh_location_data(&mut store, &source, false)?;
    println!("✓ Import finished: {report}");
    for level in report.levels() {
        println!(
            "  {}: {} imported, {} skipped, {} failed",
            level.level,
            level.imported,
            level.skipped,
            level.failed()
        );
    }
    println!();

    // Example 2: store contents by level
    println!("--- Example 2: Store counts ---");
    for kind in EntityKind::IN_DEPENDENCY_ORDER {
        println!("  {}: {}", kind, store.count(kind)?);
    }
    println!();

    // Example 3: resolve a country by code, any casing
    println!("--- Example 3: Country lookup by code ---");
    for query in ["US", "us", "usa"] {
        match resolver::country_for_upsert(&store, Some(query), Some(query), query)? {
            Some(key) => println!("  {query} -> {key}"),
            None => println!("  {query} -> not found"),
        }
    }
    println!();

    // Example 4: walk the hierarchy downwards
    println!("--- Example 4: States and cities of a country ---");
    if let Some(key) = resolver::country_by_code(&store, "us")? {
        for state in store.states_of(&key) {
            let cities = store.cities_of(&state.key);
            println!("  {} ({}): {} cities", state.state_name, state.state_code, cities.len());
            for city in cities {
                println!("    - {}", city.city_name);
            }
        }
    }
    println!();

    // Example 5: same city name, two states, two records
    println!("--- Example 5: Composite city identity ---");
    for key in ["Springfield-Illinois", "Springfield-Ohio"] {
        if let Some(record) = store.get(EntityKind::City, key)? {
            let city = record.as_city().unwrap();
            println!("  {key}: state_code={}, country={}", city.state_code, city.country);
        }
    }

    fs::remove_dir_all(&dir).ok();
    println!("\n=== Example completed successfully ===");
    Ok(())
}
