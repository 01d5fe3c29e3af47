//! locref-cli, the command-line interface for locref-core
//!
//! This binary drives the location import pipeline from your terminal and
//! lets you inspect the resulting store. The store is kept as a snapshot
//! file next to where you run the tool (see `--snapshot`).
//!
//! Usage examples
//! --------------
//!
//! - Import the full dataset from the upstream repository
//!   $ locref run
//!
//! - Re-import, overwriting records that already exist
//!   $ locref run --force
//!
//! - Import from a local directory of dataset files
//!   $ locref run --from-dir ./data
//!
//! - Show overall stats
//!   $ locref stats
//!
//! - Show details for a country by code (ISO2 or ISO3, case-insensitive)
//!   $ locref country us
//!   $ locref country deu
//!
//! - List states for a country (by ISO2)
//!   $ locref states US
//!
//! - List the cities of a state
//!   $ locref cities Illinois
//!
//! Data source
//! -----------
//!
//! By default, `run` fetches the dataset JSON files over HTTP from the
//! upstream repository. Use `--from-dir <path>` to read local copies
//! (plain or gzipped) and `--base-url <url>` to point at a mirror.
mod args;

use std::path::Path;

use crate::args::{CliArgs, Commands};
use anyhow::Context;
use clap::Parser;
use locref_core::{
    refresh_location_data, refresh_location_data_chunked, resolver, DatasetSource, DirSource,
    EntityKind, GeoStore, LogNotifier, MemoryStore,
};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = CliArgs::parse();
    let snapshot = Path::new(&args.snapshot);

    let mut store = if snapshot.is_file() {
        MemoryStore::load_from_path(snapshot)?
    } else {
        MemoryStore::new()
    };

    match args.command {
        Commands::Run {
            force,
            chunk_size,
            from_dir,
            base_url,
        } => {
            let source = build_source(from_dir, base_url)?;
            let report = match chunk_size {
                Some(chunk) => refresh_location_data_chunked(
                    &mut store,
                    source.as_ref(),
                    &LogNotifier,
                    force,
                    chunk,
                )?,
                None => refresh_location_data(&mut store, source.as_ref(), force)?,
            };

            println!("Import finished:");
            for level in report.levels() {
                println!(
                    "  {}: {} imported, {} skipped, {} failed",
                    level.level,
                    level.imported,
                    level.skipped,
                    level.failed()
                );
            }
            for level in report.levels() {
                for failure in &level.failures {
                    eprintln!("  [{}] {}: {}", level.level, failure.key, failure.reason);
                }
            }

            store
                .save_to_path(snapshot)
                .with_context(|| format!("writing snapshot {}", snapshot.display()))?;
            println!("Snapshot written to {}", snapshot.display());
        }

        Commands::Stats => {
            println!("Store statistics:");
            for kind in EntityKind::IN_DEPENDENCY_ORDER {
                println!("  {}: {}", kind, store.count(kind)?);
            }
        }

        Commands::Country { code } => {
            let found = match resolver::country_for_upsert(&store, Some(&code), Some(&code), &code)? {
                Some(key) => store.get(EntityKind::Country, &key)?,
                None => None,
            };
            match found.as_ref().and_then(|r| r.as_country()) {
                Some(c) => {
                    println!("Country: {}", c.country_name);
                    println!("ISO2: {}", c.code);
                    println!("ISO3: {}", c.iso3);
                    println!("Capital: {}", c.capital);
                    println!("Phone Code: {}", c.phone_code);
                    println!("Currency: {}", c.currency_name);
                    println!("Region: {}", c.region);
                    println!("Subregion: {}", c.subregion);
                    println!("States: {}", store.states_of(&c.key).len());
                }
                None => eprintln!("No country found for: {code}"),
            }
        }

        Commands::States { iso2 } => {
            let found = match resolver::country_by_code(&store, &iso2)? {
                Some(key) => store.get(EntityKind::Country, &key)?,
                None => None,
            };
            match found.as_ref().and_then(|r| r.as_country()) {
                Some(c) => {
                    println!("States in {}:", c.country_name);
                    for s in store.states_of(&c.key) {
                        println!("- {}", s.state_name);
                    }
                }
                None => eprintln!("Country {iso2} not found"),
            }
        }

        Commands::State { name } => {
            match store.get(EntityKind::State, &name)?.as_ref().and_then(|r| r.as_state()) {
                Some(s) => {
                    println!("State: {}", s.state_name);
                    println!("Code: {}", s.state_code);
                    println!("Type: {}", s.state_type);
                    println!("Country: {}", s.country);
                    println!("Country Code: {}", s.country_code);
                    println!("Active: {}", s.is_active);
                    println!("Cities: {}", store.cities_of(&s.key).len());
                }
                None => eprintln!("State {name} not found"),
            }
        }

        Commands::Cities { state } => {
            if store.get(EntityKind::State, &state)?.is_none() {
                eprintln!("State {state} not found");
            } else {
                for city in store.cities_of(&state) {
                    println!("{} ({}, {})", city.city_name, city.state, city.country);
                }
            }
        }
    }

    Ok(())
}

/// Pick the dataset source for `run` from the CLI flags.
fn build_source(
    from_dir: Option<String>,
    base_url: Option<String>,
) -> anyhow::Result<Box<dyn DatasetSource>> {
    if let Some(dir) = from_dir {
        return Ok(Box::new(DirSource::new(dir)));
    }

    #[cfg(feature = "fetch")]
    {
        let source = match base_url {
            Some(url) => locref_core::HttpSource::with_base_url(url),
            None => locref_core::HttpSource::new(),
        };
        Ok(Box::new(source))
    }

    #[cfg(not(feature = "fetch"))]
    {
        let _ = base_url;
        anyhow::bail!("built without HTTP support; use --from-dir")
    }
}
