// crates/locref-core/tests/import_pipeline.rs
//! End-to-end runs of the import pipeline against fixture dataset files.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use serde_json::json;

use locref_core::{
    refresh_location_data, refresh_location_data_chunked, CommitCadence, DatasetFile,
    DatasetSource, EntityKind, FetchError, Filter, FilterField, GeoRecord, GeoStore, ImportError,
    ImportOptions, Importer, MemoryStore, Notifier, StoreError, StoreResult,
};

// ---- FIXTURES ----

struct FixtureSource {
    files: BTreeMap<&'static str, Vec<u8>>,
    failing: BTreeSet<&'static str>,
}

impl FixtureSource {
    /// A small but complete dataset: three regions, one resolvable
    /// subregion, two countries, two states plus one orphan, three
    /// cities plus one orphan.
    fn standard() -> Self {
        let mut files = BTreeMap::new();
        files.insert(
            DatasetFile::Subregions.file_name(),
            json!([
                {"id": 1, "name": "Americas", "wikiDataId": "Q828"},
                {"id": 2, "name": "Northern America", "wikiDataId": "Q2017699", "region_id": 1},
                {"id": 3, "name": "Europe", "wikiDataId": "Q46"}
            ])
            .to_string()
            .into_bytes(),
        );
        files.insert(
            DatasetFile::Countries.file_name(),
            json!([
                {
                    "id": 233,
                    "name": "United States",
                    "iso2": "US",
                    "iso3": "USA",
                    "numeric_code": "840",
                    "phonecode": "1",
                    "capital": "Washington",
                    "currency_name": "United States dollar",
                    "currency_symbol": "$",
                    "tld": ".us",
                    "native": "United States",
                    "nationality": "American",
                    "region": "Americas",
                    "subregion": "Northern America",
                    "latitude": "38.00000000",
                    "longitude": "-97.00000000",
                    "emoji": "🇺🇸",
                    "emojiU": "U+1F1FA U+1F1F8"
                },
                {
                    "id": 76,
                    "name": "Brazil",
                    "iso2": "BR",
                    "iso3": "BRA",
                    "region": "Americas",
                    "subregion": "South America",
                    "latitude": "-10.00000000",
                    "longitude": "-55.00000000"
                },
                {"id": 999, "name": "   ", "iso2": "ZZ"}
            ])
            .to_string()
            .into_bytes(),
        );
        files.insert(
            DatasetFile::States.file_name(),
            json!([
                {
                    "id": 1416,
                    "name": "Illinois",
                    "country_code": "US",
                    "iso2": "IL",
                    "type": "state",
                    "latitude": "40.63312850",
                    "longitude": "-89.39852830"
                },
                {"id": 1443, "name": "Ohio", "country_code": "US", "iso2": "OH", "type": "state"},
                {"id": 9999, "name": "Atlantis Province", "country_code": "XX"}
            ])
            .to_string()
            .into_bytes(),
        );
        files.insert(
            DatasetFile::Cities.file_name(),
            json!([
                {
                    "id": 111,
                    "name": "Springfield",
                    "state_name": "Illinois",
                    "country_code": "US",
                    "latitude": "39.80172000",
                    "longitude": "-89.64371000",
                    "wikiDataId": "Q28515"
                },
                {"id": 222, "name": "Springfield", "state_name": "Ohio", "country_code": "US"},
                {"id": 333, "name": "Chicago", "state_name": "Illinois", "country_code": "US"},
                {"id": 444, "name": "Lost City", "state_name": "Atlantis Province", "country_code": "XX"}
            ])
            .to_string()
            .into_bytes(),
        );

        FixtureSource {
            files,
            failing: BTreeSet::new(),
        }
    }

    fn failing(mut self, file: DatasetFile) -> Self {
        self.failing.insert(file.file_name());
        self
    }

    fn with_file(mut self, file: DatasetFile, rows: serde_json::Value) -> Self {
        self.files
            .insert(file.file_name(), rows.to_string().into_bytes());
        self
    }
}

impl DatasetSource for FixtureSource {
    fn fetch_bytes(&self, file: DatasetFile) -> Result<Vec<u8>, FetchError> {
        if self.failing.contains(file.file_name()) {
            return Err(FetchError::Status {
                file: file.file_name(),
                status: 503,
            });
        }
        Ok(self
            .files
            .get(file.file_name())
            .cloned()
            .unwrap_or_else(|| b"[]".to_vec()))
    }
}

#[derive(Default)]
struct RecordingNotifier {
    events: RefCell<Vec<(String, String, String)>>,
}

impl Notifier for RecordingNotifier {
    fn publish(&self, event: &str, message: &str, user: &str) {
        self.events
            .borrow_mut()
            .push((event.to_string(), message.to_string(), user.to_string()));
    }
}

/// Store whose commits always fail, for exercising run aborts.
struct PoisonedStore {
    inner: MemoryStore,
}

impl GeoStore for PoisonedStore {
    fn lookup(&self, kind: EntityKind, filter: &Filter) -> StoreResult<Option<String>> {
        self.inner.lookup(kind, filter)
    }

    fn get(&self, kind: EntityKind, key: &str) -> StoreResult<Option<GeoRecord>> {
        self.inner.get(kind, key)
    }

    fn save(&mut self, record: GeoRecord) -> StoreResult<String> {
        self.inner.save(record)
    }

    fn commit(&mut self) -> StoreResult<()> {
        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "commit refused",
        )))
    }

    fn count(&self, kind: EntityKind) -> StoreResult<usize> {
        self.inner.count(kind)
    }
}

fn get_country(store: &MemoryStore, key: &str) -> locref_core::Country {
    store
        .get(EntityKind::Country, key)
        .unwrap()
        .and_then(GeoRecord::into_country)
        .unwrap()
}

fn get_state(store: &MemoryStore, key: &str) -> locref_core::State {
    store
        .get(EntityKind::State, key)
        .unwrap()
        .and_then(GeoRecord::into_state)
        .unwrap()
}

fn get_city(store: &MemoryStore, key: &str) -> locref_core::City {
    store
        .get(EntityKind::City, key)
        .unwrap()
        .and_then(GeoRecord::into_city)
        .unwrap()
}

// ---- TESTS ----

#[test]
fn full_import_populates_all_levels() {
    let source = FixtureSource::standard();
    let mut store = MemoryStore::new();

    let report = refresh_location_data(&mut store, &source, false).unwrap();

    assert_eq!(report.regions.imported, 3);
    assert_eq!(report.regions.skipped, 0);
    assert_eq!(report.subregions.imported, 1);
    assert_eq!(report.subregions.skipped, 2, "rows without region_id");
    assert_eq!(report.countries.imported, 2);
    assert_eq!(report.countries.skipped, 1, "blank country name");
    assert_eq!(report.states.imported, 2);
    assert_eq!(report.states.skipped, 1, "unknown country code");
    assert_eq!(report.cities.imported, 3);
    assert_eq!(report.cities.skipped, 1, "unknown state");
    assert_eq!(report.total_failed(), 0);

    assert_eq!(store.count(EntityKind::Region).unwrap(), 3);
    assert_eq!(store.count(EntityKind::Subregion).unwrap(), 1);
    assert_eq!(store.count(EntityKind::Country).unwrap(), 2);
    assert_eq!(store.count(EntityKind::State).unwrap(), 2);
    assert_eq!(store.count(EntityKind::City).unwrap(), 3);

    // Regions come out of the subregions file.
    assert!(store
        .get(EntityKind::Region, "Northern America")
        .unwrap()
        .is_some());

    let us = get_country(&store, "United States");
    assert_eq!(us.code, "us");
    assert_eq!(us.iso3, "usa");
    assert_eq!(us.phone_code, "1");
    assert_eq!(us.capital, "Washington");
    assert_eq!(us.emoji_u, "U+1F1FA U+1F1F8");
    assert_eq!(us.region, "Americas");
    assert_eq!(us.subregion, "Northern America");
    assert_eq!(us.latitude, Some(38.0));
    assert_eq!(us.external_id, "233");
    assert!(us.last_updated.is_some());

    // An unresolvable subregion name leaves the link empty.
    let brazil = get_country(&store, "Brazil");
    assert_eq!(brazil.region, "Americas");
    assert_eq!(brazil.subregion, "");

    // Upstream sends "US"; storage and propagation are lowercase.
    let illinois = get_state(&store, "Illinois");
    assert_eq!(illinois.country, "United States");
    assert_eq!(illinois.country_code, "us");
    assert_eq!(illinois.state_code, "IL");
    assert_eq!(illinois.state_type, "state");
    assert!(illinois.is_active);

    let springfield = get_city(&store, "Springfield-Illinois");
    assert_eq!(springfield.city_name, "Springfield");
    assert_eq!(springfield.state, "Illinois");
    assert_eq!(springfield.state_code, "IL");
    assert_eq!(springfield.country, "United States");
    assert_eq!(springfield.country_code, "us");
    assert_eq!(springfield.wikidata_id, "Q28515");
    assert_eq!(springfield.latitude, Some(39.80172));
    assert!(springfield.is_active);
}

#[test]
fn same_city_name_in_two_states_stays_distinct() {
    let source = FixtureSource::standard();
    let mut store = MemoryStore::new();
    refresh_location_data(&mut store, &source, false).unwrap();

    let il = get_city(&store, "Springfield-Illinois");
    let oh = get_city(&store, "Springfield-Ohio");
    assert_eq!(il.city_name, "Springfield");
    assert_eq!(oh.city_name, "Springfield");
    assert_eq!(il.state_code, "IL");
    assert_eq!(oh.state_code, "OH");
    assert_ne!(il.key, oh.key);
}

#[test]
fn second_run_without_force_imports_nothing() {
    let source = FixtureSource::standard();
    let mut store = MemoryStore::new();

    refresh_location_data(&mut store, &source, false).unwrap();
    let saves_after_first = store.saves();
    assert_eq!(saves_after_first, 11);

    let second = refresh_location_data(&mut store, &source, false).unwrap();

    assert_eq!(second.total_imported(), 0);
    assert_eq!(second.total_failed(), 0);
    assert_eq!(second.regions.skipped, 3);
    assert_eq!(second.subregions.skipped, 3);
    assert_eq!(second.countries.skipped, 3);
    assert_eq!(second.states.skipped, 3);
    assert_eq!(second.cities.skipped, 4);

    // Nothing was written; record counts are stable.
    assert_eq!(store.saves(), saves_after_first);
    assert_eq!(store.count(EntityKind::City).unwrap(), 3);
}

#[test]
fn force_update_rewrites_without_duplicating() {
    let source = FixtureSource::standard();
    let mut store = MemoryStore::new();

    let first = refresh_location_data(&mut store, &source, false).unwrap();
    let before = get_city(&store, "Springfield-Illinois").last_updated.unwrap();

    let second = refresh_location_data(&mut store, &source, true).unwrap();

    assert_eq!(second.total_imported(), first.total_imported());
    assert_eq!(store.count(EntityKind::Country).unwrap(), 2);
    assert_eq!(store.count(EntityKind::State).unwrap(), 2);
    assert_eq!(store.count(EntityKind::City).unwrap(), 3);
    assert_eq!(store.saves(), 22);

    let after = get_city(&store, "Springfield-Illinois").last_updated.unwrap();
    assert!(after > before, "forced run must freshen the timestamp");
}

#[test]
fn failed_states_fetch_degrades_to_zero_records() {
    let source = FixtureSource::standard().failing(DatasetFile::States);
    let mut store = MemoryStore::new();

    let report = refresh_location_data(&mut store, &source, false).unwrap();

    // Levels before the failure are untouched by it.
    assert_eq!(report.regions.imported, 3);
    assert_eq!(report.countries.imported, 2);

    assert_eq!(report.states.imported, 0);
    assert_eq!(report.states.skipped, 0);
    assert_eq!(report.states.failed(), 0);
    assert_eq!(store.count(EntityKind::State).unwrap(), 0);

    // Cities still run; with no states every row is skipped.
    assert_eq!(report.cities.imported, 0);
    assert_eq!(report.cities.skipped, 4);
    assert_eq!(store.count(EntityKind::City).unwrap(), 0);
}

#[test]
fn poisoned_record_is_reported_and_level_continues() {
    // Two rows claim the name "Americas"; the second one must fail on its
    // own without taking the rest of the level down.
    let source = FixtureSource::standard().with_file(
        DatasetFile::Subregions,
        json!([
            {"id": 1, "name": "Americas"},
            {"id": 7, "name": "Americas"},
            {"id": 4, "name": "Europe"}
        ]),
    );
    let mut store = MemoryStore::new();

    let report = refresh_location_data(&mut store, &source, false).unwrap();

    assert_eq!(report.regions.imported, 2);
    assert_eq!(report.regions.failed(), 1);
    assert_eq!(report.regions.failures[0].key, "Americas");
    assert!(
        report.regions.failures[0].reason.contains("already exists"),
        "got: {}",
        report.regions.failures[0].reason
    );
    assert_eq!(store.count(EntityKind::Region).unwrap(), 2);

    // Later levels still ran against what did import.
    assert_eq!(report.countries.imported, 2);
    assert_eq!(report.states.imported, 2);
    assert_eq!(report.total_failed(), 1);
}

#[test]
fn commit_cadence_counts_batches() {
    let source = FixtureSource::standard();
    let mut store = MemoryStore::new();

    let options = ImportOptions {
        force_update: false,
        cadence: CommitCadence::with_city_batch(2),
    };
    Importer::new(&mut store, &source, options)
        .import_all()
        .unwrap();

    // One trailing commit per non-city level (counts stay under the
    // per-level thresholds), plus one commit per city batch of two.
    assert_eq!(store.commits(), 6);
}

#[test]
fn inner_commit_cadence_fires_every_n_records() {
    let source = FixtureSource::standard();
    let mut store = MemoryStore::new();

    let options = ImportOptions {
        force_update: false,
        cadence: CommitCadence {
            regions: 2,
            subregions: 10,
            countries: 50,
            states: 100,
            city_batch: 100,
        },
    };
    Importer::new(&mut store, &source, options)
        .import_all()
        .unwrap();

    // Regions: 3 imported with cadence 2 -> one inner commit plus the
    // trailing one. Other levels: trailing only. Cities: one batch.
    assert_eq!(store.commits(), 2 + 1 + 1 + 1 + 1);
}

#[test]
fn chunked_refresh_publishes_completion_event() {
    let source = FixtureSource::standard();
    let mut store = MemoryStore::new();
    let notifier = RecordingNotifier::default();

    refresh_location_data_chunked(&mut store, &source, &notifier, false, 2).unwrap();

    let events = notifier.events.borrow();
    assert_eq!(events.len(), 1);
    let (event, message, user) = &events[0];
    assert_eq!(event, "location_import_completed");
    assert_eq!(user, "Administrator");
    assert!(message.contains("regions: 3"), "got: {message}");
}

#[test]
fn chunked_refresh_publishes_failure_when_run_aborts() {
    let source = FixtureSource::standard();
    let mut store = PoisonedStore {
        inner: MemoryStore::new(),
    };
    let notifier = RecordingNotifier::default();

    let err = refresh_location_data_chunked(&mut store, &source, &notifier, false, 2).unwrap_err();
    assert!(matches!(
        err,
        ImportError::Store {
            level: EntityKind::Region,
            ..
        }
    ));

    let events = notifier.events.borrow();
    assert_eq!(events.len(), 1);
    let (event, message, user) = &events[0];
    assert_eq!(event, "location_import_failed");
    assert_eq!(user, "Administrator");
    assert!(message.contains("failed"), "got: {message}");
}

#[test]
fn lookup_by_code_is_case_insensitive_after_import() {
    let source = FixtureSource::standard();
    let mut store = MemoryStore::new();
    refresh_location_data(&mut store, &source, false).unwrap();

    let upper = store
        .lookup(EntityKind::Country, &Filter::eq(FilterField::Code, "us"))
        .unwrap();
    assert_eq!(upper.as_deref(), Some("United States"));

    // The resolver normalizes caller input the same way.
    let via_resolver = locref_core::resolver::country_by_code(&store, "US").unwrap();
    assert_eq!(via_resolver.as_deref(), Some("United States"));
}

#[test]
fn navigation_queries_follow_links() {
    let source = FixtureSource::standard();
    let mut store = MemoryStore::new();
    refresh_location_data(&mut store, &source, false).unwrap();

    let subregions = store.subregions_of("Americas");
    assert_eq!(subregions.len(), 1);
    assert_eq!(subregions[0].subregion_name, "Northern America");

    let countries = store.countries_of_region("Americas");
    assert_eq!(countries.len(), 2);

    let states = store.states_of("United States");
    assert_eq!(states.len(), 2);

    let cities = store.cities_of("Illinois");
    assert_eq!(cities.len(), 2);
    assert!(store.cities_of("Atlantis Province").is_empty());
}
