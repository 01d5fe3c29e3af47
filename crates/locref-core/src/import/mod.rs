// crates/locref-core/src/import/mod.rs
//! # Import Orchestrator
//!
//! Drives a full synchronization of the five-level hierarchy from a
//! [`DatasetSource`] into a [`GeoStore`], parents before children:
//! regions, subregions, countries, states, cities.
//!
//! Failure handling is layered. A failed fetch downgrades its level to
//! zero records and the run moves on. A failed record is logged, counted
//! in the [`LevelReport`] and skipped over. Only store infrastructure
//! faults (a commit that does not come back) abort the run with an
//! [`ImportError`].

pub mod report;

pub use report::{ImportReport, LevelReport, RecordFailure};

use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::error::{ImportError, ImportResult, StoreError};
use crate::fetch::{fetch_records, DatasetSource};
use crate::model::{City, Country, EntityKind, GeoRecord, Region, State, Subregion};
use crate::queue::{Notifier, ADMIN_USER, EVENT_IMPORT_COMPLETED, EVENT_IMPORT_FAILED};
use crate::raw::{CityRaw, CountryRaw, DatasetFile, RegionRaw, StateRaw, SubregionRaw};
use crate::resolver;
use crate::store::{Filter, FilterField, GeoStore};

// -----------------------------------------------------------------------------
// OPTIONS
// -----------------------------------------------------------------------------

/// How many imported records each level writes between commits.
///
/// Cities are different: their source list is processed in batches of
/// `city_batch` rows with one commit per batch, matching the chunked
/// background-job shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitCadence {
    pub regions: usize,
    pub subregions: usize,
    pub countries: usize,
    pub states: usize,
    pub city_batch: usize,
}

impl Default for CommitCadence {
    fn default() -> Self {
        CommitCadence {
            regions: 10,
            subregions: 10,
            countries: 50,
            states: 100,
            city_batch: 100,
        }
    }
}

impl CommitCadence {
    /// Default cadence with a custom city batch size.
    pub fn with_city_batch(city_batch: usize) -> Self {
        CommitCadence {
            city_batch,
            ..CommitCadence::default()
        }
    }

    fn normalized(mut self) -> Self {
        self.regions = self.regions.max(1);
        self.subregions = self.subregions.max(1);
        self.countries = self.countries.max(1);
        self.states = self.states.max(1);
        self.city_batch = self.city_batch.max(1);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Rewrite records that already exist instead of skipping them.
    pub force_update: bool,
    pub cadence: CommitCadence,
}

impl ImportOptions {
    /// Options for a first fill or a full refresh.
    pub fn forced() -> Self {
        ImportOptions {
            force_update: true,
            ..ImportOptions::default()
        }
    }
}

/// Outcome of one record inside a level loop.
enum Upsert {
    Imported,
    Skipped,
}

// -----------------------------------------------------------------------------
// IMPORTER
// -----------------------------------------------------------------------------

/// One import run over a store and a dataset source. Levels can be run
/// individually or all together via [`Importer::import_all`].
pub struct Importer<'a, S: GeoStore> {
    store: &'a mut S,
    source: &'a dyn DatasetSource,
    options: ImportOptions,
}

impl<'a, S: GeoStore> Importer<'a, S> {
    pub fn new(store: &'a mut S, source: &'a dyn DatasetSource, mut options: ImportOptions) -> Self {
        options.cadence = options.cadence.normalized();
        Importer {
            store,
            source,
            options,
        }
    }

    /// Runs all five levels in dependency order and reports per-level
    /// counts. Fetch and record failures are absorbed into the report.
    pub fn import_all(&mut self) -> ImportResult<ImportReport> {
        info!(force_update = self.options.force_update, "starting location data import");

        let report = ImportReport {
            regions: self.import_regions()?,
            subregions: self.import_subregions()?,
            countries: self.import_countries()?,
            states: self.import_states()?,
            cities: self.import_cities()?,
        };

        info!(
            regions = report.regions.imported,
            subregions = report.subregions.imported,
            countries = report.countries.imported,
            states = report.states.imported,
            cities = report.cities.imported,
            failed = report.total_failed(),
            "location data import completed"
        );
        Ok(report)
    }

    // ---- LEVELS ----

    /// Regions are seeded from the subregions file; each row contributes
    /// its own id/name pair.
    pub fn import_regions(&mut self) -> ImportResult<LevelReport> {
        let mut report = LevelReport::new(EntityKind::Region);
        info!("importing regions");
        let Some(rows) = self.fetch_level::<RegionRaw>(DatasetFile::Subregions, EntityKind::Region)
        else {
            return Ok(report);
        };

        for row in &rows {
            match self.upsert_region(row) {
                Ok(Upsert::Imported) => {
                    report.imported += 1;
                    if report.imported % self.options.cadence.regions == 0 {
                        self.commit(EntityKind::Region)?;
                    }
                }
                Ok(Upsert::Skipped) => report.skipped += 1,
                Err(e) => report.record_failure(row.name.as_str(), &e),
            }
        }
        self.commit(EntityKind::Region)?;
        info!(imported = report.imported, skipped = report.skipped, "regions import finished");
        Ok(report)
    }

    pub fn import_subregions(&mut self) -> ImportResult<LevelReport> {
        let mut report = LevelReport::new(EntityKind::Subregion);
        info!("importing subregions");
        let Some(rows) =
            self.fetch_level::<SubregionRaw>(DatasetFile::Subregions, EntityKind::Subregion)
        else {
            return Ok(report);
        };

        for row in &rows {
            match self.upsert_subregion(row) {
                Ok(Upsert::Imported) => {
                    report.imported += 1;
                    if report.imported % self.options.cadence.subregions == 0 {
                        self.commit(EntityKind::Subregion)?;
                    }
                }
                Ok(Upsert::Skipped) => report.skipped += 1,
                Err(e) => report.record_failure(row.name.as_str(), &e),
            }
        }
        self.commit(EntityKind::Subregion)?;
        info!(imported = report.imported, skipped = report.skipped, "subregions import finished");
        Ok(report)
    }

    pub fn import_countries(&mut self) -> ImportResult<LevelReport> {
        let mut report = LevelReport::new(EntityKind::Country);
        info!("importing countries");
        let Some(rows) =
            self.fetch_level::<CountryRaw>(DatasetFile::Countries, EntityKind::Country)
        else {
            return Ok(report);
        };

        for row in &rows {
            match self.upsert_country(row) {
                Ok(Upsert::Imported) => {
                    report.imported += 1;
                    if report.imported % self.options.cadence.countries == 0 {
                        self.commit(EntityKind::Country)?;
                        info!(imported = report.imported, "country import progress");
                    }
                }
                Ok(Upsert::Skipped) => report.skipped += 1,
                Err(e) => report.record_failure(row.name.trim(), &e),
            }
        }
        self.commit(EntityKind::Country)?;
        info!(imported = report.imported, skipped = report.skipped, "countries import finished");
        Ok(report)
    }

    pub fn import_states(&mut self) -> ImportResult<LevelReport> {
        let mut report = LevelReport::new(EntityKind::State);
        info!("importing states");
        let Some(rows) = self.fetch_level::<StateRaw>(DatasetFile::States, EntityKind::State)
        else {
            return Ok(report);
        };

        for row in &rows {
            match self.upsert_state(row) {
                Ok(Upsert::Imported) => {
                    report.imported += 1;
                    if report.imported % self.options.cadence.states == 0 {
                        self.commit(EntityKind::State)?;
                        info!(imported = report.imported, "state import progress");
                    }
                }
                Ok(Upsert::Skipped) => report.skipped += 1,
                Err(e) => report.record_failure(row.name.trim(), &e),
            }
        }
        self.commit(EntityKind::State)?;
        info!(imported = report.imported, skipped = report.skipped, "states import finished");
        Ok(report)
    }

    /// Cities run in batches of `city_batch` source rows, one commit and
    /// one progress line per batch.
    pub fn import_cities(&mut self) -> ImportResult<LevelReport> {
        let mut report = LevelReport::new(EntityKind::City);
        info!("importing cities");
        let Some(rows) = self.fetch_level::<CityRaw>(DatasetFile::Cities, EntityKind::City) else {
            return Ok(report);
        };

        for (index, batch) in rows.chunks(self.options.cadence.city_batch).enumerate() {
            for row in batch {
                match self.upsert_city(row) {
                    Ok(Upsert::Imported) => report.imported += 1,
                    Ok(Upsert::Skipped) => report.skipped += 1,
                    Err(e) => report.record_failure(city_failure_key(row), &e),
                }
            }
            self.commit(EntityKind::City)?;
            debug!(batch = index + 1, imported = report.imported, "city import progress");
        }
        info!(imported = report.imported, skipped = report.skipped, "cities import finished");
        Ok(report)
    }

    // ---- PER-RECORD UPSERTS ----

    fn upsert_region(&mut self, row: &RegionRaw) -> Result<Upsert, StoreError> {
        let external_id = row.id.to_string();
        let existing = self.store.lookup(
            EntityKind::Region,
            &Filter::eq(FilterField::ExternalId, external_id.as_str()),
        )?;
        if existing.is_some() && !self.options.force_update {
            return Ok(Upsert::Skipped);
        }

        let mut region = match existing.as_deref() {
            Some(key) => self.load_record(EntityKind::Region, key, GeoRecord::into_region)?,
            None => Region::default(),
        };
        region.apply_source(row);
        self.store.save(GeoRecord::Region(region))?;
        Ok(Upsert::Imported)
    }

    fn upsert_subregion(&mut self, row: &SubregionRaw) -> Result<Upsert, StoreError> {
        let external_id = row.id.to_string();
        let existing = self.store.lookup(
            EntityKind::Subregion,
            &Filter::eq(FilterField::ExternalId, external_id.as_str()),
        )?;
        if existing.is_some() && !self.options.force_update {
            return Ok(Upsert::Skipped);
        }

        let region_key = match row.region_id {
            Some(id) => resolver::region_by_external_id(&*self.store, &id.to_string())?,
            None => None,
        };
        let Some(region_key) = region_key else {
            warn!(
                subregion = %row.name,
                region_id = ?row.region_id,
                "region not found for subregion"
            );
            return Ok(Upsert::Skipped);
        };

        let mut subregion = match existing.as_deref() {
            Some(key) => self.load_record(EntityKind::Subregion, key, GeoRecord::into_subregion)?,
            None => Subregion::default(),
        };
        subregion.apply_source(row, region_key);
        self.store.save(GeoRecord::Subregion(subregion))?;
        Ok(Upsert::Imported)
    }

    fn upsert_country(&mut self, row: &CountryRaw) -> Result<Upsert, StoreError> {
        let name = row.name.trim();
        if name.is_empty() {
            return Ok(Upsert::Skipped);
        }

        let existing = resolver::country_for_upsert(
            &*self.store,
            row.iso2.as_deref(),
            row.iso3.as_deref(),
            name,
        )?;
        if existing.is_some() && !self.options.force_update {
            return Ok(Upsert::Skipped);
        }

        let mut country = match existing.as_deref() {
            Some(key) => self.load_record(EntityKind::Country, key, GeoRecord::into_country)?,
            None => Country {
                country_name: name.to_string(),
                ..Country::default()
            },
        };
        country.apply_source(row);

        // Optional upward links; an unresolved name leaves the stored
        // link untouched.
        if let Some(region_name) = row.region.as_deref().filter(|r| !r.is_empty()) {
            if let Some(key) = resolver::region_by_name(&*self.store, region_name)? {
                country.region = key;
            }
        }
        if let Some(subregion_name) = row.subregion.as_deref().filter(|s| !s.is_empty()) {
            if let Some(key) = resolver::subregion_by_name(&*self.store, subregion_name)? {
                country.subregion = key;
            }
        }

        self.store.save(GeoRecord::Country(country))?;
        Ok(Upsert::Imported)
    }

    fn upsert_state(&mut self, row: &StateRaw) -> Result<Upsert, StoreError> {
        let name = row.name.trim();
        let code = row
            .country_code
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        if name.is_empty() || code.is_empty() {
            return Ok(Upsert::Skipped);
        }

        let Some(country_key) = resolver::country_by_code(&*self.store, &code)? else {
            debug!(state = %name, country_code = %code, "country not found for state");
            return Ok(Upsert::Skipped);
        };

        let mut state = match self.store.get(EntityKind::State, name)? {
            Some(_) if !self.options.force_update => return Ok(Upsert::Skipped),
            Some(record) => record.into_state().ok_or_else(|| StoreError::MissingRecord {
                kind: EntityKind::State,
                key: name.to_string(),
            })?,
            None => State {
                state_name: name.to_string(),
                ..State::default()
            },
        };
        state.apply_source(row, country_key, code);
        self.store.save(GeoRecord::State(state))?;
        Ok(Upsert::Imported)
    }

    fn upsert_city(&mut self, row: &CityRaw) -> Result<Upsert, StoreError> {
        let name = row.name.trim();
        let state_name = row.state_name.as_deref().unwrap_or_default().trim();
        let country_code = row.country_code.as_deref().unwrap_or_default().trim();
        if name.is_empty() || state_name.is_empty() || country_code.is_empty() {
            return Ok(Upsert::Skipped);
        }

        if resolver::state_by_name(&*self.store, state_name)?.is_none() {
            debug!(city = %name, state = %state_name, "state not found for city");
            return Ok(Upsert::Skipped);
        }

        let composite = City::composite_key(name, state_name);
        let mut city = match self.store.get(EntityKind::City, &composite)? {
            Some(_) if !self.options.force_update => return Ok(Upsert::Skipped),
            Some(record) => record.into_city().ok_or_else(|| StoreError::MissingRecord {
                kind: EntityKind::City,
                key: composite.clone(),
            })?,
            None => City {
                city_name: name.to_string(),
                state: state_name.to_string(),
                ..City::default()
            },
        };
        city.apply_source(row);
        self.store.save(GeoRecord::City(city))?;
        Ok(Upsert::Imported)
    }

    // ---- PLUMBING ----

    fn fetch_level<T: DeserializeOwned>(
        &self,
        file: DatasetFile,
        level: EntityKind,
    ) -> Option<Vec<T>> {
        match fetch_records(self.source, file) {
            Ok(rows) => Some(rows),
            Err(e) => {
                error!(level = %level, error = %e, "dataset fetch failed; level yields zero records");
                None
            }
        }
    }

    fn load_record<T>(
        &self,
        kind: EntityKind,
        key: &str,
        project: fn(GeoRecord) -> Option<T>,
    ) -> Result<T, StoreError> {
        self.store
            .get(kind, key)?
            .and_then(project)
            .ok_or_else(|| StoreError::MissingRecord {
                kind,
                key: key.to_string(),
            })
    }

    fn commit(&mut self, level: EntityKind) -> ImportResult<()> {
        self.store
            .commit()
            .map_err(|source| ImportError::Store { level, source })
    }
}

/// Failure key for a city row: the composite identity when the state is
/// known, the bare name otherwise.
fn city_failure_key(row: &CityRaw) -> String {
    match row.state_name.as_deref().map(str::trim) {
        Some(state) if !state.is_empty() => City::composite_key(row.name.trim(), state),
        _ => row.name.trim().to_string(),
    }
}

// -----------------------------------------------------------------------------
// ENTRY POINTS
// -----------------------------------------------------------------------------

/// Full import with the default commit cadence.
pub fn refresh_location_data<S: GeoStore>(
    store: &mut S,
    source: &dyn DatasetSource,
    force_update: bool,
) -> ImportResult<ImportReport> {
    let options = ImportOptions {
        force_update,
        ..ImportOptions::default()
    };
    Importer::new(store, source, options).import_all()
}

/// Import shaped for background execution: the city level runs in batches
/// of `chunk_size` rows, and the outcome is published to the
/// administrator channel either way.
pub fn refresh_location_data_chunked<S: GeoStore>(
    store: &mut S,
    source: &dyn DatasetSource,
    notifier: &dyn Notifier,
    force_update: bool,
    chunk_size: usize,
) -> ImportResult<ImportReport> {
    let options = ImportOptions {
        force_update,
        cadence: CommitCadence::with_city_batch(chunk_size),
    };
    let outcome = Importer::new(store, source, options).import_all();

    match &outcome {
        Ok(report) => notifier.publish(
            EVENT_IMPORT_COMPLETED,
            &format!("Location data import completed successfully. Imported: {report}"),
            ADMIN_USER,
        ),
        Err(e) => {
            error!(error = %e, "chunked location data import failed");
            notifier.publish(
                EVENT_IMPORT_FAILED,
                &format!("Location data import failed: {e}"),
                ADMIN_USER,
            );
        }
    }
    outcome
}
