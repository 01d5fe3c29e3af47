// crates/locref-core/src/store.rs
//! # Document Store
//!
//! The narrow persistence surface the import pipeline runs against, plus
//! [`MemoryStore`], the bundled reference implementation with binary
//! snapshot support.
//!
//! Lookups go through [`Filter`], a typed field/value pair. The mapping
//! from filter field to record column is the explicit table in
//! [`field_value`]; a (kind, field) pair without a column simply never
//! matches.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::model::{City, Country, EntityKind, GeoRecord, Region, State, Subregion};
use crate::validate;

/// Key a record is stored under (the document name).
pub type RecordKey = String;

// -----------------------------------------------------------------------------
// FILTERS
// -----------------------------------------------------------------------------

/// Columns a lookup can match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    /// The entity's natural name column.
    Name,
    /// Upstream row id.
    ExternalId,
    /// Country ISO2 code.
    Code,
    /// Country ISO3 code.
    Iso3,
}

/// An equality filter for [`GeoStore::lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: FilterField,
    pub value: String,
}

impl Filter {
    pub fn eq(field: FilterField, value: impl Into<String>) -> Self {
        Filter {
            field,
            value: value.into(),
        }
    }

    pub fn matches(&self, record: &GeoRecord) -> bool {
        field_value(record, self.field) == Some(self.value.as_str())
    }
}

/// Column projection per entity. One arm per filterable column; anything
/// not listed yields `None` and never matches.
pub fn field_value(record: &GeoRecord, field: FilterField) -> Option<&str> {
    use FilterField::*;
    match (record, field) {
        (GeoRecord::Region(r), Name) => Some(&r.region_name),
        (GeoRecord::Region(r), ExternalId) => Some(&r.external_id),
        (GeoRecord::Subregion(s), Name) => Some(&s.subregion_name),
        (GeoRecord::Subregion(s), ExternalId) => Some(&s.external_id),
        (GeoRecord::Country(c), Name) => Some(&c.country_name),
        (GeoRecord::Country(c), ExternalId) => Some(&c.external_id),
        (GeoRecord::Country(c), Code) => Some(&c.code),
        (GeoRecord::Country(c), Iso3) => Some(&c.iso3),
        (GeoRecord::State(s), Name) => Some(&s.state_name),
        (GeoRecord::State(s), ExternalId) => Some(&s.external_id),
        (GeoRecord::City(c), Name) => Some(&c.city_name),
        (GeoRecord::City(c), ExternalId) => Some(&c.external_id),
        _ => None,
    }
}

// -----------------------------------------------------------------------------
// STORE TRAIT
// -----------------------------------------------------------------------------

/// The persistence operations the import pipeline needs. Nothing more.
///
/// `save` carries the write-side contract: implementations run the
/// validation pipeline ([`validate::save_pipeline`]) before persisting, so
/// a record that comes back out of the store has passed entity validation,
/// had parent-derived fields filled in, and carries a fresh `last_updated`.
///
/// There is no delete. Records removed upstream stay in the store.
pub trait GeoStore {
    /// Key of the first record of `kind` matching `filter`, if any.
    fn lookup(&self, kind: EntityKind, filter: &Filter) -> StoreResult<Option<RecordKey>>;

    /// Full record by key.
    fn get(&self, kind: EntityKind, key: &str) -> StoreResult<Option<GeoRecord>>;

    /// Insert or update a record, returning the key it now lives under.
    ///
    /// A record with an empty `key` is an insert; its key is assigned from
    /// the natural name. A record whose name changed is moved to the new
    /// key.
    fn save(&mut self, record: GeoRecord) -> StoreResult<RecordKey>;

    /// Make writes since the last commit durable.
    fn commit(&mut self) -> StoreResult<()>;

    /// Number of stored records of `kind`.
    fn count(&self, kind: EntityKind) -> StoreResult<usize>;
}

// -----------------------------------------------------------------------------
// MEMORY STORE
// -----------------------------------------------------------------------------

/// In-memory store with snapshot persistence.
///
/// Commits are visibility boundaries only (writes are immediately live);
/// the store counts them so callers can verify commit cadence. Snapshots
/// are bincode, gzip-wrapped when the `compact` feature is on.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MemoryStore {
    tables: BTreeMap<EntityKind, BTreeMap<RecordKey, GeoRecord>>,
    /// Writes since the last commit.
    #[serde(skip)]
    dirty: usize,
    #[serde(skip)]
    saves: u64,
    #[serde(skip)]
    commits: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total saves since construction (or snapshot load).
    pub fn saves(&self) -> u64 {
        self.saves
    }

    /// Total commits since construction (or snapshot load).
    pub fn commits(&self) -> u64 {
        self.commits
    }

    /// Writes not yet covered by a commit.
    pub fn pending_writes(&self) -> usize {
        self.dirty
    }

    fn table(&self, kind: EntityKind) -> Option<&BTreeMap<RecordKey, GeoRecord>> {
        self.tables.get(&kind)
    }

    // ---- SNAPSHOTS ----

    /// Reads a snapshot written by [`MemoryStore::save_to_path`].
    pub fn load_from_path(path: &Path) -> StoreResult<Self> {
        let file = File::open(path)
            .map_err(|e| StoreError::SnapshotNotFound(format!("{}: {}", path.display(), e)))?;
        let reader = BufReader::new(file);

        #[cfg(feature = "compact")]
        {
            let decoder = flate2::read::GzDecoder::new(reader);
            Ok(bincode::deserialize_from(decoder)?)
        }
        #[cfg(not(feature = "compact"))]
        {
            Ok(bincode::deserialize_from(reader)?)
        }
    }

    /// Writes the full store to `path` as a binary snapshot.
    pub fn save_to_path(&self, path: &Path) -> StoreResult<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);

        #[cfg(feature = "compact")]
        {
            let mut encoder = flate2::write::GzEncoder::new(writer, flate2::Compression::best());
            bincode::serialize_into(&mut encoder, self)?;
            encoder.finish()?;
        }
        #[cfg(not(feature = "compact"))]
        {
            bincode::serialize_into(writer, self)?;
        }
        Ok(())
    }

    // ---- NAVIGATION ----

    /// Subregions whose `region` link points at `region_key`.
    pub fn subregions_of(&self, region_key: &str) -> Vec<&Subregion> {
        self.table(EntityKind::Subregion)
            .map(|table| {
                table
                    .values()
                    .filter_map(GeoRecord::as_subregion)
                    .filter(|s| s.region == region_key)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn countries_of_region(&self, region_key: &str) -> Vec<&Country> {
        self.table(EntityKind::Country)
            .map(|table| {
                table
                    .values()
                    .filter_map(GeoRecord::as_country)
                    .filter(|c| c.region == region_key)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn countries_of_subregion(&self, subregion_key: &str) -> Vec<&Country> {
        self.table(EntityKind::Country)
            .map(|table| {
                table
                    .values()
                    .filter_map(GeoRecord::as_country)
                    .filter(|c| c.subregion == subregion_key)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn states_of(&self, country_key: &str) -> Vec<&State> {
        self.table(EntityKind::State)
            .map(|table| {
                table
                    .values()
                    .filter_map(GeoRecord::as_state)
                    .filter(|s| s.country == country_key)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn cities_of(&self, state_key: &str) -> Vec<&City> {
        self.table(EntityKind::City)
            .map(|table| {
                table
                    .values()
                    .filter_map(GeoRecord::as_city)
                    .filter(|c| c.state == state_key)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Follows link fields of every record that pointed at `old` after a
    /// rename moved it to `new`.
    fn relink(&mut self, kind: EntityKind, old: &str, new: &str) {
        let targets: &[EntityKind] = match kind {
            EntityKind::Region => &[EntityKind::Subregion, EntityKind::Country],
            EntityKind::Subregion => &[EntityKind::Country],
            EntityKind::Country => &[EntityKind::State],
            EntityKind::State => &[EntityKind::City],
            EntityKind::City => &[],
        };

        for target in targets {
            let Some(table) = self.tables.get_mut(target) else {
                continue;
            };
            for record in table.values_mut() {
                match record {
                    GeoRecord::Subregion(s) if s.region == old => s.region = new.to_string(),
                    GeoRecord::Country(c) => {
                        if kind == EntityKind::Region && c.region == old {
                            c.region = new.to_string();
                        }
                        if kind == EntityKind::Subregion && c.subregion == old {
                            c.subregion = new.to_string();
                        }
                    }
                    GeoRecord::State(s) if s.country == old => s.country = new.to_string(),
                    GeoRecord::City(c) if c.state == old => c.state = new.to_string(),
                    _ => {}
                }
            }
        }
    }
}

impl GeoStore for MemoryStore {
    fn lookup(&self, kind: EntityKind, filter: &Filter) -> StoreResult<Option<RecordKey>> {
        Ok(self.table(kind).and_then(|table| {
            table
                .iter()
                .find(|(_, record)| filter.matches(record))
                .map(|(key, _)| key.clone())
        }))
    }

    fn get(&self, kind: EntityKind, key: &str) -> StoreResult<Option<GeoRecord>> {
        Ok(self.table(kind).and_then(|table| table.get(key).cloned()))
    }

    fn save(&mut self, mut record: GeoRecord) -> StoreResult<RecordKey> {
        let kind = record.kind();
        let previous = if record.key().is_empty() {
            None
        } else {
            self.get(kind, record.key())?
        };

        validate::save_pipeline(&*self, &mut record, previous.as_ref(), Utc::now())?;

        let natural = record.natural_key();
        let assigned = record.key().to_string();
        let mut renamed_from = None;

        let table = self.tables.entry(kind).or_default();
        if assigned.is_empty() {
            // Fresh insert. The natural key must be free.
            if table.contains_key(&natural) {
                return Err(StoreError::DuplicateKey { kind, key: natural });
            }
            record.set_key(natural.clone());
            validate::after_insert(&record);
            table.insert(natural.clone(), record);
        } else if assigned != natural {
            // The naming field changed: move the record to its new key and
            // chase link fields that pointed at the old one.
            if table.contains_key(&natural) {
                return Err(StoreError::DuplicateKey { kind, key: natural });
            }
            table.remove(&assigned);
            record.set_key(natural.clone());
            table.insert(natural.clone(), record);
            renamed_from = Some(assigned);
        } else {
            table.insert(assigned, record);
        }

        if let Some(old) = renamed_from {
            self.relink(kind, &old, &natural);
            debug!(kind = %kind, from = %old, to = %natural, "record renamed");
        }

        self.dirty += 1;
        self.saves += 1;
        Ok(natural)
    }

    fn commit(&mut self) -> StoreResult<()> {
        self.dirty = 0;
        self.commits += 1;
        Ok(())
    }

    fn count(&self, kind: EntityKind) -> StoreResult<usize> {
        Ok(self.table(kind).map_or(0, |table| table.len()))
    }
}
