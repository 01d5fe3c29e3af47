// crates/locref-core/src/import/report.rs
//! Aggregate counts for an import run. One [`LevelReport`] per level,
//! rolled up into an [`ImportReport`].

use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::error::StoreError;
use crate::model::EntityKind;

/// One source record that could not be upserted. The run continues; the
/// failure is kept for the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    /// Identity of the failing record, as far as it could be derived.
    pub key: String,
    pub reason: String,
}

/// Outcome of one level of the hierarchy.
#[derive(Debug, Clone, Serialize)]
pub struct LevelReport {
    pub level: EntityKind,
    /// Records created or refreshed.
    pub imported: usize,
    /// Records passed over: already present without force, unresolvable
    /// parent, or mandatory source fields missing.
    pub skipped: usize,
    pub failures: Vec<RecordFailure>,
}

impl LevelReport {
    pub fn new(level: EntityKind) -> Self {
        LevelReport {
            level,
            imported: 0,
            skipped: 0,
            failures: Vec::new(),
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub(crate) fn record_failure(&mut self, key: impl Into<String>, error: &StoreError) {
        let key = key.into();
        warn!(level = %self.level, record = %key, error = %error, "record import failed");
        self.failures.push(RecordFailure {
            key,
            reason: error.to_string(),
        });
    }
}

/// Aggregate outcome of a full run, one entry per level in dependency
/// order.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub regions: LevelReport,
    pub subregions: LevelReport,
    pub countries: LevelReport,
    pub states: LevelReport,
    pub cities: LevelReport,
}

impl ImportReport {
    pub fn levels(&self) -> [&LevelReport; 5] {
        [
            &self.regions,
            &self.subregions,
            &self.countries,
            &self.states,
            &self.cities,
        ]
    }

    pub fn total_imported(&self) -> usize {
        self.levels().iter().map(|l| l.imported).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.levels().iter().map(|l| l.skipped).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.levels().iter().map(|l| l.failed()).sum()
    }
}

impl Default for ImportReport {
    fn default() -> Self {
        ImportReport {
            regions: LevelReport::new(EntityKind::Region),
            subregions: LevelReport::new(EntityKind::Subregion),
            countries: LevelReport::new(EntityKind::Country),
            states: LevelReport::new(EntityKind::State),
            cities: LevelReport::new(EntityKind::City),
        }
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "regions: {}, subregions: {}, countries: {}, states: {}, cities: {}",
            self.regions.imported,
            self.subregions.imported,
            self.countries.imported,
            self.states.imported,
            self.cities.imported
        )
    }
}
