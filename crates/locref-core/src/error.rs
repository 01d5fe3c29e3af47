// crates/locref-core/src/error.rs
//! Error taxonomy for the import pipeline and the backing store.

use thiserror::Error;

use crate::model::EntityKind;

/// Failure retrieving or decoding one upstream dataset file.
///
/// Fetch failures are non-fatal to an import run: the affected level is
/// logged and proceeds with zero records.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP request itself failed (connect, timeout, body read).
    #[cfg(feature = "fetch")]
    #[error("request for {file} failed: {source}")]
    Http {
        file: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{file}: unexpected HTTP status {status}")]
    Status { file: &'static str, status: u16 },

    /// A local source file could not be read.
    #[error("failed to read {file}: {source}")]
    Io {
        file: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The payload was not the expected JSON shape.
    #[error("failed to decode {file}: {source}")]
    Decode {
        file: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// A record was rejected before it reached the store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{kind} name is required")]
    MissingName { kind: EntityKind },

    /// A mandatory link field is empty.
    #[error("{kind} requires a {field}")]
    MissingField { kind: EntityKind, field: &'static str },

    /// Another record of the same kind already carries this name.
    #[error("{kind} with name '{name}' already exists")]
    DuplicateName { kind: EntityKind, name: String },

    /// A link names a record that is not in the store.
    #[error("{kind} '{key}' links to missing {parent} '{parent_key}'")]
    MissingParent {
        kind: EntityKind,
        key: String,
        parent: EntityKind,
        parent_key: String,
    },

    /// State.country_code disagrees with the parent Country.
    #[error("country code mismatch for state '{state}': expected '{expected}', got '{got}'")]
    CountryCodeMismatch {
        state: String,
        expected: String,
        got: String,
    },

    /// City.country disagrees with the parent State's country.
    #[error("country mismatch for city '{city}': state '{state}' belongs to '{expected}', not '{got}'")]
    CountryMismatch {
        city: String,
        state: String,
        expected: String,
        got: String,
    },
}

/// Failure of a store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A record referenced by key is gone.
    #[error("{kind} '{key}' not found")]
    MissingRecord { kind: EntityKind, key: String },

    /// Inserting a fresh record whose key is already taken.
    #[error("{kind} '{key}' already exists")]
    DuplicateKey { kind: EntityKind, key: String },

    /// No snapshot file at the given path.
    #[error("snapshot not found at {0}")]
    SnapshotNotFound(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding error: {0}")]
    Bincode(#[from] bincode::Error),
}

/// Shorthand for store results.
pub type StoreResult<T> = Result<T, StoreError>;

/// A whole import run aborted.
///
/// Per-record trouble never surfaces here; it is collected as
/// [`RecordFailure`](crate::import::RecordFailure) entries instead. Only
/// infrastructure faults (a failing commit, a store gone away) abort a run.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("store failure during {level} import: {source}")]
    Store {
        level: EntityKind,
        #[source]
        source: StoreError,
    },
}

/// Shorthand for import results.
pub type ImportResult<T> = Result<T, ImportError>;

/// Failure handing a job to the queue backend.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("failed to enqueue job '{job}': {reason}")]
    Enqueue { job: String, reason: String },
}
