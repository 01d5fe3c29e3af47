//! locref-cli
//! ==========
//!
//! Command-line interface for the `locref-core` location reference store.
//!
//! This crate primarily provides a binary (`locref`). We include a small
//! library target so that docs.rs renders a documentation page and shows this
//! overview. See the README for full usage examples.
//!
//! Quick start
//! -----------
//!
//! Install the CLI from crates.io:
//!
//! ```text
//! cargo install locref-cli
//! ```
//!
//! Basic usage:
//!
//! ```text
//! locref --help
//! locref run --force
//! locref stats
//! locref country us
//! locref cities Illinois
//! ```
//!
//! For programmatic access to the store and the import pipeline, use the
//! [`locref-core`] crate directly.
//!

// This library target intentionally exposes no API; the binary is the primary
// deliverable. The presence of this file enables a rendered page on docs.rs.
