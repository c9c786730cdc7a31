//! FILENAME: data-engine/src/lib.rs
//! Accumulation and merge engine for the statistical table browsing core.
//!
//! This crate owns one accumulated data session per (table, language) pair
//! and decides, for every selection change, the minimal fetch needed to
//! satisfy it. Fetched slices are merged back into the session so already
//! loaded combinations are never requested twice. It depends on
//! `table-model` for the cube and catalog types and on an external
//! [`DataSource`] collaborator for the actual transport.
//!
//! Layers:
//! - `dataset`: the wire payload (WHAT the source returns)
//! - `source`: the fetch collaborator contract (WHO we ask)
//! - `provider`: session lifecycle and resolve flow (WHEN we fetch)
//! - `merge`: slice-into-session merging (HOW results accumulate)

pub mod dataset;
pub mod error;
pub mod provider;
pub mod source;

mod merge;

pub use dataset::{Dataset, Dimension, DimensionValue};
pub use error::{EngineError, SourceError};
pub use provider::{DataProvider, Session};
pub use source::{CodeFilter, DataQuery, DataSource, VariableQuery};
