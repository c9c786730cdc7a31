//! FILENAME: data-engine/src/source.rs
//! Fetch collaborator contract.
//!
//! The engine never talks to the network itself; it hands a [`DataQuery`]
//! to whatever [`DataSource`] it was constructed with and gets a
//! [`Dataset`] slice back. The HTTP client realizing this trait lives
//! outside this crate; tests plug in scripted sources.

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::SourceError;

/// Which codes of a variable a query asks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CodeFilter {
    /// Every code the source has for the variable.
    All,
    /// An explicit code list, in request order.
    Codes(Vec<String>),
}

/// One variable of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableQuery {
    pub variable_id: String,
    pub filter: CodeFilter,
}

/// A complete data request.
///
/// Every requested variable is listed, even those whose codes are already
/// held locally: the receiver needs the full variable list to disambiguate
/// the response shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataQuery {
    pub selections: Vec<VariableQuery>,
}

impl DataQuery {
    /// The filter for a variable, if the query mentions it.
    pub fn filter_for(&self, variable_id: &str) -> Option<&CodeFilter> {
        self.selections
            .iter()
            .find(|s| s.variable_id == variable_id)
            .map(|s| &s.filter)
    }
}

/// The external data service seam.
///
/// Implementations perform one request/response exchange per call; this is
/// the engine's sole suspension point. Callers are expected to serialize
/// resolves per session rather than run them in parallel.
pub trait DataSource {
    fn fetch(
        &self,
        table_id: &str,
        language: &str,
        query: &DataQuery,
    ) -> Result<Dataset, SourceError>;
}

impl<S: DataSource + ?Sized> DataSource for &S {
    fn fetch(
        &self,
        table_id: &str,
        language: &str,
        query: &DataQuery,
    ) -> Result<Dataset, SourceError> {
        (**self).fetch(table_id, language, query)
    }
}
