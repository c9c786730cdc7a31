//! FILENAME: table-model/src/selection.rs
//! Selections - per-variable code requests.

use serde::{Deserialize, Serialize};

/// The requested codes for one variable.
///
/// An empty code list means "everything the source has" for that variable;
/// the list order is the caller's presentation order and is preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSelection {
    pub variable_id: String,
    pub codes: Vec<String>,
}

/// An ordered set of per-variable code requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    entries: Vec<VariableSelection>,
}

impl Selection {
    pub fn new() -> Self {
        Selection::default()
    }

    /// Adds a variable request (builder-style).
    pub fn with_variable<I, C>(mut self, variable_id: impl Into<String>, codes: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.push(VariableSelection {
            variable_id: variable_id.into(),
            codes: codes.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn push(&mut self, entry: VariableSelection) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[VariableSelection] {
        &self.entries
    }

    /// The requested codes for a variable, if it is part of the selection.
    pub fn codes_for(&self, variable_id: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|e| e.variable_id == variable_id)
            .map(|e| e.codes.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
