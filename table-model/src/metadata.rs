//! FILENAME: table-model/src/metadata.rs
//! Table metadata - the variable/value catalog.
//!
//! This module contains the types that give the cube's dimensions meaning.
//! These structures are designed to be:
//! - Serializable (for caching and bridge transfer)
//! - Immutable snapshots of a table's catalog at fetch time
//!
//! The position of a variable inside `Metadata::variables` defines the
//! canonical dimension order used to address the cube.

use serde::{Deserialize, Serialize};

use crate::cube::Cube;
use crate::selection::Selection;

// ============================================================================
// VALUES
// ============================================================================

/// A footnote attached to a value or variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Mandatory notes must always be surfaced alongside the data.
    #[serde(default)]
    pub mandatory: bool,

    /// The note text.
    pub text: String,
}

/// One category within a variable.
///
/// `code` is the stable dimension key; `label` is display text only and
/// never participates in cube addressing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    /// Stable code used to address the cube.
    pub code: String,

    /// Display label.
    pub label: String,

    /// Footnotes attached to this value.
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl Value {
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Value {
            code: code.into(),
            label: label.into(),
            notes: Vec::new(),
        }
    }
}

// ============================================================================
// VARIABLES
// ============================================================================

/// The role a variable plays in the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VariableKind {
    /// Ordinary classification variable.
    #[default]
    Regular,
    /// Time dimension (years, quarters, months).
    Time,
    /// Geographical dimension (regions, municipalities).
    Geographical,
    /// Content dimension (the measures of the table).
    Content,
}

/// An alternative grouping catalog a variable may advertise.
/// Carried through as metadata only; the core never resolves code lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeList {
    pub id: String,
    pub label: String,
}

/// A categorical dimension of the dataset.
///
/// `values` order is significant: it defines iteration and render order for
/// the axis the variable ends up on, and every operation preserves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Stable variable identifier.
    pub id: String,

    /// Display label.
    pub label: String,

    /// The role this variable plays.
    #[serde(default)]
    pub kind: VariableKind,

    /// Whether the variable must appear in every selection (cannot be
    /// eliminated by the data service).
    #[serde(default)]
    pub mandatory: bool,

    /// Ordered value catalog.
    pub values: Vec<Value>,

    /// Alternative grouping catalogs, if the source advertises any.
    #[serde(default)]
    pub code_lists: Vec<CodeList>,
}

impl Variable {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: VariableKind) -> Self {
        Variable {
            id: id.into(),
            label: label.into(),
            kind,
            mandatory: false,
            values: Vec::new(),
            code_lists: Vec::new(),
        }
    }

    /// Appends a value to the catalog (builder-style).
    pub fn with_value(mut self, code: impl Into<String>, label: impl Into<String>) -> Self {
        self.values.push(Value::new(code, label));
        self
    }

    /// Whether `code` exists in this variable's catalog.
    pub fn has_code(&self, code: &str) -> bool {
        self.values.iter().any(|v| v.code == code)
    }

    /// Position of `code` within the value catalog.
    pub fn position_of(&self, code: &str) -> Option<usize> {
        self.values.iter().position(|v| v.code == code)
    }

    /// Looks up a value by code.
    pub fn value(&self, code: &str) -> Option<&Value> {
        self.values.iter().find(|v| v.code == code)
    }

    /// Iterates the value codes in catalog order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|v| v.code.as_str())
    }
}

// ============================================================================
// METADATA
// ============================================================================

/// The catalog of one table in one language.
///
/// Two snapshots for the same table and language are compatible for merging
/// only if they reference the same variable id set; order and value subsets
/// may differ between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Table identifier.
    pub id: String,

    /// Language the labels are expressed in.
    pub language: String,

    /// Ordered variable catalog; position = canonical dimension order.
    pub variables: Vec<Variable>,
}

impl Metadata {
    pub fn new(id: impl Into<String>, language: impl Into<String>) -> Self {
        Metadata {
            id: id.into(),
            language: language.into(),
            variables: Vec::new(),
        }
    }

    /// Looks up a variable by id.
    pub fn variable(&self, id: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.id == id)
    }

    /// Looks up a variable by id, mutably.
    pub fn variable_mut(&mut self, id: &str) -> Option<&mut Variable> {
        self.variables.iter_mut().find(|v| v.id == id)
    }

    /// Canonical dimension position of a variable.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.id == id)
    }

    /// Whether `other` references the same variable id set, regardless of
    /// order and value subsets.
    pub fn same_variable_set(&self, other: &Metadata) -> bool {
        self.variables.len() == other.variables.len()
            && self.variables.iter().all(|v| other.variable(&v.id).is_some())
    }

    /// Restricts the catalog to a selection.
    ///
    /// Each selected variable keeps only the requested codes (in its own
    /// catalog order); variables absent from the selection are dropped. An
    /// empty code list keeps the full catalog for that variable. The cube is
    /// not touched: lookups address by code, so narrowing is metadata-only.
    pub fn project(&self, selection: &Selection) -> Metadata {
        let variables = self
            .variables
            .iter()
            .filter_map(|var| {
                let codes = selection.codes_for(&var.id)?;
                let mut projected = var.clone();
                if !codes.is_empty() {
                    projected.values.retain(|v| codes.iter().any(|c| c == &v.code));
                }
                Some(projected)
            })
            .collect();

        Metadata {
            id: self.id.clone(),
            language: self.language.clone(),
            variables,
        }
    }
}

// ============================================================================
// TABLE VIEW
// ============================================================================

/// A projected table: narrowed metadata plus a borrowed cube.
///
/// Produced by projection; the cube is shared with its owner, so a view is
/// cheap regardless of how much data has accumulated.
#[derive(Debug, Clone, Serialize)]
pub struct TableView<'a> {
    pub metadata: Metadata,
    pub cube: &'a Cube,
}
