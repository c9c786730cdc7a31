//! FILENAME: grid-engine/src/layout.rs
//! Axis assignment - which variable renders on which axis.

use serde::{Deserialize, Serialize};
use table_model::{Metadata, VariableKind};

/// The assignment of variables to the row axis (stub) and column axis
/// (heading), each in render order.
///
/// Invariant: together the two lists name every variable of the projected
/// metadata exactly once. Axis order is free to differ from the canonical
/// dimension order; the engine remaps cell paths back to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    /// Variable ids on the row axis, outermost first.
    pub stub: Vec<String>,

    /// Variable ids on the column axis, topmost first.
    pub heading: Vec<String>,
}

impl GridLayout {
    pub fn new<I, J, T, U>(stub: I, heading: J) -> Self
    where
        I: IntoIterator<Item = T>,
        J: IntoIterator<Item = U>,
        T: Into<String>,
        U: Into<String>,
    {
        GridLayout {
            stub: stub.into_iter().map(Into::into).collect(),
            heading: heading.into_iter().map(Into::into).collect(),
        }
    }

    /// The conventional starting layout for a table: the time variable (or
    /// the last variable, when there is none) goes to the heading, the rest
    /// to the stub in catalog order.
    pub fn default_for(metadata: &Metadata) -> Self {
        let heading_id = metadata
            .variables
            .iter()
            .find(|v| v.kind == VariableKind::Time)
            .or_else(|| metadata.variables.last())
            .map(|v| v.id.clone());

        let mut stub = Vec::new();
        let mut heading = Vec::new();
        for var in &metadata.variables {
            if Some(&var.id) == heading_id.as_ref() {
                heading.push(var.id.clone());
            } else {
                stub.push(var.id.clone());
            }
        }
        GridLayout { stub, heading }
    }

    /// Swaps the two axes.
    pub fn transpose(&mut self) {
        std::mem::swap(&mut self.stub, &mut self.heading);
    }

    /// Moves a variable to the end of the other axis, if present.
    pub fn pivot(&mut self, variable_id: &str) {
        if let Some(pos) = self.stub.iter().position(|id| id == variable_id) {
            let id = self.stub.remove(pos);
            self.heading.push(id);
        } else if let Some(pos) = self.heading.iter().position(|id| id == variable_id) {
            let id = self.heading.remove(pos);
            self.stub.push(id);
        }
    }
}
