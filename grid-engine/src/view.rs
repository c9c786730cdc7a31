//! FILENAME: grid-engine/src/view.rs
//! Grid view - renderable output for the consumer.
//!
//! Cells carry everything a renderer needs (labels, spans, cell types,
//! loaded-or-not data) and nothing it does not (no styling, no widths).

use serde::{Deserialize, Serialize};
use table_model::Observation;

// ============================================================================
// CELL TYPES
// ============================================================================

/// The type of a header cell in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridCellType {
    /// Top-left cell above the row labels, spanning all header rows.
    Corner,
    /// Column header label.
    ColumnHeader,
    /// Row header label on a data row.
    RowHeader,
    /// Row label of a stub level with deeper levels beneath it.
    RowSection,
    /// Layout placeholder.
    Blank,
}

/// The value of one body cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GridValue {
    /// Layout placeholder on a section row.
    Empty,
    /// A fetched numeric observation.
    Number(f64),
    /// The source explicitly reported no data for this combination.
    Missing,
    /// The combination was never fetched into the cube.
    NotLoaded,
}

impl From<Option<&Observation>> for GridValue {
    fn from(obs: Option<&Observation>) -> Self {
        match obs {
            Some(Observation::Number(n)) => GridValue::Number(*n),
            Some(Observation::Missing) => GridValue::Missing,
            None => GridValue::NotLoaded,
        }
    }
}

// ============================================================================
// HEADER CELL
// ============================================================================

/// A header cell: corner, column header, or row label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderCell {
    /// Display label.
    pub label: String,

    /// The value code behind this cell, if it represents one.
    pub code: Option<String>,

    /// The type of this cell.
    pub cell_type: GridCellType,

    /// How many grid rows the cell covers.
    pub row_span: usize,

    /// How many grid columns the cell covers.
    pub col_span: usize,

    /// Indentation level (stub nesting depth for row labels).
    pub indent_level: u8,
}

impl HeaderCell {
    /// Creates the corner cell spanning all header rows.
    pub fn corner(row_span: usize) -> Self {
        HeaderCell {
            label: String::new(),
            code: None,
            cell_type: GridCellType::Corner,
            row_span,
            col_span: 1,
            indent_level: 0,
        }
    }

    /// Creates a column header cell.
    pub fn column_header(label: impl Into<String>, code: impl Into<String>, col_span: usize) -> Self {
        HeaderCell {
            label: label.into(),
            code: Some(code.into()),
            cell_type: GridCellType::ColumnHeader,
            row_span: 1,
            col_span,
            indent_level: 0,
        }
    }

    /// Creates a row header cell for a data row.
    pub fn row_header(label: impl Into<String>, code: impl Into<String>, indent: u8) -> Self {
        HeaderCell {
            label: label.into(),
            code: Some(code.into()),
            cell_type: GridCellType::RowHeader,
            row_span: 1,
            col_span: 1,
            indent_level: indent,
        }
    }

    /// Creates a row label for a stub level that still has deeper levels.
    pub fn row_section(label: impl Into<String>, code: impl Into<String>, indent: u8) -> Self {
        HeaderCell {
            label: label.into(),
            code: Some(code.into()),
            cell_type: GridCellType::RowSection,
            row_span: 1,
            col_span: 1,
            indent_level: indent,
        }
    }
}

// ============================================================================
// ROWS AND THE VIEW
// ============================================================================

/// One rendered row below the header block: either a section row (label
/// plus placeholders) or a data row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridRow {
    /// The row label, absent when the stub is empty.
    pub header: Option<HeaderCell>,

    /// One value per data column; `Empty` on section rows.
    pub cells: Vec<GridValue>,
}

impl GridRow {
    /// Whether this row carries data cells (as opposed to placeholders).
    pub fn is_data(&self) -> bool {
        !matches!(
            self.header,
            Some(HeaderCell {
                cell_type: GridCellType::RowSection,
                ..
            })
        )
    }
}

/// The complete rendered grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridView {
    /// One row of header cells per heading variable, top to bottom. The
    /// first row additionally carries the corner cell when a row label
    /// column exists.
    pub header_rows: Vec<Vec<HeaderCell>>,

    /// Section and data rows, in render order.
    pub rows: Vec<GridRow>,

    /// 1 when a row label column is reserved, 0 otherwise.
    pub column_offset: usize,

    /// Number of header rows (one per heading variable).
    pub row_offset: usize,

    /// Number of data columns (product of heading cardinalities).
    pub data_columns: usize,

    /// Number of data rows (product of stub cardinalities).
    pub data_rows: usize,
}

impl GridView {
    /// Total column count including the row label column.
    pub fn column_count(&self) -> usize {
        self.column_offset + self.data_columns
    }

    /// Iterates only the data rows, skipping section rows.
    pub fn data_row_iter(&self) -> impl Iterator<Item = &GridRow> {
        self.rows.iter().filter(|r| r.is_data())
    }
}
