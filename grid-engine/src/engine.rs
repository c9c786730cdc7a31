//! FILENAME: grid-engine/src/engine.rs
//! Grid generation - from axis assignment and cube to a rendered grid.
//!
//! Algorithm:
//! 1. Resolve and validate the axis assignment against the metadata
//! 2. Emit one header row per heading level; each level subdivides the
//!    span of the level above it and repeats its value sequence once per
//!    combination of all shallower levels
//! 3. While emitting, give every physical column its code vector: the
//!    (dimension, code) pairs implied by its position at every level
//! 4. Walk the stub depth first; the last level emits data rows whose
//!    cells combine the row and column code vectors, reordered into the
//!    cube's canonical dimension order, and look the cube up

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use table_model::{Cube, Metadata, Variable};
use thiserror::Error;

use crate::layout::GridLayout;
use crate::view::{GridRow, GridValue, GridView, HeaderCell};

/// Errors raised while validating a grid request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// The stub/heading assignment does not name every table variable
    /// exactly once.
    #[error("axis assignment does not partition the table variables: {0}")]
    AxisMismatch(String),

    /// An axis variable has an empty value catalog, which would collapse
    /// the span arithmetic to zero. Rejected outright rather than clamped:
    /// an empty catalog on an axis means the metadata is inconsistent.
    #[error("variable `{0}` has no values to span an axis")]
    EmptyAxisVariable(String),
}

/// Builds the rendered grid for one axis assignment over a projected table.
///
/// Pure: the metadata and cube are only read, so repeated calls with
/// different layouts are free of surprises. Combinations absent from the
/// cube render as [`GridValue::NotLoaded`] rather than failing the grid.
pub fn build_grid(
    metadata: &Metadata,
    cube: &Cube,
    layout: &GridLayout,
) -> Result<GridView, GridError> {
    let stub = resolve_axis(metadata, &layout.stub)?;
    let heading = resolve_axis(metadata, &layout.heading)?;
    validate_partition(metadata, &stub, &heading)?;

    for (_, var) in stub.iter().chain(heading.iter()) {
        if var.values.is_empty() {
            return Err(GridError::EmptyAxisVariable(var.id.clone()));
        }
    }

    let data_columns: usize = heading.iter().map(|(_, v)| v.values.len()).product();
    let data_rows: usize = stub.iter().map(|(_, v)| v.values.len()).product();
    let column_offset = usize::from(!stub.is_empty());
    let row_offset = heading.len();

    // Header block. Level i repeats its value sequence once per combination
    // of all shallower levels, each cell spanning the product of all deeper
    // cardinalities.
    let mut column_codes: Vec<Vec<(usize, &str)>> =
        vec![Vec::with_capacity(heading.len()); data_columns];
    let mut header_rows: Vec<Vec<HeaderCell>> = Vec::with_capacity(row_offset);
    let mut col_span = data_columns;
    let mut repetitions = 1;
    for (level, (canon_pos, var)) in heading.iter().enumerate() {
        col_span /= var.values.len();
        let mut cells = Vec::with_capacity(repetitions * var.values.len() + 1);
        if level == 0 && column_offset == 1 {
            cells.push(HeaderCell::corner(row_offset));
        }
        let mut column = 0;
        for _ in 0..repetitions {
            for value in &var.values {
                cells.push(HeaderCell::column_header(
                    value.label.as_str(),
                    value.code.as_str(),
                    col_span,
                ));
                for _ in 0..col_span {
                    column_codes[column].push((*canon_pos, value.code.as_str()));
                    column += 1;
                }
            }
        }
        header_rows.push(cells);
        repetitions *= var.values.len();
    }

    // Body block.
    let mut rows = Vec::new();
    let mut row_codes: Vec<(usize, &str)> = Vec::with_capacity(stub.len());
    emit_rows(
        &stub,
        0,
        &mut row_codes,
        &column_codes,
        cube,
        metadata.variables.len(),
        data_columns,
        &mut rows,
    );

    Ok(GridView {
        header_rows,
        rows,
        column_offset,
        row_offset,
        data_columns,
        data_rows,
    })
}

/// Resolves axis ids to (canonical position, variable) pairs.
fn resolve_axis<'a>(
    metadata: &'a Metadata,
    ids: &[String],
) -> Result<Vec<(usize, &'a Variable)>, GridError> {
    ids.iter()
        .map(|id| {
            metadata
                .position_of(id)
                .map(|pos| (pos, &metadata.variables[pos]))
                .ok_or_else(|| {
                    GridError::AxisMismatch(format!("variable `{id}` is not part of the table"))
                })
        })
        .collect()
}

fn validate_partition(
    metadata: &Metadata,
    stub: &[(usize, &Variable)],
    heading: &[(usize, &Variable)],
) -> Result<(), GridError> {
    let mut seen: FxHashSet<usize> = FxHashSet::default();
    for (pos, var) in stub.iter().chain(heading.iter()) {
        if !seen.insert(*pos) {
            return Err(GridError::AxisMismatch(format!(
                "variable `{}` is assigned more than once",
                var.id
            )));
        }
    }
    if seen.len() != metadata.variables.len() {
        return Err(GridError::AxisMismatch(
            "every table variable must be assigned to exactly one axis".to_string(),
        ));
    }
    Ok(())
}

/// Depth-first walk over the stub. A non-final level emits a section row
/// (label plus placeholders) before descending; the final level emits one
/// data row per value. An empty stub emits the single data row directly.
#[allow(clippy::too_many_arguments)]
fn emit_rows<'a>(
    stub: &[(usize, &'a Variable)],
    level: usize,
    row_codes: &mut Vec<(usize, &'a str)>,
    column_codes: &[Vec<(usize, &'a str)>],
    cube: &Cube,
    depth: usize,
    data_columns: usize,
    rows: &mut Vec<GridRow>,
) {
    if stub.is_empty() {
        rows.push(data_row(None, row_codes, column_codes, cube, depth, data_columns));
        return;
    }

    let (canon_pos, var) = stub[level];
    let last = level + 1 == stub.len();
    for value in &var.values {
        row_codes.push((canon_pos, value.code.as_str()));
        if last {
            let header =
                HeaderCell::row_header(value.label.as_str(), value.code.as_str(), level as u8);
            rows.push(data_row(
                Some(header),
                row_codes,
                column_codes,
                cube,
                depth,
                data_columns,
            ));
        } else {
            let header =
                HeaderCell::row_section(value.label.as_str(), value.code.as_str(), level as u8);
            rows.push(GridRow {
                header: Some(header),
                cells: vec![GridValue::Empty; data_columns],
            });
            emit_rows(
                stub,
                level + 1,
                row_codes,
                column_codes,
                cube,
                depth,
                data_columns,
                rows,
            );
        }
        row_codes.pop();
    }
}

/// Emits one data row: per column, the row and column code vectors are
/// combined, reordered into canonical dimension order, and looked up.
fn data_row(
    header: Option<HeaderCell>,
    row_codes: &[(usize, &str)],
    column_codes: &[Vec<(usize, &str)>],
    cube: &Cube,
    depth: usize,
    data_columns: usize,
) -> GridRow {
    let mut cells = Vec::with_capacity(data_columns);
    let mut path: SmallVec<[&str; 8]> = SmallVec::from_elem("", depth);
    for codes in column_codes {
        for &(pos, code) in row_codes.iter().chain(codes.iter()) {
            path[pos] = code;
        }
        cells.push(GridValue::from(cube.get(&path)));
    }
    GridRow { header, cells }
}
