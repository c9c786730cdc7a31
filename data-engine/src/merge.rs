//! FILENAME: data-engine/src/merge.rs
//! Slice-into-session merging.
//!
//! A merge is attempted only when exactly one variable gained codes. The
//! fetched slice carries its own self-consistent metadata whose dimension
//! order may differ from the session's, so paths are translated through a
//! permutation computed once up front rather than by comparing ids during
//! the walk.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use table_model::{Cube, CubeError, Selection, Variable};

use crate::error::{EngineError, SourceError};
use crate::provider::Session;

/// Merges a fetched slice into the session, where `changed_id` is the one
/// variable whose diff was non-empty.
///
/// New values of the changed variable are inserted into the session's
/// catalog at the position they hold in the full requested code list, then
/// every combination involving a newly inserted code is copied from the
/// slice cube into the session cube through the dimension permutation.
/// Validation happens before any mutation, so a rejected slice leaves the
/// session untouched.
pub(crate) fn merge_slice(
    session: &mut Session,
    slice: Session,
    changed_id: &str,
    requested: &Selection,
) -> Result<(), EngineError> {
    let Some(changed_idx) = session.metadata.position_of(changed_id) else {
        // The session has never seen this variable; its dimension depth no
        // longer matches and accumulated paths cannot be extended.
        log::warn!("variable {changed_id} unknown to the accumulated session, replacing it");
        *session = slice;
        return Ok(());
    };

    let Some(slice_var) = slice.metadata.variable(changed_id) else {
        return Err(SourceError::MalformedPayload(format!(
            "response lacks the requested variable `{changed_id}`"
        ))
        .into());
    };

    // Snapshots are only mergeable over the same variable set; order and
    // value subsets are free to differ.
    if !session.metadata.same_variable_set(&slice.metadata) {
        return Err(SourceError::MalformedPayload(
            "response dimensions do not match the session's variable set".to_string(),
        )
        .into());
    }

    // Permutation: position in session dimension order -> position in slice
    // dimension order.
    let mut remap = Vec::with_capacity(session.metadata.variables.len());
    for var in &session.metadata.variables {
        match slice.metadata.position_of(&var.id) {
            Some(pos) => remap.push(pos),
            None => {
                return Err(SourceError::MalformedPayload(format!(
                    "response lacks the dimension `{}`",
                    var.id
                ))
                .into())
            }
        }
    }

    // Order-preserving catalog merge: a new code lands at the index it has
    // in the full requested list; codes already present stay where they are.
    let requested_codes = requested.codes_for(changed_id).unwrap_or(&[]);
    let session_var = &mut session.metadata.variables[changed_idx];
    let mut inserted: FxHashSet<String> = FxHashSet::default();
    for (idx, code) in requested_codes.iter().enumerate() {
        if session_var.has_code(code) {
            continue;
        }
        let Some(value) = slice_var.value(code) else {
            continue;
        };
        let at = idx.min(session_var.values.len());
        session_var.values.insert(at, value.clone());
        inserted.insert(code.clone());
    }

    if inserted.is_empty() {
        return Ok(());
    }

    let variables = &session.metadata.variables;
    let cube = &mut session.cube;
    let mut path: Vec<&str> = Vec::with_capacity(variables.len());
    copy_inserted(
        variables,
        0,
        changed_idx,
        &inserted,
        &remap,
        &slice.cube,
        &mut path,
        cube,
    )?;
    Ok(())
}

/// Walks every combination over the session's (post-merge) dimension order,
/// restricted at the changed dimension to the newly inserted codes, and
/// copies the matching slice observations in. Combinations the slice does
/// not cover stay unfetched.
#[allow(clippy::too_many_arguments)]
fn copy_inserted<'a>(
    variables: &'a [Variable],
    depth: usize,
    changed_idx: usize,
    inserted: &FxHashSet<String>,
    remap: &[usize],
    slice_cube: &Cube,
    path: &mut Vec<&'a str>,
    cube: &mut Cube,
) -> Result<(), CubeError> {
    if depth == variables.len() {
        let mut slice_path: SmallVec<[&str; 8]> = SmallVec::from_elem("", path.len());
        for (pos, seg) in path.iter().enumerate() {
            slice_path[remap[pos]] = *seg;
        }
        if let Some(obs) = slice_cube.get(&slice_path) {
            cube.set(path, *obs)?;
        }
        return Ok(());
    }

    for value in &variables[depth].values {
        if depth == changed_idx && !inserted.contains(&value.code) {
            continue;
        }
        path.push(&value.code);
        copy_inserted(
            variables,
            depth + 1,
            changed_idx,
            inserted,
            remap,
            slice_cube,
            path,
            cube,
        )?;
        path.pop();
    }
    Ok(())
}
