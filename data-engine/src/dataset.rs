//! FILENAME: data-engine/src/dataset.rs
//! Wire dataset - the payload returned by the fetch collaborator.
//!
//! The format is the usual multi-dimensional statistical exchange shape: an
//! ordered list of dimensions, each with an ordered value catalog, and a
//! flat observation array whose linear index is the row-major product of
//! the dimension sizes in declared order (last dimension varies fastest).
//! `None` entries encode observations the source explicitly reports as
//! void, as opposed to combinations that were simply not requested.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use table_model::{Cube, Metadata, Observation, Value, Variable, VariableKind};

use crate::error::SourceError;

/// One value of a wire dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionValue {
    pub code: String,
    pub label: String,
}

/// One dimension of the wire dataset, in its declared order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub id: String,
    pub label: String,

    #[serde(default)]
    pub kind: VariableKind,

    #[serde(default)]
    pub mandatory: bool,

    /// Ordered value catalog; position = index within this dimension.
    pub values: Vec<DimensionValue>,
}

impl Dimension {
    fn into_variable(self) -> Variable {
        Variable {
            id: self.id,
            label: self.label,
            kind: self.kind,
            mandatory: self.mandatory,
            values: self
                .values
                .into_iter()
                .map(|v| Value::new(v.code, v.label))
                .collect(),
            code_lists: Vec::new(),
        }
    }
}

/// A self-contained dataset slice as returned by the data service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub table_id: String,
    pub language: String,
    pub dimensions: Vec<Dimension>,

    /// Flat row-major observation array; `None` is a void observation.
    pub values: Vec<Option<f64>>,
}

impl Dataset {
    /// Decodes the flat observation array into a metadata/cube pair.
    ///
    /// Combinations are enumerated recursively in declared dimension order,
    /// consuming the flat array in lock-step; this is the inverse of the
    /// row-major convention and must match it exactly or all cells shift.
    /// A length mismatch rejects the whole payload; no partial cube is
    /// handed out.
    pub fn into_table(self) -> Result<(Metadata, Cube), SourceError> {
        if self.dimensions.is_empty() {
            return Err(SourceError::MalformedPayload(
                "dataset declares no dimensions".to_string(),
            ));
        }

        let expected: usize = self.dimensions.iter().map(|d| d.values.len()).product();
        if expected != self.values.len() {
            return Err(SourceError::MalformedPayload(format!(
                "dimension sizes imply {expected} observations, payload carries {}",
                self.values.len()
            )));
        }

        let mut cube = Cube::new();
        let mut path: SmallVec<[&str; 8]> = SmallVec::new();
        let mut next = 0usize;
        fill_level(&self.dimensions, 0, &self.values, &mut next, &mut path, &mut cube)?;
        drop(path);

        let metadata = Metadata {
            id: self.table_id,
            language: self.language,
            variables: self
                .dimensions
                .into_iter()
                .map(Dimension::into_variable)
                .collect(),
        };

        Ok((metadata, cube))
    }
}

fn fill_level<'a>(
    dimensions: &'a [Dimension],
    depth: usize,
    values: &[Option<f64>],
    next: &mut usize,
    path: &mut SmallVec<[&'a str; 8]>,
    cube: &mut Cube,
) -> Result<(), SourceError> {
    if depth == dimensions.len() {
        let obs = match values[*next] {
            Some(n) => Observation::Number(n),
            None => Observation::Missing,
        };
        *next += 1;
        cube.set(path, obs)
            .map_err(|e| SourceError::MalformedPayload(e.to_string()))?;
        return Ok(());
    }

    for value in &dimensions[depth].values {
        path.push(&value.code);
        fill_level(dimensions, depth + 1, values, next, path, cube)?;
        path.pop();
    }
    Ok(())
}
