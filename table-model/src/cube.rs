//! Data cube - the sparse N-dimensional observation store.
//!
//! The cube is a recursive mapping keyed by value code, one level per
//! variable in canonical dimension order. Only combinations that were
//! actually fetched are populated, so "absent" (never fetched) and
//! "missing" (fetched, but void in the source data) are distinct states:
//! the former is a failed lookup, the latter an [`Observation::Missing`]
//! leaf.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Key under which a leaf observation is stored in the serialized form of
/// the cube. Value codes colliding with it are rejected by [`Cube::set`]:
/// such a code would be indistinguishable from cube structure after a
/// round-trip.
pub const OBSERVATION_KEY: &str = "$value";

/// Errors raised by cube mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CubeError {
    /// A path segment collides with the reserved structural key. Always a
    /// programming error upstream; surfaced immediately.
    #[error("dimension code collides with the reserved cube key: `{0}`")]
    InvalidDimension(String),

    /// A path must address at least one dimension.
    #[error("cube path must contain at least one dimension code")]
    EmptyPath,
}

/// A single stored observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Observation {
    /// A numeric data point.
    Number(f64),
    /// The source explicitly reported no data for this combination.
    Missing,
}

impl Observation {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Observation::Number(n) => Some(*n),
            Observation::Missing => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum CubeNode {
    Obs {
        #[serde(rename = "$value")]
        value: Observation,
    },
    Branch(FxHashMap<String, CubeNode>),
}

impl CubeNode {
    fn branch() -> Self {
        CubeNode::Branch(FxHashMap::default())
    }

    /// Returns the branch map, converting a leaf into an empty branch first.
    fn as_branch_mut(&mut self) -> &mut FxHashMap<String, CubeNode> {
        if let CubeNode::Obs { .. } = self {
            *self = CubeNode::branch();
        }
        match self {
            CubeNode::Branch(map) => map,
            CubeNode::Obs { .. } => unreachable!(),
        }
    }
}

/// The sparse observation store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cube {
    root: FxHashMap<String, CubeNode>,
}

impl Cube {
    pub fn new() -> Self {
        Cube::default()
    }

    /// Whether nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Walks `path` one code per level and returns the observation, or
    /// `None` if any level's key is missing (the combination was never
    /// fetched). `path` must have one segment per dimension.
    pub fn get(&self, path: &[&str]) -> Option<&Observation> {
        let (last, parents) = path.split_last()?;
        let mut level = &self.root;
        for seg in parents {
            match level.get(*seg)? {
                CubeNode::Branch(next) => level = next,
                CubeNode::Obs { .. } => return None,
            }
        }
        match level.get(*last)? {
            CubeNode::Obs { value } => Some(value),
            CubeNode::Branch(_) => None,
        }
    }

    /// Stores an observation, creating intermediate levels as needed.
    /// Overwrites any previous observation at the same path.
    pub fn set(&mut self, path: &[&str], obs: Observation) -> Result<(), CubeError> {
        if let Some(seg) = path.iter().find(|s| **s == OBSERVATION_KEY) {
            return Err(CubeError::InvalidDimension((*seg).to_string()));
        }
        let (last, parents) = path.split_last().ok_or(CubeError::EmptyPath)?;

        let mut level = &mut self.root;
        for seg in parents {
            level = level
                .entry((*seg).to_string())
                .or_insert_with(CubeNode::branch)
                .as_branch_mut();
        }
        level.insert((*last).to_string(), CubeNode::Obs { value: obs });
        Ok(())
    }

    /// Whether a full path is populated.
    pub fn contains(&self, path: &[&str]) -> bool {
        self.get(path).is_some()
    }
}
