//! Candidate discovery
//!
//! Walks an arbitrary JSON value and lists every substructure that can be
//! plotted: numeric scalars, and rectangular numeric arrays of rank 1 to 3.
//!
//! **Walk rules:**
//! - Object: every value is visited, the key extends the path
//! - Array: if the whole array is numeric (rank 1-3) it is one candidate and its
//!   elements are not visited; otherwise the first `max_array_prefix` elements
//!   are visited with `[i]` path segments
//! - Scalar: emitted when numeric-coercible
//!
//! Paths start at `root`, so `{"data": {"v": [1, 2]}}` yields `root/data/v`.
//! A path is emitted at most once (first occurrence wins) and output order
//! follows document order, so repeated runs on the same value are identical.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use crate::classifier::{classify_path, SensorFamily};
use crate::coerce::coerce_number;
use crate::series::NumericArray;

/// First path segment of every candidate
pub const ROOT_SEGMENT: &str = "root";

/// Default recursion depth bound
pub const DEFAULT_MAX_DEPTH: usize = 12;

/// Default bound on the number of candidates
pub const DEFAULT_MAX_CANDIDATES: usize = 2000;

/// Default number of elements visited in a non-numeric array
pub const DEFAULT_MAX_ARRAY_PREFIX: usize = 200;

/// Bounds for one discovery pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryLimits {
    /// Nodes deeper than this are not visited (root is depth 0)
    pub max_depth: usize,
    /// Collection stops once this many candidates exist
    pub max_candidates: usize,
    /// Elements visited per non-numeric array
    pub max_array_prefix: usize,
}

impl Default for DiscoveryLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            max_array_prefix: DEFAULT_MAX_ARRAY_PREFIX,
        }
    }
}

/// A plottable path/value pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Path segments, starting with `root`
    pub path: Vec<String>,
    /// Raw value as found in the document
    pub value: Value,
    /// Numeric shape (`[1]` for scalars)
    pub shape: Vec<usize>,
}

impl Candidate {
    /// Slash-delimited path (`root/data/gait_pad/values/velocity`)
    pub fn path_string(&self) -> String {
        self.path.join("/")
    }

    /// Sensor family guessed from the path keywords
    pub fn family(&self) -> SensorFamily {
        classify_path(&self.path_string())
    }

    /// True for single-value candidates
    pub fn is_scalar(&self) -> bool {
        !self.value.is_array()
    }

    /// Dense numeric view of the value
    pub fn to_array(&self) -> Option<NumericArray> {
        match &self.value {
            Value::Array(_) => NumericArray::from_value(&self.value),
            other => coerce_number(other).map(NumericArray::scalar),
        }
    }
}

/// Discover candidates with default limits
pub fn discover(root: &Value) -> Vec<Candidate> {
    discover_with(root, &DiscoveryLimits::default())
}

/// Discover candidates with explicit limits
pub fn discover_with(root: &Value, limits: &DiscoveryLimits) -> Vec<Candidate> {
    let mut walker = Walker {
        limits,
        seen: HashSet::new(),
        found: Vec::new(),
    };
    let mut path = vec![ROOT_SEGMENT.to_string()];
    walker.walk(root, &mut path, 0);

    debug!(
        candidates = walker.found.len(),
        truncated = walker.found.len() >= limits.max_candidates,
        "Candidate discovery complete"
    );
    walker.found
}

struct Walker<'a> {
    limits: &'a DiscoveryLimits,
    seen: HashSet<String>,
    found: Vec<Candidate>,
}

impl Walker<'_> {
    fn walk(&mut self, node: &Value, path: &mut Vec<String>, depth: usize) {
        if self.found.len() >= self.limits.max_candidates || depth > self.limits.max_depth {
            return;
        }

        match node {
            Value::Object(map) => {
                for (key, value) in map {
                    path.push(key.clone());
                    self.walk(value, path, depth + 1);
                    path.pop();
                }
            }
            Value::Array(items) => match NumericArray::from_value(node) {
                Some(array) if (1..=3).contains(&array.rank()) => {
                    self.emit(path, node, array.shape().to_vec());
                }
                _ => {
                    for (i, item) in items.iter().take(self.limits.max_array_prefix).enumerate() {
                        path.push(format!("[{}]", i));
                        self.walk(item, path, depth + 1);
                        path.pop();
                    }
                }
            },
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                if coerce_number(node).is_some() {
                    self.emit(path, node, vec![1]);
                }
            }
        }
    }

    fn emit(&mut self, path: &[String], value: &Value, shape: Vec<usize>) {
        if self.seen.insert(path.join("/")) {
            self.found.push(Candidate {
                path: path.to_vec(),
                value: value.clone(),
                shape,
            });
        }
    }
}
