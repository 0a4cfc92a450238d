//! Structural differ
//!
//! Compares two JSON documents and reports every divergence as a typed
//! [`Difference`]. Output order is part of the contract:
//!
//! - object members are visited in the local document's key order, followed by
//!   keys that only the spec document has, in the spec's order
//! - array elements are aligned strictly by index, with no re-alignment; a
//!   reordered array shows up as per-index value differences
//! - nested objects are descended into at the position of their parent key, so
//!   sub-differences appear where the parent would have been
//!
//! The walk uses an explicit work stack bounded by a configurable depth rather
//! than native recursion.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::config::DiffConfig;
use crate::error::{parse_json, CheckError, Result};
use crate::value::{deep_equal, index_path, key_path};

/// Default maximum nesting depth of containers the differ will descend into
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Classification of a single difference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceKind {
    /// Present in the spec document only
    MissingInLocal,
    /// Present in the local document only
    ExtraInLocal,
    /// Present in both with unequal values
    DifferentValue,
}

/// One detected divergence between the two documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Difference {
    /// Dotted/bracketed address, e.g. `properties[2].name`
    pub property: String,
    /// Local value; `None` when the key or index is absent locally
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present_value")]
    pub local: Option<Value>,
    /// Spec value; `None` when the key or index is absent from the spec
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present_value")]
    pub spec: Option<Value>,
    pub kind: DifferenceKind,
}

/// A key that is present always yields `Some`, so an explicit `null` stays
/// distinct from an absent side
fn present_value<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Result of comparing two documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeComparison {
    /// True iff `differences` is empty
    pub identical: bool,
    pub differences: Vec<Difference>,
    pub summary: String,
}

impl NodeComparison {
    fn from_differences(differences: Vec<Difference>) -> Self {
        let summary = summarize(&differences);
        Self {
            identical: differences.is_empty(),
            differences,
            summary,
        }
    }

    /// Number of differences of the given kind
    pub fn count(&self, kind: DifferenceKind) -> usize {
        self.differences.iter().filter(|d| d.kind == kind).count()
    }

    /// Rough 0-100 similarity: 5 points off per difference, capped at 50
    pub fn similarity_score(&self) -> u8 {
        if self.identical {
            return 100;
        }
        let penalty = self.differences.len().saturating_mul(5).min(50);
        (100 - penalty) as u8
    }
}

const NO_DIFFERENCES: &str = "No differences found between local and spec nodes";

fn summarize(differences: &[Difference]) -> String {
    if differences.is_empty() {
        return NO_DIFFERENCES.to_string();
    }

    let count = |kind: DifferenceKind| differences.iter().filter(|d| d.kind == kind).count();
    let mut parts = Vec::new();

    let missing = count(DifferenceKind::MissingInLocal);
    if missing > 0 {
        parts.push(format!("{} missing properties", missing));
    }
    let extra = count(DifferenceKind::ExtraInLocal);
    if extra > 0 {
        parts.push(format!("{} extra properties", extra));
    }
    let changed = count(DifferenceKind::DifferentValue);
    if changed > 0 {
        parts.push(format!("{} different values", changed));
    }

    format!("Found {} differences: {}", differences.len(), parts.join(", "))
}

/// A container still being walked
enum Frame<'a> {
    Object {
        path: String,
        local: &'a Map<String, Value>,
        spec: &'a Map<String, Value>,
        keys: Vec<&'a str>,
        next: usize,
    },
    Array {
        path: String,
        local: &'a [Value],
        spec: &'a [Value],
        next: usize,
    },
}

/// One (key or index) slot produced by a frame
struct Slot<'a> {
    path: String,
    local: Option<&'a Value>,
    spec: Option<&'a Value>,
    /// Arrays nested directly in arrays are compared whole, never descended into
    in_array: bool,
}

impl<'a> Frame<'a> {
    fn object(path: String, local: &'a Map<String, Value>, spec: &'a Map<String, Value>) -> Self {
        // Local keys first, then spec-only keys in spec order
        let mut keys: Vec<&'a str> = local.keys().map(String::as_str).collect();
        keys.extend(
            spec.keys()
                .filter(|k| !local.contains_key(k.as_str()))
                .map(String::as_str),
        );
        Frame::Object { path, local, spec, keys, next: 0 }
    }

    fn array(path: String, local: &'a [Value], spec: &'a [Value]) -> Self {
        Frame::Array { path, local, spec, next: 0 }
    }

    fn next_slot(&mut self) -> Option<Slot<'a>> {
        match self {
            Frame::Object { path, local, spec, keys, next } => {
                let key = *keys.get(*next)?;
                *next += 1;
                let (local, spec): (&'a Map<String, Value>, &'a Map<String, Value>) = (*local, *spec);
                Some(Slot {
                    path: key_path(path, key),
                    local: local.get(key),
                    spec: spec.get(key),
                    in_array: false,
                })
            }
            Frame::Array { path, local, spec, next } => {
                if *next >= local.len().max(spec.len()) {
                    return None;
                }
                let i = *next;
                *next += 1;
                let (local, spec): (&'a [Value], &'a [Value]) = (*local, *spec);
                Some(Slot {
                    path: index_path(path, i),
                    local: local.get(i),
                    spec: spec.get(i),
                    in_array: true,
                })
            }
        }
    }
}

/// Compares two JSON documents
#[derive(Debug, Clone)]
pub struct StructuralDiffer {
    max_depth: usize,
}

impl StructuralDiffer {
    /// Create a differ with the default depth limit
    pub fn new() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }

    /// Set the maximum container nesting depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn from_config(config: &DiffConfig) -> Self {
        Self::new().with_max_depth(config.max_depth)
    }

    /// Maximum container nesting depth
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Parse both documents and compare them.
    ///
    /// Unparsable input is an error, never "no differences".
    pub fn compare_str(&self, local: &str, spec: &str) -> Result<NodeComparison> {
        let local = parse_json(local)?;
        let spec = parse_json(spec)?;
        self.compare(&local, &spec)
    }

    /// Compare a local document against a spec document
    pub fn compare(&self, local: &Value, spec: &Value) -> Result<NodeComparison> {
        let mut differences = Vec::new();
        let mut stack: Vec<Frame<'_>> = Vec::new();

        self.visit(
            Slot { path: String::new(), local: Some(local), spec: Some(spec), in_array: false },
            &mut stack,
            &mut differences,
        )?;

        while let Some(frame) = stack.last_mut() {
            match frame.next_slot() {
                Some(slot) => self.visit(slot, &mut stack, &mut differences)?,
                None => {
                    stack.pop();
                }
            }
        }

        let comparison = NodeComparison::from_differences(differences);
        debug!(
            differences = comparison.differences.len(),
            identical = comparison.identical,
            "compared node documents"
        );
        Ok(comparison)
    }

    fn visit<'a>(
        &self,
        slot: Slot<'a>,
        stack: &mut Vec<Frame<'a>>,
        differences: &mut Vec<Difference>,
    ) -> Result<()> {
        let Slot { path, local, spec, in_array } = slot;

        let (local, spec) = match (local, spec) {
            (None, None) => return Ok(()),
            (None, Some(spec)) => {
                push_difference(differences, path, None, Some(spec), DifferenceKind::MissingInLocal);
                return Ok(());
            }
            (Some(local), None) => {
                push_difference(differences, path, Some(local), None, DifferenceKind::ExtraInLocal);
                return Ok(());
            }
            (Some(local), Some(spec)) => (local, spec),
        };

        match (local, spec) {
            (Value::Object(l), Value::Object(s)) => {
                self.push_frame(stack, Frame::object(path, l, s))
            }
            (Value::Array(l), Value::Array(s)) if !in_array => {
                self.push_frame(stack, Frame::array(path, l, s))
            }
            _ => {
                if !deep_equal(local, spec) {
                    push_difference(
                        differences,
                        path,
                        Some(local),
                        Some(spec),
                        DifferenceKind::DifferentValue,
                    );
                }
                Ok(())
            }
        }
    }

    fn push_frame<'a>(&self, stack: &mut Vec<Frame<'a>>, frame: Frame<'a>) -> Result<()> {
        if stack.len() >= self.max_depth {
            let path = match &frame {
                Frame::Object { path, .. } | Frame::Array { path, .. } => path.clone(),
            };
            return Err(CheckError::DepthExceeded { path, limit: self.max_depth });
        }
        stack.push(frame);
        Ok(())
    }
}

impl Default for StructuralDiffer {
    fn default() -> Self {
        Self::new()
    }
}

fn push_difference(
    differences: &mut Vec<Difference>,
    property: String,
    local: Option<&Value>,
    spec: Option<&Value>,
    kind: DifferenceKind,
) {
    trace!(path = %property, ?kind, "difference");
    differences.push(Difference {
        property,
        local: local.cloned(),
        spec: spec.cloned(),
        kind,
    });
}
