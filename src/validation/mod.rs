//! Node compliance validation
//!
//! Checks a node document against a reference [`ParsedNodeDefinition`] by
//! running a fixed sequence of rules:
//!
//! 1. **Required properties**: top-level identity fields, then required items
//! 2. **Types**: scalar fields and array-shaped collections
//! 3. **Values**: version drift, name identity, recommended groups
//! 4. **Structure**: every entry of `properties[]` is well formed
//! 5. **Naming**: node and property names follow the identifier conventions
//!
//! Findings are emitted in that order. Every rule runs regardless of what an
//! earlier rule found, and the compliance score depends only on how many errors
//! and warnings were produced.

mod rules;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::definition::ParsedNodeDefinition;
use crate::error::CheckError;
use crate::value::kind_name;

const ERROR_WEIGHT: usize = 10;
const WARNING_WEIGHT: usize = 2;
const MAX_SCORE: usize = 100;

/// Compliance score: 100 minus 10 per error and 2 per warning, floored at 0
pub fn compliance_score(errors: usize, warnings: usize) -> u8 {
    let deduction = errors
        .saturating_mul(ERROR_WEIGHT)
        .saturating_add(warnings.saturating_mul(WARNING_WEIGHT));
    MAX_SCORE.saturating_sub(deduction) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    MissingProperty,
    InvalidType,
    InvalidValue,
    /// The document parses but has the wrong shape
    StructuralError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationWarningKind {
    DeprecatedProperty,
    MissingOptional,
    StyleIssue,
}

/// A compliance failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub path: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
}

/// An informational finding that does not invalidate the node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub kind: ValidationWarningKind,
    pub path: String,
    pub message: String,
}

/// Outcome of validating one node document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    pub score: u8,
}

impl ValidationResult {
    /// Degenerate result for a document that could not be checked at all
    fn structural_failure(message: String, expected: &str, actual: &str) -> Self {
        Self {
            is_valid: false,
            errors: vec![ValidationError {
                kind: ValidationErrorKind::StructuralError,
                path: "root".to_string(),
                message,
                expected: Some(Value::from(expected)),
                actual: Some(Value::from(actual)),
            }],
            warnings: Vec::new(),
            score: 0,
        }
    }

    pub fn errors_of(&self, kind: ValidationErrorKind) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }

    pub fn warnings_of(&self, kind: ValidationWarningKind) -> impl Iterator<Item = &ValidationWarning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}

/// Errors and warnings produced by one or more rules, in emission order
#[derive(Debug, Default)]
pub(crate) struct Findings {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl Findings {
    pub fn error(
        &mut self,
        kind: ValidationErrorKind,
        path: impl Into<String>,
        message: impl Into<String>,
        expected: Option<Value>,
        actual: Option<Value>,
    ) {
        let error = ValidationError {
            kind,
            path: path.into(),
            message: message.into(),
            expected,
            actual,
        };
        trace!(path = %error.path, kind = ?error.kind, "validation error");
        self.errors.push(error);
    }

    pub fn warning(
        &mut self,
        kind: ValidationWarningKind,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        let warning = ValidationWarning {
            kind,
            path: path.into(),
            message: message.into(),
        };
        trace!(path = %warning.path, kind = ?warning.kind, "validation warning");
        self.warnings.push(warning);
    }

    /// Append another rule's findings after this one's
    pub fn merge(mut self, other: Findings) -> Self {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self
    }

    fn into_result(self) -> ValidationResult {
        ValidationResult {
            is_valid: self.errors.is_empty(),
            score: compliance_score(self.errors.len(), self.warnings.len()),
            errors: self.errors,
            warnings: self.warnings,
        }
    }
}

/// Validates node documents against reference definitions
#[derive(Debug, Clone)]
pub struct ComplianceValidator {
    naming: rules::NamingPatterns,
}

impl Default for ComplianceValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ComplianceValidator {
    pub fn new() -> Self {
        Self {
            naming: rules::NamingPatterns::new(),
        }
    }

    /// Parse and validate a node document.
    ///
    /// Text that is not JSON produces a single `root` structural error with score 0.
    pub fn validate_str(&self, node: &str, reference: &ParsedNodeDefinition) -> ValidationResult {
        match serde_json::from_str::<Value>(node) {
            Ok(value) => self.validate(&value, reference),
            Err(e) => {
                let err = CheckError::parse(&e, node);
                warn!(error = %err, "node document is not valid JSON");
                ValidationResult::structural_failure(
                    format!("Failed to parse or validate node: {}", e),
                    "valid JSON",
                    "invalid JSON",
                )
            }
        }
    }

    /// Validate a parsed node document.
    ///
    /// A `null` document is a single `root` structural error with score 0. Any
    /// other non-object document has no fields and runs through every check.
    pub fn validate(&self, node: &Value, reference: &ParsedNodeDefinition) -> ValidationResult {
        let empty = Map::new();
        let node = match node {
            Value::Object(map) => map,
            Value::Null => {
                warn!("node document is null");
                return ValidationResult::structural_failure(
                    "Node definition must be a JSON object".to_string(),
                    "object",
                    kind_name(Some(node)),
                );
            }
            other => {
                debug!(kind = kind_name(Some(other)), "node document is not an object, checking without fields");
                &empty
            }
        };

        let result = Findings::default()
            .merge(rules::required_properties(node, reference))
            .merge(rules::required_items(node, reference))
            .merge(rules::property_types(node, reference))
            .merge(rules::property_values(node, reference))
            .merge(rules::property_structure(node))
            .merge(rules::naming_conventions(node, &self.naming))
            .into_result();

        debug!(
            node = reference.name.as_deref().unwrap_or("<unnamed>"),
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            score = result.score,
            "validated node"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_score_weights() {
        assert_eq!(compliance_score(0, 0), 100);
        assert_eq!(compliance_score(1, 0), 90);
        assert_eq!(compliance_score(0, 1), 98);
        assert_eq!(compliance_score(3, 5), 60);
    }

    #[test]
    fn test_score_floor() {
        assert_eq!(compliance_score(10, 0), 0);
        assert_eq!(compliance_score(50, 50), 0);
        assert_eq!(compliance_score(usize::MAX, usize::MAX), 0);
    }

    #[test]
    fn test_score_monotonic() {
        for e in 0..12 {
            for w in 0..12 {
                assert!(compliance_score(e + 1, w) <= compliance_score(e, w));
                assert!(compliance_score(e, w + 1) <= compliance_score(e, w));
            }
        }
    }

    #[test]
    fn test_null_root_is_structural_failure() {
        let result = ComplianceValidator::new().validate(&json!(null), &ParsedNodeDefinition::default());
        assert!(!result.is_valid);
        assert_eq!(result.score, 0);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "root");
        assert_eq!(result.errors[0].actual, Some(json!("null")));
    }

    #[test]
    fn test_array_root_is_checked_without_fields() {
        let reference = ParsedNodeDefinition {
            display_name: Some("GitHub".to_string()),
            name: Some("github".to_string()),
            ..Default::default()
        };
        let result = ComplianceValidator::new().validate(&json!([]), &reference);

        assert!(!result.is_valid);
        let paths: Vec<_> = result
            .errors_of(ValidationErrorKind::MissingProperty)
            .map(|e| e.path.as_str())
            .collect();
        assert_eq!(paths, vec!["displayName", "name"]);
        assert!(result.errors.iter().all(|e| e.path != "root"));
        assert!(result.score > 0);
    }

    #[test]
    fn test_invalid_json_is_structural_failure() {
        let result = ComplianceValidator::new().validate_str("{ invalid json", &ParsedNodeDefinition::default());
        assert!(!result.is_valid);
        assert_eq!(result.score, 0);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ValidationErrorKind::StructuralError);
        assert_eq!(result.errors[0].expected, Some(json!("valid JSON")));
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = ComplianceValidator::new().validate(&json!({}), &ParsedNodeDefinition::default());
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["isValid"], json!(true));
        assert_eq!(value["score"], json!(100));
    }
}
