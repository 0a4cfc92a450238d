//! Node Compliance
//!
//! Compares and validates node definitions for an automation platform.
//!
//! ## Features
//!
//! - **Structural Diffing**: Ordered, typed differences between any two JSON documents
//! - **Compliance Validation**: Rule-based checks of a node against its reference definition
//! - **Scoring**: A 0-100 compliance score derived from error and warning counts
//!
//! Both operations are pure and synchronous. They take owned or borrowed JSON
//! values and return plain records that serialize to JSON.
//!
//! ```
//! use node_compliance::{ComplianceValidator, ParsedNodeDefinition, StructuralDiffer};
//! use serde_json::json;
//!
//! let comparison = StructuralDiffer::new()
//!     .compare(&json!({"a": [1, 2, 3]}), &json!({"a": [1, 2]}))
//!     .unwrap();
//! assert_eq!(comparison.differences[0].property, "a[2]");
//!
//! let result = ComplianceValidator::new()
//!     .validate(&json!({"name": "github"}), &ParsedNodeDefinition::default());
//! assert!(result.is_valid);
//! assert_eq!(result.score, 100);
//! ```

pub mod config;
pub mod definition;
pub mod diff;
pub mod error;
pub mod validation;
pub mod value;

pub use config::CheckerConfig;
pub use definition::{ParsedNodeDefinition, Property};
pub use diff::{Difference, DifferenceKind, NodeComparison, StructuralDiffer};
pub use error::{CheckError, Result};
pub use validation::{
    compliance_score, ComplianceValidator, ValidationError, ValidationErrorKind, ValidationResult,
    ValidationWarning, ValidationWarningKind,
};
