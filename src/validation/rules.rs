//! Individual compliance rules
//!
//! Each rule inspects the node independently and returns its own findings.

use regex::Regex;
use serde_json::{Map, Value};

use super::{Findings, ValidationErrorKind, ValidationWarningKind};
use crate::definition::ParsedNodeDefinition;
use crate::value::{coerce_to_string, deep_equal, index_path, is_truthy, kind_name};

/// Identifier patterns for node and property names
#[derive(Debug, Clone)]
pub(super) struct NamingPatterns {
    /// Letter first, then letters and digits
    node: Regex,
    /// Property names additionally allow underscores
    property: Regex,
}

impl NamingPatterns {
    pub fn new() -> Self {
        Self {
            node: Regex::new(r"^[A-Za-z][A-Za-z0-9]*$").expect("node name pattern"),
            property: Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("property name pattern"),
        }
    }
}

const IDENTITY_FIELDS: [&str; 4] = ["displayName", "name", "version", "description"];

const TYPED_FIELDS: [(&str, &str); 4] = [
    ("displayName", "string"),
    ("name", "string"),
    ("version", "number"),
    ("description", "string"),
];

const ARRAY_FIELDS: [&str; 3] = ["properties", "inputs", "outputs"];

const ITEM_STRING_FIELDS: [&str; 3] = ["name", "type", "displayName"];

fn local_properties(node: &Map<String, Value>) -> &[Value] {
    match node.get("properties") {
        Some(Value::Array(items)) => items,
        _ => &[],
    }
}

/// Plain rendering for messages: strings unquoted, everything else as JSON
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Identity fields the reference sets must be present and non-empty locally
pub(super) fn required_properties(node: &Map<String, Value>, reference: &ParsedNodeDefinition) -> Findings {
    let mut findings = Findings::default();

    for key in IDENTITY_FIELDS {
        let expected = reference.field(key);
        if is_truthy(expected.as_ref()) && !is_truthy(node.get(key)) {
            findings.error(
                ValidationErrorKind::MissingProperty,
                key,
                format!("Required property '{}' is missing", key),
                expected,
                None,
            );
        }
    }

    findings
}

/// Every required reference property must appear by name in the local `properties`
pub(super) fn required_items(node: &Map<String, Value>, reference: &ParsedNodeDefinition) -> Findings {
    let mut findings = Findings::default();

    // Nothing to match against when the node has no properties list
    let Some(Value::Array(items)) = node.get("properties") else {
        return findings;
    };

    for required in reference.required_properties() {
        let present = items
            .iter()
            .any(|item| item.get("name").and_then(Value::as_str) == Some(required.name.as_str()));

        if !present {
            findings.error(
                ValidationErrorKind::MissingProperty,
                format!("properties.{}", required.name),
                format!("Required property '{}' is missing", required.name),
                serde_json::to_value(required).ok(),
                None,
            );
        }
    }

    findings
}

/// Scalar identity fields and collections must have the expected JSON kind
pub(super) fn property_types(node: &Map<String, Value>, reference: &ParsedNodeDefinition) -> Findings {
    let mut findings = Findings::default();

    for (key, expected) in TYPED_FIELDS {
        let Some(local) = node.get(key) else { continue };
        if reference.field(key).is_none() {
            continue;
        }

        let actual = kind_name(Some(local));
        if actual != expected {
            findings.error(
                ValidationErrorKind::InvalidType,
                key,
                format!("Property '{}' has incorrect type", key),
                Some(Value::from(expected)),
                Some(Value::from(actual)),
            );
        }
    }

    for key in ARRAY_FIELDS {
        if let Some(local) = node.get(key) {
            if !local.is_array() {
                findings.error(
                    ValidationErrorKind::InvalidType,
                    key,
                    format!("Property '{}' must be an array", key),
                    Some(Value::from("array")),
                    Some(Value::from(kind_name(Some(local)))),
                );
            }
        }
    }

    findings
}

/// Version drift warns, a name mismatch fails, missing groups warn once
pub(super) fn property_values(node: &Map<String, Value>, reference: &ParsedNodeDefinition) -> Findings {
    let mut findings = Findings::default();

    if let (Some(local), Some(spec)) = (node.get("version"), reference.field("version")) {
        if !deep_equal(local, &spec) {
            findings.warning(
                ValidationWarningKind::DeprecatedProperty,
                "version",
                format!(
                    "Node version {} differs from spec version {}",
                    display(local),
                    display(&spec)
                ),
            );
        }
    }

    let local_name = node.get("name");
    let spec_name = reference.field("name");
    if let (Some(local), Some(spec)) = (local_name, spec_name) {
        if is_truthy(Some(local)) && is_truthy(Some(&spec)) && !deep_equal(local, &spec) {
            findings.error(
                ValidationErrorKind::InvalidValue,
                "name",
                format!(
                    "Node name '{}' does not match specification '{}'",
                    display(local),
                    display(&spec)
                ),
                Some(spec),
                Some(local.clone()),
            );
        }
    }

    if let (Some(Value::Array(local_groups)), Some(spec_groups)) = (node.get("group"), &reference.group) {
        let missing: Vec<&str> = spec_groups
            .iter()
            .filter(|g| !local_groups.iter().any(|l| l.as_str() == Some(g.as_str())))
            .map(String::as_str)
            .collect();

        // One warning for all missing groups
        if !missing.is_empty() {
            findings.warning(
                ValidationWarningKind::MissingOptional,
                "group",
                format!("Missing recommended groups: {}", missing.join(", ")),
            );
        }
    }

    findings
}

/// Each `properties[]` entry needs non-empty string `name`, `type` and `displayName`
pub(super) fn property_structure(node: &Map<String, Value>) -> Findings {
    let mut findings = Findings::default();

    for (i, item) in local_properties(node).iter().enumerate() {
        let base = index_path("properties", i);

        for field in ITEM_STRING_FIELDS {
            let value = item.get(field);
            let well_formed = matches!(value, Some(Value::String(s)) if !s.is_empty());
            if !well_formed {
                findings.error(
                    ValidationErrorKind::StructuralError,
                    format!("{}.{}", base, field),
                    format!("Property {} is required and must be a string", field),
                    Some(Value::from("string")),
                    Some(Value::from(kind_name(value))),
                );
            }
        }
    }

    findings
}

/// Node names are alphanumeric, property names may also contain underscores.
///
/// Any present, non-empty name is checked; non-string names are matched in
/// their string form, so `123` fails like `"123"` would.
pub(super) fn naming_conventions(node: &Map<String, Value>, patterns: &NamingPatterns) -> Findings {
    let mut findings = Findings::default();

    if let Some(name) = node.get("name").filter(|v| is_truthy(Some(v))) {
        if !patterns.node.is_match(&coerce_to_string(name)) {
            findings.error(
                ValidationErrorKind::InvalidValue,
                "name",
                "Node name must start with a letter and contain only alphanumeric characters",
                Some(Value::from("alphanumeric name starting with letter")),
                Some(name.clone()),
            );
        }
    }

    for (i, item) in local_properties(node).iter().enumerate() {
        let Some(name) = item.get("name").filter(|v| is_truthy(Some(v))) else {
            continue;
        };
        if !patterns.property.is_match(&coerce_to_string(name)) {
            findings.error(
                ValidationErrorKind::InvalidValue,
                format!("{}.name", index_path("properties", i)),
                "Property name must start with a letter and contain only alphanumeric characters and underscores",
                Some(Value::from("valid property name")),
                Some(name.clone()),
            );
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::Property;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("Expected object, got {}", other),
        }
    }

    fn reference() -> ParsedNodeDefinition {
        ParsedNodeDefinition {
            display_name: Some("GitHub".to_string()),
            name: Some("github".to_string()),
            version: Some(1.0),
            description: Some("GitHub API operations".to_string()),
            properties: vec![Property {
                display_name: "Repository".to_string(),
                name: "repository".to_string(),
                property_type: "string".to_string(),
                required: Some(true),
                ..Default::default()
            }],
            group: Some(vec!["Development".to_string(), "Output".to_string()]),
            ..Default::default()
        }
    }

    #[test]
    fn test_falsy_identity_fields_are_missing() {
        let node = object(json!({"displayName": "", "name": "github", "version": 0}));
        let findings = required_properties(&node, &reference());
        let paths: Vec<_> = findings.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["displayName", "version", "description"]);
    }

    #[test]
    fn test_unset_reference_fields_are_not_required() {
        let node = object(json!({}));
        let findings = required_properties(&node, &ParsedNodeDefinition::default());
        assert!(findings.errors.is_empty());
    }

    #[test]
    fn test_missing_required_item() {
        let node = object(json!({"properties": [{"name": "owner"}]}));
        let findings = required_items(&node, &reference());
        assert_eq!(findings.errors.len(), 1);
        assert_eq!(findings.errors[0].path, "properties.repository");
        assert_eq!(findings.errors[0].expected.as_ref().unwrap()["name"], json!("repository"));
    }

    #[test]
    fn test_required_items_skipped_without_properties_list() {
        let node = object(json!({"name": "github"}));
        assert!(required_items(&node, &reference()).errors.is_empty());
    }

    #[test]
    fn test_type_mismatches() {
        let node = object(json!({"version": "1", "name": 5, "inputs": {}, "outputs": null}));
        let findings = property_types(&node, &reference());
        let found: Vec<_> = findings
            .errors
            .iter()
            .map(|e| (e.path.as_str(), e.actual.clone().unwrap()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("name", json!("number")),
                ("version", json!("string")),
                ("inputs", json!("object")),
                ("outputs", json!("null")),
            ]
        );
    }

    #[test]
    fn test_version_type_unchecked_without_reference_version() {
        let node = object(json!({"version": "1"}));
        let findings = property_types(&node, &ParsedNodeDefinition::default());
        assert!(findings.errors.is_empty());
    }

    #[test]
    fn test_name_mismatch_is_error_version_drift_is_warning() {
        let node = object(json!({"name": "gitlab", "version": 2, "group": ["Development"]}));
        let findings = property_values(&node, &reference());
        assert_eq!(findings.errors.len(), 1);
        assert_eq!(findings.errors[0].kind, ValidationErrorKind::InvalidValue);
        assert_eq!(findings.errors[0].expected, Some(json!("github")));

        let kinds: Vec<_> = findings.warnings.iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![ValidationWarningKind::DeprecatedProperty, ValidationWarningKind::MissingOptional]
        );
        assert_eq!(findings.warnings[0].message, "Node version 2 differs from spec version 1");
    }

    #[test]
    fn test_missing_groups_reported_once() {
        let node = object(json!({"group": []}));
        let findings = property_values(&node, &reference());
        assert_eq!(findings.warnings.len(), 1);
        assert_eq!(findings.warnings[0].message, "Missing recommended groups: Development, Output");
    }

    #[test]
    fn test_float_version_matches_integer() {
        let node = object(json!({"version": 1.0}));
        assert!(property_values(&node, &reference()).warnings.is_empty());
    }

    #[test]
    fn test_malformed_property_entries() {
        let node = object(json!({"properties": [
            {"type": "string"},
            null,
            {"name": "ok", "type": "string", "displayName": "Ok"}
        ]}));
        let findings = property_structure(&node);
        let paths: Vec<_> = findings.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "properties[0].name",
                "properties[0].displayName",
                "properties[1].name",
                "properties[1].type",
                "properties[1].displayName",
            ]
        );
        assert_eq!(findings.errors[0].actual, Some(json!("undefined")));
    }

    #[test]
    fn test_naming_conventions() {
        let node = object(json!({
            "name": "my_node",
            "properties": [{"name": "api_key"}, {"name": "2fa"}, {"name": "ok1"}]
        }));
        let findings = naming_conventions(&node, &NamingPatterns::new());
        let paths: Vec<_> = findings.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["name", "properties[1].name"]);
    }

    #[test]
    fn test_non_string_names_checked_in_string_form() {
        let node = object(json!({
            "name": 123,
            "properties": [{"name": 5}, {"name": 0}, {"name": true}]
        }));
        let findings = naming_conventions(&node, &NamingPatterns::new());
        let found: Vec<_> = findings
            .errors
            .iter()
            .map(|e| (e.path.as_str(), e.actual.clone().unwrap()))
            .collect();
        // `0` is falsy and skipped, `true` reads as a valid identifier
        assert_eq!(
            found,
            vec![("name", json!(123)), ("properties[0].name", json!(5))]
        );
    }
}
