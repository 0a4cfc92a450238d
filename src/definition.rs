//! Reference node definitions
//!
//! A `ParsedNodeDefinition` is the canonical shape a node document is
//! checked against. It is produced outside this crate and only consumed here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Canonical definition of a node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedNodeDefinition {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub inputs: Vec<Value>,
    #[serde(default)]
    pub outputs: Vec<Value>,
    #[serde(default)]
    pub group: Option<Vec<String>>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl ParsedNodeDefinition {
    /// Parse a reference definition from JSON text
    pub fn from_json_str(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Top-level scalar field by its document key, as a JSON value
    pub fn field(&self, key: &str) -> Option<Value> {
        match key {
            "displayName" => self.display_name.clone().map(Value::String),
            "name" => self.name.clone().map(Value::String),
            "version" => self
                .version
                .and_then(serde_json::Number::from_f64)
                .map(normalize_number),
            "description" => self.description.clone().map(Value::String),
            _ => None,
        }
    }

    /// Properties flagged as required
    pub fn required_properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter(|p| p.required.unwrap_or(false))
    }
}

/// Render whole floats as integers so `1.0` serializes as `1`
fn normalize_number(n: serde_json::Number) -> Value {
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Value::from(f as i64),
        _ => Value::Number(n),
    }
}

/// One configurable property of a node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub display_name: String,
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_camel_case() {
        let def: ParsedNodeDefinition = serde_json::from_value(json!({
            "displayName": "GitHub",
            "name": "github",
            "version": 1,
            "properties": [
                {"displayName": "Repository", "name": "repository", "type": "string", "required": true}
            ],
            "group": null
        }))
        .unwrap();

        assert_eq!(def.display_name.as_deref(), Some("GitHub"));
        assert_eq!(def.version, Some(1.0));
        assert_eq!(def.properties[0].property_type, "string");
        assert!(def.group.is_none());
        assert!(def.description.is_none());
        assert_eq!(def.required_properties().count(), 1);
    }

    #[test]
    fn test_field_lookup() {
        let def = ParsedNodeDefinition {
            name: Some("github".to_string()),
            version: Some(1.0),
            ..Default::default()
        };
        assert_eq!(def.field("name"), Some(json!("github")));
        assert_eq!(def.field("version"), Some(json!(1)));
        assert_eq!(def.field("displayName"), None);
        assert_eq!(def.field("unknown"), None);
    }

    #[test]
    fn test_from_json_str() {
        let def = ParsedNodeDefinition::from_json_str(r#"{"name": "github", "version": 2}"#).unwrap();
        assert_eq!(def.name.as_deref(), Some("github"));

        match ParsedNodeDefinition::from_json_str(r#"{"properties": "none"}"#) {
            Err(crate::error::CheckError::Json(_)) => {}
            other => panic!("Expected JSON error, got {:?}", other),
        }
    }
}
