//! Schema grammar and raw schema documents
//!
//! A schema document is a YAML (or JSON) mapping:
//!
//! ```yaml
//! root_key: nginx
//! description: Reverse proxy settings
//! fields:
//!   listen:
//!     type: int
//!     default: 8080
//!     validation: { ge: 1, le: 65535 }
//!   upstreams:
//!     type: list[model]
//!     required: true
//!     model:
//!       fields:
//!         host: { type: str, required: true }
//! ```
//!
//! The loader hands documents around untyped ([`RawSchema`]); the typed
//! [`FieldSpec`] view is produced on demand, by the compiler and by anything
//! that needs to mirror the schema shape (form renderers, `forge describe`).

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::checksum::Checksum;
use crate::error::{Result, SchemaError};

/// Declared `type` of a field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Str,
    Int,
    Bool,
    Float,
    /// Nested object described by `model.fields`
    Model,
    /// Homogeneous list of nested objects described by `model.fields`
    ListOfModel,
    /// Homogeneous list of strings
    ListOfStr,
    /// Anything else; validated as an unconstrained value
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Str => "str",
            FieldType::Int => "int",
            FieldType::Bool => "bool",
            FieldType::Float => "float",
            FieldType::Model => "model",
            FieldType::ListOfModel => "list[model]",
            FieldType::ListOfStr => "list[str]",
            FieldType::Other(other) => other,
        }
    }

    /// Whether the type needs a nested `model.fields` mapping
    pub fn is_model(&self) -> bool {
        matches!(self, FieldType::Model | FieldType::ListOfModel)
    }
}

impl From<String> for FieldType {
    fn from(s: String) -> Self {
        match s.trim() {
            "str" => FieldType::Str,
            "int" => FieldType::Int,
            "bool" => FieldType::Bool,
            "float" => FieldType::Float,
            "model" => FieldType::Model,
            "list[model]" => FieldType::ListOfModel,
            "list[str]" => FieldType::ListOfStr,
            _ => FieldType::Other(s),
        }
    }
}

impl From<FieldType> for String {
    fn from(t: FieldType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraint bag attached to a field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    /// Regular expression the whole string must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Inclusive lower bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ge: Option<Number>,
    /// Inclusive upper bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub le: Option<Number>,
    /// Maximum string length, in characters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Literal values the field may take
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Value>>,
}

impl Validation {
    pub fn is_empty(&self) -> bool {
        self == &Validation::default()
    }
}

/// Nested object definition for `model` and `list[model]` fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<IndexMap<String, FieldSpec>>,
}

/// One field's entry within a schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "Validation::is_empty")]
    pub validation: Validation,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelSpec>,

    /// Ordered alternatives; mutually exclusive with `type`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub union: Option<Vec<FieldSpec>>,

    /// Free-form help text for form renderers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl FieldSpec {
    /// Nested field definitions, if any
    pub fn model_fields(&self) -> Option<&IndexMap<String, FieldSpec>> {
        self.model.as_ref().and_then(|m| m.fields.as_ref())
    }

    /// Choice literals, if declared
    pub fn choices(&self) -> Option<&[Value]> {
        self.validation.choices.as_deref()
    }

    /// Short human-readable type label, e.g. `int` or `union[int | str]`
    pub fn type_label(&self) -> String {
        if let Some(alternatives) = &self.union {
            let labels: Vec<String> = alternatives.iter().map(FieldSpec::type_label).collect();
            return format!("union[{}]", labels.join(" | "));
        }
        match &self.field_type {
            Some(t) => t.to_string(),
            None => "?".to_string(),
        }
    }
}

/// Parse a raw `fields` mapping into typed field specs.
///
/// Errors carry the path inside the mapping where deserialization failed.
pub fn parse_fields(fields: &Value) -> Result<IndexMap<String, FieldSpec>> {
    serde_path_to_error::deserialize(fields).map_err(|err| {
        let path = err.path().to_string();
        SchemaError::InvalidFieldSpec {
            path,
            reason: err.into_inner().to_string(),
        }
    })
}

/// A schema document as loaded from disk, before compilation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSchema {
    /// Name the schema was looked up by
    pub name: String,
    /// The parsed document
    pub content: Value,
}

impl RawSchema {
    pub fn new(name: impl Into<String>, content: Value) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }

    /// The raw `fields` mapping
    pub fn fields(&self) -> Result<&Value> {
        match self.content.get("fields") {
            Some(fields @ Value::Object(_)) => Ok(fields),
            _ => Err(SchemaError::MissingFields {
                name: self.name.clone(),
            }),
        }
    }

    /// Typed view of the top-level fields
    pub fn field_specs(&self) -> Result<IndexMap<String, FieldSpec>> {
        parse_fields(self.fields()?)
    }

    /// Key the generated document is wrapped under.
    ///
    /// An explicit `root_key` wins; otherwise the schema name is used.
    pub fn root_key(&self) -> &str {
        self.content
            .get("root_key")
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
            .unwrap_or(&self.name)
    }

    pub fn description(&self) -> Option<&str> {
        self.content.get("description").and_then(Value::as_str)
    }

    /// Digest of the document content
    pub fn checksum(&self) -> Checksum {
        Checksum::from_json(&self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_type_parsing() {
        assert_eq!(FieldType::from("str".to_string()), FieldType::Str);
        assert_eq!(FieldType::from("list[model]".to_string()), FieldType::ListOfModel);
        assert_eq!(FieldType::from("list[str]".to_string()), FieldType::ListOfStr);
        assert_eq!(
            FieldType::from("datetime".to_string()),
            FieldType::Other("datetime".to_string())
        );
        assert!(FieldType::ListOfModel.is_model());
        assert!(!FieldType::ListOfStr.is_model());
    }

    #[test]
    fn test_parse_nested_fields() {
        let fields = json!({
            "server": {
                "type": "model",
                "required": true,
                "model": {
                    "fields": {
                        "port": { "type": "int", "default": 80, "validation": { "ge": 1 } }
                    }
                }
            },
            "mode": { "union": [{ "type": "int" }, { "type": "str" }] }
        });

        let specs = parse_fields(&fields).unwrap();
        let keys: Vec<_> = specs.keys().cloned().collect();
        assert_eq!(keys, vec!["server", "mode"]);

        let server = &specs["server"];
        assert!(server.required);
        let port = &server.model_fields().unwrap()["port"];
        assert_eq!(port.field_type, Some(FieldType::Int));
        assert_eq!(port.default, Some(json!(80)));
        assert_eq!(port.validation.ge, Some(Number::from(1)));

        assert_eq!(specs["mode"].type_label(), "union[int | str]");
    }

    #[test]
    fn test_parse_error_reports_path() {
        let fields = json!({
            "server": {
                "type": "model",
                "model": { "fields": { "port": { "type": "int", "required": "yes" } } }
            }
        });

        match parse_fields(&fields) {
            Err(SchemaError::InvalidFieldSpec { path, .. }) => {
                assert_eq!(path, "server.model.fields.port.required");
            }
            other => panic!("Expected InvalidFieldSpec, got {:?}", other),
        }
    }

    #[test]
    fn test_root_key_falls_back_to_name() {
        let raw = RawSchema::new("redis", json!({ "fields": {} }));
        assert_eq!(raw.root_key(), "redis");

        let raw = RawSchema::new("redis", json!({ "root_key": "cache", "fields": {} }));
        assert_eq!(raw.root_key(), "cache");
    }

    #[test]
    fn test_missing_fields_mapping() {
        let raw = RawSchema::new("empty", json!({ "description": "nothing here" }));
        assert!(matches!(raw.fields(), Err(SchemaError::MissingFields { .. })));
    }
}
