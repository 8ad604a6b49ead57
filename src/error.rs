//! Error types for schema loading, compilation and config generation

use thiserror::Error;

use crate::validator::ValidationReport;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors raised while loading or compiling a schema.
///
/// All of these halt the pipeline: no partially loaded or partially compiled
/// schema is ever handed to the validator.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Schema not found: {name}")]
    NotFound { name: String },

    #[error("Failed to parse schema '{name}': {reason}")]
    Parse { name: String, reason: String },

    #[error("Schema document '{name}' has no 'fields' mapping")]
    MissingFields { name: String },

    #[error("Invalid field spec at {path}: {reason}")]
    InvalidFieldSpec { path: String, reason: String },

    #[error("Field '{path}' declares neither 'type' nor 'union'")]
    MissingType { path: String },

    #[error("Field '{path}' is a model but has no 'model.fields' mapping")]
    MissingModelFields { path: String },

    #[error("Invalid pattern '{pattern}' on field '{path}': {reason}")]
    InvalidPattern {
        path: String,
        pattern: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchemaError {
    /// Whether this error means the schema document does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, SchemaError::NotFound { .. })
    }
}

/// Errors raised while rendering a validated document to text
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("YAML rendering failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON rendering failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML rendering failed: {0}")]
    Toml(#[from] toml::ser::Error),
}

/// Errors from the full load → compile → validate → render pipeline.
///
/// Each variant maps onto one response class at the endpoint layer:
/// `NotFound` is a "not found", `Validation` a client error carrying the
/// itemized report, everything else a server-side failure.
#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Schema not found: {name}")]
    NotFound { name: String },

    #[error(transparent)]
    Schema(SchemaError),

    #[error(transparent)]
    Validation(#[from] ValidationReport),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl From<SchemaError> for ForgeError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::NotFound { name } => ForgeError::NotFound { name },
            other => ForgeError::Schema(other),
        }
    }
}

impl ForgeError {
    /// The validation report, if this failure is a data-level one
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            ForgeError::Validation(report) => Some(report),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_forge_not_found() {
        let err: ForgeError = SchemaError::NotFound { name: "nginx".to_string() }.into();
        assert!(matches!(err, ForgeError::NotFound { ref name } if name == "nginx"));
        assert_eq!(err.to_string(), "Schema not found: nginx");
    }

    #[test]
    fn test_other_schema_errors_stay_schema_errors() {
        let err: ForgeError = SchemaError::MissingModelFields { path: "app.db".to_string() }.into();
        assert!(matches!(err, ForgeError::Schema(SchemaError::MissingModelFields { .. })));
        assert!(err.report().is_none());
    }
}
