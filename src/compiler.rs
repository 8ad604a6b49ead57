//! Schema Compiler
//!
//! Turns a raw `fields` mapping into an [`ObjectDescriptor`] by recursive
//! descent: one call frame per nesting level, with the scope name of each
//! nested object derived from its parent (`app` → `app_db` →
//! `app_db_replicas_item`).
//!
//! Resolution order for a single field spec:
//!
//! 1. `union` → each alternative resolved on its own
//! 2. `validation.choices` → choice set, whatever the declared type
//! 3. `model` / `list[model]` → nested object
//! 4. `list[str]` → string list
//! 5. scalar, with constraints gated by the declared type
//!
//! Compilation only fails on structural problems. Type errors in input
//! data are the validator's business.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::checksum::Checksum;
use crate::descriptor::{
    Constraints, DefaultValue, FieldDescriptor, ObjectDescriptor, Pattern, ScalarKind,
    TypeDescriptor,
};
use crate::error::{Result, SchemaError};
use crate::schema::{parse_fields, FieldSpec, FieldType, RawSchema};

/// A schema ready for validation
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSchema {
    /// Schema name
    pub name: String,
    /// Key the generated document is wrapped under
    pub root_key: String,
    /// Digest of the raw document this was compiled from
    pub checksum: Checksum,
    /// Root object descriptor
    pub root: ObjectDescriptor,
}

/// Compile a loaded schema document
pub fn compile_schema(raw: &RawSchema) -> Result<CompiledSchema> {
    let root = compile(&raw.name, raw.fields()?)?;
    let checksum = raw.checksum();
    debug!(
        schema = %raw.name,
        fields = root.len(),
        checksum = checksum.short(),
        "compiled schema"
    );

    Ok(CompiledSchema {
        name: raw.name.clone(),
        root_key: raw.root_key().to_string(),
        checksum,
        root,
    })
}

/// Compile a raw `fields` mapping under the given scope name
pub fn compile(scope_name: &str, fields: &Value) -> Result<ObjectDescriptor> {
    let specs = parse_fields(fields)?;
    compile_fields(scope_name, &specs)
}

/// Compile already-parsed field specs under the given scope name
pub fn compile_fields(scope_name: &str, specs: &IndexMap<String, FieldSpec>) -> Result<ObjectDescriptor> {
    let fields = specs
        .iter()
        .map(|(name, spec)| compile_field(scope_name, name, spec))
        .collect::<Result<Vec<_>>>()?;

    Ok(ObjectDescriptor {
        scope: scope_name.to_string(),
        fields,
    })
}

fn compile_field(scope_name: &str, field_name: &str, spec: &FieldSpec) -> Result<FieldDescriptor> {
    let descriptor = resolve_field(scope_name, field_name, spec)?;

    // A required field with a default behaves like an optional one when
    // absent; only a required field without one must be supplied.
    let default = match (&spec.default, spec.required) {
        (Some(value), _) => DefaultValue::Value(value.clone()),
        (None, true) => DefaultValue::MustSupply,
        (None, false) => DefaultValue::Absent,
    };

    Ok(FieldDescriptor {
        name: field_name.to_string(),
        descriptor,
        optional: !spec.required,
        default,
    })
}

/// Resolve one field spec to a type descriptor
pub fn resolve_field(scope_name: &str, field_name: &str, spec: &FieldSpec) -> Result<TypeDescriptor> {
    let path = format!("{scope_name}.{field_name}");

    if let Some(alternatives) = &spec.union {
        let alternatives = alternatives
            .iter()
            .map(|alt| resolve_field(scope_name, field_name, alt))
            .collect::<Result<Vec<_>>>()?;
        return Ok(TypeDescriptor::Union { alternatives });
    }

    if let Some(choices) = spec.choices() {
        return Ok(TypeDescriptor::Choice {
            allowed: choices.to_vec(),
        });
    }

    let field_type = spec
        .field_type
        .as_ref()
        .ok_or_else(|| SchemaError::MissingType { path: path.clone() })?;

    let descriptor = match field_type {
        FieldType::Model => {
            let nested = nested_fields(spec, &path)?;
            TypeDescriptor::Object(compile_fields(&format!("{scope_name}_{field_name}"), nested)?)
        }
        FieldType::ListOfModel => {
            let nested = nested_fields(spec, &path)?;
            TypeDescriptor::ListOfObject(compile_fields(
                &format!("{scope_name}_{field_name}_item"),
                nested,
            )?)
        }
        FieldType::ListOfStr => match &spec.validation.pattern {
            Some(source) => TypeDescriptor::ListOfString {
                pattern: Some(compile_pattern(&path, source)?),
                min_items: 1,
            },
            None => TypeDescriptor::ListOfString {
                pattern: None,
                min_items: 0,
            },
        },
        FieldType::Str => scalar(ScalarKind::Str, spec, &path)?,
        FieldType::Int => scalar(ScalarKind::Int, spec, &path)?,
        FieldType::Float => scalar(ScalarKind::Float, spec, &path)?,
        FieldType::Bool => scalar(ScalarKind::Bool, spec, &path)?,
        FieldType::Other(other) => {
            debug!(field = %path, declared = %other, "unknown type, accepting any value");
            scalar(ScalarKind::Any, spec, &path)?
        }
    };

    Ok(descriptor)
}

fn nested_fields<'a>(spec: &'a FieldSpec, path: &str) -> Result<&'a IndexMap<String, FieldSpec>> {
    spec.model_fields().ok_or_else(|| SchemaError::MissingModelFields {
        path: path.to_string(),
    })
}

/// Build a scalar, keeping only the constraints that apply to its kind
fn scalar(kind: ScalarKind, spec: &FieldSpec, path: &str) -> Result<TypeDescriptor> {
    let validation = &spec.validation;
    let mut constraints = Constraints::default();

    if kind == ScalarKind::Str {
        if let Some(source) = &validation.pattern {
            constraints.pattern = Some(compile_pattern(path, source)?);
        }
        constraints.max_length = validation.max_length;
    }
    if kind.is_numeric() {
        constraints.ge = validation.ge.clone();
        constraints.le = validation.le.clone();
    }

    Ok(TypeDescriptor::Scalar { kind, constraints })
}

fn compile_pattern(path: &str, source: &str) -> Result<Pattern> {
    Pattern::new(source).map_err(|err| SchemaError::InvalidPattern {
        path: path.to_string(),
        pattern: source.to_string(),
        reason: err.to_string(),
    })
}
