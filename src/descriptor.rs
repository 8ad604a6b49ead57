//! Type descriptors: the compiled, immutable form of a schema
//!
//! A descriptor tree mirrors the nesting of the schema it was compiled from.
//! Trees are plain owned data (no interior mutability), so a compiled schema
//! can sit behind an `Arc` and be validated against from many threads.

use std::fmt;

use regex::Regex;
use serde_json::{Number, Value};

/// Scalar kinds a field can be coerced to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Str,
    Int,
    Bool,
    Float,
    /// Unknown declared type; any non-null value passes through
    Any,
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Str => "str",
            ScalarKind::Int => "int",
            ScalarKind::Bool => "bool",
            ScalarKind::Float => "float",
            ScalarKind::Any => "any",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ScalarKind::Int | ScalarKind::Float)
    }
}

/// A regular expression that must match the whole input
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The pattern as written in the schema
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Constraints on a scalar; only the ones valid for its kind are ever set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub pattern: Option<Pattern>,
    pub max_length: Option<usize>,
    pub ge: Option<Number>,
    pub le: Option<Number>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self == &Constraints::default()
    }
}

/// What happens when a field is missing from the input
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// Leave the field out of the validated document
    Absent,
    /// The input has to provide the field
    MustSupply,
    /// Use this value
    Value(Value),
}

/// One named field of an object
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub descriptor: TypeDescriptor,
    pub optional: bool,
    pub default: DefaultValue,
}

impl FieldDescriptor {
    pub fn is_required(&self) -> bool {
        !self.optional
    }
}

/// An object: ordered named fields
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDescriptor {
    /// Derived scope name, e.g. `nginx_upstreams_item`
    pub scope: String,
    pub fields: Vec<FieldDescriptor>,
}

impl ObjectDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// How to validate and coerce one value
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Scalar {
        kind: ScalarKind,
        constraints: Constraints,
    },
    /// One of a fixed set of literals
    Choice { allowed: Vec<Value> },
    Object(ObjectDescriptor),
    ListOfObject(ObjectDescriptor),
    ListOfString {
        pattern: Option<Pattern>,
        min_items: usize,
    },
    /// Alternatives tried in declaration order; the first clean match wins
    Union { alternatives: Vec<TypeDescriptor> },
}

impl TypeDescriptor {
    /// Short label used in messages and tool output
    pub fn label(&self) -> String {
        match self {
            TypeDescriptor::Scalar { kind, .. } => kind.as_str().to_string(),
            TypeDescriptor::Choice { allowed } => format!("one of {}", literal_list(allowed)),
            TypeDescriptor::Object(_) => "object".to_string(),
            TypeDescriptor::ListOfObject(_) => "list[object]".to_string(),
            TypeDescriptor::ListOfString { .. } => "list[str]".to_string(),
            TypeDescriptor::Union { alternatives } => {
                let labels: Vec<String> = alternatives.iter().map(TypeDescriptor::label).collect();
                format!("union[{}]", labels.join(" | "))
            }
        }
    }
}

/// Render literals as `[a, b, 3]`
pub(crate) fn literal_list(values: &[Value]) -> String {
    let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", items.join(", "))
}
