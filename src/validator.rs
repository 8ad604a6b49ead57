//! Validation and coercion of input data against compiled descriptors
//!
//! The validator walks a descriptor tree alongside an untyped input value
//! (as parsed from a JSON request body) and either produces a coerced
//! [`ValidatedDocument`] or a [`ValidationReport`] listing every violation
//! it found. It never stops at the first problem.
//!
//! Coercion rules:
//!
//! - `str` takes strings only; numbers are never stringified
//! - `int` takes integers and whole-number floats (`8080.0` → `8080`)
//! - `float` takes any number
//! - `bool` takes booleans only
//! - `any` takes any non-null value unchanged
//!
//! `null` is treated the same as a missing key.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::descriptor::{
    literal_list, Constraints, DefaultValue, FieldDescriptor, ObjectDescriptor, Pattern,
    ScalarKind, TypeDescriptor,
};

/// One step in a path from the document root
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Location of a value inside the input, e.g. `servers[0].port`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.to_string()));
        Self(segments)
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for FieldPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(root)");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{key}")?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// Why a value was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    MissingRequired,
    TypeMismatch,
    PatternMismatch,
    OutOfRange,
    TooLong,
    TooShort,
    NotInChoices,
    UnionExhausted,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::MissingRequired => "missing_required",
            ViolationKind::TypeMismatch => "type_mismatch",
            ViolationKind::PatternMismatch => "pattern_mismatch",
            ViolationKind::OutOfRange => "out_of_range",
            ViolationKind::TooLong => "too_long",
            ViolationKind::TooShort => "too_short",
            ViolationKind::NotInChoices => "not_in_choices",
            ViolationKind::UnionExhausted => "union_exhausted",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single way the input fails its descriptor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub path: FieldPath,
    pub reason: ViolationKind,
    pub message: String,
    /// For `union_exhausted`: what each alternative objected to
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<Violation>,
}

impl Violation {
    fn new(path: &FieldPath, reason: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            path: path.clone(),
            reason,
            message: message.into(),
            details: Vec::new(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.path, self.message, self.reason)
    }
}

/// Every violation found in one validation pass, in document order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }

    /// Violations recorded at exactly this path
    pub fn at(&self, path: &FieldPath) -> Vec<&Violation> {
        self.violations.iter().filter(|v| &v.path == path).collect()
    }

    /// Reason tags in report order
    pub fn reasons(&self) -> Vec<ViolationKind> {
        self.violations.iter().map(|v| v.reason).collect()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed with {} violation(s)", self.violations.len())?;
        for violation in &self.violations {
            write!(f, "\n  {violation}")?;
            for detail in &violation.details {
                write!(f, "\n    └─ {detail}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

/// Coerced input, ready to be serialized
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidatedDocument(Map<String, Value>);

impl ValidatedDocument {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

static NULL: Value = Value::Null;

impl std::ops::Index<&str> for ValidatedDocument {
    type Output = Value;

    /// Missing keys index to `null`, like `serde_json::Value`
    fn index(&self, key: &str) -> &Value {
        self.0.get(key).unwrap_or(&NULL)
    }
}

/// What to do with declared defaults of fields the input leaves out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultPolicy {
    /// Write the declared default into the document
    Materialize,
    /// Only fields present in the input appear in the document
    #[default]
    ExcludeUnset,
}

/// Validate input against a root object using [`DefaultPolicy::ExcludeUnset`]
pub fn validate(root: &ObjectDescriptor, input: &Value) -> Result<ValidatedDocument, ValidationReport> {
    Validator::default().validate(root, input)
}

/// Stateless validator; cheap to construct and share
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    policy: DefaultPolicy,
}

impl Validator {
    pub fn with_policy(policy: DefaultPolicy) -> Self {
        Self { policy }
    }

    pub fn validate(
        &self,
        root: &ObjectDescriptor,
        input: &Value,
    ) -> Result<ValidatedDocument, ValidationReport> {
        let mut violations = Vec::new();
        let value = self.check_object(root, input, &FieldPath::root(), &mut violations);

        match value {
            Some(Value::Object(map)) if violations.is_empty() => Ok(ValidatedDocument(map)),
            _ => Err(ValidationReport { violations }),
        }
    }

    /// Check one value. Returns the coerced value, or `None` when the value
    /// itself is unusable; violations below it are pushed onto `out`.
    fn check(
        &self,
        descriptor: &TypeDescriptor,
        value: &Value,
        path: &FieldPath,
        out: &mut Vec<Violation>,
    ) -> Option<Value> {
        match descriptor {
            TypeDescriptor::Scalar { kind, constraints } => {
                check_scalar(*kind, constraints, value, path, out)
            }
            TypeDescriptor::Choice { allowed } => check_choice(allowed, value, path, out),
            TypeDescriptor::Object(object) => self.check_object(object, value, path, out),
            TypeDescriptor::ListOfObject(item) => self.check_object_list(item, value, path, out),
            TypeDescriptor::ListOfString { pattern, min_items } => {
                check_string_list(pattern.as_ref(), *min_items, value, path, out)
            }
            TypeDescriptor::Union { alternatives } => self.check_union(alternatives, value, path, out),
        }
    }

    fn check_object(
        &self,
        object: &ObjectDescriptor,
        value: &Value,
        path: &FieldPath,
        out: &mut Vec<Violation>,
    ) -> Option<Value> {
        let Some(input) = value.as_object() else {
            out.push(type_mismatch(path, "object", value));
            return None;
        };

        let mut document = Map::new();
        for field in &object.fields {
            let field_path = path.key(&field.name);
            let supplied = input.get(&field.name).filter(|v| !v.is_null());

            let checked = match supplied {
                Some(v) => self.check(&field.descriptor, v, &field_path, out),
                None => self.fill_default(field, &field_path, out),
            };
            if let Some(v) = checked {
                document.insert(field.name.clone(), v);
            }
        }

        Some(Value::Object(document))
    }

    fn fill_default(
        &self,
        field: &FieldDescriptor,
        path: &FieldPath,
        out: &mut Vec<Violation>,
    ) -> Option<Value> {
        match &field.default {
            DefaultValue::MustSupply => {
                out.push(Violation::new(path, ViolationKind::MissingRequired, "field required"));
                None
            }
            DefaultValue::Absent => None,
            DefaultValue::Value(_) if self.policy == DefaultPolicy::ExcludeUnset => None,
            // Defaults go through the same checks as input so the document
            // re-validates to itself.
            DefaultValue::Value(default) => self.check(&field.descriptor, default, path, out),
        }
    }

    fn check_object_list(
        &self,
        item: &ObjectDescriptor,
        value: &Value,
        path: &FieldPath,
        out: &mut Vec<Violation>,
    ) -> Option<Value> {
        let Some(items) = value.as_array() else {
            out.push(type_mismatch(path, "list", value));
            return None;
        };

        let mut checked = Vec::with_capacity(items.len());
        let mut complete = true;
        for (i, element) in items.iter().enumerate() {
            match self.check_object(item, element, &path.index(i), out) {
                Some(v) => checked.push(v),
                None => complete = false,
            }
        }

        complete.then(|| Value::Array(checked))
    }

    fn check_union(
        &self,
        alternatives: &[TypeDescriptor],
        value: &Value,
        path: &FieldPath,
        out: &mut Vec<Violation>,
    ) -> Option<Value> {
        let mut rejected = Vec::new();
        for alternative in alternatives {
            let mut trial = Vec::new();
            let checked = self.check(alternative, value, path, &mut trial);
            if trial.is_empty() {
                if let Some(v) = checked {
                    return Some(v);
                }
            }
            rejected.extend(trial);
        }

        let labels: Vec<String> = alternatives.iter().map(TypeDescriptor::label).collect();
        let mut violation = Violation::new(
            path,
            ViolationKind::UnionExhausted,
            format!("value matches none of: {}", labels.join(", ")),
        );
        violation.details = rejected;
        out.push(violation);
        None
    }
}

fn check_scalar(
    kind: ScalarKind,
    constraints: &Constraints,
    value: &Value,
    path: &FieldPath,
    out: &mut Vec<Violation>,
) -> Option<Value> {
    let Some(coerced) = coerce(kind, value) else {
        out.push(type_mismatch(path, kind.as_str(), value));
        return None;
    };

    let before = out.len();

    if let Value::String(s) = &coerced {
        if let Some(pattern) = &constraints.pattern {
            if !pattern.is_match(s) {
                out.push(Violation::new(
                    path,
                    ViolationKind::PatternMismatch,
                    format!("does not match pattern '{pattern}'"),
                ));
            }
        }
        if let Some(max) = constraints.max_length {
            let len = s.chars().count();
            if len > max {
                out.push(Violation::new(
                    path,
                    ViolationKind::TooLong,
                    format!("length {len} exceeds maximum of {max}"),
                ));
            }
        }
    }

    if let Value::Number(n) = &coerced {
        if let Some(ge) = &constraints.ge {
            if compare_numbers(n, ge) == Some(Ordering::Less) {
                out.push(Violation::new(
                    path,
                    ViolationKind::OutOfRange,
                    format!("{coerced} is less than minimum {ge}"),
                ));
            }
        }
        if let Some(le) = &constraints.le {
            if compare_numbers(n, le) == Some(Ordering::Greater) {
                out.push(Violation::new(
                    path,
                    ViolationKind::OutOfRange,
                    format!("{coerced} is greater than maximum {le}"),
                ));
            }
        }
    }

    (out.len() == before).then_some(coerced)
}

fn coerce(kind: ScalarKind, value: &Value) -> Option<Value> {
    match (kind, value) {
        (_, Value::Null) => None,
        (ScalarKind::Any, v) => Some(v.clone()),
        (ScalarKind::Str, Value::String(_)) => Some(value.clone()),
        (ScalarKind::Bool, Value::Bool(_)) => Some(value.clone()),
        (ScalarKind::Int, Value::Number(n)) => coerce_int(n),
        (ScalarKind::Float, Value::Number(n)) => n.as_f64().and_then(Number::from_f64).map(Value::Number),
        _ => None,
    }
}

fn coerce_int(n: &Number) -> Option<Value> {
    if n.is_i64() || n.is_u64() {
        return Some(Value::Number(n.clone()));
    }
    let f = n.as_f64()?;
    if !f.is_finite() || f.fract() != 0.0 {
        return None;
    }
    // `i64::MAX as f64` and `u64::MAX as f64` round up to 2^63 and 2^64.
    if f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(Value::from(f as i64))
    } else if f >= 0.0 && f < u64::MAX as f64 {
        Some(Value::from(f as u64))
    } else {
        None
    }
}

/// Order two numbers, exactly whenever both are whole
fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    match (whole_number(a), whole_number(b)) {
        (Some(x), Some(y)) => Some(x.cmp(&y)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

fn whole_number(n: &Number) -> Option<i128> {
    if let Some(i) = n.as_i64() {
        return Some(i.into());
    }
    if let Some(u) = n.as_u64() {
        return Some(u.into());
    }
    let f = n.as_f64()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i128::MAX as f64).then(|| f as i128)
}

fn check_choice(allowed: &[Value], value: &Value, path: &FieldPath, out: &mut Vec<Violation>) -> Option<Value> {
    match allowed.iter().find(|literal| literal_eq(literal, value)) {
        Some(literal) => Some(literal.clone()),
        None => {
            out.push(Violation::new(
                path,
                ViolationKind::NotInChoices,
                format!("{value} is not one of {}", literal_list(allowed)),
            ));
            None
        }
    }
}

/// Literal equality; numbers compare by value so `8080` matches `8080.0`
fn literal_eq(literal: &Value, value: &Value) -> bool {
    match (literal, value) {
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b) == Some(Ordering::Equal),
        _ => literal == value,
    }
}

fn check_string_list(
    pattern: Option<&Pattern>,
    min_items: usize,
    value: &Value,
    path: &FieldPath,
    out: &mut Vec<Violation>,
) -> Option<Value> {
    let Some(items) = value.as_array() else {
        out.push(type_mismatch(path, "list", value));
        return None;
    };

    let before = out.len();

    if items.len() < min_items {
        out.push(Violation::new(
            path,
            ViolationKind::TooShort,
            format!("expected at least {min_items} item(s), got {}", items.len()),
        ));
    }

    for (i, item) in items.iter().enumerate() {
        let item_path = path.index(i);
        match item.as_str() {
            None => out.push(type_mismatch(&item_path, "str", item)),
            Some(s) => {
                if let Some(pattern) = pattern {
                    if !pattern.is_match(s) {
                        out.push(Violation::new(
                            &item_path,
                            ViolationKind::PatternMismatch,
                            format!("does not match pattern '{pattern}'"),
                        ));
                    }
                }
            }
        }
    }

    (out.len() == before).then(|| value.clone())
}

fn type_mismatch(path: &FieldPath, expected: &str, value: &Value) -> Violation {
    Violation::new(
        path,
        ViolationKind::TypeMismatch,
        format!("expected {expected}, got {}", json_type(value)),
    )
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
