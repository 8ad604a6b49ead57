//! config-forge
//!
//! Schema-driven configuration generation. A schema is a declarative YAML
//! description of a config document; the crate compiles it into a tree of
//! type descriptors, validates arbitrary JSON-like input against that tree,
//! and renders the coerced result under a root key.
//!
//! ## Pipeline
//!
//! ```text
//! SchemaRepository::load(name)      RawSchema        (untyped YAML tree)
//!        │
//! compiler::compile_schema          CompiledSchema   (ObjectDescriptor tree)
//!        │
//! Validator::validate(input)        ValidatedDocument | ValidationReport
//!        │
//! Renderer::render(root_key)        YAML / JSON / TOML text
//! ```
//!
//! [`Forge`] runs the whole pipeline and caches compiled schemas.
//!
//! ## Schema layout
//!
//! ```text
//! data_models/
//! ├── nginx.yaml
//! ├── redis.yaml
//! └── worker.json
//! ```

pub mod checksum;
pub mod compiler;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod forge;
pub mod render;
pub mod repository;
pub mod schema;
pub mod validator;

pub use checksum::Checksum;
pub use compiler::{compile, compile_schema, CompiledSchema};
pub use config::ForgeConfig;
pub use descriptor::{DefaultValue, FieldDescriptor, ObjectDescriptor, ScalarKind, TypeDescriptor};
pub use error::{ForgeError, RenderError, Result, SchemaError};
pub use forge::{Forge, ForgeOptions, GeneratedConfig};
pub use render::{OutputFormat, Renderer};
pub use repository::SchemaRepository;
pub use schema::{FieldSpec, FieldType, RawSchema};
pub use validator::{
    validate, DefaultPolicy, FieldPath, PathSegment, ValidatedDocument, ValidationReport,
    Validator, Violation, ViolationKind,
};
