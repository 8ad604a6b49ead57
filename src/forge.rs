//! Config generation pipeline
//!
//! [`Forge`] runs load → compile → validate → render for a named schema.
//! It is what an HTTP handler calls; mapping [`ForgeError`] variants onto
//! status codes is left to the caller.
//!
//! Compiled schemas are cached by name. Every call still reads the schema
//! document, and a cached entry is only reused while the document's
//! checksum is unchanged, so edits on disk are picked up without a restart.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::compiler::{compile_schema, CompiledSchema};
use crate::error::{ForgeError, SchemaError};
use crate::render::{OutputFormat, Renderer};
use crate::repository::SchemaRepository;
use crate::validator::{DefaultPolicy, ValidatedDocument, Validator};

/// Pipeline options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForgeOptions {
    pub default_policy: DefaultPolicy,
    pub output_format: OutputFormat,
    pub cache_compiled: bool,
}

impl Default for ForgeOptions {
    fn default() -> Self {
        Self {
            default_policy: DefaultPolicy::ExcludeUnset,
            output_format: OutputFormat::Yaml,
            cache_compiled: true,
        }
    }
}

/// Result of a successful generation
#[derive(Debug, Clone)]
pub struct GeneratedConfig {
    /// Schema the input was validated against
    pub schema: String,
    /// Key the document was wrapped under
    pub root_key: String,
    pub document: ValidatedDocument,
    pub format: OutputFormat,
    /// Rendered config text
    pub text: String,
}

/// Schema-driven config generator
pub struct Forge {
    repository: SchemaRepository,
    options: ForgeOptions,
    cache: RwLock<HashMap<String, Arc<CompiledSchema>>>,
}

impl Forge {
    pub fn new(repository: SchemaRepository, options: ForgeOptions) -> Self {
        Self {
            repository,
            options,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn repository(&self) -> &SchemaRepository {
        &self.repository
    }

    pub fn options(&self) -> &ForgeOptions {
        &self.options
    }

    /// Load and compile a schema, reusing a cached compilation when the
    /// document has not changed
    pub fn compiled(&self, name: &str) -> Result<Arc<CompiledSchema>, SchemaError> {
        let raw = self.repository.load(name)?;

        if !self.options.cache_compiled {
            return Ok(Arc::new(compile_schema(&raw)?));
        }

        let checksum = raw.checksum();
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(hit) = cache.get(name).filter(|c| c.checksum == checksum) {
                debug!(schema = name, "compiled schema cache hit");
                return Ok(Arc::clone(hit));
            }
        }

        let compiled = Arc::new(compile_schema(&raw)?);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Arc::clone(&compiled));
        debug!(schema = name, checksum = checksum.short(), "compiled schema cached");

        Ok(compiled)
    }

    /// Number of cached compilations
    pub fn cached(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn clear_cache(&self) {
        self.cache.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Validate input against a named schema
    pub fn validate(&self, name: &str, input: &Value) -> Result<ValidatedDocument, ForgeError> {
        let compiled = self.compiled(name)?;
        self.check(&compiled, input)
    }

    /// Validate input and render it with the configured output format
    pub fn generate(&self, name: &str, input: &Value) -> Result<GeneratedConfig, ForgeError> {
        self.generate_as(name, input, self.options.output_format)
    }

    /// Validate input and render it in the given format
    pub fn generate_as(
        &self,
        name: &str,
        input: &Value,
        format: OutputFormat,
    ) -> Result<GeneratedConfig, ForgeError> {
        let compiled = self.compiled(name)?;
        let document = self.check(&compiled, input)?;

        let text = Renderer::new(format).render(&compiled.root_key, &document)?;
        info!(schema = name, root_key = %compiled.root_key, %format, "generated config");

        Ok(GeneratedConfig {
            schema: compiled.name.clone(),
            root_key: compiled.root_key.clone(),
            document,
            format,
            text,
        })
    }

    fn check(&self, compiled: &CompiledSchema, input: &Value) -> Result<ValidatedDocument, ForgeError> {
        Validator::with_policy(self.options.default_policy)
            .validate(&compiled.root, input)
            .map_err(|report| {
                warn!(schema = %compiled.name, violations = report.len(), "input rejected");
                ForgeError::Validation(report)
            })
    }
}
