//! Schema Repository
//!
//! File-backed lookup of schema documents by name. A schema named `nginx`
//! lives at `<root>/nginx.yaml` (or `.yml` / `.json`, searched in that order).

use std::fs;
use std::path::{Path, PathBuf};

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde_json::Value;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, SchemaError};
use crate::schema::RawSchema;

/// Extensions searched when resolving a schema name
pub const DEFAULT_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Read-only store of schema documents
#[derive(Debug, Clone)]
pub struct SchemaRepository {
    /// Directory holding the schema documents
    root: PathBuf,
    /// File extensions, in lookup order
    extensions: Vec<String>,
}

impl SchemaRepository {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Replace the extension lookup order
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_string())
            .collect();
        self
    }

    /// Get the root path of the repository
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Resolve a schema name to the file backing it
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        if !is_plain_name(name) {
            return None;
        }
        self.extensions
            .iter()
            .map(|ext| self.root.join(format!("{name}.{ext}")))
            .find(|path| path.is_file())
    }

    /// Load a schema document by name.
    ///
    /// Only parses the document; its structure is checked by the compiler.
    pub fn load(&self, name: &str) -> Result<RawSchema> {
        let path = self.locate(name).ok_or_else(|| SchemaError::NotFound {
            name: name.to_string(),
        })?;

        debug!(schema = name, path = %path.display(), "loading schema");
        let content = fs::read_to_string(&path)?;
        let document = parse_document(&path, &content).map_err(|reason| SchemaError::Parse {
            name: name.to_string(),
            reason,
        })?;

        Ok(RawSchema::new(name, document))
    }

    /// Names of all schema documents, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Err(SchemaError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("schema directory {} does not exist", self.root.display()),
            )));
        }

        let mut names: Vec<String> = WalkDir::new(&self.root)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let path = e.path();
                let ext = path.extension()?.to_str()?;
                if !self.extensions.iter().any(|known| known == ext) {
                    return None;
                }
                path.file_stem()?.to_str().map(String::from)
            })
            .filter(|name| is_plain_name(name))
            .collect();

        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Fuzzy search schema names, best match first
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let matcher = SkimMatcherV2::default();
        let mut results: Vec<(i64, String)> = self
            .list()?
            .into_iter()
            .filter_map(|name| matcher.fuzzy_match(&name, query).map(|score| (score, name)))
            .collect();

        results.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        Ok(results.into_iter().take(limit).map(|(_, name)| name).collect())
    }
}

/// Names map straight onto file names, so anything that could walk out of
/// the repository root is rejected.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

fn parse_document(path: &Path, content: &str) -> std::result::Result<Value, String> {
    let is_json = path.extension().map(|ext| ext == "json").unwrap_or(false);
    if is_json {
        serde_json::from_str(content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }
}
