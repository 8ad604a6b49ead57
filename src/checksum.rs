//! Content digests for schema documents
//!
//! Compiled schemas remember the digest of the document they were built
//! from, so a cached descriptor tree can be told apart from a stale one.

use sha2::{Digest, Sha256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SHA256 checksum of schema content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Compute checksum from a JSON value (key order as parsed)
    pub fn from_json(value: &serde_json::Value) -> Self {
        let canonical = serde_json::to_string(value).unwrap_or_default();
        Self::from_bytes(canonical.as_bytes())
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_checksum_consistency() {
        let doc = json!({ "fields": { "name": { "type": "str" } } });
        assert_eq!(Checksum::from_json(&doc), Checksum::from_json(&doc.clone()));
    }

    #[test]
    fn test_checksum_different_content() {
        let a = json!({ "fields": { "name": { "type": "str" } } });
        let b = json!({ "fields": { "name": { "type": "int" } } });
        assert_ne!(Checksum::from_json(&a), Checksum::from_json(&b));
    }

    #[test]
    fn test_checksum_short_prefix() {
        let checksum = Checksum::from_json(&json!({ "root_key": "app" }));
        assert_eq!(checksum.as_str().len(), 64);
        assert_eq!(checksum.short().len(), 12);
        assert!(checksum.as_str().starts_with(checksum.short()));
    }
}
