//! Config rendering
//!
//! Wraps a validated document under its root key and writes it out as text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RenderError;
use crate::validator::ValidatedDocument;

/// Output format for generated configs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
    Toml,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
            OutputFormat::Toml => "toml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            "toml" => Ok(OutputFormat::Toml),
            other => Err(format!("unknown output format '{other}' (expected yaml, json or toml)")),
        }
    }
}

/// Renders validated documents in one output format
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    format: OutputFormat,
}

impl Renderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// `{root_key: document}`
    pub fn wrap(root_key: &str, document: &ValidatedDocument) -> Value {
        let mut root = Map::new();
        root.insert(root_key.to_string(), document.to_value());
        Value::Object(root)
    }

    pub fn render(&self, root_key: &str, document: &ValidatedDocument) -> Result<String, RenderError> {
        let wrapped = Self::wrap(root_key, document);
        let text = match self.format {
            OutputFormat::Yaml => serde_yaml::to_string(&wrapped)?,
            OutputFormat::Json => {
                let mut text = serde_json::to_string_pretty(&wrapped)?;
                text.push('\n');
                text
            }
            OutputFormat::Toml => toml::to_string_pretty(&wrapped)?,
        };
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::validator::validate;
    use serde_json::json;

    fn document() -> ValidatedDocument {
        let root = compile(
            "nginx",
            &json!({
                "server_name": { "type": "str" },
                "listen": { "type": "int" },
                "locations": { "type": "list[str]" }
            }),
        )
        .unwrap();
        validate(&root, &json!({ "server_name": "example.com", "listen": 80, "locations": ["/", "/api"] })).unwrap()
    }

    #[test]
    fn test_yaml_keeps_field_order() {
        let text = Renderer::new(OutputFormat::Yaml).render("nginx", &document()).unwrap();
        assert!(text.starts_with("nginx:\n  server_name: example.com\n  listen: 80\n  locations:\n"));

        let parsed: Value = serde_yaml::from_str(&text).unwrap();
        assert_eq!(parsed["nginx"]["locations"], json!(["/", "/api"]));
    }

    #[test]
    fn test_json_output() {
        let text = Renderer::new(OutputFormat::Json).render("nginx", &document()).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["nginx"]["listen"], json!(80));
    }

    #[test]
    fn test_toml_output() {
        let text = Renderer::new(OutputFormat::Toml).render("nginx", &document()).unwrap();
        assert!(text.contains("[nginx]"));
        assert!(text.contains("listen = 80"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("YML".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert_eq!("toml".parse::<OutputFormat>().unwrap(), OutputFormat::Toml);
        assert!("ini".parse::<OutputFormat>().is_err());
    }
}
