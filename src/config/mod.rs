//! Build and process configuration

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use crate::collection::Collection;

/// Inputs to one schema build.
///
/// A plain value: every build reads its own snapshot, nothing is merged into
/// shared defaults.
#[derive(Clone)]
pub struct AdapterConfig {
    pub collections: Vec<Arc<dyn Collection>>,

    /// Add a raw `where: JSON` argument to every plural query field
    pub expose_query_language: bool,
}

impl AdapterConfig {
    pub fn new(collections: Vec<Arc<dyn Collection>>) -> Self {
        Self {
            collections,
            expose_query_language: false,
        }
    }

    pub fn expose_query_language(mut self, expose: bool) -> Self {
        self.expose_query_language = expose;
        self
    }
}

impl fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let identities: Vec<&str> = self.collections.iter().map(|c| c.identity()).collect();
        f.debug_struct("AdapterConfig")
            .field("collections", &identities)
            .field("expose_query_language", &self.expose_query_language)
            .finish()
    }
}

/// Log output format for the binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Process settings loaded from environment variables
#[derive(Debug, Clone)]
pub struct Settings {
    /// Collection definition file (YAML or JSON)
    pub collections_path: PathBuf,

    pub expose_query_language: bool,

    pub log_format: LogFormat,
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let expose_query_language = match lookup("EXPOSE_QUERY_LANGUAGE") {
            Some(value) => parse_bool(&value).context("Invalid EXPOSE_QUERY_LANGUAGE")?,
            None => false,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("Invalid LOG_FORMAT `{}` (expected `json` or `pretty`)", other),
        };

        Ok(Self {
            collections_path: lookup("COLLECTIONS_PATH")
                .unwrap_or_else(|| "./collections.yaml".to_string())
                .into(),
            expose_query_language,
            log_format,
        })
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        other => bail!("expected a boolean, found `{}`", other),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::collection::MemoryCollection;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[]).unwrap();
        assert_eq!(settings.collections_path, PathBuf::from("./collections.yaml"));
        assert!(!settings.expose_query_language);
        assert_eq!(settings.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides() {
        let settings = settings(&[
            ("COLLECTIONS_PATH", "/etc/models.json"),
            ("EXPOSE_QUERY_LANGUAGE", "1"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(settings.collections_path, PathBuf::from("/etc/models.json"));
        assert!(settings.expose_query_language);
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values() {
        assert!(settings(&[("EXPOSE_QUERY_LANGUAGE", "yes please")]).is_err());
        assert!(settings(&[("LOG_FORMAT", "xml")]).is_err());
    }

    #[test]
    fn test_adapter_config_debug_lists_identities() {
        let config = AdapterConfig::new(vec![Arc::new(MemoryCollection::new("user"))])
            .expose_query_language(true);
        assert_eq!(
            format!("{:?}", config),
            r#"AdapterConfig { collections: ["user"], expose_query_language: true }"#
        );
    }
}
