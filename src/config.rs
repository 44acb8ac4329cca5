//! Configuration for building a synthesizer and parser registry
//!
//! Configuration is read from a TOML file:
//!
//! ```toml
//! invocation = "cdo"
//! options = ["-s", "-f nc4"]
//!
//! [parsers]
//! info = "info-table"
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::emitter::{GlobalOption, Synthesizer, DEFAULT_INVOCATION};
use crate::error::{CdoError, Result};
use crate::report::ParserRegistry;

/// Environment variable that overrides the invocation token
pub const INVOCATION_ENV: &str = "CDO";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Program token that starts every command line
    pub invocation: String,

    /// Global options, each written as it appears on the command line
    pub options: Vec<String>,

    /// Report kind -> parser variant overrides
    pub parsers: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            invocation: DEFAULT_INVOCATION.to_string(),
            options: Vec::new(),
            parsers: HashMap::new(),
        }
    }
}

impl Config {
    /// Load a config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CdoError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.invocation.trim().is_empty() {
            return Err(CdoError::Config("invocation must not be empty".into()));
        }
        Ok(config)
    }

    /// Apply `CDO` from the environment, if set and non-empty
    pub fn with_env_overrides(self) -> Self {
        let value = std::env::var(INVOCATION_ENV).ok();
        self.with_invocation_override(value.as_deref())
    }

    fn with_invocation_override(mut self, value: Option<&str>) -> Self {
        if let Some(invocation) = value.map(str::trim).filter(|v| !v.is_empty()) {
            log::debug!("invocation overridden by {}: {}", INVOCATION_ENV, invocation);
            self.invocation = invocation.to_string();
        }
        self
    }

    pub fn synthesizer(&self) -> Result<Synthesizer> {
        let mut synthesizer = Synthesizer::new(self.invocation.clone());
        for raw in &self.options {
            let option: GlobalOption = raw.parse()?;
            synthesizer = synthesizer.with_option(option);
        }
        Ok(synthesizer)
    }

    /// Default registry with this config's variant overrides applied
    pub fn registry(&self) -> Result<ParserRegistry> {
        let mut registry = ParserRegistry::with_defaults().with_invocation(self.invocation.clone());
        // Sorted so a bad entry always reports the same error
        let mut entries: Vec<_> = self.parsers.iter().collect();
        entries.sort();
        for (kind, variant) in entries {
            registry.use_variant(kind, variant)?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_config() {
        let config = Config::from_toml_str(
            r#"
invocation = "/opt/cdo/bin/cdo"
options = ["-s", "-f nc4", "-P 4"]

[parsers]
sinfo = "info-table"
"#,
        )
        .unwrap();
        assert_eq!(config.invocation, "/opt/cdo/bin/cdo");
        assert_eq!(config.options.len(), 3);
        assert_eq!(config.parsers.get("sinfo"), Some(&"info-table".to_string()));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.invocation, "cdo");
    }

    #[test]
    fn test_empty_invocation_rejected() {
        let err = Config::from_toml_str("invocation = \"  \"").unwrap_err();
        assert!(matches!(err, CdoError::Config(_)));
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = Config::from_toml_str("options = [").unwrap_err();
        assert!(matches!(err, CdoError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "invocation = \"cdo2\"").unwrap();
        writeln!(file, "options = [\"-O\"]").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.invocation, "cdo2");
        assert_eq!(config.options, vec!["-O".to_string()]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, CdoError::Config(_)));
    }

    #[test]
    fn test_invocation_override() {
        let config = Config::default().with_invocation_override(Some("/usr/local/bin/cdo"));
        assert_eq!(config.invocation, "/usr/local/bin/cdo");

        let config = Config::default().with_invocation_override(Some(""));
        assert_eq!(config.invocation, "cdo");

        let config = Config::default().with_invocation_override(None);
        assert_eq!(config.invocation, "cdo");
    }

    #[test]
    fn test_synthesizer_from_options() {
        let config = Config::from_toml_str("options = [\"-s\", \"-f nc4\"]").unwrap();
        let synthesizer = config.synthesizer().unwrap();
        assert_eq!(
            synthesizer.options(),
            &[GlobalOption::Silent, GlobalOption::Format("nc4".into())]
        );
    }

    #[test]
    fn test_synthesizer_rejects_bad_option() {
        let config = Config::from_toml_str("options = [\"-P many\"]").unwrap();
        assert!(matches!(config.synthesizer(), Err(CdoError::Config(_))));
    }

    #[test]
    fn test_registry_applies_variants() {
        let config = Config::from_toml_str("[parsers]\nsinfo = \"info-table\"").unwrap();
        let registry = config.registry().unwrap();
        assert!(registry.supports("sinfo"));
    }

    #[test]
    fn test_registry_unknown_variant() {
        let config = Config::from_toml_str("[parsers]\nsinfo = \"nope\"").unwrap();
        assert!(matches!(config.registry(), Err(CdoError::NotFound { .. })));
    }
}
