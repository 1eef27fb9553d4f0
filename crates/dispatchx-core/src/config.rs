use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;
use crate::registry::{ServiceDefinition, ServiceRegistry};

/// Startup configuration, usually read from a TOML file:
///
/// ```toml
/// uri_prefixes = ["/site"]
/// index_files = ["index.html"]
///
/// [[services]]
/// name = "root"
///
/// [[services]]
/// name = "admin"
/// parent = "root"
/// assertions = [{ kind = "parameter_present", name = "admin" }]
/// ```
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DispatchConfig {
    /// Leading path prefixes stripped before resolution.
    pub uri_prefixes: Vec<String>,
    /// Candidate index file names, in preference order. Empty disables
    /// index file detection.
    pub index_files: Vec<String>,
    /// Token used for the resolver's own resource retrieval.
    pub credential_token: Option<String>,
    pub services: Vec<ServiceDefinition>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            uri_prefixes: Vec::new(),
            index_files: vec![
                "index.html".to_string(),
                "index.htm".to_string(),
                "index.xml".to_string(),
            ],
            credential_token: None,
            services: Vec::new(),
        }
    }
}

impl DispatchConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        tracing::info!("DispatchConfig: loading {}", path.as_ref().display());
        Self::from_toml_str(&source)
    }

    /// Moves the declared services into a fresh registry.
    pub fn take_registry(&mut self) -> ServiceRegistry {
        self.services
            .drain(..)
            .fold(ServiceRegistry::new(), ServiceRegistry::with)
    }
}
