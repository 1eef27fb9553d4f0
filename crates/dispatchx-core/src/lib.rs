pub mod assertion;
pub mod config;
pub mod context;
pub mod error;
pub mod path;
pub mod principal;
pub mod registry;
pub mod request;
pub mod resource;
pub mod service;

pub use assertion::{Assertion, AuthenticationRequired, CustomAssertion, MatchInput};
pub use config::DispatchConfig;
pub use context::{Binding, RequestContext};
pub use dispatchx_dsa::ServiceId;
pub use error::{ConfigError, DispatchError};
pub use path::{InvalidPath, ResourcePath};
pub use principal::{Anonymous, Principal, PrincipalSource, RequestPrincipal};
pub use registry::{ServiceDefinition, ServiceRegistry};
pub use request::{Method, Request};
pub use resource::{MemoryResourceStore, Resource, ResourceStore, RetrieveError};
pub use service::{Service, ServiceRef, ServiceTree};

/// Collects service definitions and settings before the tree is frozen.
///
/// ## Startup Only
/// Nothing here is consulted per request: `build_tree` validates once and
/// the resulting [`ServiceTree`] is immutable.
pub struct DispatchBuilder {
    pub registry: ServiceRegistry,
    pub config: DispatchConfig,
}

impl Default for DispatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchBuilder {
    pub fn new() -> Self {
        Self {
            registry: ServiceRegistry::new(),
            config: DispatchConfig::default(),
        }
    }

    /// Registers one service definition.
    pub fn service(mut self, definition: ServiceDefinition) -> Self {
        self.registry.register(definition);
        self
    }

    /// Replaces the settings and registers the services the config declares.
    pub fn with_config(mut self, mut config: DispatchConfig) -> Self {
        for definition in config.services.drain(..) {
            self.registry.register(definition);
        }
        self.config = config;
        self
    }

    pub fn with_uri_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.uri_prefixes.push(prefix.into());
        self
    }

    pub fn with_index_files<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.index_files = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_credential_token(mut self, token: impl Into<String>) -> Self {
        self.config.credential_token = Some(token.into());
        self
    }

    /// Splits into the validated tree and the remaining settings.
    pub fn build_tree(self) -> Result<(ServiceTree, DispatchConfig), ConfigError> {
        let tree = self.registry.build()?;
        Ok((tree, self.config))
    }
}
