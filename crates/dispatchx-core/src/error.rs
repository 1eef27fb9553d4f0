use dispatchx_dsa::ForestError;
use std::sync::Arc;

use crate::assertion::AuthenticationRequired;
use crate::context::RequestContext;
use crate::path::InvalidPath;
use crate::request::Request;
use crate::resource::RetrieveError;

/// Startup errors. None of them are recoverable: the process must not start
/// with an invalid service tree.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no root services configured")]
    EmptyRootList,
    #[error("duplicate service definition '{0}'")]
    DuplicateService(String),
    #[error("service '{referenced_by}' references unknown service '{name}'")]
    UnknownService { name: String, referenced_by: String },
    #[error("service '{child}' already has parent '{existing}', cannot also be a child of '{requested}'")]
    AmbiguousParent {
        child: String,
        existing: String,
        requested: String,
    },
    #[error("service '{0}' cannot be its own parent")]
    SelfParent(String),
    #[error("service '{0}' is part of a parent cycle")]
    CyclicParent(String),
    #[error(
        "assertion '{assertion}' on service '{service}' conflicts with '{ancestor_assertion}' on ancestor '{ancestor}' (chain: {chain})",
        chain = .chain.join(" -> ")
    )]
    AssertionConflict {
        service: String,
        assertion: String,
        ancestor: String,
        ancestor_assertion: String,
        chain: Vec<String>,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ForestError> for ConfigError {
    fn from(e: ForestError) -> Self {
        match e {
            ForestError::EmptyForest => ConfigError::EmptyRootList,
            ForestError::AmbiguousParent {
                child,
                existing,
                requested,
            } => ConfigError::AmbiguousParent {
                child,
                existing,
                requested,
            },
            ForestError::SelfParent { name } => ConfigError::SelfParent(name),
            ForestError::Unreachable { name } => ConfigError::CyclicParent(name),
        }
    }
}

/// Per-request errors. They never affect the shared tree or other requests.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no service mapped for {} {}", .request.method(), .request.path())]
    Unmapped { request: Box<Request> },
    /// An assertion challenged the request. `context` is the provisional
    /// context of the service that raised it, still bound in the store.
    #[error("service '{service}' challenged the request: {challenge}", service = .context.service().name())]
    Unauthenticated {
        context: Arc<RequestContext>,
        challenge: AuthenticationRequired,
    },
    #[error("resource retrieval failed: {0}")]
    Retrieval(#[from] RetrieveError),
    #[error(transparent)]
    InvalidPath(#[from] InvalidPath),
}

impl DispatchError {
    pub fn is_unmapped(&self) -> bool {
        matches!(self, DispatchError::Unmapped { .. })
    }

    /// The partial context carried by an authentication challenge.
    pub fn context(&self) -> Option<&Arc<RequestContext>> {
        match self {
            DispatchError::Unauthenticated { context, .. } => Some(context),
            _ => None,
        }
    }
}
