use core::sync::atomic::{AtomicUsize, Ordering};
use std::collections::{BTreeMap, BTreeSet};

use crate::path::{InvalidPath, ResourcePath};

/// Resource metadata the resolver needs: where it lives, whether it is a
/// collection and its type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    uri: ResourcePath,
    collection: bool,
    resource_type: String,
}

impl Resource {
    pub fn collection(uri: ResourcePath) -> Self {
        Self {
            uri,
            collection: true,
            resource_type: "collection".to_string(),
        }
    }

    pub fn document(uri: ResourcePath) -> Self {
        Self {
            uri,
            collection: false,
            resource_type: "file".to_string(),
        }
    }

    pub fn with_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = resource_type.into();
        self
    }

    pub fn uri(&self) -> &ResourcePath {
        &self.uri
    }

    pub fn is_collection(&self) -> bool {
        self.collection
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetrieveError {
    #[error("resource not found: {0}")]
    NotFound(ResourcePath),
    #[error("resource locked: {0}")]
    Locked(ResourcePath),
    #[error("not authorized to retrieve {path}")]
    Unauthorized { path: ResourcePath },
    #[error("failed to retrieve {path}: {reason}")]
    Failed { path: ResourcePath, reason: String },
}

impl RetrieveError {
    /// Not-found and locked resources are dispatched as "no resource".
    pub fn is_absent(&self) -> bool {
        matches!(self, RetrieveError::NotFound(_) | RetrieveError::Locked(_))
    }
}

/// The external content repository the resolver reads from.
pub trait ResourceStore: Send + Sync {
    fn retrieve(
        &self,
        token: Option<&str>,
        path: &ResourcePath,
        for_processing: bool,
    ) -> Result<Resource, RetrieveError>;

    /// Direct children of the collection at `path`.
    fn list_children(&self, token: Option<&str>, path: &ResourcePath) -> Result<Vec<Resource>, RetrieveError>;
}

/// A map-backed store for tests and demos.
///
/// Tracks how often `retrieve` is called so callers can check that a
/// dispatch fetches its resource exactly once.
#[derive(Debug, Default)]
pub struct MemoryResourceStore {
    resources: BTreeMap<ResourcePath, Resource>,
    locked: BTreeSet<ResourcePath>,
    /// Paths only readable with the given token.
    protected: BTreeMap<ResourcePath, String>,
    retrievals: AtomicUsize,
}

impl MemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource: Resource) {
        self.resources.insert(resource.uri().clone(), resource);
    }

    pub fn with_collection(mut self, path: &str) -> Result<Self, InvalidPath> {
        self.insert(Resource::collection(ResourcePath::parse(path)?));
        Ok(self)
    }

    pub fn with_document(mut self, path: &str) -> Result<Self, InvalidPath> {
        self.insert(Resource::document(ResourcePath::parse(path)?));
        Ok(self)
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.insert(resource);
        self
    }

    pub fn lock(mut self, path: &str) -> Result<Self, InvalidPath> {
        self.locked.insert(ResourcePath::parse(path)?);
        Ok(self)
    }

    pub fn protect(mut self, path: &str, token: impl Into<String>) -> Result<Self, InvalidPath> {
        self.protected.insert(ResourcePath::parse(path)?, token.into());
        Ok(self)
    }

    pub fn retrievals(&self) -> usize {
        self.retrievals.load(Ordering::Acquire)
    }

    fn check_access(&self, token: Option<&str>, path: &ResourcePath) -> Result<(), RetrieveError> {
        match self.protected.get(path) {
            Some(required) if Some(required.as_str()) != token => {
                Err(RetrieveError::Unauthorized { path: path.clone() })
            }
            _ => Ok(()),
        }
    }
}

impl ResourceStore for MemoryResourceStore {
    fn retrieve(
        &self,
        token: Option<&str>,
        path: &ResourcePath,
        _for_processing: bool,
    ) -> Result<Resource, RetrieveError> {
        self.retrievals.fetch_add(1, Ordering::AcqRel);
        self.check_access(token, path)?;
        if self.locked.contains(path) {
            return Err(RetrieveError::Locked(path.clone()));
        }
        self.resources
            .get(path)
            .cloned()
            .ok_or_else(|| RetrieveError::NotFound(path.clone()))
    }

    fn list_children(&self, token: Option<&str>, path: &ResourcePath) -> Result<Vec<Resource>, RetrieveError> {
        self.check_access(token, path)?;
        match self.resources.get(path) {
            None => Err(RetrieveError::NotFound(path.clone())),
            Some(parent) if !parent.is_collection() => Ok(Vec::new()),
            Some(_) => Ok(self
                .resources
                .values()
                .filter(|resource| resource.uri().parent().as_ref() == Some(path))
                .cloned()
                .collect()),
        }
    }
}
