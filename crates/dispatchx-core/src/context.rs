use core::fmt;
use dispatchx_dsa::ServiceId;
use std::sync::Arc;

use crate::path::ResourcePath;
use crate::principal::Principal;
use crate::request::Request;
use crate::resource::Resource;
use crate::service::{ServiceRef, ServiceTree};

/// The service-independent half of a request context.
///
/// Computed once per request and shared by every provisional context the
/// resolver creates while walking the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    resource: Option<Resource>,
    resource_uri: ResourcePath,
    current_collection: ResourcePath,
    index_file_uri: Option<ResourcePath>,
    is_index_file: bool,
}

impl Binding {
    /// The current collection is the resource itself when it is a
    /// collection, otherwise its parent.
    pub fn new(resource_uri: ResourcePath, resource: Option<Resource>) -> Self {
        let current_collection = match &resource {
            Some(resource) if resource.is_collection() => resource_uri.clone(),
            _ => resource_uri.parent().unwrap_or_else(ResourcePath::root),
        };
        Self {
            resource,
            resource_uri,
            current_collection,
            index_file_uri: None,
            is_index_file: false,
        }
    }

    pub fn with_index_file(mut self, index_file_uri: ResourcePath, is_index_file: bool) -> Self {
        self.index_file_uri = Some(index_file_uri);
        self.is_index_file = is_index_file;
        self
    }

    pub fn resource(&self) -> Option<&Resource> {
        self.resource.as_ref()
    }

    pub fn resource_uri(&self) -> &ResourcePath {
        &self.resource_uri
    }

    pub fn current_collection(&self) -> &ResourcePath {
        &self.current_collection
    }

    pub fn index_file_uri(&self) -> Option<&ResourcePath> {
        self.index_file_uri.as_ref()
    }

    pub fn is_index_file(&self) -> bool {
        self.is_index_file
    }
}

/// Everything downstream handlers learn about a resolved request.
///
/// Immutable once built; cloning is a handful of `Arc` bumps.
#[derive(Clone)]
pub struct RequestContext {
    request: Arc<Request>,
    tree: Arc<ServiceTree>,
    service: ServiceId,
    binding: Arc<Binding>,
    principal: Option<Arc<Principal>>,
}

impl RequestContext {
    pub fn new(
        request: Arc<Request>,
        tree: Arc<ServiceTree>,
        service: ServiceId,
        binding: Arc<Binding>,
        principal: Option<Arc<Principal>>,
    ) -> Self {
        Self {
            request,
            tree,
            service,
            binding,
            principal,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn service(&self) -> ServiceRef<'_> {
        self.tree.service(self.service)
    }

    pub fn service_id(&self) -> ServiceId {
        self.service
    }

    pub fn tree(&self) -> &Arc<ServiceTree> {
        &self.tree
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn resource(&self) -> Option<&Resource> {
        self.binding.resource()
    }

    pub fn resource_uri(&self) -> &ResourcePath {
        self.binding.resource_uri()
    }

    pub fn current_collection(&self) -> &ResourcePath {
        self.binding.current_collection()
    }

    pub fn index_file_uri(&self) -> Option<&ResourcePath> {
        self.binding.index_file_uri()
    }

    pub fn is_index_file(&self) -> bool {
        self.binding.is_index_file()
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_deref()
    }

    /// Returns `true` if the resolved service is `name` or one of its
    /// descendants.
    pub fn is_within(&self, name: &str) -> bool {
        match self.tree.find(name) {
            Some(ancestor) => self.tree.is_descendant_of(self.service, ancestor.id()),
            None => false,
        }
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", &self.request.method())
            .field("service", &self.service().name())
            .field("resource_uri", self.binding.resource_uri())
            .field("current_collection", self.binding.current_collection())
            .field("index_file_uri", &self.binding.index_file_uri())
            .field("is_index_file", &self.binding.is_index_file())
            .finish()
    }
}
