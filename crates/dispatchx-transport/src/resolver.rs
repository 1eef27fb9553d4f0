use dispatchx_core::{
    Binding, DispatchConfig, DispatchError, MatchInput, Principal, PrincipalSource, Request, RequestContext,
    RequestPrincipal, Resource, ResourcePath, ResourceStore, ServiceId, ServiceTree,
};
use std::sync::Arc;

use crate::index::IndexFileResolver;
use crate::normalize::PathNormalizer;
use crate::store::RequestContextStore;

/// Maps requests onto the service tree.
///
/// ## Walk
/// Roots and siblings are tried in their sorted order. A service applies when
/// all of its own assertions match; the walk then descends and the first
/// child that resolves wins. A service with no resolving child is itself the
/// match. The first root to produce a match ends the walk.
///
/// ## Challenges
/// An assertion raising `AuthenticationRequired` ends the walk at once. No
/// sibling or later root is tried. The provisional context of the service
/// that raised it stays bound and travels with the error.
pub struct Resolver {
    tree: Arc<ServiceTree>,
    store: Arc<dyn ResourceStore>,
    principals: Arc<dyn PrincipalSource>,
    index_files: Option<IndexFileResolver>,
    normalizer: PathNormalizer,
    credential_token: Option<String>,
}

static_assertions::assert_impl_all!(Resolver: Send, Sync);

/// Per-request state shared by every provisional context of one walk.
struct Walk<'a> {
    tree: &'a Arc<ServiceTree>,
    request: Arc<Request>,
    binding: Arc<Binding>,
    principal: Option<Arc<Principal>>,
}

impl Walk<'_> {
    fn context_for(&self, id: ServiceId) -> Arc<RequestContext> {
        Arc::new(RequestContext::new(
            Arc::clone(&self.request),
            Arc::clone(self.tree),
            id,
            Arc::clone(&self.binding),
            self.principal.clone(),
        ))
    }

    fn input(&self) -> MatchInput<'_> {
        MatchInput {
            request: self.request.as_ref(),
            path: self.binding.resource_uri(),
            resource: self.binding.resource(),
            principal: self.principal.as_deref(),
        }
    }
}

impl Resolver {
    pub fn new(tree: Arc<ServiceTree>, store: Arc<dyn ResourceStore>) -> Self {
        Self {
            tree,
            store,
            principals: Arc::new(RequestPrincipal),
            index_files: None,
            normalizer: PathNormalizer::default(),
            credential_token: None,
        }
    }

    /// Applies prefixes, index file names and the credential token from
    /// `config`. Its `services` are ignored; the tree is already built.
    pub fn from_config(tree: Arc<ServiceTree>, store: Arc<dyn ResourceStore>, config: &DispatchConfig) -> Self {
        let mut resolver = Self::new(tree, store).with_normalizer(PathNormalizer::new(&config.uri_prefixes));
        if !config.index_files.is_empty() {
            resolver = resolver.with_index_files(IndexFileResolver::new(config.index_files.iter().cloned()));
        }
        if let Some(token) = &config.credential_token {
            resolver = resolver.with_credential_token(token.clone());
        }
        resolver
    }

    pub fn with_principals(mut self, principals: Arc<dyn PrincipalSource>) -> Self {
        self.principals = principals;
        self
    }

    pub fn with_index_files(mut self, index_files: IndexFileResolver) -> Self {
        self.index_files = Some(index_files);
        self
    }

    pub fn with_normalizer(mut self, normalizer: PathNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_credential_token(mut self, token: impl Into<String>) -> Self {
        self.credential_token = Some(token.into());
        self
    }

    pub fn tree(&self) -> &Arc<ServiceTree> {
        &self.tree
    }

    /// Resolves `request` and binds the resulting context in the
    /// [`RequestContextStore`].
    ///
    /// The resource is fetched once, before the walk, and reused for every
    /// assertion. Any binding left over from an earlier request is dropped
    /// first, so an `InvalidPath`, `Retrieval` or `Unmapped` failure leaves
    /// the store empty.
    pub fn resolve(&self, request: &Request) -> Result<Arc<RequestContext>, DispatchError> {
        RequestContextStore::clear();
        let uri = self.normalizer.normalize(request.path())?;
        let resource = self.retrieve(&uri)?;
        let binding = self.bind_resource(uri, resource)?;

        let walk = Walk {
            tree: &self.tree,
            request: Arc::new(request.clone()),
            binding: Arc::new(binding),
            principal: self.principals.principal(request).map(Arc::new),
        };

        for &root in self.tree.roots() {
            if let Some(context) = self.resolve_service(&walk, root)? {
                tracing::debug!(
                    "Resolver: {} {} -> '{}'",
                    request.method(),
                    context.resource_uri(),
                    context.service().name()
                );
                return Ok(context);
            }
        }

        RequestContextStore::clear();
        tracing::debug!("Resolver: no service mapped for {} {}", request.method(), request.path());
        Err(DispatchError::Unmapped {
            request: Box::new(request.clone()),
        })
    }

    fn resolve_service(&self, walk: &Walk<'_>, id: ServiceId) -> Result<Option<Arc<RequestContext>>, DispatchError> {
        let context = walk.context_for(id);
        RequestContextStore::bind(Arc::clone(&context));

        let service = self.tree.service(id);
        let input = walk.input();
        for assertion in service.assertions() {
            match assertion.matches(&input) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::trace!("Resolver: '{}' rejected by {}", service.name(), assertion);
                    return Ok(None);
                }
                Err(challenge) => {
                    tracing::warn!(
                        "Resolver: '{}' challenged {} ({})",
                        service.name(),
                        walk.binding.resource_uri(),
                        challenge
                    );
                    RequestContextStore::bind(Arc::clone(&context));
                    return Err(DispatchError::Unauthenticated { context, challenge });
                }
            }
        }

        for &child in service.children() {
            if let Some(found) = self.resolve_service(walk, child)? {
                return Ok(Some(found));
            }
        }

        // Children bound their own provisional contexts on the way down.
        RequestContextStore::bind(Arc::clone(&context));
        Ok(Some(context))
    }

    fn retrieve(&self, uri: &ResourcePath) -> Result<Option<Resource>, DispatchError> {
        match self.store.retrieve(self.credential_token.as_deref(), uri, true) {
            Ok(resource) => Ok(Some(resource)),
            Err(e) if e.is_absent() => {
                tracing::debug!("Resolver: dispatching {} without resource ({})", uri, e);
                Ok(None)
            }
            Err(e) => {
                tracing::error!("Resolver: retrieval of {} failed: {}", uri, e);
                Err(e.into())
            }
        }
    }

    fn bind_resource(&self, uri: ResourcePath, resource: Option<Resource>) -> Result<Binding, DispatchError> {
        let binding = Binding::new(uri, resource);
        let Some(index_files) = &self.index_files else {
            return Ok(binding);
        };

        let token = self.credential_token.as_deref();
        let index = match binding.resource() {
            Some(resource) if resource.is_collection() => index_files
                .index_of(self.store.as_ref(), token, resource.uri())?
                .map(|index| (index, false)),
            Some(resource) if index_files.is_index_file(self.store.as_ref(), token, resource)? => {
                Some((resource.uri().clone(), true))
            }
            _ => None,
        };

        Ok(match index {
            Some((index, is_index_file)) => binding.with_index_file(index, is_index_file),
            None => binding,
        })
    }
}
