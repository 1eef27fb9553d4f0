use dispatchx_core::{ConfigError, DispatchBuilder, DispatchError, Request, RequestContext, ResourceStore};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::resolver::Resolver;
use crate::store::RequestContextStore;

pub type Outcome = Result<Arc<RequestContext>, DispatchError>;

/// One request handed to [`DispatchServer::run`], with the channel its
/// resolution outcome is sent back on.
pub struct Inbound {
    pub request: Request,
    pub reply: oneshot::Sender<Outcome>,
}

impl Inbound {
    pub fn new(request: Request) -> (Self, oneshot::Receiver<Outcome>) {
        let (reply, rx) = oneshot::channel();
        (Self { request, reply }, rx)
    }
}

/// Wraps every dispatch in a request scope so the context binding never
/// outlives the request that produced it.
#[derive(Clone)]
pub struct DispatchServer {
    resolver: Arc<Resolver>,
}

impl DispatchServer {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }

    /// Validates the builder's services and wires a resolver over `store`.
    pub fn from_builder(builder: DispatchBuilder, store: Arc<dyn ResourceStore>) -> Result<Self, ConfigError> {
        let (tree, config) = builder.build_tree()?;
        let resolver = Resolver::from_config(Arc::new(tree), store, &config);
        tracing::info!(
            "DispatchServer: ready with {} services, prefixes {:?}",
            resolver.tree().len(),
            config.uri_prefixes
        );
        Ok(Self::new(resolver))
    }

    pub fn resolver(&self) -> &Arc<Resolver> {
        &self.resolver
    }

    /// Resolves and runs `handler` on the calling thread. The binding is
    /// cleared on every exit path.
    pub fn dispatch<F, R>(&self, request: &Request, handler: F) -> Result<R, DispatchError>
    where
        F: FnOnce(&Arc<RequestContext>) -> R,
    {
        let _guard = RequestContextStore::enter();
        let context = self.resolver.resolve(request)?;
        Ok(handler(&context))
    }

    /// Like [`Self::dispatch`], but failures go to `recover` while the
    /// partial context of a challenge is still bound.
    pub fn dispatch_or_else<F, E, R>(&self, request: &Request, handler: F, recover: E) -> R
    where
        F: FnOnce(&Arc<RequestContext>) -> R,
        E: FnOnce(DispatchError) -> R,
    {
        let _guard = RequestContextStore::enter();
        match self.resolver.resolve(request) {
            Ok(context) => handler(&context),
            Err(e) => recover(e),
        }
    }

    /// Async dispatch inside a task-local scope. Dropping the returned future
    /// releases the binding as well.
    pub async fn serve<F, Fut, R>(&self, request: Request, handler: F) -> Result<R, DispatchError>
    where
        F: FnOnce(Arc<RequestContext>) -> Fut,
        Fut: Future<Output = R>,
    {
        let resolver = Arc::clone(&self.resolver);
        RequestContextStore::scope(async move {
            let context = resolver.resolve(&request)?;
            let output = handler(context).await;
            RequestContextStore::clear();
            Ok(output)
        })
        .await
    }

    /// Resolves inbound requests until the channel closes, one task each.
    pub async fn run(self, mut inbound: mpsc::Receiver<Inbound>) {
        tracing::info!("DispatchServer: accepting requests");
        while let Some(Inbound { request, reply }) = inbound.recv().await {
            let server = self.clone();
            tokio::spawn(async move {
                let outcome = server.serve(request, |context| async move { context }).await;
                if reply.send(outcome).is_err() {
                    tracing::debug!("DispatchServer: caller went away before the reply");
                }
            });
        }
        tracing::info!("DispatchServer: inbound channel closed");
    }
}
