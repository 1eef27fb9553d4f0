//! # dispatch-x
//!
//! Resolves inbound requests onto an ordered tree of services guarded by
//! assertions, and keeps the resolved context bound for the lifetime of the
//! request.
//!
//! - [`dispatchx_dsa`]: the arena forest the service tree is stored in.
//! - [`dispatchx_core`]: requests, resources, assertions, the registry and errors.
//! - [`dispatchx_transport`]: the resolver, the context store and the dispatch server.

pub use dispatchx_core;
pub use dispatchx_dsa;
pub use dispatchx_transport;

pub use dispatchx_core::{
    Assertion, ConfigError, DispatchBuilder, DispatchConfig, DispatchError, Method, Principal, Request,
    RequestContext, Resource, ResourcePath, ServiceDefinition, ServiceRegistry, ServiceTree,
};
pub use dispatchx_transport::{DispatchServer, RequestContextStore, Resolver};
