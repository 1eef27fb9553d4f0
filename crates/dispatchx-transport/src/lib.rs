pub use dispatchx_core::{DispatchBuilder, DispatchError, RequestContext};
pub mod index;
pub mod normalize;
pub mod resolver;
pub mod server;
pub mod store;

pub use index::IndexFileResolver;
pub use normalize::PathNormalizer;
pub use resolver::Resolver;
pub use server::{DispatchServer, Inbound, Outcome};
pub use store::{ContextGuard, RequestContextStore};
