use dispatch_x::dispatchx_core::{MemoryResourceStore, ResourcePath};
use dispatch_x::dispatchx_transport::Inbound;
use dispatch_x::{Assertion, DispatchBuilder, DispatchServer, Method, Request, ServiceDefinition};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let store = MemoryResourceStore::new()
        .with_collection("/")?
        .with_collection("/docs")?
        .with_document("/docs/index.html")?
        .with_document("/docs/guide.html")?;

    let builder = DispatchBuilder::new()
        .service(ServiceDefinition::new("site").handler("display"))
        .service(
            ServiceDefinition::new("docs")
                .parent("site")
                .order(1)
                .assert(Assertion::path_prefix(ResourcePath::parse("/docs")?))
                .handler("docs-display"),
        )
        .service(
            ServiceDefinition::new("docs-edit")
                .parent("docs")
                .assert(Assertion::method(Method::Post))
                .assert(Assertion::RequiresAuthentication)
                .handler("editor"),
        )
        .with_index_files(["index.html"]);

    let server = DispatchServer::from_builder(builder, Arc::new(store))?;

    let (tx, rx) = tokio::sync::mpsc::channel(64);
    tokio::spawn(server.clone().run(rx));

    for request in [
        Request::get("/docs/"),
        Request::get("/docs/guide.html"),
        Request::post("/docs/guide.html"),
        Request::get("/elsewhere"),
    ] {
        let (inbound, reply) = Inbound::new(request);
        tx.send(inbound).await?;
        match reply.await? {
            Ok(context) => tracing::info!("resolved: {:?}", context),
            Err(e) => tracing::warn!("dispatch failed: {}", e),
        }
    }

    Ok(())
}
