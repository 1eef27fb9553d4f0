use dispatch_x::dispatchx_core::MemoryResourceStore;
use dispatch_x::{DispatchBuilder, DispatchConfig, DispatchServer, Request};
use std::sync::Arc;

const CONFIG: &str = r#"
uri_prefixes = ["/site"]
index_files = ["index.html"]

[[services]]
name = "root"
handler = "display"

[[services]]
name = "admin"
parent = "root"
order = 1
handler = "admin"
assertions = [
    { kind = "parameter_present", name = "admin" },
    { kind = "requires_role", role = "editor" },
]

[[services]]
name = "listing"
parent = "root"
order = 2
handler = "listing"
assertions = [{ kind = "resource_is_collection", collection = true }]
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = DispatchConfig::from_toml_str(CONFIG)?;
    let store = MemoryResourceStore::new()
        .with_collection("/")?
        .with_collection("/news")?
        .with_document("/news/index.html")?;

    let server = DispatchServer::from_builder(DispatchBuilder::new().with_config(config), Arc::new(store))?;
    println!("{}", server.resolver().tree().outline());

    for request in [
        Request::get("/site/news/"),
        Request::get("/site/news/index.html"),
        Request::get("/site/news").with_parameter("admin", ""),
    ] {
        let line = server.dispatch_or_else(
            &request,
            |context| format!("{} -> {:?}", request.path(), context),
            |e| format!("{} -> {}", request.path(), e),
        );
        println!("{}", line);
    }

    Ok(())
}
