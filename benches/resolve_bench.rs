use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dispatch_x::dispatchx_core::MemoryResourceStore;
use dispatch_x::{Assertion, Method, Request, ResourcePath, Resolver, ServiceDefinition, ServiceRegistry};
use std::sync::Arc;

fn wide_tree(fanout: usize) -> ServiceRegistry {
    let mut registry = ServiceRegistry::new();
    registry.register(ServiceDefinition::new("root"));
    for i in 0..fanout {
        let section = format!("section-{}", i);
        let prefix = ResourcePath::parse(&format!("/{}", section)).unwrap();
        registry.register(
            ServiceDefinition::new(section.clone())
                .parent("root")
                .order(i as i32)
                .assert(Assertion::path_prefix(prefix)),
        );
        registry.register(
            ServiceDefinition::new(format!("{}-post", section))
                .parent(section)
                .assert(Assertion::method(Method::Post)),
        );
    }
    registry
}

fn resolve_performance(c: &mut Criterion) {
    let tree = Arc::new(wide_tree(64).build().unwrap());
    let store = MemoryResourceStore::new().with_collection("/").unwrap();
    let resolver = Resolver::new(tree, Arc::new(store));

    let last = Request::post("/section-63/page");
    c.bench_function("resolve_last_sibling_depth_2", |b| {
        b.iter(|| resolver.resolve(black_box(&last)).is_ok())
    });

    let unmapped = Request::get("/nowhere/").with_parameter("x", "1");
    c.bench_function("resolve_fallback_to_root", |b| {
        b.iter(|| resolver.resolve(black_box(&unmapped)).is_ok())
    });
}

criterion_group!(benches, resolve_performance);
criterion_main!(benches);
