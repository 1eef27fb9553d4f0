//! # Service Registry Tests
//!
//! Building the service tree from flat definitions: link discovery, name
//! lookups and the ancestor conflict pass.

use dispatchx_core::{
    Assertion, ConfigError, DispatchBuilder, Method, ResourcePath, ServiceDefinition, ServiceRegistry, ServiceTree,
};
use std::time::Instant;

fn path(raw: &str) -> ResourcePath {
    ResourcePath::parse(raw).unwrap()
}

fn child_names(tree: &ServiceTree, name: &str) -> Vec<String> {
    let service = tree.find(name).unwrap();
    service
        .children()
        .iter()
        .map(|&id| tree.service(id).name().to_string())
        .collect()
}

#[test]
fn test_registry_links_both_directions() {
    let t = Instant::now();

    let tree = ServiceRegistry::new()
        .with(ServiceDefinition::new("root").child("listed"))
        .with(ServiceDefinition::new("listed"))
        .with(ServiceDefinition::new("declared").parent("root"))
        .build()
        .unwrap();

    assert_eq!(tree.len(), 3);
    assert_eq!(tree.roots().len(), 1);
    // Parent-declared links are discovered before explicit children lists.
    assert_eq!(child_names(&tree, "root"), ["declared", "listed"]);

    let listed = tree.find("listed").unwrap();
    assert_eq!(listed.parent(), Some(tree.find("root").unwrap().id()));

    let overhead = t.elapsed();
    println!("test_registry_links_both_directions: Testing Overhead = {:?}", overhead);
}

#[test]
fn test_same_link_declared_twice_is_accepted() {
    let tree = ServiceRegistry::new()
        .with(ServiceDefinition::new("root").child("leaf"))
        .with(ServiceDefinition::new("leaf").parent("root"))
        .build()
        .unwrap();

    assert_eq!(child_names(&tree, "root"), ["leaf"]);
}

#[test]
fn test_siblings_follow_order_then_declaration() {
    let tree = ServiceRegistry::new()
        .with(ServiceDefinition::new("root"))
        .with(ServiceDefinition::new("c").parent("root"))
        .with(ServiceDefinition::new("b").parent("root").order(2))
        .with(ServiceDefinition::new("a").parent("root").order(1))
        .with(ServiceDefinition::new("d").parent("root"))
        .build()
        .unwrap();

    assert_eq!(child_names(&tree, "root"), ["a", "b", "c", "d"]);
}

#[test]
fn test_duplicate_and_unknown_names() {
    let err = ServiceRegistry::new()
        .with(ServiceDefinition::new("root"))
        .with(ServiceDefinition::new("root"))
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateService(ref name) if name == "root"));

    let err = ServiceRegistry::new()
        .with(ServiceDefinition::new("root").child("ghost"))
        .build()
        .unwrap_err();
    match err {
        ConfigError::UnknownService { name, referenced_by } => {
            assert_eq!(name, "ghost");
            assert_eq!(referenced_by, "root");
        }
        other => panic!("expected UnknownService, got {}", other),
    }
}

#[test]
fn test_structural_errors_surface_as_config_errors() {
    let err = ServiceRegistry::new().build().unwrap_err();
    assert!(matches!(err, ConfigError::EmptyRootList));

    let err = ServiceRegistry::new()
        .with(ServiceDefinition::new("left"))
        .with(ServiceDefinition::new("right").child("shared"))
        .with(ServiceDefinition::new("shared").parent("left"))
        .build()
        .unwrap_err();
    match err {
        ConfigError::AmbiguousParent {
            child,
            existing,
            requested,
        } => {
            assert_eq!(child, "shared");
            assert_eq!(existing, "left");
            assert_eq!(requested, "right");
        }
        other => panic!("expected AmbiguousParent, got {}", other),
    }

    let err = ServiceRegistry::new()
        .with(ServiceDefinition::new("root"))
        .with(ServiceDefinition::new("a").parent("b"))
        .with(ServiceDefinition::new("b").parent("a"))
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::CyclicParent(_)));

    let err = ServiceRegistry::new()
        .with(ServiceDefinition::new("loop").parent("loop"))
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::SelfParent(ref name) if name == "loop"));
}

/// A conflict with a grandparent is reported with the full root path.
#[test]
fn test_conflict_with_ancestor_is_rejected() {
    let t = Instant::now();

    let err = ServiceRegistry::new()
        .with(ServiceDefinition::new("root").assert(Assertion::method(Method::Get)))
        .with(
            ServiceDefinition::new("docs")
                .parent("root")
                .assert(Assertion::path_prefix(path("/docs"))),
        )
        .with(
            ServiceDefinition::new("upload")
                .parent("docs")
                .assert(Assertion::method(Method::Post)),
        )
        .build()
        .unwrap_err();

    match &err {
        ConfigError::AssertionConflict {
            service,
            assertion,
            ancestor,
            ancestor_assertion,
            chain,
        } => {
            assert_eq!(service, "upload");
            assert_eq!(assertion, "method=POST");
            assert_eq!(ancestor, "root");
            assert_eq!(ancestor_assertion, "method=GET");
            assert_eq!(chain, &["root", "docs", "upload"]);
        }
        other => panic!("expected AssertionConflict, got {}", other),
    }
    assert!(err.to_string().contains("root -> docs -> upload"));

    let overhead = t.elapsed();
    println!("test_conflict_with_ancestor_is_rejected: Testing Overhead = {:?}", overhead);
}

/// Siblings are alternatives, so conflicting siblings are fine.
#[test]
fn test_conflicting_siblings_are_allowed() {
    let tree = ServiceRegistry::new()
        .with(ServiceDefinition::new("root"))
        .with(
            ServiceDefinition::new("read")
                .parent("root")
                .assert(Assertion::method(Method::Get)),
        )
        .with(
            ServiceDefinition::new("write")
                .parent("root")
                .assert(Assertion::method(Method::Put)),
        )
        .build()
        .unwrap();

    assert_eq!(tree.len(), 3);
}

#[test]
fn test_narrowing_child_is_accepted() {
    let tree = ServiceRegistry::new()
        .with(ServiceDefinition::new("docs").assert(Assertion::path_prefix(path("/docs"))))
        .with(
            ServiceDefinition::new("api")
                .parent("docs")
                .assert(Assertion::path_prefix(path("/docs/api")))
                .assert(Assertion::method(Method::Get)),
        )
        .build()
        .unwrap();

    let api = tree.find("api").unwrap();
    let docs = tree.find("docs").unwrap();
    assert!(tree.is_descendant_of(api.id(), docs.id()));
    assert_eq!(tree.chain(api.id()), ["docs", "api"]);
}

#[test]
fn test_handler_and_attributes_survive_build() {
    let tree = ServiceRegistry::new()
        .with(
            ServiceDefinition::new("root")
                .handler("display")
                .attribute("template", "page.html"),
        )
        .build()
        .unwrap();

    let root = tree.find("root").unwrap();
    assert_eq!(root.handler(), Some("display"));
    assert_eq!(root.attribute("template"), Some("page.html"));
    assert_eq!(root.attribute("missing"), None);
    assert!(tree.outline().contains("root"));
}

#[test]
fn test_dispatch_builder_defaults() {
    let builder = DispatchBuilder::new();
    assert!(builder.registry.is_empty());
    assert!(builder.config.uri_prefixes.is_empty());
    assert_eq!(builder.config.index_files, ["index.html", "index.htm", "index.xml"]);
    assert!(builder.config.credential_token.is_none());

    let (tree, config) = DispatchBuilder::new()
        .service(ServiceDefinition::new("root"))
        .with_uri_prefix("/site")
        .with_index_files(["default.html"])
        .with_credential_token("secret")
        .build_tree()
        .unwrap();

    assert_eq!(tree.len(), 1);
    assert_eq!(config.uri_prefixes, ["/site"]);
    assert_eq!(config.index_files, ["default.html"]);
    assert_eq!(config.credential_token.as_deref(), Some("secret"));
}
