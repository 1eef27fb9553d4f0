//! # Path Tests
//!
//! Resource path parsing and request path normalization.

use dispatchx_core::{Method, ResourcePath};
use dispatchx_transport::PathNormalizer;
use std::str::FromStr;

#[test]
fn test_resource_path_parse() {
    let root = ResourcePath::parse("/").unwrap();
    assert!(root.is_root());
    assert_eq!(root.parent(), None);
    assert_eq!(root.depth(), 0);

    let page = ResourcePath::parse("/docs/guide.html").unwrap();
    assert_eq!(page.name(), "guide.html");
    assert_eq!(page.parent(), Some(ResourcePath::parse("/docs").unwrap()));
    assert_eq!(page.segments().collect::<Vec<_>>(), ["docs", "guide.html"]);
    assert_eq!(ResourcePath::parse("/docs").unwrap().parent(), Some(ResourcePath::root()));

    for bad in ["", "docs", "/docs/", "/a//b", "/a/../b", "/./a"] {
        assert!(ResourcePath::parse(bad).is_err(), "{:?} should be rejected", bad);
    }
}

#[test]
fn test_resource_path_join_and_prefix() {
    let docs = ResourcePath::parse("/docs").unwrap();
    assert_eq!(ResourcePath::root().join("docs").unwrap(), docs);
    assert_eq!(docs.join("a").unwrap().as_str(), "/docs/a");
    assert!(docs.join("..").is_err());

    assert!(docs.join("a").unwrap().starts_with(&docs));
    assert!(docs.starts_with(&docs));
    assert!(!ResourcePath::parse("/docsets").unwrap().starts_with(&docs));
    assert!(docs.starts_with(&ResourcePath::root()));
}

#[test]
fn test_method_parsing() {
    assert_eq!(Method::from_str("get").unwrap(), Method::Get);
    assert_eq!(Method::from_str("PROPFIND").unwrap(), Method::Propfind);
    assert!(Method::from_str("BREW").is_err());
    assert_eq!(Method::Mkcol.to_string(), "MKCOL");
}

#[test]
fn test_normalizer_trailing_slash_and_root() {
    let normalizer = PathNormalizer::default();

    assert_eq!(normalizer.normalize("/").unwrap(), ResourcePath::root());
    assert_eq!(normalizer.normalize("").unwrap(), ResourcePath::root());
    assert_eq!(normalizer.normalize("/foo/").unwrap(), normalizer.normalize("/foo").unwrap());
    assert_eq!(normalizer.normalize("/foo/bar/").unwrap().as_str(), "/foo/bar");
    assert!(normalizer.normalize("/foo//").is_err());
    assert!(normalizer.normalize("//").is_err());
    assert!(normalizer.normalize("/a/../etc").is_err());
}

#[test]
fn test_normalizer_strips_prefix_on_segment_boundary() {
    let normalizer = PathNormalizer::new(["site/", "/cms"]);
    assert_eq!(normalizer.prefixes(), ["/site", "/cms"]);

    assert_eq!(normalizer.normalize("/site/docs").unwrap().as_str(), "/docs");
    assert_eq!(normalizer.normalize("/site").unwrap(), ResourcePath::root());
    assert_eq!(normalizer.normalize("/site/").unwrap(), ResourcePath::root());
    assert_eq!(normalizer.normalize("/cms/a/b/").unwrap().as_str(), "/a/b");
    assert_eq!(normalizer.normalize("/sitemap.xml").unwrap().as_str(), "/sitemap.xml");
    assert!(normalizer.normalize("/site//").is_err());
}
