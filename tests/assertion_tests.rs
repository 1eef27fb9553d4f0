//! # Assertion Tests
//!
//! Predicate evaluation against a request and the pairwise conflict relation
//! used by the tree builder.

use dispatchx_core::{
    Assertion, AuthenticationRequired, CustomAssertion, MatchInput, Method, Principal, Request, Resource,
    ResourcePath,
};

fn path(raw: &str) -> ResourcePath {
    ResourcePath::parse(raw).unwrap()
}

fn eval(assertion: &Assertion, request: &Request, resource: Option<&Resource>) -> Result<bool, AuthenticationRequired> {
    let uri = path(request.path());
    let input = MatchInput {
        request,
        path: &uri,
        resource,
        principal: request.principal(),
    };
    assertion.matches(&input)
}

#[derive(Debug)]
struct HeaderPresent(&'static str);

impl CustomAssertion for HeaderPresent {
    fn name(&self) -> &str {
        "header-present"
    }

    fn matches(&self, input: &MatchInput<'_>) -> Result<bool, AuthenticationRequired> {
        Ok(input.request.header(self.0).is_some())
    }

    fn conflicts(&self, other: &Assertion) -> bool {
        matches!(other, Assertion::Method { method: Method::Options })
    }
}

#[test]
fn test_request_predicates() {
    let request = Request::post("/docs/guide").with_parameter("view", "raw");

    assert!(eval(&Assertion::method(Method::Post), &request, None).unwrap());
    assert!(!eval(&Assertion::method(Method::Get), &request, None).unwrap());
    assert!(eval(&Assertion::path_prefix(path("/docs")), &request, None).unwrap());
    assert!(eval(&Assertion::path_prefix(ResourcePath::root()), &request, None).unwrap());
    assert!(!eval(&Assertion::path_prefix(path("/doc")), &request, None).unwrap());
    assert!(eval(&Assertion::path_equals(path("/docs/guide")), &request, None).unwrap());
    assert!(eval(&Assertion::ParameterPresent { name: "view".into() }, &request, None).unwrap());
    assert!(eval(&Assertion::parameter_equals("view", "raw"), &request, None).unwrap());
    assert!(!eval(&Assertion::parameter_equals("view", "html"), &request, None).unwrap());
}

#[test]
fn test_resource_predicates() {
    let request = Request::get("/docs");
    let collection = Resource::collection(path("/docs"));
    let document = Resource::document(path("/docs")).with_type("markdown");

    let is_collection = Assertion::ResourceIsCollection { collection: true };
    assert!(eval(&is_collection, &request, Some(&collection)).unwrap());
    assert!(!eval(&is_collection, &request, Some(&document)).unwrap());
    assert!(!eval(&is_collection, &request, None).unwrap());

    let exists = Assertion::ResourceExists { exists: false };
    assert!(eval(&exists, &request, None).unwrap());
    assert!(!eval(&exists, &request, Some(&document)).unwrap());

    let markdown = Assertion::ResourceType {
        resource_type: "markdown".into(),
    };
    assert!(eval(&markdown, &request, Some(&document)).unwrap());
    assert!(!eval(&markdown, &request, Some(&collection)).unwrap());
}

/// Auth predicates challenge anonymous requests instead of failing them.
#[test]
fn test_auth_predicates_challenge_anonymous() {
    let anonymous = Request::get("/admin");
    let editor = Request::get("/admin").with_principal(Principal::new("ada").with_role("editor"));

    assert!(eval(&Assertion::RequiresAuthentication, &anonymous, None).is_err());
    assert!(eval(&Assertion::RequiresAuthentication, &editor, None).unwrap());

    let role = Assertion::RequiresRole { role: "editor".into() };
    assert!(eval(&role, &anonymous, None).is_err());
    assert!(eval(&role, &editor, None).unwrap());
    let admin = Assertion::RequiresRole { role: "admin".into() };
    assert!(!eval(&admin, &editor, None).unwrap());

    let present = Assertion::PrincipalPresent { present: true };
    assert!(!eval(&present, &anonymous, None).unwrap());
    assert!(eval(&present, &editor, None).unwrap());
}

#[test]
fn test_conflicts() {
    let cases = [
        (Assertion::method(Method::Get), Assertion::method(Method::Post), true),
        (Assertion::method(Method::Get), Assertion::method(Method::Get), false),
        (Assertion::path_prefix(path("/a")), Assertion::path_prefix(path("/b")), true),
        (Assertion::path_prefix(path("/a")), Assertion::path_prefix(path("/a/b")), false),
        (Assertion::path_prefix(path("/a")), Assertion::path_prefix(path("/ab")), true),
        (Assertion::path_equals(path("/a/x")), Assertion::path_prefix(path("/a")), false),
        (Assertion::path_equals(path("/b/x")), Assertion::path_prefix(path("/a")), true),
        (Assertion::path_equals(path("/a")), Assertion::path_equals(path("/b")), true),
        (Assertion::parameter_equals("v", "1"), Assertion::parameter_equals("v", "2"), true),
        (Assertion::parameter_equals("v", "1"), Assertion::parameter_equals("w", "2"), false),
        (
            Assertion::PrincipalPresent { present: false },
            Assertion::RequiresRole { role: "r".into() },
            true,
        ),
        (
            Assertion::ResourceExists { exists: false },
            Assertion::ResourceIsCollection { collection: false },
            true,
        ),
        (
            Assertion::ResourceIsCollection { collection: true },
            Assertion::ResourceIsCollection { collection: false },
            true,
        ),
        (Assertion::method(Method::Get), Assertion::path_prefix(path("/a")), false),
        (Assertion::RequiresAuthentication, Assertion::RequiresAuthentication, false),
    ];

    for (a, b, expected) in &cases {
        assert_eq!(a.conflicts(b), *expected, "{} vs {}", a, b);
        assert_eq!(b.conflicts(a), *expected, "{} vs {} (reversed)", b, a);
    }
}

#[test]
fn test_custom_assertion() {
    let custom = Assertion::custom(HeaderPresent("x-preview"));
    let plain = Request::get("/page");
    let preview = Request::get("/page").with_header("X-Preview", "1");

    assert!(!eval(&custom, &plain, None).unwrap());
    assert!(eval(&custom, &preview, None).unwrap());
    assert_eq!(custom.to_string(), "custom:header-present");

    let options = Assertion::method(Method::Options);
    assert!(custom.conflicts(&options));
    assert!(options.conflicts(&custom));
    assert!(!custom.conflicts(&Assertion::method(Method::Get)));
}
