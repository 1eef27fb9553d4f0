use core::fmt;
use serde::Deserialize;
use std::sync::Arc;

use crate::path::ResourcePath;
use crate::principal::Principal;
use crate::request::{Method, Request};
use crate::resource::Resource;

/// Raised by an assertion that cannot decide without an authenticated
/// principal. Resolution stops at the first challenge.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("authentication required: {reason}")]
pub struct AuthenticationRequired {
    pub reason: String,
}

impl AuthenticationRequired {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Everything an assertion may inspect for one request.
#[derive(Debug, Clone, Copy)]
pub struct MatchInput<'a> {
    pub request: &'a Request,
    /// Normalized path of the request.
    pub path: &'a ResourcePath,
    pub resource: Option<&'a Resource>,
    pub principal: Option<&'a Principal>,
}

/// Extension point for predicates that are not built in.
pub trait CustomAssertion: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn matches(&self, input: &MatchInput<'_>) -> Result<bool, AuthenticationRequired>;

    /// Whether this predicate can never hold together with `other`.
    fn conflicts(&self, _other: &Assertion) -> bool {
        false
    }
}

/// A predicate guarding a service.
///
/// Deserializes from a table tagged by `kind`, e.g.
/// `{ kind = "path_prefix", prefix = "/admin" }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Assertion {
    Method { method: Method },
    PathPrefix { prefix: ResourcePath },
    PathEquals { path: ResourcePath },
    ParameterPresent { name: String },
    ParameterEquals { name: String, value: String },
    PrincipalPresent { present: bool },
    /// Challenges anonymous requests, matches any principal.
    RequiresAuthentication,
    /// Challenges anonymous requests, matches principals holding `role`.
    RequiresRole { role: String },
    ResourceExists { exists: bool },
    ResourceIsCollection { collection: bool },
    ResourceType { resource_type: String },
    #[serde(skip)]
    Custom(Arc<dyn CustomAssertion>),
}

impl Assertion {
    pub fn method(method: Method) -> Self {
        Assertion::Method { method }
    }

    pub fn path_prefix(prefix: ResourcePath) -> Self {
        Assertion::PathPrefix { prefix }
    }

    pub fn path_equals(path: ResourcePath) -> Self {
        Assertion::PathEquals { path }
    }

    pub fn parameter_equals(name: impl Into<String>, value: impl Into<String>) -> Self {
        Assertion::ParameterEquals {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn custom(assertion: impl CustomAssertion + 'static) -> Self {
        Assertion::Custom(Arc::new(assertion))
    }

    pub fn matches(&self, input: &MatchInput<'_>) -> Result<bool, AuthenticationRequired> {
        let matched = match self {
            Assertion::Method { method } => input.request.method() == *method,
            Assertion::PathPrefix { prefix } => input.path.starts_with(prefix),
            Assertion::PathEquals { path } => input.path == path,
            Assertion::ParameterPresent { name } => input.request.parameter(name).is_some(),
            Assertion::ParameterEquals { name, value } => input.request.parameter(name) == Some(value.as_str()),
            Assertion::PrincipalPresent { present } => input.principal.is_some() == *present,
            Assertion::RequiresAuthentication => {
                if input.principal.is_none() {
                    return Err(AuthenticationRequired::new(format!(
                        "{} requires an authenticated principal",
                        input.path
                    )));
                }
                true
            }
            Assertion::RequiresRole { role } => match input.principal {
                Some(principal) => principal.has_role(role),
                None => {
                    return Err(AuthenticationRequired::new(format!(
                        "{} requires role '{}'",
                        input.path, role
                    )))
                }
            },
            Assertion::ResourceExists { exists } => input.resource.is_some() == *exists,
            Assertion::ResourceIsCollection { collection } => input
                .resource
                .is_some_and(|resource| resource.is_collection() == *collection),
            Assertion::ResourceType { resource_type } => input
                .resource
                .is_some_and(|resource| resource.resource_type() == resource_type),
            Assertion::Custom(custom) => return custom.matches(input),
        };
        Ok(matched)
    }

    /// Returns `true` if no request can satisfy both `self` and `other`.
    /// Symmetric: `a.conflicts(b) == b.conflicts(a)`.
    pub fn conflicts(&self, other: &Assertion) -> bool {
        self.excludes(other) || other.excludes(self)
    }

    fn excludes(&self, other: &Assertion) -> bool {
        match (self, other) {
            (Self::Method { method: a }, Self::Method { method: b }) => a != b,
            (Self::PathPrefix { prefix: a }, Self::PathPrefix { prefix: b }) => !a.starts_with(b) && !b.starts_with(a),
            (Self::PathEquals { path: a }, Self::PathEquals { path: b }) => a != b,
            (Self::PathEquals { path }, Self::PathPrefix { prefix }) => !path.starts_with(prefix),
            (
                Self::ParameterEquals { name: n1, value: v1 },
                Self::ParameterEquals { name: n2, value: v2 },
            ) => n1 == n2 && v1 != v2,
            (Self::PrincipalPresent { present: a }, Self::PrincipalPresent { present: b }) => a != b,
            (Self::PrincipalPresent { present: false }, Self::RequiresAuthentication | Self::RequiresRole { .. }) => true,
            (Self::ResourceExists { exists: a }, Self::ResourceExists { exists: b }) => a != b,
            (Self::ResourceExists { exists: false }, Self::ResourceIsCollection { .. } | Self::ResourceType { .. }) => true,
            (Self::ResourceIsCollection { collection: a }, Self::ResourceIsCollection { collection: b }) => a != b,
            (Self::ResourceType { resource_type: a }, Self::ResourceType { resource_type: b }) => a != b,
            (Self::Custom(custom), other) => custom.conflicts(other),
            _ => false,
        }
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assertion::Method { method } => write!(f, "method={}", method),
            Assertion::PathPrefix { prefix } => write!(f, "path-prefix={}", prefix),
            Assertion::PathEquals { path } => write!(f, "path={}", path),
            Assertion::ParameterPresent { name } => write!(f, "parameter[{}]", name),
            Assertion::ParameterEquals { name, value } => write!(f, "parameter[{}]={}", name, value),
            Assertion::PrincipalPresent { present } => write!(f, "principal-present={}", present),
            Assertion::RequiresAuthentication => f.write_str("requires-authentication"),
            Assertion::RequiresRole { role } => write!(f, "requires-role={}", role),
            Assertion::ResourceExists { exists } => write!(f, "resource-exists={}", exists),
            Assertion::ResourceIsCollection { collection } => write!(f, "resource-collection={}", collection),
            Assertion::ResourceType { resource_type } => write!(f, "resource-type={}", resource_type),
            Assertion::Custom(custom) => write!(f, "custom:{}", custom.name()),
        }
    }
}
