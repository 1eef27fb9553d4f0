use std::collections::BTreeSet;

use crate::request::Request;

/// An authenticated identity, as established by the security front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    name: String,
    roles: BTreeSet<String>,
}

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roles: BTreeSet::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(String::as_str)
    }
}

/// Supplies the principal used while evaluating assertions for a request.
pub trait PrincipalSource: Send + Sync {
    fn principal(&self, request: &Request) -> Option<Principal>;
}

/// Reads the principal the front end attached to the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestPrincipal;

impl PrincipalSource for RequestPrincipal {
    fn principal(&self, request: &Request) -> Option<Principal> {
        request.principal().cloned()
    }
}

/// Never yields a principal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl PrincipalSource for Anonymous {
    fn principal(&self, _request: &Request) -> Option<Principal> {
        None
    }
}

impl<F> PrincipalSource for F
where
    F: Fn(&Request) -> Option<Principal> + Send + Sync,
{
    fn principal(&self, request: &Request) -> Option<Principal> {
        self(request)
    }
}
