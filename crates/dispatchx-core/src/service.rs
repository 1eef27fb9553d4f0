use core::fmt;
use dispatchx_dsa::{ForestNode, ServiceForest, ServiceId};
use std::collections::{BTreeMap, HashMap};

use crate::assertion::Assertion;

/// Payload of a service node: what must hold for it to apply, and what the
/// downstream handler needs to know once it does.
#[derive(Debug, Clone, Default)]
pub struct Service {
    pub(crate) assertions: Vec<Assertion>,
    pub(crate) handler: Option<String>,
    pub(crate) attributes: BTreeMap<String, String>,
}

/// Borrowed view of one node of a [`ServiceTree`].
#[derive(Clone, Copy)]
pub struct ServiceRef<'a> {
    id: ServiceId,
    node: &'a ForestNode<Service>,
}

impl<'a> ServiceRef<'a> {
    pub fn id(&self) -> ServiceId {
        self.id
    }

    pub fn name(&self) -> &'a str {
        self.node.name()
    }

    pub fn order(&self) -> Option<i32> {
        self.node.order()
    }

    pub fn parent(&self) -> Option<ServiceId> {
        self.node.parent()
    }

    pub fn children(&self) -> &'a [ServiceId] {
        self.node.children()
    }

    pub fn assertions(&self) -> &'a [Assertion] {
        &self.node.value().assertions
    }

    pub fn handler(&self) -> Option<&'a str> {
        self.node.value().handler.as_deref()
    }

    pub fn attribute(&self, key: &str) -> Option<&'a str> {
        self.node.value().attributes.get(key).map(String::as_str)
    }

    pub fn attributes(&self) -> &'a BTreeMap<String, String> {
        &self.node.value().attributes
    }
}

impl fmt::Debug for ServiceRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("order", &self.order())
            .field("assertions", &self.assertions().len())
            .field("children", &self.children().len())
            .finish()
    }
}

/// The validated, immutable service forest.
///
/// Built once by [`crate::ServiceRegistry::build`] and shared behind an `Arc`
/// for the lifetime of the process. Reads need no locking.
pub struct ServiceTree {
    forest: ServiceForest<Service>,
    by_name: HashMap<String, ServiceId>,
}

impl ServiceTree {
    pub(crate) fn new(forest: ServiceForest<Service>) -> Self {
        let by_name = forest
            .ids()
            .map(|id| (forest.node(id).name().to_string(), id))
            .collect();
        Self { forest, by_name }
    }

    pub fn roots(&self) -> &[ServiceId] {
        self.forest.roots()
    }

    pub fn len(&self) -> usize {
        self.forest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forest.is_empty()
    }

    /// Panics on an id from another tree.
    pub fn service(&self, id: ServiceId) -> ServiceRef<'_> {
        ServiceRef {
            id,
            node: self.forest.node(id),
        }
    }

    pub fn get(&self, id: ServiceId) -> Option<ServiceRef<'_>> {
        self.forest.get(id).map(|node| ServiceRef { id, node })
    }

    pub fn find(&self, name: &str) -> Option<ServiceRef<'_>> {
        self.by_name.get(name).map(|&id| self.service(id))
    }

    pub fn children(&self, id: ServiceId) -> &[ServiceId] {
        self.forest.children(id)
    }

    pub fn ancestors(&self, id: ServiceId) -> impl Iterator<Item = ServiceRef<'_>> {
        self.forest.ancestors(id).map(move |ancestor| self.service(ancestor))
    }

    /// Returns `true` if `id` is `ancestor` or lies below it.
    pub fn is_descendant_of(&self, id: ServiceId, ancestor: ServiceId) -> bool {
        id == ancestor || self.forest.is_ancestor(ancestor, id)
    }

    /// Service names from the root down to `id`.
    pub fn chain(&self, id: ServiceId) -> Vec<String> {
        self.forest.chain(id)
    }

    /// Indented outline of the forest in resolution order.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for &root in self.roots() {
            self.outline_into(root, 0, &mut out);
        }
        out
    }

    fn outline_into(&self, id: ServiceId, depth: usize, out: &mut String) {
        let service = self.service(id);
        out.push_str(&"  ".repeat(depth));
        out.push_str(service.name());
        if !service.assertions().is_empty() {
            let assertions: Vec<String> = service.assertions().iter().map(ToString::to_string).collect();
            out.push_str(" [");
            out.push_str(&assertions.join(", "));
            out.push(']');
        }
        out.push('\n');
        for &child in self.children(id) {
            self.outline_into(child, depth + 1, out);
        }
    }
}

impl fmt::Debug for ServiceTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceTree")
            .field("services", &self.forest.len())
            .field("roots", &self.forest.roots().len())
            .finish()
    }
}
