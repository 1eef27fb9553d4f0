use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// Index of a node inside a [`ServiceForest`].
///
/// Parents hold their children by id and children point back with a
/// non-owning id, so the forest never contains reference cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceId(u32);

static_assertions::assert_eq_size!(ServiceId, u32);

impl ServiceId {
    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

const NULL_NODE: u32 = u32::MAX;

/// A single node of the arena.
#[derive(Clone, Debug)]
pub struct ForestNode<T> {
    name: String,
    order: Option<i32>,
    /// Parent index, `NULL_NODE` for roots.
    parent: u32,
    children: Vec<ServiceId>,
    value: T,
}

impl<T> ForestNode<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn order(&self) -> Option<i32> {
        self.order
    }

    pub fn parent(&self) -> Option<ServiceId> {
        if self.parent == NULL_NODE {
            None
        } else {
            Some(ServiceId(self.parent))
        }
    }

    pub fn children(&self) -> &[ServiceId] {
        &self.children
    }

    pub fn value(&self) -> &T {
        &self.value
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ForestError {
    /// No node is left without a parent.
    EmptyForest,
    /// A child was claimed by two different parents.
    AmbiguousParent {
        child: String,
        existing: String,
        requested: String,
    },
    SelfParent { name: String },
    /// The node sits on a parent cycle and can never be reached from a root.
    Unreachable { name: String },
}

impl fmt::Display for ForestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForestError::EmptyForest => write!(f, "service forest has no root services"),
            ForestError::AmbiguousParent { child, existing, requested } => write!(
                f,
                "service '{}' already has parent '{}', cannot also be a child of '{}'",
                child, existing, requested
            ),
            ForestError::SelfParent { name } => write!(f, "service '{}' cannot be its own parent", name),
            ForestError::Unreachable { name } => {
                write!(f, "service '{}' is part of a parent cycle and is unreachable from any root", name)
            }
        }
    }
}

/// Collects nodes and parent links, then freezes them into a [`ServiceForest`].
#[derive(Debug)]
pub struct ForestBuilder<T> {
    nodes: Vec<ForestNode<T>>,
}

impl<T> Default for ForestBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ForestBuilder<T> {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { nodes: Vec::with_capacity(capacity) }
    }

    /// Adds an unlinked node. Ids are handed out in declaration order, which
    /// is also the tie-break order for equal `order` values.
    pub fn declare(&mut self, name: impl Into<String>, order: Option<i32>, value: T) -> ServiceId {
        let id = ServiceId(self.nodes.len() as u32);
        self.nodes.push(ForestNode {
            name: name.into(),
            order,
            parent: NULL_NODE,
            children: Vec::new(),
            value,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Links `child` under `parent`.
    ///
    /// Linking the same pair twice is a no-op; claiming a child that already
    /// belongs to a different parent is an error.
    pub fn link(&mut self, parent: ServiceId, child: ServiceId) -> Result<(), ForestError> {
        if parent == child {
            return Err(ForestError::SelfParent {
                name: self.nodes[child.index()].name.clone(),
            });
        }

        let existing = self.nodes[child.index()].parent;
        if existing == parent.0 {
            return Ok(());
        }
        if existing != NULL_NODE {
            return Err(ForestError::AmbiguousParent {
                child: self.nodes[child.index()].name.clone(),
                existing: self.nodes[existing as usize].name.clone(),
                requested: self.nodes[parent.index()].name.clone(),
            });
        }

        self.nodes[child.index()].parent = parent.0;
        self.nodes[parent.index()].children.push(child);
        Ok(())
    }

    /// Freezes the builder: collects roots, rejects cycles and sorts every
    /// sibling list by ascending order (unordered last, stable).
    pub fn build(mut self) -> Result<ServiceForest<T>, ForestError> {
        let mut roots: Vec<ServiceId> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent == NULL_NODE)
            .map(|(idx, _)| ServiceId(idx as u32))
            .collect();

        if roots.is_empty() {
            return Err(ForestError::EmptyForest);
        }

        let mut reached = alloc::vec![false; self.nodes.len()];
        let mut pending: Vec<ServiceId> = roots.clone();
        while let Some(id) = pending.pop() {
            reached[id.index()] = true;
            pending.extend(self.nodes[id.index()].children.iter().copied());
        }
        if let Some(idx) = reached.iter().position(|seen| !seen) {
            return Err(ForestError::Unreachable {
                name: self.nodes[idx].name.clone(),
            });
        }

        let orders: Vec<Option<i32>> = self.nodes.iter().map(|node| node.order).collect();
        let key = |id: &ServiceId| sort_key(orders[id.index()]);
        roots.sort_by_key(key);
        for node in &mut self.nodes {
            node.children.sort_by_key(key);
        }

        Ok(ServiceForest { nodes: self.nodes, roots })
    }
}

#[inline(always)]
fn sort_key(order: Option<i32>) -> (bool, i32) {
    match order {
        Some(order) => (false, order),
        None => (true, 0),
    }
}

/// An immutable, ordered forest of named nodes.
#[derive(Clone, Debug)]
pub struct ServiceForest<T> {
    nodes: Vec<ForestNode<T>>,
    roots: Vec<ServiceId>,
}

impl<T> ServiceForest<T> {
    pub fn roots(&self) -> &[ServiceId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline(always)]
    pub fn get(&self, id: ServiceId) -> Option<&ForestNode<T>> {
        self.nodes.get(id.index())
    }

    /// Panics on an id minted by a different forest.
    #[inline(always)]
    pub fn node(&self, id: ServiceId) -> &ForestNode<T> {
        &self.nodes[id.index()]
    }

    pub fn children(&self, id: ServiceId) -> &[ServiceId] {
        &self.nodes[id.index()].children
    }

    pub fn parent(&self, id: ServiceId) -> Option<ServiceId> {
        self.nodes[id.index()].parent()
    }

    pub fn ids(&self) -> impl Iterator<Item = ServiceId> + '_ {
        (0..self.nodes.len()).map(|idx| ServiceId(idx as u32))
    }

    /// Walks from the parent of `id` up to its root, nearest first.
    pub fn ancestors(&self, id: ServiceId) -> Ancestors<'_, T> {
        Ancestors {
            forest: self,
            next: self.nodes[id.index()].parent,
        }
    }

    /// Returns `true` if `ancestor` lies on the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: ServiceId, id: ServiceId) -> bool {
        self.ancestors(id).any(|candidate| candidate == ancestor)
    }

    pub fn depth(&self, id: ServiceId) -> usize {
        self.ancestors(id).count()
    }

    /// Names from the root down to and including `id`.
    pub fn chain(&self, id: ServiceId) -> Vec<String> {
        let mut chain: Vec<String> = self
            .ancestors(id)
            .map(|ancestor| self.nodes[ancestor.index()].name.clone())
            .collect();
        chain.reverse();
        chain.push(self.nodes[id.index()].name.clone());
        chain
    }
}

pub struct Ancestors<'a, T> {
    forest: &'a ServiceForest<T>,
    next: u32,
}

impl<T> Iterator for Ancestors<'_, T> {
    type Item = ServiceId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == NULL_NODE {
            return None;
        }
        let id = ServiceId(self.next);
        self.next = self.forest.nodes[id.index()].parent;
        Some(id)
    }
}

#[cfg(kani)]
mod proofs {
    use super::*;

    #[kani::proof]
    fn prove_unordered_sorts_last() {
        let order: i32 = kani::any();
        assert!(sort_key(Some(order)) < sort_key(None));
    }

    #[kani::proof]
    #[kani::unwind(4)]
    fn prove_child_has_at_most_one_parent() {
        let mut builder = ForestBuilder::new();
        let ids = [
            builder.declare("a", None, ()),
            builder.declare("b", None, ()),
            builder.declare("c", None, ()),
        ];
        let first: usize = kani::any();
        let second: usize = kani::any();
        let child: usize = kani::any();
        kani::assume(first < 3 && second < 3 && child < 3);

        let _ = builder.link(ids[first], ids[child]);
        let _ = builder.link(ids[second], ids[child]);

        let parents = builder
            .nodes
            .iter()
            .filter(|node| node.children.contains(&ids[child]))
            .count();
        assert!(parents <= 1);
    }
}
