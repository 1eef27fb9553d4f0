use dispatchx_dsa::{ForestBuilder, ServiceId};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

use crate::assertion::Assertion;
use crate::error::ConfigError;
use crate::service::{Service, ServiceTree};

/// Declarative description of one service, as it appears in configuration.
///
/// Links may be declared from either side: a child naming its `parent`, or a
/// parent listing its `children`. Both may be used for the same pair.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceDefinition {
    pub name: String,
    pub order: Option<i32>,
    pub parent: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub assertions: Vec<Assertion>,
    pub handler: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ServiceDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn child(mut self, child: impl Into<String>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn assert(mut self, assertion: Assertion) -> Self {
        self.assertions.push(assertion);
        self
    }

    pub fn handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Flat registry of service definitions, turned into a validated
/// [`ServiceTree`] exactly once at startup.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    definitions: Vec<ServiceDefinition>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: ServiceDefinition) -> &mut Self {
        self.definitions.push(definition);
        self
    }

    pub fn with(mut self, definition: ServiceDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Wires parents and children, orders siblings and validates assertion
    /// conflicts along every root path.
    ///
    /// ## Ordering
    /// Siblings sort by ascending `order`, unordered services last. Ties keep
    /// discovery order: parent-declared links in definition order first, then
    /// explicit `children` lists.
    pub fn build(self) -> Result<ServiceTree, ConfigError> {
        let mut builder = ForestBuilder::with_capacity(self.definitions.len());
        let mut ids: HashMap<String, ServiceId> = HashMap::with_capacity(self.definitions.len());
        let mut links = Vec::with_capacity(self.definitions.len());

        for definition in self.definitions {
            if ids.contains_key(&definition.name) {
                return Err(ConfigError::DuplicateService(definition.name));
            }
            let ServiceDefinition {
                name,
                order,
                parent,
                children,
                assertions,
                handler,
                attributes,
            } = definition;
            let service = Service {
                assertions,
                handler,
                attributes,
            };
            let id = builder.declare(name.clone(), order, service);
            ids.insert(name.clone(), id);
            links.push((name, id, parent, children));
        }

        let lookup = |name: &str, referenced_by: &str| {
            ids.get(name).copied().ok_or_else(|| ConfigError::UnknownService {
                name: name.to_string(),
                referenced_by: referenced_by.to_string(),
            })
        };

        for (name, id, parent, _) in &links {
            if let Some(parent) = parent {
                builder.link(lookup(parent, name)?, *id)?;
            }
        }
        for (name, id, _, children) in &links {
            for child in children {
                builder.link(*id, lookup(child, name)?)?;
            }
        }

        let tree = ServiceTree::new(builder.build()?);
        validate(&tree)?;

        tracing::info!(
            "ServiceRegistry: built {} services under {} roots",
            tree.len(),
            tree.roots().len()
        );
        tracing::debug!("ServiceRegistry: resolution order\n{}", tree.outline());
        Ok(tree)
    }
}

/// Read-only pass: no assertion may conflict with one inherited from an
/// ancestor.
fn validate(tree: &ServiceTree) -> Result<(), ConfigError> {
    let mut inherited = Vec::new();
    for &root in tree.roots() {
        validate_service(tree, root, &mut inherited)?;
    }
    Ok(())
}

fn validate_service<'a>(
    tree: &'a ServiceTree,
    id: ServiceId,
    inherited: &mut Vec<(ServiceId, &'a Assertion)>,
) -> Result<(), ConfigError> {
    let service = tree.service(id);

    for assertion in service.assertions() {
        for &(owner, ancestor_assertion) in inherited.iter() {
            if assertion.conflicts(ancestor_assertion) {
                return Err(ConfigError::AssertionConflict {
                    service: service.name().to_string(),
                    assertion: assertion.to_string(),
                    ancestor: tree.service(owner).name().to_string(),
                    ancestor_assertion: ancestor_assertion.to_string(),
                    chain: tree.chain(id),
                });
            }
        }
    }

    let mark = inherited.len();
    inherited.extend(service.assertions().iter().map(|assertion| (id, assertion)));
    for &child in tree.children(id) {
        validate_service(tree, child, inherited)?;
    }
    inherited.truncate(mark);
    Ok(())
}
