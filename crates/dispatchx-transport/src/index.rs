use dispatchx_core::{Resource, ResourcePath, ResourceStore, RetrieveError};

/// Finds the default document of a collection from an ordered list of
/// candidate names. Only non-collection children qualify.
#[derive(Debug, Clone)]
pub struct IndexFileResolver {
    names: Vec<String>,
}

impl IndexFileResolver {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Index file of `collection`: the first candidate name present among
    /// its children. Missing or locked collections have none.
    pub fn index_of(
        &self,
        store: &dyn ResourceStore,
        token: Option<&str>,
        collection: &ResourcePath,
    ) -> Result<Option<ResourcePath>, RetrieveError> {
        let children = match store.list_children(token, collection) {
            Ok(children) => children,
            Err(e) if e.is_absent() => return Ok(None),
            Err(e) => return Err(e),
        };

        let found = self.names.iter().find_map(|name| {
            children
                .iter()
                .find(|child| !child.is_collection() && child.uri().name() == name)
                .map(|child| child.uri().clone())
        });
        Ok(found)
    }

    /// Whether `resource` is the index file of its parent collection.
    pub fn is_index_file(
        &self,
        store: &dyn ResourceStore,
        token: Option<&str>,
        resource: &Resource,
    ) -> Result<bool, RetrieveError> {
        if resource.is_collection() || !self.names.iter().any(|name| name == resource.uri().name()) {
            return Ok(false);
        }
        let Some(parent) = resource.uri().parent() else {
            return Ok(false);
        };
        Ok(self.index_of(store, token, &parent)?.as_ref() == Some(resource.uri()))
    }
}
