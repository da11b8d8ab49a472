use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{PanelError, Result};

use super::PanelHandle;

/// Explicit catalog of panel definitions, filled once at startup.
pub struct PanelRegistry<V, I> {
    panels: BTreeMap<String, Arc<PanelHandle<V, I>>>,
}

impl<V, I> Default for PanelRegistry<V, I> {
    fn default() -> Self {
        Self {
            panels: BTreeMap::new(),
        }
    }
}

impl<V, I> PanelRegistry<V, I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handle under its id; ids are unique.
    pub fn register(&mut self, handle: PanelHandle<V, I>) -> Result<Arc<PanelHandle<V, I>>> {
        let id = handle.id().to_string();
        if self.panels.contains_key(&id) {
            return Err(PanelError::DuplicatePanel(id));
        }
        let handle = Arc::new(handle);
        self.panels.insert(id, Arc::clone(&handle));
        Ok(handle)
    }

    pub fn get(&self, id: &str) -> Option<Arc<PanelHandle<V, I>>> {
        self.panels.get(id).cloned()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.panels.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }
}
