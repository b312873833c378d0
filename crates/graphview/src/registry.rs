use std::collections::{HashMap, HashSet};

use graphlens_layout::Position;

/// Per-node render state that overlays anchor to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeHandle {
    /// Screen position at the last render, `None` while culled.
    pub anchor: Option<Position>,
    pub renders: u64,
}

/// Explicitly owned map of mounted per-node handles.
///
/// Entries live from `register` to `unregister`; nothing is global.
#[derive(Debug, Clone)]
pub struct NodeRegistry<H = NodeHandle> {
    handles: HashMap<String, H>,
}

impl<H> Default for NodeRegistry<H> {
    fn default() -> Self {
        Self {
            handles: HashMap::new(),
        }
    }
}

impl<H> NodeRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts `handle` for `id`, returning the one it replaced.
    pub fn register(&mut self, id: impl Into<String>, handle: H) -> Option<H> {
        self.handles.insert(id.into(), handle)
    }

    pub fn unregister(&mut self, id: &str) -> Option<H> {
        self.handles.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&H> {
        self.handles.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut H> {
        self.handles.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handles.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut H)> {
        self.handles.iter_mut().map(|(id, h)| (id.as_str(), h))
    }

    /// Unregisters ids no longer present and registers new ones with `make`.
    pub fn sync<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>, mut make: impl FnMut(&str) -> H) {
        let wanted: HashSet<&str> = ids.into_iter().collect();
        let before = self.handles.len();
        self.handles.retain(|id, _| wanted.contains(id.as_str()));
        let removed = before - self.handles.len();
        let mut added = 0;
        for id in wanted {
            if !self.handles.contains_key(id) {
                self.handles.insert(id.to_string(), make(id));
                added += 1;
            }
        }
        if added > 0 || removed > 0 {
            tracing::debug!(added, removed, total = self.handles.len(), "node registry synced");
        }
    }
}
