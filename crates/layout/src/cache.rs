use std::collections::HashMap;

use crate::types::Position;

/// Last known coordinates per node id.
///
/// Outlives individual layout strategies so switching modes keeps the picture
/// stable. Only finite coordinates are ever stored.
#[derive(Debug, Clone, Default)]
pub struct PositionCache {
    positions: HashMap<String, Position>,
    revision: u64,
}

impl PositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Position> {
        self.positions.get(id).copied()
    }

    /// Stores `position`, ignoring non-finite input. Returns whether it was stored.
    pub fn set(&mut self, id: &str, position: Position) -> bool {
        if !position.is_finite() {
            tracing::warn!(id, "refusing non-finite position");
            return false;
        }
        match self.positions.get_mut(id) {
            Some(slot) => *slot = position,
            None => {
                self.positions.insert(id.to_string(), position);
            }
        }
        self.revision = self.revision.wrapping_add(1);
        true
    }

    pub fn remove(&mut self, id: &str) -> Option<Position> {
        let removed = self.positions.remove(id);
        if removed.is_some() {
            self.revision = self.revision.wrapping_add(1);
        }
        removed
    }

    /// Drops entries for ids the predicate rejects.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        let before = self.positions.len();
        self.positions.retain(|id, _| keep(id));
        if self.positions.len() != before {
            self.revision = self.revision.wrapping_add(1);
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Position)> {
        self.positions.iter().map(|(id, p)| (id.as_str(), *p))
    }

    /// Bumped on every write; lets readers skip work when nothing moved.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_finite() {
        let mut cache = PositionCache::new();
        assert!(!cache.set("a", Position::new(f64::NAN, 1.0)));
        assert!(cache.get("a").is_none());
        assert_eq!(cache.revision(), 0);
    }

    #[test]
    fn test_set_and_retain() {
        let mut cache = PositionCache::new();
        cache.set("a", Position::new(1.0, 2.0));
        cache.set("b", Position::new(3.0, 4.0));
        cache.retain(|id| id == "a");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a"), Some(Position::new(1.0, 2.0)));
        assert_eq!(cache.revision(), 3);
    }
}
