//! Per-node resolution cache.
//!
//! Remembers which resolver in a chain accepted an access, keyed by the AST
//! node and the runtime shape of the access. Each entry is stamped with the
//! generation of the chain it was recorded against; an entry from any other
//! generation is stale and is overwritten by the next scan, so the cache holds
//! at most one entry per access shape however many contexts evaluate the
//! expression. A cached index is only a hint: the chain re-checks that
//! resolver and falls back to a full ordered scan if it declines.

use std::collections::HashMap;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::parser::ast::NodeId;
use crate::runner::ds::value::ValueType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    Read,
    Write,
    Call,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub node: NodeId,
    pub access: AccessKind,
    pub target: ValueType,
    /// Argument types, for method calls.
    pub arg_types: Option<Vec<ValueType>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheEntry {
    generation: Uuid,
    index: usize,
}

#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The remembered resolver index, if it was recorded against `generation`.
    pub fn lookup(&self, key: &CacheKey, generation: Uuid) -> Option<usize> {
        self.entries
            .read()
            .get(key)
            .filter(|entry| entry.generation == generation)
            .map(|entry| entry.index)
    }

    pub fn record(&self, key: CacheKey, generation: Uuid, index: usize) {
        let entry = CacheEntry { generation, index };
        let mut entries = self.entries.write();
        if entries.get(&key) != Some(&entry) {
            entries.insert(key, entry);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(node: u32) -> CacheKey {
        CacheKey {
            node: NodeId(node),
            access: AccessKind::Read,
            target: ValueType::object("Person"),
            arg_types: None,
        }
    }

    #[test]
    fn test_entries_are_scoped_to_a_generation() {
        let cache = ResolutionCache::new();
        let g1 = Uuid::new_v4();
        let g2 = Uuid::new_v4();
        cache.record(key(0), g1, 2);
        assert_eq!(cache.lookup(&key(0), g1), Some(2));
        assert_eq!(cache.lookup(&key(0), g2), None);
        assert_eq!(cache.lookup(&key(1), g1), None);
        cache.record(key(0), g1, 1);
        assert_eq!(cache.lookup(&key(0), g1), Some(1));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_new_generation_replaces_stale_entry() {
        let cache = ResolutionCache::new();
        let mut generation = Uuid::new_v4();
        cache.record(key(0), generation, 0);
        for _ in 0..100 {
            generation = Uuid::new_v4();
            assert_eq!(cache.lookup(&key(0), generation), None);
            cache.record(key(0), generation, 3);
        }
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup(&key(0), generation), Some(3));
    }
}
