//! Dependency graph keyed by `groupId:artifactId`.

use crate::types::{ArtifactKey, Declaration, Origin};
use std::collections::HashMap;

/// One surviving declaration per artifact key, in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    entries: Vec<Declaration>,
    index: HashMap<ArtifactKey, usize>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `incoming` into the graph.
    ///
    /// - a management declaration is only inserted when the key is absent;
    /// - a direct declaration always replaces the entry for its key and marks
    ///   it direct. Fields it leaves out (version, scope, optional) are taken
    ///   from the entry it replaces.
    ///
    /// A replaced entry keeps its position.
    pub fn insert(&mut self, incoming: Declaration) {
        let Some(&slot) = self.index.get(&incoming.key) else {
            self.index.insert(incoming.key.clone(), self.entries.len());
            self.entries.push(incoming);
            return;
        };

        if incoming.origin == Origin::Management {
            return;
        }

        let existing = &mut self.entries[slot];
        let merged = Declaration {
            version: incoming.version.or_else(|| existing.version.take()),
            scope: incoming.scope.or(existing.scope),
            optional: incoming.optional.or(existing.optional),
            origin: Origin::Direct,
            key: incoming.key,
            source: incoming.source,
        };
        *existing = merged;
    }

    pub fn get(&self, key: &ArtifactKey) -> Option<&Declaration> {
        self.index.get(key).map(|&slot| &self.entries[slot])
    }

    pub fn contains(&self, key: &ArtifactKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
