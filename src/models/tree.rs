//! Parent/child hierarchies loaded as flat `(id, parent_id)` links.
//!
//! Categories and menu items both nest through a nullable parent column. The
//! helpers here operate on an in-memory snapshot of those links, so a single
//! query is enough to answer "which ids sit under this node" or "would this
//! re-parenting introduce a loop".

use std::collections::{HashMap, HashSet};

/// In-memory parent map of a hierarchy
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    parents: HashMap<i64, Option<i64>>,
    children: HashMap<i64, Vec<i64>>,
}

impl Hierarchy {
    pub fn from_links<I>(links: I) -> Self
    where
        I: IntoIterator<Item = (i64, Option<i64>)>,
    {
        let mut hierarchy = Self::default();
        for (id, parent_id) in links {
            hierarchy.parents.insert(id, parent_id);
            if let Some(parent_id) = parent_id {
                hierarchy.children.entry(parent_id).or_default().push(id);
            }
        }
        hierarchy
    }

    pub fn contains(&self, id: i64) -> bool {
        self.parents.contains_key(&id)
    }

    pub fn parent_of(&self, id: i64) -> Option<i64> {
        self.parents.get(&id).copied().flatten()
    }

    pub fn children_of(&self, id: i64) -> &[i64] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The root id followed by every id beneath it, depth first.
    ///
    /// Each id is emitted once even if the stored links contain a loop.
    pub fn self_and_descendants(&self, root: i64) -> Vec<i64> {
        let mut visited = HashSet::new();
        let mut ids = Vec::new();
        self.collect(root, &mut visited, &mut ids);
        ids
    }

    fn collect(&self, id: i64, visited: &mut HashSet<i64>, ids: &mut Vec<i64>) {
        if !visited.insert(id) {
            return;
        }
        ids.push(id);
        for child in self.children_of(id) {
            self.collect(*child, visited, ids);
        }
    }

    /// Whether making `proposed_parent` the parent of `node` would close a loop.
    ///
    /// Walks the parent chain upward from `proposed_parent`; reaching `node`
    /// means `node` would become its own ancestor.
    pub fn creates_cycle(&self, node: i64, proposed_parent: i64) -> bool {
        let mut visited = HashSet::new();
        let mut current = Some(proposed_parent);

        while let Some(id) = current {
            if id == node {
                return true;
            }
            if !visited.insert(id) {
                // Pre-existing loop that does not pass through `node`
                return false;
            }
            current = self.parent_of(id);
        }

        false
    }

    /// Whether walking up from `id` revisits a node before reaching a root.
    pub fn has_looping_ancestry(&self, id: i64) -> bool {
        let mut visited = HashSet::new();
        let mut current = Some(id);
        while let Some(node) = current {
            if !visited.insert(node) {
                return true;
            }
            current = self.parent_of(node);
        }
        false
    }

    /// First id found on a parent loop, if any.
    pub fn find_cycle(&self) -> Option<i64> {
        let mut ids: Vec<i64> = self.parents.keys().copied().collect();
        ids.sort_unstable();

        for start in ids {
            let mut seen = HashSet::new();
            let mut current = Some(start);
            while let Some(id) = current {
                if !seen.insert(id) {
                    return Some(id);
                }
                current = self.parent_of(id);
            }
        }

        None
    }
}
