/*
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Component A: a concurrent disjoint-set structure over a dense, growable
//! index space.
//!
//! Grounded on `lazycc/_mockup.py::UnionFindArray` (`makeUnion`,
//! `makeNewIndex`, `findIndex`, smallest-root tie-break) plus the
//! `finalize`/contiguous-label-promotion operation spec §4.A adds on top of
//! that mockup.

use std::collections::HashMap;
use std::sync::Mutex;

struct Inner {
    /// `parent[i] == i` iff `i` is a root.
    parent: Vec<u32>,
    /// Maps a root index to the final contiguous label allocated for it, the
    /// first time any caller observes that root via `finalize`.
    finalized: HashMap<u32, u32>,
    next_final: u32,
}

impl Inner {
    /// Read-only walk to the root; caller holds the lock. Also performs path
    /// compression, which is sound here because the whole structure is
    /// behind one exclusive lock (spec §4.A / §9: "a compressing `find` with
    /// exclusive locking" is one of the two sanctioned options).
    fn find(&mut self, mut a: u32) -> u32 {
        let mut path = Vec::new();
        while self.parent[a as usize] != a {
            path.push(a);
            a = self.parent[a as usize];
        }
        for node in path {
            self.parent[node as usize] = a;
        }
        a
    }
}

/// A thread-safe union-find structure over `u32` indices.
///
/// All operations take a single internal mutex; per spec §4.A this is
/// acceptable because contention is bounded — most calls happen inside
/// boundary-merge critical sections that chunk locks already serialize.
pub struct UnionFind {
    inner: Mutex<Inner>,
}

impl Default for UnionFind {
    fn default() -> Self {
        Self::new()
    }
}

impl UnionFind {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                // Index 0 is reserved for the background global index (spec
                // §3: `local_label == 0` always maps to global index 0), so
                // it is seeded as its own root up front. Without this, the
                // first chunk ever labeled would be handed global indices
                // starting at 0 and `offset = first_new_index - 1` would
                // underflow.
                parent: vec![0],
                finalized: HashMap::new(),
                next_final: 1,
            }),
        }
    }

    /// Appends one new element whose parent is itself, returning its index.
    pub fn make_new_index(&self) -> u32 {
        let mut inner = self.inner.lock().unwrap();
        let idx = inner.parent.len() as u32;
        inner.parent.push(idx);
        idx
    }

    /// Appends `count` new elements in one critical section, returning the
    /// index of the first. Used by the Chunk Registry (component C) to
    /// allocate a whole chunk's worth of global indices atomically, so the
    /// resulting `offset` is correct even under concurrent labeling of other
    /// chunks.
    pub fn make_new_indices(&self, count: u32) -> u32 {
        let mut inner = self.inner.lock().unwrap();
        let first = inner.parent.len() as u32;
        inner.parent.extend(first..first + count);
        first
    }

    /// Unions the sets containing `a` and `b`. The smaller root wins, which
    /// keeps roots stable across concurrent unions touching the same set.
    pub fn union(&self, a: u32, b: u32) {
        let mut inner = self.inner.lock().unwrap();
        let ra = inner.find(a);
        let rb = inner.find(b);
        if ra == rb {
            return;
        }
        let (small, large) = if ra < rb { (ra, rb) } else { (rb, ra) };
        inner.parent[large as usize] = small;
    }

    /// Returns the current root of `a`'s set.
    pub fn find(&self, a: u32) -> u32 {
        let mut inner = self.inner.lock().unwrap();
        inner.find(a)
    }

    /// Returns the contiguous final label for `find(index)`, allocating the
    /// next label the first time that root is observed. Once any caller has
    /// observed a root's final label it never changes (spec §3 invariant).
    pub fn finalize(&self, index: u32) -> u32 {
        let mut inner = self.inner.lock().unwrap();
        let root = inner.find(index);
        if let Some(&label) = inner.finalized.get(&root) {
            return label;
        }
        let label = inner.next_final;
        inner.next_final += 1;
        inner.finalized.insert(root, label);
        label
    }

    /// The number of final labels allocated so far, i.e. the current `N` in
    /// spec §8 property 6 (`{1..N}` contiguity).
    pub fn num_finalized(&self) -> u32 {
        self.inner.lock().unwrap().next_final - 1
    }
}
