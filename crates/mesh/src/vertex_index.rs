use std::collections::HashMap;
use std::hash::Hash;

/// Assigns stable indices to vertex attribute tuples.
///
/// Formats that store faces as indices into a shared vertex list need to
/// collapse identical corners into one entry. As a simple example, consider a
/// quad split into two triangles:
///
///    0-------1
///    |\      |
///    | \     |
///    |  \    |
///    |   \   |
///    |    \  |
///    |     \ |
///    3-------2
///
/// The two triangles have 6 corners but only 4 distinct positions. Feeding
/// each corner through `insert` yields the indices `[0, 2, 3]` and `[0, 1, 2]`
/// and leaves 4 entries in the index.
///
/// Keys are compared with exact equality. For float attributes use the
/// `OrderedVec*` aliases, which never match values that differ by any amount.
#[derive(Debug, Clone)]
pub struct VertexIndex<K> {
    lookup: HashMap<K, u32>,
}

impl<K: Eq + Hash> VertexIndex<K> {
    pub fn new() -> Self {
        Self {
            lookup: HashMap::new(),
        }
    }

    /// Returns the index of `key`, appending it if it has not been seen yet.
    pub fn insert(&mut self, key: K) -> u32 {
        self.insert_full(key).0
    }

    /// Like `insert`, but also reports whether the key was newly appended.
    pub fn insert_full(&mut self, key: K) -> (u32, bool) {
        if let Some(&index) = self.lookup.get(&key) {
            return (index, false);
        }
        let index = self.lookup.len() as u32;
        self.lookup.insert(key, index);
        (index, true)
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}

impl<K: Eq + Hash> Default for VertexIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}
