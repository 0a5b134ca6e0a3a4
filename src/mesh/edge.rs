//! Edges between vertex indices.
//!
//! An [`Edge`] is an unordered pair of indices. Depending on context the indices
//! point into the positions array ("local") or into the coincident vertex group
//! array ("common"). [`EdgeLookup`] carries both so that edges from different
//! faces can be compared by topological identity.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Sub};

use super::shared::SharedVertexLookup;
use crate::error::{MeshError, Result};

/// An edge connecting two vertex indices.
///
/// Equality and hashing ignore direction: `Edge::new(1, 2) == Edge::new(2, 1)`.
/// The stored order is kept, though, and carries the winding of the triangle
/// the edge was read from.
#[derive(Debug, Clone, Copy, Eq)]
pub struct Edge {
    /// First index.
    pub a: usize,
    /// Second index.
    pub b: usize,
}

impl Edge {
    /// Create a new edge from two indices.
    #[inline]
    pub fn new(a: usize, b: usize) -> Self {
        Self { a, b }
    }

    /// An edge is valid when it connects two different indices.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.a != self.b
    }

    /// Does this edge touch `index`?
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.a == index || self.b == index
    }

    /// Does this edge share at least one index with `other`?
    #[inline]
    pub fn shares_index(&self, other: &Edge) -> bool {
        self.contains(other.a) || self.contains(other.b)
    }

    /// The same edge with its direction flipped.
    #[inline]
    pub fn reversed(&self) -> Self {
        Self::new(self.b, self.a)
    }

    /// The smaller and larger index, in that order.
    #[inline]
    pub fn sorted(&self) -> (usize, usize) {
        if self.a < self.b {
            (self.a, self.b)
        } else {
            (self.b, self.a)
        }
    }

    /// Compare two local edges by the coincident groups their endpoints belong to.
    ///
    /// Returns an error if any endpoint is missing from `lookup`.
    pub fn equals_with_lookup(&self, other: &Edge, lookup: &SharedVertexLookup) -> Result<bool> {
        let common = |v: usize| {
            lookup
                .get(&v)
                .map(|g| g.index())
                .ok_or(MeshError::MissingCoincidentGroup { vertex: v })
        };
        let (x0, y0) = (common(self.a)?, common(self.b)?);
        let (x1, y1) = (common(other.a)?, common(other.b)?);
        Ok((x0 == x1 && y0 == y1) || (x0 == y1 && y0 == x1))
    }

    /// Shift both indices by a signed offset, or `None` if an index would underflow.
    pub fn checked_offset(&self, offset: isize) -> Option<Self> {
        Some(Self::new(
            self.a.checked_add_signed(offset)?,
            self.b.checked_add_signed(offset)?,
        ))
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        (self.a == other.a && self.b == other.b) || (self.a == other.b && self.b == other.a)
    }
}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let (lo, hi) = self.sorted();
        lo.hash(state);
        hi.hash(state);
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.a, self.b)
    }
}

impl Add<usize> for Edge {
    type Output = Edge;

    fn add(self, rhs: usize) -> Edge {
        Edge::new(self.a + rhs, self.b + rhs)
    }
}

/// # Panics
///
/// Panics in debug builds if `rhs` is larger than either index. Use
/// [`Edge::checked_offset`] when the offset is not known to fit.
impl Sub<usize> for Edge {
    type Output = Edge;

    fn sub(self, rhs: usize) -> Edge {
        Edge::new(self.a - rhs, self.b - rhs)
    }
}

impl From<(usize, usize)> for Edge {
    fn from((a, b): (usize, usize)) -> Self {
        Edge::new(a, b)
    }
}

/// A local edge paired with its common (coincident group) edge.
///
/// Equality and hashing consider only [`EdgeLookup::common`], so two local
/// edges from neighbouring faces that sit on the same positions compare equal.
#[derive(Debug, Clone, Copy)]
pub struct EdgeLookup {
    /// Indices into the positions array.
    pub local: Edge,
    /// Indices into the coincident group array.
    pub common: Edge,
}

impl EdgeLookup {
    /// Resolve a local edge against a shared vertex lookup.
    pub fn new(local: Edge, lookup: &SharedVertexLookup) -> Result<Self> {
        let group = |v: usize| {
            lookup
                .get(&v)
                .map(|g| g.index())
                .ok_or(MeshError::MissingCoincidentGroup { vertex: v })
        };
        Ok(Self {
            local,
            common: Edge::new(group(local.a)?, group(local.b)?),
        })
    }

    /// Resolve a batch of local edges.
    pub fn from_edges<'a, I>(edges: I, lookup: &SharedVertexLookup) -> Result<Vec<Self>>
    where
        I: IntoIterator<Item = &'a Edge>,
    {
        edges
            .into_iter()
            .map(|&e| EdgeLookup::new(e, lookup))
            .collect()
    }
}

impl PartialEq for EdgeLookup {
    fn eq(&self, other: &Self) -> bool {
        self.common == other.common
    }
}

impl Eq for EdgeLookup {}

impl Hash for EdgeLookup {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.common.hash(state);
    }
}

impl fmt::Display for EdgeLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "common: {}, local: {}", self.common, self.local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::GroupId;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::{HashMap, HashSet};

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut h = DefaultHasher::new();
        value.hash(&mut h);
        h.finish()
    }

    #[test]
    fn test_edge_symmetry() {
        for (a, b) in [(0, 1), (3, 7), (100, 2), (65_534, 0)] {
            let e0 = Edge::new(a, b);
            let e1 = Edge::new(b, a);
            assert_eq!(e0, e1);
            assert_eq!(hash_of(&e0), hash_of(&e1));
        }
        assert_ne!(Edge::new(0, 1), Edge::new(0, 2));
    }

    #[test]
    fn test_edge_set_deduplicates_directions() {
        let set: HashSet<Edge> = [Edge::new(0, 1), Edge::new(1, 0), Edge::new(1, 2)]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_edge_validity_and_contains() {
        assert!(Edge::new(0, 1).is_valid());
        assert!(!Edge::new(4, 4).is_valid());

        let e = Edge::new(2, 5);
        assert!(e.contains(2));
        assert!(e.contains(5));
        assert!(!e.contains(3));
        assert!(e.shares_index(&Edge::new(5, 9)));
        assert!(!e.shares_index(&Edge::new(6, 9)));
    }

    #[test]
    fn test_edge_offsets() {
        assert_eq!(Edge::new(0, 1) + 4, Edge::new(4, 5));
        assert_eq!(Edge::new(7, 10) - 4, Edge::new(3, 6));
        assert_eq!(Edge::new(3, 4).checked_offset(-3), Some(Edge::new(0, 1)));
        assert_eq!(Edge::new(3, 4).checked_offset(-4), None);
        assert_eq!(format!("{}", Edge::new(3, 4)), "[3, 4]");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn test_edge_sub_underflow_panics() {
        let _ = Edge::new(3, 4) - 4;
    }

    #[test]
    fn test_edge_lookup_compares_common() {
        // 0 and 2 are coincident, as are 1 and 3
        let lookup: HashMap<usize, GroupId> = [
            (0, GroupId::new(0)),
            (1, GroupId::new(1)),
            (2, GroupId::new(0)),
            (3, GroupId::new(1)),
        ]
        .into_iter()
        .collect();

        let left = EdgeLookup::new(Edge::new(0, 1), &lookup).unwrap();
        let right = EdgeLookup::new(Edge::new(3, 2), &lookup).unwrap();

        assert_ne!(left.local, right.local);
        assert_eq!(left, right);
        assert_eq!(hash_of(&left), hash_of(&right));
        assert!(Edge::new(0, 1).equals_with_lookup(&Edge::new(2, 3), &lookup).unwrap());
    }

    #[test]
    fn test_edge_lookup_missing_group() {
        let lookup: HashMap<usize, GroupId> = [(0, GroupId::new(0))].into_iter().collect();
        let result = EdgeLookup::new(Edge::new(0, 1), &lookup);
        assert!(matches!(result, Err(MeshError::MissingCoincidentGroup { vertex: 1 })));
    }
}
