//! Winged-edge adjacency graph.
//!
//! The graph is rebuilt on demand from a face list and its coincident vertex
//! groups; it is never stored on the mesh. Each perimeter edge of each face
//! becomes one [`WingedEdge`] in an arena, addressed by [`WingId`].
//!
//! # Structure
//!
//! - **next / previous** link the wings of one face into a closed cycle, in
//!   adjacency order (each edge's end index is the next edge's start index)
//! - **opposite** links two wings from different faces that share the same
//!   common edge
//!
//! # Non-manifold edges
//!
//! When three or more faces reference one common edge, the first two faces to
//! register it are paired with each other. Later faces get no opposite, and the
//! common edge is listed by [`WingedEdgeGraph::non_manifold_edges`].

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use super::edge::{Edge, EdgeLookup};
use super::face::Face;
use super::index::{FaceId, GroupId, WingId};
use super::shared::SharedVertices;
use crate::error::{MeshError, Result};

/// One perimeter edge of one face, with its neighbours.
#[derive(Debug, Clone, Copy)]
pub struct WingedEdge {
    /// The local and common edge.
    pub edge: EdgeLookup,

    /// The face this wing belongs to.
    pub face: FaceId,

    /// The next wing around the face.
    pub next: WingId,

    /// The previous wing around the face.
    pub previous: WingId,

    /// The wing on the adjacent face sharing this common edge, if any.
    pub opposite: Option<WingId>,
}

/// Arena of winged edges for a set of faces.
#[derive(Debug, Clone, Default)]
pub struct WingedEdgeGraph {
    wings: Vec<WingedEdge>,
    /// First wing of each face that produced at least one wing, in build order.
    face_wings: Vec<(FaceId, WingId)>,
    face_lookup: HashMap<FaceId, WingId>,
    non_manifold: Vec<Edge>,
}

/// Opposite-pairing state for one common edge during a build.
#[derive(Clone, Copy)]
enum Registration {
    Held(WingId),
    Paired,
}

impl WingedEdgeGraph {
    /// Build the graph for every face.
    pub fn build(faces: &[Face], shared: &SharedVertices) -> Result<Self> {
        Self::build_subset(faces, shared, (0..faces.len()).map(FaceId::new))
    }

    /// Build the graph for a selection of faces.
    ///
    /// Only the selected faces get wings, so opposites are only found between
    /// selected faces.
    pub fn build_subset<I>(faces: &[Face], shared: &SharedVertices, selection: I) -> Result<Self>
    where
        I: IntoIterator<Item = FaceId>,
    {
        let lookup = shared.lookup();
        let mut graph = WingedEdgeGraph::default();
        let mut opposites: HashMap<Edge, Registration> = HashMap::new();
        let mut reported: HashSet<Edge> = HashSet::new();

        for fid in selection {
            let face = faces.get(fid.index()).ok_or_else(|| {
                MeshError::invalid_param("face", fid.index(), "face index out of range")
            })?;

            let mut edges = face.edges().to_vec();
            sort_edges_by_adjacency(&mut edges);
            if edges.is_empty() {
                continue;
            }

            let first = graph.wings.len();
            let last = first + edges.len() - 1;

            for (n, local) in edges.into_iter().enumerate() {
                let id = WingId::new(first + n);
                let edge = EdgeLookup::new(local, lookup)?;

                let next = if first + n == last { first } else { first + n + 1 };
                let previous = if n == 0 { last } else { first + n - 1 };

                let mut opposite = None;
                match opposites.entry(edge.common) {
                    Entry::Vacant(slot) => {
                        slot.insert(Registration::Held(id));
                    }
                    Entry::Occupied(mut slot) => match *slot.get() {
                        Registration::Held(held) => {
                            graph.wings[held.index()].opposite = Some(id);
                            opposite = Some(held);
                            slot.insert(Registration::Paired);
                        }
                        Registration::Paired => {
                            if reported.insert(edge.common) {
                                log::warn!(
                                    "common edge {} is shared by more than two faces; {:?} left unpaired",
                                    edge.common,
                                    fid
                                );
                                graph.non_manifold.push(edge.common);
                            }
                        }
                    },
                }

                graph.wings.push(WingedEdge {
                    edge,
                    face: fid,
                    next: WingId::new(next),
                    previous: WingId::new(previous),
                    opposite,
                });
            }

            graph.face_wings.push((fid, WingId::new(first)));
            graph.face_lookup.insert(fid, WingId::new(first));
        }

        log::debug!(
            "built winged-edge graph: {} wings over {} faces, {} non-manifold edges",
            graph.wings.len(),
            graph.face_wings.len(),
            graph.non_manifold.len()
        );

        Ok(graph)
    }

    // ==================== Accessors ====================

    /// Number of wings.
    #[inline]
    pub fn len(&self) -> usize {
        self.wings.len()
    }

    /// Is the graph empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.wings.is_empty()
    }

    /// Get a wing by id.
    #[inline]
    pub fn wing(&self, id: WingId) -> &WingedEdge {
        &self.wings[id.index()]
    }

    /// Get a wing by id, or `None` if the id is out of range.
    pub fn get(&self, id: WingId) -> Option<&WingedEdge> {
        self.wings.get(id.index())
    }

    /// Iterate over all wings with their ids.
    pub fn wings(&self) -> impl Iterator<Item = (WingId, &WingedEdge)> + '_ {
        self.wings
            .iter()
            .enumerate()
            .map(|(i, w)| (WingId::new(i), w))
    }

    /// One wing per face, in build order.
    pub fn first_wings(&self) -> impl Iterator<Item = (FaceId, WingId)> + '_ {
        self.face_wings.iter().copied()
    }

    /// The first wing of a face, if the face is part of the graph.
    pub fn face_wing(&self, face: FaceId) -> Option<WingId> {
        self.face_lookup.get(&face).copied()
    }

    /// Next wing around the face.
    #[inline]
    pub fn next(&self, id: WingId) -> WingId {
        self.wing(id).next
    }

    /// Previous wing around the face.
    #[inline]
    pub fn previous(&self, id: WingId) -> WingId {
        self.wing(id).previous
    }

    /// Opposite wing across the shared edge.
    #[inline]
    pub fn opposite(&self, id: WingId) -> Option<WingId> {
        self.wing(id).opposite
    }

    /// Common edges referenced by more than two faces.
    pub fn non_manifold_edges(&self) -> &[Edge] {
        &self.non_manifold
    }

    /// Wings whose common edge is referenced by no other face.
    pub fn boundary_wings(&self) -> impl Iterator<Item = WingId> + '_ {
        self.wings()
            .filter(|(_, w)| w.opposite.is_none() && !self.non_manifold.contains(&w.edge.common))
            .map(|(id, _)| id)
    }

    // ==================== Traversal ====================

    /// Iterate around the face cycle starting at `start`.
    pub fn cycle(&self, start: WingId) -> WingCycleIter<'_> {
        WingCycleIter {
            graph: self,
            start,
            current: start,
            done: false,
        }
    }

    /// Number of wings in the cycle containing `id`.
    pub fn count(&self, id: WingId) -> usize {
        self.cycle(id).count()
    }

    /// Whichever of `next` or `previous` touches the coincident group `common`.
    pub fn adjacent_edge_with_common_index(&self, id: WingId, common: GroupId) -> Option<WingId> {
        let w = self.wing(id);
        if self.wing(w.next).edge.common.contains(common.index()) {
            Some(w.next)
        } else if self.wing(w.previous).edge.common.contains(common.index()) {
            Some(w.previous)
        } else {
            None
        }
    }

    /// Map every coincident group to the wings that touch it.
    pub fn spokes(&self) -> HashMap<GroupId, Vec<WingId>> {
        let mut spokes: HashMap<GroupId, Vec<WingId>> = HashMap::new();
        for (id, w) in self.wings() {
            spokes.entry(GroupId::new(w.edge.common.a)).or_default().push(id);
            spokes.entry(GroupId::new(w.edge.common.b)).or_default().push(id);
        }
        spokes
    }

    /// Merge two triangle faces into a quad.
    ///
    /// `left` and `right` are any wings of the two faces. Returns the four local
    /// corner indices in loop order when both faces have exactly three edges and
    /// share exactly one common edge; otherwise `None`.
    pub fn make_quad(&self, left: WingId, right: WingId) -> Option<[usize; 4]> {
        if self.count(left) != 3 || self.count(right) != 3 {
            return None;
        }

        let all: Vec<EdgeLookup> = self
            .cycle(left)
            .chain(self.cycle(right))
            .map(|id| self.wing(id).edge)
            .collect();

        let mut dup = [false; 6];
        let mut matches = 0;
        for i in 0..3 {
            if let Some(n) = (3..6).find(|&n| all[i] == all[n]) {
                matches += 1;
                dup[i] = true;
                dup[n] = true;
            }
        }
        if matches != 1 {
            return None;
        }

        let edges: Vec<EdgeLookup> = (0..6).filter(|&i| !dup[i]).map(|i| all[i]).collect();

        // Chain by common index: each edge must start where the previous ended
        let follow = |tail: usize| {
            edges[1..]
                .iter()
                .find(|e| e.common.a == tail)
                .map(|e| (e.local.b, e.common.b))
        };
        let (q2, c2) = follow(edges[0].common.b)?;
        let (q3, _) = follow(c2)?;

        Some([edges[0].local.a, edges[0].local.b, q2, q3])
    }

    // ==================== Validation ====================

    /// Check that next/previous/opposite links are mutually consistent.
    pub fn is_valid(&self) -> bool {
        for (id, w) in self.wings() {
            let (Some(next), Some(prev)) = (self.get(w.next), self.get(w.previous)) else {
                return false;
            };
            if next.previous != id || prev.next != id || next.face != w.face {
                return false;
            }
            if let Some(opp) = w.opposite {
                match self.get(opp) {
                    Some(o) if o.opposite == Some(id) && o.edge == w.edge => {}
                    _ => return false,
                }
            }
        }
        true
    }
}

/// Iterator over the wings of one face cycle.
pub struct WingCycleIter<'a> {
    graph: &'a WingedEdgeGraph,
    start: WingId,
    current: WingId,
    done: bool,
}

impl<'a> Iterator for WingCycleIter<'a> {
    type Item = WingId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;
        self.current = self.graph.next(self.current);

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}

/// Reorder edges so that each edge's `b` equals the next edge's `a`.
///
/// Works in place by repeatedly swapping the next matching edge into position.
/// An edge that only matches by its `b` index is reversed. Edges that cannot be
/// chained (an open or split boundary) keep their relative order at the end.
pub fn sort_edges_by_adjacency(edges: &mut [Edge]) {
    for i in 1..edges.len() {
        let want = edges[i - 1].b;

        if let Some(n) = (i..edges.len()).find(|&n| edges[n].a == want) {
            edges.swap(i, n);
        } else if let Some(n) = (i..edges.len()).find(|&n| edges[n].b == want) {
            edges.swap(i, n);
            edges[i] = edges[i].reversed();
        }
    }
}

/// Order a set of coincident groups into a connected loop along graph edges.
///
/// Considers the wings whose common edge lies entirely inside `common`. Returns
/// `None` unless those edges form a full perimeter (one edge per group).
pub fn sort_common_indices_by_adjacency(
    graph: &WingedEdgeGraph,
    common: &HashSet<GroupId>,
) -> Option<Vec<GroupId>> {
    let inside = |g: usize| common.contains(&GroupId::new(g));

    let mut seen: HashSet<Edge> = HashSet::new();
    let mut matches: Vec<Edge> = graph
        .wings()
        .map(|(_, w)| w.edge.common)
        .filter(|e| inside(e.a) && inside(e.b) && seen.insert(*e))
        .collect();

    if matches.len() != common.len() {
        return None;
    }

    sort_edges_by_adjacency(&mut matches);

    let closed = matches
        .iter()
        .zip(matches.iter().cycle().skip(1))
        .all(|(e, n)| e.b == n.a);
    if !closed {
        return None;
    }

    Some(matches.iter().map(|e| GroupId::new(e.a)).collect())
}
