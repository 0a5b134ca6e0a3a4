//! Coincident vertex groups.
//!
//! Faces never share vertex slots, so a cube has 24 vertices rather than 8.
//! [`SharedVertices`] records which of those slots sit on the same point: each
//! [`SharedVertex`] is one group, and together the groups partition the vertex
//! index range `0..vertex_count`.
//!
//! The inverse map (vertex index to group) is memoized. Every mutator clears it
//! and the next call to [`SharedVertices::lookup`] rebuilds it.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::ops::Index;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use super::index::GroupId;
use crate::error::{MeshError, Result};

/// Maps a vertex index to the coincident group that contains it.
pub type SharedVertexLookup = HashMap<usize, GroupId>;

/// Default quantization factor used when welding by position.
///
/// Positions are multiplied by this value and truncated, so two vertices closer
/// than roughly `1 / resolution` along every axis usually land in one group.
pub const DEFAULT_WELD_RESOLUTION: f64 = 1000.0;

/// Options for welding vertices by position.
#[derive(Debug, Clone, Copy)]
pub struct WeldOptions {
    /// Quantization factor applied to each coordinate before hashing.
    pub resolution: f64,
}

impl Default for WeldOptions {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_WELD_RESOLUTION,
        }
    }
}

impl WeldOptions {
    /// Create options with the default resolution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the quantization factor.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(MeshError::invalid_param(
                "resolution",
                self.resolution,
                "must be finite and positive",
            ));
        }
        Ok(())
    }
}

/// A set of vertex indices that occupy the same position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SharedVertex {
    vertices: Vec<usize>,
}

impl SharedVertex {
    /// Create a group from vertex indices.
    pub fn new(vertices: Vec<usize>) -> Self {
        Self { vertices }
    }

    /// The member vertex indices.
    #[inline]
    pub fn vertices(&self) -> &[usize] {
        &self.vertices
    }

    /// Number of members.
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Is the group empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Is `vertex` a member?
    pub fn contains(&self, vertex: usize) -> bool {
        self.vertices.contains(&vertex)
    }

    /// Iterate over the members.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.vertices.iter().copied()
    }
}

impl From<Vec<usize>> for SharedVertex {
    fn from(vertices: Vec<usize>) -> Self {
        Self::new(vertices)
    }
}

/// All coincident groups of a mesh plus the memoized vertex-to-group lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SharedVertices {
    groups: Vec<SharedVertex>,
    #[serde(skip)]
    lookup: OnceCell<SharedVertexLookup>,
}

impl SharedVertices {
    /// Wrap an explicit list of groups.
    ///
    /// The groups are not checked here; call [`SharedVertices::validate`] to
    /// verify that they partition the vertex range.
    pub fn new(groups: Vec<SharedVertex>) -> Self {
        Self {
            groups,
            lookup: OnceCell::new(),
        }
    }

    /// One singleton group per vertex.
    pub fn singletons(vertex_count: usize) -> Self {
        Self::new((0..vertex_count).map(|v| SharedVertex::new(vec![v])).collect())
    }

    /// Group vertices whose quantized positions are identical.
    ///
    /// Each coordinate is multiplied by `resolution` and truncated toward zero.
    /// Groups are ordered by the first vertex that lands in them. Fails if
    /// `resolution` is not a finite positive number.
    ///
    /// # Example
    ///
    /// ```
    /// use editmesh::mesh::SharedVertices;
    /// use editmesh::nalgebra::Point3;
    ///
    /// let positions = [
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    /// ];
    /// let shared = SharedVertices::from_positions(&positions, 1000.0).unwrap();
    /// assert_eq!(shared.len(), 2);
    /// assert_eq!(shared.coincident_with(1).unwrap(), &[0, 1]);
    /// ```
    pub fn from_positions(positions: &[Point3<f64>], resolution: f64) -> Result<Self> {
        WeldOptions::new().with_resolution(resolution).validate()?;

        let mut keyed: HashMap<[i64; 3], usize> = HashMap::with_capacity(positions.len());
        let mut groups: Vec<SharedVertex> = Vec::new();

        for (v, p) in positions.iter().enumerate() {
            let key = [
                (p.x * resolution) as i64,
                (p.y * resolution) as i64,
                (p.z * resolution) as i64,
            ];
            let g = *keyed.entry(key).or_insert_with(|| {
                groups.push(SharedVertex::default());
                groups.len() - 1
            });
            groups[g].vertices.push(v);
        }

        log::debug!(
            "welded {} vertices into {} coincident groups (resolution {})",
            positions.len(),
            groups.len(),
            resolution
        );

        Ok(Self::new(groups))
    }

    /// Rebuild groups from a per-vertex group tag.
    ///
    /// `tags[v]` names the group of vertex `v`. Vertices tagged with the same
    /// value form one group; untagged vertices (`None`) get a group each.
    /// Groups are ordered by the first vertex that carries their tag.
    pub fn from_lookup(tags: &[Option<usize>]) -> Self {
        let mut by_tag: HashMap<usize, usize> = HashMap::new();
        let mut groups: Vec<SharedVertex> = Vec::new();

        for (v, tag) in tags.iter().enumerate() {
            match tag {
                Some(t) => {
                    let g = *by_tag.entry(*t).or_insert_with(|| {
                        groups.push(SharedVertex::default());
                        groups.len() - 1
                    });
                    groups[g].vertices.push(v);
                }
                None => groups.push(SharedVertex::new(vec![v])),
            }
        }

        Self::new(groups)
    }

    /// The groups.
    #[inline]
    pub fn groups(&self) -> &[SharedVertex] {
        &self.groups
    }

    /// Number of groups.
    #[inline]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Are there no groups?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterate over the groups with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (GroupId, &SharedVertex)> + '_ {
        self.groups
            .iter()
            .enumerate()
            .map(|(i, g)| (GroupId::new(i), g))
    }

    /// Total number of vertex indices across all groups.
    pub fn vertex_count(&self) -> usize {
        self.groups.iter().map(SharedVertex::len).sum()
    }

    /// The vertex-to-group map, rebuilt on first access after a mutation.
    ///
    /// If a vertex is listed in more than one group, the first group wins.
    pub fn lookup(&self) -> &SharedVertexLookup {
        self.lookup.get_or_init(|| {
            let mut map = HashMap::with_capacity(self.vertex_count());
            for (g, group) in self.groups.iter().enumerate() {
                for v in group.iter() {
                    map.entry(v).or_insert(GroupId::new(g));
                }
            }
            map
        })
    }

    /// Group containing `vertex`.
    pub fn group_of(&self, vertex: usize) -> Result<GroupId> {
        self.lookup()
            .get(&vertex)
            .copied()
            .ok_or(MeshError::MissingCoincidentGroup { vertex })
    }

    /// Group by id.
    pub fn group(&self, id: GroupId) -> Result<&SharedVertex> {
        self.groups.get(id.index()).ok_or(MeshError::GroupOutOfRange {
            group: id.index(),
            count: self.groups.len(),
        })
    }

    /// All vertices coincident with `vertex`, including itself.
    pub fn coincident_with(&self, vertex: usize) -> Result<&[usize]> {
        let g = self.group_of(vertex)?;
        Ok(self.group(g)?.vertices())
    }

    /// Append a group and return its id.
    pub fn push(&mut self, group: SharedVertex) -> GroupId {
        self.groups.push(group);
        self.invalidate();
        GroupId::new(self.groups.len() - 1)
    }

    /// Force `vertices` into a single new group.
    ///
    /// The vertices are removed from whatever groups held them, groups left
    /// empty are dropped, and the new group is appended at the end. Ids of
    /// groups after a dropped one shift down. An empty slice changes nothing
    /// and returns `None`.
    pub fn set_coincident(&mut self, vertices: &[usize]) -> Option<GroupId> {
        if vertices.is_empty() {
            return None;
        }

        let mut merged: Vec<usize> = Vec::with_capacity(vertices.len());
        for &v in vertices {
            if !merged.contains(&v) {
                merged.push(v);
            }
        }

        for group in &mut self.groups {
            group.vertices.retain(|v| !merged.contains(v));
        }
        self.groups.retain(|g| !g.is_empty());
        Some(self.push(SharedVertex::new(merged)))
    }

    /// Delete vertices and compact the remaining indices.
    ///
    /// Every remaining index is lowered by the number of removed indices below
    /// it, matching a positions array with those entries removed. Groups left
    /// empty are dropped.
    pub fn remove_and_shift(&mut self, removed: &[usize]) {
        let mut removed = removed.to_vec();
        removed.sort_unstable();
        removed.dedup();

        for group in &mut self.groups {
            group.vertices.retain(|v| removed.binary_search(v).is_err());
            for v in group.vertices.iter_mut() {
                let below = removed.partition_point(|&r| r < *v);
                *v -= below;
            }
        }
        self.groups.retain(|g| !g.is_empty());
        self.invalidate();
    }

    /// Add `offset` to every vertex index.
    ///
    /// Fails without modifying the groups if an index would underflow.
    pub fn shift_indices(&mut self, offset: isize) -> Result<()> {
        let any_underflow = self
            .groups
            .iter()
            .flat_map(SharedVertex::iter)
            .any(|v| v.checked_add_signed(offset).is_none());
        if any_underflow {
            return Err(MeshError::invalid_param("offset", offset, "index would underflow"));
        }

        for group in &mut self.groups {
            for v in group.vertices.iter_mut() {
                *v = v.wrapping_add_signed(offset);
            }
        }
        self.invalidate();
        Ok(())
    }

    /// Append another set of groups, shifting their indices by `offset`.
    pub fn append(&mut self, other: &SharedVertices, offset: usize) {
        self.groups.extend(
            other
                .groups
                .iter()
                .map(|g| SharedVertex::new(g.iter().map(|v| v + offset).collect())),
        );
        self.invalidate();
    }

    /// Check that the groups partition `0..vertex_count` with no empty group.
    pub fn validate(&self, vertex_count: usize) -> Result<()> {
        let mut owner: Vec<Option<usize>> = vec![None; vertex_count];

        for (g, group) in self.groups.iter().enumerate() {
            if group.is_empty() {
                return Err(MeshError::invalid_param("shared vertex group", g, "group is empty"));
            }
            for v in group.iter() {
                let slot = owner.get_mut(v).ok_or_else(|| {
                    MeshError::invalid_param(
                        "shared vertex",
                        v,
                        "index is outside of the positions array",
                    )
                })?;
                if let Some(first) = *slot {
                    return Err(MeshError::OverlappingGroups {
                        vertex: v,
                        first,
                        second: g,
                    });
                }
                *slot = Some(g);
            }
        }

        match owner.iter().position(Option::is_none) {
            Some(vertex) => Err(MeshError::MissingCoincidentGroup { vertex }),
            None => Ok(()),
        }
    }

    /// Drop the memoized lookup.
    pub fn invalidate(&mut self) {
        self.lookup.take();
    }
}

impl Index<GroupId> for SharedVertices {
    type Output = SharedVertex;

    fn index(&self, id: GroupId) -> &SharedVertex {
        &self.groups[id.index()]
    }
}

impl PartialEq for SharedVertices {
    fn eq(&self, other: &Self) -> bool {
        self.groups == other.groups
    }
}

impl From<Vec<Vec<usize>>> for SharedVertices {
    fn from(groups: Vec<Vec<usize>>) -> Self {
        Self::new(groups.into_iter().map(SharedVertex::new).collect())
    }
}
