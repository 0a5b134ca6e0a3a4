//! Polygon faces stored as triangle lists.
//!
//! A [`Face`] owns a flat list of triangle indices together with its material
//! slot, smoothing group and UV projection settings. Vertices referenced by a
//! face are assumed to be unique to it; positional coincidence with other faces
//! is tracked separately by [`SharedVertices`](super::SharedVertices).
//!
//! Two values are derived from the triangle list and memoized: the distinct
//! vertex indices and the perimeter edges. Every mutator invalidates them, and
//! the next read rebuilds them.

use std::cell::OnceCell;
use std::collections::HashSet;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::edge::Edge;
use crate::algo::smoothing::SMOOTHING_GROUP_NONE;
use crate::error::{MeshError, Result};

/// How auto-projected UVs fill the unit square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Fill {
    /// Scale uniformly to fit.
    Fit,
    /// Keep world-size UVs.
    #[default]
    Tile,
    /// Scale each axis independently to fill.
    Stretch,
}

/// Where projected UVs are anchored before the offset is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Anchor {
    /// Upper-left corner.
    UpperLeft,
    /// Upper edge, centered.
    UpperCenter,
    /// Upper-right corner.
    UpperRight,
    /// Left edge, centered.
    MiddleLeft,
    /// Center.
    MiddleCenter,
    /// Right edge, centered.
    MiddleRight,
    /// Lower-left corner.
    LowerLeft,
    /// Lower edge, centered.
    LowerCenter,
    /// Lower-right corner.
    LowerRight,
    /// No anchoring.
    #[default]
    None,
}

/// Planar UV projection parameters for a face.
///
/// These are only consulted when a face is not [`Face::manual_uv`]; the UV
/// projection itself lives in the host's UV tooling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoUnwrapSettings {
    /// Project using world-space positions instead of local ones.
    pub use_world_space: bool,
    /// Invert the U coordinate.
    pub flip_u: bool,
    /// Invert the V coordinate.
    pub flip_v: bool,
    /// Swap U and V.
    pub swap_uv: bool,
    /// Fill mode.
    pub fill: Fill,
    /// Scale applied to U and V.
    pub scale: Vector2<f64>,
    /// Offset applied after scaling and rotation.
    pub offset: Vector2<f64>,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Anchor point.
    pub anchor: Anchor,
}

impl Default for AutoUnwrapSettings {
    fn default() -> Self {
        Self {
            use_world_space: false,
            flip_u: false,
            flip_v: false,
            swap_uv: false,
            fill: Fill::Tile,
            scale: Vector2::new(1.0, 1.0),
            offset: Vector2::zeros(),
            rotation: 0.0,
            anchor: Anchor::None,
        }
    }
}

/// Memoized values derived from a face's triangle list.
///
/// An empty cell is the dirty state.
#[derive(Debug, Clone, Default)]
struct FaceCache {
    distinct: OnceCell<Vec<usize>>,
    edges: OnceCell<Vec<Edge>>,
}

impl FaceCache {
    fn invalidate(&mut self) {
        self.distinct.take();
        self.edges.take();
    }
}

fn no_texture_group() -> i32 {
    -1
}

/// A polygon made of one or more triangles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Face {
    indices: Vec<usize>,

    /// Material slot this face renders with.
    #[serde(default)]
    pub submesh_index: usize,

    /// Smoothing group; see [`crate::algo::smoothing`] for the reserved bands.
    #[serde(default)]
    pub smoothing_group: i32,

    /// UV projection settings.
    #[serde(default)]
    pub uv: AutoUnwrapSettings,

    /// UVs were authored by hand and must not be re-projected.
    #[serde(default)]
    pub manual_uv: bool,

    /// Faces sharing a positive texture group are projected together.
    #[serde(default = "no_texture_group")]
    pub texture_group: i32,

    /// UV editor element group.
    #[serde(default)]
    pub element_group: i32,

    #[serde(skip)]
    cache: FaceCache,
}

impl Face {
    /// Create a face from a triangle list with default attributes.
    ///
    /// # Example
    ///
    /// ```
    /// use editmesh::mesh::Face;
    ///
    /// let face = Face::new(vec![0, 1, 2, 1, 3, 2]).unwrap();
    /// assert!(face.is_quad());
    /// assert_eq!(face.distinct_indices(), &[0, 1, 2, 3]);
    /// ```
    pub fn new(indices: Vec<usize>) -> Result<Self> {
        check_index_count(&indices)?;
        Ok(Self {
            indices,
            submesh_index: 0,
            smoothing_group: SMOOTHING_GROUP_NONE,
            uv: AutoUnwrapSettings::default(),
            manual_uv: false,
            texture_group: no_texture_group(),
            element_group: 0,
            cache: FaceCache::default(),
        })
    }

    /// Set the material slot.
    pub fn with_submesh(mut self, submesh_index: usize) -> Self {
        self.submesh_index = submesh_index;
        self
    }

    /// Set the smoothing group.
    pub fn with_smoothing_group(mut self, smoothing_group: i32) -> Self {
        self.smoothing_group = smoothing_group;
        self
    }

    /// Set the UV projection settings.
    pub fn with_uv(mut self, uv: AutoUnwrapSettings) -> Self {
        self.uv = uv;
        self
    }

    /// The triangle indices that make up this face.
    #[inline]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Replace the triangle list.
    ///
    /// Fails with [`MeshError::InvalidIndexCount`] if the length is not a
    /// multiple of three; the face is left unchanged in that case.
    pub fn set_indices(&mut self, indices: &[usize]) -> Result<()> {
        check_index_count(indices)?;
        self.indices = indices.to_vec();
        self.cache.invalidate();
        Ok(())
    }

    /// Number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate over the triangles as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// A face is valid if it holds at least one triangle.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.indices.len() > 2
    }

    /// The triangle indices with duplicates removed, in first-seen order.
    pub fn distinct_indices(&self) -> &[usize] {
        self.cache.distinct.get_or_init(|| {
            let mut seen = HashSet::with_capacity(self.indices.len());
            self.indices.iter().copied().filter(|i| seen.insert(*i)).collect()
        })
    }

    /// The perimeter edges of this face.
    ///
    /// Edges shared by two of the face's own triangles are interior diagonals and
    /// are left out. Each perimeter edge keeps the direction of the triangle it
    /// came from, so for consistently wound faces the edges run head to tail.
    pub fn edges(&self) -> &[Edge] {
        self.cache.edges.get_or_init(|| perimeter_edges(&self.indices))
    }

    /// Does this face form a single quad?
    #[inline]
    pub fn is_quad(&self) -> bool {
        self.edges().len() == 4
    }

    /// Order the four corners of a quad face into a connected loop.
    ///
    /// Returns [`MeshError::NotAQuad`] if the face does not have exactly four
    /// perimeter edges. Check [`Face::is_quad`] first.
    pub fn to_quad(&self) -> Result<[usize; 4]> {
        let edges = self.edges();
        if edges.len() != 4 {
            return Err(MeshError::NotAQuad { edges: edges.len() });
        }

        let mut quad = [edges[0].a, edges[0].b, 0, 0];
        let mut used = [true, false, false, false];

        for corner in 2..4 {
            let tail = quad[corner - 1];
            let (slot, next) = (1..4)
                .filter(|&i| !used[i])
                .find_map(|i| {
                    let e = edges[i];
                    if e.a == tail {
                        Some((i, e.b))
                    } else if e.b == tail {
                        Some((i, e.a))
                    } else {
                        None
                    }
                })
                .ok_or(MeshError::NotAQuad { edges: edges.len() })?;
            used[slot] = true;
            quad[corner] = next;
        }

        Ok(quad)
    }

    /// A copy of the triangle list.
    pub fn to_triangles(&self) -> Vec<usize> {
        self.indices.clone()
    }

    /// Is the triangle `(a, b, c)`, with this exact winding, part of the face?
    pub fn contains_triangle(&self, a: usize, b: usize, c: usize) -> bool {
        self.triangles().any(|t| t == [a, b, c])
    }

    /// Add `offset` to every index.
    ///
    /// Cached values are shifted along with the triangle list. Fails without
    /// modifying the face if an index would become negative.
    pub fn shift_indices(&mut self, offset: isize) -> Result<()> {
        let shifted = self
            .indices
            .iter()
            .map(|&i| i.checked_add_signed(offset))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| MeshError::invalid_param("offset", offset, "index would underflow"))?;
        self.indices = shifted;

        if let Some(distinct) = self.cache.distinct.get_mut() {
            for i in distinct.iter_mut() {
                *i = i.wrapping_add_signed(offset);
            }
        }
        if let Some(edges) = self.cache.edges.get_mut() {
            for e in edges.iter_mut() {
                e.a = e.a.wrapping_add_signed(offset);
                e.b = e.b.wrapping_add_signed(offset);
            }
        }
        Ok(())
    }

    /// Shift indices so that the smallest becomes zero.
    pub fn shift_indices_to_zero(&mut self) {
        let Some(&min) = self.indices.iter().min() else {
            return;
        };
        for i in self.indices.iter_mut() {
            *i -= min;
        }
        if let Some(distinct) = self.cache.distinct.get_mut() {
            for i in distinct.iter_mut() {
                *i -= min;
            }
        }
        if let Some(edges) = self.cache.edges.get_mut() {
            for e in edges.iter_mut() {
                e.a -= min;
                e.b -= min;
            }
        }
    }

    /// Reverse the winding order, flipping the face normal.
    pub fn reverse(&mut self) {
        self.indices.reverse();
        self.cache.invalidate();
    }
}

impl PartialEq for Face {
    fn eq(&self, other: &Self) -> bool {
        self.indices == other.indices
            && self.submesh_index == other.submesh_index
            && self.smoothing_group == other.smoothing_group
            && self.uv == other.uv
            && self.manual_uv == other.manual_uv
            && self.texture_group == other.texture_group
            && self.element_group == other.element_group
    }
}

/// Check that every face holds whole triangles pointing into a positions array
/// of `vertex_count`.
pub(crate) fn check_face_indices(faces: &[Face], vertex_count: usize) -> Result<()> {
    for (f, face) in faces.iter().enumerate() {
        check_index_count(&face.indices)?;
        if let Some(&vertex) = face.indices.iter().find(|&&v| v >= vertex_count) {
            return Err(MeshError::InvalidVertexIndex { face: f, vertex });
        }
    }
    Ok(())
}

fn check_index_count(indices: &[usize]) -> Result<()> {
    if indices.len() % 3 != 0 {
        return Err(MeshError::InvalidIndexCount { len: indices.len() });
    }
    Ok(())
}

/// Edges that occur in exactly one triangle of the list.
///
/// The first insertion records an edge; a second insertion marks it as a
/// diagonal. The result keeps first-insertion order.
fn perimeter_edges(indices: &[usize]) -> Vec<Edge> {
    let mut inserted: Vec<Edge> = Vec::with_capacity(indices.len());
    let mut seen: HashSet<Edge> = HashSet::with_capacity(indices.len());
    let mut duplicates: HashSet<Edge> = HashSet::new();

    for t in indices.chunks_exact(3) {
        for e in [Edge::new(t[0], t[1]), Edge::new(t[1], t[2]), Edge::new(t[2], t[0])] {
            if seen.insert(e) {
                inserted.push(e);
            } else {
                duplicates.insert(e);
            }
        }
    }

    inserted.retain(|e| !duplicates.contains(e));
    inserted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_set(face: &Face) -> HashSet<Edge> {
        face.edges().iter().copied().collect()
    }

    #[test]
    fn test_rejects_bad_index_count() {
        assert!(matches!(
            Face::new(vec![0, 1]),
            Err(MeshError::InvalidIndexCount { len: 2 })
        ));

        let mut face = Face::new(vec![0, 1, 2]).unwrap();
        assert!(face.set_indices(&[0, 1, 2, 3]).is_err());
        assert_eq!(face.indices(), &[0, 1, 2]);
    }

    #[test]
    fn test_single_triangle() {
        let face = Face::new(vec![0, 1, 2]).unwrap();
        assert!(face.is_valid());
        assert_eq!(face.triangle_count(), 1);
        assert_eq!(face.edges().len(), 3);
        assert!(!face.is_quad());
        assert!(matches!(face.to_quad(), Err(MeshError::NotAQuad { edges: 3 })));
    }

    #[test]
    fn test_quad_perimeter_excludes_diagonal() {
        let face = Face::new(vec![0, 1, 2, 1, 3, 2]).unwrap();
        let edges = edge_set(&face);
        assert_eq!(edges.len(), 4);
        assert!(!edges.contains(&Edge::new(1, 2)));
        for e in [(0, 1), (1, 3), (3, 2), (2, 0)] {
            assert!(edges.contains(&Edge::from(e)));
        }
    }

    #[test]
    fn test_quad_round_trip() {
        let face = Face::new(vec![0, 1, 2, 1, 3, 2]).unwrap();
        assert!(face.is_quad());

        let quad = face.to_quad().unwrap();
        let corners: HashSet<usize> = quad.iter().copied().collect();
        assert_eq!(corners, [0, 1, 2, 3].into_iter().collect());

        // Consecutive corners (cyclically) must be perimeter edges
        let edges = edge_set(&face);
        for i in 0..4 {
            assert!(edges.contains(&Edge::new(quad[i], quad[(i + 1) % 4])));
        }
    }

    #[test]
    fn test_distinct_indices() {
        let face = Face::new(vec![0, 1, 2, 1, 3, 2]).unwrap();
        assert_eq!(face.distinct_indices(), &[0, 1, 2, 3]);
        assert!(face.distinct_indices().len() <= face.indices().len());
    }

    #[test]
    fn test_permuted_triangles_same_perimeter() {
        let a = Face::new(vec![0, 1, 2, 1, 3, 2]).unwrap();
        let mut b = Face::new(vec![0, 1, 2]).unwrap();
        b.set_indices(&[1, 3, 2, 0, 1, 2]).unwrap();
        assert_eq!(edge_set(&a), edge_set(&b));
    }

    #[test]
    fn test_set_indices_invalidates_cache() {
        let mut face = Face::new(vec![0, 1, 2]).unwrap();
        assert_eq!(face.edges().len(), 3);
        assert_eq!(face.distinct_indices().len(), 3);

        face.set_indices(&[4, 5, 6, 5, 7, 6]).unwrap();
        assert_eq!(face.edges().len(), 4);
        assert_eq!(face.distinct_indices(), &[4, 5, 6, 7]);
    }

    #[test]
    fn test_shift_indices_shifts_cache() {
        let mut face = Face::new(vec![0, 1, 2, 1, 3, 2]).unwrap();
        let before = edge_set(&face);
        face.shift_indices(10).unwrap();

        assert_eq!(face.indices(), &[10, 11, 12, 11, 13, 12]);
        assert_eq!(face.distinct_indices(), &[10, 11, 12, 13]);
        let expected: HashSet<Edge> = before.iter().map(|&e| e + 10).collect();
        assert_eq!(edge_set(&face), expected);

        assert!(face.shift_indices(-11).is_err());
        assert_eq!(face.indices()[0], 10);

        face.shift_indices_to_zero();
        assert_eq!(face.indices(), &[0, 1, 2, 1, 3, 2]);
        assert_eq!(face.distinct_indices(), &[0, 1, 2, 3]);
        assert_eq!(edge_set(&face), before);
    }

    #[test]
    fn test_reverse_flips_winding() {
        let mut face = Face::new(vec![0, 1, 2]).unwrap();
        face.reverse();
        assert_eq!(face.indices(), &[2, 1, 0]);
        assert!(face.contains_triangle(2, 1, 0));
        assert!(!face.contains_triangle(0, 1, 2));
        assert_eq!(face.edges().len(), 3);
    }

    #[test]
    fn test_defaults() {
        let face = Face::new(vec![0, 1, 2]).unwrap().with_submesh(2).with_smoothing_group(3);
        assert_eq!(face.submesh_index, 2);
        assert_eq!(face.smoothing_group, 3);
        assert_eq!(face.texture_group, -1);
        assert!(!face.manual_uv);
        assert_eq!(face.uv, AutoUnwrapSettings::default());
        assert_eq!(face.uv.scale, Vector2::new(1.0, 1.0));
    }
}
