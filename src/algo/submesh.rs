//! Per-material index buffers.
//!
//! [`build_submeshes`] buckets face indices by [`Face::submesh_index`]. With
//! [`Topology::Quads`] preferred, quad faces go in as 4-corner loops, but a
//! bucket holding any non-quad face is emitted entirely as triangles, since a
//! draw call takes a single topology.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MeshError, Result};
use crate::mesh::{Face, MeshIndex};

/// Primitive type of an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Topology {
    /// Three indices per primitive.
    #[default]
    Triangles,
    /// Four indices per primitive, in loop order.
    Quads,
}

impl Topology {
    /// Number of indices per primitive.
    pub fn vertices_per_primitive(self) -> usize {
        match self {
            Topology::Triangles => 3,
            Topology::Quads => 4,
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topology::Triangles => write!(f, "triangles"),
            Topology::Quads => write!(f, "quads"),
        }
    }
}

/// An index buffer for one material slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submesh {
    /// Material slot.
    pub submesh_index: usize,
    /// Primitive type of `indices`.
    pub topology: Topology,
    /// Vertex indices.
    pub indices: Vec<usize>,
}

impl Submesh {
    /// Create a submesh.
    pub fn new(submesh_index: usize, topology: Topology, indices: Vec<usize>) -> Self {
        Self {
            submesh_index,
            topology,
            indices,
        }
    }

    /// Number of triangles or quads.
    pub fn primitive_count(&self) -> usize {
        self.indices.len() / self.topology.vertices_per_primitive()
    }

    /// Convert the indices to a narrower integer type.
    ///
    /// # Example
    ///
    /// ```
    /// use editmesh::algo::submesh::{Submesh, Topology};
    ///
    /// let submesh = Submesh::new(0, Topology::Triangles, vec![0, 1, 70_000]);
    /// assert!(submesh.indices_as::<u32>().is_ok());
    /// assert!(submesh.indices_as::<u16>().is_err());
    /// ```
    pub fn indices_as<I: MeshIndex>(&self) -> Result<Vec<I>> {
        self.indices
            .iter()
            .map(|&i| {
                I::try_from_usize(i).ok_or(MeshError::IndexOverflow {
                    index: i,
                    max: I::MAX.to_usize(),
                })
            })
            .collect()
    }
}

impl fmt::Display for Submesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}",
            self.submesh_index,
            self.topology,
            self.indices.len()
        )
    }
}

/// Number of material slots the faces use: the largest submesh index plus one.
///
/// Returns 0 for an empty face list.
pub fn submesh_count(faces: &[Face]) -> usize {
    faces
        .iter()
        .map(|f| f.submesh_index + 1)
        .max()
        .unwrap_or(0)
}

/// Partition faces into per-material index buffers.
///
/// Face submesh indices are clamped into `0..submesh_count`. Faces without
/// triangles are skipped. One [`Submesh`] is returned per slot up to the
/// highest slot used.
pub fn build_submeshes(
    faces: &[Face],
    submesh_count: usize,
    preferred: Topology,
) -> Result<Vec<Submesh>> {
    if submesh_count == 0 {
        return Err(MeshError::invalid_param(
            "submesh_count",
            submesh_count,
            "must be at least 1",
        ));
    }

    let wants_quads = preferred == Topology::Quads;
    let mut quads: Vec<Vec<usize>> = vec![Vec::new(); submesh_count];
    let mut tris: Vec<Vec<usize>> = vec![Vec::new(); submesh_count];
    let mut max_used: Option<usize> = None;

    for face in faces {
        if face.indices().is_empty() {
            continue;
        }

        let slot = face.submesh_index.min(submesh_count - 1);
        max_used = max_used.max(Some(slot));

        if wants_quads && face.is_quad() {
            quads[slot].extend_from_slice(&face.to_quad()?);
        } else {
            tris[slot].extend_from_slice(face.indices());
        }
    }

    let used = max_used.map_or(0, |m| m + 1);
    let submeshes: Vec<Submesh> = tris
        .into_iter()
        .zip(quads)
        .take(used)
        .enumerate()
        .map(|(slot, (mut tri, quad))| {
            if !wants_quads {
                return Submesh::new(slot, Topology::Triangles, tri);
            }
            if tri.is_empty() {
                return Submesh::new(slot, Topology::Quads, quad);
            }

            tri.reserve(quad.len() / 4 * 6);
            for q in quad.chunks_exact(4) {
                tri.extend_from_slice(&[q[0], q[1], q[2], q[2], q[3], q[0]]);
            }
            Submesh::new(slot, Topology::Triangles, tri)
        })
        .collect();

    log::debug!(
        "built {} submeshes from {} faces ({} preferred)",
        submeshes.len(),
        faces.len(),
        preferred
    );
    for s in &submeshes {
        log::trace!("submesh {}", s);
    }

    Ok(submeshes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn quad(base: usize) -> Face {
        Face::new(vec![base, base + 1, base + 2, base + 1, base + 3, base + 2]).unwrap()
    }

    fn tri(base: usize) -> Face {
        Face::new(vec![base, base + 1, base + 2]).unwrap()
    }

    #[test]
    fn test_triangle_completeness() {
        let faces = vec![quad(0), tri(4).with_submesh(1), quad(7).with_submesh(1), tri(11)];
        let total: usize = faces.iter().map(|f| f.triangle_count()).sum();

        let submeshes = build_submeshes(&faces, submesh_count(&faces), Topology::Triangles).unwrap();
        assert_eq!(submeshes.len(), 2);

        let emitted: usize = submeshes.iter().map(|s| s.indices.len()).sum();
        assert_eq!(emitted, 3 * total);
        assert!(submeshes.iter().all(|s| s.topology == Topology::Triangles));
    }

    #[test]
    fn test_quads_when_uniform() {
        let faces = vec![quad(0), quad(4)];
        let submeshes = build_submeshes(&faces, 1, Topology::Quads).unwrap();

        assert_eq!(submeshes.len(), 1);
        assert_eq!(submeshes[0].topology, Topology::Quads);
        assert_eq!(submeshes[0].indices.len(), 8);
        assert_eq!(submeshes[0].primitive_count(), 2);

        let corners: HashSet<usize> = submeshes[0].indices[..4].iter().copied().collect();
        assert_eq!(corners, [0, 1, 2, 3].into_iter().collect());
    }

    #[test]
    fn test_mixed_bucket_falls_back_to_triangles() {
        let faces = vec![quad(0), tri(4), quad(7).with_submesh(1)];
        let submeshes = build_submeshes(&faces, 2, Topology::Quads).unwrap();

        assert_eq!(submeshes[0].topology, Topology::Triangles);
        assert_eq!(submeshes[0].indices.len(), 3 + 6);
        assert_eq!(submeshes[1].topology, Topology::Quads);
        assert_eq!(submeshes[1].indices.len(), 4);
    }

    #[test]
    fn test_submesh_index_is_clamped() {
        let faces = vec![tri(0).with_submesh(9)];
        let submeshes = build_submeshes(&faces, 2, Topology::Triangles).unwrap();

        assert_eq!(submeshes.len(), 2);
        assert!(submeshes[0].indices.is_empty());
        assert_eq!(submeshes[1].indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_output_stops_at_highest_used_slot() {
        let faces = vec![tri(0)];
        let submeshes = build_submeshes(&faces, 4, Topology::Triangles).unwrap();
        assert_eq!(submeshes.len(), 1);
    }

    #[test]
    fn test_empty_faces_skipped() {
        let mut empty = tri(0).with_submesh(3);
        empty.set_indices(&[]).unwrap();
        let faces = vec![tri(0), empty];
        let submeshes = build_submeshes(&faces, 4, Topology::Triangles).unwrap();
        assert_eq!(submeshes.len(), 1);
    }

    #[test]
    fn test_zero_submesh_count_rejected() {
        assert!(build_submeshes(&[tri(0)], 0, Topology::Triangles).is_err());
    }

    #[test]
    fn test_submesh_count() {
        assert_eq!(submesh_count(&[]), 0);
        assert_eq!(submesh_count(&[tri(0), tri(3).with_submesh(2)]), 3);
    }

    #[test]
    fn test_indices_as() {
        let s = Submesh::new(0, Topology::Triangles, vec![0, 1, 65_535]);
        assert_eq!(s.indices_as::<u16>().unwrap(), vec![0u16, 1, 65_535]);

        let s = Submesh::new(0, Topology::Triangles, vec![0, 1, 65_536]);
        assert!(matches!(
            s.indices_as::<u16>(),
            Err(MeshError::IndexOverflow { index: 65_536, max: 65_535 })
        ));
        assert_eq!(s.to_string(), "0, triangles, 3");
    }
}
