//! The editable mesh aggregate.
//!
//! [`EditableMesh`] owns the source data every algorithm reads and writes:
//! positions, faces, coincident vertex groups and the optional per-vertex
//! attribute arrays (four UV channels, colors, user tangents). Normals,
//! generated tangents and index buffers are derived from it by
//! [`EditableMesh::compile`] and are never stored.
//!
//! Mutators validate their input before writing, so a rejected call leaves the
//! mesh unchanged.

use nalgebra::{Point3, Vector2, Vector3, Vector4};

use super::edge::Edge;
use super::face::{check_face_indices, Face};
use super::index::{FaceId, GroupId};
use super::shared::{SharedVertices, WeldOptions};
use super::winged::WingedEdgeGraph;
use crate::algo::compile::{compile, CompileOptions, CompiledMesh};
use crate::algo::normals;
use crate::algo::submesh;
use crate::error::{MeshError, Result};

/// Number of UV channels a mesh carries.
pub const UV_CHANNEL_COUNT: usize = 4;

/// Default vertex color.
pub const WHITE: Vector4<f64> = Vector4::new(1.0, 1.0, 1.0, 1.0);

/// Default tangent for vertices appended without one.
const DEFAULT_TANGENT: Vector4<f64> = Vector4::new(1.0, 0.0, 0.0, 1.0);

/// An editable polygon mesh.
///
/// Every face owns its vertex slots; positional sharing between faces is
/// expressed through [`SharedVertices`].
///
/// # Example
///
/// ```
/// use editmesh::prelude::*;
///
/// let positions = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
/// ];
/// let faces = vec![Face::new(vec![0, 1, 2, 1, 3, 2]).unwrap()];
/// let mesh = EditableMesh::new(positions, faces).unwrap();
///
/// assert_eq!(mesh.vertex_count(), 4);
/// assert_eq!(mesh.triangle_count(), 2);
/// assert!(mesh.faces()[0].is_quad());
/// ```
#[derive(Debug, Clone, Default)]
pub struct EditableMesh {
    pub(crate) positions: Vec<Point3<f64>>,
    pub(crate) faces: Vec<Face>,
    pub(crate) shared: SharedVertices,
    /// Channels 0 and 1 only use `x` and `y`.
    pub(crate) uvs: [Option<Vec<Vector4<f64>>>; UV_CHANNEL_COUNT],
    pub(crate) colors: Option<Vec<Vector4<f64>>>,
    pub(crate) tangents: Option<Vec<Vector4<f64>>>,
}

impl EditableMesh {
    /// Create a mesh, welding coincident vertices at the default resolution.
    pub fn new(positions: Vec<Point3<f64>>, faces: Vec<Face>) -> Result<Self> {
        let shared = SharedVertices::from_positions(&positions, WeldOptions::default().resolution)?;
        Self::with_shared_vertices(positions, faces, shared)
    }

    /// Create a mesh with explicit coincident groups.
    ///
    /// Fails if a face references a missing vertex or if the groups do not
    /// partition the vertex range.
    pub fn with_shared_vertices(
        positions: Vec<Point3<f64>>,
        faces: Vec<Face>,
        shared: SharedVertices,
    ) -> Result<Self> {
        check_face_indices(&faces, positions.len())?;
        shared.validate(positions.len())?;
        Ok(Self {
            positions,
            faces,
            shared,
            ..Default::default()
        })
    }

    /// Check every structural and attribute invariant.
    pub fn validate(&self) -> Result<()> {
        let n = self.positions.len();
        check_face_indices(&self.faces, n)?;
        self.shared.validate(n)?;
        for (channel, uv) in self.uvs.iter().enumerate() {
            if let Some(uv) = uv {
                check_length(uv_attribute_name(channel), n, uv.len())?;
            }
        }
        if let Some(colors) = &self.colors {
            check_length("colors", n, colors.len())?;
        }
        if let Some(tangents) = &self.tangents {
            check_length("tangents", n, tangents.len())?;
        }
        Ok(())
    }

    // ==================== Counts ====================

    /// Number of vertex slots.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of faces.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Total number of triangle indices across all faces.
    pub fn index_count(&self) -> usize {
        self.faces.iter().map(|f| f.indices().len()).sum()
    }

    /// Total number of triangles across all faces.
    pub fn triangle_count(&self) -> usize {
        self.index_count() / 3
    }

    /// Number of material slots used by the faces.
    pub fn submesh_count(&self) -> usize {
        submesh::submesh_count(&self.faces)
    }

    // ==================== Positions ====================

    /// Vertex positions.
    #[inline]
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Mutable vertex positions. Moving vertices does not change topology.
    #[inline]
    pub fn positions_mut(&mut self) -> &mut [Point3<f64>] {
        &mut self.positions
    }

    /// Axis-aligned bounds, or `None` for a mesh without vertices.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = *self.positions.first()?;
        Some(self.positions.iter().fold((first, first), |(min, max), p| {
            (min.inf(p), max.sup(p))
        }))
    }

    // ==================== Faces ====================

    /// All faces.
    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Face ids in order.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Get a face by id.
    pub fn face(&self, id: FaceId) -> Result<&Face> {
        self.faces
            .get(id.index())
            .ok_or_else(|| MeshError::invalid_param("face", id.index(), "face index out of range"))
    }

    /// Mutable access to a face's attributes.
    ///
    /// Changing a face's indices through this handle is not checked against the
    /// positions array; call [`EditableMesh::validate`] afterwards.
    pub fn face_mut(&mut self, id: FaceId) -> Result<&mut Face> {
        self.faces
            .get_mut(id.index())
            .ok_or_else(|| MeshError::invalid_param("face", id.index(), "face index out of range"))
    }

    /// Replace the face list.
    pub fn set_faces(&mut self, faces: Vec<Face>) -> Result<()> {
        check_face_indices(&faces, self.positions.len())?;
        self.faces = faces;
        Ok(())
    }

    /// Unit normal of a face, from the sum of its triangle normals.
    pub fn face_normal(&self, id: FaceId) -> Result<Vector3<f64>> {
        let face = self.face(id)?;
        let mut sum = Vector3::zeros();
        for [a, b, c] in face.triangles() {
            let (p0, p1, p2) = (self.vertex(id, a)?, self.vertex(id, b)?, self.vertex(id, c)?);
            sum += (p1 - p0).cross(&(p2 - p0));
        }
        Ok(sum.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros))
    }

    fn vertex(&self, face: FaceId, v: usize) -> Result<&Point3<f64>> {
        self.positions.get(v).ok_or(MeshError::InvalidVertexIndex {
            face: face.index(),
            vertex: v,
        })
    }

    // ==================== Coincident groups ====================

    /// The coincident vertex groups.
    #[inline]
    pub fn shared_vertices(&self) -> &SharedVertices {
        &self.shared
    }

    /// Replace the coincident groups. They must partition the vertex range.
    pub fn set_shared_vertices(&mut self, shared: SharedVertices) -> Result<()> {
        shared.validate(self.positions.len())?;
        self.shared = shared;
        Ok(())
    }

    /// Re-weld coincident groups from the current positions.
    pub fn rebuild_shared_vertices(&mut self, options: &WeldOptions) -> Result<()> {
        self.shared = SharedVertices::from_positions(&self.positions, options.resolution)?;
        Ok(())
    }

    /// Declare a set of vertices coincident.
    ///
    /// Fails on an empty slice or an index outside the vertex range.
    pub fn set_coincident(&mut self, vertices: &[usize]) -> Result<GroupId> {
        let n = self.positions.len();
        if let Some(&v) = vertices.iter().find(|&&v| v >= n) {
            return Err(MeshError::MissingCoincidentGroup { vertex: v });
        }
        self.shared
            .set_coincident(vertices)
            .ok_or_else(|| MeshError::invalid_param("vertices", "[]", "no vertices to group"))
    }

    /// Edges of a face expressed in coincident group indices.
    pub fn common_edges(&self, id: FaceId) -> Result<Vec<Edge>> {
        self.face(id)?
            .edges()
            .iter()
            .map(|e| {
                Ok(Edge::new(
                    self.shared.group_of(e.a)?.index(),
                    self.shared.group_of(e.b)?.index(),
                ))
            })
            .collect()
    }

    /// Build the winged-edge graph over every face.
    pub fn winged_edges(&self) -> Result<WingedEdgeGraph> {
        WingedEdgeGraph::build(&self.faces, &self.shared)
    }

    // ==================== Attributes ====================

    /// UV coordinates of a channel in `0..4`, if set.
    pub fn uvs(&self, channel: usize) -> Result<Option<&[Vector4<f64>]>> {
        check_channel(channel)?;
        Ok(self.uvs[channel].as_deref())
    }

    /// Set or clear the UVs of a channel in `0..4`.
    ///
    /// Channels 0 and 1 keep only `x` and `y`; `z` and `w` are zeroed.
    pub fn set_uvs(&mut self, channel: usize, uvs: Option<Vec<Vector4<f64>>>) -> Result<()> {
        check_channel(channel)?;
        let uvs = match uvs {
            Some(mut uvs) => {
                check_length(uv_attribute_name(channel), self.positions.len(), uvs.len())?;
                if channel < 2 {
                    for uv in uvs.iter_mut() {
                        uv.z = 0.0;
                        uv.w = 0.0;
                    }
                }
                Some(uvs)
            }
            None => None,
        };
        self.uvs[channel] = uvs;
        Ok(())
    }

    /// The primary texture coordinates as 2D vectors.
    pub fn uv0(&self) -> Option<Vec<Vector2<f64>>> {
        self.uvs[0]
            .as_ref()
            .map(|uvs| uvs.iter().map(|uv| uv.xy()).collect())
    }

    /// Set the primary texture coordinates.
    pub fn set_uv0(&mut self, uvs: Vec<Vector2<f64>>) -> Result<()> {
        let uvs = uvs.iter().map(|uv| Vector4::new(uv.x, uv.y, 0.0, 0.0)).collect();
        self.set_uvs(0, Some(uvs))
    }

    /// Vertex colors, if set.
    pub fn colors(&self) -> Option<&[Vector4<f64>]> {
        self.colors.as_deref()
    }

    /// Set or clear vertex colors.
    pub fn set_colors(&mut self, colors: Option<Vec<Vector4<f64>>>) -> Result<()> {
        if let Some(colors) = &colors {
            check_length("colors", self.positions.len(), colors.len())?;
        }
        self.colors = colors;
        Ok(())
    }

    /// User-supplied tangents, if set.
    pub fn tangents(&self) -> Option<&[Vector4<f64>]> {
        self.tangents.as_deref()
    }

    /// Set or clear user-supplied tangents. These take precedence over
    /// generated tangents when compiling.
    pub fn set_tangents(&mut self, tangents: Option<Vec<Vector4<f64>>>) -> Result<()> {
        if let Some(tangents) = &tangents {
            check_length("tangents", self.positions.len(), tangents.len())?;
        }
        self.tangents = tangents;
        Ok(())
    }

    // ==================== Editing ====================

    /// Splice geometry built in isolation into this mesh.
    ///
    /// `faces` index into `positions` starting at zero; they are shifted past the
    /// existing vertices. `shared` groups the new vertices among themselves, or
    /// they are welded by position when `None`. Attribute arrays present on the
    /// mesh are extended with zero UVs, white colors and +X tangents.
    ///
    /// Returns the ids of the appended faces.
    pub fn append_geometry(
        &mut self,
        positions: Vec<Point3<f64>>,
        mut faces: Vec<Face>,
        shared: Option<SharedVertices>,
    ) -> Result<Vec<FaceId>> {
        check_face_indices(&faces, positions.len())?;
        let shared = match shared {
            Some(shared) => {
                shared.validate(positions.len())?;
                shared
            }
            None => SharedVertices::from_positions(&positions, WeldOptions::default().resolution)?,
        };

        let offset = self.positions.len();
        let added = positions.len();
        for face in faces.iter_mut() {
            // offset fits in isize since it is the length of an allocated Vec
            face.shift_indices(offset as isize)?;
        }

        self.positions.extend(positions);
        self.shared.append(&shared, offset);
        for uv in self.uvs.iter_mut().flatten() {
            uv.resize(offset + added, Vector4::zeros());
        }
        if let Some(colors) = &mut self.colors {
            colors.resize(offset + added, WHITE);
        }
        if let Some(tangents) = &mut self.tangents {
            tangents.resize(offset + added, DEFAULT_TANGENT);
        }

        let first = self.faces.len();
        self.faces.extend(faces);

        log::debug!(
            "appended {} vertices and {} faces",
            added,
            self.faces.len() - first
        );

        Ok((first..self.faces.len()).map(FaceId::new).collect())
    }

    /// Replace positions, faces and groups at once.
    ///
    /// Attribute arrays whose length no longer matches the vertex count are
    /// dropped.
    pub fn replace_geometry(
        &mut self,
        positions: Vec<Point3<f64>>,
        faces: Vec<Face>,
        shared: Option<SharedVertices>,
    ) -> Result<()> {
        check_face_indices(&faces, positions.len())?;
        let shared = match shared {
            Some(shared) => {
                shared.validate(positions.len())?;
                shared
            }
            None => SharedVertices::from_positions(&positions, WeldOptions::default().resolution)?,
        };

        let n = positions.len();
        self.positions = positions;
        self.faces = faces;
        self.shared = shared;

        for uv in self.uvs.iter_mut() {
            drop_mismatched(uv, n);
        }
        drop_mismatched(&mut self.colors, n);
        drop_mismatched(&mut self.tangents, n);
        Ok(())
    }

    /// Remove vertices and compact every per-vertex array.
    ///
    /// The caller must ensure no face references a removed vertex.
    pub(crate) fn remove_vertices(&mut self, removed: &[usize]) -> Result<()> {
        let mut removed = removed.to_vec();
        removed.sort_unstable();
        removed.dedup();
        if removed.is_empty() {
            return Ok(());
        }

        for (f, face) in self.faces.iter().enumerate() {
            if let Some(&vertex) = face.indices().iter().find(|&&v| removed.binary_search(&v).is_ok()) {
                return Err(MeshError::InvalidVertexIndex { face: f, vertex });
            }
        }

        let remap = |v: usize| v - removed.partition_point(|&r| r < v);
        for face in self.faces.iter_mut() {
            let indices: Vec<usize> = face.indices().iter().map(|&v| remap(v)).collect();
            face.set_indices(&indices)?;
        }

        self.shared.remove_and_shift(&removed);
        let keep = |i: usize| removed.binary_search(&i).is_err();
        retain_indexed(&mut self.positions, keep);
        for uv in self.uvs.iter_mut().flatten() {
            retain_indexed(uv, keep);
        }
        if let Some(colors) = &mut self.colors {
            retain_indexed(colors, keep);
        }
        if let Some(tangents) = &mut self.tangents {
            retain_indexed(tangents, keep);
        }
        Ok(())
    }

    // ==================== Derived data ====================

    /// Smoothing-aware vertex normals.
    pub fn calculate_normals(&self) -> Result<Vec<Vector3<f64>>> {
        normals::calculate_normals(&self.positions, &self.faces, &self.shared)
    }

    /// Tangents generated from UV channel 0, or `None` without UVs.
    pub fn calculate_tangents(&self, normals: &[Vector3<f64>]) -> Result<Option<Vec<Vector4<f64>>>> {
        let Some(uv0) = self.uv0() else {
            return Ok(None);
        };
        normals::tangents(&self.positions, &uv0, normals, &self.faces).map(Some)
    }

    /// Derive render-ready buffers.
    pub fn compile(&self, options: &CompileOptions) -> Result<CompiledMesh> {
        compile(self, options)
    }
}

fn check_channel(channel: usize) -> Result<()> {
    if channel >= UV_CHANNEL_COUNT {
        return Err(MeshError::InvalidUvChannel { channel });
    }
    Ok(())
}

fn check_length(attribute: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(MeshError::attribute_length(attribute, expected, actual));
    }
    Ok(())
}

fn uv_attribute_name(channel: usize) -> &'static str {
    match channel {
        0 => "uv0",
        1 => "uv1",
        2 => "uv2",
        _ => "uv3",
    }
}

fn drop_mismatched<T>(attribute: &mut Option<Vec<T>>, len: usize) {
    if attribute.as_ref().is_some_and(|a| a.len() != len) {
        log::debug!("dropping per-vertex attribute that no longer matches {} vertices", len);
        *attribute = None;
    }
}

fn retain_indexed<T>(values: &mut Vec<T>, keep: impl Fn(usize) -> bool) {
    let mut i = 0;
    values.retain(|_| {
        let k = keep(i);
        i += 1;
        k
    });
}
