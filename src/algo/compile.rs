//! Render-ready mesh compilation.
//!
//! [`compile`] derives everything a renderer needs from an [`EditableMesh`]:
//! smoothing-aware normals, tangents, the UV and color channels, and one index
//! buffer per material slot. All per-vertex arrays line up 1:1 with the
//! positions array.

use nalgebra::{Point3, Vector3, Vector4};

use crate::error::{MeshError, Result};
use crate::mesh::{EditableMesh, UV_CHANNEL_COUNT, WHITE};

use super::submesh::{build_submeshes, Submesh, Topology};

/// Options for [`compile`].
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Preferred index buffer topology.
    pub topology: Topology,

    /// Number of material slots. Derived from the faces when `None`.
    pub submesh_count: Option<usize>,

    /// Emit tangents (user supplied, or generated from UV channel 0).
    pub tangents: bool,

    /// Emit vertex colors, defaulting to white.
    pub colors: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            topology: Topology::Triangles,
            submesh_count: None,
            tangents: true,
            colors: true,
        }
    }
}

impl CompileOptions {
    /// Set the preferred topology.
    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    /// Set an explicit material slot count.
    pub fn with_submesh_count(mut self, count: usize) -> Self {
        self.submesh_count = Some(count);
        self
    }

    /// Enable or disable tangent output.
    pub fn with_tangents(mut self, tangents: bool) -> Self {
        self.tangents = tangents;
        self
    }

    /// Enable or disable color output.
    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }
}

/// Render-ready buffers derived from an [`EditableMesh`].
#[derive(Debug, Clone)]
pub struct CompiledMesh {
    /// Vertex positions.
    pub positions: Vec<Point3<f64>>,
    /// Unit vertex normals.
    pub normals: Vec<Vector3<f64>>,
    /// Tangents with handedness in `w`.
    pub tangents: Option<Vec<Vector4<f64>>>,
    /// UV channels 0 to 3.
    pub uvs: [Option<Vec<Vector4<f64>>>; UV_CHANNEL_COUNT],
    /// Vertex colors.
    pub colors: Option<Vec<Vector4<f64>>>,
    /// One index buffer per material slot.
    pub submeshes: Vec<Submesh>,
}

impl CompiledMesh {
    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Total number of indices across all submeshes.
    pub fn index_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.indices.len()).sum()
    }
}

/// Derive normals, tangents, colors and index buffers.
///
/// # Example
///
/// ```
/// use editmesh::prelude::*;
/// use editmesh::algo::compile::{compile, CompileOptions};
/// use editmesh::algo::submesh::Topology;
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
/// let compiled = compile(&mesh, &CompileOptions::default().with_topology(Topology::Quads)).unwrap();
/// assert_eq!(compiled.submeshes[0].topology, Topology::Quads);
/// assert_eq!(compiled.index_count(), 4);
/// ```
pub fn compile(mesh: &EditableMesh, options: &CompileOptions) -> Result<CompiledMesh> {
    if mesh.faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }
    mesh.validate()?;

    let submesh_count = options.submesh_count.unwrap_or_else(|| mesh.submesh_count());
    let submeshes = build_submeshes(&mesh.faces, submesh_count, options.topology)?;

    let normals = mesh.calculate_normals()?;

    let tangents = if !options.tangents {
        None
    } else if let Some(user) = &mesh.tangents {
        Some(user.clone())
    } else {
        mesh.calculate_tangents(&normals)?
    };

    let colors = options.colors.then(|| {
        mesh.colors
            .clone()
            .unwrap_or_else(|| vec![WHITE; mesh.positions.len()])
    });

    log::debug!(
        "compiled mesh: {} vertices, {} submeshes, {} indices, tangents: {}",
        mesh.positions.len(),
        submeshes.len(),
        submeshes.iter().map(|s| s.indices.len()).sum::<usize>(),
        tangents.is_some()
    );

    Ok(CompiledMesh {
        positions: mesh.positions.clone(),
        normals,
        tangents,
        uvs: mesh.uvs.clone(),
        colors,
        submeshes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Face;
    use nalgebra::Vector2;

    /// Two quads side by side on different material slots.
    fn strip() -> EditableMesh {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ];
        let faces = vec![
            Face::new(vec![0, 1, 2, 1, 3, 2]).unwrap(),
            Face::new(vec![4, 5, 6, 5, 7, 6]).unwrap().with_submesh(1),
        ];
        EditableMesh::new(positions, faces).unwrap()
    }

    #[test]
    fn test_compile_defaults() {
        let mesh = strip();
        let compiled = compile(&mesh, &CompileOptions::default()).unwrap();

        assert_eq!(compiled.vertex_count(), 8);
        assert_eq!(compiled.normals.len(), 8);
        assert_eq!(compiled.submeshes.len(), 2);
        assert_eq!(compiled.index_count(), 3 * mesh.triangle_count());
        for n in &compiled.normals {
            assert!((n - Vector3::z()).norm() < 1e-10);
        }

        // No UVs, so nothing to generate tangents from
        assert!(compiled.tangents.is_none());
        assert_eq!(compiled.colors.as_ref().unwrap(), &vec![WHITE; 8]);
    }

    #[test]
    fn test_compile_quads() {
        let compiled = compile(&strip(), &CompileOptions::default().with_topology(Topology::Quads)).unwrap();
        assert!(compiled.submeshes.iter().all(|s| s.topology == Topology::Quads));
        assert_eq!(compiled.index_count(), 8);
    }

    #[test]
    fn test_explicit_submesh_count_clamps() {
        let options = CompileOptions::default().with_submesh_count(1);
        let compiled = compile(&strip(), &options).unwrap();
        assert_eq!(compiled.submeshes.len(), 1);
        assert_eq!(compiled.submeshes[0].indices.len(), 12);
    }

    #[test]
    fn test_generated_tangents() {
        let mut mesh = strip();
        let uvs = mesh.positions().iter().map(|p| Vector2::new(p.x, p.y)).collect();
        mesh.set_uv0(uvs).unwrap();

        let compiled = compile(&mesh, &CompileOptions::default()).unwrap();
        let tangents = compiled.tangents.unwrap();
        assert_eq!(tangents.len(), 8);
        for t in &tangents {
            assert!((t.xyz() - Vector3::x()).norm() < 1e-10);
        }
        assert!(compiled.uvs[0].is_some());
    }

    #[test]
    fn test_user_tangents_win() {
        let mut mesh = strip();
        mesh.set_uv0(vec![Vector2::zeros(); 8]).unwrap();
        let user = vec![Vector4::new(0.0, 1.0, 0.0, -1.0); 8];
        mesh.set_tangents(Some(user.clone())).unwrap();

        let compiled = compile(&mesh, &CompileOptions::default()).unwrap();
        assert_eq!(compiled.tangents.unwrap(), user);

        let compiled = compile(&mesh, &CompileOptions::default().with_tangents(false)).unwrap();
        assert!(compiled.tangents.is_none());
    }

    #[test]
    fn test_colors_optional() {
        let compiled = compile(&strip(), &CompileOptions::default().with_colors(false)).unwrap();
        assert!(compiled.colors.is_none());
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = EditableMesh::default();
        assert!(matches!(
            compile(&mesh, &CompileOptions::default()),
            Err(MeshError::EmptyMesh)
        ));
    }
}
