//! Wavefront OBJ export.
//!
//! The mesh is compiled first, so the file carries smoothing-aware normals.
//! Each material slot becomes an OBJ group `submesh_<n>`, and UV channel 0 is
//! written as texture coordinates when present. Loading is not supported; OBJ
//! has no notion of coincident groups or smoothing bands.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::algo::compile::{compile, CompileOptions, CompiledMesh};
use crate::error::{MeshError, Result};
use crate::mesh::EditableMesh;

/// Write a compiled mesh as OBJ text.
pub fn write_compiled<W: Write>(compiled: &CompiledMesh, mut writer: W) -> Result<()> {
    writeln!(writer, "# editmesh OBJ export")?;
    writeln!(
        writer,
        "# {} vertices, {} submeshes",
        compiled.vertex_count(),
        compiled.submeshes.len()
    )?;

    for p in &compiled.positions {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }

    let uvs = compiled.uvs[0].as_deref();
    if let Some(uvs) = uvs {
        for uv in uvs {
            writeln!(writer, "vt {} {}", uv.x, uv.y)?;
        }
    }

    for n in &compiled.normals {
        writeln!(writer, "vn {} {} {}", n.x, n.y, n.z)?;
    }

    for submesh in &compiled.submeshes {
        writeln!(writer, "g submesh_{}", submesh.submesh_index)?;
        let per = submesh.topology.vertices_per_primitive();
        for primitive in submesh.indices.chunks_exact(per) {
            write!(writer, "f")?;
            for &i in primitive {
                // OBJ indices are 1-based
                let i = i + 1;
                if uvs.is_some() {
                    write!(writer, " {i}/{i}/{i}")?;
                } else {
                    write!(writer, " {i}//{i}")?;
                }
            }
            writeln!(writer)?;
        }
    }

    Ok(())
}

/// Compile a mesh with `options` and write it as OBJ text.
///
/// Tangents and colors are not part of OBJ and are never requested.
pub fn write<W: Write>(mesh: &EditableMesh, options: &CompileOptions, writer: W) -> Result<()> {
    let options = options.clone().with_tangents(false).with_colors(false);
    let compiled = compile(mesh, &options)?;
    write_compiled(&compiled, writer)
}

/// Save a mesh to an OBJ file.
///
/// # Example
///
/// ```no_run
/// use editmesh::algo::compile::CompileOptions;
/// use editmesh::io::{json, obj};
///
/// let mesh = json::load("model.json").unwrap();
/// obj::save(&mesh, &CompileOptions::default(), "model.obj").unwrap();
/// ```
pub fn save<P: AsRef<Path>>(mesh: &EditableMesh, options: &CompileOptions, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write(mesh, options, &mut writer).map_err(|e| MeshError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::submesh::Topology;
    use crate::mesh::Face;
    use nalgebra::{Point3, Vector2};

    fn unit_quad() -> EditableMesh {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let faces = vec![Face::new(vec![0, 1, 2, 1, 3, 2]).unwrap()];
        EditableMesh::new(positions, faces).unwrap()
    }

    fn to_string(mesh: &EditableMesh, options: &CompileOptions) -> String {
        let mut buf = Vec::new();
        write(mesh, options, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_write_triangles() {
        let text = to_string(&unit_quad(), &CompileOptions::default());

        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 4);
        assert_eq!(text.lines().filter(|l| l.starts_with("vn ")).count(), 4);
        assert_eq!(text.lines().filter(|l| l.starts_with("vt ")).count(), 0);
        assert!(text.contains("g submesh_0"));

        let faces: Vec<&str> = text.lines().filter(|l| l.starts_with("f ")).collect();
        assert_eq!(faces, vec!["f 1//1 2//2 3//3", "f 2//2 4//4 3//3"]);
    }

    #[test]
    fn test_write_quads_with_uvs() {
        let mut mesh = unit_quad();
        let uvs = mesh.positions().iter().map(|p| Vector2::new(p.x, p.y)).collect();
        mesh.set_uv0(uvs).unwrap();

        let options = CompileOptions::default().with_topology(Topology::Quads);
        let text = to_string(&mesh, &options);

        assert_eq!(text.lines().filter(|l| l.starts_with("vt ")).count(), 4);
        let faces: Vec<&str> = text.lines().filter(|l| l.starts_with("f ")).collect();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].split_whitespace().count(), 5);
        assert!(faces[0].contains("/"));
    }

    #[test]
    fn test_empty_mesh_rejected() {
        let mut buf = Vec::new();
        assert!(matches!(
            write(&EditableMesh::default(), &CompileOptions::default(), &mut buf),
            Err(MeshError::EmptyMesh)
        ));
    }
}
