//! Versioned JSON mesh documents.
//!
//! A [`MeshDocument`] is the persisted form of an [`EditableMesh`]. Optional
//! fields may be omitted; a missing `shared_vertices` list is rebuilt by
//! welding positions.
//!
//! ```json
//! {
//!   "version": 1,
//!   "positions": [[0, 0, 0], [1, 0, 0], [0, 1, 0]],
//!   "faces": [{ "indices": [0, 1, 2] }]
//! }
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use nalgebra::{Point3, Vector4};
use serde::{Deserialize, Serialize};

use crate::error::{MeshError, Result};
use crate::mesh::{EditableMesh, Face, SharedVertices, UV_CHANNEL_COUNT};

/// Highest document version this build reads and the version it writes.
pub const SCHEMA_VERSION: u32 = 1;

/// Serialized form of an [`EditableMesh`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshDocument {
    /// Schema version the document was written with.
    pub version: u32,
    /// Vertex positions.
    pub positions: Vec<Point3<f64>>,
    /// Faces.
    pub faces: Vec<Face>,
    /// Coincident vertex groups; welded from positions when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_vertices: Option<SharedVertices>,
    /// UV channels 0 to 3.
    #[serde(default)]
    pub uvs: [Option<Vec<Vector4<f64>>>; UV_CHANNEL_COUNT],
    /// Vertex colors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<Vector4<f64>>>,
    /// User supplied tangents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tangents: Option<Vec<Vector4<f64>>>,
}

impl MeshDocument {
    /// Snapshot a mesh.
    pub fn from_mesh(mesh: &EditableMesh) -> Self {
        Self {
            version: SCHEMA_VERSION,
            positions: mesh.positions.clone(),
            faces: mesh.faces.clone(),
            shared_vertices: Some(mesh.shared.clone()),
            uvs: mesh.uvs.clone(),
            colors: mesh.colors.clone(),
            tangents: mesh.tangents.clone(),
        }
    }

    /// Validate the document and build a mesh from it.
    pub fn into_mesh(self) -> Result<EditableMesh> {
        if self.version > SCHEMA_VERSION {
            return Err(MeshError::UnsupportedVersion {
                found: self.version,
                supported: SCHEMA_VERSION,
            });
        }

        let mut mesh = match self.shared_vertices {
            Some(shared) => EditableMesh::with_shared_vertices(self.positions, self.faces, shared)?,
            None => EditableMesh::new(self.positions, self.faces)?,
        };

        for (channel, uvs) in self.uvs.into_iter().enumerate() {
            mesh.set_uvs(channel, uvs)?;
        }
        mesh.set_colors(self.colors)?;
        mesh.set_tangents(self.tangents)?;
        Ok(mesh)
    }
}

/// Write a mesh as pretty-printed JSON.
pub fn write<W: Write>(mesh: &EditableMesh, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, &MeshDocument::from_mesh(mesh))
        .map_err(|e| MeshError::Io(e.into()))
}

/// Read a mesh from JSON.
pub fn read<R: Read>(reader: R) -> Result<EditableMesh> {
    let document: MeshDocument =
        serde_json::from_reader(reader).map_err(|e| MeshError::Io(e.into()))?;
    document.into_mesh()
}

/// Load a mesh from a JSON file.
///
/// # Example
///
/// ```no_run
/// use editmesh::io::json;
///
/// let mesh = json::load("model.json").unwrap();
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<EditableMesh> {
    let path = path.as_ref();
    let file = File::open(path)?;
    read(BufReader::new(file)).map_err(|e| match e {
        MeshError::Io(io) => MeshError::LoadError {
            path: path.to_path_buf(),
            message: io.to_string(),
        },
        other => other,
    })
}

/// Save a mesh to a JSON file.
pub fn save<P: AsRef<Path>>(mesh: &EditableMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write(mesh, &mut writer).map_err(|e| MeshError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector2;

    fn unit_quad() -> EditableMesh {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let faces = vec![Face::new(vec![0, 1, 2, 1, 3, 2]).unwrap().with_smoothing_group(3)];
        EditableMesh::new(positions, faces).unwrap()
    }

    #[test]
    fn test_write_then_read() {
        let mut mesh = unit_quad();
        mesh.set_uv0(vec![Vector2::new(0.5, 0.5); 4]).unwrap();
        mesh.set_colors(Some(vec![Vector4::new(1.0, 0.0, 0.0, 1.0); 4])).unwrap();

        let mut buf = Vec::new();
        write(&mesh, &mut buf).unwrap();
        let loaded = read(buf.as_slice()).unwrap();

        assert_eq!(loaded.positions(), mesh.positions());
        assert_eq!(loaded.faces(), mesh.faces());
        assert_eq!(loaded.shared_vertices(), mesh.shared_vertices());
        assert_eq!(loaded.uv0(), mesh.uv0());
        assert_eq!(loaded.colors(), mesh.colors());
        assert!(loaded.tangents().is_none());
        assert!(loaded.faces()[0].is_quad());
    }

    #[test]
    fn test_minimal_document_welds() {
        let json = r#"{
            "version": 1,
            "positions": [[0, 0, 0], [1, 0, 0], [0, 1, 0], [1, 0, 0]],
            "faces": [{ "indices": [0, 1, 2] }, { "indices": [3, 2, 1] }]
        }"#;
        let mesh = read(json.as_bytes()).unwrap();

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.shared_vertices().len(), 3);
        assert_eq!(mesh.faces()[0].texture_group, -1);
        assert_eq!(mesh.faces()[0].smoothing_group, 0);
    }

    #[test]
    fn test_newer_version_rejected() {
        let json = r#"{ "version": 2, "positions": [], "faces": [] }"#;
        assert!(matches!(
            read(json.as_bytes()),
            Err(MeshError::UnsupportedVersion { found: 2, supported: 1 })
        ));
    }

    #[test]
    fn test_invalid_document_rejected() {
        // Index out of range
        let json = r#"{ "version": 1, "positions": [[0, 0, 0]], "faces": [{ "indices": [0, 1, 2] }] }"#;
        assert!(read(json.as_bytes()).is_err());

        // Colors do not match the vertex count
        let json = r#"{
            "version": 1,
            "positions": [[0, 0, 0], [1, 0, 0], [0, 1, 0]],
            "faces": [{ "indices": [0, 1, 2] }],
            "colors": [[1, 1, 1, 1]]
        }"#;
        assert!(matches!(
            read(json.as_bytes()),
            Err(MeshError::AttributeLength { .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(read("{".as_bytes()), Err(MeshError::Io(_))));
    }
}
