//! Mesh file I/O.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | JSON document | `.json` | ✓ | ✓ | Lossless, versioned ([`json::SCHEMA_VERSION`]) |
//! | Wavefront OBJ | `.obj` | ✗ | ✓ | Compiled triangles with normals and UV0 |
//!
//! # Usage
//!
//! ```no_run
//! use editmesh::io::{load, save};
//!
//! // Load with automatic format detection
//! let mesh = load("model.json").unwrap();
//!
//! // Save with automatic format detection
//! save(&mesh, "output.obj").unwrap();
//! ```

pub mod json;
pub mod obj;

use std::path::Path;

use crate::algo::compile::CompileOptions;
use crate::error::{MeshError, Result};
use crate::mesh::EditableMesh;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Versioned JSON mesh document.
    Json,
    /// Wavefront OBJ format.
    Obj,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "json" => Some(Format::Json),
            "obj" => Some(Format::Obj),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

fn detect(path: &Path) -> Result<Format> {
    Format::from_path(path).ok_or_else(|| MeshError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })
}

/// Load a mesh from a file with automatic format detection.
pub fn load<P: AsRef<Path>>(path: P) -> Result<EditableMesh> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Json => json::load(path),
        Format::Obj => Err(MeshError::LoadError {
            path: path.to_path_buf(),
            message: "OBJ loading is not supported".to_string(),
        }),
    }
}

/// Save a mesh to a file with automatic format detection.
///
/// OBJ files are written with default [`CompileOptions`].
pub fn save<P: AsRef<Path>>(mesh: &EditableMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Json => json::save(mesh, path),
        Format::Obj => obj::save(mesh, &CompileOptions::default(), path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path("a/b/mesh.json"), Some(Format::Json));
        assert_eq!(Format::from_path("mesh.OBJ"), Some(Format::Obj));
        assert_eq!(Format::from_path("mesh.stl"), None);
        assert_eq!(Format::from_path("mesh"), None);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load("mesh.stl").unwrap_err();
        assert!(matches!(err, MeshError::UnsupportedFormat { ref extension } if extension == "stl"));

        let err = load("mesh.obj").unwrap_err();
        assert!(matches!(err, MeshError::LoadError { .. }));
    }
}
