//! # editmesh
//!
//! An editable polygon-mesh kernel.
//!
//! Geometry is stored as unwelded triangle soup so every face can carry its
//! own UVs, material slot and smoothing group, while an explicit coincidence
//! index ties together vertices that share a position. On top of that the
//! crate rebuilds winged-edge adjacency on demand and derives render-ready
//! buffers.
//!
//! ## Features
//!
//! - **Coincident vertex groups**: position welding at a fixed resolution
//! - **Winged-edge adjacency**: rebuilt from faces, with non-manifold reporting
//! - **Smoothing-aware normals**: per-group averaging with reserved hard bands
//! - **Submesh compilation**: per-material index buffers in triangle or quad topology
//! - **Editing**: auto smoothing, quad merging, degenerate and unused vertex cleanup
//! - **Persistence**: versioned JSON documents, OBJ export
//!
//! ## Quick Start
//!
//! ```
//! use editmesh::prelude::*;
//! use editmesh::algo::compile::CompileOptions;
//!
//! // A unit quad made of two triangles
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//! ];
//! let faces = vec![Face::new(vec![0, 1, 2, 1, 3, 2]).unwrap()];
//! let mesh = EditableMesh::new(positions, faces).unwrap();
//!
//! assert!(mesh.faces()[0].is_quad());
//!
//! let compiled = mesh.compile(&CompileOptions::default()).unwrap();
//! assert_eq!(compiled.normals.len(), 4);
//! assert_eq!(compiled.submeshes[0].indices.len(), 6);
//! ```
//!
//! ## Adjacency
//!
//! ```
//! use editmesh::prelude::*;
//!
//! // Two triangles that share an edge through coincident vertices
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let faces = vec![Face::new(vec![0, 1, 2]).unwrap(), Face::new(vec![3, 4, 5]).unwrap()];
//! let mesh = EditableMesh::new(positions, faces).unwrap();
//!
//! let graph = mesh.winged_edges().unwrap();
//! assert_eq!(graph.len(), 6);
//! assert_eq!(graph.boundary_wings().count(), 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// ```
/// use editmesh::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        Edge, EdgeLookup, EditableMesh, Face, FaceId, GroupId, SharedVertices, WingId,
        WingedEdgeGraph,
    };
    pub use nalgebra::{Point3, Vector2, Vector3, Vector4};
}

// Re-export nalgebra types for convenience
pub use nalgebra;
