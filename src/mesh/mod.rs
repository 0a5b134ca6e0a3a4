//! Core mesh data structures.
//!
//! This module provides the editable polygon mesh and the types it is built
//! from.
//!
//! # Overview
//!
//! The primary type is [`EditableMesh`], which stores geometry as unwelded
//! triangle soup: every [`Face`] owns its own vertex slots, so UVs, materials
//! and smoothing can differ per face. Vertices that occupy the same position
//! are tied together by [`SharedVertices`], a partition of all vertex indices
//! into coincident groups.
//!
//! Adjacency is not stored. A [`WingedEdgeGraph`] is rebuilt from the faces and
//! their coincident groups whenever an operation needs neighbours.
//!
//! # Index Types
//!
//! - [`FaceId`] - Identifies a face in the mesh's face list
//! - [`WingId`] - Identifies a wing in a [`WingedEdgeGraph`]
//! - [`GroupId`] - Identifies a coincident vertex group
//!
//! Compiled index buffers can be narrowed to `u16`, `u32` or `u64` through the
//! [`MeshIndex`] trait.
//!
//! # Construction
//!
//! ```
//! use editmesh::mesh::{EditableMesh, Face};
//! use nalgebra::Point3;
//!
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![Face::new(vec![0, 1, 2]).unwrap()];
//!
//! let mesh = EditableMesh::new(positions, faces).unwrap();
//! assert_eq!(mesh.shared_vertices().len(), 3);
//! ```

mod edge;
mod editable;
mod face;
mod index;
mod shared;
mod winged;

pub use edge::{Edge, EdgeLookup};
pub use editable::{EditableMesh, UV_CHANNEL_COUNT, WHITE};
pub use face::{Anchor, AutoUnwrapSettings, Face, Fill};
pub(crate) use face::check_face_indices;
pub use index::{FaceId, GroupId, MeshIndex, WingId};
pub use shared::{
    SharedVertex, SharedVertexLookup, SharedVertices, WeldOptions, DEFAULT_WELD_RESOLUTION,
};
pub use winged::{
    sort_common_indices_by_adjacency, sort_edges_by_adjacency, WingCycleIter, WingedEdge,
    WingedEdgeGraph,
};
