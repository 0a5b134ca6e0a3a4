//! Error types for editmesh.
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A triangle index list whose length is not a multiple of three.
    #[error("triangle index count {len} is not a multiple of 3")]
    InvalidIndexCount {
        /// The offending length.
        len: usize,
    },

    /// A face references a vertex outside of the positions array.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A UV channel outside of `0..=3`.
    #[error("uv channel {channel} is out of range (valid channels are 0, 1, 2 and 3)")]
    InvalidUvChannel {
        /// The requested channel.
        channel: usize,
    },

    /// A per-vertex attribute array does not line up with the positions array.
    #[error("{attribute} has {actual} elements, expected {expected}")]
    AttributeLength {
        /// Name of the attribute.
        attribute: &'static str,
        /// Expected length (usually the vertex count).
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// A vertex index that no coincidence group claims.
    #[error("vertex {vertex} is not registered in any coincident vertex group")]
    MissingCoincidentGroup {
        /// The ungrouped vertex.
        vertex: usize,
    },

    /// A vertex index that appears in more than one coincidence group.
    #[error("vertex {vertex} appears in coincident groups {first} and {second}")]
    OverlappingGroups {
        /// The duplicated vertex.
        vertex: usize,
        /// The first group containing it.
        first: usize,
        /// The second group containing it.
        second: usize,
    },

    /// A coincidence group handle outside of the group array.
    #[error("coincident group {group} is out of range ({count} groups)")]
    GroupOutOfRange {
        /// The requested group.
        group: usize,
        /// Number of groups.
        count: usize,
    },

    /// `Face::to_quad` was called on a face that is not a quad.
    #[error("face has {edges} perimeter edges and cannot be represented as a quad")]
    NotAQuad {
        /// Number of perimeter edges the face has.
        edges: usize,
    },

    /// An index does not fit the requested index buffer width.
    #[error("index {index} does not fit in an index buffer with maximum {max}")]
    IndexOverflow {
        /// The index that overflowed.
        index: usize,
        /// The largest representable index.
        max: usize,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// A serialized mesh written by a newer schema.
    #[error("mesh document version {found} is newer than the supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the document.
        found: u32,
        /// Highest version this build understands.
        supported: u32,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create an attribute length mismatch error.
    pub fn attribute_length(attribute: &'static str, expected: usize, actual: usize) -> Self {
        MeshError::AttributeLength {
            attribute,
            expected,
            actual,
        }
    }
}
