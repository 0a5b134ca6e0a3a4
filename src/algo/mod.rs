//! Mesh processing algorithms.
//!
//! - **Normals**: hard and smoothing-aware vertex normals, tangents
//! - **Submeshes**: per-material index buffers in triangle or quad topology
//! - **Compile**: render-ready buffers from an editable mesh
//! - **Smoothing**: smoothing-group bands and angle-based auto smoothing
//! - **Quads**: merging triangle pairs into quads
//! - **Validation**: degenerate triangle and unused vertex removal

pub mod compile;
pub mod normals;
pub mod quads;
pub mod smoothing;
pub mod submesh;
pub mod validation;
