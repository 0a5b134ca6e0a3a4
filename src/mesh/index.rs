//! Index types for mesh elements.
//!
//! Two kinds of indices live here:
//!
//! - [`MeshIndex`], implemented for `u16`, `u32` and `u64`, describes the integer
//!   width of a compiled index buffer (see [`crate::algo::submesh::Submesh::indices_as`]).
//! - Type-safe handles for faces, winged edges and coincident vertex groups, so
//!   that a face handle can never be confused with a group handle.
//!
//! Raw vertex indices stay plain `usize`; they index straight into the positions
//! array and are what faces, edges and coincidence groups store.

use std::fmt::{self, Debug};
use std::hash::Hash;

/// Trait for integer types that can back a compiled index buffer.
///
/// Render meshes are expected to stay within the 16-bit range, but wider
/// buffers are supported for hosts that allow them.
pub trait MeshIndex: Copy + Clone + Eq + PartialEq + Ord + PartialOrd + Hash + Debug + Send + Sync + 'static {
    /// The maximum representable index value.
    const MAX: Self;

    /// Convert from usize, or `None` if the value does not fit.
    fn try_from_usize(v: usize) -> Option<Self>;

    /// Convert to usize.
    fn to_usize(self) -> usize;
}

macro_rules! impl_mesh_index {
    ($ty:ty) => {
        impl MeshIndex for $ty {
            const MAX: Self = <$ty>::MAX;

            #[inline]
            fn try_from_usize(v: usize) -> Option<Self> {
                <$ty>::try_from(v).ok()
            }

            #[inline]
            fn to_usize(self) -> usize {
                self as usize
            }
        }
    };
}

impl_mesh_index!(u16);
impl_mesh_index!(u32);
impl_mesh_index!(u64);

/// A type-safe face index (position in the mesh's face list).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId(u32);

/// A type-safe index into a [`WingedEdgeGraph`](super::WingedEdgeGraph) arena.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct WingId(u32);

/// A type-safe coincident vertex group index (a "common" index).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct GroupId(u32);

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl $name {
            /// Create a new index from a raw value.
            #[inline]
            pub fn new(index: usize) -> Self {
                debug_assert!(index < u32::MAX as usize, "index {} too large", index);
                Self(index as u32)
            }

            /// Get the raw index value.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $display, self.index())
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_index_type!(FaceId, "F");
impl_index_type!(WingId, "W");
impl_index_type!(GroupId, "G");
