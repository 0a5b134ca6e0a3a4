//! Smoothing groups.
//!
//! A face's smoothing group decides whether its vertex normals are averaged
//! with coincident vertices of neighbouring faces. The numeric values are
//! shared with editing tools and fall into three fixed bands:
//!
//! | Value | Meaning |
//! |-------|---------|
//! | `<= 0` | no smoothing; the face keeps hard normals |
//! | `1..=24`, `> 42` | smooth; faces with the same value are averaged |
//! | `25..=42` | reserved hard range; never averaged |
//!
//! [`apply_smoothing_groups`] assigns groups automatically by comparing the
//! normals on either side of each shared edge.

use std::collections::HashSet;

use crate::error::{MeshError, Result};
use crate::mesh::{EdgeLookup, EditableMesh, Face, FaceId, WingedEdgeGraph};
use nalgebra::Vector3;

use super::normals::hard_normals;

/// Faces with this group are not smoothed.
pub const SMOOTHING_GROUP_NONE: i32 = 0;

/// First value of the smooth range.
pub const SMOOTH_RANGE_MIN: i32 = 1;

/// Last value of the first smooth range.
pub const SMOOTH_RANGE_MAX: i32 = 24;

/// First value of the reserved hard range.
pub const HARD_RANGE_MIN: i32 = 25;

/// Last value of the reserved hard range.
pub const HARD_RANGE_MAX: i32 = 42;

/// Is `group` a smoothing value (outside of the none and hard bands)?
#[inline]
pub fn is_smooth(group: i32) -> bool {
    group > SMOOTHING_GROUP_NONE && (group < HARD_RANGE_MIN || group > HARD_RANGE_MAX)
}

/// Is `group` in the reserved hard range?
#[inline]
pub fn is_hard(group: i32) -> bool {
    (HARD_RANGE_MIN..=HARD_RANGE_MAX).contains(&group)
}

/// The first value at or after `start` that is not in `used`, skipping the hard range.
pub fn next_unused_smoothing_group(start: i32, used: &HashSet<i32>) -> i32 {
    let mut group = start;
    while used.contains(&group) && group < i32::MAX - 1 {
        group += 1;
        if group > SMOOTH_RANGE_MAX && group < HARD_RANGE_MAX {
            group = HARD_RANGE_MAX + 1;
        }
    }
    group
}

/// The first smoothing group no face uses.
pub fn unused_smoothing_group(faces: &[Face]) -> i32 {
    let used: HashSet<i32> = faces.iter().map(|f| f.smoothing_group).collect();
    next_unused_smoothing_group(SMOOTH_RANGE_MIN, &used)
}

/// Options for automatic smoothing group assignment.
#[derive(Debug, Clone)]
pub struct AutoSmoothOptions {
    /// Largest angle, in degrees, between vertex normals across an edge for the
    /// edge to be considered soft. Clamped to `[0, 89.999]`.
    pub angle_threshold: f64,
}

impl Default for AutoSmoothOptions {
    fn default() -> Self {
        Self {
            angle_threshold: 30.0,
        }
    }
}

impl AutoSmoothOptions {
    /// Create options with the specified angle threshold.
    pub fn with_angle_threshold(mut self, degrees: f64) -> Self {
        self.angle_threshold = degrees;
        self
    }

    /// The minimum absolute cosine between normals on a soft edge.
    pub fn cos_threshold(&self) -> f64 {
        self.angle_threshold.clamp(0.0, 89.999).to_radians().cos().abs()
    }
}

/// Assign smoothing groups to `selection` by flood fill across soft edges.
///
/// The selected faces are first reset to [`SMOOTHING_GROUP_NONE`]. Each
/// unvisited face then seeds a fresh unused group which spreads to every
/// connected selected face reachable across soft edges. A seed with no soft
/// neighbour goes back to no smoothing.
///
/// Only faces in `selection` are considered neighbours; the rest of the mesh
/// keeps its groups.
///
/// # Example
///
/// ```
/// use editmesh::prelude::*;
/// use editmesh::algo::smoothing::{apply_smoothing_groups, AutoSmoothOptions};
///
/// let mut mesh = EditableMesh::new(
///     vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(1.0, 1.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///     ],
///     vec![Face::new(vec![0, 1, 2]).unwrap(), Face::new(vec![3, 4, 5]).unwrap()],
/// )
/// .unwrap();
///
/// let all: Vec<FaceId> = mesh.face_ids().collect();
/// apply_smoothing_groups(&mut mesh, &all, &AutoSmoothOptions::default()).unwrap();
/// assert_eq!(mesh.faces()[0].smoothing_group, mesh.faces()[1].smoothing_group);
/// ```
pub fn apply_smoothing_groups(
    mesh: &mut EditableMesh,
    selection: &[FaceId],
    options: &AutoSmoothOptions,
) -> Result<()> {
    let face_count = mesh.faces.len();
    if let Some(bad) = selection.iter().find(|f| f.index() >= face_count) {
        return Err(MeshError::invalid_param("face", bad.index(), "face index out of range"));
    }

    let mut groups: Vec<i32> = mesh.faces.iter().map(|f| f.smoothing_group).collect();
    for f in selection {
        groups[f.index()] = SMOOTHING_GROUP_NONE;
    }

    let normals = hard_normals(&mesh.positions, &mesh.faces)?;
    let threshold = options.cos_threshold();
    let graph = WingedEdgeGraph::build_subset(&mesh.faces, &mesh.shared, selection.iter().copied())?;

    let mut used: HashSet<i32> = groups.iter().copied().collect();
    let mut group = next_unused_smoothing_group(SMOOTH_RANGE_MIN, &used);
    let mut processed: HashSet<FaceId> = HashSet::with_capacity(selection.len());
    let mut assigned = 0usize;

    for (seed, seed_wing) in graph.first_wings() {
        if !processed.insert(seed) {
            continue;
        }
        groups[seed.index()] = group;

        let mut found = false;
        let mut stack = vec![seed_wing];
        while let Some(start) = stack.pop() {
            for border in graph.cycle(start) {
                let wing = graph.wing(border);
                let Some(opp) = wing.opposite else {
                    continue;
                };
                let other = graph.wing(opp);
                if groups[other.face.index()] == SMOOTHING_GROUP_NONE
                    && is_soft_edge(&normals, &wing.edge, &other.edge, threshold)
                    && processed.insert(other.face)
                {
                    found = true;
                    groups[other.face.index()] = group;
                    stack.push(opp);
                }
            }
        }

        if found {
            used.insert(group);
            group = next_unused_smoothing_group(group, &used);
            assigned += 1;
        } else {
            groups[seed.index()] = SMOOTHING_GROUP_NONE;
        }
    }

    for (face, g) in mesh.faces.iter_mut().zip(groups) {
        face.smoothing_group = g;
    }

    log::debug!(
        "auto smoothing: {} faces, {} groups assigned (threshold {:.3} deg)",
        selection.len(),
        assigned,
        options.angle_threshold
    );

    Ok(())
}

/// Compare the normals at both ends of an edge shared by two faces.
fn is_soft_edge(
    normals: &[Vector3<f64>],
    left: &EdgeLookup,
    right: &EdgeLookup,
    threshold: f64,
) -> bool {
    let unit = |v: usize| normals[v].try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros);

    let lx = unit(left.local.a);
    let ly = unit(left.local.b);
    let rx = unit(if right.common.a == left.common.a {
        right.local.a
    } else {
        right.local.b
    });
    let ry = unit(if right.common.b == left.common.b {
        right.local.b
    } else {
        right.local.a
    });

    lx.dot(&rx).abs() > threshold && ly.dot(&ry).abs() > threshold
}
