//! Mesh cleanup.
//!
//! - [`remove_degenerate_triangles`]: drops zero-area triangles and triangles
//!   with two corners in one coincident group, then removes faces left empty
//! - [`remove_unused_vertices`]: deletes vertices no face references and
//!   compacts every per-vertex array

use std::collections::{HashMap, HashSet};

use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{check_face_indices, EditableMesh};

/// Triangles with an area at or below this are degenerate.
pub const DEGENERATE_AREA_EPSILON: f64 = f64::EPSILON;

/// Area of the triangle `(a, b, c)`.
#[inline]
pub fn triangle_area(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    (b - a).cross(&(c - a)).norm() * 0.5
}

/// Does any face contain a zero-area triangle?
pub fn contains_degenerate_triangles(mesh: &EditableMesh) -> Result<bool> {
    check_face_indices(&mesh.faces, mesh.positions.len())?;
    let p = &mesh.positions;
    Ok(mesh.faces.iter().any(|face| {
        face.triangles()
            .any(|[a, b, c]| triangle_area(&p[a], &p[b], &p[c]) <= DEGENERATE_AREA_EPSILON)
    }))
}

/// Remove degenerate triangles, empty faces and the vertices they leave unused.
///
/// Within each face, distinct vertices that turn out to be coincident are
/// collapsed onto the first one seen. Returns the removed vertex indices, in
/// terms of the mesh before the call.
pub fn remove_degenerate_triangles(mesh: &mut EditableMesh) -> Result<Vec<usize>> {
    check_face_indices(&mesh.faces, mesh.positions.len())?;
    let lookup = mesh.shared.lookup();
    let positions = &mesh.positions;

    let mut rebuilt = Vec::with_capacity(mesh.faces.len());
    let mut dropped_triangles = 0usize;

    for face in &mesh.faces {
        let mut first_of_group: HashMap<usize, usize> = HashMap::with_capacity(8);
        let mut tris: Vec<usize> = Vec::with_capacity(face.indices().len());

        for [a, b, c] in face.triangles() {
            if triangle_area(&positions[a], &positions[b], &positions[c]) <= DEGENERATE_AREA_EPSILON {
                dropped_triangles += 1;
                continue;
            }

            let mut groups = [0usize; 3];
            for (slot, v) in [a, b, c].into_iter().enumerate() {
                groups[slot] = lookup
                    .get(&v)
                    .map(|g| g.index())
                    .ok_or(MeshError::MissingCoincidentGroup { vertex: v })?;
            }
            if groups[0] == groups[1] || groups[0] == groups[2] || groups[1] == groups[2] {
                dropped_triangles += 1;
                continue;
            }

            for (slot, v) in [a, b, c].into_iter().enumerate() {
                tris.push(*first_of_group.entry(groups[slot]).or_insert(v));
            }
        }

        if !tris.is_empty() {
            let mut face = face.clone();
            face.set_indices(&tris)?;
            rebuilt.push(face);
        }
    }

    let dropped_faces = mesh.faces.len() - rebuilt.len();
    mesh.faces = rebuilt;

    log::debug!(
        "removed {} degenerate triangles and {} empty faces",
        dropped_triangles,
        dropped_faces
    );

    remove_unused_vertices(mesh)
}

/// Delete vertices that no face references.
///
/// Returns the removed indices, in terms of the mesh before the call.
pub fn remove_unused_vertices(mesh: &mut EditableMesh) -> Result<Vec<usize>> {
    let used: HashSet<usize> = mesh
        .faces
        .iter()
        .flat_map(|f| f.indices().iter().copied())
        .collect();
    let removed: Vec<usize> = (0..mesh.positions.len()).filter(|v| !used.contains(v)).collect();

    mesh.remove_vertices(&removed)?;

    if !removed.is_empty() {
        log::debug!("removed {} unused vertices", removed.len());
    }
    Ok(removed)
}
