//! Vertex normals and tangents.
//!
//! Normals are computed in two passes:
//!
//! 1. [`hard_normals`]: every triangle's unit normal is added to its three
//!    vertices, and each vertex is divided by the number of triangles touching
//!    it. This is a plain average, not area or angle weighted.
//! 2. [`smooth_normals`]: within each coincident vertex group, members whose
//!    faces share a smoothing group are averaged and re-normalized. Members in
//!    the none or hard bands keep their hard normal.
//!
//! [`tangents`] follows Lengyel's method: per-triangle UV gradients are
//! accumulated per vertex, orthonormalized against the vertex normal, and the
//! handedness is stored in `w`.

use nalgebra::{Point3, Vector2, Vector3, Vector4};

use crate::error::{MeshError, Result};
use crate::mesh::{check_face_indices, Face, SharedVertices};

use super::smoothing::{is_smooth, SMOOTHING_GROUP_NONE};

/// Triangles whose UV determinant is below this are skipped by [`tangents`].
const UV_DETERMINANT_EPSILON: f64 = 1e-12;

/// Unit normal of the triangle `(p0, p1, p2)`, or zero if it is degenerate.
#[inline]
pub fn triangle_normal(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> Vector3<f64> {
    (p1 - p0)
        .cross(&(p2 - p0))
        .try_normalize(f64::EPSILON)
        .unwrap_or_else(Vector3::zeros)
}

/// Per-vertex face normals, averaged over the triangles touching each vertex.
///
/// Vertices no triangle references get a zero normal.
///
/// # Example
///
/// ```
/// use editmesh::algo::normals::hard_normals;
/// use editmesh::mesh::Face;
/// use editmesh::nalgebra::{Point3, Vector3};
///
/// let positions = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let faces = vec![Face::new(vec![0, 1, 2]).unwrap()];
/// let normals = hard_normals(&positions, &faces).unwrap();
/// assert!((normals[0] - Vector3::z()).norm() < 1e-10);
/// ```
pub fn hard_normals(positions: &[Point3<f64>], faces: &[Face]) -> Result<Vec<Vector3<f64>>> {
    check_face_indices(faces, positions.len())?;

    let mut normals = vec![Vector3::zeros(); positions.len()];
    let mut counts = vec![0u32; positions.len()];

    for face in faces {
        for [a, b, c] in face.triangles() {
            let n = triangle_normal(&positions[a], &positions[b], &positions[c]);
            for v in [a, b, c] {
                normals[v] += n;
                counts[v] += 1;
            }
        }
    }

    for (n, &count) in normals.iter_mut().zip(&counts) {
        if count > 0 {
            *n /= count as f64;
        }
    }

    Ok(normals)
}

/// Average normals across coincident vertices that share a smoothing group.
///
/// `normals` is updated in place and must line up with the vertex indices
/// stored in `faces` and `shared`.
pub fn smooth_normals(
    normals: &mut [Vector3<f64>],
    faces: &[Face],
    shared: &SharedVertices,
) -> Result<()> {
    check_face_indices(faces, normals.len())?;

    let mut smoothing = vec![SMOOTHING_GROUP_NONE; normals.len()];
    for face in faces {
        for &v in face.indices() {
            smoothing[v] = face.smoothing_group;
        }
    }

    // (smoothing group, summed normal, members)
    let mut buckets: Vec<(i32, Vector3<f64>, Vec<usize>)> = Vec::new();

    for (_, group) in shared.iter() {
        buckets.clear();

        for v in group.iter() {
            let normal = normals.get(v).ok_or_else(|| {
                MeshError::invalid_param(
                    "shared vertex",
                    v,
                    "index is outside of the positions array",
                )
            })?;
            let sg = smoothing[v];
            if !is_smooth(sg) {
                continue;
            }
            match buckets.iter_mut().find(|(g, _, _)| *g == sg) {
                Some((_, sum, members)) => {
                    *sum += normal;
                    members.push(v);
                }
                None => buckets.push((sg, *normal, vec![v])),
            }
        }

        for (_, sum, members) in &buckets {
            let average = sum / members.len() as f64;
            let Some(unit) = average.try_normalize(f64::EPSILON) else {
                continue;
            };
            for &v in members {
                normals[v] = unit;
            }
        }
    }

    Ok(())
}

/// Hard normals followed by smoothing-group averaging.
pub fn calculate_normals(
    positions: &[Point3<f64>],
    faces: &[Face],
    shared: &SharedVertices,
) -> Result<Vec<Vector3<f64>>> {
    let mut normals = hard_normals(positions, faces)?;
    smooth_normals(&mut normals, faces, shared)?;
    Ok(normals)
}

/// Per-vertex tangents with handedness in `w`.
///
/// `uvs` and `normals` must have one entry per position. Triangles whose UVs
/// are degenerate (zero area in UV space) contribute nothing.
pub fn tangents(
    positions: &[Point3<f64>],
    uvs: &[Vector2<f64>],
    normals: &[Vector3<f64>],
    faces: &[Face],
) -> Result<Vec<Vector4<f64>>> {
    let n = positions.len();
    if uvs.len() != n {
        return Err(MeshError::attribute_length("uv0", n, uvs.len()));
    }
    if normals.len() != n {
        return Err(MeshError::attribute_length("normals", n, normals.len()));
    }
    check_face_indices(faces, n)?;

    let mut tan1 = vec![Vector3::zeros(); n];
    let mut tan2 = vec![Vector3::zeros(); n];
    let mut skipped = 0usize;

    for face in faces {
        for [i1, i2, i3] in face.triangles() {
            let e1 = positions[i2] - positions[i1];
            let e2 = positions[i3] - positions[i1];

            let (s1, t1) = (uvs[i2].x - uvs[i1].x, uvs[i2].y - uvs[i1].y);
            let (s2, t2) = (uvs[i3].x - uvs[i1].x, uvs[i3].y - uvs[i1].y);

            let det = s1 * t2 - s2 * t1;
            if det.abs() < UV_DETERMINANT_EPSILON {
                skipped += 1;
                continue;
            }
            let r = 1.0 / det;

            let sdir = (e1 * t2 - e2 * t1) * r;
            let tdir = (e2 * s1 - e1 * s2) * r;

            for v in [i1, i2, i3] {
                tan1[v] += sdir;
                tan2[v] += tdir;
            }
        }
    }

    if skipped > 0 {
        log::warn!("skipped {} triangles with degenerate UVs while generating tangents", skipped);
    }

    let tangents = (0..n)
        .map(|a| {
            let (normal, tangent) = ortho_normalize(&normals[a], &tan1[a]);
            let w = if normal.cross(&tangent).dot(&tan2[a]) < 0.0 {
                -1.0
            } else {
                1.0
            };
            Vector4::new(tangent.x, tangent.y, tangent.z, w)
        })
        .collect();

    Ok(tangents)
}

/// Normalize `n`, then make `t` a unit vector orthogonal to it.
///
/// Falls back to arbitrary axes when either input is degenerate.
fn ortho_normalize(n: &Vector3<f64>, t: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let n = n.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::z);

    if let Some(t) = (t - n * n.dot(t)).try_normalize(1e-12) {
        return (n, t);
    }

    // Any perpendicular, built from the axis least aligned with n
    let axis = if n.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
    let t = (axis - n * n.dot(&axis)).normalize();
    (n, t)
}
