//! Triangle pair to quad merging.
//!
//! Every pair of adjacent triangles that [`WingedEdgeGraph::make_quad`] accepts
//! is scored on three criteria, each contributing up to one third:
//!
//! 1. agreement of the normals of the two halves
//! 2. how close the corners are to right angles
//! 3. how parallel the opposite sides are
//!
//! A face merges with its best scoring neighbour only if that neighbour's best
//! neighbour is the face itself.

use std::collections::{HashMap, HashSet};

use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{check_face_indices, Edge, EditableMesh, Face, FaceId, GroupId, WingId, WingedEdgeGraph};

use super::normals::triangle_normal;

/// Options for [`to_quads`].
#[derive(Debug, Clone)]
pub struct QuadOptions {
    /// Pairs whose half normals have a dot product below this score zero.
    pub normal_threshold: f64,

    /// Fold the second triangle's corners onto coincident corners of the
    /// first, so the merged face references four vertices. Folded corners
    /// that no face uses any more are removed.
    pub collapse_coincident: bool,
}

impl Default for QuadOptions {
    fn default() -> Self {
        Self {
            normal_threshold: 0.9,
            collapse_coincident: true,
        }
    }
}

impl QuadOptions {
    /// Set the normal agreement threshold.
    pub fn with_normal_threshold(mut self, threshold: f64) -> Self {
        self.normal_threshold = threshold;
        self
    }

    /// Enable or disable collapsing coincident corners.
    pub fn with_collapse_coincident(mut self, collapse: bool) -> Self {
        self.collapse_coincident = collapse;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.normal_threshold.is_finite() || !(-1.0..=1.0).contains(&self.normal_threshold) {
            return Err(MeshError::invalid_param(
                "normal_threshold",
                self.normal_threshold,
                "must be within [-1, 1]",
            ));
        }
        Ok(())
    }
}

/// Score of the quad formed by the faces of `left` and `right`, in `[0, 1]`.
///
/// Returns 0 when the faces do not form a quad or when the two halves bend
/// more than `normal_threshold` allows.
pub fn quad_score(
    graph: &WingedEdgeGraph,
    positions: &[Point3<f64>],
    left: WingId,
    right: WingId,
    normal_threshold: f64,
) -> f64 {
    let Some(quad) = graph.make_quad(left, right) else {
        return 0.0;
    };
    let p = quad.map(|i| positions[i]);

    let left_normal = triangle_normal(&p[0], &p[1], &p[2]);
    let right_normal = triangle_normal(&p[2], &p[3], &p[0]);
    let mut score = left_normal.dot(&right_normal);
    if score < normal_threshold {
        return 0.0;
    }

    let side = |from: usize, to: usize| (p[to] - p[from]).normalize();
    let a = side(0, 1);
    let b = side(1, 2);
    let c = side(2, 3);
    let d = side(3, 0);

    let corners = a.dot(&b).abs() + b.dot(&c).abs() + c.dot(&d).abs() + d.dot(&a).abs();
    score += 1.0 - corners * 0.25;

    score += a.dot(&c).abs() * 0.5;
    score += b.dot(&d).abs() * 0.5;

    score * 0.33
}

/// The face across the best scoring edge of the face owning `wing`.
fn best_connection(
    graph: &WingedEdgeGraph,
    wing: WingId,
    connections: &HashMap<Edge, f64>,
) -> Option<FaceId> {
    let mut best = 0.0;
    let mut face = None;
    for id in graph.cycle(wing) {
        let w = graph.wing(id);
        let Some(opposite) = w.opposite else {
            continue;
        };
        if let Some(&score) = connections.get(&w.edge.common) {
            if score > best {
                best = score;
                face = Some(graph.wing(opposite).face);
            }
        }
    }
    face
}

/// Merge pairs of triangles in `selection` into quads.
///
/// Merged faces keep the first face's submesh, smoothing group and UV
/// settings. Faces that are not merged keep their relative order; merged faces
/// are appended after them. Returns the ids of the merged faces.
///
/// # Example
///
/// ```
/// use editmesh::prelude::*;
/// use editmesh::algo::quads::{to_quads, QuadOptions};
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
/// let merged = to_quads(&mut mesh, &all, &QuadOptions::default()).unwrap();
/// assert_eq!(merged.len(), 1);
/// assert!(mesh.faces()[0].is_quad());
/// assert_eq!(mesh.vertex_count(), 4);
/// ```
pub fn to_quads(
    mesh: &mut EditableMesh,
    selection: &[FaceId],
    options: &QuadOptions,
) -> Result<Vec<FaceId>> {
    options.validate()?;
    check_face_indices(&mesh.faces, mesh.positions.len())?;

    let graph = WingedEdgeGraph::build_subset(&mesh.faces, &mesh.shared, selection.iter().copied())?;

    let mut connections: HashMap<Edge, f64> = HashMap::new();
    for (id, wing) in graph.wings() {
        if let Some(opposite) = wing.opposite {
            connections.entry(wing.edge.common).or_insert_with(|| {
                quad_score(&graph, &mesh.positions, id, opposite, options.normal_threshold)
            });
        }
    }

    let mut processed: HashSet<FaceId> = HashSet::new();
    let mut pairs: Vec<(FaceId, FaceId)> = Vec::new();

    for (face, first) in graph.first_wings() {
        if !processed.insert(face) {
            continue;
        }

        let mut best = 0.0;
        let mut buddy = None;
        for id in graph.cycle(first) {
            let wing = graph.wing(id);
            let Some(opposite) = wing.opposite else {
                continue;
            };
            let other = graph.wing(opposite).face;
            if processed.contains(&other) {
                continue;
            }
            if let Some(&score) = connections.get(&wing.edge.common) {
                if score > best && best_connection(&graph, opposite, &connections) == Some(face) {
                    best = score;
                    buddy = Some(other);
                }
            }
        }

        if let Some(other) = buddy {
            processed.insert(other);
            pairs.push((face, other));
        }
    }

    if pairs.is_empty() {
        log::debug!("no triangle pairs to merge among {} faces", selection.len());
        return Ok(Vec::new());
    }

    let lookup = mesh.shared.lookup();
    let mut consumed = vec![false; mesh.faces.len()];
    let mut merged: Vec<Face> = Vec::with_capacity(pairs.len());
    let mut folded: Vec<usize> = Vec::new();

    for &(l, r) in &pairs {
        let left = &mesh.faces[l.index()];
        let right = &mesh.faces[r.index()];

        let mut indices = left.indices().to_vec();
        if options.collapse_coincident {
            let mut by_group: HashMap<GroupId, usize> = HashMap::with_capacity(3);
            for &v in left.indices() {
                if let Some(&g) = lookup.get(&v) {
                    by_group.entry(g).or_insert(v);
                }
            }
            for &v in right.indices() {
                let target = lookup
                    .get(&v)
                    .and_then(|g| by_group.get(g))
                    .copied()
                    .unwrap_or(v);
                if target != v {
                    folded.push(v);
                }
                indices.push(target);
            }
        } else {
            indices.extend_from_slice(right.indices());
        }

        let mut face = left.clone();
        face.set_indices(&indices)?;
        merged.push(face);

        consumed[l.index()] = true;
        consumed[r.index()] = true;
    }

    let faces = std::mem::take(&mut mesh.faces);
    let mut kept: Vec<Face> = faces
        .into_iter()
        .zip(consumed)
        .filter_map(|(face, gone)| (!gone).then_some(face))
        .collect();
    let first = kept.len();
    kept.extend(merged);
    mesh.faces = kept;

    log::debug!("merged {} triangle pairs into quads", pairs.len());

    // Folded corners may still be used by faces outside the merged pairs
    if !folded.is_empty() {
        let used: HashSet<usize> = mesh
            .faces
            .iter()
            .flat_map(|f| f.indices().iter().copied())
            .collect();
        folded.retain(|v| !used.contains(v));
        folded.sort_unstable();
        folded.dedup();
        mesh.remove_vertices(&folded)?;
        log::debug!("removed {} folded vertices", folded.len());
    }

    Ok((first..mesh.faces.len()).map(FaceId::new).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
        Point3::new(x, y, z)
    }

    /// Unit square split along its 1-2 diagonal, one triangle per face.
    fn split_square() -> EditableMesh {
        let positions = vec![
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(0.0, 1.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(0.0, 1.0, 0.0),
        ];
        let faces = vec![
            Face::new(vec![0, 1, 2]).unwrap().with_submesh(2),
            Face::new(vec![3, 4, 5]).unwrap(),
        ];
        EditableMesh::new(positions, faces).unwrap()
    }

    /// Two unit squares side by side, each split into two triangles.
    fn strip() -> EditableMesh {
        let mut mesh = split_square();
        let positions = vec![
            p(1.0, 0.0, 0.0),
            p(2.0, 0.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(2.0, 0.0, 0.0),
            p(2.0, 1.0, 0.0),
            p(1.0, 1.0, 0.0),
        ];
        let faces = vec![
            Face::new(vec![0, 1, 2]).unwrap(),
            Face::new(vec![3, 4, 5]).unwrap(),
        ];
        mesh.append_geometry(positions, faces, None).unwrap();
        mesh.rebuild_shared_vertices(&Default::default()).unwrap();
        mesh
    }

    fn all(mesh: &EditableMesh) -> Vec<FaceId> {
        mesh.face_ids().collect()
    }

    #[test]
    fn test_square_score() {
        let mesh = split_square();
        let graph = mesh.winged_edges().unwrap();
        let (wing, opposite) = graph
            .wings()
            .find_map(|(id, w)| w.opposite.map(|o| (id, o)))
            .unwrap();

        let score = quad_score(&graph, mesh.positions(), wing, opposite, 0.9);
        assert!((score - 0.99).abs() < 1e-10);
    }

    #[test]
    fn test_merge_split_square() {
        let mut mesh = split_square();
        let ids = all(&mesh);
        let merged = to_quads(&mut mesh, &ids, &QuadOptions::default()).unwrap();

        assert_eq!(merged, vec![FaceId::new(0)]);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.vertex_count(), 4);

        let face = &mesh.faces()[0];
        assert!(face.is_quad());
        assert_eq!(face.triangle_count(), 2);
        assert_eq!(face.submesh_index, 2);
        assert!(mesh.validate().is_ok());

        let normal = mesh.face_normal(merged[0]).unwrap();
        assert!((normal - nalgebra::Vector3::z()).norm() < 1e-10);
    }

    #[test]
    fn test_merge_keeps_spare_vertices() {
        let mut mesh = split_square();
        mesh.append_geometry(vec![p(9.0, 9.0, 0.0)], Vec::new(), None).unwrap();

        let ids = all(&mesh);
        let merged = to_quads(&mut mesh, &ids, &QuadOptions::default()).unwrap();

        assert_eq!(merged.len(), 1);
        assert_eq!(mesh.vertex_count(), 5);
        assert_eq!(mesh.positions()[4], p(9.0, 9.0, 0.0));
        assert!(mesh.faces()[0].indices().iter().all(|&v| v < 4));
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_merge_without_collapse() {
        let mut mesh = split_square();
        let options = QuadOptions::default().with_collapse_coincident(false);
        let ids = all(&mesh);
        let merged = to_quads(&mut mesh, &ids, &options).unwrap();

        assert_eq!(merged.len(), 1);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.faces()[0].indices(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_folded_pair_not_merged() {
        let mut mesh = split_square();
        mesh.positions_mut()[4] = p(0.5, 0.5, 1.0);
        let before = mesh.faces().to_vec();

        let ids = all(&mesh);

        let merged = to_quads(&mut mesh, &ids, &QuadOptions::default()).unwrap();
        assert!(merged.is_empty());
        assert_eq!(mesh.faces(), &before[..]);
        assert_eq!(mesh.vertex_count(), 6);
    }

    #[test]
    fn test_mutual_best_pairing() {
        let mut mesh = strip();
        let ids = all(&mesh);
        let merged = to_quads(&mut mesh, &ids, &QuadOptions::default()).unwrap();

        // Each square's halves pair up rather than the parallelogram across the seam
        assert_eq!(merged.len(), 2);
        assert_eq!(mesh.face_count(), 2);
        assert!(mesh.faces().iter().all(|f| f.is_quad()));
        assert_eq!(mesh.vertex_count(), 8);

        let xs: Vec<f64> = merged
            .iter()
            .map(|&id| {
                let face = mesh.face(id).unwrap();
                face.distinct_indices().iter().map(|&v| mesh.positions()[v].x).sum::<f64>()
            })
            .collect();
        assert!((xs[0] - 2.0).abs() < 1e-10);
        assert!((xs[1] - 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_selection_limits_pairs() {
        let mut mesh = strip();
        let selection = [FaceId::new(1), FaceId::new(2)];
        let merged = to_quads(&mut mesh, &selection, &QuadOptions::default()).unwrap();

        // Only the seam pair is selected, and it scores above zero
        assert_eq!(merged.len(), 1);
        assert_eq!(mesh.face_count(), 3);
        assert_eq!(mesh.faces()[2].distinct_indices().len(), 4);
    }

    #[test]
    fn test_invalid_threshold() {
        let mut mesh = split_square();
        let options = QuadOptions::default().with_normal_threshold(f64::NAN);
        let ids = all(&mesh);
        assert!(to_quads(&mut mesh, &ids, &options).is_err());
    }
}
