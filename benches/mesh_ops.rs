//! Benchmarks for mesh operations.

use criterion::{criterion_group, criterion_main, Criterion};
use editmesh::algo::compile::CompileOptions;
use editmesh::algo::normals;
use editmesh::algo::quads::{to_quads, QuadOptions};
use editmesh::algo::submesh::Topology;
use editmesh::mesh::{SharedVertices, DEFAULT_WELD_RESOLUTION};
use editmesh::prelude::*;

/// An `n` by `n` grid of quads with unshared corners, as triangle soup.
fn grid_soup(n: usize) -> (Vec<Point3<f64>>, Vec<Face>) {
    let mut positions = Vec::with_capacity(n * n * 4);
    let mut faces = Vec::with_capacity(n * n);

    for j in 0..n {
        for i in 0..n {
            let (x, y) = (i as f64, j as f64);
            let base = positions.len();
            positions.push(Point3::new(x, y, 0.0));
            positions.push(Point3::new(x + 1.0, y, 0.0));
            positions.push(Point3::new(x, y + 1.0, 0.0));
            positions.push(Point3::new(x + 1.0, y + 1.0, 0.0));

            let face = Face::new(vec![base, base + 1, base + 2, base + 1, base + 3, base + 2])
                .unwrap()
                .with_submesh((i + j) % 2)
                .with_smoothing_group(1);
            faces.push(face);
        }
    }

    (positions, faces)
}

/// The same grid with every quad split into two triangle faces.
fn triangle_grid(n: usize) -> EditableMesh {
    let (positions, quads) = grid_soup(n);
    let mut faces = Vec::with_capacity(quads.len() * 2);
    for quad in &quads {
        let i = quad.indices();
        faces.push(Face::new(i[..3].to_vec()).unwrap());
        faces.push(Face::new(i[3..].to_vec()).unwrap());
    }
    EditableMesh::new(positions, faces).unwrap()
}

fn bench_mesh_construction(c: &mut Criterion) {
    let (positions, faces) = grid_soup(50);

    c.bench_function("weld_grid_50x50", |b| {
        b.iter(|| SharedVertices::from_positions(&positions, DEFAULT_WELD_RESOLUTION).unwrap());
    });

    c.bench_function("build_grid_50x50", |b| {
        b.iter(|| EditableMesh::new(positions.clone(), faces.clone()).unwrap());
    });
}

fn bench_adjacency(c: &mut Criterion) {
    let (positions, faces) = grid_soup(50);
    let mesh = EditableMesh::new(positions, faces).unwrap();

    c.bench_function("winged_edges_50x50", |b| {
        b.iter(|| mesh.winged_edges().unwrap());
    });

    let triangles = triangle_grid(20);
    let all: Vec<FaceId> = triangles.face_ids().collect();
    c.bench_function("to_quads_20x20", |b| {
        b.iter(|| {
            let mut mesh = triangles.clone();
            to_quads(&mut mesh, &all, &QuadOptions::default()).unwrap()
        });
    });
}

fn bench_derived_data(c: &mut Criterion) {
    let (positions, faces) = grid_soup(50);
    let mut mesh = EditableMesh::new(positions, faces).unwrap();
    let uvs = mesh.positions().iter().map(|p| Vector2::new(p.x, p.y)).collect();
    mesh.set_uv0(uvs).unwrap();

    c.bench_function("smooth_normals_50x50", |b| {
        b.iter(|| {
            normals::calculate_normals(mesh.positions(), mesh.faces(), mesh.shared_vertices())
                .unwrap()
        });
    });

    c.bench_function("compile_triangles_50x50", |b| {
        b.iter(|| mesh.compile(&CompileOptions::default()).unwrap());
    });

    c.bench_function("compile_quads_50x50", |b| {
        let options = CompileOptions::default().with_topology(Topology::Quads);
        b.iter(|| mesh.compile(&options).unwrap());
    });
}

criterion_group!(benches, bench_mesh_construction, bench_adjacency, bench_derived_data);
criterion_main!(benches);
