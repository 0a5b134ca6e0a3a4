//! editmesh CLI - editable mesh inspection and cleanup tool.
//!
//! Usage: editmesh <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `editmesh --help` for available commands. Set `RUST_LOG=debug` for
//! operation summaries.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

use editmesh::algo::compile::CompileOptions;
use editmesh::algo::quads::{to_quads, QuadOptions};
use editmesh::algo::smoothing::{apply_smoothing_groups, is_smooth, AutoSmoothOptions};
use editmesh::algo::submesh::Topology;
use editmesh::algo::validation::remove_degenerate_triangles;
use editmesh::io;
use editmesh::mesh::{EditableMesh, FaceId, WeldOptions, DEFAULT_WELD_RESOLUTION};

#[derive(Parser)]
#[command(name = "editmesh")]
#[command(author, version, about = "Editable mesh CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Rebuild coincident vertex groups by welding positions
    Weld {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Grid cells per unit used to match positions
        #[arg(short, long, default_value_t = DEFAULT_WELD_RESOLUTION)]
        resolution: f64,
    },

    /// Compile render buffers and print a summary
    Compile {
        /// Input mesh file
        input: PathBuf,

        /// Preferred index buffer topology
        #[arg(short, long, value_enum, default_value = "triangles")]
        topology: TopologyArg,

        /// Number of material slots (default: derived from the faces)
        #[arg(short, long)]
        submeshes: Option<usize>,

        /// Skip tangent generation
        #[arg(long)]
        no_tangents: bool,

        /// Also export the compiled mesh as OBJ
        #[arg(long)]
        obj: Option<PathBuf>,
    },

    /// Assign smoothing groups by angle
    AutoSmooth {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Largest angle in degrees across a soft edge
        #[arg(short, long, default_value = "30")]
        angle: f64,
    },

    /// Merge triangle pairs into quads
    Quadify {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Minimum dot product between the two halves' normals
        #[arg(short = 'n', long, default_value = "0.9")]
        normal_threshold: f64,

        /// Keep both triangles' vertices instead of collapsing coincident corners
        #[arg(long)]
        keep_coincident: bool,
    },

    /// Remove degenerate triangles and unused vertices
    Clean {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum TopologyArg {
    /// Triangle lists
    Triangles,
    /// Quad lists where every face in a submesh is a quad
    Quads,
}

impl From<TopologyArg> for Topology {
    fn from(arg: TopologyArg) -> Self {
        match arg {
            TopologyArg::Triangles => Topology::Triangles,
            TopologyArg::Quads => Topology::Quads,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input } => {
            cmd_info(&input)?;
        }

        Commands::Weld {
            input,
            output,
            resolution,
        } => {
            cmd_weld(&input, &output, resolution)?;
        }

        Commands::Compile {
            input,
            topology,
            submeshes,
            no_tangents,
            obj,
        } => {
            cmd_compile(&input, topology, submeshes, no_tangents, obj.as_ref())?;
        }

        Commands::AutoSmooth {
            input,
            output,
            angle,
        } => {
            cmd_auto_smooth(&input, &output, angle)?;
        }

        Commands::Quadify {
            input,
            output,
            normal_threshold,
            keep_coincident,
        } => {
            cmd_quadify(&input, &output, normal_threshold, keep_coincident)?;
        }

        Commands::Clean { input, output } => {
            cmd_clean(&input, &output)?;
        }
    }

    Ok(())
}

fn load(input: &PathBuf) -> Result<EditableMesh, Box<dyn std::error::Error>> {
    let mesh = io::load(input)?;
    println!(
        "Loaded: {} vertices, {} faces",
        mesh.vertex_count(),
        mesh.face_count()
    );
    Ok(mesh)
}

fn all_faces(mesh: &EditableMesh) -> Vec<FaceId> {
    mesh.face_ids().collect()
}

fn cmd_info(input: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.vertex_count());
    println!("Coincident groups: {}", mesh.shared_vertices().len());
    println!("Faces: {}", mesh.face_count());
    println!("Triangles: {}", mesh.triangle_count());
    println!("Submeshes: {}", mesh.submesh_count());

    if let Some((min, max)) = mesh.bounds() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        let diag = max - min;
        println!("Dimensions: {:.3} x {:.3} x {:.3}", diag.x, diag.y, diag.z);
    }

    // Face shapes
    let quads = mesh.faces().iter().filter(|f| f.is_quad()).count();
    let triangles = mesh.faces().iter().filter(|f| f.triangle_count() == 1).count();
    let other = mesh.face_count() - quads - triangles;
    println!("Face shapes: {} triangles, {} quads, {} other", triangles, quads, other);

    let smoothed = mesh
        .faces()
        .iter()
        .filter(|f| is_smooth(f.smoothing_group))
        .count();
    println!("Smoothed faces: {}", smoothed);

    // Attributes
    let channels: Vec<String> = (0..editmesh::mesh::UV_CHANNEL_COUNT)
        .filter(|&c| matches!(mesh.uvs(c), Ok(Some(_))))
        .map(|c| c.to_string())
        .collect();
    println!(
        "UV channels: {}",
        if channels.is_empty() { "none".to_string() } else { channels.join(", ") }
    );
    println!("Colors: {}", if mesh.colors().is_some() { "yes" } else { "no" });
    println!("Tangents: {}", if mesh.tangents().is_some() { "yes" } else { "no" });

    // Topology
    let graph = mesh.winged_edges()?;
    let boundary = graph.boundary_wings().count();
    let non_manifold = graph.non_manifold_edges().len();
    if non_manifold > 0 {
        println!("Topology: Non-manifold ({} edges shared by more than two faces)", non_manifold);
    } else if boundary == 0 {
        println!("Topology: Closed (no boundary)");
    } else {
        println!("Topology: Open ({} boundary edges)", boundary);
    }

    Ok(())
}

fn cmd_weld(
    input: &PathBuf,
    output: &PathBuf,
    resolution: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh = load(input)?;
    let before = mesh.shared_vertices().len();

    let start = Instant::now();
    mesh.rebuild_shared_vertices(&WeldOptions::new().with_resolution(resolution))?;
    let elapsed = start.elapsed();

    println!(
        "Coincident groups: {} -> {} (resolution {})",
        before,
        mesh.shared_vertices().len(),
        resolution
    );
    io::save(&mesh, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

fn cmd_compile(
    input: &PathBuf,
    topology: TopologyArg,
    submeshes: Option<usize>,
    no_tangents: bool,
    obj: Option<&PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = load(input)?;

    let mut options = CompileOptions::default()
        .with_topology(topology.into())
        .with_tangents(!no_tangents);
    if let Some(count) = submeshes {
        options = options.with_submesh_count(count);
    }

    let start = Instant::now();
    let compiled = mesh.compile(&options)?;
    let elapsed = start.elapsed();

    println!(
        "Compiled: {} vertices, {} indices ({:.2?})",
        compiled.vertex_count(),
        compiled.index_count(),
        elapsed
    );
    println!("Tangents: {}", if compiled.tangents.is_some() { "yes" } else { "no" });
    for submesh in &compiled.submeshes {
        println!(
            "  submesh {}: {} {} ({} indices)",
            submesh.submesh_index,
            submesh.primitive_count(),
            submesh.topology,
            submesh.indices.len()
        );
    }

    if let Some(path) = obj {
        let mut writer = BufWriter::new(File::create(path)?);
        io::obj::write_compiled(&compiled, &mut writer)?;
        writer.flush()?;
        println!("Saved: {}", path.display());
    }

    Ok(())
}

fn cmd_auto_smooth(
    input: &PathBuf,
    output: &PathBuf,
    angle: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh = load(input)?;
    let faces = all_faces(&mesh);
    let options = AutoSmoothOptions::default().with_angle_threshold(angle);

    println!("Assigning smoothing groups (threshold {} degrees)...", angle);
    let start = Instant::now();
    apply_smoothing_groups(&mut mesh, &faces, &options)?;
    let elapsed = start.elapsed();

    let mut groups: Vec<i32> = mesh
        .faces()
        .iter()
        .map(|f| f.smoothing_group)
        .filter(|&g| is_smooth(g))
        .collect();
    groups.sort_unstable();
    groups.dedup();
    println!("Result: {} smoothing groups", groups.len());

    io::save(&mesh, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

fn cmd_quadify(
    input: &PathBuf,
    output: &PathBuf,
    normal_threshold: f64,
    keep_coincident: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh = load(input)?;
    let faces = all_faces(&mesh);
    let options = QuadOptions::default()
        .with_normal_threshold(normal_threshold)
        .with_collapse_coincident(!keep_coincident);

    println!("Merging triangle pairs (normal threshold {})...", normal_threshold);
    let start = Instant::now();
    let merged = to_quads(&mut mesh, &faces, &options)?;
    let elapsed = start.elapsed();

    println!(
        "Result: {} quads merged, {} vertices, {} faces",
        merged.len(),
        mesh.vertex_count(),
        mesh.face_count()
    );
    io::save(&mesh, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

fn cmd_clean(input: &PathBuf, output: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh = load(input)?;
    let faces_before = mesh.face_count();

    let start = Instant::now();
    let removed = remove_degenerate_triangles(&mut mesh)?;
    let elapsed = start.elapsed();

    println!(
        "Removed: {} vertices, {} faces",
        removed.len(),
        faces_before - mesh.face_count()
    );
    io::save(&mesh, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}
