//! Wires the individual stages (load, build, serialize, sample corners,
//! extract leaves, write artifacts) into a single run, mirroring
//! `original_source/ingest/generate_block_mesh.py`'s `main` at the
//! orchestration level while keeping each stage independently testable.

use crate::container;
use crate::csv_export;
use crate::error::Result;
use crate::leaf_mesh;
use crate::loader::{self, MeshSource, ScalarSelection};
use crate::mesh::Mesh;
use crate::tree::arena::{self, BuildConfig};
use crate::tree::serialize;
use crate::writer;
use crate::corners;
use log::info;
use std::path::PathBuf;

/// Everything this crate's library-level pipeline needs, standing in for
/// the CLI argument surface that is explicitly out of scope (SPEC_FULL.md
/// §6). An external collaborator's CLI is expected to build one of these
/// directly.
pub struct PipelineConfig {
    pub output_prefix: PathBuf,
    pub build: BuildConfig,
    pub mirror_planes: [Option<f32>; 3],
    pub verbose: bool,
    pub no_write: bool,
    pub export_csv: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            output_prefix: PathBuf::from("out"),
            build: BuildConfig::default(),
            mirror_planes: [None, None, None],
            verbose: false,
            no_write: false,
            export_csv: false,
        }
    }
}

pub struct PipelineOutputs {
    pub node_count: usize,
    pub leaf_count: usize,
    pub leaf_meshes: Vec<Mesh>,
}

/// Runs the full pipeline against an already-loaded mesh: optional
/// mirroring, tree build, serialization, corner sampling, leaf extraction,
/// and (unless `no_write`) writing both artifacts plus the optional CSV
/// exports.
pub fn run_pipeline(mesh: &Mesh, config: &PipelineConfig) -> Result<PipelineOutputs> {
    let mesh = if config.mirror_planes.iter().any(Option::is_some) {
        mesh.mirrored(config.mirror_planes)
    } else {
        mesh.clone()
    };

    info!(
        "building tree over {} cells, {} vertices",
        mesh.cell_count(),
        mesh.vertex_count()
    );
    let logical = arena::build(&mesh, &config.build);
    let serialized = serialize::serialize(&logical);
    info!(
        "serialized {} nodes, {} leaves",
        serialized.nodes.len(),
        logical.leaf_count()
    );

    let corner_buffers = corners::compute_all_corner_buffers(&mesh, &serialized);
    let limits = mesh.limits();

    let leaf_meshes = leaf_mesh::extract_all_leaf_meshes(&mesh, &serialized);

    let max_leaf_cells = leaf_meshes.iter().map(|m| m.cell_count()).max().unwrap_or(0) as u32;
    let max_leaf_verts = leaf_meshes.iter().map(|m| m.vertex_count()).max().unwrap_or(0) as u32;

    if !config.no_write {
        let partial_path = config.output_prefix.with_extension("partial.tpart");
        let block_mesh_path = config.output_prefix.with_extension("blocks.tpart");
        writer::write_artifacts(
            &partial_path,
            &block_mesh_path,
            &serialized,
            &corner_buffers,
            &limits,
            &mesh.bounds,
            &leaf_meshes,
            max_leaf_cells,
            max_leaf_verts,
        )?;

        if config.export_csv {
            let overview_path = config.output_prefix.with_extension("overview.csv");
            csv_export::write_overview_csv(
                &overview_path,
                leaf_meshes.iter().map(|m| m.vertex_count()).sum(),
                leaf_meshes.iter().map(|m| m.cell_count()).sum(),
                mesh.vertex_count(),
                mesh.cell_count(),
                leaf_meshes.len(),
                config.build.max_leaf_cells,
            )?;

            let filled_slots_path = config.output_prefix.with_extension("filled_slots.csv");
            csv_export::write_filled_slots_csv(&filled_slots_path, &leaf_meshes)?;
        }
    }

    Ok(PipelineOutputs {
        node_count: serialized.nodes.len(),
        leaf_count: logical.leaf_count(),
        leaf_meshes,
    })
}

/// Thin wrapper over `loader::load_mesh` + `run_pipeline` for callers who
/// start from a `MeshSource` rather than an already-loaded `Mesh`.
pub fn run_pipeline_from_source(
    source: MeshSource,
    scalars: &ScalarSelection,
    config: &PipelineConfig,
) -> Result<PipelineOutputs> {
    let mesh = loader::load_mesh(source, scalars)?;
    run_pipeline(&mesh, config)
}

/// Reads a container back out, for tests/tools that want to sanity-check a
/// just-written artifact without a full CGNS reader.
pub fn read_container_records(path: &std::path::Path) -> Result<Vec<container::Record>> {
    let file = std::fs::File::open(path)?;
    container::ContainerReader::new(file)?.into_records()
}
