//! Artifact writers: the partial index file (serialized tree + corner
//! buffers + limits + bounds) and the block-mesh file (one zone per leaf).
//! Content is written to a temp path in the destination directory and
//! renamed into place only once both artifacts' content is known-good, so a
//! reader never observes a half-written file, and a failure partway through
//! never leaves one artifact live without its companion (spec.md §7).
//! Grounded in `original_source/ingest/generate_block_mesh.py`'s
//! `write_block_mesh_data` for the logical array/group layout.

use crate::container::ContainerWriter;
use crate::error::Result;
use crate::mesh::{BoundingBox, Mesh, ScalarLimits};
use crate::tree::serialize::SerializedTree;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Writes `write_body`'s content into a temp file alongside `path`,
/// without making it visible under `path` yet. Call `commit` on the result
/// to rename it into place.
fn stage_temp(path: &Path, write_body: impl FnOnce(&mut dyn Write) -> Result<()>) -> Result<NamedTempFile> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    {
        let mut buffered = BufWriter::new(temp.as_file_mut());
        write_body(&mut buffered)?;
        buffered.flush()?;
    }
    Ok(temp)
}

fn commit(temp: NamedTempFile, path: &Path) -> Result<()> {
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn atomic_write(path: &Path, write_body: impl FnOnce(&mut dyn Write) -> Result<()>) -> Result<()> {
    commit(stage_temp(path, write_body)?, path)
}

/// Writes the partial index artifact's content: the serialized node array,
/// its `(node_count, leaf_count)` pair, per-scalar 8-corner buffers,
/// per-scalar global limits, the leaf-cap/vertex-cap limits used at build
/// time, and the dataset bounding box. The packed cell-index buffer is
/// internal state consumed by `corners`/`leaf_mesh` during the build and is
/// not part of the external file contract (spec.md §6), so it is not
/// written here.
fn write_partial_body(
    w: &mut dyn Write,
    tree: &SerializedTree,
    corner_buffers: &HashMap<String, Vec<[f32; 8]>>,
    limits: &[(String, ScalarLimits)],
    bounds: &BoundingBox,
    max_leaf_cells: u32,
    max_leaf_verts: u32,
) -> Result<()> {
    let mut writer = ContainerWriter::new(w)?;
    writer.begin_group("Base")?;
    writer.begin_group("NodeZone")?;

    let node_bytes: Vec<u8> = tree.nodes.iter().flat_map(|n| n.to_bytes()).collect();
    writer.write_bytes("NodeTree", &node_bytes)?;

    let leaf_count = tree.nodes.iter().filter(|n| n.is_leaf()).count();
    writer.write_i32_array("TreeData", &[tree.nodes.len() as i32, leaf_count as i32])?;
    writer.write_str("CornerValueType", "Sample")?;

    writer.begin_group("FlowSolution")?;
    for (name, buffer) in corner_buffers {
        let flat: Vec<f32> = buffer.iter().flat_map(|c| c.to_vec()).collect();
        writer.write_f32_array(name, &flat)?;
    }
    writer.end_group()?;

    writer.begin_group("FlowSolutionLimits")?;
    for (name, limit) in limits {
        writer.write_f32_array(name, &[limit.min, limit.max])?;
    }
    writer.end_group()?;

    writer.end_group()?; // NodeZone

    writer.write_u32_array("MaxPrimitives", &[max_leaf_cells, max_leaf_verts])?;
    writer.write_f32_array(
        "ZoneBounds",
        &[
            bounds.min[0],
            bounds.min[1],
            bounds.min[2],
            bounds.max[0],
            bounds.max[1],
            bounds.max[2],
        ],
    )?;
    writer.end_group()?; // Base
    Ok(())
}

/// Writes the block-mesh artifact's content: one zone per leaf mesh,
/// one-based connectivity (CGNS convention), in the order the leaves are
/// given.
fn write_block_mesh_body(
    w: &mut dyn Write,
    leaves: &[Mesh],
    max_leaf_cells: u32,
    max_leaf_verts: u32,
) -> Result<()> {
    let mut writer = ContainerWriter::new(w)?;
    writer.begin_group("Base")?;
    writer.write_u32_array("MaxPrimitives", &[max_leaf_cells, max_leaf_verts])?;

    for leaf in leaves {
        let zone_name = format!("Zone{}", leaf.id.unwrap_or(0));
        writer.begin_group(&zone_name)?;
        writer.write_str("ZoneType", "Unstructured")?;

        writer.begin_group("GridCoordinates")?;
        let xs: Vec<f32> = leaf.positions.iter().map(|p| p[0]).collect();
        let ys: Vec<f32> = leaf.positions.iter().map(|p| p[1]).collect();
        let zs: Vec<f32> = leaf.positions.iter().map(|p| p[2]).collect();
        writer.write_f32_array("CoordinateX", &xs)?;
        writer.write_f32_array("CoordinateY", &ys)?;
        writer.write_f32_array("CoordinateZ", &zs)?;
        writer.end_group()?;

        writer.begin_group("GridElements")?;
        // CGNS element type code for TETRA_4.
        writer.write_i32_array("ElementType", &[10])?;
        let one_based: Vec<u32> = leaf.connectivity.iter().map(|&i| i + 1).collect();
        writer.write_u32_array("ElementConnectivity", &one_based)?;
        writer.end_group()?;

        writer.begin_group("FlowSolution")?;
        for (name, values) in &leaf.values {
            writer.write_f32_array(name, values)?;
        }
        writer.end_group()?;

        writer.end_group()?; // Zone<id>
    }

    writer.end_group()?; // Base
    Ok(())
}

/// Writes the partial index artifact on its own, atomically. Exposed for
/// standalone use (e.g. tests); `pipeline::run_pipeline` instead calls
/// [`write_artifacts`] so both files are staged before either is committed.
pub fn write_partial_artifact(
    path: &Path,
    tree: &SerializedTree,
    corner_buffers: &HashMap<String, Vec<[f32; 8]>>,
    limits: &[(String, ScalarLimits)],
    bounds: &BoundingBox,
    max_leaf_cells: u32,
    max_leaf_verts: u32,
) -> Result<()> {
    atomic_write(path, |w| {
        write_partial_body(w, tree, corner_buffers, limits, bounds, max_leaf_cells, max_leaf_verts)
    })
}

/// Writes the block-mesh artifact on its own, atomically. See
/// [`write_partial_artifact`]'s note on [`write_artifacts`].
pub fn write_block_mesh_artifact(
    path: &Path,
    leaves: &[Mesh],
    max_leaf_cells: u32,
    max_leaf_verts: u32,
) -> Result<()> {
    atomic_write(path, |w| write_block_mesh_body(w, leaves, max_leaf_cells, max_leaf_verts))
}

/// Writes both artifacts so that neither is ever observable without the
/// other: both are fully written to temp files first (any I/O error here
/// leaves no trace under either final path), and only once both writes
/// have succeeded are they renamed into place, block-mesh first and the
/// partial file last. Matches spec.md §7: "There is no partial artifact:
/// either both files are written or neither is."
#[allow(clippy::too_many_arguments)]
pub fn write_artifacts(
    partial_path: &Path,
    block_mesh_path: &Path,
    tree: &SerializedTree,
    corner_buffers: &HashMap<String, Vec<[f32; 8]>>,
    limits: &[(String, ScalarLimits)],
    bounds: &BoundingBox,
    leaves: &[Mesh],
    max_leaf_cells: u32,
    max_leaf_verts: u32,
) -> Result<()> {
    let partial_temp = stage_temp(partial_path, |w| {
        write_partial_body(w, tree, corner_buffers, limits, bounds, max_leaf_cells, max_leaf_verts)
    })?;
    let block_mesh_temp = stage_temp(block_mesh_path, |w| {
        write_block_mesh_body(w, leaves, max_leaf_cells, max_leaf_verts)
    })?;

    commit(block_mesh_temp, block_mesh_path)?;
    commit(partial_temp, partial_path)?;
    Ok(())
}
