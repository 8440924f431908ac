//! Optional `overview.csv` / `filled_slots.csv` exports, mirroring
//! `original_source/ingest/generate_block_mesh.py`'s `export_meshes_info`
//! and the overview summary it prints alongside the artifacts.

use crate::error::Result;
use crate::mesh::Mesh;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct OverviewRow {
    #[serde(rename = "Total Vertices")]
    total_verts: usize,
    #[serde(rename = "Total Cells")]
    total_cells: usize,
    #[serde(rename = "Original Vertices")]
    original_verts: usize,
    #[serde(rename = "Original Cells")]
    original_cells: usize,
    #[serde(rename = "Leaf Count")]
    leaf_count: usize,
    #[serde(rename = "Target Leaf Cells")]
    target_leaf_cells: usize,
}

#[derive(Serialize)]
struct FilledSlotsRow {
    #[serde(rename = "Full Vertices")]
    verts: usize,
    #[serde(rename = "Full Cells")]
    cells: usize,
}

pub fn write_overview_csv(
    path: &Path,
    total_verts: usize,
    total_cells: usize,
    original_verts: usize,
    original_cells: usize,
    leaf_count: usize,
    target_leaf_cells: usize,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.serialize(OverviewRow {
        total_verts,
        total_cells,
        original_verts,
        original_cells,
        leaf_count,
        target_leaf_cells,
    })?;
    writer.flush()?;
    Ok(())
}

pub fn write_filled_slots_csv(path: &Path, leaves: &[Mesh]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for leaf in leaves {
        writer.serialize(FilledSlotsRow {
            verts: leaf.vertex_count(),
            cells: leaf.cell_count(),
        })?;
    }
    writer.flush()?;
    Ok(())
}
