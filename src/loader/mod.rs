//! Mesh loading: turns an already-parsed set of arrays, or a flat binary
//! volume file, into a `Mesh`. Grounded in
//! `original_source/ingest/modules/load_mesh.py`'s `load_mesh_from_*`
//! family and `filter_value_names`.

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::volume::{self, GridDims};
use std::fs;
use std::path::PathBuf;

/// Which scalar fields to keep out of the ones a source makes available.
/// Mirrors `filter_value_names`'s four directives plus an explicit name
/// list; the original's interactive "pick" prompt is replaced with a
/// caller-supplied predicate since this crate does not read stdin.
pub enum ScalarSelection {
    All,
    First,
    None,
    Names(Vec<String>),
    Pick(Box<dyn Fn(&str) -> bool + Send + Sync>),
}

impl ScalarSelection {
    fn filter(&self, available: Vec<(String, Vec<f32>)>) -> Vec<(String, Vec<f32>)> {
        match self {
            ScalarSelection::All => available,
            ScalarSelection::First => available.into_iter().take(1).collect(),
            ScalarSelection::None => Vec::new(),
            ScalarSelection::Names(names) => available
                .into_iter()
                .filter(|(name, _)| names.contains(name))
                .collect(),
            ScalarSelection::Pick(predicate) => available
                .into_iter()
                .filter(|(name, _)| predicate(name))
                .collect(),
        }
    }
}

/// Element type of a raw binary volume file's samples.
#[derive(Clone, Copy, Debug)]
pub enum RawElementType {
    U8,
    Int16,
    F32,
}

impl RawElementType {
    fn element_len(&self) -> usize {
        match self {
            RawElementType::U8 => 1,
            RawElementType::Int16 => 2,
            RawElementType::F32 => 4,
        }
    }

    fn decode(&self, bytes: &[u8]) -> f32 {
        match self {
            RawElementType::U8 => bytes[0] as f32,
            RawElementType::Int16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f32,
            RawElementType::F32 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        }
    }
}

/// Where a `Mesh` comes from. Both the "unstructured container" and the
/// "legacy binary grid file" sources reduce to `Prebuilt` here: parsing
/// CGNS/HDF5-flavored containers and legacy grid formats is an external
/// collaborator's job (see SPEC_FULL.md §2). Only `RawVolume` performs file
/// I/O in this crate.
pub enum MeshSource {
    Prebuilt {
        positions: Vec<[f32; 3]>,
        connectivity: Vec<u32>,
        values: Vec<(String, Vec<f32>)>,
    },
    RawVolume {
        path: PathBuf,
        element_type: RawElementType,
        dims: GridDims,
        /// Fraction of vertices to remove by decimation; 0.0 disables it.
        decimation_fraction: f32,
        decimation_seed: u64,
    },
}

fn read_raw_scalar(path: &PathBuf, element_type: RawElementType, count: usize) -> Result<Vec<f32>> {
    let bytes = fs::read(path)?;
    let elem_len = element_type.element_len();
    if bytes.len() < count * elem_len {
        return Err(Error::MalformedInput(format!(
            "raw volume file {path:?} has {} bytes, expected at least {}",
            bytes.len(),
            count * elem_len
        )));
    }
    Ok((0..count)
        .map(|i| element_type.decode(&bytes[i * elem_len..(i + 1) * elem_len]))
        .collect())
}

/// Loads a `Mesh` from `source`, applying `scalars` to choose which fields
/// survive.
pub fn load_mesh(source: MeshSource, scalars: &ScalarSelection) -> Result<Mesh> {
    match source {
        MeshSource::Prebuilt {
            positions,
            connectivity,
            values,
        } => {
            let selected = scalars.filter(values);
            Mesh::new(positions, connectivity, selected)
        }
        MeshSource::RawVolume {
            path,
            element_type,
            dims,
            decimation_fraction,
            decimation_seed,
        } => {
            let available = match scalars {
                ScalarSelection::None => vec![],
                _ => {
                    let data = read_raw_scalar(&path, element_type, dims.vertex_count())?;
                    vec![("Default".to_string(), data)]
                }
            };
            let selected = scalars.filter(available);
            let scalar = selected.into_iter().next().map(|(_, v)| v).unwrap_or_else(|| {
                vec![0.0f32; dims.vertex_count()]
            });

            let mesh = if decimation_fraction > 0.0 {
                volume::tetrahedralize_grid_decimated(
                    dims,
                    "Default",
                    scalar,
                    decimation_fraction,
                    decimation_seed,
                )
                .0
            } else {
                volume::tetrahedralize_grid(dims, "Default", scalar)
            };
            Ok(mesh)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prebuilt_source_applies_scalar_selection() {
        let source = MeshSource::Prebuilt {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            connectivity: vec![0, 1, 2, 3],
            values: vec![
                ("a".to_string(), vec![1.0, 2.0, 3.0, 4.0]),
                ("b".to_string(), vec![5.0, 6.0, 7.0, 8.0]),
            ],
        };
        let mesh = load_mesh(source, &ScalarSelection::Names(vec!["b".to_string()])).unwrap();
        assert_eq!(mesh.values.len(), 1);
        assert_eq!(mesh.values[0].0, "b");
    }

    #[test]
    fn none_selection_drops_every_scalar() {
        let source = MeshSource::Prebuilt {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            connectivity: vec![0, 1, 2, 3],
            values: vec![("a".to_string(), vec![1.0, 2.0, 3.0, 4.0])],
        };
        let mesh = load_mesh(source, &ScalarSelection::None).unwrap();
        assert!(mesh.values.is_empty());
    }

    #[test]
    fn raw_volume_rejects_short_files() {
        let dir = std::env::temp_dir().join(format!("tetrapart-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("short.raw");
        fs::write(&path, [0u8, 1u8]).unwrap();

        let source = MeshSource::RawVolume {
            path,
            element_type: RawElementType::F32,
            dims: GridDims { x: 2, y: 2, z: 2 },
            decimation_fraction: 0.0,
            decimation_seed: 1,
        };
        let result = load_mesh(source, &ScalarSelection::All);
        assert!(result.is_err());
        let _ = fs::remove_dir_all(&dir);
    }
}
