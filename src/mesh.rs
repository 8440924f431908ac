//! Core mesh data model: positions, tetrahedral connectivity, named scalar
//! fields, and the derived bounding box / per-field limits every other
//! stage of the pipeline reads.

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl BoundingBox {
    pub fn empty() -> Self {
        BoundingBox {
            min: [f32::INFINITY; 3],
            max: [f32::NEG_INFINITY; 3],
        }
    }

    pub fn extend(&mut self, p: [f32; 3]) {
        for d in 0..3 {
            if p[d] < self.min[d] {
                self.min[d] = p[d];
            }
            if p[d] > self.max[d] {
                self.max[d] = p[d];
            }
        }
    }

    pub fn from_points(points: &[[f32; 3]]) -> Self {
        let mut b = BoundingBox::empty();
        for &p in points {
            b.extend(p);
        }
        b
    }

    pub fn midpoint(&self, dim: usize) -> f32 {
        (self.min[dim] + self.max[dim]) * 0.5
    }

    /// A copy of this box with its upper face on `dim` pulled in to `split`.
    pub fn with_max(&self, dim: usize, split: f32) -> Self {
        let mut b = *self;
        b.max[dim] = split;
        b
    }

    /// A copy of this box with its lower face on `dim` pushed out to `split`.
    pub fn with_min(&self, dim: usize, split: f32) -> Self {
        let mut b = *self;
        b.min[dim] = split;
        b
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScalarLimits {
    pub min: f32,
    pub max: f32,
}

impl ScalarLimits {
    pub fn from_values(values: &[f32]) -> Self {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for &v in values {
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }
        ScalarLimits { min, max }
    }
}

/// A tetrahedral mesh: vertex positions, one-tet-per-four-indices
/// connectivity, and zero or more named per-vertex scalar fields.
///
/// Scalar fields are kept as an order-preserving `Vec` rather than a
/// `HashMap`: the order they were loaded/selected in is externally
/// observable in the artifact writer's `FlowSolution` layout.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub connectivity: Vec<u32>,
    pub values: Vec<(String, Vec<f32>)>,
    pub bounds: BoundingBox,
    /// Id this mesh was cut from, if it is a leaf extraction. `None` for a
    /// freshly loaded or constructed mesh.
    pub id: Option<u32>,
}

impl Mesh {
    /// Builds a mesh from raw arrays, validating index bounds and scalar
    /// array lengths, and computing the bounding box.
    pub fn new(
        positions: Vec<[f32; 3]>,
        connectivity: Vec<u32>,
        values: Vec<(String, Vec<f32>)>,
    ) -> Result<Self> {
        if connectivity.len() % 4 != 0 {
            return Err(Error::MalformedInput(format!(
                "connectivity length {} is not a multiple of 4",
                connectivity.len()
            )));
        }
        for &idx in &connectivity {
            if idx as usize >= positions.len() {
                return Err(Error::MalformedInput(format!(
                    "connectivity index {idx} out of range for {} vertices",
                    positions.len()
                )));
            }
        }
        for (name, vals) in &values {
            if vals.len() != positions.len() {
                return Err(Error::MalformedInput(format!(
                    "scalar field {name:?} has {} values, expected {}",
                    vals.len(),
                    positions.len()
                )));
            }
        }
        let bounds = BoundingBox::from_points(&positions);
        Ok(Mesh {
            positions,
            connectivity,
            values,
            bounds,
            id: None,
        })
    }

    pub fn cell_count(&self) -> usize {
        self.connectivity.len() / 4
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn cell_vertex_indices(&self, cell: u32) -> [u32; 4] {
        let base = cell as usize * 4;
        [
            self.connectivity[base],
            self.connectivity[base + 1],
            self.connectivity[base + 2],
            self.connectivity[base + 3],
        ]
    }

    pub fn value(&self, name: &str) -> Option<&[f32]> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Global min/max for every scalar field, in field order.
    pub fn limits(&self) -> Vec<(String, ScalarLimits)> {
        self.values
            .iter()
            .map(|(name, vals)| (name.clone(), ScalarLimits::from_values(vals)))
            .collect()
    }

    /// Duplicates this mesh across up to three axis-aligned mirror planes,
    /// one per dimension given as `Some(plane_coordinate)`.
    ///
    /// Mirrored vertices are appended wholesale; vertices that lie exactly
    /// on a mirror plane are duplicated rather than shared, matching
    /// `original_source/ingest/modules/mesh.py`'s `Mesh.mirror` — this is a
    /// known, intentional non-deduplication (see DESIGN.md).
    pub fn mirrored(&self, planes: [Option<f32>; 3]) -> Mesh {
        let mut positions = self.positions.clone();
        let mut connectivity = self.connectivity.clone();
        let mut values = self.values.clone();

        for dim in 0..3 {
            let Some(plane) = planes[dim] else { continue };
            let offset = positions.len() as u32;
            let mirrored_positions: Vec<[f32; 3]> = positions
                .iter()
                .map(|p| {
                    let mut q = *p;
                    q[dim] = 2.0 * plane - p[dim];
                    q
                })
                .collect();
            let mirrored_connectivity: Vec<u32> =
                connectivity.iter().map(|&i| i + offset).collect();

            positions.extend(mirrored_positions);
            connectivity.extend(mirrored_connectivity);
            for (_, vals) in values.iter_mut() {
                let dup = vals.clone();
                vals.extend(dup);
            }
        }

        Mesh {
            bounds: BoundingBox::from_points(&positions),
            positions,
            connectivity,
            values,
            id: None,
        }
    }
}
