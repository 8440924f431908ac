//! Structured-grid tetrahedralizer and its optional vertex-substitution
//! decimator, grounded in `original_source/ingest/modules/load_mesh.py`'s
//! `create_raw_tet_con`, `create_raw_tet_con_dec`, and
//! `create_decimation_vert_map`.

use crate::mesh::Mesh;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug)]
pub struct GridDims {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl GridDims {
    pub fn vertex_count(&self) -> usize {
        (self.x as usize) * (self.y as usize) * (self.z as usize)
    }

    fn index(&self, x: u32, y: u32, z: u32) -> u32 {
        x + y * self.x + z * self.x * self.y
    }
}

fn grid_positions(dims: GridDims) -> Vec<[f32; 3]> {
    let mut positions = Vec::with_capacity(dims.vertex_count());
    for z in 0..dims.z {
        for y in 0..dims.y {
            for x in 0..dims.x {
                positions.push([x as f32, y as f32, z as f32]);
            }
        }
    }
    positions
}

/// The six tets a voxel is split into, each sharing the voxel's low corner
/// (index 0) and high corner (index 7), indexed into the 8-entry corner
/// list `[000,100,010,110,001,101,011,111]` (x fastest, then y, then z).
fn voxel_tets(p: &[u32; 8]) -> [[u32; 4]; 6] {
    [
        [p[1], p[0], p[5], p[7]],
        [p[0], p[5], p[7], p[4]],
        [p[0], p[7], p[6], p[4]],
        [p[0], p[7], p[2], p[6]],
        [p[0], p[3], p[2], p[7]],
        [p[0], p[1], p[3], p[7]],
    ]
}

fn voxel_corners(dims: GridDims, x: u32, y: u32, z: u32) -> [u32; 8] {
    [
        dims.index(x, y, z),
        dims.index(x + 1, y, z),
        dims.index(x, y + 1, z),
        dims.index(x + 1, y + 1, z),
        dims.index(x, y, z + 1),
        dims.index(x + 1, y, z + 1),
        dims.index(x, y + 1, z + 1),
        dims.index(x + 1, y + 1, z + 1),
    ]
}

/// Tetrahedralizes a full structured grid: 6 tets per voxel, no decimation.
pub fn tetrahedralize_grid(dims: GridDims, scalar_name: &str, scalar: Vec<f32>) -> Mesh {
    let positions = grid_positions(dims);
    let mut connectivity = Vec::new();
    if dims.x >= 2 && dims.y >= 2 && dims.z >= 2 {
        for z in 0..dims.z - 1 {
            for y in 0..dims.y - 1 {
                for x in 0..dims.x - 1 {
                    let corners = voxel_corners(dims, x, y, z);
                    for tet in voxel_tets(&corners) {
                        connectivity.extend_from_slice(&tet);
                    }
                }
            }
        }
    }
    Mesh::new(positions, connectivity, vec![(scalar_name.to_string(), scalar)])
        .expect("grid tetrahedralization always produces well-formed indices")
}

/// A vertex-substitution map: decimated vertices resolve, possibly through
/// a chain of substitutions, to a single surviving vertex.
pub struct DecimationMap {
    substitutions: HashMap<u32, u32>,
}

impl DecimationMap {
    /// Builds a decimation map targeting `fraction` of the grid's vertices
    /// for removal, using `seed` for reproducible vertex and nudge-direction
    /// selection. Each removed vertex is paired with one of its 6
    /// axis-neighbors; attempts are capped at `10 * target` so an
    /// unreachable target terminates rather than looping forever.
    pub fn build(dims: GridDims, fraction: f32, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut substitutions: HashMap<u32, u32> = HashMap::new();

        if dims.x < 3 || dims.y < 3 || dims.z < 3 || fraction <= 0.0 {
            return DecimationMap { substitutions };
        }

        let total = dims.vertex_count() as f64;
        let target = (total * fraction as f64).round() as usize;
        let max_attempts = (10 * target.max(1)) as u64;

        const NUDGES: [[i64; 3]; 6] = [
            [1, 0, 0],
            [0, 1, 0],
            [0, 0, 1],
            [-1, 0, 0],
            [0, -1, 0],
            [0, 0, -1],
        ];

        let mut attempts = 0u64;
        while substitutions.len() < target && attempts < max_attempts {
            attempts += 1;
            let sx = rng.gen_range(1..dims.x - 1);
            let sy = rng.gen_range(1..dims.y - 1);
            let sz = rng.gen_range(1..dims.z - 1);
            let src = dims.index(sx, sy, sz);
            if substitutions.contains_key(&src) {
                continue;
            }

            let nudge = NUDGES[rng.gen_range(0..NUDGES.len())];
            let dx = sx as i64 + nudge[0];
            let dy = sy as i64 + nudge[1];
            let dz = sz as i64 + nudge[2];
            if dx < 0 || dy < 0 || dz < 0 || dx >= dims.x as i64 || dy >= dims.y as i64 || dz >= dims.z as i64 {
                continue;
            }
            let dst = dims.index(dx as u32, dy as u32, dz as u32);
            if substitutions.contains_key(&dst) {
                continue;
            }
            if would_cycle(&substitutions, src, dst) {
                continue;
            }

            substitutions.insert(src, dst);
        }

        DecimationMap { substitutions }
    }

    /// Resolves `vertex` through the full substitution chain to its
    /// surviving vertex. Build-time cycle checking guarantees this
    /// terminates.
    pub fn resolve(&self, mut vertex: u32) -> u32 {
        let mut steps = 0usize;
        while let Some(&next) = self.substitutions.get(&vertex) {
            vertex = next;
            steps += 1;
            if steps > self.substitutions.len() {
                break;
            }
        }
        vertex
    }

    pub fn len(&self) -> usize {
        self.substitutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.substitutions.is_empty()
    }
}

/// Walks the chain from `dst` looking for `src`; if found, inserting
/// `src -> dst` would close a cycle. This is a full chain walk rather than
/// the original's one-hop check (see DESIGN.md Open Question decisions).
fn would_cycle(substitutions: &HashMap<u32, u32>, src: u32, dst: u32) -> bool {
    let mut current = dst;
    let mut steps = 0usize;
    while let Some(&next) = substitutions.get(&current) {
        if next == src {
            return true;
        }
        current = next;
        steps += 1;
        if steps > substitutions.len() {
            return true;
        }
    }
    false
}

/// Tetrahedralizes a structured grid with decimation applied: each voxel's 6
/// tets have their corner indices resolved through `map`, and any tet left
/// with fewer than 4 distinct vertices (degenerate after substitution) is
/// dropped.
pub fn tetrahedralize_grid_decimated(
    dims: GridDims,
    scalar_name: &str,
    scalar: Vec<f32>,
    fraction: f32,
    seed: u64,
) -> (Mesh, DecimationMap) {
    let map = DecimationMap::build(dims, fraction, seed);
    let positions = grid_positions(dims);
    let mut connectivity = Vec::new();

    if dims.x >= 2 && dims.y >= 2 && dims.z >= 2 {
        for z in 0..dims.z - 1 {
            for y in 0..dims.y - 1 {
                for x in 0..dims.x - 1 {
                    let corners = voxel_corners(dims, x, y, z);
                    for tet in voxel_tets(&corners) {
                        let resolved = tet.map(|v| map.resolve(v));
                        if is_degenerate(&resolved) {
                            continue;
                        }
                        connectivity.extend_from_slice(&resolved);
                    }
                }
            }
        }
    }

    let mesh = Mesh::new(positions, connectivity, vec![(scalar_name.to_string(), scalar)])
        .expect("decimated tetrahedralization always produces in-range indices");
    (mesh, map)
}

fn is_degenerate(tet: &[u32; 4]) -> bool {
    for i in 0..4 {
        for j in (i + 1)..4 {
            if tet[i] == tet[j] {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_voxel_yields_six_tets() {
        let dims = GridDims { x: 2, y: 2, z: 2 };
        let scalar = vec![0.0; dims.vertex_count()];
        let mesh = tetrahedralize_grid(dims, "s", scalar);
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.cell_count(), 6);
    }

    #[test]
    fn grid_tets_span_the_full_box() {
        let dims = GridDims { x: 2, y: 2, z: 2 };
        let scalar = vec![0.0; dims.vertex_count()];
        let mesh = tetrahedralize_grid(dims, "s", scalar);
        assert_eq!(mesh.bounds.min, [0.0, 0.0, 0.0]);
        assert_eq!(mesh.bounds.max, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn decimation_reduces_distinct_vertices_referenced() {
        let dims = GridDims { x: 8, y: 8, z: 8 };
        let scalar = vec![1.0; dims.vertex_count()];
        let (decimated, map) = tetrahedralize_grid_decimated(dims, "s", scalar, 0.25, 42);
        assert!(!map.is_empty());
        for &idx in &decimated.connectivity {
            assert!(map.resolve(idx) == idx, "connectivity should already be resolved");
        }
        assert!(decimated.cell_count() <= 6 * 7 * 7 * 7);
    }

    #[test]
    fn decimation_is_deterministic_for_a_given_seed() {
        let dims = GridDims { x: 8, y: 8, z: 8 };
        let a = DecimationMap::build(dims, 0.25, 42);
        let b = DecimationMap::build(dims, 0.25, 42);
        assert_eq!(a.len(), b.len());
        for x in 0..dims.x {
            for y in 0..dims.y {
                for z in 0..dims.z {
                    let idx = dims.index(x, y, z);
                    assert_eq!(a.resolve(idx), b.resolve(idx));
                }
            }
        }
    }

    #[test]
    fn tiny_grid_has_no_interior_and_decimates_nothing() {
        let dims = GridDims { x: 2, y: 2, z: 2 };
        let map = DecimationMap::build(dims, 0.5, 1);
        assert!(map.is_empty());
    }
}
