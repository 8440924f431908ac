//! Corner-sample synthesis: for every serialized node, eight scalar samples
//! at the corners of its bounding box. Leaf corners are found by
//! tetrahedral point-location (barycentric coordinates) over the leaf's own
//! cells; internal-node corners are merged from their children along the
//! split dimension. Grounded in
//! `original_source/ingest/modules/leaf_mesh.py`'s
//! `generate_corner_values_buffer` / `get_containing_cell`.

use crate::mesh::{BoundingBox, Mesh};
use crate::tree::serialize::SerializedTree;
use rayon::prelude::*;
use std::collections::HashMap;

/// Tolerance on barycentric coordinates: a corner is considered inside a
/// cell if every coordinate is at least `-CORNER_EPS`.
const CORNER_EPS: f32 = 5e-3;

/// `b = (zbit << 2) | (ybit << 1) | xbit` selects which face of the box
/// each of the 8 corners sits on.
fn corner_position(bounds: &BoundingBox, b: u8) -> [f32; 3] {
    [
        if b & 1 != 0 { bounds.max[0] } else { bounds.min[0] },
        if b & 2 != 0 { bounds.max[1] } else { bounds.min[1] },
        if b & 4 != 0 { bounds.max[2] } else { bounds.min[2] },
    ]
}

fn cell_aabb_contains(verts: &[[f32; 3]; 4], q: [f32; 3]) -> bool {
    for d in 0..3 {
        let mut lo = f32::INFINITY;
        let mut hi = f32::NEG_INFINITY;
        for v in verts {
            if v[d] < lo {
                lo = v[d];
            }
            if v[d] > hi {
                hi = v[d];
            }
        }
        if q[d] < lo || q[d] > hi {
            return false;
        }
    }
    true
}

fn det4(m: [[f32; 4]; 4]) -> f32 {
    // Laplace expansion along the first row.
    let minor = |skip_col: usize| -> f32 {
        let mut rows = [[0f32; 3]; 3];
        for r in 0..3 {
            let mut c_out = 0;
            for c in 0..4 {
                if c == skip_col {
                    continue;
                }
                rows[r][c_out] = m[r + 1][c];
                c_out += 1;
            }
        }
        rows[0][0] * (rows[1][1] * rows[2][2] - rows[1][2] * rows[2][1])
            - rows[0][1] * (rows[1][0] * rows[2][2] - rows[1][2] * rows[2][0])
            + rows[0][2] * (rows[1][0] * rows[2][1] - rows[1][1] * rows[2][0])
    };
    m[0][0] * minor(0) - m[0][1] * minor(1) + m[0][2] * minor(2) - m[0][3] * minor(3)
}

/// Barycentric coordinates of `q` against tetrahedron `verts`, or `None` if
/// the tetrahedron is degenerate (zero volume).
fn barycentric(q: [f32; 3], verts: [[f32; 3]; 4]) -> Option<[f32; 4]> {
    let rows: [[f32; 4]; 4] = verts.map(|v| [v[0], v[1], v[2], 1.0]);
    let vol = det4(rows);
    if vol == 0.0 {
        return None;
    }
    let mut lambdas = [0f32; 4];
    for i in 0..4 {
        let mut m = rows;
        m[i] = [q[0], q[1], q[2], 1.0];
        lambdas[i] = det4(m) / vol;
    }
    Some(lambdas)
}

/// Scans `cell_ids` for the first cell that contains `corner`, returning its
/// interpolated scalar value, or 0.0 if no cell matches.
fn leaf_corner_value(mesh: &Mesh, cell_ids: &[u32], scalar: &[f32], corner: [f32; 3]) -> f32 {
    for &cell_id in cell_ids {
        let idx = mesh.cell_vertex_indices(cell_id);
        let verts = idx.map(|v| mesh.positions[v as usize]);
        if !cell_aabb_contains(&verts, corner) {
            continue;
        }
        let Some(lambdas) = barycentric(corner, verts) else {
            continue;
        };
        if lambdas.iter().any(|&l| l < -CORNER_EPS) {
            continue;
        }
        let value: f32 = (0..4).map(|i| lambdas[i] * scalar[idx[i] as usize]).sum();
        return value;
    }
    0.0
}

/// Two-phase traversal frame for the explicit-stack corner walk: a node is
/// first descended into (pushing its children), then revisited to merge
/// their already-computed corners.
enum StackFrame {
    Descend { offset: u32, depth: u32, bounds: BoundingBox },
    Merge { offset: u32, depth: u32 },
}

/// Computes the 8-corner buffer for a single scalar field using the literal
/// explicit-stack descend/merge walk (no recursion), as prescribed.
pub fn compute_corner_buffer(mesh: &Mesh, tree: &SerializedTree, scalar: &[f32]) -> Vec<[f32; 8]> {
    let mut corners = vec![[0f32; 8]; tree.nodes.len()];
    let mut stack = vec![StackFrame::Descend {
        offset: 0,
        depth: 0,
        bounds: mesh.bounds,
    }];

    while let Some(frame) = stack.pop() {
        match frame {
            StackFrame::Descend { offset, depth, bounds } => {
                let node = tree.nodes[offset as usize];
                if node.is_leaf() {
                    let cell_ids = tree.leaf_cells(&node);
                    let mut buf = [0f32; 8];
                    for b in 0..8u8 {
                        buf[b as usize] =
                            leaf_corner_value(mesh, cell_ids, scalar, corner_position(&bounds, b));
                    }
                    corners[offset as usize] = buf;
                } else {
                    stack.push(StackFrame::Merge { offset, depth });
                    let dim = (depth % 3) as usize;
                    stack.push(StackFrame::Descend {
                        offset: node.left_ptr,
                        depth: depth + 1,
                        bounds: bounds.with_max(dim, node.split_val),
                    });
                    stack.push(StackFrame::Descend {
                        offset: node.right_ptr,
                        depth: depth + 1,
                        bounds: bounds.with_min(dim, node.split_val),
                    });
                }
            }
            StackFrame::Merge { offset, depth } => {
                let node = tree.nodes[offset as usize];
                let dim = (depth % 3) as u8;
                let left = corners[node.left_ptr as usize];
                let right = corners[node.right_ptr as usize];
                let mut merged = [0f32; 8];
                for b in 0..8u8 {
                    merged[b as usize] = if (b >> dim) & 1 == 1 {
                        right[b as usize]
                    } else {
                        left[b as usize]
                    };
                }
                corners[offset as usize] = merged;
            }
        }
    }

    corners
}

/// Computes corner buffers for every scalar field in `mesh.values`,
/// dispatching independent fields across `rayon` workers — the
/// per-field corner walk above is itself the unit of parallel work.
pub fn compute_all_corner_buffers(
    mesh: &Mesh,
    tree: &SerializedTree,
) -> HashMap<String, Vec<[f32; 8]>> {
    mesh.values
        .par_iter()
        .map(|(name, values)| (name.clone(), compute_corner_buffer(mesh, tree, values)))
        .collect()
}
