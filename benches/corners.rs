use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;

use tetrapart::corners;
use tetrapart::tree::arena::{self, BuildConfig};
use tetrapart::tree::serialize;
use tetrapart::volume::{self, GridDims};

fn corner_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("corners");
    group
        .significance_level(0.05)
        .measurement_time(std::time::Duration::new(10, 0));

    for &side in &[8u32, 16, 24] {
        let dims = GridDims { x: side, y: side, z: side };
        let scalar: Vec<f32> = (0..dims.vertex_count()).map(|i| i as f32).collect();
        let mesh = volume::tetrahedralize_grid(dims, "Default", scalar);
        let config = BuildConfig {
            max_depth: 12,
            max_leaf_cells: 32,
        };
        let logical = arena::build(&mesh, &config);
        let serialized = serialize::serialize(&logical);
        let field = mesh.value("Default").unwrap().to_vec();

        let bench_name = format!("grid-{side}^3-{}-nodes", serialized.nodes.len());
        group.bench_function(&bench_name, |b| {
            b.iter_with_large_drop(|| corners::compute_corner_buffer(&mesh, &serialized, &field))
        });
    }

    group.finish();
}

criterion_group!(benches, corner_sampling);
criterion_main!(benches);
