//! Manual smoke-test binary. Not a CLI (that's explicitly out of scope,
//! see SPEC_FULL.md §6): reads a handful of positional arguments straight
//! off `std::env::args()` and runs the pipeline against a raw volume file.
//!
//! Usage: tetrapart <raw-file> <x> <y> <z> <output-prefix> [decimation-fraction]

use std::path::PathBuf;
use tetrapart::loader::{MeshSource, RawElementType, ScalarSelection};
use tetrapart::pipeline::{run_pipeline_from_source, PipelineConfig};
use tetrapart::tree::BuildConfig;
use tetrapart::volume::GridDims;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 6 {
        eprintln!(
            "usage: {} <raw-file> <x> <y> <z> <output-prefix> [decimation-fraction]",
            args.first().map(String::as_str).unwrap_or("tetrapart")
        );
        std::process::exit(1);
    }

    let path = PathBuf::from(&args[1]);
    let dims = GridDims {
        x: args[2].parse().expect("x dimension must be a positive integer"),
        y: args[3].parse().expect("y dimension must be a positive integer"),
        z: args[4].parse().expect("z dimension must be a positive integer"),
    };
    let output_prefix = PathBuf::from(&args[5]);
    let decimation_fraction: f32 = args.get(6).map(|s| s.parse().unwrap_or(0.0)).unwrap_or(0.0);

    let source = MeshSource::RawVolume {
        path,
        element_type: RawElementType::F32,
        dims,
        decimation_fraction,
        decimation_seed: 42,
    };

    let config = PipelineConfig {
        output_prefix,
        build: BuildConfig::default(),
        export_csv: true,
        ..PipelineConfig::default()
    };

    match run_pipeline_from_source(source, &ScalarSelection::All, &config) {
        Ok(outputs) => {
            log::info!(
                "wrote {} nodes, {} leaves",
                outputs.node_count,
                outputs.leaf_count
            );
        }
        Err(err) => {
            eprintln!("pipeline failed: {err}");
            std::process::exit(1);
        }
    }
}
