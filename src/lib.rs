//! `tetrapart`: turns a tetrahedral mesh with per-vertex scalar fields into
//! a KD-tree index artifact and a per-leaf block-mesh artifact, for
//! interactive out-of-core visualization of meshes too large to hold (or
//! render) whole.
//!
//! The pipeline stages — load, build tree, serialize, sample corners,
//! extract leaf meshes, write artifacts — are exposed as independent,
//! composable functions so a caller can run them individually or through
//! [`pipeline::run_pipeline`].

pub mod container;
pub mod corners;
pub mod csv_export;
pub mod error;
pub mod leaf_mesh;
pub mod loader;
pub mod mesh;
pub mod pipeline;
pub mod tree;
pub mod volume;
pub mod writer;

pub use error::{Error, Result};
pub use mesh::Mesh;
pub use pipeline::{run_pipeline, run_pipeline_from_source, PipelineConfig, PipelineOutputs};
