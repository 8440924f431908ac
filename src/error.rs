//! Error types for the fallible boundaries of the pipeline: the mesh loader
//! and the artifact writer. The tree builder, corner sampler, and leaf-mesh
//! extractor are infallible on well-typed input (they may produce all-zero
//! corners for empty leaves) and panic on invariant violations instead,
//! matching how the teacher's `Cluster::build`/`partition` treat misuse as a
//! programmer error rather than a recoverable one.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Unknown file family, non-tetrahedral zone, or other input this crate
    /// has no reader for.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// Recognized input family with a missing required array/group or
    /// inconsistent sizes (e.g. a scalar array whose length does not match
    /// the vertex count).
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
