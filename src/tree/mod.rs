//! The KD tree over tetrahedra: an in-memory arena built by median-split
//! partitioning (`arena`), and the dense pointer-addressed record array it
//! is linearized into for the artifact writer (`serialize`).

pub mod arena;
pub mod serialize;

pub use arena::{BuildConfig, LogicalTree};
pub use serialize::{SerializedNode, SerializedTree, ROOT_OFFSET};
