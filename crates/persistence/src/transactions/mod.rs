//! Transaction implementations.
//!
//! - [`MemoryTransaction`] keeps mutations in a vector.
//! - [`FileTransaction`] spools mutations to a temporary file, one JSON
//!   line each, for batches too large to hold in memory.

mod file;
mod memory;

pub use file::FileTransaction;
pub use memory::MemoryTransaction;
