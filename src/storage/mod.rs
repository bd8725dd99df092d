//! Storage abstraction layer for model artifacts.
//!
//! Model files are written and read through the [`Storage`] trait so that
//! the model store can run against the file system in production and
//! against memory in tests.

pub mod file;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use file::*;
pub use memory::*;
pub use traits::*;
