//! Thread module
//!
//! A thread binds a discussion to one book and lives only while it has an
//! Active top-level comment.

pub mod model;
pub mod registry;

pub use model::*;
pub use registry::ThreadRegistry;
