//! High-level operations.

pub mod build_repo;

pub use build_repo::{build_repository, BuildOptions, BuildReport, ReferenceInput};
