//! Stevedore - a module repository build tool
//!
//! Given a directory of module source files, Stevedore resolves the minimal
//! set of assembly references each module compiles against, compiles and
//! signs the module, exports a versioned package, renders the module readme
//! to PDF, and writes a compressed machine-readable index plus a
//! human-readable listing for the whole repository.

pub mod compile;
pub mod core;
pub mod docs;
pub mod index;
pub mod ops;
pub mod package;
pub mod resolver;
pub mod sign;
pub mod util;

pub use crate::core::{CompiledModule, ModuleHeader, ModuleSource, ModuleType};
pub use crate::index::RepositoryIndex;
pub use crate::resolver::{ReferenceSet, Resolution};
