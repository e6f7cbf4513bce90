//! Core domain types.

pub mod module;

pub use module::{CompiledModule, ModuleHeader, ModuleSource, ModuleType};
