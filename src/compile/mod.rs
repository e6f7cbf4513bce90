//! The module compilation capability.
//!
//! Compilation is provided by an external service; this module wraps it
//! behind the [`Compiler`] trait and turns its prose diagnostics into a
//! structured classification (missing references vs. everything else).

pub mod command;

pub use command::CommandCompiler;

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use crate::core::{CompiledModule, ModuleSource};
use crate::resolver::ReferenceSet;

/// Matches the compiler's missing-reference diagnostic and captures the bare
/// assembly name. The wording is owned by the external compilation service;
/// this pattern is the compatibility shim to it.
static MISSING_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"You must add a reference to assembly '([^',]+)").unwrap()
});

/// Outcome of one compilation attempt.
#[derive(Debug)]
pub enum CompileOutcome {
    Success(CompiledModule),
    Failure(Diagnostic),
}

/// A structured view of a failed compilation.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{raw}")]
pub struct Diagnostic {
    /// Raw diagnostic text as produced by the compiler.
    pub raw: String,
    /// Distinct assembly names the compiler reported as missing references,
    /// in order of first appearance. Empty when the failure is unrelated to
    /// references (or the text could not be classified).
    pub missing_references: Vec<String>,
}

impl Diagnostic {
    /// Classify raw compiler output.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let mut missing_references = Vec::new();
        for capture in MISSING_REFERENCE.captures_iter(&raw) {
            let name = capture[1].to_string();
            if !missing_references.contains(&name) {
                missing_references.push(name);
            }
        }
        Diagnostic {
            raw,
            missing_references,
        }
    }

    /// Whether the failure can be repaired by adding references.
    pub fn is_missing_reference(&self) -> bool {
        !self.missing_references.is_empty()
    }
}

/// The opaque compilation capability.
///
/// A compilation attempt that runs to completion yields an outcome either
/// way; `Err` is reserved for failures to invoke the service at all.
pub trait Compiler {
    fn compile(&self, source: &ModuleSource, references: &ReferenceSet) -> Result<CompileOutcome>;
}
