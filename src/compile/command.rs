//! Subprocess-backed compiler.
//!
//! Invokes an external compiler program once per attempt:
//! `<program> <source-path> -r:<assembly>...`. On success the program prints
//! the compiled module as a single JSON document on stdout; on failure its
//! diagnostics (stderr, falling back to stdout) are classified.

use std::ffi::OsStr;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::core::{CompiledModule, ModuleSource};
use crate::resolver::ReferenceSet;
use crate::util::process::{find_program, ProcessBuilder};

use super::{CompileOutcome, Compiler, Diagnostic};

/// Compiler that shells out to an external program.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: PathBuf,
}

impl CommandCompiler {
    /// Locate the compiler program on PATH (or via a direct path).
    pub fn new(program: impl AsRef<OsStr>) -> Result<Self> {
        let program = find_program(program).context("module compiler not available")?;
        Ok(CommandCompiler { program })
    }

    /// The resolved compiler path.
    pub fn program(&self) -> &PathBuf {
        &self.program
    }
}

impl Compiler for CommandCompiler {
    fn compile(&self, source: &ModuleSource, references: &ReferenceSet) -> Result<CompileOutcome> {
        let mut cmd = ProcessBuilder::new(&self.program).arg(source.path());
        for reference in references.iter() {
            cmd = cmd.arg(format!("-r:{}", reference));
        }

        tracing::debug!("running {}", cmd.display_command());
        let output = cmd.exec()?;

        if output.status.success() {
            let module: CompiledModule = serde_json::from_slice(&output.stdout)
                .with_context(|| {
                    format!(
                        "compiler produced invalid module JSON for {}",
                        source.file_name()
                    )
                })?;
            Ok(CompileOutcome::Success(module))
        } else {
            let mut raw = String::from_utf8_lossy(&output.stderr).into_owned();
            if raw.trim().is_empty() {
                raw = String::from_utf8_lossy(&output.stdout).into_owned();
            }
            Ok(CompileOutcome::Failure(Diagnostic::parse(raw)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_program_is_an_error() {
        let result = CommandCompiler::new("definitely-not-a-real-compiler-binary");
        assert!(result.is_err());
    }
}
