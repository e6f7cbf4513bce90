//! The trial-and-error resolution loop and the minimization pass.

use anyhow::Result;

use crate::compile::{CompileOutcome, Compiler, Diagnostic};
use crate::core::ModuleSource;

use super::ReferenceSet;

/// Result of one resolution attempt.
#[derive(Debug)]
pub enum Resolution {
    /// A set the compiler accepts, after minimization.
    Resolved(ReferenceSet),
    /// Automatic classification failed: the compiler error named no missing
    /// assembly (or only ones already present). The caller must supply
    /// assembly names before resolution can continue.
    NeedsInput {
        set: ReferenceSet,
        diagnostic: Diagnostic,
    },
}

/// Grow the seed set until the module compiles, then minimize it.
///
/// Each failed attempt is classified; every missing assembly the compiler
/// names is appended as `<name>.dll` and the compile retried. A failure that
/// names no new assembly cannot be repaired automatically and is handed back
/// to the caller as [`Resolution::NeedsInput`].
pub fn resolve(
    compiler: &dyn Compiler,
    source: &ModuleSource,
    seed: ReferenceSet,
) -> Result<Resolution> {
    let mut set = seed;

    loop {
        match compiler.compile(source, &set)? {
            CompileOutcome::Success(_) => break,
            CompileOutcome::Failure(diagnostic) => {
                let mut progressed = false;
                for name in &diagnostic.missing_references {
                    progressed |= set.insert(&format!("{}.dll", name));
                }
                if !progressed {
                    return Ok(Resolution::NeedsInput { set, diagnostic });
                }
                tracing::debug!(
                    file = %source.file_name(),
                    "added {} missing reference(s), retrying",
                    diagnostic.missing_references.len()
                );
            }
        }
    }

    let set = minimize(compiler, source, set)?;
    Ok(Resolution::Resolved(set))
}

/// Drop references the module compiles without.
///
/// Each candidate is tested independently against the full set minus that
/// one reference, never against the shrinking result, so the test order
/// cannot starve later candidates. Mutually redundant pairs therefore both
/// survive; that is the documented behavior, not an oversight.
pub fn minimize(
    compiler: &dyn Compiler,
    source: &ModuleSource,
    set: ReferenceSet,
) -> Result<ReferenceSet> {
    let mut kept = set.clone();

    for name in set.iter() {
        match compiler.compile(source, &set.without(name))? {
            CompileOutcome::Success(_) => {
                tracing::debug!(file = %source.file_name(), "pruned unnecessary reference {}", name);
                kept.remove(name);
            }
            CompileOutcome::Failure(_) => {}
        }
    }

    Ok(kept)
}
