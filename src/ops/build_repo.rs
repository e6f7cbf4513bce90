//! The repository build pipeline.
//!
//! Strictly forward, single-threaded, one module at a time: resolve
//! references, persist the sidecar, compile, sign, export, install, render
//! documentation, collect the header. After the last module the index files
//! are written and the documentation scratch space is cleaned up. Any
//! failure past resolution aborts the whole run; there is no rollback and no
//! partial index.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use url::Url;

use crate::compile::{CompileOutcome, Compiler, Diagnostic};
use crate::core::{ModuleHeader, ModuleSource};
use crate::docs::{self, DocEngine, ImageCache};
use crate::index::RepositoryIndex;
use crate::package;
use crate::resolver::{self, normalize_assembly_name, ReferenceSet, Resolution};
use crate::sign::Signer;
use crate::util::fs as futil;

/// How the driver supplies assembly names when automatic resolution fails.
///
/// The resolver itself never blocks on input; when it cannot classify a
/// compile failure it hands the diagnostic back and this hook decides what
/// to add. An implementation may prompt an operator or simply error out in
/// non-interactive contexts.
pub trait ReferenceInput {
    fn provide(&mut self, source: &ModuleSource, diagnostic: &Diagnostic) -> Result<Vec<String>>;
}

/// Options for a repository build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Filesystem root of the repository containing `src/Modules/*.cs`.
    pub root: PathBuf,

    /// Host application assembly appended to the base reference set.
    pub host_assembly: Option<String>,

    /// Override of the per-user installed-modules directory.
    pub install_root: Option<PathBuf>,
}

/// What a completed run produced.
#[derive(Debug)]
pub struct BuildReport {
    /// Headers in discovery/processing order, exactly as indexed.
    pub headers: Vec<ModuleHeader>,
    /// Exported package paths, parallel to `headers`.
    pub packages: Vec<PathBuf>,
}

/// Build the whole module repository.
///
/// `engine` of `None` skips PDF rendering; package and index outputs are
/// unaffected.
pub fn build_repository(
    compiler: &dyn Compiler,
    signer: &dyn Signer,
    engine: Option<&dyn DocEngine>,
    input: &mut dyn ReferenceInput,
    opts: &BuildOptions,
) -> Result<BuildReport> {
    let root = futil::normalize_path(&opts.root);
    let src_dir = root.join("src").join("Modules");
    let refs_dir = src_dir.join("references");
    let modules_dir = root.join("Modules");

    if !src_dir.is_dir() {
        bail!("no module sources found: {} is not a directory", src_dir.display());
    }

    let sources = futil::glob_files(&src_dir, &["*.cs".to_string()])?;
    warn_stale_sidecars(&refs_dir, &sources)?;

    let install_root = match &opts.install_root {
        Some(path) => path.clone(),
        None => package::default_install_root()?,
    };

    let base = Url::from_directory_path(&src_dir)
        .map_err(|_| anyhow!("repository root must resolve to an absolute path"))?;

    let mut cache = ImageCache::new()?;
    let mut index = RepositoryIndex::new();
    let mut packages = Vec::new();

    for path in &sources {
        let source = ModuleSource::read(path)?;
        tracing::info!("resolving references for {}", source.file_name());

        let sidecar = ReferenceSet::cache_path(&refs_dir, source.file_name());
        let mut seed = match ReferenceSet::load(&sidecar)? {
            Some(cached) => cached,
            None => ReferenceSet::base(opts.host_assembly.as_deref()),
        };

        let references = loop {
            match resolver::resolve(compiler, &source, seed)? {
                Resolution::Resolved(set) => break set,
                Resolution::NeedsInput { set, diagnostic } => {
                    let names = input.provide(&source, &diagnostic)?;
                    let mut augmented = set;
                    for name in names {
                        augmented.insert(&normalize_assembly_name(&name));
                    }
                    seed = augmented;
                }
            }
        };
        references.save(&sidecar)?;

        let module = match compiler.compile(&source, &references)? {
            CompileOutcome::Success(module) => module,
            CompileOutcome::Failure(diagnostic) => bail!(
                "module {} failed to compile with its resolved references: {}",
                source.file_name(),
                diagnostic
            ),
        };

        tracing::info!("packaging {} v{}", module.id, module.version);
        let package_path = package::export(&module, signer, &root)?;
        package::install_local(&package_path, &module, &install_root)?;

        if let Some(engine) = engine {
            tracing::info!("rendering documentation for {}", module.id);
            let out_dir = modules_dir.join(&module.id);
            docs::render_module(engine, &mut cache, &module, &base, &out_dir)?;
        }

        index.push(module.header());
        packages.push(package_path);
    }

    index.write(&modules_dir)?;
    cache.cleanup()?;

    Ok(BuildReport {
        headers: index.into_headers(),
        packages,
    })
}

/// Flag reference sidecars whose source file no longer exists. They are
/// harmless but usually mean a module was renamed without moving its cache.
fn warn_stale_sidecars(refs_dir: &Path, sources: &[PathBuf]) -> Result<()> {
    if !refs_dir.is_dir() {
        return Ok(());
    }

    let known: Vec<&str> = sources
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
        .collect();

    for entry in std::fs::read_dir(refs_dir)
        .with_context(|| format!("failed to read directory: {}", refs_dir.display()))?
    {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(stem) = name.strip_suffix(".references") {
            if !known.contains(&stem) {
                tracing::warn!("stale reference cache {} (no matching source file)", name);
            }
        }
    }

    Ok(())
}
