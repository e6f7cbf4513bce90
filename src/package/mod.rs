//! Package export and local installation.
//!
//! A signed package is a zip archive `<id>.v<version>.json.zip` holding the
//! serialized module, its readme source, and a signature envelope. Packages
//! are overwritten on rebuild; one exists per module.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::core::CompiledModule;
use crate::sign::Signer;
use crate::util::fs as futil;
use crate::util::hash;

/// File names inside the package archive.
pub const MODULE_ENTRY: &str = "module.json";
pub const README_ENTRY: &str = "Readme.md";
pub const SIGNATURE_ENTRY: &str = "signature.json";

/// Signature envelope stored next to the module payload inside the package.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureEnvelope {
    /// Ed25519 signature over the serialized module, hex-encoded.
    pub signature: String,
    /// SHA256 checksum of the serialized module.
    pub sha256: String,
    /// Hex-encoded public key of the signer.
    pub key_id: String,
}

/// Export a compiled, signed module package.
///
/// Writes `<repo_root>/Modules/<id>/<id>.v<version>.json.zip`, creating the
/// per-module directory if absent, and returns the package path.
pub fn export(module: &CompiledModule, signer: &dyn Signer, repo_root: &Path) -> Result<PathBuf> {
    let module_json = serde_json::to_vec_pretty(module)
        .with_context(|| format!("failed to serialize module `{}`", module.id))?;

    let envelope = SignatureEnvelope {
        signature: signer
            .sign(&module_json)
            .with_context(|| format!("failed to sign module `{}`", module.id))?,
        sha256: hash::sha256_bytes(&module_json),
        key_id: signer.key_id(),
    };
    let envelope_json = serde_json::to_vec_pretty(&envelope)
        .context("failed to serialize signature envelope")?;

    let module_dir = repo_root.join("Modules").join(&module.id);
    futil::ensure_dir(&module_dir)?;

    let path = module_dir.join(module.package_file_name());
    let file = File::create(&path)
        .with_context(|| format!("failed to create package file: {}", path.display()))?;

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut archive = ZipWriter::new(file);

    archive.start_file(MODULE_ENTRY, options)?;
    archive.write_all(&module_json)?;
    archive.start_file(README_ENTRY, options)?;
    archive.write_all(module.readme.as_bytes())?;
    archive.start_file(SIGNATURE_ENTRY, options)?;
    archive.write_all(&envelope_json)?;

    archive
        .finish()
        .with_context(|| format!("failed to finish package archive: {}", path.display()))?;

    Ok(path)
}

/// Install an exported package into the local installed-modules directory so
/// later pipeline steps can resolve the module by id. Non-global and
/// non-interactive.
pub fn install_local(
    package: &Path,
    module: &CompiledModule,
    install_root: &Path,
) -> Result<PathBuf> {
    let module_dir = install_root.join(&module.id);
    futil::ensure_dir(&module_dir)?;

    let dest = module_dir.join(module.package_file_name());
    fs::copy(package, &dest).with_context(|| {
        format!(
            "failed to install {} to {}",
            package.display(),
            dest.display()
        )
    })?;

    Ok(dest)
}

/// The per-user installed-modules directory.
pub fn default_install_root() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "stevedore")
        .context("could not determine a home directory for module installation")?;
    Ok(dirs.data_dir().join("modules"))
}
