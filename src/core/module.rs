//! Module identity - sources, compiled modules, and index headers.
//!
//! A module is a unit of pluggable functionality compiled from a single
//! source file, identified by a stable id and a semver version.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::util::fs as futil;

/// The kinds of pluggable modules the host application loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleType {
    FileType,
    LoadFile,
    Transformer,
    FurtherTransformation,
    Coordinates,
    Plotting,
    SelectionAction,
    Action,
    MenuAction,
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModuleType::FileType => "FileType",
            ModuleType::LoadFile => "LoadFile",
            ModuleType::Transformer => "Transformer",
            ModuleType::FurtherTransformation => "FurtherTransformation",
            ModuleType::Coordinates => "Coordinates",
            ModuleType::Plotting => "Plotting",
            ModuleType::SelectionAction => "SelectionAction",
            ModuleType::Action => "Action",
            ModuleType::MenuAction => "MenuAction",
        };
        f.write_str(s)
    }
}

/// A module source file: path plus raw text, immutable once read.
///
/// Identified by file name; the reference cache sidecar is keyed on it.
#[derive(Debug, Clone)]
pub struct ModuleSource {
    file_name: String,
    path: PathBuf,
    text: String,
}

impl ModuleSource {
    /// Read a module source file from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let text = futil::read_to_string(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("module source has no usable file name: {}", path.display()))?
            .to_string();

        Ok(ModuleSource {
            file_name,
            path: path.to_path_buf(),
            text,
        })
    }

    /// Construct a source from in-memory text.
    pub fn from_text(file_name: impl Into<String>, text: impl Into<String>) -> Self {
        let file_name = file_name.into();
        ModuleSource {
            path: PathBuf::from(&file_name),
            file_name,
            text: text.into(),
        }
    }

    /// The source's file name, e.g. `OpenFile.cs`.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The on-disk path the source was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The raw source text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A successfully compiled module, as emitted by the compilation service.
///
/// Carries the module's identity and everything the packager needs: the
/// embedded readme markdown and the compiled payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledModule {
    pub id: String,
    pub name: String,
    pub version: Version,
    pub author: String,
    pub help_text: String,
    pub module_type: ModuleType,
    /// Markdown readme embedded in the module source.
    pub readme: String,
    /// Compiled payload, opaque to this tool.
    pub payload: serde_json::Value,
}

impl CompiledModule {
    /// The header projection used by the repository index.
    pub fn header(&self) -> ModuleHeader {
        ModuleHeader {
            id: self.id.clone(),
            name: self.name.clone(),
            version: self.version.clone(),
            author: self.author.clone(),
            help_text: self.help_text.clone(),
            module_type: self.module_type,
        }
    }

    /// Package file name, e.g. `a1b2.v1.0.0.json.zip`.
    pub fn package_file_name(&self) -> String {
        format!("{}.v{}.json.zip", self.id, self.version)
    }
}

/// A lightweight projection of a compiled module for the repository index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleHeader {
    pub id: String,
    pub name: String,
    pub version: Version,
    pub author: String,
    pub help_text: String,
    pub module_type: ModuleType,
}
