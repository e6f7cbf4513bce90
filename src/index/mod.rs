//! Repository index outputs.
//!
//! The machine-readable contract is `modules.json.gz` (the full header list,
//! serialized and gzip-compressed) consumed by the client application's
//! update/browse features; the human-readable side is a markdown `Readme.md`
//! listing. Both are fully regenerated on every run, never merged with a
//! prior index.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::core::ModuleHeader;
use crate::util::fs as futil;

/// Index file names under the repository `Modules` directory.
pub const INDEX_FILE: &str = "modules.json.gz";
pub const LISTING_FILE: &str = "Readme.md";

/// The ordered collection of module headers for one repository build.
///
/// Order is preserved from insertion, i.e. the order modules were discovered
/// and processed; the listing is deliberately not sorted by name or id.
#[derive(Debug, Default)]
pub struct RepositoryIndex {
    headers: Vec<ModuleHeader>,
}

impl RepositoryIndex {
    pub fn new() -> Self {
        RepositoryIndex::default()
    }

    pub fn push(&mut self, header: ModuleHeader) {
        self.headers.push(header);
    }

    pub fn headers(&self) -> &[ModuleHeader] {
        &self.headers
    }

    pub fn into_headers(self) -> Vec<ModuleHeader> {
        self.headers
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Serialize the header list and gzip-compress it.
    pub fn to_gzip(&self) -> Result<Vec<u8>> {
        let json =
            serde_json::to_vec(&self.headers).context("failed to serialize module index")?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&json)
            .context("failed to compress module index")?;
        encoder.finish().context("failed to finish module index")
    }

    /// Human-readable listing, one section per module in input order.
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("# Modules\n");

        for header in &self.headers {
            // write! to a String cannot fail
            let _ = write!(
                out,
                "\n## [{}]({}/)\n\n\
                 - Version: {}\n\
                 - Author: {}\n\
                 - Description: {}\n\
                 - Type: {}\n\
                 - Id: `{}`\n",
                header.name,
                header.id,
                header.version,
                header.author,
                header.help_text,
                header.module_type,
                header.id
            );
        }

        out
    }

    /// Write `modules.json.gz` and `Readme.md` under the repository's
    /// `Modules` directory.
    pub fn write(&self, modules_dir: &Path) -> Result<()> {
        futil::ensure_dir(modules_dir)?;
        futil::write_bytes(&modules_dir.join(INDEX_FILE), &self.to_gzip()?)?;
        futil::write_string(&modules_dir.join(LISTING_FILE), &self.to_markdown())
    }
}

impl FromIterator<ModuleHeader> for RepositoryIndex {
    fn from_iter<I: IntoIterator<Item = ModuleHeader>>(iter: I) -> Self {
        RepositoryIndex {
            headers: iter.into_iter().collect(),
        }
    }
}
