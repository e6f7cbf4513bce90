//! Documentation rendering.
//!
//! The markdown-to-PDF engine is an external collaborator behind the
//! [`DocEngine`] trait; this module owns everything around it: finding image
//! references in a module readme, resolving them to local files through the
//! memoized [`ImageCache`], rewriting the markdown, and writing the rendered
//! `Readme.pdf` next to the module's package.

pub mod images;

pub use images::ImageCache;

use std::ffi::OsStr;
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use pulldown_cmark::{Event, Options, Parser, Tag};
use url::Url;

use crate::core::CompiledModule;
use crate::util::fs as futil;
use crate::util::process::{find_program, ProcessBuilder};

/// The opaque markdown-to-PDF capability.
pub trait DocEngine {
    /// Render markdown (image URIs already rewritten to local paths) to PDF
    /// bytes.
    fn render(&self, markdown: &str) -> Result<Vec<u8>>;
}

/// The markdown extension set module readmes may use.
///
/// Angle-bracket auto-links are core CommonMark and need no option here;
/// bare-URL linkification and heading auto-identifiers happen in the
/// rendering engine, which sees the full document.
fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_MATH
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_SMART_PUNCTUATION
}

/// Every image occurrence in document order: the byte span of the full
/// image markup plus its destination.
fn image_spans(markdown: &str) -> Vec<(Range<usize>, String)> {
    let mut spans = Vec::new();
    for (event, range) in Parser::new_ext(markdown, parser_options()).into_offset_iter() {
        if let Event::Start(Tag::Image { dest_url, .. }) = event {
            spans.push((range, dest_url.to_string()));
        }
    }
    spans
}

/// Resolve every image in the readme and rewrite its destination to the
/// resolved local path.
///
/// Only the destination bytes inside each image's own markup are touched;
/// prose that happens to mention a destination, or a longer destination that
/// ends in a shorter one, is left alone.
pub fn rewrite_images(markdown: &str, base: &Url, cache: &mut ImageCache) -> Result<String> {
    let mut resolved = Vec::new();
    for (range, dest) in image_spans(markdown) {
        let local = cache.resolve(base, &dest)?;
        resolved.push((range, dest, local));
    }

    // Splice back to front so earlier byte offsets stay valid.
    let mut rewritten = markdown.to_string();
    for (range, dest, local) in resolved.into_iter().rev() {
        let span = &rewritten[range.clone()];
        // Search past the alt text so an alt that repeats the destination
        // is never rewritten.
        let from = span.find("](").map(|i| i + 2).unwrap_or(0);
        let offset = span[from..]
            .find(dest.as_str())
            .map(|i| i + from)
            .with_context(|| format!("image destination `{}` not found in its markup", dest))?;
        let start = range.start + offset;
        rewritten.replace_range(start..start + dest.len(), &local.to_string_lossy());
    }
    Ok(rewritten)
}

/// Render one module's readme to `<out_dir>/Readme.pdf`.
pub fn render_module(
    engine: &dyn DocEngine,
    cache: &mut ImageCache,
    module: &CompiledModule,
    base: &Url,
    out_dir: &Path,
) -> Result<PathBuf> {
    let markdown = rewrite_images(&module.readme, base, cache)
        .with_context(|| format!("failed to resolve images for module `{}`", module.id))?;

    let pdf = engine
        .render(&markdown)
        .with_context(|| format!("failed to render documentation for module `{}`", module.id))?;

    futil::ensure_dir(out_dir)?;
    let path = out_dir.join("Readme.pdf");
    futil::write_bytes(&path, &pdf)?;
    Ok(path)
}

/// Engine that shells out to an external renderer: markdown on stdin, PDF
/// on stdout.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: PathBuf,
}

impl CommandEngine {
    /// Locate the renderer program on PATH (or via a direct path).
    pub fn new(program: impl AsRef<OsStr>) -> Result<Self> {
        let program = find_program(program).context("documentation engine not available")?;
        Ok(CommandEngine { program })
    }
}

impl DocEngine for CommandEngine {
    fn render(&self, markdown: &str) -> Result<Vec<u8>> {
        let output = ProcessBuilder::new(&self.program)
            .stdin(markdown.as_bytes().to_vec())
            .exec()?;

        if !output.status.success() {
            bail!(
                "documentation engine failed with exit code {:?}\n{}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            );
        }

        Ok(output.stdout)
    }
}
