//! Image resolution for module documentation.
//!
//! Resolution is memoized per (base URI, image URI) pair for the duration of
//! one repository build, because the same figure is frequently referenced
//! from multiple modules or repeated within one readme. Every downloaded or
//! synthesized file lives in a scratch directory that is removed in a single
//! cleanup pass at end of run.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tempfile::TempDir;
use url::Url;

use crate::util::fs as futil;

/// Memoized (base URI, image URI) -> local file path resolver.
pub struct ImageCache {
    resolved: HashMap<(String, String), PathBuf>,
    scratch: TempDir,
    counter: usize,
    client: reqwest::blocking::Client,
}

impl ImageCache {
    pub fn new() -> Result<Self> {
        let scratch = tempfile::Builder::new()
            .prefix("stevedore-docs-")
            .tempdir()
            .context("failed to create documentation scratch directory")?;

        Ok(ImageCache {
            resolved: HashMap::new(),
            scratch,
            counter: 0,
            client: reqwest::blocking::Client::new(),
        })
    }

    /// Resolve an image URI to a local file path.
    ///
    /// Relative URIs are resolved against `base`; remote URIs are downloaded
    /// into the scratch directory; `data:` URIs are decoded and written to a
    /// scratch file so the renderer can treat every image as file-backed.
    pub fn resolve(&mut self, base: &Url, uri: &str) -> Result<PathBuf> {
        let key = (base.as_str().to_string(), uri.to_string());
        if let Some(path) = self.resolved.get(&key) {
            return Ok(path.clone());
        }

        let path = if uri.starts_with("data:") {
            self.materialize_data_uri(uri)?
        } else {
            let url = base
                .join(uri)
                .with_context(|| format!("invalid image URI: {}", uri))?;
            match url.scheme() {
                "http" | "https" => self.download(&url)?,
                "file" => {
                    let path = url
                        .to_file_path()
                        .map_err(|_| anyhow!("image URI is not a local path: {}", uri))?;
                    if !path.exists() {
                        bail!("image file not found: {}", path.display());
                    }
                    path
                }
                other => bail!("unsupported image URI scheme `{}` in {}", other, uri),
            }
        };

        self.resolved.insert(key, path.clone());
        Ok(path)
    }

    /// Decode an inline `data:<mime>;base64,<payload>` image into a scratch
    /// file. Vector images are checked to be well-formed before they are
    /// re-serialized.
    fn materialize_data_uri(&mut self, uri: &str) -> Result<PathBuf> {
        let body = uri.strip_prefix("data:").unwrap_or(uri);
        let (header, payload) = body
            .split_once(',')
            .with_context(|| format!("malformed data URI (no payload): {}", truncate(uri)))?;
        let mime = header
            .strip_suffix(";base64")
            .with_context(|| format!("data URI is not base64-encoded: {}", truncate(uri)))?;

        let bytes = BASE64
            .decode(payload)
            .with_context(|| format!("malformed base64 payload in data URI: {}", truncate(uri)))?;

        let extension = match mime {
            "image/svg+xml" => {
                let text = std::str::from_utf8(&bytes)
                    .context("inline SVG image is not valid UTF-8")?;
                if !text.contains("<svg") {
                    bail!("inline SVG image has no <svg> element");
                }
                "svg".to_string()
            }
            "image/jpeg" => "jpg".to_string(),
            _ => mime.rsplit('/').next().unwrap_or("bin").to_string(),
        };

        self.write_scratch_file(&format!("image.{}", extension), &bytes)
    }

    /// Download a remote image into the scratch directory.
    fn download(&mut self, url: &Url) -> Result<PathBuf> {
        tracing::debug!("downloading image {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("failed to download image: {}", url))?;
        let bytes = response
            .bytes()
            .with_context(|| format!("failed to read image body: {}", url))?;

        let name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|s| !s.is_empty())
            .unwrap_or("image.bin")
            .to_string();

        self.write_scratch_file(&name, &bytes)
    }

    /// Write bytes into a fresh per-image scratch subdirectory.
    fn write_scratch_file(&mut self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let dir = self.scratch.path().join(format!("img{}", self.counter));
        self.counter += 1;

        let path = dir.join(name);
        futil::write_bytes(&path, bytes)?;
        Ok(path)
    }

    /// Number of distinct (base, uri) pairs resolved so far.
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    /// Remove every scratch file and directory created during the run.
    ///
    /// Deliberately a single end-of-run pass, not per module: the cache
    /// must keep files alive across modules that share figures.
    pub fn cleanup(self) -> Result<()> {
        self.scratch
            .close()
            .context("failed to remove documentation scratch directory")
    }
}

/// Cap a URI to its first 64 characters for error messages. Cuts on a char
/// boundary, never mid-codepoint.
fn truncate(s: &str) -> &str {
    match s.char_indices().nth(64) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}
