//! Reference resolution - the minimal assembly set a module compiles against.

pub mod resolve;

pub use resolve::{minimize, resolve, Resolution};

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::util::fs as futil;

/// Core runtime assemblies every module is compiled against by default.
pub const CORE_ASSEMBLIES: &[&str] = &[
    "mscorlib.dll",
    "netstandard.dll",
    "System.dll",
    "System.Core.dll",
    "System.Runtime.dll",
];

/// An ordered, de-duplicated list of assembly names for one module source.
///
/// Persisted as a sidecar file (`<file_name>.references`) in the reference
/// cache directory, one assembly name per line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReferenceSet {
    names: Vec<String>,
}

impl ReferenceSet {
    /// An empty set.
    pub fn new() -> Self {
        ReferenceSet::default()
    }

    /// The fixed base set: core runtime assemblies plus, when configured,
    /// the host application's own assembly.
    pub fn base(host_assembly: Option<&str>) -> Self {
        let mut set = ReferenceSet::new();
        for name in CORE_ASSEMBLIES {
            set.insert(name);
        }
        if let Some(host) = host_assembly {
            set.insert(host);
        }
        set
    }

    /// Append a name unless it is already present. Returns whether the set
    /// changed.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            false
        } else {
            self.names.push(name.to_string());
            true
        }
    }

    /// Remove a name if present.
    pub fn remove(&mut self, name: &str) {
        self.names.retain(|n| n != name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// A copy of the set with one name removed.
    pub fn without(&self, name: &str) -> ReferenceSet {
        let mut copy = self.clone();
        copy.remove(name);
        copy
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Sidecar path for a module source file in the reference cache
    /// directory.
    pub fn cache_path(cache_dir: &Path, file_name: &str) -> PathBuf {
        cache_dir.join(format!("{}.references", file_name))
    }

    /// Load a cached set, or `None` if no sidecar exists.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let mut set = ReferenceSet::new();
        for line in futil::read_to_string(path)?.lines() {
            let line = line.trim();
            if !line.is_empty() {
                set.insert(line);
            }
        }
        Ok(Some(set))
    }

    /// Persist the set, one assembly name per line, overwriting any
    /// previous content.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut contents = String::new();
        for name in &self.names {
            contents.push_str(name);
            contents.push('\n');
        }
        futil::write_string(path, &contents)
    }
}

impl FromIterator<String> for ReferenceSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = ReferenceSet::new();
        for name in iter {
            set.insert(&name);
        }
        set
    }
}

/// Normalize a user-supplied assembly name: trims whitespace and ensures a
/// single `.dll` suffix.
pub fn normalize_assembly_name(input: &str) -> String {
    let trimmed = input.trim();
    let bare = trimmed.strip_suffix(".dll").unwrap_or(trimmed);
    format!("{}.dll", bare)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_insert_deduplicates_preserving_order() {
        let mut set = ReferenceSet::new();
        assert!(set.insert("B.dll"));
        assert!(set.insert("A.dll"));
        assert!(!set.insert("B.dll"));

        let names: Vec<_> = set.iter().collect();
        assert_eq!(names, vec!["B.dll", "A.dll"]);
    }

    #[test]
    fn test_base_includes_host_assembly() {
        let set = ReferenceSet::base(Some("Host.dll"));
        assert!(set.contains("mscorlib.dll"));
        assert!(set.contains("Host.dll"));
        assert_eq!(set.len(), CORE_ASSEMBLIES.len() + 1);
    }

    #[test]
    fn test_sidecar_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = ReferenceSet::cache_path(tmp.path(), "OpenFile.cs");
        assert!(path.ends_with("OpenFile.cs.references"));

        let set: ReferenceSet = ["System.dll".to_string(), "Newtonsoft.Json.dll".to_string()]
            .into_iter()
            .collect();
        set.save(&path).unwrap();

        let loaded = ReferenceSet::load(&path).unwrap().unwrap();
        assert_eq!(loaded, set);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "System.dll\nNewtonsoft.Json.dll\n");
    }

    #[test]
    fn test_load_missing_sidecar() {
        let tmp = TempDir::new().unwrap();
        let path = ReferenceSet::cache_path(tmp.path(), "Missing.cs");
        assert!(ReferenceSet::load(&path).unwrap().is_none());
    }

    #[test]
    fn test_save_overwrites() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("m.cs.references");

        let mut set = ReferenceSet::new();
        set.insert("Old.dll");
        set.save(&path).unwrap();

        let mut set = ReferenceSet::new();
        set.insert("New.dll");
        set.save(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "New.dll\n");
    }

    #[test]
    fn test_normalize_assembly_name() {
        assert_eq!(normalize_assembly_name("Newtonsoft.Json"), "Newtonsoft.Json.dll");
        assert_eq!(normalize_assembly_name(" Newtonsoft.Json.dll "), "Newtonsoft.Json.dll");
    }
}
