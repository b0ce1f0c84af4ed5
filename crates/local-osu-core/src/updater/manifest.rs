use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

pub const MANIFEST_FILE: &str = "version.toml";

/// Published description of an installation: its version, the files it
/// consists of, and files older versions had that must go.
///
/// ```toml
/// version = "1.5.1"
/// files = ["main.py", "objects/player.py", "website/css"]
/// deleted_files = ["menus/main_menu.py"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    #[serde(default, alias = "file_structure")]
    pub files: Vec<String>,
    #[serde(default)]
    pub deleted_files: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

impl Manifest {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut manifest: Manifest =
            toml::from_str(raw).map_err(|e| Error::InvalidManifest(e.to_string()))?;
        manifest.version = manifest.version.trim().to_string();
        if manifest.version.is_empty() {
            return Err(Error::InvalidManifest("empty version".to_string()));
        }
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::parse(&fs::read_to_string(path)?)
    }

    pub fn item_count(&self) -> usize {
        self.files.len() + self.deleted_files.len()
    }

    /// Versions are compared as plain strings, not semantically.
    pub fn matches_version(&self, version: &str) -> bool {
        self.version == version
    }
}

/// An entry is a directory when its last segment has no `.`.
pub fn entry_kind(path: &str) -> EntryKind {
    let last = path.trim_end_matches('/').rsplit('/').next().unwrap_or(path);
    if last.contains('.') {
        EntryKind::File
    } else {
        EntryKind::Directory
    }
}

pub fn file_name(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

/// Join a manifest path onto `root`, refusing anything that would land
/// outside it.
pub fn resolve(root: &Path, entry: &str) -> Result<PathBuf> {
    let relative = Path::new(entry.trim());
    if entry.trim().is_empty() {
        return Err(Error::InvalidManifest("empty path".to_string()));
    }

    let mut resolved = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::InvalidManifest(format!(
                    "'{}' escapes the install directory",
                    entry
                )));
            }
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_legacy_key() {
        let manifest = Manifest::parse(
            r#"
            version = "1.5.1"
            file_structure = [".gitignore", "ext/glob.py", "website/css"]
            deleted_files = ["handlers/website.py"]
            "#,
        )
        .unwrap();

        assert_eq!(manifest.version, "1.5.1");
        assert_eq!(manifest.files.len(), 3);
        assert_eq!(manifest.item_count(), 4);
        assert!(manifest.matches_version("1.5.1"));
        assert!(!manifest.matches_version("1.5.10"));
    }

    #[test]
    fn test_version_normalised_once_then_compared_exactly() {
        let manifest = Manifest::parse("version = \" 1.6.0\\n\"").unwrap();

        assert_eq!(manifest.version, "1.6.0");
        assert!(manifest.matches_version("1.6.0"));
        assert!(!manifest.matches_version("1.6.0 "));
        assert!(!manifest.matches_version("v1.6.0"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Manifest::parse("version = "),
            Err(Error::InvalidManifest(_))
        ));
        assert!(matches!(
            Manifest::parse("files = []"),
            Err(Error::InvalidManifest(_))
        ));
        assert!(matches!(
            Manifest::parse("version = \"  \""),
            Err(Error::InvalidManifest(_))
        ));
    }

    #[test]
    fn test_entry_kind_uses_last_segment() {
        assert_eq!(entry_kind("website/css"), EntryKind::Directory);
        assert_eq!(entry_kind("website/templates/"), EntryKind::Directory);
        assert_eq!(entry_kind("v1.2/readme"), EntryKind::Directory);
        assert_eq!(entry_kind(".gitignore"), EntryKind::File);
        assert_eq!(entry_kind("a/b.txt"), EntryKind::File);
        assert_eq!(file_name("a/requirements.txt"), "requirements.txt");
    }

    #[test]
    fn test_resolve_stays_inside_root() {
        let root = Path::new("/srv/osu");
        assert_eq!(
            resolve(root, "a/./b.txt").unwrap(),
            PathBuf::from("/srv/osu/a/b.txt")
        );
        assert!(resolve(root, "../etc/passwd").is_err());
        assert!(resolve(root, "a/../../x").is_err());
        assert!(resolve(root, "/etc/passwd").is_err());
        assert!(resolve(root, "").is_err());
    }
}
