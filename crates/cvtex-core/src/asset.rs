//! Asset resolution and copying into build working directories
//!
//! Templates reference images by base name. Before rendering, each asset-bearing
//! field is resolved to an existing file, copied next to the generated source,
//! and the field is rewritten to the copied file's base name.

use crate::error::{CvtexError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A data field that names an asset file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetField {
    /// Key in the document data holding an optional explicit path
    pub field: String,
    /// File name looked up in the template directory and project root
    pub default: String,
}

impl AssetField {
    pub fn new(field: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            default: default.into(),
        }
    }
}

/// Asset fields used by the bundled CV templates
pub fn default_asset_fields() -> Vec<AssetField> {
    vec![
        AssetField::new("photo_banner_path", "photo_banner.png"),
        AssetField::new("highlight_path", "highlight.png"),
    ]
}

/// Resolve an asset to an existing file
///
/// Candidates are tried in order, first hit wins:
/// 1. `explicit` if absolute
/// 2. `explicit` relative to `project_root`
/// 3. `explicit` relative to `template_dir`
/// 4. `default_name` in `template_dir`
/// 5. `default_name` in `project_root`
///
/// Returns `None` when nothing exists; a missing asset is not an error.
pub fn resolve_asset(
    explicit: Option<&str>,
    template_dir: &Path,
    project_root: &Path,
    default_name: &str,
) -> Option<PathBuf> {
    candidates(explicit, template_dir, project_root, default_name)
        .into_iter()
        .find(|candidate| {
            let found = candidate.exists();
            debug!(candidate = %candidate.display(), found, "asset candidate");
            found
        })
}

fn candidates(
    explicit: Option<&str>,
    template_dir: &Path,
    project_root: &Path,
    default_name: &str,
) -> Vec<PathBuf> {
    let mut list = Vec::with_capacity(5);

    if let Some(raw) = explicit.filter(|p| !p.trim().is_empty()) {
        let path = Path::new(raw);
        if path.is_absolute() {
            list.push(path.to_path_buf());
        } else {
            list.push(project_root.join(path));
            list.push(template_dir.join(path));
        }
    }

    if !default_name.is_empty() {
        list.push(template_dir.join(default_name));
        list.push(project_root.join(default_name));
    }

    list
}

/// Copy `asset` into `workdir` under its own base name, overwriting any file of that name
///
/// Returns the base name, which is how the generated source must refer to it.
pub fn copy_into_workdir(asset: &Path, workdir: &Path) -> Result<String> {
    let copy_error = |source: std::io::Error| CvtexError::AssetCopy {
        path: asset.to_path_buf(),
        workdir: workdir.to_path_buf(),
        source,
    };

    let name = asset.file_name().ok_or_else(|| {
        copy_error(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "asset path has no file name",
        ))
    })?;

    let dest = workdir.join(name);
    std::fs::copy(asset, &dest).map_err(copy_error)?;
    debug!(from = %asset.display(), to = %dest.display(), "copied asset");

    Ok(name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvtex_testkit::temp_dir_in_workspace;
    use std::fs;

    struct Layout {
        _temp: tempfile::TempDir,
        root: PathBuf,
        templates: PathBuf,
    }

    fn layout() -> Layout {
        let temp = temp_dir_in_workspace();
        let root = temp.path().to_path_buf();
        let templates = root.join("templates");
        fs::create_dir_all(&templates).unwrap();
        Layout {
            _temp: temp,
            root,
            templates,
        }
    }

    #[test]
    fn test_explicit_absolute_path_wins() {
        let l = layout();
        let abs = l.root.join("elsewhere.png");
        fs::write(&abs, b"abs").unwrap();
        fs::write(l.templates.join("photo_banner.png"), b"default").unwrap();

        let found = resolve_asset(
            Some(abs.to_str().unwrap()),
            &l.templates,
            &l.root,
            "photo_banner.png",
        );
        assert_eq!(found, Some(abs));
    }

    #[test]
    fn test_relative_prefers_project_root_over_template_dir() {
        let l = layout();
        fs::create_dir_all(l.root.join("img")).unwrap();
        fs::create_dir_all(l.templates.join("img")).unwrap();
        fs::write(l.root.join("img/banner.png"), b"root").unwrap();
        fs::write(l.templates.join("img/banner.png"), b"tpl").unwrap();

        let found = resolve_asset(Some("img/banner.png"), &l.templates, &l.root, "x.png");
        assert_eq!(found, Some(l.root.join("img/banner.png")));
    }

    #[test]
    fn test_relative_falls_back_to_template_dir() {
        let l = layout();
        fs::write(l.templates.join("banner.png"), b"tpl").unwrap();

        let found = resolve_asset(Some("banner.png"), &l.templates, &l.root, "x.png");
        assert_eq!(found, Some(l.templates.join("banner.png")));
    }

    #[test]
    fn test_default_name_template_dir_before_project_root() {
        let l = layout();
        fs::write(l.templates.join("highlight.png"), b"tpl").unwrap();
        fs::write(l.root.join("highlight.png"), b"root").unwrap();

        let found = resolve_asset(Some("missing.png"), &l.templates, &l.root, "highlight.png");
        assert_eq!(found, Some(l.templates.join("highlight.png")));

        fs::remove_file(l.templates.join("highlight.png")).unwrap();
        let found = resolve_asset(None, &l.templates, &l.root, "highlight.png");
        assert_eq!(found, Some(l.root.join("highlight.png")));
    }

    #[test]
    fn test_unresolved_returns_none() {
        let l = layout();
        assert_eq!(
            resolve_asset(Some("nope.png"), &l.templates, &l.root, "nope-either.png"),
            None
        );
        assert_eq!(resolve_asset(Some("  "), &l.templates, &l.root, ""), None);
    }

    #[test]
    fn test_copy_uses_basename_and_overwrites() {
        let l = layout();
        let workdir = l.root.join("work");
        fs::create_dir_all(&workdir).unwrap();
        fs::create_dir_all(l.root.join("deep/dir")).unwrap();
        let src = l.root.join("deep/dir/photo.png");
        fs::write(&src, [0x89, b'P', b'N', b'G', 0, 1, 2]).unwrap();
        fs::write(workdir.join("photo.png"), b"stale").unwrap();

        let name = copy_into_workdir(&src, &workdir).unwrap();
        assert_eq!(name, "photo.png");
        assert_eq!(
            fs::read(workdir.join("photo.png")).unwrap(),
            vec![0x89, b'P', b'N', b'G', 0, 1, 2]
        );
    }

    #[test]
    fn test_copy_missing_source_is_asset_error() {
        let l = layout();
        let err = copy_into_workdir(&l.root.join("gone.png"), &l.root).unwrap_err();
        match err {
            CvtexError::AssetCopy { path, .. } => assert!(path.ends_with("gone.png")),
            other => panic!("Expected AssetCopy error, got {other:?}"),
        }
    }
}
