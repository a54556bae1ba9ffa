//! Path key normalization
//!
//! Cache entries and exact password registrations are keyed by the same
//! normalized form: absolute, `.`/`..` folded lexically, `/` separators,
//! lowercase. The file system is never consulted, so keys can be derived for
//! paths that do not exist (yet).

use std::path::{Component, Path, PathBuf};

/// Normalize a path into a cache/password key
///
/// Falls back to the raw (lowercased) text when no absolute form can be
/// built, e.g. for an empty path or an unreadable working directory.
pub fn normalize_key(path: impl AsRef<Path>) -> String {
    let raw = path.as_ref();
    match absolute_path(raw) {
        Some(abs) => to_key(&abs),
        None => to_key(raw),
    }
}

fn to_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}

fn absolute_path(path: &Path) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        return None;
    }

    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(path)
    };

    let mut folded = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                folded.pop();
            }
            other => folded.push(other.as_os_str()),
        }
    }
    Some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_path_is_lowercased() {
        assert_eq!(normalize_key("/Data/Reports/Q1.XLSX"), "/data/reports/q1.xlsx");
    }

    #[test]
    fn test_dot_segments_are_folded() {
        assert_eq!(normalize_key("/data/./tmp/../a.pdf"), "/data/a.pdf");
    }

    #[test]
    fn test_relative_path_is_anchored_at_cwd() {
        let cwd = std::env::current_dir().unwrap();
        let expected = to_key(&cwd.join("a.pdf"));
        assert_eq!(normalize_key("a.pdf"), expected);
        assert!(normalize_key("a.pdf").ends_with("/a.pdf"));
    }

    #[test]
    fn test_case_variants_share_a_key() {
        assert_eq!(normalize_key("/x/Secret.docx"), normalize_key("/X/SECRET.DOCX"));
    }

    #[test]
    fn test_empty_path_falls_back_to_raw() {
        assert_eq!(normalize_key(""), "");
    }
}
