//! Sidecar password discovery
//!
//! A sidecar is a small text file dropped next to protected documents whose
//! trimmed content is the password for everything under its directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::glob::escape;
use super::resolver::PasswordResolver;
use crate::document::normalize_key;

/// Recognized sidecar file names (compared case-insensitively)
pub const SIDECAR_FILE_NAMES: &[&str] = &[".password", ".docpassword", "password.txt"];

const MIN_PASSWORD_CHARS: usize = 3;
const MAX_PASSWORD_CHARS: usize = 256;

/// Validate sidecar content and return the password it holds
pub fn sidecar_password(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.contains(['\n', '\r']) {
        return None;
    }

    let chars = trimmed.chars().count();
    (MIN_PASSWORD_CHARS..=MAX_PASSWORD_CHARS)
        .contains(&chars)
        .then(|| trimmed.to_string())
}

impl PasswordResolver {
    /// Scan a directory tree for sidecar files and register their passwords
    ///
    /// Deeper directories are registered first so that a nested sidecar takes
    /// precedence over one higher up the tree. Returns the number of sidecars
    /// registered.
    pub fn auto_detect(&self, root_dir: impl AsRef<Path>) -> usize {
        let root = root_dir.as_ref();
        if !root.is_dir() {
            warn!("Password auto-detect root {} is not a directory", root.display());
            return 0;
        }

        let mut sidecars: Vec<(usize, PathBuf)> = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                let name = entry.file_name().to_string_lossy().to_lowercase();
                SIDECAR_FILE_NAMES.contains(&name.as_str())
            })
            .map(|entry| (entry.depth(), entry.into_path()))
            .collect();
        sidecars.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        let mut detected = 0;
        for (_, sidecar) in sidecars {
            let content = match fs::read_to_string(&sidecar) {
                Ok(content) => content,
                Err(e) => {
                    warn!("Failed to read password sidecar {}: {}", sidecar.display(), e);
                    continue;
                }
            };

            let Some(password) = sidecar_password(&content) else {
                debug!("Ignoring invalid password sidecar {}", sidecar.display());
                continue;
            };

            let Some(dir) = sidecar.parent() else {
                continue;
            };

            let glob = format!("{}/**", escape(&normalize_key(dir)));
            match self.register_pattern(&glob, password) {
                Ok(()) => {
                    debug!("Registered sidecar password for {}", dir.display());
                    detected += 1;
                }
                Err(e) => warn!("Failed to register sidecar {}: {}", sidecar.display(), e),
            }
        }

        info!("Detected {} password sidecars under {}", detected, root.display());
        detected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sidecar_password_validation() {
        assert_eq!(sidecar_password("  hunter2 \n").as_deref(), Some("hunter2"));
        assert_eq!(sidecar_password(""), None);
        assert_eq!(sidecar_password("ab"), None);
        assert_eq!(sidecar_password("line1\nline2"), None);
        assert_eq!(sidecar_password(&"x".repeat(257)), None);
        assert!(sidecar_password(&"x".repeat(256)).is_some());
    }

    #[test]
    fn test_auto_detect_registers_directory_patterns() {
        let root = TempDir::new().unwrap();
        let finance = root.path().join("finance");
        let payroll = finance.join("payroll");
        let public = root.path().join("public");
        fs::create_dir_all(&payroll).unwrap();
        fs::create_dir_all(&public).unwrap();

        fs::write(finance.join(".password"), "fin-pass\n").unwrap();
        fs::write(payroll.join("password.txt"), "pay-pass").unwrap();
        fs::write(public.join(".password"), "x").unwrap();

        let resolver = PasswordResolver::new();
        assert_eq!(resolver.auto_detect(root.path()), 2);

        assert_eq!(
            resolver.resolve(finance.join("q1.xlsx")).as_deref(),
            Some("fin-pass")
        );
        assert_eq!(
            resolver.resolve(payroll.join("march.xlsx")).as_deref(),
            Some("pay-pass")
        );
        assert_eq!(resolver.resolve(public.join("flyer.pdf")), None);
    }

    #[test]
    fn test_auto_detect_on_missing_directory() {
        let resolver = PasswordResolver::new();
        assert_eq!(resolver.auto_detect("/definitely/not/here"), 0);
    }
}
