//! Password resolution by exact path and glob pattern
//!
//! Exact registrations always win over patterns. Among patterns the first
//! one registered that matches wins; there is no specificity scoring, so
//! callers with overlapping patterns register the narrower one first.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, warn};

use super::glob::{is_glob, GlobPattern, PatternError};
use crate::document::normalize_key;

struct PatternRegistration {
    pattern: GlobPattern,
    password: String,
}

/// Registered password counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationCounts {
    pub exact: usize,
    pub patterns: usize,
}

/// Maps document paths to passwords
///
/// Shared by every loader; registrations may be added while loads are in
/// flight.
#[derive(Default)]
pub struct PasswordResolver {
    exact: RwLock<HashMap<String, String>>,
    patterns: RwLock<Vec<PatternRegistration>>,
}

impl PasswordResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a password for one path (overwrites an earlier registration)
    pub fn register_exact(&self, path: impl AsRef<Path>, password: impl Into<String>) {
        let key = normalize_key(path);
        debug!("Registered exact password for {}", key);
        self.exact.write().insert(key, password.into());
    }

    /// Register a password for every path matching a glob
    pub fn register_pattern(
        &self,
        glob: &str,
        password: impl Into<String>,
    ) -> Result<(), PatternError> {
        let pattern = GlobPattern::compile(glob)?;
        debug!("Registered password pattern {}", pattern.as_str());
        self.patterns.write().push(PatternRegistration {
            pattern,
            password: password.into(),
        });
        Ok(())
    }

    /// Find the password for a path: exact first, then patterns in order
    pub fn resolve(&self, path: impl AsRef<Path>) -> Option<String> {
        let key = normalize_key(path);

        if let Some(password) = self.exact.read().get(&key) {
            return Some(password.clone());
        }

        self.patterns
            .read()
            .iter()
            .find(|registration| registration.pattern.is_match(&key))
            .map(|registration| registration.password.clone())
    }

    /// Register many entries, skipping (and logging) the ones that fail
    ///
    /// Keys containing glob metacharacters become patterns, others exact
    /// paths. Returns how many entries were registered.
    pub fn bulk_register<I, K, V>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut registered = 0;
        for (key, password) in entries {
            let key = key.as_ref().trim();
            if key.is_empty() {
                warn!("Skipping password entry with an empty path");
                continue;
            }

            if is_glob(key) {
                match self.register_pattern(key, password) {
                    Ok(()) => registered += 1,
                    Err(e) => warn!("Skipping password pattern {}: {}", key, e),
                }
            } else {
                self.register_exact(key, password);
                registered += 1;
            }
        }
        registered
    }

    /// Drop an exact registration
    pub fn remove_exact(&self, path: impl AsRef<Path>) -> bool {
        self.exact.write().remove(&normalize_key(path)).is_some()
    }

    /// Drop every registration
    pub fn clear(&self) {
        self.exact.write().clear();
        self.patterns.write().clear();
    }

    pub fn registration_counts(&self) -> RegistrationCounts {
        RegistrationCounts {
            exact: self.exact.read().len(),
            patterns: self.patterns.read().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_registration() {
        let resolver = PasswordResolver::new();
        resolver.register_exact("/vault/Budget.xlsx", "s3cret");

        assert_eq!(resolver.resolve("/vault/budget.XLSX").as_deref(), Some("s3cret"));
        assert_eq!(resolver.resolve("/vault/other.xlsx"), None);
    }

    #[test]
    fn test_later_exact_registration_overwrites() {
        let resolver = PasswordResolver::new();
        resolver.register_exact("/vault/a.docx", "old");
        resolver.register_exact("/VAULT/A.docx", "new");

        assert_eq!(resolver.resolve("/vault/a.docx").as_deref(), Some("new"));
        assert_eq!(resolver.registration_counts().exact, 1);
    }

    #[test]
    fn test_exact_wins_over_pattern() {
        let resolver = PasswordResolver::new();
        resolver.register_pattern("**/*.xlsx", "pat").unwrap();
        resolver.register_exact("secret.xlsx", "exact");

        assert_eq!(resolver.resolve("secret.xlsx").as_deref(), Some("exact"));
        assert_eq!(resolver.resolve("public.xlsx").as_deref(), Some("pat"));
    }

    #[test]
    fn test_pattern_on_file_name() {
        let resolver = PasswordResolver::new();
        resolver.register_pattern("*.secret.docx", "p1").unwrap();

        assert_eq!(resolver.resolve("report.secret.docx").as_deref(), Some("p1"));
        assert_eq!(resolver.resolve("report.docx"), None);
    }

    #[test]
    fn test_first_registered_pattern_wins() {
        let resolver = PasswordResolver::new();
        resolver.register_pattern("/shared/**", "broad").unwrap();
        resolver.register_pattern("/shared/hr/*.docx", "narrow").unwrap();

        assert_eq!(resolver.resolve("/shared/hr/review.docx").as_deref(), Some("broad"));
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let resolver = PasswordResolver::new();
        assert!(resolver.register_pattern("/data/[x", "pw").is_err());
        assert_eq!(resolver.registration_counts().patterns, 0);
    }

    #[test]
    fn test_bulk_register_is_best_effort() {
        let resolver = PasswordResolver::new();
        let entries = vec![
            ("/a/one.pdf", "1"),
            ("/a/[broken", "2"),
            ("", "3"),
            ("/b/*.docx", "4"),
        ];

        assert_eq!(resolver.bulk_register(entries), 2);
        assert_eq!(resolver.resolve("/a/one.pdf").as_deref(), Some("1"));
        assert_eq!(resolver.resolve("/b/x.docx").as_deref(), Some("4"));
        assert_eq!(
            resolver.registration_counts(),
            RegistrationCounts { exact: 1, patterns: 1 }
        );
    }

    #[test]
    fn test_remove_and_clear() {
        let resolver = PasswordResolver::new();
        resolver.register_exact("/a.pdf", "x");
        resolver.register_pattern("*.pdf", "y").unwrap();

        assert!(resolver.remove_exact("/A.pdf"));
        assert_eq!(resolver.resolve("/a.pdf").as_deref(), Some("y"));

        resolver.clear();
        assert_eq!(resolver.resolve("/a.pdf"), None);
    }
}
