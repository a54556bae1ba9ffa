//! Application state management

use std::sync::Arc;

use crate::config::{Config, PasswordConfig};
use crate::document::DocumentCache;
use crate::formats::LoaderRegistry;
use crate::password::{read_password_file, PasswordResolver};
use crate::service::DocumentService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    service: DocumentService,
}

impl AppState {
    /// Wire the resolver, registry, cache and service from configuration
    ///
    /// Password sources named in the configuration are applied here; a
    /// missing or malformed source is logged and skipped.
    pub fn new(config: Config) -> Self {
        let passwords = Arc::new(PasswordResolver::new());
        apply_password_sources(&passwords, &config.passwords);

        let registry = Arc::new(LoaderRegistry::with_default_loaders(passwords.clone()));
        let cache = Arc::new(DocumentCache::new(config.cache.clone()));
        let service = DocumentService::new(cache, registry, passwords, config.loader.load_timeout);

        Self {
            inner: Arc::new(AppStateInner { config, service }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the document service
    pub fn service(&self) -> &DocumentService {
        &self.inner.service
    }
}

fn apply_password_sources(passwords: &PasswordResolver, sources: &PasswordConfig) {
    if let Some(file) = &sources.password_file {
        match read_password_file(file) {
            Ok(entries) => {
                let total = entries.len();
                let registered = passwords.bulk_register(entries);
                tracing::info!(
                    "Registered {}/{} passwords from {}",
                    registered,
                    total,
                    file.display()
                );
            }
            Err(e) => tracing::warn!("Skipping password file: {}", e),
        }
    }

    if let Some(dir) = &sources.auto_detect_dir {
        passwords.auto_detect(dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_password_sources_applied() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("passwords.json");
        std::fs::write(&file, r#"{"/vault/a.pdf": "one", "/vault/*.xlsx": "two"}"#).unwrap();
        let sidecar_dir = dir.path().join("hr");
        std::fs::create_dir(&sidecar_dir).unwrap();
        std::fs::write(sidecar_dir.join(".docpassword"), "three").unwrap();

        let mut config = Config::default();
        config.passwords = PasswordConfig {
            auto_detect_dir: Some(dir.path().to_path_buf()),
            password_file: Some(file),
        };

        let state = AppState::new(config);
        let passwords = state.service().passwords();
        assert_eq!(passwords.resolve("/vault/a.pdf").as_deref(), Some("one"));
        assert_eq!(passwords.resolve("/vault/b.xlsx").as_deref(), Some("two"));
        assert_eq!(
            passwords.resolve(sidecar_dir.join("review.docx")).as_deref(),
            Some("three")
        );
    }

    #[test]
    fn test_missing_password_file_is_skipped() {
        let mut config = Config::default();
        config.passwords.password_file = Some("/no/such/passwords.json".into());

        let state = AppState::new(config);
        assert_eq!(state.service().passwords().registration_counts().exact, 0);
    }
}
