//! Loader dispatch

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use super::Loader;
use crate::document::DocumentType;
use crate::password::PasswordResolver;

/// Ordered set of loaders
///
/// Registration order is dispatch order: when several loaders accept the
/// same path, the first one registered wins.
#[derive(Debug, Default)]
pub struct LoaderRegistry {
    loaders: Vec<Loader>,
}

impl LoaderRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in loaders: Pdf, Word, Excel, PowerPoint
    pub fn with_default_loaders(passwords: Arc<PasswordResolver>) -> Self {
        let mut registry = Self::new();
        for document_type in DocumentType::ALL {
            registry.register(Loader::new(document_type, passwords.clone()));
        }
        registry
    }

    pub fn register(&mut self, loader: Loader) {
        debug!("Registered {} loader", loader.supported_type());
        self.loaders.push(loader);
    }

    /// First loader accepting the path, `None` for unsupported formats
    pub fn resolve(&self, path: impl AsRef<Path>) -> Option<&Loader> {
        let path = path.as_ref();
        self.loaders.iter().find(|loader| loader.can_load(path))
    }

    /// First loader declaring the given type
    pub fn resolve_by_type(&self, document_type: DocumentType) -> Option<&Loader> {
        self.loaders
            .iter()
            .find(|loader| loader.supported_type() == document_type)
    }

    /// Extensions accepted by any registered loader
    pub fn supported_extensions(&self) -> BTreeSet<String> {
        self.loaders
            .iter()
            .flat_map(|loader| loader.supported_type().extensions())
            .map(|ext| ext.to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::OoxmlGateway;

    #[test]
    fn test_default_loaders() {
        let registry = LoaderRegistry::with_default_loaders(Arc::new(PasswordResolver::new()));

        assert_eq!(registry.len(), 4);
        assert_eq!(
            registry.resolve("/docs/a.pdf").map(Loader::supported_type),
            Some(DocumentType::Pdf)
        );
        assert_eq!(
            registry.resolve("/docs/a.XLSM").map(Loader::supported_type),
            Some(DocumentType::Excel)
        );
        assert_eq!(
            registry.resolve("/docs/deck.ppsx").map(Loader::supported_type),
            Some(DocumentType::PowerPoint)
        );
        assert!(registry.resolve("/docs/a.txt").is_none());
        assert!(registry.resolve("/docs/no_extension").is_none());
    }

    #[test]
    fn test_resolve_by_type() {
        let registry = LoaderRegistry::with_default_loaders(Arc::new(PasswordResolver::new()));
        for document_type in DocumentType::ALL {
            assert_eq!(
                registry.resolve_by_type(document_type).map(Loader::supported_type),
                Some(document_type)
            );
        }
        assert!(LoaderRegistry::new().resolve_by_type(DocumentType::Pdf).is_none());
    }

    #[test]
    fn test_supported_extensions() {
        let registry = LoaderRegistry::with_default_loaders(Arc::new(PasswordResolver::new()));
        let extensions = registry.supported_extensions();

        assert_eq!(extensions.len(), 13);
        assert!(extensions.contains("pdf"));
        assert!(extensions.contains("potx"));
        assert!(LoaderRegistry::new().supported_extensions().is_empty());
    }

    #[test]
    fn test_first_registered_wins() {
        let passwords = Arc::new(PasswordResolver::new());
        let mut registry = LoaderRegistry::new();
        registry.register(Loader::with_gateway(
            DocumentType::Word,
            passwords.clone(),
            Arc::new(OoxmlGateway),
        ));
        registry.register(Loader::new(DocumentType::Word, passwords));

        assert_eq!(registry.len(), 2);
        let first = registry.resolve("a.docx").unwrap() as *const Loader;
        assert_eq!(first, &registry.loaders[0] as *const Loader);
    }
}
