//! Document service
//!
//! Transport-agnostic entry points tying the loader registry, password
//! resolver and cache together. Every operation returns a structured serde
//! type; the HTTP layer only maps them to JSON.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::document::{
    analysis, CacheStatistics, DocumentAnalysis, DocumentCache, DocumentError,
    DocumentInfo, DocumentResult, DocumentSummary, DocumentType, LoadedDocument, SearchResults,
    DEFAULT_MAX_RESULTS,
};
use crate::formats::{Loader, LoaderRegistry};
use crate::password::{PasswordResolver, RegistrationCounts};

/// Default upper bound on a single load or info call
pub const DEFAULT_LOAD_TIMEOUT_SECS: u64 = 30;

/// Result of a load request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadOutcome {
    pub document: DocumentSummary,
    /// Served from the cache without parsing
    pub from_cache: bool,
    /// Retained in the cache after loading
    pub cached: bool,
}

/// One located unit of extracted text
#[derive(Debug, Clone, Serialize)]
pub struct ContentUnit {
    pub location: String,
    pub text: String,
}

/// Extracted document text
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedContent {
    pub file_path: String,
    pub document_type: DocumentType,
    pub unit_label: &'static str,
    pub unit_count: usize,
    pub text: String,
    pub units: Vec<ContentUnit>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnloadOutcome {
    pub file_path: String,
    pub memory_released_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearOutcome {
    pub documents_removed: usize,
    pub memory_released_bytes: u64,
}

/// Service-wide status snapshot
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub version: &'static str,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: i64,
    pub cache: CacheStatistics,
    pub supported_extensions: BTreeSet<String>,
    pub passwords: RegistrationCounts,
    pub load_timeout_secs: u64,
}

/// Loading, caching and querying documents
pub struct DocumentService {
    cache: Arc<DocumentCache>,
    registry: Arc<LoaderRegistry>,
    passwords: Arc<PasswordResolver>,
    load_timeout: Duration,
    started_at: DateTime<Utc>,
}

impl DocumentService {
    pub fn new(
        cache: Arc<DocumentCache>,
        registry: Arc<LoaderRegistry>,
        passwords: Arc<PasswordResolver>,
        load_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            registry,
            passwords,
            load_timeout,
            started_at: Utc::now(),
        }
    }

    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    pub fn passwords(&self) -> &PasswordResolver {
        &self.passwords
    }

    /// Load a document, serving it from the cache when already present
    ///
    /// A document that loads but cannot be retained (cache bounds) is still
    /// reported with `cached: false`.
    pub async fn load(&self, path: &str, password: Option<String>) -> DocumentResult<LoadOutcome> {
        if let Some(document) = self.cache.get(path) {
            debug!("Cache hit for {}", document.file_path);
            return Ok(LoadOutcome {
                document: document.summary(),
                from_cache: true,
                cached: true,
            });
        }

        let loader = self.loader_for(path)?;
        let path_owned = PathBuf::from(path);
        let document = self
            .run_blocking(move || loader.load(&path_owned, password.as_deref()))
            .await?;

        let summary = document.summary();
        let cached = self.cache.put(path, document);
        if !cached {
            warn!("Loaded {} but could not retain it in the cache", summary.file_path);
        }

        Ok(LoadOutcome {
            document: summary,
            from_cache: false,
            cached,
        })
    }

    /// Summaries of cached documents, most recently used first
    pub fn get_loaded_documents(&self) -> Vec<DocumentSummary> {
        self.cache.documents()
    }

    pub fn extract_content(&self, path: &str) -> DocumentResult<ExtractedContent> {
        let document = self.loaded(path)?;
        let loader = self
            .registry
            .resolve_by_type(document.document_type)
            .ok_or_else(|| {
                DocumentError::UnsupportedFormat(format!("no {} loader registered", document.document_type))
            })?;

        let text = loader.extract_text(&document)?;
        let units = analysis::segments(&document.content)
            .into_iter()
            .map(|segment| ContentUnit {
                location: segment.location,
                text: segment.text.to_string(),
            })
            .collect();

        Ok(ExtractedContent {
            file_path: document.file_path.clone(),
            document_type: document.document_type,
            unit_label: document.document_type.unit_label(),
            unit_count: document.content.unit_count(),
            text,
            units,
        })
    }

    pub fn search(
        &self,
        path: &str,
        term: &str,
        fuzzy: Option<bool>,
        max_results: Option<usize>,
    ) -> DocumentResult<SearchResults> {
        let document = self.loaded(path)?;
        Ok(analysis::search(
            &document.content,
            term,
            fuzzy.unwrap_or(false),
            max_results.unwrap_or(DEFAULT_MAX_RESULTS),
        ))
    }

    pub fn analyze(&self, path: &str) -> DocumentResult<DocumentAnalysis> {
        let document = self.loaded(path)?;
        Ok(analysis::analyze(&document.content))
    }

    /// Drop one document from the cache
    pub fn unload(&self, path: &str) -> DocumentResult<UnloadOutcome> {
        let document = self
            .cache
            .take(path)
            .ok_or_else(|| DocumentError::NotLoaded(path.to_string()))?;

        Ok(UnloadOutcome {
            file_path: document.file_path.clone(),
            memory_released_bytes: document.memory_size_bytes,
        })
    }

    pub fn clear_all(&self) -> ClearOutcome {
        let documents_removed = self.cache.len();
        let memory_released_bytes = self.cache.memory_usage();
        self.cache.clear();
        info!(
            "Cleared {} documents ({} bytes)",
            documents_removed, memory_released_bytes
        );

        ClearOutcome {
            documents_removed,
            memory_released_bytes,
        }
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            version: env!("CARGO_PKG_VERSION"),
            started_at: self.started_at,
            uptime_seconds: (Utc::now() - self.started_at).num_seconds(),
            cache: self.cache.statistics(),
            supported_extensions: self.registry.supported_extensions(),
            passwords: self.passwords.registration_counts(),
            load_timeout_secs: self.load_timeout.as_secs(),
        }
    }

    /// Read metadata without touching the cache
    pub async fn document_info(&self, path: &str, password: Option<String>) -> DocumentResult<DocumentInfo> {
        let loader = self.loader_for(path)?;
        let path_owned = PathBuf::from(path);
        self.run_blocking(move || loader.get_document_info(&path_owned, password.as_deref()))
            .await
    }

    fn loader_for(&self, path: &str) -> DocumentResult<Loader> {
        self.registry.resolve(path).cloned().ok_or_else(|| {
            DocumentError::UnsupportedFormat(format!("no loader accepts {}", path))
        })
    }

    fn loaded(&self, path: &str) -> DocumentResult<Arc<LoadedDocument>> {
        self.cache
            .get(path)
            .ok_or_else(|| DocumentError::NotLoaded(path.to_string()))
    }

    /// Run parsing on the blocking pool, bounded by the load timeout
    ///
    /// On timeout the blocking thread may keep running; the caller gets an
    /// answer regardless.
    async fn run_blocking<T, F>(&self, work: F) -> DocumentResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> DocumentResult<T> + Send + 'static,
    {
        match timeout(self.load_timeout, tokio::task::spawn_blocking(work)).await {
            Ok(join_result) => join_result
                .map_err(|e| DocumentError::TaskError(format!("Task join error: {}", e)))?,
            Err(_) => Err(DocumentError::Timeout(self.load_timeout.as_secs())),
        }
    }
}
