//! Document model and cache
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    DocumentCache                        │
//! │   (DashMap entries + access ranks, dual-bound LRU)      │
//! └─────────────────────────────────────────────────────────┘
//!                            │ Arc<LoadedDocument>
//!                            ▼
//!   ┌─────────────────────────────────────────────────────┐
//!   │ LoadedDocument { content: DocumentContent, ... }    │
//!   │   Pdf | Word | Excel | PowerPoint                   │
//!   └─────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//!   ┌─────────────────────────────────────────────────────┐
//!   │              analysis (search, stats)               │
//!   └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use docvault_server::document::{CacheConfig, DocumentCache};
//!
//! let cache = DocumentCache::new(CacheConfig::default());
//! cache.put("/docs/report.docx", loaded);
//!
//! if let Some(doc) = cache.get("/DOCS/Report.docx") {
//!     println!("{} {}", doc.content.unit_count(), doc.document_type.unit_label());
//! }
//! ```

pub mod analysis;
mod cache;
mod error;
mod path;
mod types;

pub use analysis::{DocumentAnalysis, SearchMatch, SearchResults, DEFAULT_MAX_RESULTS};
pub use cache::{CacheConfig, DocumentCache, DEFAULT_MAX_DOCUMENTS, DEFAULT_MAX_MEMORY_BYTES};
pub use error::{DocumentError, DocumentResult, Result};
pub use path::normalize_key;
pub use types::{
    CacheStatistics, Cell, DocumentContent, DocumentInfo, DocumentMetadata, DocumentSummary,
    DocumentType, LoadedDocument, PdfContent, PresentationContent, Row, Sheet, Slide, WordContent,
    WorkbookContent,
};
