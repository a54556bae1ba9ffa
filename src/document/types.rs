//! Core document types
//!
//! Format-tagged document model shared by the loaders and the cache.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Document family handled by one loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Pdf,
    Word,
    Excel,
    PowerPoint,
}

impl DocumentType {
    /// Every supported type, in default registration order
    pub const ALL: [DocumentType; 4] = [
        DocumentType::Pdf,
        DocumentType::Word,
        DocumentType::Excel,
        DocumentType::PowerPoint,
    ];

    /// File extensions (lowercase, no dot) implied by this type
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Pdf => &["pdf"],
            Self::Word => &["docx", "docm", "dotx", "dotm"],
            Self::Excel => &["xlsx", "xlsm", "xltx", "xltm"],
            Self::PowerPoint => &["pptx", "pptm", "potx", "ppsx"],
        }
    }

    /// Detect type from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.extensions().contains(&ext.as_str()))
    }

    /// Detect type from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Stable lowercase label
    pub fn label(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Word => "word",
            Self::Excel => "excel",
            Self::PowerPoint => "powerpoint",
        }
    }

    /// Name of the unit a document of this type is divided into
    pub fn unit_label(self) -> &'static str {
        match self {
            Self::Pdf => "pages",
            Self::Word => "paragraphs",
            Self::Excel => "sheets",
            Self::PowerPoint => "slides",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Descriptive metadata read from the document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub description: Option<String>,
    /// Producing application
    pub application: Option<String>,
    pub last_modified_by: Option<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
    /// Page count as recorded by the producing application, if any
    pub page_count: Option<usize>,
}

/// Parsed PDF: one text string per page
#[derive(Debug, Clone, Default)]
pub struct PdfContent {
    pub pages: Vec<String>,
    pub metadata: DocumentMetadata,
}

/// Parsed Word document: body paragraphs in reading order
#[derive(Debug, Clone, Default)]
pub struct WordContent {
    pub paragraphs: Vec<String>,
    pub metadata: DocumentMetadata,
}

/// One non-empty worksheet cell
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// A1-style reference
    pub reference: String,
    pub value: String,
}

/// One worksheet row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    /// 1-based row number
    pub number: u32,
    pub cells: Vec<Cell>,
}

/// One worksheet
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).sum()
    }
}

/// Parsed workbook
#[derive(Debug, Clone, Default)]
pub struct WorkbookContent {
    pub sheets: Vec<Sheet>,
    pub metadata: DocumentMetadata,
}

impl WorkbookContent {
    pub fn cell_count(&self) -> usize {
        self.sheets.iter().map(Sheet::cell_count).sum()
    }
}

/// One slide's text paragraphs
#[derive(Debug, Clone, Default)]
pub struct Slide {
    /// 1-based position in the presentation
    pub number: usize,
    pub paragraphs: Vec<String>,
}

/// Parsed presentation
#[derive(Debug, Clone, Default)]
pub struct PresentationContent {
    pub slides: Vec<Slide>,
    pub metadata: DocumentMetadata,
}

/// Parsed document representation, tagged by format
///
/// This is the document handle owned by a cache entry. Consumers match on
/// it instead of downcasting.
#[derive(Debug, Clone)]
pub enum DocumentContent {
    Pdf(PdfContent),
    Word(WordContent),
    Excel(WorkbookContent),
    PowerPoint(PresentationContent),
}

impl DocumentContent {
    pub fn document_type(&self) -> DocumentType {
        match self {
            Self::Pdf(_) => DocumentType::Pdf,
            Self::Word(_) => DocumentType::Word,
            Self::Excel(_) => DocumentType::Excel,
            Self::PowerPoint(_) => DocumentType::PowerPoint,
        }
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        match self {
            Self::Pdf(c) => &c.metadata,
            Self::Word(c) => &c.metadata,
            Self::Excel(c) => &c.metadata,
            Self::PowerPoint(c) => &c.metadata,
        }
    }

    /// Number of pages / paragraphs / sheets / slides
    pub fn unit_count(&self) -> usize {
        match self {
            Self::Pdf(c) => c.pages.len(),
            Self::Word(c) => c.paragraphs.len(),
            Self::Excel(c) => c.sheets.len(),
            Self::PowerPoint(c) => c.slides.len(),
        }
    }

    /// Flatten to plain text: pages and slides separated by blank lines,
    /// worksheet cells by tabs
    pub fn plain_text(&self) -> String {
        match self {
            DocumentContent::Pdf(c) => c
                .pages
                .iter()
                .map(|page| page.trim_end())
                .collect::<Vec<_>>()
                .join("\n\n"),
            DocumentContent::Word(c) => c.paragraphs.join("\n"),
            DocumentContent::Excel(c) => c
                .sheets
                .iter()
                .map(|sheet| {
                    let rows: Vec<String> = sheet
                        .rows
                        .iter()
                        .map(|row| {
                            row.cells
                                .iter()
                                .map(|cell| cell.value.as_str())
                                .collect::<Vec<_>>()
                                .join("\t")
                        })
                        .collect();
                    format!("[{}]\n{}", sheet.name, rows.join("\n"))
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
            DocumentContent::PowerPoint(c) => c
                .slides
                .iter()
                .map(|slide| format!("[Slide {}]\n{}", slide.number, slide.paragraphs.join("\n")))
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }
}

/// A parsed document held by the cache
///
/// Access bookkeeping uses interior mutability so that readers holding an
/// `Arc<LoadedDocument>` can be served while `get` updates it.
#[derive(Debug)]
pub struct LoadedDocument {
    /// Normalized (absolute, lowercase) path key
    pub file_path: String,
    pub document_type: DocumentType,
    pub loaded_at: DateTime<Utc>,
    pub content: DocumentContent,
    /// Estimated resident size
    pub memory_size_bytes: u64,
    /// Size of the file on disk
    pub file_size_bytes: u64,
    pub was_password_protected: bool,
    access_count: AtomicU64,
    last_accessed_at: RwLock<DateTime<Utc>>,
}

impl LoadedDocument {
    pub fn new(
        file_path: impl Into<String>,
        content: DocumentContent,
        memory_size_bytes: u64,
        file_size_bytes: u64,
        was_password_protected: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            file_path: file_path.into(),
            document_type: content.document_type(),
            loaded_at: now,
            content,
            memory_size_bytes,
            file_size_bytes,
            was_password_protected,
            access_count: AtomicU64::new(0),
            last_accessed_at: RwLock::new(now),
        }
    }

    pub fn access_count(&self) -> u64 {
        self.access_count.load(Ordering::Relaxed)
    }

    pub fn last_accessed_at(&self) -> DateTime<Utc> {
        *self.last_accessed_at.read()
    }

    pub(crate) fn record_access(&self) {
        self.access_count.fetch_add(1, Ordering::Relaxed);
        *self.last_accessed_at.write() = Utc::now();
    }

    pub(crate) fn reset_access(&self) {
        self.access_count.store(0, Ordering::Relaxed);
        *self.last_accessed_at.write() = Utc::now();
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            file_path: self.file_path.clone(),
            document_type: self.document_type,
            title: self.content.metadata().title.clone(),
            unit_count: self.content.unit_count(),
            unit_label: self.document_type.unit_label(),
            memory_size_bytes: self.memory_size_bytes,
            file_size_bytes: self.file_size_bytes,
            was_password_protected: self.was_password_protected,
            loaded_at: self.loaded_at,
            last_accessed_at: self.last_accessed_at(),
            access_count: self.access_count(),
        }
    }
}

/// Listing view of a cached document
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub file_path: String,
    pub document_type: DocumentType,
    pub title: Option<String>,
    pub unit_count: usize,
    pub unit_label: &'static str,
    pub memory_size_bytes: u64,
    pub file_size_bytes: u64,
    pub was_password_protected: bool,
    pub loaded_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub access_count: u64,
}

/// Metadata read without caching the document
///
/// `error` is set when only the file-level fields could be determined.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub file_path: String,
    pub document_type: DocumentType,
    pub file_size_bytes: u64,
    pub is_encrypted: bool,
    #[serde(flatten)]
    pub metadata: DocumentMetadata,
    pub unit_count: Option<usize>,
    pub unit_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentInfo {
    pub fn partial(
        file_path: impl Into<String>,
        document_type: DocumentType,
        file_size_bytes: u64,
        is_encrypted: bool,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            document_type,
            file_size_bytes,
            is_encrypted,
            metadata: DocumentMetadata::default(),
            unit_count: None,
            unit_label: document_type.unit_label(),
            error: None,
        }
    }
}

/// Point-in-time cache statistics, computed on demand
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatistics {
    pub document_count: usize,
    pub memory_usage_bytes: u64,
    pub max_documents: usize,
    pub max_memory_bytes: u64,
    /// Documents per type label
    pub documents_by_type: BTreeMap<String, usize>,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub memory_utilization_percent: f64,
}
