//! Format loaders
//!
//! A [`Loader`] turns one family of files into a [`LoadedDocument`]. The set
//! of families is closed (see [`DocumentType`]), so dispatch is a `match` on
//! the declared type rather than a trait object per format.
//!
//! # Load pipeline
//!
//! ```text
//! path ──► exists? ──► read bytes ──► password (caller, else resolver)
//!                                          │
//!                                          ▼
//!            LoadedDocument ◄── estimate ◄── parse ◄── DecryptionGateway
//! ```
//!
//! Loading is blocking work; async callers run it on the blocking pool.

mod excel;
mod ooxml;
mod pdf;
mod powerpoint;
mod registry;
mod word;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::crypto::{gateway_for, DecryptionGateway};
use crate::document::{
    normalize_key, DocumentContent, DocumentError, DocumentInfo, DocumentResult, DocumentType,
    LoadedDocument,
};
use crate::password::PasswordResolver;

pub use registry::LoaderRegistry;

const KIB: u64 = 1024;

/// Loader for one document family
#[derive(Clone)]
pub struct Loader {
    document_type: DocumentType,
    passwords: Arc<PasswordResolver>,
    gateway: Arc<dyn DecryptionGateway>,
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("document_type", &self.document_type)
            .finish_non_exhaustive()
    }
}

impl Loader {
    /// Loader using the default gateway for its family
    pub fn new(document_type: DocumentType, passwords: Arc<PasswordResolver>) -> Self {
        Self::with_gateway(document_type, passwords, gateway_for(document_type))
    }

    pub fn with_gateway(
        document_type: DocumentType,
        passwords: Arc<PasswordResolver>,
        gateway: Arc<dyn DecryptionGateway>,
    ) -> Self {
        Self {
            document_type,
            passwords,
            gateway,
        }
    }

    pub fn supported_type(&self) -> DocumentType {
        self.document_type
    }

    /// Extension allow-list check
    pub fn can_load(&self, path: impl AsRef<Path>) -> bool {
        DocumentType::from_path(path.as_ref()) == Some(self.document_type)
    }

    /// Load and parse a document
    ///
    /// A password passed here is the caller's; when absent, the resolver is
    /// consulted for encrypted files. Supplying a password for a file that is
    /// not encrypted is a caller error (`NotEncrypted`).
    pub fn load(&self, path: impl AsRef<Path>, password: Option<&str>) -> DocumentResult<LoadedDocument> {
        let path = path.as_ref();
        let file_size = self.check_file(path)?;
        if !self.can_load(path) {
            return Err(DocumentError::UnsupportedFormat(format!(
                "{} is not a {} document",
                path.display(),
                self.document_type
            )));
        }

        let data = fs::read(path)?;

        let (content, encrypted) = match self.document_type {
            DocumentType::Pdf if self.gateway.authenticates_on_open() => {
                let (content, encrypted) = pdf::load(&data, |encrypted| {
                    self.choose_password(path, password, encrypted)
                })?;
                (DocumentContent::Pdf(content), encrypted)
            }
            _ => {
                let encrypted = self.gateway.is_encrypted(&data);
                let password = self.choose_password(path, password, encrypted)?;
                let plaintext = self.gateway.decrypt(data, password.as_deref())?;
                (self.parse(plaintext, password.as_deref())?, encrypted)
            }
        };

        let memory_size = estimate_memory(&content, file_size);

        info!(
            "Loaded {} document {} ({} {}, ~{} bytes)",
            self.document_type,
            path.display(),
            content.unit_count(),
            self.document_type.unit_label(),
            memory_size
        );

        Ok(LoadedDocument::new(
            normalize_key(path),
            content,
            memory_size,
            file_size,
            encrypted,
        ))
    }

    /// Caller password, else the resolver's for encrypted files
    fn choose_password(
        &self,
        path: &Path,
        explicit: Option<&str>,
        encrypted: bool,
    ) -> DocumentResult<Option<String>> {
        let password = match explicit {
            Some(_) if !encrypted => {
                return Err(DocumentError::NotEncrypted(path.display().to_string()));
            }
            Some(explicit) => Some(explicit.to_string()),
            None if encrypted => self.passwords.resolve(path),
            None => None,
        };

        if encrypted {
            debug!(
                "{} is encrypted, password {}",
                path.display(),
                if password.is_some() { "available" } else { "missing" }
            );
        }
        Ok(password)
    }

    /// Plain text of a document this loader understands
    pub fn extract_text(&self, document: &LoadedDocument) -> DocumentResult<String> {
        let found = document.content.document_type();
        if found != self.document_type {
            return Err(DocumentError::HandleMismatch {
                expected: self.document_type,
                found,
            });
        }
        Ok(document.content.plain_text())
    }

    /// Read metadata without caching the document
    ///
    /// Once the file is known to exist this does not fail: when the content
    /// cannot be opened the file-level fields are returned with `error` set.
    pub fn get_document_info(
        &self,
        path: impl AsRef<Path>,
        password: Option<&str>,
    ) -> DocumentResult<DocumentInfo> {
        let path = path.as_ref();
        let file_size = self.check_file(path)?;
        let data = fs::read(path)?;
        let encrypted = self.gateway.is_encrypted(&data);

        let mut info = DocumentInfo::partial(
            normalize_key(path),
            self.document_type,
            file_size,
            encrypted,
        );

        let password = match password {
            Some(explicit) => Some(explicit.to_string()),
            None => self.passwords.resolve(path),
        };
        let password = password.filter(|_| encrypted);

        let plaintext = if self.gateway.authenticates_on_open() {
            Ok(data)
        } else {
            self.gateway.decrypt(data, password.as_deref())
        };
        let parsed = plaintext.and_then(|plaintext| self.parse(plaintext, password.as_deref()));

        match parsed {
            Ok(content) => {
                info.unit_count = Some(content.unit_count());
                info.metadata = content.metadata().clone();
            }
            Err(e) => {
                warn!("Returning partial info for {}: {}", path.display(), e);
                info.error = Some(e.to_string());
            }
        }

        Ok(info)
    }

    fn check_file(&self, path: &Path) -> DocumentResult<u64> {
        match fs::metadata(path) {
            Ok(meta) if meta.is_file() => Ok(meta.len()),
            Ok(_) => Err(DocumentError::FileNotFound(format!(
                "{} is not a regular file",
                path.display()
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(DocumentError::FileNotFound(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn parse(&self, plaintext: Vec<u8>, password: Option<&str>) -> DocumentResult<DocumentContent> {
        let content = match self.document_type {
            DocumentType::Pdf => DocumentContent::Pdf(pdf::parse(&plaintext, password)?),
            DocumentType::Word => DocumentContent::Word(word::parse(plaintext)?),
            DocumentType::Excel => DocumentContent::Excel(excel::parse(plaintext)?),
            DocumentType::PowerPoint => DocumentContent::PowerPoint(powerpoint::parse(plaintext)?),
        };
        Ok(content)
    }
}

/// Estimated resident size of parsed content
///
/// Heuristic per family: file size times an expansion factor plus a
/// per-unit overhead.
pub fn estimate_memory(content: &DocumentContent, file_size: u64) -> u64 {
    match content {
        DocumentContent::Pdf(c) => file_size * 3 + c.pages.len() as u64 * 64 * KIB,
        DocumentContent::Word(c) => {
            let text_len: usize = c.paragraphs.iter().map(String::len).sum();
            file_size * 4 + text_len as u64 * 2
        }
        DocumentContent::Excel(c) => {
            file_size * 6 + c.sheets.len() as u64 * 4 * KIB + c.cell_count() as u64 * 64
        }
        DocumentContent::PowerPoint(c) => file_size * 3 + c.slides.len() as u64 * 32 * KIB,
    }
}
