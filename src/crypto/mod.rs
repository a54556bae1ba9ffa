//! Decryption gateways
//!
//! A gateway turns the raw bytes of a possibly encrypted document into the
//! plaintext bytes a parser can read. Each document family picks the gateway
//! matching its container format.

mod ooxml;
mod pdf;

use std::sync::Arc;

use crate::document::{DocumentResult, DocumentType};

pub use ooxml::OoxmlGateway;
pub use pdf::PdfGateway;

/// Plaintext access to possibly encrypted document bytes
pub trait DecryptionGateway: Send + Sync {
    /// Best-effort encryption probe; `false` when the bytes cannot be judged
    fn is_encrypted(&self, data: &[u8]) -> bool;

    /// Whether `password` opens the document (always true when unencrypted)
    fn verify_password(&self, data: &[u8], password: &str) -> bool;

    /// Return plaintext bytes
    ///
    /// Unencrypted input is returned unchanged. Encrypted input without a
    /// password, or with a wrong one, fails with `InvalidPassword`; a scheme
    /// the gateway does not understand fails with `UnsupportedEncryption`.
    fn decrypt(&self, data: Vec<u8>, password: Option<&str>) -> DocumentResult<Vec<u8>>;

    /// The format parser opens, probes and authenticates in a single pass
    ///
    /// Loaders then skip `is_encrypted` and `decrypt` and read encryption
    /// from the parser instead of opening the bytes again.
    fn authenticates_on_open(&self) -> bool {
        false
    }
}

/// Default gateway for a document family
pub fn gateway_for(document_type: DocumentType) -> Arc<dyn DecryptionGateway> {
    match document_type {
        DocumentType::Pdf => Arc::new(PdfGateway),
        DocumentType::Word | DocumentType::Excel | DocumentType::PowerPoint => {
            Arc::new(OoxmlGateway)
        }
    }
}
