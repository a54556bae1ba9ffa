//! PDF decryption via the standard security handler

use mupdf::Document;
use tracing::debug;

use super::DecryptionGateway;
use crate::document::{DocumentError, DocumentResult};

const PDF_MIME: &str = "application/pdf";

/// Password handling for PDFs
///
/// MuPDF decrypts streams on the fly once a document is authenticated, so
/// `decrypt` only validates the password and returns the original bytes.
/// The PDF loader skips it and authenticates the document it parses.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfGateway;

impl PdfGateway {
    /// Open a document without authenticating it
    pub fn open(data: &[u8]) -> DocumentResult<Document> {
        Document::from_bytes(data, PDF_MIME).map_err(classify_open_error)
    }

    /// Authenticate an opened document if it needs a password
    pub fn authenticate(doc: &mut Document, password: Option<&str>) -> DocumentResult<()> {
        if !doc.needs_password()? {
            return Ok(());
        }

        let password = password.ok_or_else(|| {
            DocumentError::InvalidPassword("PDF is encrypted and no password was given".into())
        })?;
        if !doc.authenticate(password)? {
            return Err(DocumentError::InvalidPassword(
                "password does not open the PDF".into(),
            ));
        }
        debug!("Authenticated encrypted PDF");
        Ok(())
    }

    /// Open a document and authenticate it if it needs a password
    pub fn open_authenticated(data: &[u8], password: Option<&str>) -> DocumentResult<Document> {
        let mut doc = Self::open(data)?;
        Self::authenticate(&mut doc, password)?;
        Ok(doc)
    }
}

fn classify_open_error(err: mupdf::Error) -> DocumentError {
    let message = err.to_string();
    let lowered = message.to_lowercase();
    if lowered.contains("security handler") || lowered.contains("encrypt") {
        DocumentError::UnsupportedEncryption(message)
    } else {
        DocumentError::ParseFailure(message)
    }
}

impl DecryptionGateway for PdfGateway {
    fn is_encrypted(&self, data: &[u8]) -> bool {
        Document::from_bytes(data, PDF_MIME)
            .and_then(|doc| doc.needs_password())
            .unwrap_or(false)
    }

    fn verify_password(&self, data: &[u8], password: &str) -> bool {
        Self::open_authenticated(data, Some(password)).is_ok()
    }

    fn decrypt(&self, data: Vec<u8>, password: Option<&str>) -> DocumentResult<Vec<u8>> {
        Self::open_authenticated(&data, password)?;
        Ok(data)
    }

    fn authenticates_on_open(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_not_encrypted() {
        let gateway = PdfGateway;
        assert!(!gateway.is_encrypted(b"not a pdf at all"));
    }

    #[test]
    fn test_garbage_fails_to_decrypt() {
        let gateway = PdfGateway;
        assert!(gateway.decrypt(b"not a pdf at all".to_vec(), None).is_err());
    }
}
