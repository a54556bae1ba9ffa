//! OOXML decryption
//!
//! Password-protected Word, Excel and PowerPoint files are not ZIP packages:
//! they are Compound File Binary containers holding an `EncryptionInfo`
//! stream and an `EncryptedPackage` stream with the real package inside.

use tracing::debug;

use super::DecryptionGateway;
use crate::document::{DocumentError, DocumentResult};

const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const ZIP_SIGNATURE: [u8; 4] = *b"PK\x03\x04";
const ENCRYPTED_PACKAGE_STREAM: &str = "EncryptedPackage";

/// Agile / Standard encryption for OOXML packages, via `office-crypto`
#[derive(Debug, Clone, Copy, Default)]
pub struct OoxmlGateway;

impl OoxmlGateway {
    fn is_cfb(data: &[u8]) -> bool {
        data.starts_with(&CFB_SIGNATURE)
    }

    fn is_zip(data: &[u8]) -> bool {
        data.starts_with(&ZIP_SIGNATURE)
    }

    /// Directory entry names in a CFB container are stored as UTF-16LE
    fn has_encrypted_package(data: &[u8]) -> bool {
        let needle: Vec<u8> = ENCRYPTED_PACKAGE_STREAM
            .encode_utf16()
            .flat_map(u16::to_le_bytes)
            .collect();
        data.windows(needle.len()).any(|window| window == needle.as_slice())
    }
}

impl DecryptionGateway for OoxmlGateway {
    fn is_encrypted(&self, data: &[u8]) -> bool {
        Self::is_cfb(data) && Self::has_encrypted_package(data)
    }

    fn verify_password(&self, data: &[u8], password: &str) -> bool {
        if !self.is_encrypted(data) {
            return true;
        }
        self.decrypt(data.to_vec(), Some(password)).is_ok()
    }

    fn decrypt(&self, data: Vec<u8>, password: Option<&str>) -> DocumentResult<Vec<u8>> {
        if !self.is_encrypted(&data) {
            if Self::is_cfb(&data) {
                return Err(DocumentError::UnsupportedFormat(
                    "legacy binary Office document (only OOXML packages are supported)".into(),
                ));
            }
            return Ok(data);
        }

        let password = password.ok_or_else(|| {
            DocumentError::InvalidPassword("document is encrypted and no password was given".into())
        })?;

        let plaintext = office_crypto::decrypt_from_bytes(data, password).map_err(|e| {
            let detail = format!("{:?}", e);
            let lowered = detail.to_lowercase();
            if lowered.contains("unimplemented") || lowered.contains("unsupported") {
                DocumentError::UnsupportedEncryption(detail)
            } else {
                DocumentError::InvalidPassword("password does not open the document".into())
            }
        })?;

        if !Self::is_zip(&plaintext) {
            return Err(DocumentError::InvalidPassword(
                "password does not open the document".into(),
            ));
        }

        debug!("Decrypted OOXML package ({} bytes)", plaintext.len());
        Ok(plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_cfb(with_package: bool) -> Vec<u8> {
        let mut data = CFB_SIGNATURE.to_vec();
        data.extend_from_slice(&[0u8; 504]);
        let name = if with_package { "EncryptedPackage" } else { "WordDocument" };
        data.extend(name.encode_utf16().flat_map(u16::to_le_bytes));
        data.extend_from_slice(&[0u8; 64]);
        data
    }

    #[test]
    fn test_detects_encrypted_container() {
        let gateway = OoxmlGateway;
        assert!(gateway.is_encrypted(&fake_cfb(true)));
        assert!(!gateway.is_encrypted(&fake_cfb(false)));
        assert!(!gateway.is_encrypted(b"PK\x03\x04rest-of-zip"));
        assert!(!gateway.is_encrypted(b""));
    }

    #[test]
    fn test_plain_package_passes_through() {
        let gateway = OoxmlGateway;
        let data = b"PK\x03\x04payload".to_vec();
        assert_eq!(gateway.decrypt(data.clone(), None).unwrap(), data);
        assert!(gateway.verify_password(&data, "anything"));
    }

    #[test]
    fn test_missing_password_is_invalid_password() {
        let gateway = OoxmlGateway;
        let err = gateway.decrypt(fake_cfb(true), None).unwrap_err();
        assert!(matches!(err, DocumentError::InvalidPassword(_)));
    }

    #[test]
    fn test_legacy_binary_is_unsupported() {
        let gateway = OoxmlGateway;
        let err = gateway.decrypt(fake_cfb(false), None).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedFormat(_)));
    }
}
