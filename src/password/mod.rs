//! Password registrations for protected documents
//!
//! [`PasswordResolver`] is the single owner of exact-path and pattern
//! registrations. Loaders consult it when a caller does not supply a
//! password.

mod detect;
mod glob;
mod resolver;

use std::collections::HashMap;
use std::path::Path;

pub use detect::{sidecar_password, SIDECAR_FILE_NAMES};
pub use glob::{escape as escape_glob, is_glob, GlobPattern, PatternError};
pub use resolver::{PasswordResolver, RegistrationCounts};

/// Read a JSON object of `path or glob -> password` for bulk registration
pub fn read_password_file(path: impl AsRef<Path>) -> anyhow::Result<HashMap<String, String>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
    let entries: HashMap<String, String> = serde_json::from_str(&text)
        .map_err(|e| anyhow::anyhow!("invalid password file {}: {}", path.display(), e))?;
    Ok(entries)
}
