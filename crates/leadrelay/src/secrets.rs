//! Secrets given either inline (`EMAIL_PASS=...`) or as a mounted file
//! (`EMAIL_PASS_FILE=/run/secrets/email_pass`).

use secrecy::SecretString;
use std::fs;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source provided (need a direct value or a file path)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Secret file '{path}' is empty")]
    EmptyFile { path: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// Returns the inline value if it is non-blank, otherwise the trimmed
/// contents of `file_path`.
///
/// # Examples
///
/// ```
/// use leadrelay::secrets::resolve_secret;
/// use secrecy::ExposeSecret;
///
/// let secret = resolve_secret(Some("my-password"), Some("/run/secrets/password")).unwrap();
/// assert_eq!(secret.expose_secret(), "my-password");
/// ```
pub fn resolve_secret(direct: Option<&str>, file_path: Option<&str>) -> Result<SecretString> {
    if let Some(value) = direct {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Ok(SecretString::from(trimmed));
        }
    }

    if let Some(path) = file_path {
        if !path.is_empty() {
            let content = fs::read_to_string(path).map_err(|e| SecretError::FileReadError {
                path: path.to_string(),
                source: e,
            })?;
            let trimmed = content.trim();
            if trimmed.is_empty() {
                return Err(SecretError::EmptyFile {
                    path: path.to_string(),
                });
            }
            return Ok(SecretString::from(trimmed));
        }
    }

    Err(SecretError::NoSourceProvided)
}
