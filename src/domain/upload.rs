use super::errors::{DomainError, DomainResult};

pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "webp"];

/// Prefix of the annotated sibling of an uploaded file.
pub const DETECTED_PREFIX: &str = "detected_";

/// Lower-cased text after the last dot, if any.
pub fn extension_of(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    (!ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric())).then_some(ext)
}

/// Checks a client filename and returns its (lower-cased) extension.
pub fn validate_filename(name: &str) -> DomainResult<String> {
    if name.is_empty() {
        return Err(DomainError::InvalidInput("No file selected".into()));
    }
    match extension_of(name) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(ext),
        _ => Err(DomainError::InvalidInput(format!(
            "Invalid file type. Allowed types: {}",
            ALLOWED_EXTENSIONS.join(", ")
        ))),
    }
}
