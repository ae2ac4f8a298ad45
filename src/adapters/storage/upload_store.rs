use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::application::ports::{StoredFile, UploadStorePort};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::upload::extension_of;

/// Upload directory on the local filesystem. Names are `<millis>_<sanitized>`
/// with a per-process monotonic clock, so concurrent requests never collide.
pub struct LocalUploadStore {
    dir: PathBuf,
    url_prefix: String,
    last_stamp: AtomicU64,
}

impl LocalUploadStore {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        let url_prefix = url_prefix.into();
        Self {
            dir: dir.into(),
            url_prefix: format!("/{}", url_prefix.trim_matches('/')),
            last_stamp: AtomicU64::new(0),
        }
    }

    /// Public URL prefix derived from a relative directory, e.g. `static/uploads`.
    pub fn url_prefix_for(dir: &Path) -> String {
        let s = dir.to_string_lossy().replace('\\', "/");
        s.trim_start_matches("./").trim_matches('/').to_string()
    }

    fn next_stamp(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        let prev = self
            .last_stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
            .unwrap_or_else(|last| last);
        now.max(prev + 1)
    }

    fn stored(&self, file_name: String) -> StoredFile {
        StoredFile {
            url: format!("{}/{}", self.url_prefix, file_name),
            file_name,
        }
    }

    async fn write(&self, file: &StoredFile, bytes: &[u8]) -> DomainResult<()> {
        let path = self.dir.join(&file.file_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| {
                DomainError::OperationFailed(format!("could not write {}: {e}", path.display()))
            })?;
        debug!("stored {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

#[async_trait]
impl UploadStorePort for LocalUploadStore {
    async fn persist(&self, original_name: &str, bytes: &[u8]) -> DomainResult<StoredFile> {
        let name = format!("{}_{}", self.next_stamp(), sanitize_filename(original_name));
        let file = self.stored(name);
        self.write(&file, bytes).await?;
        Ok(file)
    }

    async fn persist_derived(
        &self,
        source: &StoredFile,
        prefix: &str,
        bytes: &[u8],
    ) -> DomainResult<StoredFile> {
        let file = self.derived(source, prefix);
        self.write(&file, bytes).await?;
        Ok(file)
    }

    fn derived(&self, source: &StoredFile, prefix: &str) -> StoredFile {
        self.stored(format!("{prefix}{}", source.file_name))
    }

    async fn remove(&self, file: &StoredFile) -> DomainResult<()> {
        match tokio::fs::remove_file(self.dir.join(&file.file_name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::OperationFailed(format!(
                "could not remove {}: {e}",
                file.file_name
            ))),
        }
    }

    fn location(&self) -> String {
        self.dir.to_string_lossy().into_owned()
    }
}

/// Reduces a client-supplied filename to `[A-Za-z0-9._-]`, with no path
/// components. If the extension does not survive, the name becomes
/// `upload.<ext>` (or just `upload`).
pub fn sanitize_filename(name: &str) -> String {
    let flattened: String = name
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_').to_string();

    match extension_of(name) {
        Some(ext) if extension_of(&cleaned).as_deref() != Some(ext.as_str()) => {
            format!("upload.{ext}")
        }
        None if cleaned.is_empty() => "upload".to_string(),
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn sanitize_strips_paths_and_odd_characters() {
        assert_eq!(sanitize_filename("../../etc/passwd.png"), "etc_passwd.png");
        assert_eq!(sanitize_filename("my photo (1).JPG"), "my_photo_1.JPG");
        assert_eq!(sanitize_filename("C:\\Users\\me\\bottle.jpeg"), "C_Users_me_bottle.jpeg");
        assert_eq!(sanitize_filename("botella_ñ.png"), "botella_.png");
    }

    #[test]
    fn sanitize_falls_back_when_extension_is_lost() {
        assert_eq!(sanitize_filename("ñññ.png"), "upload.png");
        assert_eq!(sanitize_filename("..."), "upload");
    }

    #[test]
    fn stamps_never_repeat() {
        let store = LocalUploadStore::new("unused", "static/uploads");
        let stamps: HashSet<_> = (0..1000).map(|_| store.next_stamp()).collect();
        assert_eq!(stamps.len(), 1000);
    }

    #[tokio::test]
    async fn persist_derive_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalUploadStore::new(dir.path(), "/static/uploads/");

        let original = store.persist("can.png", b"abc").await.unwrap();
        assert!(original.file_name.ends_with("_can.png"));
        assert_eq!(original.url, format!("/static/uploads/{}", original.file_name));
        assert!(dir.path().join(&original.file_name).exists());

        let derived = store.persist_derived(&original, "detected_", b"xyz").await.unwrap();
        assert_eq!(derived.file_name, format!("detected_{}", original.file_name));
        assert_eq!(std::fs::read(dir.path().join(&derived.file_name)).unwrap(), b"xyz");

        store.remove(&derived).await.unwrap();
        store.remove(&original).await.unwrap();
        // already gone is fine
        store.remove(&original).await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn url_prefix_from_relative_dir() {
        let prefix = LocalUploadStore::url_prefix_for(Path::new("./static/uploads/"));
        assert_eq!(prefix, "static/uploads");
    }
}
