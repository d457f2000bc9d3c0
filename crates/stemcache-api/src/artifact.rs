//! Transient upload handling.
//!
//! An uploaded artifact is streamed from the multipart body into a file in
//! the upload directory and owned by a [`TransientArtifact`]. Dropping the
//! guard removes the file, so cleanup happens on success, on error, and when
//! the request future is cancelled.

use std::path::{Path, PathBuf};

use axum::extract::multipart::{Field, Multipart};
use tokio::io::AsyncWriteExt;

use crate::error::SubmissionError;

/// Name of the multipart field carrying the artifact.
pub const ARTIFACT_FIELD: &str = "file";

/// Source name used when the upload has no filename.
pub const DEFAULT_SOURCE_NAME: &str = "upload";

/// An artifact on local disk, removed when dropped.
#[derive(Debug)]
pub struct TransientArtifact {
    path: PathBuf,
    source_name: String,
}

impl TransientArtifact {
    /// Create an empty, uniquely named file in `dir`.
    pub fn create_in(
        dir: &Path,
        source_name: impl Into<String>,
    ) -> std::io::Result<(Self, std::fs::File)> {
        let (file, path) = tempfile::Builder::new()
            .prefix("stemcache-")
            .tempfile_in(dir)?
            .keep()
            .map_err(|e| e.error)?;
        let guard = Self {
            path,
            source_name: source_name.into(),
        };
        Ok((guard, file))
    }

    /// Read the multipart body up to the artifact field and spool it to `dir`.
    ///
    /// Fields before and after the artifact are ignored.
    pub async fn receive(multipart: &mut Multipart, dir: &Path) -> Result<Self, SubmissionError> {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| SubmissionError::Upload(e.body_text()))?
        {
            if field.name() == Some(ARTIFACT_FIELD) {
                return Self::spool(field, dir).await;
            }
        }
        Err(SubmissionError::MissingArtifact)
    }

    async fn spool(mut field: Field<'_>, dir: &Path) -> Result<Self, SubmissionError> {
        let source_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_SOURCE_NAME)
            .to_string();

        let (guard, file) = Self::create_in(dir, source_name).map_err(SubmissionError::Spool)?;
        let mut file = tokio::fs::File::from_std(file);

        let mut written: u64 = 0;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| SubmissionError::Upload(e.body_text()))?
        {
            file.write_all(&chunk).await.map_err(SubmissionError::Spool)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(SubmissionError::Spool)?;

        tracing::debug!(
            path = %guard.path.display(),
            source_name = %guard.source_name,
            bytes = written,
            "artifact received"
        );
        Ok(guard)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Client-supplied filename, or [`DEFAULT_SOURCE_NAME`].
    pub fn source_name(&self) -> &str {
        &self.source_name
    }
}

impl Drop for TransientArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "failed to remove transient artifact: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let (guard, mut file) = TransientArtifact::create_in(dir.path(), "a.wav").unwrap();
        file.write_all(b"data").unwrap();
        let path = guard.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(guard.source_name(), "a.wav");

        drop(guard);
        assert!(!path.exists());
    }

    #[test]
    fn drop_after_external_removal_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let (guard, _file) = TransientArtifact::create_in(dir.path(), "a.wav").unwrap();
        std::fs::remove_file(guard.path()).unwrap();
        drop(guard);
    }

    #[test]
    fn files_are_created_inside_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        let (a, _) = TransientArtifact::create_in(dir.path(), "x").unwrap();
        let (b, _) = TransientArtifact::create_in(dir.path(), "x").unwrap();
        assert_ne!(a.path(), b.path());
        assert_eq!(a.path().parent(), Some(dir.path()));
    }

    #[test]
    fn missing_upload_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(TransientArtifact::create_in(&missing, "x").is_err());
    }
}
