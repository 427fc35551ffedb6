//! Local-filesystem image storage for question illustrations.
//!
//! Files land under the configured upload directory with a fresh UUID
//! name, keeping only the original extension. Serving and deletion go
//! through [`UploadService::resolve`] so a crafted filename can never
//! escape the directory.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::core::config::Settings;

#[derive(Debug, thiserror::Error)]
pub(crate) enum UploadError {
    #[error("file has no extension")]
    MissingExtension,
    #[error("extension {0:?} is not allowed")]
    DisallowedExtension(String),
    #[error("file exceeds the {0} MB limit")]
    TooLarge(u64),
    #[error("invalid filename")]
    InvalidFilename,
    #[error("file not found")]
    NotFound,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Clone)]
pub(crate) struct UploadService {
    root: PathBuf,
    allowed_extensions: Vec<String>,
    max_bytes: u64,
    max_mb: u64,
}

pub(crate) struct StoredImage {
    pub filename: String,
    /// URL path the API hands back for embedding in questions.
    pub url: String,
}

impl UploadService {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self, UploadError> {
        let storage = settings.storage();
        let root = PathBuf::from(&storage.upload_dir);
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            allowed_extensions: storage.allowed_image_extensions.clone(),
            max_bytes: storage.max_upload_size_mb * 1024 * 1024,
            max_mb: storage.max_upload_size_mb,
        })
    }

    #[cfg(test)]
    pub(crate) fn for_tests(root: PathBuf) -> Self {
        std::fs::create_dir_all(&root).expect("create upload dir");
        Self {
            root,
            allowed_extensions: vec!["jpg".to_string(), "png".to_string()],
            max_bytes: 5 * 1024 * 1024,
            max_mb: 5,
        }
    }

    /// Validates and persists an uploaded image, returning its generated
    /// filename and the public URL path.
    pub(crate) async fn save(
        &self,
        original_filename: &str,
        bytes: &[u8],
    ) -> Result<StoredImage, UploadError> {
        let extension = Path::new(original_filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .ok_or(UploadError::MissingExtension)?;
        if !self.allowed_extensions.contains(&extension) {
            return Err(UploadError::DisallowedExtension(extension));
        }
        if bytes.len() as u64 > self.max_bytes {
            return Err(UploadError::TooLarge(self.max_mb));
        }

        let filename = format!("{}.{extension}", Uuid::new_v4());
        tokio::fs::write(self.root.join(&filename), bytes).await?;

        let url = format!("/uploads/{filename}");
        Ok(StoredImage { filename, url })
    }

    pub(crate) async fn read(&self, filename: &str) -> Result<Vec<u8>, UploadError> {
        let path = self.resolve(filename)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(UploadError::NotFound),
            Err(err) => Err(err.into()),
        }
    }

    pub(crate) async fn delete(&self, filename: &str) -> Result<(), UploadError> {
        let path = self.resolve(filename)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(UploadError::NotFound),
            Err(err) => Err(err.into()),
        }
    }

    /// Rejects anything that is not a bare filename.
    fn resolve(&self, filename: &str) -> Result<PathBuf, UploadError> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return Err(UploadError::InvalidFilename);
        }
        Ok(self.root.join(filename))
    }
}
