//! Resolution of product image names to stored-file references.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::store::{FileDescriptor, FileUploader, StoreError, StoredFile};

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image {0} not found in uploads directory")]
    Missing(String),
    #[error("Upload of {name} failed: {source}")]
    Upload { name: String, source: StoreError },
    #[error("Upload of {0} returned no file reference")]
    NoReference(String),
}

/// Looks up image files in an uploads directory and hands the existing ones
/// to a [`FileUploader`].
#[derive(Debug, Clone)]
pub struct ImageResolver {
    uploads_dir: PathBuf,
    strict: bool,
}

impl ImageResolver {
    pub fn new(uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
            strict: false,
        }
    }

    /// Missing files become [`ImageError::Missing`] instead of being skipped.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Path of `name` inside the uploads directory. A leading root or drive
    /// prefix is dropped, so absolute names still resolve under the directory.
    pub fn path_for(&self, name: &str) -> PathBuf {
        let mut path = self.uploads_dir.clone();
        for component in Path::new(name).components() {
            match component {
                Component::Prefix(_) | Component::RootDir => {}
                other => path.push(other.as_os_str()),
            }
        }
        path
    }

    /// Builds the upload descriptor for `name`, or `None` if no such file exists.
    pub async fn descriptor(&self, name: &str) -> Option<FileDescriptor> {
        let path = self.path_for(name);
        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !is_file {
            return None;
        }

        let mime = mime_guess::from_path(name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Some(FileDescriptor {
            path,
            name: name.to_string(),
            mime,
        })
    }

    /// Uploads every existing image in `names`, in order, keeping the first
    /// reference returned for each.
    ///
    /// Names without a matching file are skipped without logging unless the
    /// resolver is strict.
    pub async fn resolve_images(
        &self,
        uploader: &dyn FileUploader,
        names: &[String],
    ) -> Result<Vec<StoredFile>, ImageError> {
        let mut stored = Vec::with_capacity(names.len());

        for name in names {
            let Some(file) = self.descriptor(name).await else {
                if self.strict {
                    return Err(ImageError::Missing(name.clone()));
                }
                continue;
            };

            let uploaded = uploader
                .upload(&file)
                .await
                .map_err(|source| ImageError::Upload {
                    name: name.clone(),
                    source,
                })?;

            let first = uploaded
                .into_iter()
                .next()
                .ok_or_else(|| ImageError::NoReference(name.clone()))?;

            debug!("Uploaded image {name} as file {}", first.id);
            stored.push(first);
        }

        Ok(stored)
    }
}
