//! Filesystem layout for generated books.

use crate::{BookManifest, sanitize_name};
use fabula_error::{FabulaResult, StorageError, StorageErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Root of the book output tree.
///
/// Each book gets its own directory named after the sanitized title:
///
/// ```text
/// output_books/
/// ├── A_Test_Book/
/// │   ├── cover.png
/// │   ├── page_01.png
/// │   ├── page_02.png
/// │   └── book.json
/// └── Another_Title/
///     └── ...
/// ```
#[derive(Debug, Clone)]
pub struct BookStorage {
    root: PathBuf,
}

impl BookStorage {
    /// Create a storage root, making the directory if needed.
    #[tracing::instrument(skip(root))]
    pub fn new(root: impl Into<PathBuf>) -> FabulaResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                root.display(),
                e
            )))
        })?;
        info!(path = %root.display(), "Opened book storage root");
        Ok(Self { root })
    }

    /// Root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Open (creating if needed) the directory for a book title.
    #[tracing::instrument(skip(self))]
    pub fn open_book(&self, title: &str) -> FabulaResult<BookDirectory> {
        let dir = self.root.join(sanitize_name(title)?);
        std::fs::create_dir_all(&dir).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                dir.display(),
                e
            )))
        })?;
        debug!(path = %dir.display(), "Opened book directory");
        Ok(BookDirectory { dir })
    }
}

/// Directory holding one book's output.
#[derive(Debug, Clone)]
pub struct BookDirectory {
    dir: PathBuf,
}

impl BookDirectory {
    /// Path of this book's directory.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Write the cover image.
    pub async fn save_cover(&self, bytes: &[u8]) -> FabulaResult<PathBuf> {
        let path = self.dir.join("cover.png");
        write_atomic(&path, bytes).await?;
        Ok(path)
    }

    /// Write a page image as `page_NN.png`.
    pub async fn save_page(&self, page_number: u32, bytes: &[u8]) -> FabulaResult<PathBuf> {
        let path = self.dir.join(format!("page_{page_number:02}.png"));
        write_atomic(&path, bytes).await?;
        Ok(path)
    }

    /// Write the book manifest as `book.json`.
    pub async fn write_manifest(&self, manifest: &BookManifest) -> FabulaResult<PathBuf> {
        let path = self.dir.join("book.json");
        let json = serde_json::to_vec_pretty(manifest).map_err(|e| {
            StorageError::new(StorageErrorKind::ManifestSerialization(e.to_string()))
        })?;
        write_atomic(&path, &json).await?;
        Ok(path)
    }
}

/// Write under a sanitized, collision-free name: `stem.ext`, `stem_1.ext`, ...
///
/// Single-image mode names files after the prompt, which may repeat.
pub async fn save_unique(
    dir: &Path,
    stem: &str,
    ext: &str,
    bytes: &[u8],
) -> FabulaResult<PathBuf> {
    let stem = sanitize_name(stem)?;
    let mut path = dir.join(format!("{stem}.{ext}"));
    let mut counter = 1u32;
    while tokio::fs::try_exists(&path).await.unwrap_or(false) {
        path = dir.join(format!("{stem}_{counter}.{ext}"));
        counter += 1;
    }
    write_atomic(&path, bytes).await?;
    Ok(path)
}

/// Write to a temp file, then rename for atomicity.
async fn write_atomic(path: &Path, bytes: &[u8]) -> FabulaResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                parent.display(),
                e
            )))
        })?;
    }

    let temp_path = path.with_extension("tmp");
    tokio::fs::write(&temp_path, bytes).await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileWrite(format!(
            "{}: {}",
            temp_path.display(),
            e
        )))
    })?;

    tokio::fs::rename(&temp_path, path).await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileWrite(format!(
            "rename {} to {}: {}",
            temp_path.display(),
            path.display(),
            e
        )))
    })?;

    info!(path = %path.display(), size = bytes.len(), "Stored file");
    Ok(())
}
