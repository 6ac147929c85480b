// SPDX-License-Identifier: MPL-2.0

//! Photo library storage
//!
//! Saved photos are plain JPEG files in the user's Pictures folder, named
//! after the time they were saved (`IMG_20250101_120000.jpg`, with a `_n`
//! suffix when two photos land in the same second). They stay visible to
//! every other application.

use crate::backends::camera::CapturedImageRef;
use crate::constants::{PHOTO_FILE_PREFIX, file_formats};
use crate::errors::{SaveError, SaveFailure};
use chrono::{DateTime, Local};
use futures::future::BoxFuture;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A photo stored in the library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetHandle {
    pub path: PathBuf,
    pub created: DateTime<Local>,
}

impl AssetHandle {
    /// Stable identifier (the file name)
    pub fn id(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Durable storage for captured photos
pub trait MediaStore: Send + Sync {
    /// Move a captured image into durable storage
    ///
    /// On failure the image is handed back inside [`SaveFailure`] so the
    /// caller can retry or discard it.
    fn save(&self, image: CapturedImageRef) -> BoxFuture<'_, Result<AssetHandle, SaveFailure>>;

    /// Stored photos, newest first
    fn assets(&self) -> BoxFuture<'_, Vec<AssetHandle>>;
}

/// Photo library rooted at a folder on disk
#[derive(Debug, Clone)]
pub struct PhotoLibrary {
    root: PathBuf,
}

impl PhotoLibrary {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl MediaStore for PhotoLibrary {
    fn save(&self, image: CapturedImageRef) -> BoxFuture<'_, Result<AssetHandle, SaveFailure>> {
        Box::pin(async move {
            let root = self.root.clone();
            let source = image.path().to_path_buf();

            let result = tokio::task::spawn_blocking(move || write_asset(&root, &source, Local::now()))
                .await
                .unwrap_or_else(|e| Err(SaveError::Io(format!("Save task error: {}", e))));

            match result {
                Ok(asset) => {
                    info!(path = %asset.path.display(), "Photo saved to library");
                    // Dropping the handle removes the transient capture
                    drop(image);
                    Ok(asset)
                }
                Err(error) => {
                    warn!(error = %error, "Saving photo failed");
                    Err(SaveFailure { error, image })
                }
            }
        })
    }

    fn assets(&self) -> BoxFuture<'_, Vec<AssetHandle>> {
        Box::pin(async move {
            let root = self.root.clone();
            tokio::task::spawn_blocking(move || list_assets(&root))
                .await
                .unwrap_or_default()
        })
    }
}

/// File stem for a photo saved at `when`, with an optional collision index
pub fn asset_file_name(when: &DateTime<Local>, index: u32) -> String {
    let stamp = when.format("%Y%m%d_%H%M%S");
    if index == 0 {
        format!("{}_{}.jpg", PHOTO_FILE_PREFIX, stamp)
    } else {
        format!("{}_{}_{}.jpg", PHOTO_FILE_PREFIX, stamp, index)
    }
}

/// Copy `source` into `root` under a fresh name and flush it to disk
fn write_asset(root: &Path, source: &Path, when: DateTime<Local>) -> Result<AssetHandle, SaveError> {
    if !source.is_file() {
        return Err(SaveError::InvalidImage(format!(
            "{} does not exist",
            source.display()
        )));
    }

    std::fs::create_dir_all(root)?;

    let (path, mut dest) = create_unique(root, &when)?;
    let copied = File::open(source)
        .and_then(|mut src| std::io::copy(&mut src, &mut dest))
        .and_then(|_| dest.sync_all());

    if let Err(e) = copied {
        drop(dest);
        let _ = std::fs::remove_file(&path);
        return Err(e.into());
    }

    // Persist the directory entry as well
    if let Err(e) = File::open(root).and_then(|dir| dir.sync_all()) {
        debug!(error = %e, "Could not sync library directory");
    }

    Ok(AssetHandle {
        path,
        created: when,
    })
}

fn create_unique(root: &Path, when: &DateTime<Local>) -> Result<(PathBuf, File), SaveError> {
    let mut index = 0;
    loop {
        let path = root.join(asset_file_name(when, index));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => index += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

fn list_assets(root: &Path) -> Vec<AssetHandle> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };

    let mut assets: Vec<AssetHandle> = entries
        .flatten()
        .filter_map(|entry| {
            let path = entry.path();
            let ext = path.extension()?.to_str()?;
            if !file_formats::is_image_extension(ext) {
                return None;
            }
            let modified = entry.metadata().ok()?.modified().ok()?;
            Some(AssetHandle {
                path,
                created: DateTime::<Local>::from(modified),
            })
        })
        .collect();

    // Newest first; names break ties within the same second
    assets.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.path.cmp(&a.path)));
    assets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::CameraFrame;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn captured(dir: &Path, name: &str) -> CapturedImageRef {
        let path = dir.join(name);
        std::fs::write(&path, b"\xFF\xD8jpeg").unwrap();
        let frame = CameraFrame::from_rgba(1, 1, vec![0, 0, 0, 255]).unwrap();
        CapturedImageRef::new(path, Arc::new(frame))
    }

    #[test]
    fn test_asset_file_names() {
        let when = Local.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(asset_file_name(&when, 0), "IMG_20250309_140507.jpg");
        assert_eq!(asset_file_name(&when, 2), "IMG_20250309_140507_2.jpg");
    }

    #[test]
    fn test_same_second_gets_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("capture.jpg");
        std::fs::write(&source, b"data").unwrap();
        let root = dir.path().join("Camera");
        let when = Local.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();

        let first = write_asset(&root, &source, when).unwrap();
        let second = write_asset(&root, &source, when).unwrap();
        assert_ne!(first.path, second.path);
        assert!(second.id().ends_with("_1.jpg"));
        assert_eq!(std::fs::read(&second.path).unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_save_moves_capture_into_library() {
        let dir = tempfile::tempdir().unwrap();
        let image = captured(dir.path(), "capture_a.jpg");
        let transient = image.path().to_path_buf();
        let library = PhotoLibrary::new(dir.path().join("Camera"));

        let asset = library.save(image).await.unwrap();
        assert!(asset.path.starts_with(library.root()));
        assert!(asset.path.exists());
        assert!(!transient.exists());

        let assets = library.assets().await;
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].path, asset.path);
    }

    #[tokio::test]
    async fn test_failed_save_returns_image() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the library folder should be
        let blocked = dir.path().join("Camera");
        std::fs::write(&blocked, b"").unwrap();
        let image = captured(dir.path(), "capture_b.jpg");
        let transient = image.path().to_path_buf();

        let failure = PhotoLibrary::new(blocked).save(image).await.unwrap_err();
        assert!(matches!(failure.error, SaveError::Io(_)));
        assert_eq!(failure.image.path(), transient);
        assert!(transient.exists());
    }

    #[tokio::test]
    async fn test_missing_library_has_no_assets() {
        let dir = tempfile::tempdir().unwrap();
        let library = PhotoLibrary::new(dir.path().join("nothing"));
        assert!(library.assets().await.is_empty());
    }
}
