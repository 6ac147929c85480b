// SPDX-License-Identifier: GPL-3.0-only

//! Runtime configuration
//!
//! The configuration is assembled from defaults and command-line flags at
//! startup and is never written back; capture settings (facing, torch) are
//! not part of it and reset on every launch.

use crate::constants::{APP_DIR_NAME, DEFAULT_SAVE_FOLDER};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which capture backend drives the live feed
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureBackendType {
    /// V4L2 camera streamed through GStreamer
    #[default]
    V4l2,
    /// Still image file served as a virtual camera
    File,
}

impl std::fmt::Display for CaptureBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureBackendType::V4l2 => write!(f, "V4L2"),
            CaptureBackendType::File => write!(f, "file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Photo library root; `None` means `~/Pictures/<save_folder>`
    pub library_dir: Option<PathBuf>,
    /// Folder name used under the Pictures directory
    pub save_folder: String,
    /// Capture backend
    pub backend: CaptureBackendType,
    /// Image served by the file backend
    pub file_source: Option<PathBuf>,
    /// V4L2 device forced for the front camera (e.g. `/dev/video2`)
    pub front_device: Option<String>,
    /// V4L2 device forced for the back camera
    pub back_device: Option<String>,
    /// Mirror the front camera's live view horizontally (selfie mode)
    pub mirror_front: bool,
    /// Torch brightness as a fraction of the LED's maximum
    pub torch_intensity: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            library_dir: None,
            save_folder: DEFAULT_SAVE_FOLDER.to_string(),
            backend: CaptureBackendType::default(),
            file_source: None,
            front_device: None,
            back_device: None,
            mirror_front: true, // Default to mirrored (selfie mode)
            torch_intensity: 1.0,
        }
    }
}

impl Config {
    /// Folder that receives saved photos
    pub fn photo_library_dir(&self) -> PathBuf {
        if let Some(dir) = &self.library_dir {
            return dir.clone();
        }
        dirs::picture_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join(&self.save_folder)
    }

    /// Folder for transient capture files awaiting retake/save
    pub fn capture_cache_dir(&self) -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR_NAME)
            .join("captures")
    }

    /// Folder for the terminal UI's log file
    pub fn log_dir(&self) -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::cache_dir)
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR_NAME)
    }

    /// Check that the configuration can drive a capture backend
    pub fn validate(&self) -> Result<(), String> {
        if self.backend == CaptureBackendType::File && self.file_source.is_none() {
            return Err("The file backend needs an image (--source <path>)".to_string());
        }
        if !(0.0..=1.0).contains(&self.torch_intensity) {
            return Err(format!(
                "Torch intensity must be between 0.0 and 1.0, got {}",
                self.torch_intensity
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_library_dir_wins() {
        let config = Config {
            library_dir: Some(PathBuf::from("/srv/photos")),
            ..Default::default()
        };
        assert_eq!(config.photo_library_dir(), PathBuf::from("/srv/photos"));
    }

    #[test]
    fn test_default_library_uses_save_folder() {
        let config = Config::default();
        assert!(config.photo_library_dir().ends_with(DEFAULT_SAVE_FOLDER));
    }

    #[test]
    fn test_file_backend_requires_source() {
        let config = Config {
            backend: CaptureBackendType::File,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
