// SPDX-License-Identifier: MPL-2.0

//! Error types for the camera application
//!
//! Three failure families reach the user:
//! - [`PermissionDenied`]: shown as a blocking full-screen message
//! - [`CaptureError`]: shown as a dismissable alert, the live view stays up
//! - [`SaveError`]: shown as a dismissable alert, the preview stays up
//!
//! None of them is fatal; every failure leaves the screen interactive.

use crate::backends::camera::CapturedImageRef;
use crate::backends::permissions::Capability;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result of a capture device operation
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Main application error type
#[derive(Debug)]
pub enum AppError {
    /// A required permission was not granted
    Permission(PermissionDenied),
    /// Capture-related errors
    Capture(CaptureError),
    /// Photo library errors
    Save(SaveError),
    /// Configuration errors
    Config(String),
    /// Generic error with message
    Other(String),
}

/// A capability resolved to denied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionDenied {
    pub capability: Capability,
}

/// Capture-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The live feed is not mounted or has not delivered a frame yet
    NotReady,
    /// Another capture is still running on this device
    Busy,
    /// The pipeline is running but no frame is available
    NoFrameAvailable,
    /// No camera device for the requested facing
    DeviceNotFound(String),
    /// Camera backend error (GStreamer, V4L2)
    Backend(String),
    /// Encoding the still image failed
    Encoding(String),
    /// Writing the transient image file failed
    Io(String),
}

/// Photo library errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveError {
    /// The library folder is not writable
    PermissionDenied(String),
    /// Writing the asset failed
    Io(String),
    /// The captured image file is missing or unreadable
    InvalidImage(String),
}

/// A failed save hands the captured image back to the caller
///
/// The image stays valid so the user can retry the save or retake.
#[derive(Debug)]
pub struct SaveFailure {
    pub error: SaveError,
    pub image: CapturedImageRef,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Permission(e) => write!(f, "Permission error: {}", e),
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Save(e) => write!(f, "Save error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for PermissionDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} permission denied", self.capability)
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::NotReady => write!(f, "Camera is not ready"),
            CaptureError::Busy => write!(f, "Camera is busy"),
            CaptureError::NoFrameAvailable => write!(f, "No frame available for capture"),
            CaptureError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            CaptureError::Backend(msg) => write!(f, "Backend error: {}", msg),
            CaptureError::Encoding(msg) => write!(f, "Encoding failed: {}", msg),
            CaptureError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::PermissionDenied(msg) => write!(f, "Library not writable: {}", msg),
            SaveError::Io(msg) => write!(f, "Failed to write photo: {}", msg),
            SaveError::InvalidImage(msg) => write!(f, "Invalid captured image: {}", msg),
        }
    }
}

impl fmt::Display for SaveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for PermissionDenied {}
impl std::error::Error for CaptureError {}
impl std::error::Error for SaveError {}
impl std::error::Error for SaveFailure {}

impl From<PermissionDenied> for AppError {
    fn from(err: PermissionDenied) -> Self {
        AppError::Permission(err)
    }
}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<SaveError> for AppError {
    fn from(err: SaveError) -> Self {
        AppError::Save(err)
    }
}

impl From<SaveFailure> for AppError {
    fn from(failure: SaveFailure) -> Self {
        AppError::Save(failure.error)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::Io(err.to_string())
    }
}

impl From<std::io::Error> for SaveError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => SaveError::PermissionDenied(err.to_string()),
            _ => SaveError::Io(err.to_string()),
        }
    }
}
