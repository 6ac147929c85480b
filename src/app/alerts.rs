// SPDX-License-Identifier: GPL-3.0-only

//! Dismissable alerts shown over the capture screen

use crate::errors::{CaptureError, SaveError};
use crate::fl;
use crate::storage::AssetHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    /// Capture failed, the live view stays up
    CaptureFailed(CaptureError),
    /// The live feed could not be (re)started
    CameraUnavailable(CaptureError),
    /// The photo is in the library
    SaveSucceeded(AssetHandle),
    /// Save failed, the preview stays up
    SaveFailed(SaveError),
}

impl Alert {
    pub fn title(&self) -> String {
        match self {
            Alert::CaptureFailed(_) => fl!("capture-failed-title"),
            Alert::CameraUnavailable(_) => fl!("camera-unavailable-title"),
            Alert::SaveSucceeded(_) => fl!("save-succeeded-title"),
            Alert::SaveFailed(_) => fl!("save-failed-title"),
        }
    }

    pub fn body(&self) -> String {
        match self {
            Alert::CaptureFailed(_) => fl!("capture-failed-body"),
            Alert::CameraUnavailable(err) => {
                fl!("camera-unavailable-body", reason = err.to_string())
            }
            Alert::SaveSucceeded(_) => fl!("save-succeeded-body"),
            Alert::SaveFailed(_) => fl!("save-failed-body"),
        }
    }

    /// Technical detail for the log line and the alert footer
    pub fn detail(&self) -> Option<String> {
        match self {
            Alert::CaptureFailed(err) => Some(err.to_string()),
            Alert::CameraUnavailable(_) => None,
            Alert::SaveSucceeded(asset) => Some(asset.path.display().to_string()),
            Alert::SaveFailed(err) => Some(err.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Alert::SaveSucceeded(_))
    }
}
