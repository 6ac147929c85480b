// SPDX-License-Identifier: GPL-3.0-only

//! Capture screen state and messages

use crate::backends::camera::{CameraFrame, CapturedImageRef};
use crate::backends::permissions::Permissions;
use crate::errors::{CaptureError, CaptureResult, SaveFailure};
use crate::storage::AssetHandle;
use std::sync::Arc;

/// What the screen is showing
#[derive(Debug)]
pub enum Screen {
    /// Permissions are being queried or requested
    AwaitingPermissions,
    /// At least one permission was denied; blocking message with a grant action
    PermissionsDenied(Permissions),
    /// Live camera feed
    Live(LiveState),
    /// Captured photo awaiting retake or save
    Preview(PreviewState),
}

#[derive(Debug, Default)]
pub struct LiveState {
    /// The camera is being (re)started with the current settings
    pub mounting: bool,
    /// A capture is in flight
    pub capturing: bool,
}

impl LiveState {
    pub(crate) fn mounting() -> Self {
        Self {
            mounting: true,
            capturing: false,
        }
    }

    /// Neither mounting nor capturing
    pub fn is_idle(&self) -> bool {
        !self.mounting && !self.capturing
    }
}

#[derive(Debug)]
pub struct PreviewState {
    /// Pixels of the captured photo, kept while the image itself is saving
    pub frame: Arc<CameraFrame>,
    pub save: SaveSlot,
}

/// Where the captured image is while in preview
#[derive(Debug)]
pub enum SaveSlot {
    /// Held by the screen, ready for retake or save
    Idle(CapturedImageRef),
    /// Moved into a running save
    InFlight,
}

impl SaveSlot {
    pub fn status(&self) -> SaveStatus {
        match self {
            SaveSlot::Idle(_) => SaveStatus::Idle,
            SaveSlot::InFlight => SaveStatus::InFlight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    Live,
    Preview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    InFlight,
}

/// Everything that can happen to the capture screen
#[derive(Debug)]
pub enum Message {
    // ===== Permissions =====
    /// Permission resolution finished
    PermissionsResolved(Permissions),
    /// User asked to grant the missing permissions again
    RequestPermissions,

    // ===== Live =====
    /// Capture button pressed
    Capture,
    /// Capture finished
    CaptureFinished(Result<CapturedImageRef, CaptureError>),
    /// Switch between front and back camera
    ToggleFacing,
    /// Switch the torch on or off
    ToggleTorch,
    /// Camera finished starting with the current settings
    DeviceConfigured(CaptureResult<()>),

    // ===== Preview =====
    /// Discard the captured photo and go back to the live feed
    Retake,
    /// Store the captured photo in the library
    Save,
    /// Save finished
    SaveFinished(Result<AssetHandle, SaveFailure>),

    // ===== Alerts =====
    DismissAlert,
}
