// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! `update()` dispatches each message to a handler. Handlers ignore messages
//! that do not apply to the current screen, so stale or repeated input is
//! always harmless.

use super::alerts::Alert;
use super::state::{LiveState, Message, PreviewState, SaveSlot, Screen};
use super::task::Task;
use super::CaptureScreen;
use crate::backends::camera::{CaptureSettings, CapturedImageRef};
use crate::backends::permissions::Permissions;
use crate::errors::{CaptureError, CaptureResult, SaveFailure};
use crate::storage::AssetHandle;
use std::sync::Arc;
use tracing::{debug, info, warn};

impl CaptureScreen {
    pub fn update(&mut self, message: Message) -> Task {
        match message {
            // ===== Permissions =====
            Message::PermissionsResolved(permissions) => {
                self.handle_permissions_resolved(permissions)
            }
            Message::RequestPermissions => self.handle_request_permissions(),

            // ===== Live =====
            Message::Capture => self.handle_capture(),
            Message::CaptureFinished(result) => self.handle_capture_finished(result),
            Message::ToggleFacing => self.handle_toggle(|settings| {
                settings.facing = settings.facing.flipped();
            }),
            Message::ToggleTorch => self.handle_toggle(|settings| {
                settings.torch_enabled = !settings.torch_enabled;
            }),
            Message::DeviceConfigured(result) => self.handle_device_configured(result),

            // ===== Preview =====
            Message::Retake => self.handle_retake(),
            Message::Save => self.handle_save(),
            Message::SaveFinished(result) => self.handle_save_finished(result),

            // ===== Alerts =====
            Message::DismissAlert => {
                self.alert = None;
                Task::none()
            }
        }
    }

    // =========================================================================
    // Permission handlers
    // =========================================================================

    fn handle_permissions_resolved(&mut self, permissions: Permissions) -> Task {
        if !matches!(self.screen, Screen::AwaitingPermissions) {
            debug!("Ignoring permission result outside of permission check");
            return Task::none();
        }

        self.permissions = permissions;
        if permissions.all_granted() {
            info!("All permissions granted, starting live view");
            return self.enter_live();
        }

        info!(
            camera = %permissions.camera,
            media = %permissions.media,
            "Permissions missing"
        );
        self.screen = Screen::PermissionsDenied(permissions);
        Task::none()
    }

    fn handle_request_permissions(&mut self) -> Task {
        let Screen::PermissionsDenied(permissions) = &self.screen else {
            return Task::none();
        };

        let missing = permissions.missing();
        info!(?missing, "Requesting permissions again");
        self.screen = Screen::AwaitingPermissions;
        self.resolve_permissions(missing)
    }

    // =========================================================================
    // Live handlers
    // =========================================================================

    fn handle_capture(&mut self) -> Task {
        let Screen::Live(live) = &mut self.screen else {
            return Task::none();
        };
        if !live.is_idle() {
            debug!("Camera busy, capture ignored");
            return Task::none();
        }
        if !self.device.is_ready() {
            debug!("Camera not ready, capture ignored");
            return Task::none();
        }

        info!("Capturing photo");
        live.capturing = true;
        let device = Arc::clone(&self.device);
        Task::perform(async move { device.capture().await }, Message::CaptureFinished)
    }

    fn handle_capture_finished(&mut self, result: Result<CapturedImageRef, CaptureError>) -> Task {
        let Screen::Live(LiveState { capturing: true, .. }) = self.screen else {
            // Dropping a stray image removes its file
            warn!("Capture result arrived outside of a capture");
            return Task::none();
        };

        match result {
            Ok(image) => {
                info!(path = %image.path().display(), "Photo captured");
                self.device.stop();
                self.screen = Screen::Preview(PreviewState {
                    frame: Arc::clone(image.preview()),
                    save: SaveSlot::Idle(image),
                });
            }
            Err(err) => {
                warn!(error = %err, "Capture failed");
                self.screen = Screen::Live(LiveState::default());
                self.alert = Some(Alert::CaptureFailed(err));
            }
        }
        Task::none()
    }

    /// Apply a settings change; only the idle live view accepts it
    fn handle_toggle(&mut self, change: impl FnOnce(&mut CaptureSettings)) -> Task {
        let Screen::Live(live) = &mut self.screen else {
            return Task::none();
        };
        if !live.is_idle() {
            return Task::none();
        }
        live.mounting = true;

        change(&mut self.settings);
        info!(
            facing = %self.settings.facing,
            torch = self.settings.torch_enabled,
            "Capture settings changed"
        );
        self.configure_device()
    }

    fn handle_device_configured(&mut self, result: CaptureResult<()>) -> Task {
        let Screen::Live(live) = &mut self.screen else {
            debug!("Camera start finished outside of live view");
            return Task::none();
        };
        live.mounting = false;

        if let Err(err) = result {
            warn!(error = %err, "Camera could not be configured");
            if let Some(Alert::SaveSucceeded(_)) = self.alert {
                // The photo is in the library; the confirmation stays
                debug!("Camera alert held back behind save confirmation");
            } else {
                self.alert = Some(Alert::CameraUnavailable(err));
            }
        }
        Task::none()
    }

    // =========================================================================
    // Preview handlers
    // =========================================================================

    fn handle_retake(&mut self) -> Task {
        let Screen::Preview(preview) = &self.screen else {
            return Task::none();
        };
        if let SaveSlot::InFlight = preview.save {
            debug!("Retake ignored while saving");
            return Task::none();
        }

        info!("Retaking photo");
        // Replacing the screen drops the image, which deletes its file
        self.enter_live()
    }

    fn handle_save(&mut self) -> Task {
        let Screen::Preview(preview) = &mut self.screen else {
            return Task::none();
        };

        let SaveSlot::Idle(image) = std::mem::replace(&mut preview.save, SaveSlot::InFlight) else {
            debug!("Save already in flight");
            return Task::none();
        };

        info!("Saving photo");
        let store = Arc::clone(&self.store);
        Task::perform(async move { store.save(image).await }, Message::SaveFinished)
    }

    fn handle_save_finished(&mut self, result: Result<AssetHandle, SaveFailure>) -> Task {
        let Screen::Preview(preview) = &mut self.screen else {
            warn!("Save result arrived outside of preview");
            return Task::none();
        };
        if !matches!(preview.save, SaveSlot::InFlight) {
            warn!("Save result arrived without a save in flight");
            return Task::none();
        }

        match result {
            Ok(asset) => {
                info!(path = %asset.path.display(), "Photo saved");
                self.alert = Some(Alert::SaveSucceeded(asset.clone()));
                self.last_saved = Some(asset);
                return self.enter_live();
            }
            Err(SaveFailure { error, image }) => {
                warn!(error = %error, "Save failed, keeping photo for retry");
                preview.save = SaveSlot::Idle(image);
                self.alert = Some(Alert::SaveFailed(error));
            }
        }
        Task::none()
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Show the live view and (re)start the camera with the current settings
    fn enter_live(&mut self) -> Task {
        self.screen = Screen::Live(LiveState::mounting());
        self.configure_device()
    }

    /// Configure the camera off the UI thread; opening a device can block
    fn configure_device(&self) -> Task {
        let device = Arc::clone(&self.device);
        let settings = self.settings;
        Task::perform(
            async move {
                tokio::task::spawn_blocking(move || device.configure(&settings))
                    .await
                    .unwrap_or_else(|e| Err(CaptureError::Backend(e.to_string())))
            },
            Message::DeviceConfigured,
        )
    }
}
