// SPDX-License-Identifier: GPL-3.0-only

//! The capture screen
//!
//! # Architecture
//!
//! [`CaptureScreen`] owns all UI state and drives three services:
//!
//! - [`PermissionGateway`]: gates the live feed
//! - [`CaptureDevice`]: live feed and still capture
//! - [`MediaStore`]: durable storage for saved photos
//!
//! State changes only happen in [`CaptureScreen::update`], which returns a
//! [`Task`] for any asynchronous follow-up. The task's result comes back as
//! another [`Message`].
//!
//! ```text
//! AwaitingPermissions ──granted──▶ Live ──capture ok──▶ Preview(Idle)
//!        │   ▲                      ▲ ▲                   │      │
//!     denied │ re-request    retake │ └──save ok── Preview(InFlight)
//!        ▼   │                      └─────────────────────┘      │
//!  PermissionsDenied                          save failed ◀──────┘
//! ```

pub mod alerts;
pub mod state;
pub mod task;
mod update;

pub use alerts::Alert;
pub use state::{LiveState, Message, PreviewState, SaveSlot, SaveStatus, Screen, UiMode};
pub use task::Task;

use crate::backends::camera::{CameraFrame, CaptureDevice, CaptureSettings};
use crate::backends::permissions::{self, Capability, PermissionGateway, Permissions};
use crate::storage::{AssetHandle, MediaStore};
use std::sync::Arc;

/// Single-screen camera: live feed, capture, retake or save
pub struct CaptureScreen {
    gateway: Arc<dyn PermissionGateway>,
    device: Arc<dyn CaptureDevice>,
    store: Arc<dyn MediaStore>,
    screen: Screen,
    settings: CaptureSettings,
    permissions: Permissions,
    alert: Option<Alert>,
    last_saved: Option<AssetHandle>,
}

impl CaptureScreen {
    /// Create the screen and the task that resolves both permissions
    pub fn new(
        gateway: Arc<dyn PermissionGateway>,
        device: Arc<dyn CaptureDevice>,
        store: Arc<dyn MediaStore>,
    ) -> (Self, Task) {
        let screen = Self {
            gateway,
            device,
            store,
            screen: Screen::AwaitingPermissions,
            settings: CaptureSettings::default(),
            permissions: Permissions::default(),
            alert: None,
            last_saved: None,
        };
        let task = screen.resolve_permissions(Capability::ALL.to_vec());
        (screen, task)
    }

    /// Resolve `capabilities`, keeping every other capability's current state
    fn resolve_permissions(&self, capabilities: Vec<Capability>) -> Task {
        let gateway = Arc::clone(&self.gateway);
        let mut permissions = self.permissions;
        Task::perform(
            async move {
                for capability in capabilities {
                    let state = permissions::resolve(gateway.as_ref(), capability).await;
                    permissions.set(capability, state);
                }
                permissions
            },
            Message::PermissionsResolved,
        )
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Live or Preview; `None` while permissions gate the screen
    pub fn mode(&self) -> Option<UiMode> {
        match self.screen {
            Screen::Live(_) => Some(UiMode::Live),
            Screen::Preview(_) => Some(UiMode::Preview),
            Screen::AwaitingPermissions | Screen::PermissionsDenied(_) => None,
        }
    }

    /// Save progress; only defined in preview
    pub fn save_status(&self) -> Option<SaveStatus> {
        match &self.screen {
            Screen::Preview(preview) => Some(preview.save.status()),
            _ => None,
        }
    }

    /// Whether a captured image is held (by the screen or its running save)
    pub fn has_captured_image(&self) -> bool {
        matches!(self.screen, Screen::Preview(_))
    }

    pub fn settings(&self) -> CaptureSettings {
        self.settings
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    pub fn last_saved(&self) -> Option<&AssetHandle> {
        self.last_saved.as_ref()
    }

    pub fn device(&self) -> &Arc<dyn CaptureDevice> {
        &self.device
    }

    /// The camera is starting or a capture or save is running; user actions
    /// are inert until it ends
    pub fn is_busy(&self) -> bool {
        match &self.screen {
            Screen::Live(live) => !live.is_idle(),
            Screen::Preview(preview) => preview.save.status() == SaveStatus::InFlight,
            _ => false,
        }
    }

    /// The capture action would be accepted
    pub fn can_capture(&self) -> bool {
        matches!(&self.screen, Screen::Live(live) if live.is_idle()) && self.device.is_ready()
    }

    /// Frame to draw: the live feed or the captured photo
    pub fn display_frame(&self) -> Option<Arc<CameraFrame>> {
        match &self.screen {
            Screen::Live(_) => self.device.latest_frame(),
            Screen::Preview(preview) => Some(Arc::clone(&preview.frame)),
            _ => None,
        }
    }

    /// Release the camera before exiting
    pub fn shutdown(&mut self) {
        self.device.stop();
    }
}
