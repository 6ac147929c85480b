// SPDX-License-Identifier: GPL-3.0-only

//! Camera and media-library permissions
//!
//! A capability is either granted, denied, or not yet known. There is no
//! error channel: anything short of a grant is reported as [`Denied`]
//! once a request has been made.
//!
//! [`Denied`]: PermissionState::Denied

pub mod access;
pub mod portal;

use crate::config::{CaptureBackendType, Config};
use futures::future::BoxFuture;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

/// Something the app needs the user's consent for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Camera,
    MediaLibrary,
}

impl Capability {
    pub const ALL: [Capability; 2] = [Capability::Camera, Capability::MediaLibrary];
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Camera => write!(f, "camera"),
            Capability::MediaLibrary => write!(f, "media library"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    /// Not asked yet, or the answer is still pending
    #[default]
    Unknown,
    Denied,
    Granted,
}

impl PermissionState {
    pub fn is_granted(self) -> bool {
        self == PermissionState::Granted
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionState::Unknown => write!(f, "unknown"),
            PermissionState::Denied => write!(f, "denied"),
            PermissionState::Granted => write!(f, "granted"),
        }
    }
}

/// Permission state of every capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions {
    pub camera: PermissionState,
    pub media: PermissionState,
}

impl Permissions {
    pub fn get(&self, capability: Capability) -> PermissionState {
        match capability {
            Capability::Camera => self.camera,
            Capability::MediaLibrary => self.media,
        }
    }

    pub fn set(&mut self, capability: Capability, state: PermissionState) {
        match capability {
            Capability::Camera => self.camera = state,
            Capability::MediaLibrary => self.media = state,
        }
    }

    pub fn all_granted(&self) -> bool {
        self.camera.is_granted() && self.media.is_granted()
    }

    /// Capabilities that still need a request
    pub fn missing(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| !self.get(*c).is_granted())
            .collect()
    }
}

/// Platform permission queries and requests
///
/// `request` may show a platform prompt and only resolves once the user
/// has answered.
pub trait PermissionGateway: Send + Sync {
    /// Current state without prompting
    fn query(&self, capability: Capability) -> BoxFuture<'_, PermissionState>;

    /// Ask for the capability, prompting if the platform does so
    fn request(&self, capability: Capability) -> BoxFuture<'_, PermissionState>;

    fn query_media_permission(&self) -> BoxFuture<'_, PermissionState> {
        self.query(Capability::MediaLibrary)
    }

    fn request_camera_permission(&self) -> BoxFuture<'_, PermissionState> {
        self.request(Capability::Camera)
    }

    fn request_media_permission(&self) -> BoxFuture<'_, PermissionState> {
        self.request(Capability::MediaLibrary)
    }
}

/// Query, request if not granted, and settle a pending answer to denied
pub async fn resolve(gateway: &dyn PermissionGateway, capability: Capability) -> PermissionState {
    let current = gateway.query(capability).await;
    if current.is_granted() {
        debug!(%capability, "Permission already granted");
        return current;
    }

    let state = match gateway.request(capability).await {
        PermissionState::Unknown => PermissionState::Denied,
        state => state,
    };
    info!(%capability, %state, "Permission resolved");
    state
}

/// How camera access is decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CameraAccess {
    /// Portal when sandboxed, device nodes otherwise
    Hardware,
    /// Virtual camera, nothing to ask for
    Virtual,
}

/// Permissions on a Linux desktop or phone
#[derive(Debug, Clone)]
pub struct DesktopPermissions {
    camera: CameraAccess,
    library_dir: PathBuf,
}

impl DesktopPermissions {
    pub fn new(config: &Config) -> Self {
        let camera = match config.backend {
            CaptureBackendType::V4l2 => CameraAccess::Hardware,
            CaptureBackendType::File => CameraAccess::Virtual,
        };
        Self {
            camera,
            library_dir: config.photo_library_dir(),
        }
    }

    async fn query_camera(&self) -> PermissionState {
        match self.camera {
            CameraAccess::Virtual => PermissionState::Granted,
            // The portal has no query call; only a request can tell
            CameraAccess::Hardware if portal::is_sandboxed() => PermissionState::Unknown,
            CameraAccess::Hardware => access::camera_node_state(&access::video_nodes()),
        }
    }

    async fn request_camera(&self) -> PermissionState {
        if self.camera == CameraAccess::Virtual {
            return PermissionState::Granted;
        }
        match portal::access_camera().await {
            Ok(true) => PermissionState::Granted,
            Ok(false) => PermissionState::Denied,
            Err(e) => {
                debug!(error = %e, "Camera portal unreachable, checking device nodes");
                access::camera_node_state(&access::video_nodes())
            }
        }
    }

    async fn request_library(&self) -> PermissionState {
        if let Err(e) = tokio::fs::create_dir_all(&self.library_dir).await {
            info!(dir = %self.library_dir.display(), error = %e, "Cannot create photo library");
            return PermissionState::Denied;
        }
        access::library_state(&self.library_dir)
    }
}

impl PermissionGateway for DesktopPermissions {
    fn query(&self, capability: Capability) -> BoxFuture<'_, PermissionState> {
        Box::pin(async move {
            match capability {
                Capability::Camera => self.query_camera().await,
                Capability::MediaLibrary => access::library_state(&self.library_dir),
            }
        })
    }

    fn request(&self, capability: Capability) -> BoxFuture<'_, PermissionState> {
        Box::pin(async move {
            match capability {
                Capability::Camera => self.request_camera().await,
                Capability::MediaLibrary => self.request_library().await,
            }
        })
    }
}
