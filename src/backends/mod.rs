// SPDX-License-Identifier: MPL-2.0

//! Platform services used by the capture screen
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                CaptureScreen                │
//! └──────────┬──────────────────────┬───────────┘
//!            │                      │
//! ┌──────────┴──────────┐ ┌─────────┴──────────┐
//! │ PermissionGateway   │ │   CaptureDevice    │
//! │ (portal, /dev, dir) │ │ (V4L2, file image) │
//! └─────────────────────┘ └────────────────────┘
//! ```
//!
//! The third service, the photo library, lives in [`crate::storage`].
//!
//! # Modules
//!
//! - [`camera`]: Camera discovery, live feed and still capture
//! - [`permissions`]: Camera and media-library permissions

pub mod camera;
pub mod permissions;
