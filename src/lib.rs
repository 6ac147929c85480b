// SPDX-License-Identifier: MPL-2.0

//! SnapCam - a single-screen camera
//!
//! Shows the live camera feed, captures a still photo, previews it with
//! retake/save actions and stores saved photos in the user's photo library.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: The capture screen state machine
//! - [`backends`]: Camera and permission backends
//! - [`pipelines`]: Still photo encoding
//! - [`storage`]: Photo library
//! - [`terminal`]: Terminal front-end
//! - [`config`]: Runtime configuration
//!
//! # Example
//!
//! ```ignore
//! // Interactive screen:
//! // snapcam
//! // Headless capture from an image file:
//! // snapcam --source scene.png photo
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod flash;
pub mod i18n;
pub mod pipelines;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{CaptureScreen, Message};
pub use config::Config;
