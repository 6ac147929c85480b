// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines for still capture
//!
//! # Modules
//!
//! - [`photo`]: Async photo capture with JPEG encoding into the capture cache

pub mod photo;
