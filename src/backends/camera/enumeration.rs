// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera discovery and front/back assignment
//!
//! Desktop webcams do not report which way they face, so facing is guessed
//! from the card name (see [`facing_hints`]) unless the configuration names
//! a device explicitly. A single camera serves both facings.

use super::types::{CameraDevice, Facing};
use crate::constants::facing_hints;
use std::path::Path;
use tracing::{debug, info};
use v4l::capability::Flags;
use v4l::prelude::*;
use v4l::video::Capture;

/// Explicit device paths from the configuration
#[derive(Debug, Clone, Default)]
pub struct FacingOverrides {
    pub front: Option<String>,
    pub back: Option<String>,
}

/// Scan `/dev/video*` for video capture nodes
pub fn enumerate_cameras(overrides: &FacingOverrides) -> Vec<CameraDevice> {
    let mut candidates = Vec::new();

    for entry in std::fs::read_dir("/dev").into_iter().flatten().flatten() {
        let path = entry.path();
        let is_video_node = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("video"));
        if !is_video_node {
            continue;
        }

        if let Some(card) = probe_capture_node(&path) {
            candidates.push((card, path.to_string_lossy().to_string()));
        }
    }

    // read_dir order is arbitrary; keep /dev/video0 before /dev/video2
    candidates.sort_by(|a, b| natural_node_key(&a.1).cmp(&natural_node_key(&b.1)));

    let cameras = assign_facing(candidates, overrides);
    for camera in &cameras {
        info!(name = %camera.name, path = %camera.path, facing = %camera.facing, "Found camera");
    }
    cameras
}

/// Card name of `path` if it is a capture node with at least one format
///
/// UVC cameras expose a second metadata node per camera; it has the capture
/// capability but no video formats.
fn probe_capture_node(path: &Path) -> Option<String> {
    let dev = Device::with_path(path).ok()?;
    let caps = dev.query_caps().ok()?;
    if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
        return None;
    }
    let formats = dev.enum_formats().unwrap_or_default();
    if formats.is_empty() {
        debug!(path = %path.display(), "Skipping node without video formats");
        return None;
    }
    Some(caps.card)
}

fn natural_node_key(path: &str) -> (usize, String) {
    let digits: String = path.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    let index = digits.chars().rev().collect::<String>().parse().unwrap_or(usize::MAX);
    (index, path.to_string())
}

/// Guess facing from the card name
pub fn facing_from_name(name: &str) -> Option<Facing> {
    let lower = name.to_lowercase();
    if facing_hints::FRONT.iter().any(|hint| lower.contains(hint)) {
        Some(Facing::Front)
    } else if facing_hints::BACK.iter().any(|hint| lower.contains(hint)) {
        Some(Facing::Back)
    } else {
        None
    }
}

/// Assign a facing to every `(card, path)` candidate
///
/// Overrides win, then name hints. Unclassified cameras fill the back slot
/// first, then the front slot.
pub fn assign_facing(candidates: Vec<(String, String)>, overrides: &FacingOverrides) -> Vec<CameraDevice> {
    let classified: Vec<(String, String, Option<Facing>)> = candidates
        .into_iter()
        .map(|(name, path)| {
            let facing = if overrides.front.as_deref() == Some(path.as_str()) {
                Some(Facing::Front)
            } else if overrides.back.as_deref() == Some(path.as_str()) {
                Some(Facing::Back)
            } else {
                facing_from_name(&name)
            };
            (name, path, facing)
        })
        .collect();

    let mut has_back = classified.iter().any(|(_, _, f)| *f == Some(Facing::Back));
    let mut has_front = classified.iter().any(|(_, _, f)| *f == Some(Facing::Front));

    classified
        .into_iter()
        .map(|(name, path, facing)| {
            let facing = facing.unwrap_or_else(|| {
                if !has_back {
                    has_back = true;
                    Facing::Back
                } else if !has_front {
                    has_front = true;
                    Facing::Front
                } else {
                    Facing::Back
                }
            });
            CameraDevice { name, path, facing }
        })
        .collect()
}

/// Camera for `facing`, falling back to any camera at all
pub fn select_camera(cameras: &[CameraDevice], facing: Facing) -> Option<&CameraDevice> {
    cameras
        .iter()
        .find(|c| c.facing == facing)
        .or_else(|| cameras.first())
}

/// Camera for `facing` from `known`, scanning again when nothing matches
///
/// A camera plugged in after the last scan is picked up here.
pub fn select_or_rescan(
    known: &mut Vec<CameraDevice>,
    facing: Facing,
    rescan: impl FnOnce() -> Vec<CameraDevice>,
) -> Option<CameraDevice> {
    if let Some(camera) = select_camera(known, facing) {
        return Some(camera.clone());
    }
    debug!(%facing, "No known camera, scanning devices again");
    *known = rescan();
    select_camera(known, facing).cloned()
}
