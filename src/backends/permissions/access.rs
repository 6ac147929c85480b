// SPDX-License-Identifier: GPL-3.0-only

//! Filesystem access checks for unsandboxed runs
//!
//! Without a portal, "permission" to use the camera is read/write access to
//! its `/dev/video*` node (usually via the `video` group), and permission to
//! use the media library is write access to the library folder.

use super::PermissionState;
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use tracing::debug;

/// `access(2)` for the real user, `false` on any error
fn access(path: &Path, mode: libc::c_int) -> bool {
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    let result = unsafe { libc::access(c_path.as_ptr(), mode) };
    result == 0
}

/// Whether the process can read and write a device node
pub fn device_accessible(path: &Path) -> bool {
    access(path, libc::R_OK | libc::W_OK)
}

/// Camera permission from device-node access
///
/// Granted when any capture node is usable, Denied when nodes exist but none
/// is, Unknown when there is no node at all.
pub fn camera_node_state<P: AsRef<Path>>(nodes: &[P]) -> PermissionState {
    if nodes.is_empty() {
        return PermissionState::Unknown;
    }
    if nodes.iter().any(|node| device_accessible(node.as_ref())) {
        PermissionState::Granted
    } else {
        debug!(count = nodes.len(), "No accessible video device node");
        PermissionState::Denied
    }
}

/// Media-library permission from folder write access
pub fn library_state(dir: &Path) -> PermissionState {
    if !dir.is_dir() {
        return PermissionState::Unknown;
    }
    if access(dir, libc::W_OK | libc::X_OK) {
        PermissionState::Granted
    } else {
        PermissionState::Denied
    }
}

/// `/dev/video*` nodes present on the system
pub fn video_nodes() -> Vec<std::path::PathBuf> {
    let mut nodes: Vec<_> = std::fs::read_dir("/dev")
        .into_iter()
        .flatten()
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("video"))
        })
        .collect();
    nodes.sort();
    nodes
}
