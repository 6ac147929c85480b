// SPDX-License-Identifier: GPL-3.0-only

//! Camera access through xdg-desktop-portal
//!
//! Sandboxed apps must ask `org.freedesktop.portal.Camera` for access; the
//! portal shows its own dialog and answers on a `Request` object whose path
//! is derived from our bus name and a handle token.

use crate::constants::timing;
use futures::StreamExt;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

const PORTAL_BUS_NAME: &str = "org.freedesktop.portal.Desktop";
const PORTAL_OBJECT_PATH: &str = "/org/freedesktop/portal/desktop";
const CAMERA_INTERFACE: &str = "org.freedesktop.portal.Camera";
const REQUEST_INTERFACE: &str = "org.freedesktop.portal.Request";

/// Running inside a Flatpak sandbox
pub fn is_sandboxed() -> bool {
    Path::new("/.flatpak-info").exists()
}

/// Object path of the `Request` the portal will create for `token`
///
/// The unique name `:1.42` becomes `1_42`.
pub fn request_path(unique_name: &str, token: &str) -> String {
    let sender = unique_name.trim_start_matches(':').replace('.', "_");
    format!("{}/request/{}/{}", PORTAL_OBJECT_PATH, sender, token)
}

/// Ask the portal for camera access
///
/// `Ok(true)` when granted, `Ok(false)` when the user (or policy) refused,
/// `Err` when the portal could not be reached at all.
pub async fn access_camera() -> Result<bool, String> {
    let connection = zbus::Connection::session()
        .await
        .map_err(|e| format!("Failed to connect to session D-Bus: {}", e))?;

    let camera = zbus::Proxy::new(&connection, PORTAL_BUS_NAME, PORTAL_OBJECT_PATH, CAMERA_INTERFACE)
        .await
        .map_err(|e| format!("Failed to create camera portal proxy: {}", e))?;

    match camera.get_property::<bool>("IsCameraPresent").await {
        Ok(false) => info!("Camera portal reports no camera present"),
        Ok(true) => {}
        Err(e) => return Err(format!("Camera portal unavailable: {}", e)),
    }

    let unique_name = connection
        .unique_name()
        .map(|name| name.to_string())
        .ok_or_else(|| "Session bus connection has no unique name".to_string())?;
    let token = format!("snapcam_{}", uuid::Uuid::new_v4().simple());
    let path = request_path(&unique_name, &token);

    // Subscribe before calling so a fast answer is not missed
    let request = zbus::Proxy::new(&connection, PORTAL_BUS_NAME, path.as_str(), REQUEST_INTERFACE)
        .await
        .map_err(|e| format!("Failed to create request proxy: {}", e))?;
    let mut responses = request
        .receive_signal("Response")
        .await
        .map_err(|e| format!("Failed to subscribe to portal response: {}", e))?;

    let mut options: HashMap<&str, Value> = HashMap::new();
    options.insert("handle_token", Value::new(token.as_str()));

    let handle: OwnedObjectPath = camera
        .call("AccessCamera", &(options,))
        .await
        .map_err(|e| format!("AccessCamera failed: {}", e))?;
    debug!(handle = %handle, expected = %path, "Camera access requested");

    let message = tokio::time::timeout(timing::PORTAL_RESPONSE_TIMEOUT, responses.next())
        .await
        .map_err(|_| "Timed out waiting for the camera portal".to_string())?
        .ok_or_else(|| "Camera portal closed the request".to_string())?;

    let (response, _results): (u32, HashMap<String, OwnedValue>) = message
        .body()
        .deserialize()
        .map_err(|e| format!("Malformed portal response: {}", e))?;

    match response {
        0 => {
            info!("Camera portal granted access");
            Ok(true)
        }
        code => {
            warn!(code, "Camera portal refused access");
            Ok(false)
        }
    }
}
