// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Folder inside the user's Pictures directory that holds saved photos
pub const DEFAULT_SAVE_FOLDER: &str = "Camera";

/// Application directory name under the XDG cache/state directories
pub const APP_DIR_NAME: &str = "snapcam";

/// Prefix of saved photo file names (`IMG_20250101_120000.jpg`)
pub const PHOTO_FILE_PREFIX: &str = "IMG";

/// Prefix of transient capture files in the cache directory
pub const CAPTURE_FILE_PREFIX: &str = "capture";

/// UI timing
pub mod timing {
    use super::Duration;

    /// Input poll interval of the terminal loop (~60 fps)
    pub const FRAME_POLL: Duration = Duration::from_millis(16);

    /// How long the headless `photo` command waits for the first frame
    pub const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);

    /// Warm-up before a headless capture so auto-exposure settles
    pub const CAPTURE_WARMUP: Duration = Duration::from_millis(500);

    /// Portal permission dialogs wait on the user; give up eventually
    pub const PORTAL_RESPONSE_TIMEOUT: Duration = Duration::from_secs(120);
}

/// GStreamer pipeline tuning
pub mod pipeline {
    /// Appsink buffer count; old frames are dropped beyond this
    pub const MAX_BUFFERS: u32 = 2;

    /// Name of the appsink element inside the pipeline description
    pub const SINK_NAME: &str = "sink";

    /// Time allowed for the pipeline to reach PLAYING
    pub const STATE_CHANGE_TIMEOUT_SECS: u64 = 5;
}

/// Supported still-image formats for the file-source camera
pub mod file_formats {
    /// Image extensions the file source can decode
    pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "gif"];

    /// Check if an extension (without dot, any case) is a supported image
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(ext))
    }
}

/// Device-name keywords used to guess which way a camera faces
pub mod facing_hints {
    /// Cameras whose names contain one of these face the user
    pub const FRONT: &[&str] = &["front", "user", "selfie", "integrated", "facetime", "webcam"];

    /// Cameras whose names contain one of these face away from the user
    pub const BACK: &[&str] = &["back", "rear", "world", "environment", "main"];
}
