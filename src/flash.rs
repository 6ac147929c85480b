// SPDX-License-Identifier: GPL-3.0-only

//! Torch control via Linux sysfs flash LEDs
//!
//! Discovers LEDs exposed at `/sys/class/leds/*:flash` and drives them in
//! torch mode through the `brightness` file, which is group-writable by
//! `feedbackd` on phones. The root-only `flash_strobe` interface is not used.

use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default sysfs LED class directory
pub const LEDS_DIR: &str = "/sys/class/leds";

/// A flash LED device discovered via sysfs
#[derive(Debug, Clone)]
pub struct FlashDevice {
    /// Sysfs path, e.g. `/sys/class/leds/white:flash`
    path: PathBuf,
    /// Maximum brightness value (from `max_brightness` file)
    max_brightness: u32,
    /// Directory basename
    name: String,
}

impl FlashDevice {
    /// Get the device name (e.g. "white:flash")
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set raw brightness value (0 = off, max_brightness = full)
    pub fn set_brightness(&self, value: u32) -> io::Result<()> {
        let clamped = value.min(self.max_brightness);
        std::fs::write(self.path.join("brightness"), clamped.to_string())
    }

    /// Turn off the LED
    pub fn off(&self) -> io::Result<()> {
        self.set_brightness(0)
    }

    /// Turn on at a fraction of max brightness (0.0 = off, 1.0 = full)
    pub fn torch(&self, intensity: f32) -> io::Result<()> {
        let clamped = intensity.clamp(0.0, 1.0);
        let value = (clamped * self.max_brightness as f32).round() as u32;
        self.set_brightness(value)
    }
}

/// Result of torch hardware detection.
///
/// Separates "hardware exists" from "we can control it" so the UI can tell
/// the user how to fix permissions instead of silently ignoring the toggle.
#[derive(Debug, Default)]
pub struct TorchHardware {
    /// Devices we can actually control (writable)
    pub devices: Vec<FlashDevice>,
    /// User-facing error if hardware was found but not writable
    pub permission_error: Option<String>,
}

impl TorchHardware {
    /// Scan the system LED directory
    pub fn detect() -> TorchHardware {
        Self::detect_in(Path::new(LEDS_DIR))
    }

    /// Scan `leds_dir` for `*:flash` entries
    pub fn detect_in(leds_dir: &Path) -> TorchHardware {
        let Ok(entries) = std::fs::read_dir(leds_dir) else {
            warn!(dir = %leds_dir.display(), "Cannot read LED directory, torch disabled");
            return TorchHardware::default();
        };

        let mut devices = Vec::new();
        let mut permission_failures: Vec<PathBuf> = Vec::new();

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name_str) = name.to_str() else {
                continue;
            };

            if !name_str.ends_with(":flash") {
                continue;
            }

            let led_path = entry.path();
            let brightness_path = led_path.join("brightness");
            let max_brightness_path = led_path.join("max_brightness");

            let max_brightness = match std::fs::read_to_string(&max_brightness_path) {
                Ok(s) => match s.trim().parse::<u32>() {
                    Ok(v) if v > 0 => v,
                    _ => {
                        warn!(
                            path = %max_brightness_path.display(),
                            "Invalid max_brightness value"
                        );
                        continue;
                    }
                },
                Err(e) => {
                    warn!(
                        path = %max_brightness_path.display(),
                        error = %e,
                        "Cannot read max_brightness"
                    );
                    continue;
                }
            };

            match std::fs::OpenOptions::new()
                .write(true)
                .open(&brightness_path)
            {
                Ok(_) => {
                    info!(name = name_str, max_brightness, "Discovered flash LED");
                    devices.push(FlashDevice {
                        path: led_path,
                        max_brightness,
                        name: name_str.to_string(),
                    });
                }
                Err(_) => {
                    warn!(
                        path = %brightness_path.display(),
                        "Flash LED found but not writable"
                    );
                    permission_failures.push(brightness_path);
                }
            }
        }

        // Deterministic order (white before yellow)
        devices.sort_by(|a, b| a.name.cmp(&b.name));

        let permission_error = if !permission_failures.is_empty() && devices.is_empty() {
            Some(build_permission_error(&permission_failures))
        } else {
            None
        };

        TorchHardware {
            devices,
            permission_error,
        }
    }

    /// Whether any controllable LED was found
    pub fn has_devices(&self) -> bool {
        !self.devices.is_empty()
    }

    /// Switch every LED on (at `intensity`) or off
    pub fn set(&self, enabled: bool, intensity: f32) {
        for dev in &self.devices {
            let result = if enabled {
                dev.torch(intensity)
            } else {
                dev.off()
            };
            if let Err(e) = result {
                warn!(device = %dev.name, enabled, error = %e, "Failed to switch torch LED");
            }
        }
    }
}

/// Build a message naming the group the user must join.
///
/// The group is resolved from the brightness file's owner GID, and the
/// privilege tool from what is installed.
fn build_permission_error(failures: &[PathBuf]) -> String {
    let username = std::env::var("USER").unwrap_or_else(|_| "user".to_string());

    let escalation_tool = if Path::new("/usr/bin/doas").exists() {
        "doas"
    } else {
        "sudo"
    };

    let group = failures
        .first()
        .and_then(|path| {
            let gid = std::fs::metadata(path).ok()?.gid();
            let group_contents = std::fs::read_to_string("/etc/group").ok()?;
            group_contents.lines().find_map(|line| {
                let parts: Vec<&str> = line.split(':').collect();
                (parts.len() >= 3 && parts[2].parse::<u32>().ok() == Some(gid))
                    .then(|| parts[0].to_string())
            })
        })
        .unwrap_or_else(|| "feedbackd".to_string());

    format!(
        "Torch LEDs detected but cannot be controlled.\n\n\
         Run: {escalation_tool} adduser {username} {group}\n\n\
         Then log out and back in."
    )
}
