// SPDX-License-Identifier: MPL-2.0

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=SNAPCAM_VERSION");

    // Packagers (flatpak, distro builds) set the version explicitly
    let version = match std::env::var("SNAPCAM_VERSION") {
        Ok(v) if !v.is_empty() => v,
        _ => git_version().unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
    };

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// Version from `git describe`:
/// - "v0.1.0" at a tag becomes "0.1.0"
/// - "v0.1.0-5-gabcdef1" after a tag becomes "0.1.0-dirty-abcdef1"
fn git_version() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--match", "v*"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let described = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let described = described.strip_prefix('v').unwrap_or(&described);

    let parts: Vec<&str> = described.rsplitn(3, '-').collect();
    if parts.len() == 3 {
        let hash = parts[0].strip_prefix('g').unwrap_or(parts[0]);
        Some(format!("{}-dirty-{}", parts[2], hash))
    } else {
        Some(described.to_string())
    }
}
