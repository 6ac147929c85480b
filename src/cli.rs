// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Taking a photo without the interactive screen
//! - Inspecting and requesting permissions
//! - Printing the effective configuration
//!
//! `photo` drives the same capture screen as the terminal UI, feeding each
//! task's result straight back into it.

use snapcam::app::{Alert, CaptureScreen, Message, Screen};
use snapcam::backends::camera::enumeration::{FacingOverrides, enumerate_cameras};
use snapcam::backends::camera::{Facing, open_capture_device};
use snapcam::backends::permissions::{
    self, Capability, DesktopPermissions, PermissionGateway,
};
use snapcam::config::{CaptureBackendType, Config};
use snapcam::constants::timing;
use snapcam::errors::{AppError, CaptureError, PermissionDenied};
use snapcam::storage::{MediaStore, PhotoLibrary};
use std::sync::Arc;
use std::time::Instant;

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// List all available cameras
pub fn list_cameras(config: &Config) -> CliResult {
    if config.backend == CaptureBackendType::File {
        if let Some(source) = &config.file_source {
            println!("File source: {}", source.display());
        }
        return Ok(());
    }

    let cameras = enumerate_cameras(&FacingOverrides {
        front: config.front_device.clone(),
        back: config.back_device.clone(),
    });

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for camera in &cameras {
        println!("  [{}] {}", camera.facing, camera.name);
        println!("      Device: {}", camera.path);
    }

    Ok(())
}

/// Take a photo and save it to the library
pub fn take_photo(config: &Config, facing: Facing, torch: bool, open: bool) -> CliResult {
    let device = open_capture_device(config)?;
    let gateway: Arc<dyn PermissionGateway> = Arc::new(DesktopPermissions::new(config));
    let store: Arc<dyn MediaStore> = Arc::new(PhotoLibrary::new(config.photo_library_dir()));

    runtime()?.block_on(async {
        let (mut screen, startup) = CaptureScreen::new(gateway, device, store);
        if let Some(message) = startup.run().await {
            drive(&mut screen, message).await;
        }

        let result = capture_and_save(&mut screen, facing, torch).await;
        screen.shutdown();
        let asset = result?;

        println!("{}", asset.path.display());
        if open {
            open::that_detached(&asset.path)?;
        }
        CliResult::Ok(())
    })
}

async fn capture_and_save(
    screen: &mut CaptureScreen,
    facing: Facing,
    torch: bool,
) -> Result<snapcam::storage::AssetHandle, AppError> {
    if let Screen::PermissionsDenied(permissions) = screen.screen() {
        let capability = permissions
            .missing()
            .first()
            .copied()
            .unwrap_or(Capability::Camera);
        return Err(PermissionDenied { capability }.into());
    }

    if screen.settings().facing != facing {
        // A failure to open the default camera does not matter here
        drive(screen, Message::DismissAlert).await;
        drive(screen, Message::ToggleFacing).await;
    }
    if torch {
        drive(screen, Message::ToggleTorch).await;
    }
    if let Some(Alert::CameraUnavailable(err)) = screen.alert() {
        return Err(err.clone().into());
    }

    println!("Capturing with {}...", screen.device().describe());
    let start = Instant::now();
    while !screen.can_capture() {
        if start.elapsed() > timing::FIRST_FRAME_TIMEOUT {
            return Err(CaptureError::NotReady.into());
        }
        tokio::time::sleep(timing::FRAME_POLL).await;
    }
    // Let auto-exposure settle
    tokio::time::sleep(timing::CAPTURE_WARMUP).await;

    drive(screen, Message::Capture).await;
    if let Some(Alert::CaptureFailed(err)) = screen.alert() {
        return Err(err.clone().into());
    }

    drive(screen, Message::Save).await;
    if let Some(asset) = screen.last_saved() {
        return Ok(asset.clone());
    }
    match screen.alert() {
        Some(Alert::SaveFailed(err)) => Err(err.clone().into()),
        _ => Err(AppError::Other("Photo was not saved".to_string())),
    }
}

/// Send `message` and run every follow-up task to completion
async fn drive(screen: &mut CaptureScreen, message: Message) {
    let mut task = screen.update(message);
    while let Some(next) = task.run().await {
        task = screen.update(next);
    }
}

/// Print (and optionally request) each permission
pub fn show_permissions(config: &Config, request: bool) -> CliResult {
    let gateway = DesktopPermissions::new(config);

    runtime()?.block_on(async {
        for capability in Capability::ALL {
            let state = if request {
                permissions::resolve(&gateway, capability).await
            } else {
                gateway.query(capability).await
            };
            println!("{:<14} {}", capability.to_string(), state);
        }
    });

    Ok(())
}

/// Print the effective configuration
pub fn print_config(config: &Config) -> CliResult {
    println!("{}", serde_json::to_string_pretty(config)?);
    println!();
    println!("Photo library: {}", config.photo_library_dir().display());
    println!("Capture cache: {}", config.capture_cache_dir().display());
    println!("Log file:      {}", config.log_dir().join("snapcam.log").display());
    Ok(())
}
