// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the capture screen state machine

mod common;

use common::{Harness, MockGateway};
use snapcam::app::{Alert, Message, SaveStatus, Screen, UiMode};
use snapcam::backends::camera::Facing;
use snapcam::backends::permissions::{Capability, PermissionState, Permissions};
use snapcam::errors::{CaptureError, SaveError};
use snapcam::storage::MediaStore;
use std::sync::atomic::Ordering;

const STATES: [PermissionState; 3] = [
    PermissionState::Unknown,
    PermissionState::Denied,
    PermissionState::Granted,
];

fn permissions(camera: PermissionState, media: PermissionState) -> Permissions {
    Permissions { camera, media }
}

async fn live() -> Harness {
    let harness = Harness::start(MockGateway::granted()).await;
    assert_eq!(harness.screen.mode(), Some(UiMode::Live));
    harness
}

async fn preview() -> Harness {
    let mut harness = live().await;
    harness.send(Message::Capture).await;
    assert_eq!(harness.screen.mode(), Some(UiMode::Preview));
    harness
}

// =============================================================================
// Permissions
// =============================================================================

#[tokio::test]
async fn test_live_iff_both_permissions_granted() {
    for camera_query in STATES {
        for camera_request in STATES {
            for media_query in STATES {
                for media_request in STATES {
                    let gateway = MockGateway::new(
                        permissions(camera_query, media_query),
                        permissions(camera_request, media_request),
                    );
                    let harness = Harness::start(gateway).await;

                    let camera = camera_query.is_granted() || camera_request.is_granted();
                    let media = media_query.is_granted() || media_request.is_granted();

                    if camera && media {
                        assert_eq!(harness.screen.mode(), Some(UiMode::Live));
                    } else {
                        assert!(
                            matches!(harness.screen.screen(), Screen::PermissionsDenied(_)),
                            "camera {:?}/{:?} media {:?}/{:?} should block",
                            camera_query,
                            camera_request,
                            media_query,
                            media_request
                        );
                        assert_eq!(harness.screen.mode(), None);
                        assert_eq!(harness.device.configure_count(), 0);
                    }
                }
            }
        }
    }
}

#[tokio::test]
async fn test_granted_permissions_are_not_requested() {
    let harness = Harness::start(MockGateway::granted()).await;
    assert!(harness.gateway.requested().is_empty());
}

#[tokio::test]
async fn test_pending_answer_settles_to_denied() {
    let gateway = MockGateway::new(
        permissions(PermissionState::Granted, PermissionState::Unknown),
        permissions(PermissionState::Granted, PermissionState::Unknown),
    );
    let harness = Harness::start(gateway).await;
    match harness.screen.screen() {
        Screen::PermissionsDenied(p) => assert_eq!(p.media, PermissionState::Denied),
        other => panic!("expected permission message, got {:?}", other),
    }
}

#[tokio::test]
async fn test_awaiting_permissions_before_resolution() {
    let (harness, startup) = Harness::build(MockGateway::granted());
    assert!(matches!(harness.screen.screen(), Screen::AwaitingPermissions));
    assert!(!startup.is_none());
}

#[tokio::test]
async fn test_denied_camera_then_regrant_reaches_live() {
    let gateway = MockGateway::new(
        permissions(PermissionState::Unknown, PermissionState::Granted),
        permissions(PermissionState::Denied, PermissionState::Granted),
    );
    let mut harness = Harness::start(gateway).await;
    assert!(matches!(harness.screen.screen(), Screen::PermissionsDenied(_)));

    harness
        .gateway
        .answer_requests(Capability::Camera, PermissionState::Granted);
    harness.send(Message::RequestPermissions).await;

    assert_eq!(harness.screen.mode(), Some(UiMode::Live));
    assert_eq!(harness.device.configure_count(), 1);
    assert_eq!(
        harness.gateway.requested(),
        vec![Capability::Camera, Capability::Camera]
    );
}

#[tokio::test]
async fn test_denied_media_is_re_requested_too() {
    let gateway = MockGateway::new(
        permissions(PermissionState::Granted, PermissionState::Unknown),
        permissions(PermissionState::Granted, PermissionState::Denied),
    );
    let mut harness = Harness::start(gateway).await;
    assert!(matches!(harness.screen.screen(), Screen::PermissionsDenied(_)));

    harness
        .gateway
        .answer_requests(Capability::MediaLibrary, PermissionState::Granted);
    harness.send(Message::RequestPermissions).await;

    assert_eq!(harness.screen.mode(), Some(UiMode::Live));
    assert_eq!(
        harness.gateway.requested(),
        vec![Capability::MediaLibrary, Capability::MediaLibrary]
    );
}

#[tokio::test]
async fn test_request_permissions_outside_denied_is_noop() {
    let mut harness = live().await;
    let task = harness.screen.update(Message::RequestPermissions);
    assert!(task.is_none());
    assert_eq!(harness.screen.mode(), Some(UiMode::Live));
}

// =============================================================================
// Capture
// =============================================================================

#[tokio::test]
async fn test_capture_success_enters_preview() {
    let harness = preview().await;

    assert!(harness.screen.has_captured_image());
    assert_eq!(harness.screen.save_status(), Some(SaveStatus::Idle));
    assert!(harness.screen.display_frame().is_some());
    assert_eq!(harness.device.stops.load(Ordering::SeqCst), 1);
    assert_eq!(harness.transient_files(), 1);
}

#[tokio::test]
async fn test_capture_failure_stays_live() {
    let mut harness = live().await;
    harness.device.fail_next_capture(CaptureError::Busy);

    harness.send(Message::Capture).await;

    assert_eq!(harness.screen.mode(), Some(UiMode::Live));
    assert!(!harness.screen.has_captured_image());
    assert!(!harness.screen.is_busy());
    assert_eq!(
        harness.screen.alert(),
        Some(&Alert::CaptureFailed(CaptureError::Busy))
    );

    // The user can try again
    harness.send(Message::DismissAlert).await;
    assert!(harness.screen.alert().is_none());
    harness.send(Message::Capture).await;
    assert_eq!(harness.screen.mode(), Some(UiMode::Preview));
}

#[tokio::test]
async fn test_capture_is_inert_until_device_ready() {
    let mut harness = live().await;
    harness.device.ready.store(false, Ordering::SeqCst);

    assert!(!harness.screen.can_capture());
    let task = harness.screen.update(Message::Capture);
    assert!(task.is_none());
    assert_eq!(harness.device.captures.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_actions_inert_while_capturing() {
    let mut harness = live().await;

    let capture = harness.screen.update(Message::Capture);
    assert!(harness.screen.is_busy());
    assert!(harness.screen.update(Message::Capture).is_none());
    assert!(harness.screen.update(Message::ToggleFacing).is_none());
    assert_eq!(harness.screen.settings().facing, Facing::Back);

    let finished = capture.run().await.unwrap();
    harness.screen.update(finished);
    assert_eq!(harness.screen.mode(), Some(UiMode::Preview));
    assert_eq!(harness.device.captures.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Retake
// =============================================================================

#[tokio::test]
async fn test_retake_returns_to_live_and_discards_image() {
    let mut harness = preview().await;

    harness.send(Message::Retake).await;

    assert_eq!(harness.screen.mode(), Some(UiMode::Live));
    assert!(!harness.screen.has_captured_image());
    assert_eq!(harness.transient_files(), 0);
    // Initial start plus restart after retake
    assert_eq!(harness.device.configure_count(), 2);

    // Second press is a no-op
    let task = harness.screen.update(Message::Retake);
    assert!(task.is_none());
    assert_eq!(harness.screen.mode(), Some(UiMode::Live));
    assert_eq!(harness.device.configure_count(), 2);
}

// =============================================================================
// Save
// =============================================================================

#[tokio::test]
async fn test_save_success_stores_asset_and_returns_live() {
    let mut harness = preview().await;

    harness.send(Message::Save).await;

    assert_eq!(harness.screen.mode(), Some(UiMode::Live));
    assert_eq!(harness.store.save_count(), 1);
    assert_eq!(harness.transient_files(), 0);

    let saved = match harness.screen.alert() {
        Some(Alert::SaveSucceeded(asset)) => asset.clone(),
        other => panic!("expected success alert, got {:?}", other),
    };
    assert!(saved.path.exists());
    assert_eq!(harness.screen.last_saved(), Some(&saved));

    let assets = harness.store.assets().await;
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].path, saved.path);
}

#[tokio::test]
async fn test_save_failure_keeps_image_for_retry() {
    let mut harness = preview().await;
    harness
        .store
        .fail_next_save(SaveError::PermissionDenied("read-only".into()));

    harness.send(Message::Save).await;

    assert_eq!(harness.screen.mode(), Some(UiMode::Preview));
    assert_eq!(harness.screen.save_status(), Some(SaveStatus::Idle));
    assert!(matches!(harness.screen.alert(), Some(Alert::SaveFailed(_))));
    assert_eq!(harness.transient_files(), 1);

    harness.send(Message::DismissAlert).await;
    harness.send(Message::Save).await;

    assert_eq!(harness.screen.mode(), Some(UiMode::Live));
    assert_eq!(harness.store.save_count(), 2);
    assert_eq!(harness.store.assets().await.len(), 1);
}

#[tokio::test]
async fn test_save_while_in_flight_is_noop() {
    let mut harness = preview().await;

    let save = harness.screen.update(Message::Save);
    assert_eq!(harness.screen.save_status(), Some(SaveStatus::InFlight));
    assert!(harness.screen.has_captured_image());

    assert!(harness.screen.update(Message::Save).is_none());
    assert!(harness.screen.update(Message::Retake).is_none());
    assert_eq!(harness.screen.mode(), Some(UiMode::Preview));

    let finished = save.run().await.unwrap();
    harness.screen.update(finished);

    assert_eq!(harness.store.save_count(), 1);
    assert_eq!(harness.store.assets().await.len(), 1);
    assert_eq!(harness.screen.mode(), Some(UiMode::Live));
}

// =============================================================================
// Settings
// =============================================================================

#[tokio::test]
async fn test_toggles_reconfigure_live_feed() {
    let mut harness = live().await;

    harness.send(Message::ToggleFacing).await;
    harness.send(Message::ToggleTorch).await;

    let settings = harness.screen.settings();
    assert_eq!(settings.facing, Facing::Front);
    assert!(settings.torch_enabled);
    assert_eq!(harness.device.last_settings(), Some(settings));
    assert_eq!(harness.screen.mode(), Some(UiMode::Live));
}

#[tokio::test]
async fn test_toggles_ignored_in_preview() {
    let mut harness = preview().await;
    let before = harness.device.configure_count();

    harness.send(Message::ToggleFacing).await;
    harness.send(Message::ToggleTorch).await;

    assert_eq!(harness.screen.settings().facing, Facing::Back);
    assert!(!harness.screen.settings().torch_enabled);
    assert_eq!(harness.device.configure_count(), before);
    assert_eq!(harness.screen.mode(), Some(UiMode::Preview));
}

#[tokio::test]
async fn test_settings_survive_preview_round_trip() {
    let mut harness = live().await;
    harness.send(Message::ToggleFacing).await;
    harness.send(Message::Capture).await;
    harness.send(Message::Retake).await;

    assert_eq!(harness.device.last_settings().unwrap().facing, Facing::Front);
}

#[tokio::test]
async fn test_camera_start_failure_shows_alert() {
    let (mut harness, startup) = Harness::build(MockGateway::granted());
    *harness.device.configure_error.lock().unwrap() =
        Some(CaptureError::DeviceNotFound("no V4L2 camera found".into()));

    let resolved = startup.run().await.unwrap();
    harness.send(resolved).await;

    assert_eq!(harness.screen.mode(), Some(UiMode::Live));
    assert!(!harness.screen.is_busy());
    assert!(matches!(
        harness.screen.alert(),
        Some(Alert::CameraUnavailable(CaptureError::DeviceNotFound(_)))
    ));
}

#[tokio::test]
async fn test_camera_starts_in_background() {
    let (mut harness, startup) = Harness::build(MockGateway::granted());
    let resolved = startup.run().await.unwrap();

    let mount = harness.screen.update(resolved);
    assert!(!mount.is_none());
    assert_eq!(harness.screen.mode(), Some(UiMode::Live));
    assert_eq!(harness.device.configure_count(), 0);
    assert!(harness.screen.is_busy());
    assert!(!harness.screen.can_capture());

    // Nothing else is accepted until the camera is up
    assert!(harness.screen.update(Message::ToggleFacing).is_none());
    assert!(harness.screen.update(Message::Capture).is_none());

    let configured = mount.run().await.unwrap();
    assert!(matches!(configured, Message::DeviceConfigured(Ok(()))));
    assert_eq!(harness.device.configure_count(), 1);
    harness.screen.update(configured);

    assert!(!harness.screen.is_busy());
    assert!(harness.screen.can_capture());
    assert_eq!(harness.screen.settings().facing, Facing::Back);
}

#[tokio::test]
async fn test_save_confirmation_survives_camera_restart_failure() {
    let mut harness = preview().await;
    *harness.device.configure_error.lock().unwrap() =
        Some(CaptureError::DeviceNotFound("camera unplugged".into()));

    harness.send(Message::Save).await;

    assert_eq!(harness.screen.mode(), Some(UiMode::Live));
    assert!(matches!(harness.screen.alert(), Some(Alert::SaveSucceeded(_))));
    assert!(harness.screen.last_saved().is_some());
    assert_eq!(harness.store.assets().await.len(), 1);
    assert!(!harness.screen.is_busy());
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_scenario_grant_capture_save() {
    let gateway = MockGateway::new(
        Permissions::default(),
        permissions(PermissionState::Granted, PermissionState::Granted),
    );
    let mut harness = Harness::start(gateway).await;
    assert_eq!(harness.screen.mode(), Some(UiMode::Live));

    harness.send(Message::Capture).await;
    assert_eq!(harness.screen.mode(), Some(UiMode::Preview));
    let captured = harness.screen.display_frame().unwrap();
    assert_eq!((captured.width, captured.height), (2, 2));

    harness.send(Message::Save).await;
    assert_eq!(harness.store.save_count(), 1);
    assert!(matches!(harness.screen.alert(), Some(Alert::SaveSucceeded(_))));
    assert_eq!(harness.screen.mode(), Some(UiMode::Live));
}

#[tokio::test]
async fn test_scenario_capture_throws() {
    let mut harness = live().await;
    harness
        .device
        .fail_next_capture(CaptureError::Backend("sensor timeout".into()));

    harness.send(Message::Capture).await;

    assert!(harness.screen.alert().is_some());
    assert_eq!(harness.screen.mode(), Some(UiMode::Live));
    assert!(!harness.screen.has_captured_image());
    assert_eq!(harness.transient_files(), 0);
}

#[tokio::test]
async fn test_stale_results_are_ignored() {
    let mut harness = live().await;
    let failure = Err(CaptureError::Busy);
    assert!(harness.screen.update(Message::CaptureFinished(failure)).is_none());
    assert!(harness.screen.alert().is_none());

    let resolved = Message::PermissionsResolved(Permissions::default());
    harness.screen.update(resolved);
    assert_eq!(harness.screen.mode(), Some(UiMode::Live));
}
