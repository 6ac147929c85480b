// SPDX-License-Identifier: MPL-2.0

//! Test doubles for the capture screen's services

#![allow(dead_code)]

use futures::future::BoxFuture;
use snapcam::app::{CaptureScreen, Message, Task};
use snapcam::backends::camera::{
    CameraFrame, CaptureDevice, CaptureSettings, CapturedImageRef,
};
use snapcam::backends::permissions::{
    Capability, PermissionGateway, PermissionState, Permissions,
};
use snapcam::errors::{CaptureError, CaptureResult, SaveError, SaveFailure};
use snapcam::storage::{AssetHandle, MediaStore, PhotoLibrary};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Gateway answering queries and requests from fixed tables
#[derive(Default)]
pub struct MockGateway {
    pub query_answers: Mutex<Permissions>,
    pub request_answers: Mutex<Permissions>,
    pub requested: Mutex<Vec<Capability>>,
}

impl MockGateway {
    pub fn new(query: Permissions, request: Permissions) -> Self {
        Self {
            query_answers: Mutex::new(query),
            request_answers: Mutex::new(request),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Everything already granted, no prompt needed
    pub fn granted() -> Self {
        let all = Permissions {
            camera: PermissionState::Granted,
            media: PermissionState::Granted,
        };
        Self::new(all, all)
    }

    pub fn answer_requests(&self, capability: Capability, state: PermissionState) {
        self.request_answers.lock().unwrap().set(capability, state);
    }

    pub fn requested(&self) -> Vec<Capability> {
        self.requested.lock().unwrap().clone()
    }
}

impl PermissionGateway for MockGateway {
    fn query(&self, capability: Capability) -> BoxFuture<'_, PermissionState> {
        Box::pin(async move { self.query_answers.lock().unwrap().get(capability) })
    }

    fn request(&self, capability: Capability) -> BoxFuture<'_, PermissionState> {
        Box::pin(async move {
            self.requested.lock().unwrap().push(capability);
            self.request_answers.lock().unwrap().get(capability)
        })
    }
}

/// Camera that writes a tiny file per capture
pub struct MockDevice {
    dir: PathBuf,
    pub ready: AtomicBool,
    pub configured: Mutex<Vec<CaptureSettings>>,
    pub stops: AtomicUsize,
    pub captures: AtomicUsize,
    pub capture_error: Mutex<Option<CaptureError>>,
    pub configure_error: Mutex<Option<CaptureError>>,
}

impl MockDevice {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            ready: AtomicBool::new(true),
            configured: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
            captures: AtomicUsize::new(0),
            capture_error: Mutex::new(None),
            configure_error: Mutex::new(None),
        }
    }

    pub fn fail_next_capture(&self, error: CaptureError) {
        *self.capture_error.lock().unwrap() = Some(error);
    }

    pub fn last_settings(&self) -> Option<CaptureSettings> {
        self.configured.lock().unwrap().last().copied()
    }

    pub fn configure_count(&self) -> usize {
        self.configured.lock().unwrap().len()
    }

    fn frame() -> Arc<CameraFrame> {
        Arc::new(CameraFrame::from_rgba(2, 2, vec![128; 16]).unwrap())
    }
}

impl CaptureDevice for MockDevice {
    fn configure(&self, settings: &CaptureSettings) -> CaptureResult<()> {
        self.configured.lock().unwrap().push(*settings);
        match self.configure_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn latest_frame(&self) -> Option<Arc<CameraFrame>> {
        self.is_ready().then(Self::frame)
    }

    fn capture(&self) -> BoxFuture<'_, CaptureResult<CapturedImageRef>> {
        Box::pin(async move {
            if let Some(err) = self.capture_error.lock().unwrap().take() {
                return Err(err);
            }
            let n = self.captures.fetch_add(1, Ordering::SeqCst);
            let path = self.dir.join(format!("capture_{}.jpg", n));
            std::fs::write(&path, b"\xFF\xD8mock")?;
            Ok(CapturedImageRef::new(path, Self::frame()))
        })
    }

    fn describe(&self) -> String {
        "mock camera".to_string()
    }
}

/// Real photo library that counts calls and can be told to fail
pub struct CountingStore {
    pub library: PhotoLibrary,
    pub saves: AtomicUsize,
    pub save_error: Mutex<Option<SaveError>>,
}

impl CountingStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            library: PhotoLibrary::new(root),
            saves: AtomicUsize::new(0),
            save_error: Mutex::new(None),
        }
    }

    pub fn fail_next_save(&self, error: SaveError) {
        *self.save_error.lock().unwrap() = Some(error);
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl MediaStore for CountingStore {
    fn save(&self, image: CapturedImageRef) -> BoxFuture<'_, Result<AssetHandle, SaveFailure>> {
        Box::pin(async move {
            self.saves.fetch_add(1, Ordering::SeqCst);
            let injected = self.save_error.lock().unwrap().take();
            if let Some(error) = injected {
                return Err(SaveFailure { error, image });
            }
            self.library.save(image).await
        })
    }

    fn assets(&self) -> BoxFuture<'_, Vec<AssetHandle>> {
        self.library.assets()
    }
}

/// A capture screen wired to test doubles in a temporary directory
pub struct Harness {
    pub screen: CaptureScreen,
    pub gateway: Arc<MockGateway>,
    pub device: Arc<MockDevice>,
    pub store: Arc<CountingStore>,
    pub dir: TempDir,
}

impl Harness {
    /// Build the screen and run its startup permission check
    pub async fn start(gateway: MockGateway) -> Self {
        let (mut harness, startup) = Self::build(gateway);
        if let Some(message) = startup.run().await {
            harness.send(message).await;
        }
        harness
    }

    /// Build the screen without running anything
    pub fn build(gateway: MockGateway) -> (Self, Task) {
        let dir = tempfile::tempdir().unwrap();
        let captures = dir.path().join("captures");
        std::fs::create_dir_all(&captures).unwrap();

        let gateway = Arc::new(gateway);
        let device = Arc::new(MockDevice::new(&captures));
        let store = Arc::new(CountingStore::new(dir.path().join("Camera")));
        let (screen, startup) = CaptureScreen::new(gateway.clone(), device.clone(), store.clone());

        (
            Self {
                screen,
                gateway,
                device,
                store,
                dir,
            },
            startup,
        )
    }

    /// Send a message and run every follow-up task to completion
    pub async fn send(&mut self, message: Message) {
        let mut task = self.screen.update(message);
        while let Some(next) = task.run().await {
            task = self.screen.update(next);
        }
    }

    /// Files left in the capture directory
    pub fn transient_files(&self) -> usize {
        std::fs::read_dir(self.dir.path().join("captures"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}
