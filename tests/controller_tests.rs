// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the capture controller state machine

use futures::future::BoxFuture;
use snapcam::app::{self, CaptureController, DeviceSelection, Message, SessionPhase, Transition};
use snapcam::backends::camera::{
    BackendError, BackendOptions, BackendResult, CameraBackend, CameraBackendManager,
    CameraBackendType, CameraDevice, CameraFormat, FrameReceiver, PhotoReceiver,
};
use snapcam::backends::permission::{
    AuthorizationStatus, CameraPermission, DevicePermission, StaticPermission,
};
use snapcam::backends::virtual_camera::VirtualBackend;
use snapcam::errors::{CaptureErrorKind, PhotoError};
use snapcam::storage::{DirectoryLibrary, PhotoLibrary};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("snapcam-controller-{}", uuid::Uuid::new_v4()))
}

fn virtual_manager() -> CameraBackendManager {
    CameraBackendManager::new(CameraBackendType::Virtual, &BackendOptions::default())
}

fn controller_with(
    manager: CameraBackendManager,
    permission: impl CameraPermission + 'static,
    library: Arc<dyn PhotoLibrary>,
) -> CaptureController {
    CaptureController::new(
        manager,
        Arc::new(permission),
        library,
        DeviceSelection::default(),
    )
}

fn granted(dir: &Path) -> CaptureController {
    controller_with(
        virtual_manager(),
        StaticPermission::granted(),
        Arc::new(DirectoryLibrary::new(dir)),
    )
}

/// Virtual camera with injectable faults
struct FaultyCamera {
    inner: VirtualBackend,
    jammed_shutter: bool,
    /// Starts allowed before `start` fails
    start_budget: usize,
}

impl FaultyCamera {
    fn new() -> Self {
        Self {
            inner: VirtualBackend::new(&BackendOptions::default()),
            jammed_shutter: false,
            start_budget: usize::MAX,
        }
    }

    fn into_manager(self) -> CameraBackendManager {
        CameraBackendManager::with_backend(Box::new(self))
    }
}

impl CameraBackend for FaultyCamera {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        self.inner.enumerate_cameras()
    }
    fn get_formats(&self, device: &CameraDevice) -> Vec<CameraFormat> {
        self.inner.get_formats(device)
    }
    fn configure(&mut self, device: &CameraDevice, format: &CameraFormat) -> BackendResult<()> {
        self.inner.configure(device, format)
    }
    fn is_configured(&self) -> bool {
        self.inner.is_configured()
    }
    fn start(&mut self) -> BackendResult<()> {
        if self.start_budget == 0 {
            return Err(BackendError::InitializationFailed("device unplugged".to_string()));
        }
        self.start_budget -= 1;
        self.inner.start()
    }
    fn stop(&mut self) -> BackendResult<()> {
        self.inner.stop()
    }
    fn is_running(&self) -> bool {
        self.inner.is_running()
    }
    fn capture_photo(&mut self) -> PhotoReceiver {
        if !self.jammed_shutter {
            return self.inner.capture_photo();
        }
        let (sender, receiver) = oneshot::channel();
        let _ = sender.send(Err(BackendError::CaptureFailed("shutter jammed".to_string())));
        receiver
    }
    fn preview_receiver(&self) -> FrameReceiver {
        self.inner.preview_receiver()
    }
    fn backend_type(&self) -> CameraBackendType {
        self.inner.backend_type()
    }
    fn is_available(&self) -> bool {
        true
    }
    fn current_device(&self) -> Option<&CameraDevice> {
        self.inner.current_device()
    }
    fn current_format(&self) -> Option<&CameraFormat> {
        self.inner.current_format()
    }
}

/// Library that refuses every write
struct ReadOnlyLibrary;

impl PhotoLibrary for ReadOnlyLibrary {
    fn save(&self, _data: Arc<[u8]>) -> BoxFuture<'_, Result<PathBuf, PhotoError>> {
        Box::pin(async { Err(PhotoError::SaveFailed("read-only".to_string())) })
    }
}

#[tokio::test]
async fn test_granted_flow_saves_photo() {
    let dir = temp_dir();
    let mut controller = granted(&dir);

    assert_eq!(controller.authorize().await.unwrap(), Transition::Applied);
    assert_eq!(controller.state().phase(), SessionPhase::Configured);

    assert_eq!(controller.start().await.unwrap(), Transition::Applied);
    assert!(controller.state().is_running);

    assert_eq!(controller.capture().await.unwrap(), Transition::Applied);
    let state = controller.state();
    assert!(state.is_taken);
    assert!(!state.is_running);
    assert!(!state.pending_image.is_empty());
    // JPEG SOI marker
    assert_eq!(&state.pending_image[..2], &[0xFF, 0xD8]);

    assert_eq!(controller.save().await.unwrap(), Transition::Applied);
    let state = controller.state();
    assert!(state.is_taken && state.is_saved);
    let path = state.saved_path.clone().expect("saved path");
    assert_eq!(std::fs::read(&path).unwrap(), state.pending_image.to_vec());

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_save_twice_is_idempotent() {
    let dir = temp_dir();
    let mut controller = granted(&dir);
    controller.authorize().await.unwrap();
    controller.start().await.unwrap();
    controller.capture().await.unwrap();

    controller.save().await.unwrap();
    let after_first = controller.state().clone();
    assert_eq!(controller.save().await.unwrap(), Transition::Ignored);
    assert_eq!(controller.state(), &after_first);
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_denied_raises_alert() {
    let mut controller = controller_with(
        virtual_manager(),
        StaticPermission::denied(),
        Arc::new(ReadOnlyLibrary),
    );

    let err = controller.authorize().await.unwrap_err();
    assert_eq!(err.kind, CaptureErrorKind::AuthorizationDenied);

    let state = controller.state();
    assert!(state.alert);
    assert!(!state.is_configured);
    assert_eq!(state.phase(), SessionPhase::Denied);

    // Denial is terminal for the session
    assert_eq!(controller.authorize().await.unwrap(), Transition::Ignored);
    assert_eq!(controller.start().await.unwrap(), Transition::Ignored);
    assert!(!controller.state().is_running);
}

#[tokio::test]
async fn test_prompt_answers() {
    let mut refused = controller_with(
        virtual_manager(),
        StaticPermission::prompt(false),
        Arc::new(ReadOnlyLibrary),
    );
    assert!(refused.authorize().await.is_err());
    assert!(refused.state().alert);
    assert!(!refused.state().requesting_access);

    let mut accepted = controller_with(
        virtual_manager(),
        StaticPermission::prompt(true),
        Arc::new(ReadOnlyLibrary),
    );
    assert_eq!(accepted.authorize().await.unwrap(), Transition::Applied);
    assert!(accepted.state().is_configured);
    assert!(!accepted.state().alert);
}

#[tokio::test]
async fn test_retake_resumes_preview() {
    let dir = temp_dir();
    let mut controller = granted(&dir);
    controller.authorize().await.unwrap();
    controller.start().await.unwrap();
    controller.capture().await.unwrap();
    controller.save().await.unwrap();

    assert_eq!(controller.retake().await.unwrap(), Transition::Applied);
    let state = controller.state();
    assert!(!state.is_taken);
    assert!(!state.is_saved);
    assert!(state.is_running);
    assert!(state.pending_image.is_empty());
    assert!(state.saved_path.is_none());
    assert!(controller.manager().is_running());

    controller.shutdown().await.unwrap();
    assert!(!controller.manager().is_running());

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_operations_ignored_out_of_order() {
    let dir = temp_dir();
    let mut controller = granted(&dir);

    // Nothing is valid before authorization
    assert_eq!(controller.start().await.unwrap(), Transition::Ignored);
    assert_eq!(controller.capture().await.unwrap(), Transition::Ignored);
    assert_eq!(controller.retake().await.unwrap(), Transition::Ignored);
    assert_eq!(controller.save().await.unwrap(), Transition::Ignored);

    controller.authorize().await.unwrap();
    // Configured but not running
    assert_eq!(controller.capture().await.unwrap(), Transition::Ignored);
    assert_eq!(controller.state().phase(), SessionPhase::Configured);

    controller.start().await.unwrap();
    assert_eq!(controller.start().await.unwrap(), Transition::Ignored);
    assert_eq!(controller.save().await.unwrap(), Transition::Ignored);
    assert!(!dir.exists());

    controller.capture().await.unwrap();
    assert_eq!(controller.capture().await.unwrap(), Transition::Ignored);
    assert_eq!(controller.start().await.unwrap(), Transition::Ignored);
}

#[tokio::test]
async fn test_capture_then_retake() {
    let mut controller = controller_with(
        virtual_manager(),
        StaticPermission::granted(),
        Arc::new(ReadOnlyLibrary),
    );
    controller.authorize().await.unwrap();
    controller.start().await.unwrap();
    controller.capture().await.unwrap();
    assert!(!controller.manager().is_running());

    assert_eq!(controller.retake().await.unwrap(), Transition::Applied);
    let state = controller.state();
    assert!(!state.is_taken);
    assert!(!state.is_saved);
    assert!(state.is_running);
    assert!(state.pending_image.is_empty());
    assert_eq!(state.phase(), SessionPhase::Running);
    assert!(controller.manager().is_running());

    // The shutter is live again
    assert_eq!(controller.capture().await.unwrap(), Transition::Applied);
}

#[tokio::test]
async fn test_retake_restart_failure_keeps_photo() {
    let manager = FaultyCamera {
        start_budget: 1,
        ..FaultyCamera::new()
    }
    .into_manager();
    let mut controller = controller_with(
        manager,
        StaticPermission::granted(),
        Arc::new(ReadOnlyLibrary),
    );
    controller.authorize().await.unwrap();
    controller.start().await.unwrap();
    controller.capture().await.unwrap();
    let taken = controller.state().clone();

    let err = controller.retake().await.unwrap_err();
    assert_eq!(err.kind, CaptureErrorKind::DeviceUnavailable);

    let state = controller.state();
    assert!(state.is_taken);
    assert!(!state.is_running);
    assert_eq!(state.pending_image, taken.pending_image);
    assert!(!state.alert);
    assert_eq!(state.last_error, Some(CaptureErrorKind::DeviceUnavailable));
    assert!(state.invariants_hold());
}

#[tokio::test]
async fn test_missing_device_node_is_not_denial() {
    let missing = "/dev/video_does_not_exist".to_string();
    let mut controller = CaptureController::new(
        virtual_manager(),
        Arc::new(DevicePermission::new(Some(missing.clone()))),
        Arc::new(ReadOnlyLibrary),
        DeviceSelection {
            device_path: Some(missing),
            ..Default::default()
        },
    );

    let err = controller.authorize().await.unwrap_err();
    assert_eq!(err.kind, CaptureErrorKind::DeviceUnavailable);

    let state = controller.state();
    assert!(!state.alert);
    assert_eq!(state.authorization, AuthorizationStatus::Authorized);
    assert_ne!(state.phase(), SessionPhase::Denied);
    assert!(!state.is_configured);
    assert_eq!(state.last_error, Some(CaptureErrorKind::DeviceUnavailable));
}

#[tokio::test]
async fn test_capture_failure_keeps_session_running() {
    let manager = FaultyCamera {
        jammed_shutter: true,
        ..FaultyCamera::new()
    }
    .into_manager();
    let mut controller = controller_with(
        manager,
        StaticPermission::granted(),
        Arc::new(ReadOnlyLibrary),
    );
    controller.authorize().await.unwrap();
    controller.start().await.unwrap();

    let err = controller.capture().await.unwrap_err();
    assert_eq!(err.kind, CaptureErrorKind::CaptureFailed);

    let state = controller.state();
    assert!(state.is_running);
    assert!(!state.is_taken);
    assert!(state.pending_image.is_empty());
    assert!(!state.alert, "only denial raises the alert");
    assert_eq!(state.last_error, Some(CaptureErrorKind::CaptureFailed));
}

#[tokio::test]
async fn test_save_failure_keeps_photo() {
    let mut controller = controller_with(
        virtual_manager(),
        StaticPermission::granted(),
        Arc::new(ReadOnlyLibrary),
    );
    controller.authorize().await.unwrap();
    controller.start().await.unwrap();
    controller.capture().await.unwrap();

    let err = controller.save().await.unwrap_err();
    assert_eq!(err.kind, CaptureErrorKind::SaveFailed);

    let state = controller.state();
    assert!(state.is_taken);
    assert!(!state.is_saved);
    assert!(!state.pending_image.is_empty());
    assert_eq!(state.last_error, Some(CaptureErrorKind::SaveFailed));
}

#[tokio::test]
async fn test_unknown_device_is_unavailable() {
    let mut controller = CaptureController::new(
        virtual_manager(),
        Arc::new(StaticPermission::granted()),
        Arc::new(ReadOnlyLibrary),
        DeviceSelection {
            device_path: Some("/dev/video99".to_string()),
            ..Default::default()
        },
    );

    let err = controller.authorize().await.unwrap_err();
    assert_eq!(err.kind, CaptureErrorKind::DeviceUnavailable);
    assert!(!controller.state().is_configured);
    assert_eq!(controller.start().await.unwrap(), Transition::Ignored);
}

#[tokio::test]
async fn test_controller_task_publishes_valid_states() {
    let dir = temp_dir();
    let handle = app::spawn(granted(&dir));
    let mut states = handle.subscribe();

    for message in [
        Message::Authorize,
        Message::Start,
        Message::Capture,
        Message::Save,
    ] {
        handle.send(message);
    }

    let saved = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            {
                let state = states.borrow_and_update();
                assert!(state.invariants_hold(), "invalid state {:?}", *state);
                if state.is_saved {
                    return state.clone();
                }
            }
            if states.changed().await.is_err() {
                panic!("controller task exited early");
            }
        }
    })
    .await
    .expect("photo saved in time");

    assert!(saved.is_taken);
    assert!(saved.saved_path.is_some());

    handle.close().await;
    let _ = std::fs::remove_dir_all(dir);
}
