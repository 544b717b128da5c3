//! Still capture orchestration
//!
//! A capture request fans out over three threads: the device reports
//! will-capture (shutter feedback on the UI thread), then success (file write
//! on a background thread) or failure. The host sees exactly one outcome per
//! request, even from a device that reports twice or drops the request.

use crate::device::{CameraDevice, CaptureCallbacks, CapturedPhoto};
use crate::errors::CameraError;
use crate::executor::Executor;
use crate::storage::ImageStore;
use crate::types::CaptureResult;
use crate::widgets::{FocusInterface, PreviewSurface};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

/// Default shutter fade-in
pub const SHUTTER_ANIMATION: Duration = Duration::from_millis(350);

type Outcome = Result<CaptureResult, CameraError>;
type Finish = Box<dyn FnOnce(Outcome) + Send>;

/// Delivers at most one outcome for one capture request
struct Completion {
    finish: Mutex<Option<Finish>>,
}

impl Completion {
    fn new(finish: Finish) -> Arc<Self> {
        Arc::new(Self {
            finish: Mutex::new(Some(finish)),
        })
    }

    fn complete(&self, outcome: Outcome) {
        let finish = self.finish.lock().ok().and_then(|mut slot| slot.take());
        match finish {
            Some(finish) => finish(outcome),
            None => log::warn!("Capture already completed; ignoring {:?}", outcome.err()),
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        let pending = self
            .finish
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(finish) = pending {
            log::error!("Capture callbacks dropped without an outcome");
            finish(Err(abandoned()));
        }
    }
}

fn abandoned() -> CameraError {
    CameraError::DeviceCapture("Capture abandoned before completing".to_string())
}

pub struct CaptureCoordinator {
    device: Arc<dyn CameraDevice>,
    preview: Arc<dyn PreviewSurface>,
    focus: Arc<dyn FocusInterface>,
    executor: Arc<dyn Executor>,
    store: Arc<ImageStore>,
    shutter: Duration,
}

impl CaptureCoordinator {
    pub fn new(
        device: Arc<dyn CameraDevice>,
        preview: Arc<dyn PreviewSurface>,
        focus: Arc<dyn FocusInterface>,
        executor: Arc<dyn Executor>,
        store: ImageStore,
    ) -> Self {
        Self {
            device,
            preview,
            focus,
            executor,
            store: Arc::new(store),
            shutter: SHUTTER_ANIMATION,
        }
    }

    pub fn with_shutter_animation(mut self, duration: Duration) -> Self {
        self.shutter = duration;
        self
    }

    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    /// Take a picture and report through exactly one of the continuations
    pub fn capture<S, E>(&self, on_success: S, on_error: E)
    where
        S: FnOnce(CaptureResult) + Send + 'static,
        E: FnOnce(String) + Send + 'static,
    {
        self.start(Box::new(move |outcome| match outcome {
            Ok(result) => on_success(result),
            Err(e) => on_error(e.diagnostic()),
        }));
    }

    /// Take a picture and await the outcome
    pub async fn capture_async(&self) -> Result<CaptureResult, CameraError> {
        let (tx, rx) = oneshot::channel();
        self.start(Box::new(move |outcome| {
            let _ = tx.send(outcome);
        }));
        rx.await.map_err(|_| abandoned())?
    }

    fn start(&self, finish: Finish) {
        let completion = Completion::new(finish);
        log::info!("Capturing picture");

        let preview = Arc::clone(&self.preview);
        let ui = Arc::clone(&self.executor);
        let shutter = self.shutter;
        let on_will_capture = Box::new(move || {
            ui.dispatch_ui(Box::new(move || {
                preview.set_opacity(0.0);
                preview.animate_opacity(1.0, shutter);
            }));
        });

        let on_success = {
            let completion = Arc::clone(&completion);
            let executor = Arc::clone(&self.executor);
            let store = Arc::clone(&self.store);
            let focus = Arc::clone(&self.focus);
            Box::new(move |photo: CapturedPhoto| {
                let ui = Arc::clone(&executor);
                executor.dispatch_background(Box::new(move || {
                    completion.complete(persist(&store, &photo));
                    ui.dispatch_ui(Box::new(move || focus.reset_focus()));
                }));
            })
        };

        let on_error = Box::new(move |message: String| {
            log::error!("Capture failed: {}", message);
            completion.complete(Err(CameraError::DeviceCapture(message)));
        });

        self.device.capture_picture(CaptureCallbacks {
            on_will_capture,
            on_success,
            on_error,
        });
    }
}

fn persist(store: &ImageStore, photo: &CapturedPhoto) -> Outcome {
    let saved = store.write(&photo.image).map_err(|e| {
        log::error!("Failed to persist capture: {}", e);
        e
    })?;
    log::info!("Capture saved as {}", saved.name);

    Ok(CaptureResult {
        size: photo.image.len(),
        uri: saved.uri,
        name: saved.name,
        thumb: String::new(),
        height: photo.dimensions.height,
        width: photo.dimensions.width,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::testing::{synthetic_photo, CaptureScript, ManualExecutor, RecordingDevice};
    use crate::widgets::HeadlessWidgets;
    use tempfile::TempDir;

    struct Fixture {
        coordinator: CaptureCoordinator,
        device: Arc<RecordingDevice>,
        executor: Arc<ManualExecutor>,
        widgets: HeadlessWidgets,
        _root: TempDir,
    }

    fn fixture() -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let device = Arc::new(RecordingDevice::new());
        let executor = Arc::new(ManualExecutor::new());
        let widgets = HeadlessWidgets::new();
        let store = ImageStore::new(StorageConfig {
            cache_root: Some(root.path().to_path_buf()),
            ..StorageConfig::default()
        });
        let coordinator = CaptureCoordinator::new(
            device.clone(),
            widgets.preview.clone(),
            widgets.focus.clone(),
            executor.clone(),
            store,
        );
        Fixture {
            coordinator,
            device,
            executor,
            widgets,
            _root: root,
        }
    }

    type OutcomeLog = Arc<Mutex<Vec<Result<CaptureResult, String>>>>;

    fn outcomes() -> (
        OutcomeLog,
        impl FnOnce(CaptureResult) + Send + 'static,
        impl FnOnce(String) + Send + 'static,
    ) {
        let log: OutcomeLog = Arc::new(Mutex::new(Vec::new()));
        let (ok, err) = (Arc::clone(&log), Arc::clone(&log));
        (
            log,
            move |r: CaptureResult| ok.lock().unwrap().push(Ok(r)),
            move |e: String| err.lock().unwrap().push(Err(e)),
        )
    }

    #[test]
    fn test_success_writes_file_and_resets_focus() {
        let f = fixture();
        let (log, ok, err) = outcomes();
        f.coordinator.capture(ok, err);

        let callbacks = f.device.take_capture().unwrap();
        (callbacks.on_will_capture)();
        let photo = synthetic_photo(64, 48, 1);
        let expected_size = photo.image.len();
        (callbacks.on_success)(photo);

        assert!(log.lock().unwrap().is_empty());
        f.executor.run_until_idle();

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 1);
        let result = log[0].as_ref().unwrap();
        assert_eq!(result.size, expected_size);
        assert_eq!((result.width, result.height), (64, 48));
        assert_eq!(result.thumb, "");
        assert!(result.name.ends_with(".jpg"));
        let path = url::Url::parse(&result.uri).unwrap().to_file_path().unwrap();
        assert_eq!(std::fs::metadata(path).unwrap().len() as usize, expected_size);

        assert_eq!(f.widgets.focus.reset_count(), 1);
        assert_eq!(f.widgets.preview.opacity_history(), vec![0.0, 1.0]);
        assert_eq!(
            f.widgets.preview.animations(),
            vec![(1.0, SHUTTER_ANIMATION)]
        );
    }

    #[test]
    fn test_device_error_is_reported_verbatim() {
        let f = fixture();
        f.device
            .set_capture_script(CaptureScript::Fail("Camera is busy".to_string()));
        let (log, ok, err) = outcomes();
        f.coordinator.capture(ok, err);
        f.executor.run_until_idle();

        assert_eq!(
            *log.lock().unwrap(),
            vec![Err("Camera is busy".to_string())]
        );
        assert_eq!(f.widgets.focus.reset_count(), 0);
    }

    #[test]
    fn test_misbehaving_device_completes_once() {
        let f = fixture();
        let (log, ok, err) = outcomes();
        f.coordinator.capture(ok, err);

        let callbacks = f.device.take_capture().unwrap();
        (callbacks.on_success)(synthetic_photo(8, 8, 0));
        f.executor.run_until_idle();
        (callbacks.on_error)("late failure".to_string());

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 1);
        assert!(log[0].is_ok());
    }

    #[test]
    fn test_dropped_callbacks_report_abandoned() {
        let f = fixture();
        let (log, ok, err) = outcomes();
        f.coordinator.capture(ok, err);
        assert!(log.lock().unwrap().is_empty());

        drop(f.device.take_capture());
        assert_eq!(
            *log.lock().unwrap(),
            vec![Err("Capture abandoned before completing".to_string())]
        );
    }

    #[test]
    fn test_dropped_callbacks_after_will_capture_still_report() {
        let f = fixture();
        let (log, ok, err) = outcomes();
        f.coordinator.capture(ok, err);

        {
            let callbacks = f.device.take_capture().unwrap();
            (callbacks.on_will_capture)();
        }
        f.executor.run_until_idle();

        assert_eq!(log.lock().unwrap().len(), 1);
        assert!(log.lock().unwrap()[0].is_err());
        assert_eq!(f.widgets.preview.opacity_history(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_capture_async_reports_abandoned_capture() {
        let f = fixture();
        f.device.set_capture_script(CaptureScript::Abandon);
        let err = tokio_test::block_on(f.coordinator.capture_async()).unwrap_err();
        assert_eq!(err.diagnostic(), "Capture abandoned before completing");
    }

    #[test]
    fn test_will_capture_is_optional() {
        let f = fixture();
        f.device
            .set_capture_script(CaptureScript::Fail("no exposure".to_string()));
        let (_, ok, err) = outcomes();
        f.coordinator.capture(ok, err);
        f.executor.run_until_idle();
        assert!(f.widgets.preview.animations().is_empty());
    }
}
