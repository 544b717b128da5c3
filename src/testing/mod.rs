//! Testing utilities
//!
//! Deterministic stand-ins for the collaborators a view talks to: an
//! executor stepped by hand, a device that records every call, and a
//! permission provider answered on demand.

pub mod synthetic_data;

pub use crate::device::simulator::synthetic_jpeg;
pub use synthetic_data::synthetic_photo;

use crate::device::{
    CameraDevice, CaptureCallbacks, CapturedPhoto, DecodeHandler, DeviceUpdate,
};
use crate::executor::{Executor, Task};
use crate::permissions::{AccessCallback, PermissionProvider, PermissionStatus};
use crate::types::{CameraFacing, CodeFormat, Point};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, ThreadId};

/// Test doubles keep working after a panicking test thread poisoned a lock.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Executor whose queues only drain when the test says so.
///
/// The thread that creates it plays the UI thread: it pumps the UI queue, and
/// host calls made from it run inline.
pub struct ManualExecutor {
    ui: Mutex<VecDeque<Task>>,
    background: Mutex<VecDeque<Task>>,
    owner: ThreadId,
}

impl Default for ManualExecutor {
    fn default() -> Self {
        Self {
            ui: Mutex::new(VecDeque::new()),
            background: Mutex::new(VecDeque::new()),
            owner: thread::current().id(),
        }
    }
}

impl ManualExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_ui(&self) -> usize {
        lock(&self.ui).len()
    }

    pub fn pending_background(&self) -> usize {
        lock(&self.background).len()
    }

    /// Run the UI tasks queued right now. Tasks they enqueue wait for the
    /// next turn. Returns how many ran.
    pub fn run_ui_turn(&self) -> usize {
        let queued = self.pending_ui();
        for _ in 0..queued {
            let task = lock(&self.ui).pop_front();
            match task {
                Some(task) => task(),
                None => break,
            }
        }
        queued
    }

    /// Drain the background queue, including work enqueued while draining
    pub fn run_background(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = lock(&self.background).pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    /// Alternate both queues until neither has work
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            let step = self.run_background() + self.run_ui_turn();
            if step == 0 {
                return ran;
            }
            ran += step;
        }
    }
}

impl Executor for ManualExecutor {
    fn dispatch_ui(&self, task: Task) {
        lock(&self.ui).push_back(task);
    }

    fn dispatch_background(&self, task: Task) {
        lock(&self.background).push_back(task);
    }

    fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.owner
    }
}

/// One call observed by [`RecordingDevice`]
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    Setup {
        facing: CameraFacing,
        scan_targets: Vec<CodeFormat>,
    },
    Update(DeviceUpdate),
    SetBarcodeScanning {
        enabled: bool,
        scan_targets: Vec<CodeFormat>,
    },
    CapturePicture,
    ZoomPinchStart,
    ZoomPinchChange(f64),
    FocusAt(Point),
    ResetFocus,
    DetachFromHost,
}

/// How [`RecordingDevice`] answers `capture_picture`
#[derive(Debug, Clone, Default)]
pub enum CaptureScript {
    /// Keep the callbacks for the test to drive through [`RecordingDevice::take_capture`]
    #[default]
    Hold,
    /// Will-capture, then success, synchronously
    Succeed(CapturedPhoto),
    /// Error without a will-capture notification
    Fail(String),
    /// Drop the callbacks without calling any of them
    Abandon,
}

/// Device double recording every call in order
#[derive(Default)]
pub struct RecordingDevice {
    calls: Mutex<Vec<DeviceCall>>,
    decode_handler: Mutex<Option<DecodeHandler>>,
    script: Mutex<CaptureScript>,
    held: Mutex<VecDeque<CaptureCallbacks>>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(script: CaptureScript) -> Self {
        let device = Self::default();
        device.set_capture_script(script);
        device
    }

    pub fn set_capture_script(&self, script: CaptureScript) {
        *lock(&self.script) = script;
    }

    pub fn calls(&self) -> Vec<DeviceCall> {
        lock(&self.calls).clone()
    }

    pub fn clear(&self) {
        lock(&self.calls).clear();
    }

    pub fn setup_count(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| matches!(c, DeviceCall::Setup { .. }))
            .count()
    }

    pub fn updates(&self) -> Vec<DeviceUpdate> {
        lock(&self.calls)
            .iter()
            .filter_map(|c| match c {
                DeviceCall::Update(update) => Some(update.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn zoom_calls(&self) -> Vec<DeviceCall> {
        lock(&self.calls)
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    DeviceCall::ZoomPinchStart | DeviceCall::ZoomPinchChange(_)
                )
            })
            .cloned()
            .collect()
    }

    pub fn scanning_calls(&self) -> Vec<(bool, Vec<CodeFormat>)> {
        lock(&self.calls)
            .iter()
            .filter_map(|c| match c {
                DeviceCall::SetBarcodeScanning {
                    enabled,
                    scan_targets,
                } => Some((*enabled, scan_targets.clone())),
                _ => None,
            })
            .collect()
    }

    /// Feed a decoded code through the most recent decode handler
    pub fn decode(&self, value: &str, format: CodeFormat) -> bool {
        let handler = lock(&self.decode_handler).clone();
        match handler {
            Some(handler) => {
                handler(value.to_string(), format);
                true
            }
            None => false,
        }
    }

    /// Callbacks of the oldest held capture
    pub fn take_capture(&self) -> Option<CaptureCallbacks> {
        lock(&self.held).pop_front()
    }

    fn record(&self, call: DeviceCall) {
        lock(&self.calls).push(call);
    }
}

impl CameraDevice for RecordingDevice {
    fn setup(&self, facing: CameraFacing, scan_targets: &[CodeFormat]) {
        self.record(DeviceCall::Setup {
            facing,
            scan_targets: scan_targets.to_vec(),
        });
    }

    fn update(&self, update: DeviceUpdate) {
        self.record(DeviceCall::Update(update));
    }

    fn set_barcode_scanning(
        &self,
        enabled: bool,
        scan_targets: Vec<CodeFormat>,
        on_decode: DecodeHandler,
    ) {
        *lock(&self.decode_handler) = Some(on_decode);
        self.record(DeviceCall::SetBarcodeScanning {
            enabled,
            scan_targets,
        });
    }

    fn capture_picture(&self, callbacks: CaptureCallbacks) {
        self.record(DeviceCall::CapturePicture);
        let script = lock(&self.script).clone();
        match script {
            CaptureScript::Hold => lock(&self.held).push_back(callbacks),
            CaptureScript::Succeed(photo) => {
                (callbacks.on_will_capture)();
                (callbacks.on_success)(photo);
            }
            CaptureScript::Fail(message) => (callbacks.on_error)(message),
            CaptureScript::Abandon => drop(callbacks),
        }
    }

    fn zoom_pinch_start(&self) {
        self.record(DeviceCall::ZoomPinchStart);
    }

    fn zoom_pinch_change(&self, scale: f64) {
        self.record(DeviceCall::ZoomPinchChange(scale));
    }

    fn focus_at(&self, point: Point) {
        self.record(DeviceCall::FocusAt(point));
    }

    fn reset_focus(&self) {
        self.record(DeviceCall::ResetFocus);
    }

    fn detach_from_host(&self) {
        self.record(DeviceCall::DetachFromHost);
    }
}

/// Permission provider whose request stays open until [`resolve`](Self::resolve)
pub struct DeferredPermissions {
    status: Mutex<PermissionStatus>,
    pending: Mutex<Vec<AccessCallback>>,
}

impl DeferredPermissions {
    pub fn new(status: PermissionStatus) -> Self {
        Self {
            status: Mutex::new(status),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn pending_requests(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Answer every open request, on the calling thread
    pub fn resolve(&self, granted: bool) {
        *lock(&self.status) = if granted {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        };
        let callbacks: Vec<_> = lock(&self.pending).drain(..).collect();
        for callback in callbacks {
            callback(granted);
        }
    }
}

impl PermissionProvider for DeferredPermissions {
    fn authorization_status(&self) -> PermissionStatus {
        *lock(&self.status)
    }

    fn request_access(&self, on_result: AccessCallback) {
        lock(&self.pending).push(on_result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_ui_turn_defers_nested_dispatch() {
        let executor = Arc::new(ManualExecutor::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let (exec, c) = (Arc::clone(&executor), Arc::clone(&counter));
        executor.dispatch_ui(Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
            let c = Arc::clone(&c);
            exec.dispatch_ui(Box::new(move || {
                c.fetch_add(10, Ordering::SeqCst);
            }));
        }));

        assert_eq!(executor.run_ui_turn(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(executor.pending_ui(), 1);
        assert_eq!(executor.run_ui_turn(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn test_run_until_idle_crosses_queues() {
        let executor = Arc::new(ManualExecutor::new());
        let done = Arc::new(AtomicUsize::new(0));
        let (exec, d) = (Arc::clone(&executor), Arc::clone(&done));
        executor.dispatch_background(Box::new(move || {
            exec.dispatch_ui(Box::new(move || {
                d.fetch_add(1, Ordering::SeqCst);
            }));
        }));
        assert_eq!(executor.run_until_idle(), 2);
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_creating_thread_is_the_ui_thread() {
        let executor = Arc::new(ManualExecutor::new());
        assert!(executor.is_ui_thread());
        let other = Arc::clone(&executor);
        let on_ui = std::thread::spawn(move || other.is_ui_thread())
            .join()
            .unwrap();
        assert!(!on_ui);
    }

    #[test]
    fn test_recording_device_holds_captures() {
        let device = RecordingDevice::new();
        device.capture_picture(CaptureCallbacks {
            on_will_capture: Box::new(|| {}),
            on_success: Box::new(|_| {}),
            on_error: Box::new(|_| {}),
        });
        assert_eq!(device.calls(), vec![DeviceCall::CapturePicture]);
        assert!(device.take_capture().is_some());
        assert!(device.take_capture().is_none());
    }

    #[test]
    fn test_deferred_permissions_resolve_later() {
        let provider = DeferredPermissions::new(PermissionStatus::NotDetermined);
        let answer = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&answer);
        provider.request_access(Box::new(move |granted| {
            *slot.lock().unwrap() = Some(granted);
        }));
        assert_eq!(provider.pending_requests(), 1);
        assert!(answer.lock().unwrap().is_none());

        provider.resolve(true);
        assert_eq!(*answer.lock().unwrap(), Some(true));
        assert_eq!(provider.authorization_status(), PermissionStatus::Granted);
    }
}
