//! Capture device capability interface
//!
//! The view never talks to camera hardware directly. It drives a
//! [`CameraDevice`], picked once at construction: either a hardware device
//! supplied by the host, or the in-crate [`SimulatorCamera`] stand-in.
//!
//! Callbacks handed to a device may be invoked on any thread.

pub mod simulator;

pub use simulator::SimulatorCamera;

use crate::config::CamkitConfig;
use crate::props::EventHandler;
use crate::types::{
    CameraFacing, CodeFormat, Dimensions, FlashMode, OrientationEvent, Point, ResizeMode, Size,
    TorchMode, ZoomEvent,
};
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

/// Raw decode callback: `(value, format)`
pub type DecodeHandler = Arc<dyn Fn(String, CodeFormat) + Send + Sync>;

/// Environment variable forcing the simulator backend
pub const SIMULATOR_ENV: &str = "CAMKIT_SIMULATOR";

/// A single configuration change pushed to the device
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceUpdate {
    Facing(CameraFacing),
    FlashMode(FlashMode),
    TorchMode(TorchMode),
    ResizeMode(ResizeMode),
    OnOrientationChange(Option<EventHandler<OrientationEvent>>),
    OnZoom(Option<EventHandler<ZoomEvent>>),
    Zoom(Option<f64>),
    MaxZoom(Option<f64>),
    /// Scan frame geometry, `None` when the frame is hidden
    ScanFrameSize(Option<Size>),
}

/// Encoded image as delivered by the device
#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    pub image: Bytes,
    pub thumbnail: Option<Bytes>,
    pub dimensions: Dimensions,
}

/// Continuations for one capture sequence.
///
/// A device calls `on_will_capture` at most once before exposure, then
/// exactly one of `on_success` / `on_error`.
pub struct CaptureCallbacks {
    pub on_will_capture: Box<dyn FnOnce() + Send>,
    pub on_success: Box<dyn FnOnce(CapturedPhoto) + Send>,
    pub on_error: Box<dyn FnOnce(String) + Send>,
}

impl fmt::Debug for CaptureCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureCallbacks").finish_non_exhaustive()
    }
}

/// Focus operations the focus-indicator widget delegates to the device
pub trait FocusDelegate: Send + Sync {
    fn focus_at(&self, point: Point);
    fn reset_focus(&self);
}

pub trait CameraDevice: Send + Sync {
    /// Configure the capture session. Called at most once per view.
    fn setup(&self, facing: CameraFacing, scan_targets: &[CodeFormat]);

    /// Apply one configuration change. May arrive before `setup`.
    fn update(&self, update: DeviceUpdate);

    fn set_barcode_scanning(
        &self,
        enabled: bool,
        scan_targets: Vec<CodeFormat>,
        on_decode: DecodeHandler,
    );

    fn capture_picture(&self, callbacks: CaptureCallbacks);

    fn zoom_pinch_start(&self);

    /// `scale` is cumulative since the gesture began
    fn zoom_pinch_change(&self, scale: f64);

    fn focus_at(&self, point: Point);

    fn reset_focus(&self);

    /// Release hardware resources; the view is gone
    fn detach_from_host(&self);
}

/// Adapts a device to the focus widget's delegate slot
pub struct DeviceFocusDelegate(pub Arc<dyn CameraDevice>);

impl FocusDelegate for DeviceFocusDelegate {
    fn focus_at(&self, point: Point) {
        self.0.focus_at(point);
    }

    fn reset_focus(&self) {
        self.0.reset_focus();
    }
}

/// Which device implementation backs a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceBackend {
    Hardware,
    Simulator,
}

impl DeviceBackend {
    /// Decide the backend from the environment and configuration
    pub fn detect(config: &CamkitConfig, hardware_available: bool) -> Self {
        let forced = std::env::var(SIMULATOR_ENV)
            .map(|v| !matches!(v.trim(), "" | "0" | "false"))
            .unwrap_or(false);

        if forced || config.device.simulator || !hardware_available {
            DeviceBackend::Simulator
        } else {
            DeviceBackend::Hardware
        }
    }
}

/// Pick the device for a new view.
///
/// Falls back to the simulator when no hardware device is supplied.
pub fn select_device(
    config: &CamkitConfig,
    hardware: Option<Arc<dyn CameraDevice>>,
) -> Arc<dyn CameraDevice> {
    let backend = DeviceBackend::detect(config, hardware.is_some());
    match (backend, hardware) {
        (DeviceBackend::Hardware, Some(device)) => {
            log::info!("Using hardware camera device");
            device
        }
        _ => {
            log::info!("Using simulator camera device");
            Arc::new(SimulatorCamera::from_config(&config.device))
        }
    }
}
