//! Configuration snapshot delivered by the host, and the set of changed fields
//!
//! The host owns the snapshot. The view only ever keeps the latest one plus
//! the names that changed since the previous delivery.

use crate::executor::Executor;
use crate::types::{
    CameraFacing, Color, FlashMode, FocusMode, OrientationEvent, ResizeMode, ScanEvent, TorchMode,
    ZoomEvent, ZoomMode,
};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Default minimum interval between two emitted scan events
pub const DEFAULT_SCAN_THROTTLE_MS: u64 = 2000;

/// Host callback carried as a prop.
///
/// Two handlers are equal when they wrap the same closure.
pub struct EventHandler<T> {
    callback: Arc<dyn Fn(T) + Send + Sync>,
}

impl<T> EventHandler<T> {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    pub fn emit(&self, event: T) {
        (self.callback)(event)
    }
}

impl<T: Send + 'static> EventHandler<T> {
    /// A handler that delivers each event on a later UI turn.
    ///
    /// Devices call this from whatever thread they like, possibly while the
    /// view is mid-update; the host sees the event once that update is done.
    pub fn on_ui(&self, executor: &Arc<dyn Executor>) -> Self {
        let handler = self.clone();
        let executor = Arc::clone(executor);
        Self::new(move |event: T| {
            let handler = handler.clone();
            executor.dispatch_ui(Box::new(move || handler.emit(event)));
        })
    }
}

impl<T> Clone for EventHandler<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T> PartialEq for EventHandler<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }
}

impl<T> fmt::Debug for EventHandler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Arc::as_ptr(&self.callback))
    }
}

/// Every prop the view understands, by its host-side name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropName {
    CameraType,
    FlashMode,
    TorchMode,
    ResizeMode,
    RatioOverlay,
    RatioOverlayColor,
    ScanBarcode,
    OnReadCode,
    ShowFrame,
    ScanThrottleDelay,
    FrameColor,
    LaserColor,
    FocusMode,
    ResetFocusTimeout,
    ResetFocusWhenMotionDetected,
    ZoomMode,
    Zoom,
    MaxZoom,
    OnOrientationChange,
    OnZoom,
    OnCaptureButtonPressIn,
    OnCaptureButtonPressOut,
}

impl PropName {
    pub const ALL: [PropName; 22] = [
        PropName::CameraType,
        PropName::FlashMode,
        PropName::TorchMode,
        PropName::ResizeMode,
        PropName::RatioOverlay,
        PropName::RatioOverlayColor,
        PropName::ScanBarcode,
        PropName::OnReadCode,
        PropName::ShowFrame,
        PropName::ScanThrottleDelay,
        PropName::FrameColor,
        PropName::LaserColor,
        PropName::FocusMode,
        PropName::ResetFocusTimeout,
        PropName::ResetFocusWhenMotionDetected,
        PropName::ZoomMode,
        PropName::Zoom,
        PropName::MaxZoom,
        PropName::OnOrientationChange,
        PropName::OnZoom,
        PropName::OnCaptureButtonPressIn,
        PropName::OnCaptureButtonPressOut,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropName::CameraType => "cameraType",
            PropName::FlashMode => "flashMode",
            PropName::TorchMode => "torchMode",
            PropName::ResizeMode => "resizeMode",
            PropName::RatioOverlay => "ratioOverlay",
            PropName::RatioOverlayColor => "ratioOverlayColor",
            PropName::ScanBarcode => "scanBarcode",
            PropName::OnReadCode => "onReadCode",
            PropName::ShowFrame => "showFrame",
            PropName::ScanThrottleDelay => "scanThrottleDelay",
            PropName::FrameColor => "frameColor",
            PropName::LaserColor => "laserColor",
            PropName::FocusMode => "focusMode",
            PropName::ResetFocusTimeout => "resetFocusTimeout",
            PropName::ResetFocusWhenMotionDetected => "resetFocusWhenMotionDetected",
            PropName::ZoomMode => "zoomMode",
            PropName::Zoom => "zoom",
            PropName::MaxZoom => "maxZoom",
            PropName::OnOrientationChange => "onOrientationChange",
            PropName::OnZoom => "onZoom",
            PropName::OnCaptureButtonPressIn => "onCaptureButtonPressIn",
            PropName::OnCaptureButtonPressOut => "onCaptureButtonPressOut",
        }
    }
}

impl FromStr for PropName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PropName::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or(())
    }
}

impl fmt::Display for PropName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names of the props that changed since the previous snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedProps(HashSet<PropName>);

impl ChangedProps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every prop marked as changed, as on the first delivery
    pub fn all() -> Self {
        PropName::ALL.iter().copied().collect()
    }

    /// Parse host-side names; unknown names are logged and skipped
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut changed = Self::new();
        for name in names {
            match name.as_ref().parse::<PropName>() {
                Ok(prop) => changed.insert(prop),
                Err(()) => log::debug!("Ignoring unknown prop: {}", name.as_ref()),
            }
        }
        changed
    }

    pub fn insert(&mut self, prop: PropName) {
        self.0.insert(prop);
    }

    pub fn contains(&self, prop: PropName) -> bool {
        self.0.contains(&prop)
    }

    /// True when at least one of `props` changed
    pub fn any(&self, props: &[PropName]) -> bool {
        props.iter().any(|p| self.0.contains(p))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<PropName> for ChangedProps {
    fn from_iter<I: IntoIterator<Item = PropName>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Full set of current widget properties
#[derive(Debug, Clone, PartialEq)]
pub struct CameraProps {
    pub camera_type: CameraFacing,
    pub flash_mode: FlashMode,
    pub torch_mode: TorchMode,
    pub resize_mode: ResizeMode,
    pub ratio_overlay: Option<String>,
    pub ratio_overlay_color: Option<Color>,
    pub scan_barcode: bool,
    pub on_read_code: Option<EventHandler<ScanEvent>>,
    pub show_frame: bool,
    pub scan_throttle_delay: u64,
    pub frame_color: Option<Color>,
    pub laser_color: Option<Color>,
    pub focus_mode: FocusMode,
    pub reset_focus_timeout: u64,
    pub reset_focus_when_motion_detected: bool,
    pub zoom_mode: ZoomMode,
    pub zoom: Option<f64>,
    pub max_zoom: Option<f64>,
    pub on_orientation_change: Option<EventHandler<OrientationEvent>>,
    pub on_zoom: Option<EventHandler<ZoomEvent>>,
    pub on_capture_button_press_in: Option<EventHandler<()>>,
    pub on_capture_button_press_out: Option<EventHandler<()>>,
}

impl Default for CameraProps {
    fn default() -> Self {
        Self {
            camera_type: CameraFacing::Back,
            flash_mode: FlashMode::Auto,
            torch_mode: TorchMode::Off,
            resize_mode: ResizeMode::Contain,
            ratio_overlay: None,
            ratio_overlay_color: None,
            scan_barcode: false,
            on_read_code: None,
            show_frame: false,
            scan_throttle_delay: DEFAULT_SCAN_THROTTLE_MS,
            frame_color: None,
            laser_color: None,
            focus_mode: FocusMode::On,
            reset_focus_timeout: 0,
            reset_focus_when_motion_detected: false,
            zoom_mode: ZoomMode::On,
            zoom: None,
            max_zoom: None,
            on_orientation_change: None,
            on_zoom: None,
            on_capture_button_press_in: None,
            on_capture_button_press_out: None,
        }
    }
}

impl CameraProps {
    /// Ratio overlay value, with an empty string treated as absent
    pub fn ratio_overlay(&self) -> Option<&str> {
        self.ratio_overlay.as_deref().filter(|r| !r.trim().is_empty())
    }

    /// True when decoded codes have somewhere to go
    pub fn scanning_active(&self) -> bool {
        self.scan_barcode && self.on_read_code.is_some()
    }

    /// Field-by-field comparison, for hosts that deliver whole snapshots
    pub fn diff(old: &CameraProps, new: &CameraProps) -> ChangedProps {
        let mut changed = ChangedProps::new();
        let mut mark = |differs: bool, prop: PropName| {
            if differs {
                changed.insert(prop);
            }
        };

        mark(old.camera_type != new.camera_type, PropName::CameraType);
        mark(old.flash_mode != new.flash_mode, PropName::FlashMode);
        mark(old.torch_mode != new.torch_mode, PropName::TorchMode);
        mark(old.resize_mode != new.resize_mode, PropName::ResizeMode);
        mark(old.ratio_overlay != new.ratio_overlay, PropName::RatioOverlay);
        mark(
            old.ratio_overlay_color != new.ratio_overlay_color,
            PropName::RatioOverlayColor,
        );
        mark(old.scan_barcode != new.scan_barcode, PropName::ScanBarcode);
        mark(old.on_read_code != new.on_read_code, PropName::OnReadCode);
        mark(old.show_frame != new.show_frame, PropName::ShowFrame);
        mark(
            old.scan_throttle_delay != new.scan_throttle_delay,
            PropName::ScanThrottleDelay,
        );
        mark(old.frame_color != new.frame_color, PropName::FrameColor);
        mark(old.laser_color != new.laser_color, PropName::LaserColor);
        mark(old.focus_mode != new.focus_mode, PropName::FocusMode);
        mark(
            old.reset_focus_timeout != new.reset_focus_timeout,
            PropName::ResetFocusTimeout,
        );
        mark(
            old.reset_focus_when_motion_detected != new.reset_focus_when_motion_detected,
            PropName::ResetFocusWhenMotionDetected,
        );
        mark(old.zoom_mode != new.zoom_mode, PropName::ZoomMode);
        mark(old.zoom != new.zoom, PropName::Zoom);
        mark(old.max_zoom != new.max_zoom, PropName::MaxZoom);
        mark(
            old.on_orientation_change != new.on_orientation_change,
            PropName::OnOrientationChange,
        );
        mark(old.on_zoom != new.on_zoom, PropName::OnZoom);
        mark(
            old.on_capture_button_press_in != new.on_capture_button_press_in,
            PropName::OnCaptureButtonPressIn,
        );
        mark(
            old.on_capture_button_press_out != new.on_capture_button_press_out,
            PropName::OnCaptureButtonPressOut,
        );

        changed
    }
}
