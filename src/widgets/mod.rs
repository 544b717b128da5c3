//! Overlay widgets and host view surfaces
//!
//! Rendering belongs to the host. The view only drives these interfaces, and
//! always from the UI-affine executor.

pub mod headless;

pub use headless::{
    parse_ratio, HeadlessFocus, HeadlessHost, HeadlessPreview, HeadlessRatioOverlay,
    HeadlessScanner, HeadlessWidgets,
};

use crate::device::FocusDelegate;
use crate::types::{Color, FocusMode, Rect, Size};
use std::sync::Arc;
use std::time::Duration;

/// Identifies a pinch recognizer registered with the host view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecognizerId(pub u64);

/// The live camera preview layer
pub trait PreviewSurface: Send + Sync {
    fn set_frame(&self, bounds: Rect);
    fn set_opacity(&self, opacity: f64);
    fn animate_opacity(&self, to: f64, duration: Duration);
}

/// Scan frame and laser drawn over the preview
pub trait ScannerInterface: Send + Sync {
    fn set_frame(&self, bounds: Rect);
    fn set_hidden(&self, hidden: bool);
    /// Size of the scan frame for the current bounds
    fn frame_size(&self) -> Size;
    fn update_frame_color(&self, color: Color);
    fn update_laser_color(&self, color: Color);
}

/// Tap-to-focus indicator
pub trait FocusInterface: Send + Sync {
    fn set_frame(&self, bounds: Rect);
    fn set_delegate(&self, delegate: Arc<dyn FocusDelegate>);
    fn update_focus_mode(&self, mode: FocusMode);
    fn update_reset_focus_timeout(&self, timeout_ms: u64);
    fn update_reset_focus_when_motion_detected(&self, enabled: bool);
    fn reset_focus(&self);
}

/// Aspect-ratio guide overlay, owned by the view while present
pub trait RatioOverlay: Send {
    fn set_ratio(&mut self, ratio: &str);
    fn set_color(&mut self, color: Color);
    fn set_frame(&mut self, bounds: Rect);
    fn remove_from_view(self: Box<Self>);
}

/// The host view the widget is mounted in
pub trait ViewHost: Send + Sync {
    fn create_ratio_overlay(
        &self,
        ratio: &str,
        color: Option<Color>,
        bounds: Rect,
    ) -> Box<dyn RatioOverlay>;
    fn add_pinch_recognizer(&self) -> RecognizerId;
    fn remove_pinch_recognizer(&self, id: RecognizerId);
}

/// Everything the view draws into
#[derive(Clone)]
pub struct WidgetSet {
    pub preview: Arc<dyn PreviewSurface>,
    pub scanner: Arc<dyn ScannerInterface>,
    pub focus: Arc<dyn FocusInterface>,
    pub host: Arc<dyn ViewHost>,
}
