//! Widget implementations that keep state instead of rendering.
//!
//! Used by hosts without a display (CLI, services) and by tests that inspect
//! what the view asked its widgets to do.

use super::{
    FocusInterface, PreviewSurface, RatioOverlay, RecognizerId, ScannerInterface, ViewHost,
    WidgetSet,
};
use crate::device::FocusDelegate;
use crate::types::{Color, FocusMode, Point, Rect, Size};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Horizontal inset of the scan frame from the view edges
pub const SCAN_FRAME_OFFSET: f64 = 30.0;
/// Fixed scan frame height
pub const SCAN_FRAME_HEIGHT: f64 = 200.0;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Parse `"w:h"` into a width/height ratio
pub fn parse_ratio(ratio: &str) -> Option<f64> {
    let (w, h) = ratio.trim().split_once(':')?;
    let w: f64 = w.trim().parse().ok()?;
    let h: f64 = h.trim().parse().ok()?;
    if w > 0.0 && h > 0.0 && w.is_finite() && h.is_finite() {
        Some(w / h)
    } else {
        None
    }
}

#[derive(Debug, Default)]
struct PreviewState {
    frame: Rect,
    opacity: f64,
    animations: Vec<(f64, Duration)>,
    opacity_history: Vec<f64>,
}

#[derive(Debug)]
pub struct HeadlessPreview {
    state: Mutex<PreviewState>,
}

impl Default for HeadlessPreview {
    fn default() -> Self {
        Self {
            state: Mutex::new(PreviewState {
                opacity: 1.0,
                ..PreviewState::default()
            }),
        }
    }
}

impl HeadlessPreview {
    pub fn frame(&self) -> Rect {
        lock(&self.state).frame
    }

    pub fn opacity(&self) -> f64 {
        lock(&self.state).opacity
    }

    /// Every opacity the preview was set or animated to, in order
    pub fn opacity_history(&self) -> Vec<f64> {
        lock(&self.state).opacity_history.clone()
    }

    pub fn animations(&self) -> Vec<(f64, Duration)> {
        lock(&self.state).animations.clone()
    }
}

impl PreviewSurface for HeadlessPreview {
    fn set_frame(&self, bounds: Rect) {
        lock(&self.state).frame = bounds;
    }

    fn set_opacity(&self, opacity: f64) {
        let mut state = lock(&self.state);
        state.opacity = opacity;
        state.opacity_history.push(opacity);
    }

    fn animate_opacity(&self, to: f64, duration: Duration) {
        // Nothing to render, so the animation lands immediately.
        let mut state = lock(&self.state);
        state.opacity = to;
        state.opacity_history.push(to);
        state.animations.push((to, duration));
    }
}

#[derive(Debug)]
struct ScannerState {
    frame: Rect,
    hidden: bool,
    frame_color: Color,
    laser_color: Color,
}

#[derive(Debug)]
pub struct HeadlessScanner {
    state: Mutex<ScannerState>,
}

impl HeadlessScanner {
    pub fn new(frame_color: Color, laser_color: Color) -> Self {
        Self {
            state: Mutex::new(ScannerState {
                frame: Rect::default(),
                hidden: true,
                frame_color,
                laser_color,
            }),
        }
    }

    pub fn is_hidden(&self) -> bool {
        lock(&self.state).hidden
    }

    pub fn frame_color(&self) -> Color {
        lock(&self.state).frame_color
    }

    pub fn laser_color(&self) -> Color {
        lock(&self.state).laser_color
    }
}

impl Default for HeadlessScanner {
    fn default() -> Self {
        Self::new(Color::WHITE, Color::RED)
    }
}

impl ScannerInterface for HeadlessScanner {
    fn set_frame(&self, bounds: Rect) {
        lock(&self.state).frame = bounds;
    }

    fn set_hidden(&self, hidden: bool) {
        lock(&self.state).hidden = hidden;
    }

    fn frame_size(&self) -> Size {
        let bounds = lock(&self.state).frame;
        Size {
            width: (bounds.size.width - 2.0 * SCAN_FRAME_OFFSET).max(0.0),
            height: SCAN_FRAME_HEIGHT.min(bounds.size.height.max(0.0)),
        }
    }

    fn update_frame_color(&self, color: Color) {
        lock(&self.state).frame_color = color;
    }

    fn update_laser_color(&self, color: Color) {
        lock(&self.state).laser_color = color;
    }
}

#[derive(Default)]
struct FocusState {
    frame: Rect,
    delegate: Option<Arc<dyn FocusDelegate>>,
    mode: FocusMode,
    reset_timeout_ms: u64,
    reset_on_motion: bool,
    resets: u32,
}

#[derive(Default)]
pub struct HeadlessFocus {
    state: Mutex<FocusState>,
}

impl HeadlessFocus {
    pub fn focus_mode(&self) -> FocusMode {
        lock(&self.state).mode
    }

    pub fn reset_timeout_ms(&self) -> u64 {
        lock(&self.state).reset_timeout_ms
    }

    pub fn reset_on_motion(&self) -> bool {
        lock(&self.state).reset_on_motion
    }

    pub fn reset_count(&self) -> u32 {
        lock(&self.state).resets
    }

    pub fn has_delegate(&self) -> bool {
        lock(&self.state).delegate.is_some()
    }

    /// A tap on the preview: focuses through the delegate when enabled
    pub fn tap(&self, point: Point) -> bool {
        let delegate = {
            let state = lock(&self.state);
            if state.mode == FocusMode::Off {
                return false;
            }
            state.delegate.clone()
        };
        match delegate {
            Some(delegate) => {
                delegate.focus_at(point);
                true
            }
            None => false,
        }
    }
}

impl FocusInterface for HeadlessFocus {
    fn set_frame(&self, bounds: Rect) {
        lock(&self.state).frame = bounds;
    }

    fn set_delegate(&self, delegate: Arc<dyn FocusDelegate>) {
        lock(&self.state).delegate = Some(delegate);
    }

    fn update_focus_mode(&self, mode: FocusMode) {
        lock(&self.state).mode = mode;
    }

    fn update_reset_focus_timeout(&self, timeout_ms: u64) {
        lock(&self.state).reset_timeout_ms = timeout_ms;
    }

    fn update_reset_focus_when_motion_detected(&self, enabled: bool) {
        lock(&self.state).reset_on_motion = enabled;
    }

    fn reset_focus(&self) {
        let delegate = {
            let mut state = lock(&self.state);
            state.resets += 1;
            state.delegate.clone()
        };
        if let Some(delegate) = delegate {
            delegate.reset_focus();
        }
    }
}

/// Shared record of one overlay's lifetime
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySnapshot {
    pub ratio: String,
    pub color: Option<Color>,
    pub frame: Rect,
    pub alive: bool,
}

pub struct HeadlessRatioOverlay {
    record: Arc<Mutex<OverlaySnapshot>>,
}

impl HeadlessRatioOverlay {
    /// Centered rectangle with the overlay ratio inside `bounds`
    pub fn inner_rect(ratio: &str, bounds: Rect) -> Option<Rect> {
        let ratio = parse_ratio(ratio)?;
        let Size { width, height } = bounds.size;
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        let (w, h) = if width / height > ratio {
            (height * ratio, height)
        } else {
            (width, width / ratio)
        };
        Some(Rect::new(
            bounds.origin.x + (width - w) / 2.0,
            bounds.origin.y + (height - h) / 2.0,
            w,
            h,
        ))
    }
}

impl RatioOverlay for HeadlessRatioOverlay {
    fn set_ratio(&mut self, ratio: &str) {
        lock(&self.record).ratio = ratio.to_string();
    }

    fn set_color(&mut self, color: Color) {
        lock(&self.record).color = Some(color);
    }

    fn set_frame(&mut self, bounds: Rect) {
        lock(&self.record).frame = bounds;
    }

    fn remove_from_view(self: Box<Self>) {
        lock(&self.record).alive = false;
    }
}

#[derive(Default)]
pub struct HeadlessHost {
    overlays: Mutex<Vec<Arc<Mutex<OverlaySnapshot>>>>,
    recognizers: Mutex<HashSet<RecognizerId>>,
    next_recognizer: AtomicU64,
}

impl HeadlessHost {
    /// Every overlay ever created, oldest first
    pub fn overlays(&self) -> Vec<OverlaySnapshot> {
        lock(&self.overlays)
            .iter()
            .map(|record| lock(record).clone())
            .collect()
    }

    pub fn live_overlays(&self) -> Vec<OverlaySnapshot> {
        self.overlays().into_iter().filter(|o| o.alive).collect()
    }

    pub fn active_recognizers(&self) -> usize {
        lock(&self.recognizers).len()
    }
}

impl ViewHost for HeadlessHost {
    fn create_ratio_overlay(
        &self,
        ratio: &str,
        color: Option<Color>,
        bounds: Rect,
    ) -> Box<dyn RatioOverlay> {
        let record = Arc::new(Mutex::new(OverlaySnapshot {
            ratio: ratio.to_string(),
            color,
            frame: bounds,
            alive: true,
        }));
        lock(&self.overlays).push(Arc::clone(&record));
        Box::new(HeadlessRatioOverlay { record })
    }

    fn add_pinch_recognizer(&self) -> RecognizerId {
        let id = RecognizerId(self.next_recognizer.fetch_add(1, Ordering::Relaxed));
        lock(&self.recognizers).insert(id);
        id
    }

    fn remove_pinch_recognizer(&self, id: RecognizerId) {
        lock(&self.recognizers).remove(&id);
    }
}

/// A full headless widget set with typed handles for inspection
#[derive(Clone)]
pub struct HeadlessWidgets {
    pub preview: Arc<HeadlessPreview>,
    pub scanner: Arc<HeadlessScanner>,
    pub focus: Arc<HeadlessFocus>,
    pub host: Arc<HeadlessHost>,
}

impl HeadlessWidgets {
    pub fn new() -> Self {
        Self::with_scanner_colors(Color::WHITE, Color::RED)
    }

    pub fn with_scanner_colors(frame_color: Color, laser_color: Color) -> Self {
        Self {
            preview: Arc::new(HeadlessPreview::default()),
            scanner: Arc::new(HeadlessScanner::new(frame_color, laser_color)),
            focus: Arc::new(HeadlessFocus::default()),
            host: Arc::new(HeadlessHost::default()),
        }
    }

    pub fn widget_set(&self) -> WidgetSet {
        WidgetSet {
            preview: self.preview.clone(),
            scanner: self.scanner.clone(),
            focus: self.focus.clone(),
            host: self.host.clone(),
        }
    }
}

impl Default for HeadlessWidgets {
    fn default() -> Self {
        Self::new()
    }
}
