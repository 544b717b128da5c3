//! Prop change fan-out
//!
//! Each changed prop maps to one independent action against the device or a
//! widget. Props that did not change are never re-applied, and absent values
//! only affect their own field.

use crate::device::{CameraDevice, DecodeHandler, DeviceUpdate};
use crate::executor::Executor;
use crate::props::{CameraProps, ChangedProps, PropName};
use crate::throttle::BarcodeThrottle;
use crate::types::{CodeFormat, Rect};
use crate::widgets::{RatioOverlay, WidgetSet};
use crate::zoom::{PinchGesture, ZoomGestureController};
use std::sync::Arc;

/// Formats requested whenever scanning is on
pub fn scan_targets(props: &CameraProps) -> Vec<CodeFormat> {
    if props.scanning_active() {
        CodeFormat::ALL.to_vec()
    } else {
        Vec::new()
    }
}

pub struct PropReconciler {
    device: Arc<dyn CameraDevice>,
    widgets: WidgetSet,
    executor: Arc<dyn Executor>,
    throttle: Arc<BarcodeThrottle>,
    zoom: ZoomGestureController,
    ratio_overlay: Option<Box<dyn RatioOverlay>>,
    bounds: Rect,
}

impl PropReconciler {
    pub fn new(
        device: Arc<dyn CameraDevice>,
        widgets: WidgetSet,
        executor: Arc<dyn Executor>,
        throttle: Arc<BarcodeThrottle>,
    ) -> Self {
        let zoom = ZoomGestureController::new(Arc::clone(&device), Arc::clone(&widgets.host));
        Self {
            device,
            widgets,
            executor,
            throttle,
            zoom,
            ratio_overlay: None,
            bounds: Rect::default(),
        }
    }

    pub fn throttle(&self) -> &Arc<BarcodeThrottle> {
        &self.throttle
    }

    pub fn zoom(&self) -> &ZoomGestureController {
        &self.zoom
    }

    pub fn zoom_mut(&mut self) -> &mut ZoomGestureController {
        &mut self.zoom
    }

    pub fn handle_pinch(&mut self, gesture: PinchGesture) -> bool {
        self.zoom.handle(gesture)
    }

    pub fn has_ratio_overlay(&self) -> bool {
        self.ratio_overlay.is_some()
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Apply the actions for every prop in `changed`
    pub fn apply(&mut self, props: &CameraProps, changed: &ChangedProps) {
        if changed.is_empty() {
            return;
        }
        log::debug!("Reconciling {} changed props", changed.len());

        self.apply_camera(props, changed);
        self.apply_ratio_overlay(props, changed);
        self.apply_scanner(props, changed);
        self.apply_focus(props, changed);

        if changed.contains(PropName::ZoomMode) {
            self.zoom.set_mode(props.zoom_mode);
        }
        if changed.contains(PropName::Zoom) {
            self.device.update(DeviceUpdate::Zoom(props.zoom));
        }
        if changed.contains(PropName::MaxZoom) {
            self.device.update(DeviceUpdate::MaxZoom(props.max_zoom));
        }
    }

    fn apply_camera(&self, props: &CameraProps, changed: &ChangedProps) {
        if changed.contains(PropName::CameraType) {
            self.device.update(DeviceUpdate::Facing(props.camera_type));
        }
        if changed.contains(PropName::FlashMode) {
            self.device.update(DeviceUpdate::FlashMode(props.flash_mode));
        }
        // Switching cameras resets the torch on the new one.
        if changed.any(&[PropName::CameraType, PropName::TorchMode]) {
            self.device.update(DeviceUpdate::TorchMode(props.torch_mode));
        }
        // Device-originated events reach the host on a later UI turn.
        if changed.contains(PropName::OnOrientationChange) {
            self.device.update(DeviceUpdate::OnOrientationChange(
                props
                    .on_orientation_change
                    .as_ref()
                    .map(|h| h.on_ui(&self.executor)),
            ));
        }
        if changed.contains(PropName::OnZoom) {
            self.device.update(DeviceUpdate::OnZoom(
                props.on_zoom.as_ref().map(|h| h.on_ui(&self.executor)),
            ));
        }
        if changed.contains(PropName::ResizeMode) {
            self.device.update(DeviceUpdate::ResizeMode(props.resize_mode));
        }
    }

    fn apply_ratio_overlay(&mut self, props: &CameraProps, changed: &ChangedProps) {
        if changed.contains(PropName::RatioOverlay) {
            match (props.ratio_overlay(), self.ratio_overlay.as_mut()) {
                (Some(ratio), Some(overlay)) => overlay.set_ratio(ratio),
                (Some(ratio), None) => {
                    log::debug!("Creating {} ratio overlay", ratio);
                    self.ratio_overlay = Some(self.widgets.host.create_ratio_overlay(
                        ratio,
                        props.ratio_overlay_color,
                        self.bounds,
                    ));
                }
                (None, _) => {
                    if let Some(overlay) = self.ratio_overlay.take() {
                        log::debug!("Removing ratio overlay");
                        overlay.remove_from_view();
                    }
                }
            }
        }

        if changed.contains(PropName::RatioOverlayColor) {
            if let (Some(color), Some(overlay)) =
                (props.ratio_overlay_color, self.ratio_overlay.as_mut())
            {
                overlay.set_color(color);
            }
        }
    }

    fn apply_scanner(&self, props: &CameraProps, changed: &ChangedProps) {
        if changed.contains(PropName::ScanThrottleDelay) {
            self.throttle.set_window_ms(props.scan_throttle_delay);
        }

        if changed.any(&[PropName::ScanBarcode, PropName::OnReadCode]) {
            let enabled = props.scanning_active();
            log::info!("Barcode scanning {}", if enabled { "on" } else { "off" });
            self.device
                .set_barcode_scanning(enabled, scan_targets(props), self.decode_handler(props));
        }

        if changed.any(&[PropName::ShowFrame, PropName::ScanBarcode]) {
            // Runs after the current batch so layout for this turn lands first.
            let show_frame = props.show_frame;
            let scanner = Arc::clone(&self.widgets.scanner);
            let device = Arc::clone(&self.device);
            self.executor.dispatch_ui(Box::new(move || {
                scanner.set_hidden(!show_frame);
                let frame = show_frame.then(|| scanner.frame_size());
                device.update(DeviceUpdate::ScanFrameSize(frame));
            }));
        }

        if changed.contains(PropName::LaserColor) {
            if let Some(color) = props.laser_color {
                self.widgets.scanner.update_laser_color(color);
            }
        }
        if changed.contains(PropName::FrameColor) {
            if let Some(color) = props.frame_color {
                self.widgets.scanner.update_frame_color(color);
            }
        }
    }

    fn decode_handler(&self, props: &CameraProps) -> DecodeHandler {
        match &props.on_read_code {
            Some(sink) => self.throttle.decode_handler(sink.on_ui(&self.executor)),
            None => Arc::new(|value: String, format: CodeFormat| {
                log::trace!("No code handler; dropping {} {}", format, value);
            }),
        }
    }

    fn apply_focus(&self, props: &CameraProps, changed: &ChangedProps) {
        let focus = &self.widgets.focus;
        if changed.contains(PropName::FocusMode) {
            focus.update_focus_mode(props.focus_mode);
        }
        if changed.contains(PropName::ResetFocusTimeout) {
            focus.update_reset_focus_timeout(props.reset_focus_timeout);
        }
        if changed.contains(PropName::ResetFocusWhenMotionDetected) {
            focus.update_reset_focus_when_motion_detected(props.reset_focus_when_motion_detected);
        }
    }

    /// Lay every widget out in `bounds` and refresh the scan frame geometry
    pub fn set_frame(&mut self, bounds: Rect, props: &CameraProps) {
        self.bounds = bounds;
        self.widgets.preview.set_frame(bounds);
        self.widgets.scanner.set_frame(bounds);
        let frame = props.show_frame.then(|| self.widgets.scanner.frame_size());
        self.device.update(DeviceUpdate::ScanFrameSize(frame));
        self.widgets.focus.set_frame(bounds);
        if let Some(overlay) = self.ratio_overlay.as_mut() {
            overlay.set_frame(bounds);
        }
    }
}
