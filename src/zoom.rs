//! Pinch-to-zoom gesture translation
//!
//! Owns at most one pinch recognizer registration, present exactly while the
//! zoom mode is on, and turns pinch phases into device zoom calls.

use crate::device::CameraDevice;
use crate::types::ZoomMode;
use crate::widgets::{RecognizerId, ViewHost};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinchPhase {
    Began,
    Changed,
    Ended,
    Cancelled,
}

/// One pinch recognizer callback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchGesture {
    pub phase: PinchPhase,
    /// Cumulative scale since the gesture began
    pub scale: f64,
}

impl PinchGesture {
    pub fn began() -> Self {
        Self {
            phase: PinchPhase::Began,
            scale: 1.0,
        }
    }

    pub fn changed(scale: f64) -> Self {
        Self {
            phase: PinchPhase::Changed,
            scale,
        }
    }

    pub fn ended(scale: f64) -> Self {
        Self {
            phase: PinchPhase::Ended,
            scale,
        }
    }
}

#[derive(Debug)]
struct PinchBinding {
    recognizer: RecognizerId,
    in_gesture: bool,
}

pub struct ZoomGestureController {
    device: Arc<dyn CameraDevice>,
    host: Arc<dyn ViewHost>,
    binding: Option<PinchBinding>,
}

impl ZoomGestureController {
    pub fn new(device: Arc<dyn CameraDevice>, host: Arc<dyn ViewHost>) -> Self {
        Self {
            device,
            host,
            binding: None,
        }
    }

    /// Register or unregister the pinch recognizer to match `mode`
    pub fn set_mode(&mut self, mode: ZoomMode) {
        match (mode, self.binding.is_some()) {
            (ZoomMode::On, false) => {
                let recognizer = self.host.add_pinch_recognizer();
                log::debug!("Pinch recognizer {:?} bound", recognizer);
                self.binding = Some(PinchBinding {
                    recognizer,
                    in_gesture: false,
                });
            }
            (ZoomMode::Off, true) => {
                if let Some(binding) = self.binding.take() {
                    self.host.remove_pinch_recognizer(binding.recognizer);
                    log::debug!("Pinch recognizer {:?} unbound", binding.recognizer);
                }
            }
            _ => {}
        }
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub fn recognizer(&self) -> Option<RecognizerId> {
        self.binding.as_ref().map(|b| b.recognizer)
    }

    /// Forward a pinch to the device. Returns false when no recognizer is bound.
    pub fn handle(&mut self, gesture: PinchGesture) -> bool {
        let Some(binding) = self.binding.as_mut() else {
            return false;
        };

        match gesture.phase {
            PinchPhase::Began => {
                if !binding.in_gesture {
                    binding.in_gesture = true;
                    self.device.zoom_pinch_start();
                }
            }
            PinchPhase::Changed => self.device.zoom_pinch_change(gesture.scale),
            // The device settles its own zoom state.
            PinchPhase::Ended | PinchPhase::Cancelled => binding.in_gesture = false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{DeviceCall, RecordingDevice};
    use crate::widgets::HeadlessHost;

    fn controller() -> (ZoomGestureController, Arc<RecordingDevice>, Arc<HeadlessHost>) {
        let device = Arc::new(RecordingDevice::new());
        let host = Arc::new(HeadlessHost::default());
        let controller = ZoomGestureController::new(device.clone(), host.clone());
        (controller, device, host)
    }

    #[test]
    fn test_gesture_sequence_maps_to_device_calls() {
        let (mut zoom, device, _) = controller();
        zoom.set_mode(ZoomMode::On);

        zoom.handle(PinchGesture::began());
        zoom.handle(PinchGesture::changed(1.5));
        zoom.handle(PinchGesture::changed(2.0));
        zoom.handle(PinchGesture::ended(2.0));

        assert_eq!(
            device.zoom_calls(),
            vec![
                DeviceCall::ZoomPinchStart,
                DeviceCall::ZoomPinchChange(1.5),
                DeviceCall::ZoomPinchChange(2.0),
            ]
        );
    }

    #[test]
    fn test_duplicate_began_starts_once() {
        let (mut zoom, device, _) = controller();
        zoom.set_mode(ZoomMode::On);
        zoom.handle(PinchGesture::began());
        zoom.handle(PinchGesture::began());
        assert_eq!(device.zoom_calls(), vec![DeviceCall::ZoomPinchStart]);
    }

    #[test]
    fn test_mode_toggle_never_duplicates_binding() {
        let (mut zoom, _, host) = controller();
        zoom.set_mode(ZoomMode::On);
        zoom.set_mode(ZoomMode::On);
        assert_eq!(host.active_recognizers(), 1);
        zoom.set_mode(ZoomMode::Off);
        zoom.set_mode(ZoomMode::Off);
        assert_eq!(host.active_recognizers(), 0);
        zoom.set_mode(ZoomMode::On);
        assert_eq!(host.active_recognizers(), 1);
    }

    #[test]
    fn test_unbound_gestures_are_ignored() {
        let (mut zoom, device, _) = controller();
        zoom.set_mode(ZoomMode::On);
        zoom.set_mode(ZoomMode::Off);
        assert!(!zoom.handle(PinchGesture::began()));
        assert!(!zoom.handle(PinchGesture::changed(3.0)));
        assert!(device.zoom_calls().is_empty());
    }
}
