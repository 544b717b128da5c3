//! Host-environment stand-in for a real capture device
//!
//! Keeps the configuration it is given, emulates pinch zoom, and produces a
//! synthetic JPEG for each capture so the whole view pipeline can run without
//! camera hardware.

use super::{CameraDevice, CaptureCallbacks, CapturedPhoto, DecodeHandler, DeviceUpdate};
use crate::config::DeviceConfig;
use crate::props::EventHandler;
use crate::types::{
    CameraFacing, CodeFormat, Dimensions, FlashMode, Orientation, OrientationEvent, Point,
    ResizeMode, Size, TorchMode, ZoomEvent,
};
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageResult, Rgb, RgbImage};
use std::sync::{Arc, Mutex, MutexGuard};

pub const DEFAULT_MAX_ZOOM: f64 = 16.0;
const JPEG_QUALITY: u8 = 85;

#[derive(Default)]
struct SimulatorState {
    setup_facing: Option<CameraFacing>,
    setup_calls: u32,
    facing: CameraFacing,
    flash_mode: FlashMode,
    torch_mode: TorchMode,
    resize_mode: ResizeMode,
    zoom: f64,
    zoom_at_pinch_start: f64,
    max_zoom: Option<f64>,
    on_zoom: Option<EventHandler<ZoomEvent>>,
    on_orientation_change: Option<EventHandler<OrientationEvent>>,
    scanning: bool,
    scan_targets: Vec<CodeFormat>,
    on_decode: Option<DecodeHandler>,
    scan_frame: Option<Size>,
    last_focus: Option<Point>,
    detached: bool,
}

pub struct SimulatorCamera {
    state: Arc<Mutex<SimulatorState>>,
    resolution: Dimensions,
    default_max_zoom: f64,
}

impl SimulatorCamera {
    pub fn new(resolution: Dimensions) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimulatorState {
                zoom: 1.0,
                zoom_at_pinch_start: 1.0,
                ..SimulatorState::default()
            })),
            resolution,
            default_max_zoom: DEFAULT_MAX_ZOOM,
        }
    }

    pub fn from_config(config: &DeviceConfig) -> Self {
        let mut camera = Self::new(Dimensions {
            width: config.simulator_resolution[0],
            height: config.simulator_resolution[1],
        });
        camera.default_max_zoom = config.default_max_zoom;
        camera
    }

    fn state(&self) -> MutexGuard<'_, SimulatorState> {
        // The state holds plain values; a poisoned guard is still consistent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn clamp_zoom(&self, state: &SimulatorState, zoom: f64) -> f64 {
        let max = state.max_zoom.unwrap_or(self.default_max_zoom).max(1.0);
        zoom.clamp(1.0, max)
    }

    /// Feed a decoded code through the registered handler.
    ///
    /// Returns false when scanning is off or the format isn't targeted.
    pub fn simulate_code(&self, value: &str, format: CodeFormat) -> bool {
        let handler = {
            let state = self.state();
            if !state.scanning || !state.scan_targets.contains(&format) {
                return false;
            }
            state.on_decode.clone()
        };
        match handler {
            Some(handler) => {
                handler(value.to_string(), format);
                true
            }
            None => false,
        }
    }

    pub fn simulate_orientation(&self, orientation: Orientation) {
        let handler = self.state().on_orientation_change.clone();
        if let Some(handler) = handler {
            handler.emit(OrientationEvent { orientation });
        }
    }

    pub fn setup_calls(&self) -> u32 {
        self.state().setup_calls
    }

    pub fn setup_facing(&self) -> Option<CameraFacing> {
        self.state().setup_facing
    }

    pub fn facing(&self) -> CameraFacing {
        self.state().facing
    }

    pub fn torch_mode(&self) -> TorchMode {
        self.state().torch_mode
    }

    pub fn flash_mode(&self) -> FlashMode {
        self.state().flash_mode
    }

    pub fn resize_mode(&self) -> ResizeMode {
        self.state().resize_mode
    }

    pub fn zoom(&self) -> f64 {
        self.state().zoom
    }

    pub fn scan_frame(&self) -> Option<Size> {
        self.state().scan_frame
    }

    pub fn is_scanning(&self) -> bool {
        self.state().scanning
    }

    pub fn last_focus(&self) -> Option<Point> {
        self.state().last_focus
    }

    pub fn is_detached(&self) -> bool {
        self.state().detached
    }
}

impl CameraDevice for SimulatorCamera {
    fn setup(&self, facing: CameraFacing, scan_targets: &[CodeFormat]) {
        let mut state = self.state();
        state.setup_calls += 1;
        state.setup_facing = Some(facing);
        state.facing = facing;
        if !scan_targets.is_empty() {
            state.scan_targets = scan_targets.to_vec();
        }
        log::info!(
            "Simulator set up: facing={:?}, {} scan targets",
            facing,
            scan_targets.len()
        );
    }

    fn update(&self, update: DeviceUpdate) {
        log::debug!("Simulator update: {:?}", update);
        let mut state = self.state();
        match update {
            DeviceUpdate::Facing(facing) => state.facing = facing,
            DeviceUpdate::FlashMode(mode) => state.flash_mode = mode,
            DeviceUpdate::TorchMode(mode) => {
                // No torch on the front camera.
                state.torch_mode = match state.facing {
                    CameraFacing::Front => TorchMode::Off,
                    CameraFacing::Back => mode,
                };
            }
            DeviceUpdate::ResizeMode(mode) => state.resize_mode = mode,
            DeviceUpdate::OnOrientationChange(handler) => state.on_orientation_change = handler,
            DeviceUpdate::OnZoom(handler) => state.on_zoom = handler,
            DeviceUpdate::Zoom(Some(zoom)) => {
                state.zoom = self.clamp_zoom(&state, zoom);
            }
            DeviceUpdate::Zoom(None) => {}
            DeviceUpdate::MaxZoom(max_zoom) => {
                state.max_zoom = max_zoom;
                state.zoom = self.clamp_zoom(&state, state.zoom);
            }
            DeviceUpdate::ScanFrameSize(size) => state.scan_frame = size,
        }
    }

    fn set_barcode_scanning(
        &self,
        enabled: bool,
        scan_targets: Vec<CodeFormat>,
        on_decode: DecodeHandler,
    ) {
        let mut state = self.state();
        state.scanning = enabled && !scan_targets.is_empty();
        state.scan_targets = scan_targets;
        state.on_decode = Some(on_decode);
    }

    fn capture_picture(&self, callbacks: CaptureCallbacks) {
        let (ready, detached) = {
            let state = self.state();
            (state.setup_facing.is_some(), state.detached)
        };
        if detached || !ready {
            (callbacks.on_error)("Camera is not set up".to_string());
            return;
        }

        let resolution = self.resolution;
        // Shared so the callbacks can still be answered if the worker never starts.
        let slot = Arc::new(Mutex::new(Some(callbacks)));
        let worker_slot = Arc::clone(&slot);
        let spawned = std::thread::Builder::new()
            .name("camkit-sim-capture".to_string())
            .spawn(move || {
                let taken = worker_slot
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .take();
                if let Some(callbacks) = taken {
                    run_capture(callbacks, resolution);
                }
            });
        if let Err(e) = spawned {
            log::error!("Failed to spawn simulator capture thread: {}", e);
            let taken = slot.lock().unwrap_or_else(|e| e.into_inner()).take();
            if let Some(callbacks) = taken {
                (callbacks.on_error)(format!("Failed to start capture: {}", e));
            }
        }
    }

    fn zoom_pinch_start(&self) {
        let mut state = self.state();
        state.zoom_at_pinch_start = state.zoom;
    }

    fn zoom_pinch_change(&self, scale: f64) {
        let (zoom, handler) = {
            let mut state = self.state();
            let desired = state.zoom_at_pinch_start * scale;
            let zoom = self.clamp_zoom(&state, desired);
            if (zoom - state.zoom).abs() < f64::EPSILON {
                return;
            }
            state.zoom = zoom;
            (zoom, state.on_zoom.clone())
        };
        if let Some(handler) = handler {
            handler.emit(ZoomEvent { zoom });
        }
    }

    fn focus_at(&self, point: Point) {
        self.state().last_focus = Some(point);
    }

    fn reset_focus(&self) {
        self.state().last_focus = None;
    }

    fn detach_from_host(&self) {
        let mut state = self.state();
        state.detached = true;
        state.scanning = false;
        state.on_decode = None;
        log::info!("Simulator detached from host");
    }
}

fn run_capture(callbacks: CaptureCallbacks, resolution: Dimensions) {
    (callbacks.on_will_capture)();
    match synthetic_jpeg(resolution.width, resolution.height, 0) {
        Ok(image) => (callbacks.on_success)(CapturedPhoto {
            image: Bytes::from(image),
            thumbnail: None,
            dimensions: resolution,
        }),
        Err(e) => (callbacks.on_error)(format!("Failed to encode image: {}", e)),
    }
}

/// Encode a gradient test card as JPEG. `seed` shifts the pattern.
pub fn synthetic_jpeg(width: u32, height: u32, seed: u8) -> ImageResult<Vec<u8>> {
    let image = RgbImage::from_fn(width.max(1), height.max(1), |x, y| {
        Rgb([
            seed.wrapping_add((x % 256) as u8),
            seed.wrapping_add((y % 256) as u8),
            seed.wrapping_add(((x + y) % 256) as u8),
        ])
    });

    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, JPEG_QUALITY).encode_image(&image)?;
    Ok(encoded)
}
