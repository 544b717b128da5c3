//! The camera view
//!
//! `CameraView` owns one device and the widgets drawn over it. Props, layout
//! and gestures are applied on the executor's UI thread: inline when the
//! caller is already there, on the next UI turn otherwise. Device and
//! permission callbacks may arrive anywhere and are handed to the executor
//! first, so a host callback may call straight back into the view.

use crate::capture::CaptureCoordinator;
use crate::config::CamkitConfig;
use crate::device::{select_device, CameraDevice, DeviceFocusDelegate};
use crate::errors::CameraError;
use crate::executor::{Executor, ThreadedExecutor};
use crate::permissions::{PermissionGate, PermissionProvider, PermissionState, SystemPermissions};
use crate::props::{CameraProps, ChangedProps};
use crate::reconciler::{scan_targets, PropReconciler};
use crate::setup::{SetupGate, SetupPhase, Transition};
use crate::storage::ImageStore;
use crate::throttle::BarcodeThrottle;
use crate::timing::{Clock, MonotonicClock};
use crate::types::{CaptureResult, Rect};
use crate::widgets::{HeadlessWidgets, WidgetSet};
use crate::zoom::PinchGesture;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

/// Phase of a hardware capture button event
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonPhase {
    Began,
    Ended,
    Cancelled,
}

struct ViewState {
    props: CameraProps,
    gate: SetupGate,
    permission: PermissionState,
    reconciler: PropReconciler,
}

struct ViewShared {
    device: Arc<dyn CameraDevice>,
    executor: Arc<dyn Executor>,
    state: Mutex<ViewState>,
}

impl ViewShared {
    /// Run `task` on the UI thread, inline when already there
    fn on_ui<F>(self: &Arc<Self>, task: F)
    where
        F: FnOnce(&ViewShared) + Send + 'static,
    {
        if self.executor.is_ui_thread() {
            task(self);
            return;
        }
        let weak = Arc::downgrade(self);
        self.executor.dispatch_ui(Box::new(move || match weak.upgrade() {
            Some(shared) => task(&shared),
            None => log::debug!("View dropped before its UI task ran"),
        }));
    }

    fn apply_props(&self, props: CameraProps, changed: &ChangedProps) {
        let mut state = self.state();
        state.props = props;

        if state.gate.mark_configuration_ready() == Transition::Fire {
            self.fire_setup(&state);
        }

        let ViewState {
            props, reconciler, ..
        } = &mut *state;
        reconciler.apply(props, changed);
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        // Widget and device calls never leave the state half-updated.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn fire_setup(&self, state: &ViewState) {
        let targets = scan_targets(&state.props);
        log::info!(
            "Setting up {:?} camera with {} scan targets",
            state.props.camera_type,
            targets.len()
        );
        self.device.setup(state.props.camera_type, &targets);
    }

    fn permission_resolved(&self, permission: PermissionState) {
        let mut state = self.state();
        state.permission = permission;
        if permission != PermissionState::Granted {
            log::warn!("Camera permission not granted: {:?}", permission);
            return;
        }
        if state.gate.mark_permission_granted() == Transition::Fire {
            self.fire_setup(&state);
        }
    }
}

pub struct CameraView {
    shared: Arc<ViewShared>,
    capture: CaptureCoordinator,
}

impl std::fmt::Debug for CameraView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraView").finish_non_exhaustive()
    }
}

impl CameraView {
    pub fn builder(config: CamkitConfig) -> CameraViewBuilder {
        CameraViewBuilder::new(config)
    }

    /// Deliver a snapshot and the names of the props that changed in it
    pub fn set_props(&self, props: CameraProps, changed: &ChangedProps) {
        let changed = changed.clone();
        self.shared
            .on_ui(move |shared| shared.apply_props(props, &changed));
    }

    /// Deliver a full snapshot; changes are found against the snapshot
    /// current when it is applied
    pub fn update_props(&self, props: CameraProps) {
        self.shared.on_ui(move |shared| {
            let changed = CameraProps::diff(&shared.state().props, &props);
            shared.apply_props(props, &changed);
        });
    }

    pub fn set_frame(&self, bounds: Rect) {
        self.shared.on_ui(move |shared| {
            let mut state = shared.state();
            let ViewState {
                props, reconciler, ..
            } = &mut *state;
            reconciler.set_frame(bounds, props);
        });
    }

    /// Returns false when pinch-to-zoom is off
    pub fn handle_pinch(&self, gesture: PinchGesture) -> bool {
        let bound = self.shared.state().reconciler.zoom().is_bound();
        if bound {
            self.shared.on_ui(move |shared| {
                shared.state().reconciler.handle_pinch(gesture);
            });
        }
        bound
    }

    pub fn capture<S, E>(&self, on_success: S, on_error: E)
    where
        S: FnOnce(CaptureResult) + Send + 'static,
        E: FnOnce(String) + Send + 'static,
    {
        self.capture.capture(on_success, on_error);
    }

    pub async fn capture_async(&self) -> Result<CaptureResult, CameraError> {
        self.capture.capture_async().await
    }

    pub fn hardware_button(&self, phase: ButtonPhase) {
        let handler = {
            let state = self.shared.state();
            match phase {
                ButtonPhase::Began => state.props.on_capture_button_press_in.clone(),
                ButtonPhase::Ended => state.props.on_capture_button_press_out.clone(),
                ButtonPhase::Cancelled => None,
            }
        };
        if let Some(handler) = handler {
            handler.emit(());
        }
    }

    /// The host dropped the view; release the device now
    pub fn remove_from_host(&self) {
        log::info!("Camera view removed from host");
        self.shared.device.detach_from_host();
    }

    pub fn permission_state(&self) -> PermissionState {
        self.shared.state().permission
    }

    pub fn setup_phase(&self) -> SetupPhase {
        self.shared.state().gate.phase()
    }

    pub fn props(&self) -> CameraProps {
        self.shared.state().props.clone()
    }

    pub fn scan_throttle_ms(&self) -> u64 {
        self.shared.state().reconciler.throttle().window_ms()
    }

    pub fn device(&self) -> &Arc<dyn CameraDevice> {
        &self.shared.device
    }
}

/// Assembles a [`CameraView`] from its collaborators
pub struct CameraViewBuilder {
    config: CamkitConfig,
    device: Option<Arc<dyn CameraDevice>>,
    hardware: Option<Arc<dyn CameraDevice>>,
    widgets: Option<WidgetSet>,
    executor: Option<Arc<dyn Executor>>,
    permissions: Option<Arc<dyn PermissionProvider>>,
    clock: Option<Arc<dyn Clock>>,
}

impl CameraViewBuilder {
    pub fn new(config: CamkitConfig) -> Self {
        Self {
            config,
            device: None,
            hardware: None,
            widgets: None,
            executor: None,
            permissions: None,
            clock: None,
        }
    }

    /// Use exactly this device, skipping backend selection
    pub fn device(mut self, device: Arc<dyn CameraDevice>) -> Self {
        self.device = Some(device);
        self
    }

    /// Offer a hardware device; the simulator may still be chosen
    pub fn hardware_device(mut self, device: Arc<dyn CameraDevice>) -> Self {
        self.hardware = Some(device);
        self
    }

    pub fn widgets(mut self, widgets: WidgetSet) -> Self {
        self.widgets = Some(widgets);
        self
    }

    pub fn executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn permissions(mut self, permissions: Arc<dyn PermissionProvider>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<CameraView, CameraError> {
        self.config.validate().map_err(CameraError::Configuration)?;
        let config = self.config;

        let device = match self.device {
            Some(device) => device,
            None => select_device(&config, self.hardware),
        };
        let widgets = self
            .widgets
            .unwrap_or_else(|| HeadlessWidgets::new().widget_set());
        let executor: Arc<dyn Executor> = match self.executor {
            Some(executor) => executor,
            None => Arc::new(ThreadedExecutor::new()?),
        };
        let permissions = self
            .permissions
            .unwrap_or_else(|| Arc::new(SystemPermissions));
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));

        let throttle = Arc::new(BarcodeThrottle::new(config.scanner.throttle_ms, clock));
        let mut reconciler = PropReconciler::new(
            Arc::clone(&device),
            widgets.clone(),
            Arc::clone(&executor),
            throttle,
        );

        let props = CameraProps {
            scan_throttle_delay: config.scanner.throttle_ms,
            ..CameraProps::default()
        };

        widgets.focus.update_focus_mode(props.focus_mode);
        widgets.focus.update_reset_focus_timeout(props.reset_focus_timeout);
        widgets
            .focus
            .update_reset_focus_when_motion_detected(props.reset_focus_when_motion_detected);
        reconciler.zoom_mut().set_mode(props.zoom_mode);

        widgets.scanner.update_frame_color(config.scanner.frame_color);
        widgets.scanner.update_laser_color(config.scanner.laser_color);
        widgets.scanner.set_hidden(true);

        widgets
            .focus
            .set_delegate(Arc::new(DeviceFocusDelegate(Arc::clone(&device))));

        let capture = CaptureCoordinator::new(
            Arc::clone(&device),
            Arc::clone(&widgets.preview),
            Arc::clone(&widgets.focus),
            Arc::clone(&executor),
            ImageStore::new(config.storage.clone()),
        )
        .with_shutter_animation(Duration::from_millis(config.shutter.animation_ms));

        let shared = Arc::new(ViewShared {
            device,
            executor: Arc::clone(&executor),
            state: Mutex::new(ViewState {
                props,
                gate: SetupGate::new(),
                permission: PermissionState::Pending,
                reconciler,
            }),
        });

        let weak: Weak<ViewShared> = Arc::downgrade(&shared);
        PermissionGate::new(permissions, executor).start(move |permission| {
            match weak.upgrade() {
                Some(shared) => shared.permission_resolved(permission),
                None => log::debug!("View dropped before permission resolved"),
            }
        });

        Ok(CameraView { shared, capture })
    }
}
