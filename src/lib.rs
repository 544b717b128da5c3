//! camkit: reactive camera view core
//!
//! This crate drives an embeddable camera view from a host UI layer. The host
//! delivers property snapshots, layout, pinch gestures and capture requests;
//! camkit turns them into calls on a [`CameraDevice`](device::CameraDevice)
//! and on the overlay widgets drawn above the preview.
//!
//! # Features
//! - Device setup gated on first props and a granted camera permission
//! - Per-prop reconciliation with no redundant device calls
//! - Still capture with shutter feedback and collision-free JPEG persistence
//! - Barcode events throttled to one per window
//! - Pinch-to-zoom that can be switched on and off at runtime
//! - An in-crate simulator device for hosts without camera hardware
//!
//! # Usage
//! ```rust,no_run
//! use camkit::{CameraView, CamkitConfig, CameraProps, ChangedProps};
//!
//! let view = CameraView::builder(CamkitConfig::load_or_default())
//!     .build()
//!     .expect("camera view");
//! view.set_props(CameraProps::default(), &ChangedProps::all());
//! ```
//!
//! With the `plugin` feature, a Tauri app can expose registered views:
//! ```rust,ignore
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(camkit::init())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
pub mod capture;
pub mod commands;
pub mod config;
pub mod device;
pub mod errors;
pub mod executor;
pub mod permissions;
pub mod props;
pub mod reconciler;
pub mod setup;
pub mod storage;
pub mod throttle;
pub mod timing;
pub mod types;
pub mod view;
pub mod widgets;
pub mod zoom;

// Testing utilities - deterministic doubles for offline testing
pub mod testing;

// Re-exports for convenience
pub use config::CamkitConfig;
pub use device::{CameraDevice, DeviceBackend, SimulatorCamera};
pub use errors::CameraError;
pub use executor::{Executor, ThreadedExecutor};
pub use permissions::{PermissionState, PermissionStatus};
pub use props::{CameraProps, ChangedProps, EventHandler, PropName};
pub use types::{CaptureResult, CodeFormat, Platform, ScanEvent};
pub use view::{ButtonPhase, CameraView, CameraViewBuilder};
pub use zoom::PinchGesture;

#[cfg(feature = "plugin")]
use tauri::{
    plugin::{Builder, TauriPlugin},
    Runtime,
};

/// Initialize the camkit plugin with all commands
#[cfg(feature = "plugin")]
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("camkit")
        .invoke_handler(tauri::generate_handler![
            commands::view::camera_view_capture,
            commands::view::camera_view_permission_state,
            commands::permissions::check_camera_permission_status,
        ])
        .build()
}

/// Initialize logging for the camera view
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "camkit=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        platform: Platform::current(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub platform: Platform,
}
