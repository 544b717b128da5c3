//! Camera authorization
//!
//! A [`PermissionProvider`] answers the current authorization status and can
//! ask the user for access. Answers may arrive on any thread; the view hands
//! them to its UI executor before touching setup state.

use crate::executor::Executor;
use std::sync::Arc;

/// Permission status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PermissionStatus {
    /// Permission granted
    Granted,
    /// Permission denied
    Denied,
    /// Permission not determined (user hasn't been asked yet)
    NotDetermined,
    /// Permission restricted (parental controls, etc)
    Restricted,
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionStatus::Granted => write!(f, "granted"),
            PermissionStatus::Denied => write!(f, "denied"),
            PermissionStatus::NotDetermined => write!(f, "not_determined"),
            PermissionStatus::Restricted => write!(f, "restricted"),
        }
    }
}

/// What a view knows about its camera permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "state", content = "status", rename_all = "lowercase")]
pub enum PermissionState {
    /// Check or request still in flight
    Pending,
    Granted,
    /// Setup will never happen for this view
    Denied(PermissionStatus),
}

/// Detailed permission information
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PermissionInfo {
    pub status: PermissionStatus,
    pub message: String,
    pub can_request: bool,
}

/// Callback receiving the user's answer; may run on any thread
pub type AccessCallback = Box<dyn FnOnce(bool) + Send>;

pub trait PermissionProvider: Send + Sync {
    fn authorization_status(&self) -> PermissionStatus;

    /// Ask for access. Only meaningful while the status is `NotDetermined`.
    fn request_access(&self, on_result: AccessCallback);
}

/// Resolves the camera permission for one view.
///
/// The outcome is always delivered on the UI executor. A prompt, when needed,
/// is issued from the background executor.
pub struct PermissionGate {
    provider: Arc<dyn PermissionProvider>,
    executor: Arc<dyn Executor>,
}

impl PermissionGate {
    pub fn new(provider: Arc<dyn PermissionProvider>, executor: Arc<dyn Executor>) -> Self {
        Self { provider, executor }
    }

    pub fn start<F>(&self, on_resolved: F)
    where
        F: FnOnce(PermissionState) + Send + 'static,
    {
        let status = self.provider.authorization_status();
        log::debug!("Camera authorization status: {}", status);

        match status {
            PermissionStatus::Granted => {
                self.executor
                    .dispatch_ui(Box::new(move || on_resolved(PermissionState::Granted)));
            }
            PermissionStatus::NotDetermined => {
                let provider = Arc::clone(&self.provider);
                let ui = Arc::clone(&self.executor);
                self.executor.dispatch_background(Box::new(move || {
                    provider.request_access(Box::new(move |granted| {
                        let state = if granted {
                            PermissionState::Granted
                        } else {
                            PermissionState::Denied(PermissionStatus::Denied)
                        };
                        ui.dispatch_ui(Box::new(move || on_resolved(state)));
                    }));
                }));
            }
            PermissionStatus::Denied | PermissionStatus::Restricted => {
                log::warn!("Camera access {}; the view stays inactive", status);
                self.executor.dispatch_ui(Box::new(move || {
                    on_resolved(PermissionState::Denied(status))
                }));
            }
        }
    }
}

/// Provider with a fixed answer
#[derive(Debug, Clone, Copy)]
pub struct StaticPermissions(pub PermissionStatus);

impl PermissionProvider for StaticPermissions {
    fn authorization_status(&self) -> PermissionStatus {
        self.0
    }

    fn request_access(&self, on_result: AccessCallback) {
        on_result(self.0 == PermissionStatus::Granted);
    }
}

/// Provider backed by the operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPermissions;

impl PermissionProvider for SystemPermissions {
    fn authorization_status(&self) -> PermissionStatus {
        check_permission()
    }

    fn request_access(&self, on_result: AccessCallback) {
        #[cfg(target_os = "macos")]
        {
            request_access_macos(on_result);
        }

        #[cfg(not(target_os = "macos"))]
        {
            // No programmatic prompt here; access is granted through the OS.
            let info = check_permission_detailed();
            log::warn!("Cannot prompt for camera access: {}", info.message);
            on_result(info.status == PermissionStatus::Granted);
        }
    }
}

/// Check camera permission status
pub fn check_permission() -> PermissionStatus {
    check_permission_detailed().status
}

/// Check camera permission status with detailed information
pub fn check_permission_detailed() -> PermissionInfo {
    #[cfg(target_os = "macos")]
    {
        check_permission_macos()
    }

    #[cfg(target_os = "linux")]
    {
        check_permission_linux()
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        // Windows enforces its privacy setting when the device is opened.
        PermissionInfo {
            status: PermissionStatus::Granted,
            message: "Camera access governed by system privacy settings".to_string(),
            can_request: false,
        }
    }
}

#[cfg(target_os = "macos")]
fn av_media_type_video() -> Option<*mut objc::runtime::Object> {
    use objc::runtime::{Class, Object};
    use objc::{msg_send, sel, sel_impl};
    use std::ffi::CString;

    let class = Class::get("AVCaptureDevice")?;
    let media = CString::new("vide").ok()?;
    let media_type: *mut Object = unsafe { msg_send![class, mediaTypeForString: media.as_ptr()] };
    Some(media_type)
}

#[cfg(target_os = "macos")]
fn check_permission_macos() -> PermissionInfo {
    use objc::runtime::Class;
    use objc::{msg_send, sel, sel_impl};

    let (Some(class), Some(media_type)) = (Class::get("AVCaptureDevice"), av_media_type_video())
    else {
        return PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "AVFoundation not available".to_string(),
            can_request: false,
        };
    };

    // AVAuthorizationStatus: 0 not determined, 1 restricted, 2 denied, 3 authorized
    let auth_status: i64 = unsafe { msg_send![class, authorizationStatusForMediaType: media_type] };

    match auth_status {
        3 => PermissionInfo {
            status: PermissionStatus::Granted,
            message: "Camera access authorized".to_string(),
            can_request: false,
        },
        2 => PermissionInfo {
            status: PermissionStatus::Denied,
            message: "Camera access denied - enable in System Settings > Privacy & Security > Camera"
                .to_string(),
            can_request: false,
        },
        1 => PermissionInfo {
            status: PermissionStatus::Restricted,
            message: "Camera access restricted by system policy".to_string(),
            can_request: false,
        },
        _ => PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "Camera permission not yet requested".to_string(),
            can_request: true,
        },
    }
}

#[cfg(target_os = "macos")]
fn request_access_macos(on_result: AccessCallback) {
    use block::ConcreteBlock;
    use objc::runtime::Class;
    use objc::{msg_send, sel, sel_impl};
    use std::sync::Mutex;

    let (Some(class), Some(media_type)) = (Class::get("AVCaptureDevice"), av_media_type_video())
    else {
        on_result(false);
        return;
    };

    // The completion block is Fn; the answer is delivered once.
    let slot = Mutex::new(Some(on_result));
    let handler = ConcreteBlock::new(move |granted: bool| {
        if let Some(callback) = slot.lock().ok().and_then(|mut s| s.take()) {
            callback(granted);
        }
    });
    let handler = handler.copy();

    log::info!("Requesting macOS camera permission");
    let _: () = unsafe {
        msg_send![class, requestAccessForMediaType:media_type completionHandler:&*handler]
    };
}

#[cfg(target_os = "linux")]
fn check_permission_linux() -> PermissionInfo {
    use std::fs;
    use std::path::Path;

    let video_devices: Vec<_> = (0..10)
        .map(|i| format!("/dev/video{}", i))
        .filter(|path| Path::new(path).exists())
        .collect();

    let Some(first_device) = video_devices.first() else {
        return PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "No video devices found at /dev/video*".to_string(),
            can_request: false,
        };
    };

    match fs::metadata(first_device) {
        Ok(_) if check_linux_group_membership() => PermissionInfo {
            status: PermissionStatus::Granted,
            message: format!(
                "Camera access granted (user in video group, {} found)",
                first_device
            ),
            can_request: false,
        },
        Ok(_) => PermissionInfo {
            status: PermissionStatus::Denied,
            message: format!(
                "Camera device {} exists but user not in video group - run: sudo usermod -a -G video $USER",
                first_device
            ),
            can_request: true,
        },
        Err(e) => PermissionInfo {
            status: PermissionStatus::Denied,
            message: format!("Cannot access {}: {}", first_device, e),
            can_request: true,
        },
    }
}

#[cfg(target_os = "linux")]
fn check_linux_group_membership() -> bool {
    use std::process::Command;

    Command::new("groups")
        .output()
        .ok()
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|groups| groups.contains("video") || groups.contains("plugdev"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_status_strings() {
        assert_eq!(PermissionStatus::Granted.to_string(), "granted");
        assert_eq!(PermissionStatus::NotDetermined.to_string(), "not_determined");
    }

    #[test]
    fn test_static_provider_answers_requests() {
        let (tx, rx) = mpsc::channel();
        StaticPermissions(PermissionStatus::Denied).request_access(Box::new(move |granted| {
            tx.send(granted).unwrap();
        }));
        assert!(!rx.recv().unwrap());
    }

    #[test]
    fn test_permission_state_serializes_tagged() {
        let json = serde_json::to_value(PermissionState::Denied(PermissionStatus::Restricted))
            .unwrap();
        assert_eq!(json["state"], "denied");
        assert_eq!(json["status"], "Restricted");
        let pending = serde_json::to_value(PermissionState::Pending).unwrap();
        assert_eq!(pending["state"], "pending");
    }

    fn resolve_with(
        provider: Arc<dyn PermissionProvider>,
        executor: &Arc<crate::testing::ManualExecutor>,
    ) -> Arc<std::sync::Mutex<Option<PermissionState>>> {
        let slot = Arc::new(std::sync::Mutex::new(None));
        let out = Arc::clone(&slot);
        PermissionGate::new(provider, executor.clone()).start(move |state| {
            *out.lock().unwrap() = Some(state);
        });
        slot
    }

    #[test]
    fn test_gate_granted_resolves_on_ui_turn() {
        let executor = Arc::new(crate::testing::ManualExecutor::new());
        let slot = resolve_with(
            Arc::new(StaticPermissions(PermissionStatus::Granted)),
            &executor,
        );
        assert!(slot.lock().unwrap().is_none());
        executor.run_ui_turn();
        assert_eq!(*slot.lock().unwrap(), Some(PermissionState::Granted));
    }

    #[test]
    fn test_gate_prompts_from_background() {
        let executor = Arc::new(crate::testing::ManualExecutor::new());
        let provider = Arc::new(crate::testing::DeferredPermissions::new(
            PermissionStatus::NotDetermined,
        ));
        let slot = resolve_with(provider.clone(), &executor);

        assert_eq!(provider.pending_requests(), 0);
        executor.run_background();
        assert_eq!(provider.pending_requests(), 1);

        provider.resolve(false);
        assert!(slot.lock().unwrap().is_none());
        executor.run_ui_turn();
        assert_eq!(
            *slot.lock().unwrap(),
            Some(PermissionState::Denied(PermissionStatus::Denied))
        );
    }

    #[test]
    fn test_gate_restricted_is_recorded() {
        let executor = Arc::new(crate::testing::ManualExecutor::new());
        let slot = resolve_with(
            Arc::new(StaticPermissions(PermissionStatus::Restricted)),
            &executor,
        );
        executor.run_until_idle();
        assert_eq!(
            *slot.lock().unwrap(),
            Some(PermissionState::Denied(PermissionStatus::Restricted))
        );
    }

    #[test]
    fn test_system_check_does_not_panic() {
        let result = std::panic::catch_unwind(check_permission);
        assert!(result.is_ok());
    }
}
