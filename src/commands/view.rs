use super::registry::get_view;
use crate::permissions::PermissionState;
use crate::types::CaptureResult;

/// Capture a picture with a registered view
#[cfg_attr(feature = "plugin", tauri::command)]
pub async fn camera_view_capture(view_id: String) -> Result<CaptureResult, String> {
    log::info!("Capture requested for view {}", view_id);
    let view = get_view(&view_id)?;
    view.capture_async().await.map_err(|e| {
        log::error!("Capture for view {} failed: {}", view_id, e);
        e.diagnostic()
    })
}

#[cfg_attr(feature = "plugin", tauri::command)]
pub async fn camera_view_permission_state(view_id: String) -> Result<PermissionState, String> {
    Ok(get_view(&view_id)?.permission_state())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::registry::{register_view, unregister_view};
    use crate::config::{CamkitConfig, StorageConfig};
    use crate::permissions::{PermissionStatus, StaticPermissions};
    use crate::testing::{synthetic_photo, CaptureScript, ManualExecutor, RecordingDevice};
    use crate::view::CameraView;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_capture_command_reports_device_error() {
        let device = Arc::new(RecordingDevice::with_script(CaptureScript::Fail(
            "Camera is not set up".to_string(),
        )));
        let view = CameraView::builder(CamkitConfig::default())
            .device(device)
            .executor(Arc::new(ManualExecutor::new()))
            .permissions(Arc::new(StaticPermissions(PermissionStatus::Granted)))
            .build()
            .unwrap();
        register_view("command-test-error", Arc::new(view));

        let err = camera_view_capture("command-test-error".to_string())
            .await
            .unwrap_err();
        assert_eq!(err, "Camera is not set up");
        unregister_view("command-test-error");
    }

    #[tokio::test]
    async fn test_capture_command_saves_image() {
        let root = tempfile::tempdir().unwrap();
        let mut config = CamkitConfig::default();
        config.storage = StorageConfig {
            cache_root: Some(root.path().to_path_buf()),
            ..StorageConfig::default()
        };
        let device = Arc::new(RecordingDevice::with_script(CaptureScript::Succeed(
            synthetic_photo(32, 24, 9),
        )));
        let view = CameraView::builder(config)
            .device(device)
            .permissions(Arc::new(StaticPermissions(PermissionStatus::Granted)))
            .build()
            .unwrap();
        register_view("command-test-save", Arc::new(view));

        let result = camera_view_capture("command-test-save".to_string())
            .await
            .unwrap();
        assert_eq!((result.width, result.height), (32, 24));
        assert!(result.uri.starts_with("file://"));

        let state = camera_view_permission_state("command-test-save".to_string())
            .await
            .unwrap();
        assert!(matches!(
            state,
            PermissionState::Pending | PermissionState::Granted
        ));
        unregister_view("command-test-save");
    }
}
