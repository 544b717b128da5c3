use crate::permissions::{check_permission_detailed, PermissionInfo};

/// Current camera permission as the operating system reports it
#[cfg_attr(feature = "plugin", tauri::command)]
pub async fn check_camera_permission_status() -> Result<PermissionInfo, String> {
    let info = check_permission_detailed();
    log::info!("Camera permission status: {} ({})", info.status, info.message);
    Ok(info)
}
