use crate::view::CameraView;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

lazy_static::lazy_static! {
    static ref VIEW_REGISTRY: RwLock<HashMap<String, Arc<CameraView>>> = RwLock::new(HashMap::new());
}

/// Make a view reachable from host commands under `view_id`.
///
/// Returns the view previously registered under the same id, if any.
pub fn register_view(view_id: impl Into<String>, view: Arc<CameraView>) -> Option<Arc<CameraView>> {
    let view_id = view_id.into();
    log::debug!("Registering camera view {}", view_id);
    match VIEW_REGISTRY.write() {
        Ok(mut views) => views.insert(view_id, view),
        Err(poisoned) => poisoned.into_inner().insert(view_id, view),
    }
}

/// Remove a view and detach its device
pub fn unregister_view(view_id: &str) -> Option<Arc<CameraView>> {
    let removed = match VIEW_REGISTRY.write() {
        Ok(mut views) => views.remove(view_id),
        Err(poisoned) => poisoned.into_inner().remove(view_id),
    };
    if let Some(view) = &removed {
        log::info!("Unregistered camera view {}", view_id);
        view.remove_from_host();
    }
    removed
}

pub fn get_view(view_id: &str) -> Result<Arc<CameraView>, String> {
    let views = VIEW_REGISTRY
        .read()
        .map_err(|_| "View registry unavailable".to_string())?;
    views
        .get(view_id)
        .cloned()
        .ok_or_else(|| format!("No camera view registered as '{}'", view_id))
}

pub fn registered_views() -> Vec<String> {
    VIEW_REGISTRY
        .read()
        .map(|views| views.keys().cloned().collect())
        .unwrap_or_default()
}
