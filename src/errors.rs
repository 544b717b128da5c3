use thiserror::Error;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("Permission denied error: {0}")]
    PermissionDenied(String),
    #[error("Capture error: {0}")]
    DeviceCapture(String),
    #[error("Error occurred while writing image data to a temporary file: {source}")]
    Persistence {
        #[from]
        source: std::io::Error,
    },
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Executor error: {0}")]
    Executor(String),
}

impl CameraError {
    /// Human-readable diagnostic handed to host error continuations.
    pub fn diagnostic(&self) -> String {
        match self {
            // Device messages are surfaced untouched.
            CameraError::DeviceCapture(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}
