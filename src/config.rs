//! Configuration management for camkit
//!
//! Provides loading, saving and validation of the settings that are not
//! host props: where captures are stored, scanner defaults, shutter feedback
//! timing and device selection.

use crate::errors::CameraError;
use crate::props::DEFAULT_SCAN_THROTTLE_MS;
use crate::types::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Fixed path segment isolating this widget's files from other cache users
pub const PRODUCT_NAMESPACE: &str = "rs.camkit.camera-view";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CamkitConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub shutter: ShutterConfig,
    #[serde(default)]
    pub device: DeviceConfig,
}

/// Where captured images are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Cache root override; the platform cache directory when unset
    pub cache_root: Option<PathBuf>,
    /// Application identifier appended to the cache root when set
    pub bundle_id: Option<String>,
    /// Directory holding this widget's captures
    pub product_namespace: String,
}

/// Scanner defaults applied before the host sends props
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Minimum interval between scan events in milliseconds
    pub throttle_ms: u64,
    /// Initial scan frame color
    pub frame_color: Color,
    /// Initial laser color
    pub laser_color: Color,
}

/// Shutter feedback animation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShutterConfig {
    /// Fade-in duration after the preview blanks, in milliseconds
    pub animation_ms: u64,
}

/// Device backend selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Always use the simulator, even when hardware is supplied
    pub simulator: bool,
    /// Simulated capture resolution [width, height]
    pub simulator_resolution: [u32; 2],
    /// Zoom ceiling when the host sets no max zoom
    pub default_max_zoom: f64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cache_root: None,
            bundle_id: None,
            product_namespace: PRODUCT_NAMESPACE.to_string(),
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            throttle_ms: DEFAULT_SCAN_THROTTLE_MS,
            frame_color: Color::WHITE,
            laser_color: Color::RED,
        }
    }
}

impl Default for ShutterConfig {
    fn default() -> Self {
        Self { animation_ms: 350 }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            simulator: false,
            simulator_resolution: [1920, 1080],
            default_max_zoom: 16.0,
        }
    }
}

impl StorageConfig {
    /// `<cache-root>[/<bundle-id>]/<product-namespace>`
    pub fn capture_dir(&self) -> Result<PathBuf, CameraError> {
        let mut dir = match &self.cache_root {
            Some(root) => root.clone(),
            None => dirs::cache_dir().ok_or_else(|| {
                CameraError::Configuration("no cache directory on this platform".to_string())
            })?,
        };
        if let Some(bundle_id) = self.bundle_id.as_deref().filter(|b| !b.is_empty()) {
            dir.push(bundle_id);
        }
        dir.push(&self.product_namespace);
        Ok(dir)
    }
}

impl CamkitConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CameraError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            CameraError::Configuration(format!("Failed to read config file: {}", e))
        })?;

        let config: CamkitConfig = toml::from_str(&contents).map_err(|e| {
            CameraError::Configuration(format!("Failed to parse config file: {}", e))
        })?;

        config.validate().map_err(CameraError::Configuration)?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CameraError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CameraError::Configuration(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(|e| {
            CameraError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, toml_string).map_err(|e| {
            CameraError::Configuration(format!("Failed to write config file: {}", e))
        })?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("camkit.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        let namespace = self.storage.product_namespace.trim();
        if namespace.is_empty() {
            return Err("Product namespace must not be empty".to_string());
        }
        if namespace.contains(['/', '\\']) || namespace == "." || namespace == ".." {
            return Err("Product namespace must be a single path segment".to_string());
        }
        if let Some(bundle_id) = &self.storage.bundle_id {
            if bundle_id.contains(['/', '\\']) {
                return Err("Bundle id must be a single path segment".to_string());
            }
        }

        if self.shutter.animation_ms > 10_000 {
            return Err("Shutter animation must be at most 10000 ms".to_string());
        }

        let [width, height] = self.device.simulator_resolution;
        if width == 0 || height == 0 || width > 8192 || height > 8192 {
            return Err("Simulator resolution must be between 1 and 8192".to_string());
        }
        if !(self.device.default_max_zoom >= 1.0) {
            return Err("Default max zoom must be at least 1.0".to_string());
        }

        Ok(())
    }
}
