//! Viewport settings, persisted as JSON in the platform config directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::camera::OrbitCameraConfig;
use crate::error::ConfigError;
use crate::scene::SceneSyncConfig;

/// Shadow casting from the directional light
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShadowSettings {
    pub enabled: bool,
    /// Shadow map resolution in texels per side
    pub map_size: u32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            map_size: 2048,
        }
    }
}

/// Ground plane under the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroundSettings {
    pub enabled: bool,
    pub center: [f32; 3],
    /// Multiplier on the scene size
    pub scale: f32,
    pub color: String,
    pub opacity: f32,
}

impl Default for GroundSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            center: [0.0; 3],
            scale: 2.0,
            color: "#555555".to_string(),
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LightSettings {
    pub hemisphere_sky_color: String,
    pub hemisphere_ground_color: String,
    pub hemisphere_intensity: f32,
    pub directional_color: String,
    pub directional_intensity: f32,
    /// Light position as a multiple of the scene size
    pub directional_position: [f32; 3],
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            hemisphere_sky_color: "#ffffff".to_string(),
            hemisphere_ground_color: "#444444".to_string(),
            hemisphere_intensity: 0.6,
            directional_color: "#ffffff".to_string(),
            directional_intensity: 0.8,
            directional_position: [0.5, 1.0, 0.7],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrbitCameraSettings {
    pub enabled: bool,
    pub config: OrbitCameraConfig,
}

impl Default for OrbitCameraSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            config: OrbitCameraConfig::default(),
        }
    }
}

/// All viewport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewportConfig {
    /// Initial surface size in logical pixels
    pub canvas: [u32; 2],
    /// Characteristic extent of the scene; sizes the ground and the light rig
    pub scene_size: f32,
    pub background_color: String,
    pub shadows: ShadowSettings,
    pub ground: GroundSettings,
    pub lights: LightSettings,
    pub orbit_camera: OrbitCameraSettings,
    pub scene_sync: SceneSyncConfig,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            canvas: [1280, 800],
            scene_size: 20.0,
            background_color: "#1e1e23".to_string(),
            shadows: ShadowSettings::default(),
            ground: GroundSettings::default(),
            lights: LightSettings::default(),
            orbit_camera: OrbitCameraSettings::default(),
            scene_sync: SceneSyncConfig::default(),
        }
    }
}

impl ViewportConfig {
    /// Settings file in the platform config directory
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "vcad", "vcad-viewport")
            .map(|dirs| dirs.config_dir().join("viewport.json"))
    }

    /// Load settings from the default location, or defaults if there are none
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("ignoring settings at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: ViewportConfig = serde_json::from_str(
            r##"{"sceneSize": 50, "shadows": {"enabled": false}, "orbitCamera": {"config": {"distance": 3}}}"##,
        )
        .unwrap();
        assert_eq!(config.scene_size, 50.0);
        assert!(!config.shadows.enabled);
        assert_eq!(config.shadows.map_size, 2048);
        assert_eq!(config.orbit_camera.config.distance, 3.0);
        assert!(config.orbit_camera.enabled);
        assert_eq!(config.scene_sync, SceneSyncConfig::default());
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("vcad-viewport-{}.json", uuid::Uuid::new_v4()));
        let mut config = ViewportConfig::default();
        config.background_color = "#000000".to_string();
        config.save_to(&path).unwrap();
        let loaded = ViewportConfig::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_errors() {
        let missing = std::env::temp_dir().join("vcad-viewport-missing-settings.json");
        assert!(matches!(ViewportConfig::load_from(&missing), Err(ConfigError::Io(_))));

        let path = std::env::temp_dir().join(format!("vcad-viewport-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "{ not json").unwrap();
        let result = ViewportConfig::load_from(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
