//! Configuration module for nodescript-rs
//!
//! Engine settings are read from a TOML file. Every section and field has a
//! default, so a partial file (or none at all) is valid.
//!
//! # Default Location
//!
//! - **Linux**: `~/.config/nodescript-rs/config.toml`
//! - **macOS**: `~/Library/Application Support/nodescript-rs/config.toml`
//! - **Windows**: `%APPDATA%\nodescript-rs\config.toml`
//!
//! # Example
//!
//! ```toml
//! [sandbox]
//! max_operations = 200000
//!
//! [world]
//! gravity = 980.0
//!
//! [host]
//! frame_rate = 30
//! response_timeout_ms = 250
//! ```

use crate::error::{NodeScriptError, Result};
use crate::world::{Entity, Screen, Vec2, WorldSnapshot};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for config directories
pub const APP_ID: &str = "nodescript-rs";

/// Config filename inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Platform config directory for this application.
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Path of the default config file.
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

/// Resource limits applied to the sandbox's Rhai engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxLimits {
    /// Operations allowed per entry-point call (0 = unlimited)
    pub max_operations: u64,
    pub max_call_levels: usize,
    /// Maximum expression nesting depth at global level
    pub max_expr_depth: usize,
    /// Maximum expression nesting depth inside functions
    pub max_function_expr_depth: usize,
    pub max_string_size: usize,
    pub max_array_size: usize,
    pub max_map_size: usize,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            max_operations: 100_000,
            max_call_levels: 64,
            max_expr_depth: 128,
            max_function_expr_depth: 128,
            max_string_size: 10_000,
            max_array_size: 10_000,
            max_map_size: 10_000,
        }
    }
}

/// Settings used to build the initial world snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldDefaults {
    pub screen_width: f64,
    pub screen_height: f64,
    pub gravity: f64,
    /// Spawn a static `player` entity in fresh worlds
    pub spawn_player: bool,
}

impl Default for WorldDefaults {
    fn default() -> Self {
        Self {
            screen_width: 800.0,
            screen_height: 600.0,
            gravity: 0.0,
            spawn_player: true,
        }
    }
}

impl WorldDefaults {
    /// Build a fresh world snapshot from these settings.
    pub fn snapshot(&self) -> WorldSnapshot {
        let screen = Screen {
            width: self.screen_width,
            height: self.screen_height,
        };
        let world = WorldSnapshot::new(screen, self.gravity);
        if self.spawn_player {
            world.with_object(
                "player",
                Entity::fixed(Vec2::new(50.0, 50.0), Vec2::new(50.0, 50.0)),
            )
        } else {
            world
        }
    }
}

/// Host loop timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Target frames per second for real-time runs
    pub frame_rate: u32,
    /// How long to wait for a sandbox reply (0 = wait forever)
    pub response_timeout_ms: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            response_timeout_ms: 0,
        }
    }
}

impl HostConfig {
    pub fn frame_delta(&self) -> f64 {
        1.0 / f64::from(self.frame_rate.max(1))
    }

    pub fn response_timeout(&self) -> Option<Duration> {
        (self.response_timeout_ms > 0).then(|| Duration::from_millis(self.response_timeout_ms))
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sandbox: SandboxLimits,
    pub world: WorldDefaults,
    pub host: HostConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            NodeScriptError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            NodeScriptError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Load configuration, returning defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Load from the platform default location. A missing file is not an
    /// error.
    pub fn load_default_location() -> Self {
        match default_config_path() {
            Some(path) if path.exists() => Self::load_or_default(path),
            _ => Self::default(),
        }
    }

    /// Save configuration as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                NodeScriptError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| NodeScriptError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            NodeScriptError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }
}
