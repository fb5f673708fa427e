//! Flat key-value configuration store
//!
//! Renderer tunables (light maximums, shadow map resolution, cull
//! threshold) are read through typed getters with defaults, so a missing
//! key is never an error. Values can be loaded from a TOML file whose
//! nested tables are flattened into `a.b.c` keys.

use std::collections::HashMap;
use thiserror::Error;

/// Well-known setting keys used by the render core
pub mod keys {
    /// Maximum point lights per draw (default 8)
    pub const MAX_POINT_LIGHTS: &str = "shading.max_point_lights";
    /// Maximum directional lights per draw (default 2)
    pub const MAX_DIRECTIONAL_LIGHTS: &str = "shading.max_directional_lights";
    /// Maximum spot lights per draw (default 2)
    pub const MAX_SPOT_LIGHTS: &str = "shading.max_spot_lights";
    /// Shadow map edge length in texels (default 512)
    pub const SHADOW_MAP_RESOLUTION: &str = "shading.shadow_map_resolution";
    /// Attenuated-intensity threshold below which a light is culled (default 0.001)
    pub const LIGHT_CULL_THRESHOLD: &str = "shading.light_cull_threshold";
    /// Validate shader programs before each draw in debug builds (default false)
    pub const VALIDATE_SHADERS: &str = "shading.validate_shaders";
}

/// A single configuration value
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    /// Boolean flag
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    Str(String),
}

/// Settings errors
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The TOML source failed to parse
    #[error("failed to parse settings: {0}")]
    Parse(String),
}

/// Flat configuration store with typed, defaulted lookups
#[derive(Debug, Default)]
pub struct Settings {
    values: HashMap<String, SettingValue>,
}

impl Settings {
    /// Create an empty store; every lookup falls back to its default
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document, flattening nested tables into dotted keys
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        let mut settings = Self::new();
        settings.merge_toml_str(text)?;
        Ok(settings)
    }

    /// Merge a TOML document into this store, overwriting existing keys
    pub fn merge_toml_str(&mut self, text: &str) -> Result<(), SettingsError> {
        let value: toml::Value = text
            .parse()
            .map_err(|e: toml::de::Error| SettingsError::Parse(e.to_string()))?;

        if let toml::Value::Table(table) = value {
            self.flatten_table("", &table);
            Ok(())
        } else {
            Err(SettingsError::Parse("top level is not a table".into()))
        }
    }

    fn flatten_table(&mut self, prefix: &str, table: &toml::value::Table) {
        for (name, value) in table {
            let key = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}.{name}")
            };

            match value {
                toml::Value::Boolean(b) => self.set(&key, SettingValue::Bool(*b)),
                toml::Value::Integer(i) => self.set(&key, SettingValue::Int(*i)),
                toml::Value::Float(f) => self.set(&key, SettingValue::Float(*f)),
                toml::Value::String(s) => self.set(&key, SettingValue::Str(s.clone())),
                toml::Value::Table(t) => self.flatten_table(&key, t),
                other => {
                    log::warn!("ignoring unsupported settings value at {key}: {other:?}");
                }
            }
        }
    }

    /// Store a value under a key
    pub fn set(&mut self, key: &str, value: SettingValue) {
        self.values.insert(key.to_owned(), value);
    }

    /// Boolean lookup with default
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(SettingValue::Bool(b)) => *b,
            Some(other) => {
                log::warn!("setting {key} has wrong type {other:?}, using default");
                default
            }
            None => default,
        }
    }

    /// Unsigned integer lookup with default
    pub fn get_u32(&self, key: &str, default: u32) -> u32 {
        match self.values.get(key) {
            Some(SettingValue::Int(i)) if *i >= 0 => {
                u32::try_from(*i).unwrap_or_else(|_| {
                    log::warn!("setting {key} out of u32 range, using default");
                    default
                })
            }
            Some(other) => {
                log::warn!("setting {key} has wrong type {other:?}, using default");
                default
            }
            None => default,
        }
    }

    /// Float lookup with default
    pub fn get_f32(&self, key: &str, default: f32) -> f32 {
        match self.values.get(key) {
            Some(SettingValue::Float(f)) => *f as f32,
            Some(SettingValue::Int(i)) => *i as f32,
            Some(other) => {
                log::warn!("setting {key} has wrong type {other:?}, using default");
                default
            }
            None => default,
        }
    }

    /// String lookup with default
    pub fn get_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.values.get(key) {
            Some(SettingValue::Str(s)) => s,
            Some(other) => {
                log::warn!("setting {key} has wrong type {other:?}, using default");
                default
            }
            None => default,
        }
    }
}
