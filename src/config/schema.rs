//! Configuration schema types for `tileblend.toml`
//!
//! Defines the structure and validation rules for the asset root, the blend
//! parameters and the static catalog.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::catalog::{Catalog, CategorySpec, FLOORS};
use crate::transition::{BlendParams, DEFAULT_CHANCES};

/// Where images come from and how they are loaded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Asset root, relative to the config file
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Image file extension
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Loader threads; absent or 0 loads inline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self { root: default_root(), extension: default_extension(), jobs: None }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("images")
}

fn default_extension() -> String {
    "png".to_string()
}

/// Edge blend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendConfig {
    /// Substitution chance per band, outermost first, in percent
    #[serde(default = "default_chances")]
    pub chances: Vec<u8>,
    /// Seed for reproducible output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Category holding the floor tile images
    #[serde(default = "default_floor_category")]
    pub floor_category: String,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self { chances: default_chances(), seed: None, floor_category: default_floor_category() }
    }
}

impl BlendConfig {
    pub fn params(&self) -> BlendParams {
        BlendParams::new(self.chances.clone())
    }
}

fn default_chances() -> Vec<u8> {
    DEFAULT_CHANCES.to_vec()
}

fn default_floor_category() -> String {
    FLOORS.to_string()
}

/// Root configuration structure for `tileblend.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileblendConfig {
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub blend: BlendConfig,
    /// The static catalog, one table per category
    #[serde(default = "default_catalog")]
    pub categories: Catalog,
}

impl Default for TileblendConfig {
    fn default() -> Self {
        Self {
            assets: AssetsConfig::default(),
            blend: BlendConfig::default(),
            categories: default_catalog(),
        }
    }
}

/// 32x32 retained floors accepting any identifier.
pub fn default_catalog() -> Catalog {
    Catalog::new().with_category(FLOORS, CategorySpec::new(32, 32).retained())
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "blend.chances")
    pub field: String,
    /// Error message
    pub message: String,
}

impl ConfigValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tileblend.toml: '{}' {}", self.field, self.message)
    }
}

impl TileblendConfig {
    /// Validate the configuration and return every problem found
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors: Vec<ConfigValidationError> = self
            .blend
            .params()
            .validate()
            .into_iter()
            .map(|message| ConfigValidationError::new("blend.chances", message))
            .collect();

        if self.assets.extension.is_empty() {
            errors.push(ConfigValidationError::new("assets.extension", "must be a non-empty string"));
        }

        let floor = &self.blend.floor_category;
        match self.categories.category(floor) {
            None => errors.push(ConfigValidationError::new(
                "blend.floor_category",
                format!("names category '{}', which is not in [categories]", floor),
            )),
            Some(spec) => {
                if !spec.retain {
                    errors.push(ConfigValidationError::new(
                        format!("categories.{}.retain", floor),
                        "must be true for the floor category",
                    ));
                }
                let band = self.blend.chances.len() as u32;
                if band > spec.width.min(spec.height) {
                    errors.push(ConfigValidationError::new(
                        "blend.chances",
                        format!(
                            "blend band of {} pixels is larger than the {}x{} floor tile",
                            band, spec.width, spec.height
                        ),
                    ));
                }
            }
        }

        for problem in self.categories.validate() {
            let error = match problem.split_once(": ") {
                Some((field, message)) => ConfigValidationError::new(field, message),
                None => ConfigValidationError::new("categories", problem),
            };
            errors.push(error);
        }

        errors
    }
}
