//! Gallery configuration with TOML file support.
//!
//! Everything tweakable outside the code (observer tuning, the DOM class
//! contract, particle simulation) lives here. Options serialize to/from
//! TOML; every sub-struct uses `#[serde(default)]` so a partial file only
//! overrides what it names.

mod layout;
mod observer;
mod particles;

use std::path::Path;

pub use layout::LayoutOptions;
pub use observer::ObserverOptions;
pub use particles::ParticleOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::GalleryError;

/// Top-level options container.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct GalleryOptions {
    /// Viewport-intersection observer parameters.
    pub observer: ObserverOptions,
    /// DOM class and attribute names.
    pub layout: LayoutOptions,
    /// Particle field parameters.
    pub particles: ParticleOptions,
}

impl GalleryOptions {
    /// Generate JSON Schema describing the user-facing options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(GalleryOptions)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, GalleryError> {
        let content = std::fs::read_to_string(path).map_err(GalleryError::Io)?;
        Self::from_toml(&content)
    }

    /// Parse options from a TOML string. Missing fields use defaults.
    pub fn from_toml(content: &str) -> Result<Self, GalleryError> {
        toml::from_str(content)
            .map_err(|e| GalleryError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<(), GalleryError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| GalleryError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(GalleryError::Io)?;
        }
        std::fs::write(path, content).map_err(GalleryError::Io)
    }
}
