use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Particle Field", inline)]
#[serde(default)]
/// Particle field simulation parameters.
pub struct ParticleOptions {
    /// Number of particles scattered in the field.
    #[schemars(title = "Particle Count", range(min = 1, max = 500))]
    pub count: usize,
    /// Maximum absolute velocity per axis, in pixels per frame.
    #[schemars(title = "Max Speed", range(min = 0.1, max = 10.0))]
    pub max_speed: f32,
}

impl Default for ParticleOptions {
    fn default() -> Self {
        Self {
            count: 30,
            max_speed: 1.0,
        }
    }
}
