use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Viewport Observer", inline)]
#[serde(default)]
/// Viewport-intersection observer parameters.
pub struct ObserverOptions {
    /// Fraction of a container that must be visible to count as
    /// intersecting.
    #[schemars(title = "Threshold", range(min = 0.0, max = 1.0))]
    pub threshold: f64,
    /// Margin grown around the viewport before testing intersection, in
    /// CSS margin syntax.
    #[schemars(title = "Root Margin")]
    pub root_margin: String,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            root_margin: "50px".to_owned(),
        }
    }
}
