use crate::error::Result;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Options controlling hierarchy building and multi-sample evaluation.
///
/// # Example
///
/// ```rust
/// use flow_gating::GatingConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = GatingConfig::new().strict_ranges(true).build()?;
/// assert!(config.strict_ranges);
/// assert!(config.parallel_samples);
///
/// let from_json = GatingConfig::from_json(r#"{ "parallel_samples": false }"#)?;
/// assert!(!from_json.strict_ranges);
/// assert!(!from_json.parallel_samples);
/// # Ok(())
/// # }
/// ```
#[derive(Builder, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[builder(default)]
#[serde(default)]
pub struct GatingConfig {
    /// Reject ranges with `min >= max` when building a hierarchy.
    /// When false they are accepted with a warning and select no events.
    pub strict_ranges: bool,

    /// Evaluate samples on the rayon thread pool in `gate_samples`
    #[builder(default = "true")]
    pub parallel_samples: bool,
}

impl Default for GatingConfig {
    fn default() -> Self {
        Self {
            strict_ranges: false,
            parallel_samples: true,
        }
    }
}

impl GatingConfig {
    /// Create a new builder for GatingConfig
    pub fn new() -> GatingConfigBuilder {
        GatingConfigBuilder::default()
    }

    /// Load a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
