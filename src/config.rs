use crate::error::{Result, SnapError};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_ROUNDING_PRECISION: f64 = 1e-6;
pub const DEFAULT_EROSION_DISTANCE: f64 = 1e-4;

/// The two distance constants of a run.
///
/// `rounding_precision` is the identity granularity of endpoints,
/// `erosion_distance` is how far the boundary is shrunk for the strict
/// interior test. The precision must be finer than the erosion distance,
/// otherwise two endpoints can share a key while one of them passes
/// containment only because of the rounding.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tolerance {
    pub rounding_precision: f64,
    pub erosion_distance: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance {
            rounding_precision: DEFAULT_ROUNDING_PRECISION,
            erosion_distance: DEFAULT_EROSION_DISTANCE,
        }
    }
}

impl Tolerance {
    pub fn new(rounding_precision: f64, erosion_distance: f64) -> Result<Self> {
        let tolerance = Tolerance {
            rounding_precision,
            erosion_distance,
        };
        tolerance.validate()?;
        Ok(tolerance)
    }

    pub fn validate(&self) -> Result<()> {
        let valid = self.rounding_precision.is_finite()
            && self.erosion_distance.is_finite()
            && self.rounding_precision > 0.
            && self.rounding_precision < self.erosion_distance;
        if valid {
            Ok(())
        } else {
            Err(SnapError::InvalidTolerance {
                rounding_precision: self.rounding_precision,
                erosion_distance: self.erosion_distance,
            })
        }
    }
}

/// Settings read from a JSON file, e.g.
///
/// ```json
/// { "field": "class", "tolerance": { "erosion_distance": 0.001 } }
/// ```
///
/// Command line flags take priority over the file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnapConfig {
    pub field: Option<String>,
    pub tolerance: Tolerance,
}

impl SnapConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SnapError::InvalidInput(format!(
                "The provided config path {path:?} does not exist"
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: SnapConfig = serde_json::from_str(content)?;
        config.tolerance.validate()?;
        Ok(config)
    }
}
