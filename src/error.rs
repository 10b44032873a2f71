use thiserror::Error;

/// Conditions that abort a run before (or instead of) producing candidates.
///
/// Cancellation and an empty result are not errors, see [`crate::SnapOutcome`].
#[derive(Debug, Error)]
pub enum SnapError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("selected polygon has no valid geometry")]
    EmptyGeometry,

    #[error("field '{field}' does not exist on the line layer (available: {})", available.join(", "))]
    MissingField {
        field: String,
        available: Vec<String>,
    },

    #[error("invalid tolerance: rounding precision {rounding_precision} must be positive and finer than erosion distance {erosion_distance}")]
    InvalidTolerance {
        rounding_precision: f64,
        erosion_distance: f64,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Geozero(#[from] geozero::error::GeozeroError),
}

impl SnapError {
    /// Stable machine-readable reason for the error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::EmptyGeometry => "empty_geometry",
            Self::MissingField { .. } => "configuration_error",
            Self::InvalidTolerance { .. } => "invalid_tolerance",
            Self::Io(_) | Self::Json(_) | Self::Geozero(_) => "io_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, SnapError>;
