//! Unified error handling for the geo-insights library.
//!
//! Every analysis in this crate is a one-shot batch computation, so all
//! errors are fail-fast: the run aborts with a descriptive message and
//! nothing is retried or partially recovered.

use std::fmt;

/// Unified error type for geo-insights operations.
#[derive(Debug, Clone)]
pub enum GeoInsightsError {
    /// A configuration value is out of range (negative weight, zero K,
    /// non-positive bandwidth)
    InvalidConfiguration { message: String },
    /// Bandwidth selection is ill-defined for the given point set
    InsufficientData {
        point_count: usize,
        message: String,
    },
    /// Density model fitting failed (empty point set, malformed coordinates)
    ModelFitError { message: String },
    /// An input table lacks a required column
    MissingColumn { table: String, column: String },
}

impl fmt::Display for GeoInsightsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoInsightsError::InvalidConfiguration { message } => {
                write!(f, "Invalid configuration: {}", message)
            }
            GeoInsightsError::InsufficientData {
                point_count,
                message,
            } => {
                write!(f, "Insufficient data ({} points): {}", point_count, message)
            }
            GeoInsightsError::ModelFitError { message } => {
                write!(f, "Model fit failed: {}", message)
            }
            GeoInsightsError::MissingColumn { table, column } => {
                write!(
                    f,
                    "Table '{}' is missing required column '{}'",
                    table, column
                )
            }
        }
    }
}

impl std::error::Error for GeoInsightsError {}

/// Result type alias for geo-insights operations.
pub type Result<T> = std::result::Result<T, GeoInsightsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GeoInsightsError::InsufficientData {
            point_count: 1,
            message: "need at least 2 points".to_string(),
        };
        assert!(err.to_string().contains("1 points"));
        assert!(err.to_string().contains("at least 2"));
    }

    #[test]
    fn test_missing_column_display() {
        let err = GeoInsightsError::MissingColumn {
            table: "bus_stops".to_string(),
            column: "latitude".to_string(),
        };
        assert!(err.to_string().contains("bus_stops"));
        assert!(err.to_string().contains("latitude"));
    }
}
