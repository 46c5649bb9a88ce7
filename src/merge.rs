//! Dataset merger: combines the three point-of-interest tables into one
//! weighted point set.
//!
//! Each input row is tagged with its source category and assigned that
//! category's configured importance weight. Rows are concatenated in the
//! fixed category order bus stops → hospitals → restaurants, preserving
//! per-table input order; downstream tie-breaking depends on this order.

use serde::{Deserialize, Serialize};

use crate::error::{GeoInsightsError, Result};
use crate::GeoPoint;

/// Column names every POI table must carry.
pub const REQUIRED_POI_COLUMNS: &[&str] = &["id", "latitude", "longitude"];

/// Source category of a point of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoiCategory {
    BusStop,
    Hospital,
    Restaurant,
}

impl PoiCategory {
    /// Stable serialized name, used as marker metadata in the map hand-off.
    pub fn as_str(&self) -> &'static str {
        match self {
            PoiCategory::BusStop => "bus_stop",
            PoiCategory::Hospital => "hospital",
            PoiCategory::Restaurant => "restaurant",
        }
    }
}

/// One row of an input POI table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoiRecord {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl PoiRecord {
    pub fn new(id: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.to_string(),
            latitude,
            longitude,
        }
    }
}

/// A merged point: immutable once constructed from an input row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedPoint {
    pub id: String,
    pub point: GeoPoint,
    /// Category importance weight (non-negative)
    pub weight: f64,
    pub category: PoiCategory,
}

/// Ordered collection of weighted points, concatenation order preserved
/// from the merge.
#[derive(Debug, Clone, Default)]
pub struct PointSet {
    points: Vec<WeightedPoint>,
}

impl PointSet {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[WeightedPoint] {
        &self.points
    }

    /// Coordinates in merge order.
    pub fn coords(&self) -> Vec<GeoPoint> {
        self.points.iter().map(|p| p.point).collect()
    }

    /// Weight vector aligned positionally with [`PointSet::coords`].
    pub fn weights(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.weight).collect()
    }
}

/// Configuration for the spatial optimization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Importance weight for bus stops. Default: 0.5
    pub bus_stops_weight: f64,
    /// Importance weight for hospitals. Default: 1.0
    pub hospitals_weight: f64,
    /// Importance weight for restaurants. Default: 0.25
    pub restaurants_weight: f64,
    /// Number of recommended locations to return. Default: 5
    pub num_locations: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            bus_stops_weight: 0.5,
            hospitals_weight: 1.0,
            restaurants_weight: 0.25,
            num_locations: 5,
        }
    }
}

impl SiteConfig {
    /// Validate the configuration before any data is touched.
    ///
    /// Weights must be non-negative and the location count positive.
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("bus_stops_weight", self.bus_stops_weight),
            ("hospitals_weight", self.hospitals_weight),
            ("restaurants_weight", self.restaurants_weight),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(GeoInsightsError::InvalidConfiguration {
                    message: format!("{} must be a non-negative float, got {}", name, value),
                });
            }
        }
        if self.num_locations == 0 {
            return Err(GeoInsightsError::InvalidConfiguration {
                message: "num_locations must be a positive integer".to_string(),
            });
        }
        Ok(())
    }
}

/// Check that a loader-supplied header row carries every required column.
///
/// Intended for the external CSV loaders; the library itself only ever sees
/// typed rows.
pub fn ensure_columns(table: &str, headers: &[&str], required: &[&str]) -> Result<()> {
    for column in required {
        if !headers.contains(column) {
            return Err(GeoInsightsError::MissingColumn {
                table: table.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

/// Merge the three POI tables into a single weighted point set.
///
/// Output length equals the sum of the input lengths; every output point
/// carries its category's configured weight. The configuration is validated
/// first, so a negative weight rejects the merge before any row is read.
pub fn merge_datasets(
    bus_stops: &[PoiRecord],
    hospitals: &[PoiRecord],
    restaurants: &[PoiRecord],
    config: &SiteConfig,
) -> Result<PointSet> {
    config.validate()?;

    let mut points = Vec::with_capacity(bus_stops.len() + hospitals.len() + restaurants.len());

    let categories = [
        (bus_stops, PoiCategory::BusStop, config.bus_stops_weight),
        (hospitals, PoiCategory::Hospital, config.hospitals_weight),
        (
            restaurants,
            PoiCategory::Restaurant,
            config.restaurants_weight,
        ),
    ];

    for (records, category, weight) in categories {
        for record in records {
            points.push(WeightedPoint {
                id: record.id.clone(),
                point: GeoPoint::new(record.latitude, record.longitude),
                weight,
                category,
            });
        }
    }

    log::debug!(
        "[Merge] {} bus stops + {} hospitals + {} restaurants -> {} points",
        bus_stops.len(),
        hospitals.len(),
        restaurants.len(),
        points.len()
    );

    Ok(PointSet { points })
}
