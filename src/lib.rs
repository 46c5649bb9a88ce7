//! # Geo Insights
//!
//! Batch geospatial analytics for business and operations data.
//!
//! This library provides three independent analyses:
//! - **Site recommendation** - weighted kernel density estimation over a
//!   haversine metric, scoring candidate locations and returning the top K
//! - **Cohort retention** - user-retention matrix from activity events
//! - **Travel distance** - per-entity daily travel totals from GPS pings
//!
//! Every analysis is a synchronous, single-pass batch computation with no
//! shared state between runs. CSV loading, argument parsing and rendering
//! live outside the library; inputs arrive as typed rows and results leave
//! as typed records (plus a GeoJSON hand-off for map markers).
//!
//! ## Quick Start
//!
//! ```rust
//! use geo_insights::{recommend_locations, PoiRecord, SiteConfig};
//!
//! let bus_stops = vec![
//!     PoiRecord::new("b1", 17.380, 78.480),
//!     PoiRecord::new("b2", 17.385, 78.486),
//! ];
//! let hospitals = vec![
//!     PoiRecord::new("h1", 17.382, 78.482),
//!     PoiRecord::new("h2", 17.410, 78.500),
//! ];
//! let restaurants = vec![
//!     PoiRecord::new("r1", 17.381, 78.481),
//!     PoiRecord::new("r2", 17.390, 78.478),
//! ];
//!
//! let config = SiteConfig { num_locations: 3, ..SiteConfig::default() };
//! let best = recommend_locations(&bus_stops, &hospitals, &restaurants, &config).unwrap();
//! assert_eq!(best.len(), 3);
//! assert_eq!(best[0].rank, 1);
//! ```

use log::info;
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{GeoInsightsError, Result};

// Geographic distance primitives
pub mod geo_utils;

// Dataset merging and run configuration
pub mod merge;
pub use merge::{
    ensure_columns, merge_datasets, PointSet, PoiCategory, PoiRecord, SiteConfig,
    WeightedPoint, REQUIRED_POI_COLUMNS,
};

// Silverman bandwidth selection
pub mod bandwidth;
pub use bandwidth::{select_bandwidth, silverman_bandwidth};

// Weighted kernel density estimation
pub mod density;
pub use density::DensityModel;

// Top-K location ranking and map hand-off
pub mod ranking;
pub use ranking::{locations_to_geojson, rank_top_locations, RankedLocation};

// Cohort retention aggregation
pub mod cohort;
pub use cohort::{
    cohort_counts, retention_table, CohortCell, CohortEvent, DayNumbering, RetentionTable,
    REQUIRED_COHORT_COLUMNS,
};

// Daily travel distance aggregation
pub mod travel;
pub use travel::{
    daily_totals, split_date_time, DayTotal, RawPing, TravelConfig, REQUIRED_PING_COLUMNS,
};

// ============================================================================
// Core Types
// ============================================================================

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check that the coordinates are finite and in range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

// ============================================================================
// Site Recommendation Pipeline
// ============================================================================

/// Run the full site-recommendation pipeline.
///
/// Merges the three POI tables into a weighted point set, selects a
/// Silverman bandwidth, fits the weighted density model, scores every
/// merged point at its own coordinates, and returns the `num_locations`
/// highest-density points ranked from 1.
///
/// Fails fast on invalid configuration, degenerate coordinates (fewer than
/// two distinct positions), or an unfittable point set; see
/// [`GeoInsightsError`] for the cases.
pub fn recommend_locations(
    bus_stops: &[PoiRecord],
    hospitals: &[PoiRecord],
    restaurants: &[PoiRecord],
    config: &SiteConfig,
) -> Result<Vec<RankedLocation>> {
    let points = merge_datasets(bus_stops, hospitals, restaurants, config)?;
    let bandwidth = select_bandwidth(&points)?;
    let model = DensityModel::fit(&points, bandwidth)?;
    let scores = model.score_samples(&points.coords());
    let ranked = rank_top_locations(&points, &scores, config.num_locations);

    info!(
        "[Pipeline] Ranked {} of {} candidate locations (bandwidth {:.6})",
        ranked.len(),
        points.len(),
        bandwidth
    );

    Ok(ranked)
}

// ============================================================================
// Tests
// ============================================================================
