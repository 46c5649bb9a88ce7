//! Weighted kernel density estimation over a haversine metric.
//!
//! The model retains the training coordinates and weights, plus an R-tree
//! over the coordinates as the neighbor index backing kernel evaluation
//! (the ball-tree role). Weights act as sample multiplicity: a point with
//! weight 2.0 contributes twice the kernel mass of a weight-1.0 point.
//!
//! Kernel distances are haversine central angles in degrees, the same
//! units the Silverman bandwidth is computed in; mixing a kilometer metric
//! with a degree bandwidth would collapse every kernel to its own point.
//!
//! Scoring returns the natural log of the density estimate at each query
//! point. It accepts arbitrary query coordinates; scoring the training set
//! against itself is just the particular call the site recommendation
//! pipeline makes.

use log::{debug, info};
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::error::{GeoInsightsError, Result};
use crate::geo_utils::haversine_angle_deg;
use crate::merge::PointSet;
use crate::GeoPoint;

/// Kernel exponents beyond this underflow to zero in f64 even before the
/// log-sum-exp shift brings them near the dominant term.
const UNDERFLOW_EXPONENT: f64 = 745.0;

/// A training point with its index, for R-tree queries in degree space.
#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    idx: usize,
    lat: f64,
    lon: f64,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lat, self.lon])
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.lat - point[0];
        let dlon = self.lon - point[1];
        dlat * dlat + dlon * dlon
    }
}

/// A fitted weighted kernel density model with a haversine-distance
/// Gaussian kernel.
///
/// Constructed once per run from a fixed [`PointSet`]; stateless after
/// fitting apart from the retained training data.
#[derive(Debug)]
pub struct DensityModel {
    coords: Vec<GeoPoint>,
    weights: Vec<f64>,
    bandwidth: f64,
    tree: RTree<IndexedPoint>,
    /// ln(Σw) + ln(2π h²), subtracted from every raw log-sum
    log_norm: f64,
    /// Degree-space candidate radius; `None` means scan every point
    prune_radius_deg: Option<f64>,
}

impl DensityModel {
    /// Fit the model on a point set with the given bandwidth.
    ///
    /// Fails with `ModelFitError` if the point set is empty, any coordinate
    /// is NaN or out of range, or the total weight is zero; fails with
    /// `InvalidConfiguration` if the bandwidth is not a positive finite
    /// number.
    pub fn fit(points: &PointSet, bandwidth: f64) -> Result<Self> {
        if !(bandwidth.is_finite() && bandwidth > 0.0) {
            return Err(GeoInsightsError::InvalidConfiguration {
                message: format!("bandwidth must be positive and finite, got {}", bandwidth),
            });
        }
        if points.is_empty() {
            return Err(GeoInsightsError::ModelFitError {
                message: "cannot fit a density model on an empty point set".to_string(),
            });
        }

        let coords = points.coords();
        let weights = points.weights();

        for (i, p) in coords.iter().enumerate() {
            if !p.is_valid() {
                return Err(GeoInsightsError::ModelFitError {
                    message: format!(
                        "point {} has invalid coordinates ({}, {})",
                        i, p.latitude, p.longitude
                    ),
                });
            }
        }

        let total_weight: f64 = weights.iter().sum();
        if !(total_weight > 0.0) {
            return Err(GeoInsightsError::ModelFitError {
                message: "total point weight is zero; density is undefined".to_string(),
            });
        }

        let indexed: Vec<IndexedPoint> = coords
            .iter()
            .enumerate()
            .map(|(idx, p)| IndexedPoint {
                idx,
                lat: p.latitude,
                lon: p.longitude,
            })
            .collect();
        let tree = RTree::bulk_load(indexed);

        let log_norm = total_weight.ln()
            + (2.0 * std::f64::consts::PI * bandwidth * bandwidth).ln();

        let prune_radius_deg = prune_radius(&coords, bandwidth);

        info!(
            "[Density] Fitted on {} points, bandwidth {:.6}, prune radius {:?} deg",
            coords.len(),
            bandwidth,
            prune_radius_deg
        );

        Ok(Self {
            coords,
            weights,
            bandwidth,
            tree,
            log_norm,
            prune_radius_deg,
        })
    }

    /// The working bandwidth the model was fitted with.
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Log-density estimate at each query point.
    ///
    /// Deterministic for a fixed model and query set: candidates are
    /// evaluated in training order and the sum is max-shifted, so repeated
    /// calls return identical values. A query beyond the reach of every
    /// kernel scores `-inf`.
    pub fn score_samples(&self, queries: &[GeoPoint]) -> Vec<f64> {
        let scores: Vec<f64> = queries.iter().map(|q| self.score_point(q)).collect();
        debug!("[Density] Scored {} queries", scores.len());
        scores
    }

    fn score_point(&self, query: &GeoPoint) -> f64 {
        let candidates = self.candidate_indices(query);

        // ln wᵢ - d²/(2h²) per candidate, then a max-shifted log-sum-exp
        let two_h2 = 2.0 * self.bandwidth * self.bandwidth;
        let mut terms = Vec::with_capacity(candidates.len());
        for idx in candidates {
            let w = self.weights[idx];
            if w <= 0.0 {
                continue;
            }
            let d = haversine_angle_deg(query, &self.coords[idx]);
            terms.push(w.ln() - d * d / two_h2);
        }

        let max_term = terms.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if max_term == f64::NEG_INFINITY {
            return f64::NEG_INFINITY;
        }

        let sum: f64 = terms.iter().map(|t| (t - max_term).exp()).sum();
        max_term + sum.ln() - self.log_norm
    }

    /// Indices of training points that can contribute non-negligible
    /// kernel mass at the query, in ascending training order.
    fn candidate_indices(&self, query: &GeoPoint) -> Vec<usize> {
        match self.prune_radius_deg {
            Some(radius) => {
                let mut indices: Vec<usize> = self
                    .tree
                    .locate_within_distance([query.latitude, query.longitude], radius * radius)
                    .map(|p| p.idx)
                    .collect();
                indices.sort_unstable();
                indices
            }
            None => (0..self.coords.len()).collect(),
        }
    }
}

/// Conservative degree-space radius containing every training point whose
/// kernel contribution survives f64 underflow.
///
/// A central-angle cutoff of `h * sqrt(2 * 745)` degrees bounds the
/// latitude difference directly, while the longitude difference can be up
/// to `1 / cos(lat)` times larger; the radius uses the worst case over the
/// training latitudes so the disc never excludes a contributing point.
/// Returns `None` (full scan) when the conversion degenerates near the
/// poles or the disc would cover the whole coordinate range anyway.
fn prune_radius(coords: &[GeoPoint], bandwidth: f64) -> Option<f64> {
    let cutoff_deg = bandwidth * (2.0 * UNDERFLOW_EXPONENT).sqrt();

    let max_abs_lat = coords
        .iter()
        .map(|p| p.latitude.abs())
        .fold(0.0_f64, f64::max);
    let cos_lat = max_abs_lat.to_radians().cos();
    if cos_lat < 0.05 {
        return None;
    }

    let lon_deg = cutoff_deg / cos_lat;
    let radius = (cutoff_deg * cutoff_deg + lon_deg * lon_deg).sqrt();

    if radius >= 360.0 {
        None
    } else {
        Some(radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::{merge_datasets, PoiRecord, SiteConfig};

    fn set_from(coords: &[(f64, f64)]) -> PointSet {
        let records: Vec<PoiRecord> = coords
            .iter()
            .enumerate()
            .map(|(i, (lat, lon))| PoiRecord::new(&format!("p{}", i), *lat, *lon))
            .collect();
        merge_datasets(&records, &[], &[], &SiteConfig::default()).unwrap()
    }

    #[test]
    fn test_fit_empty_set_fails() {
        let set = set_from(&[]);
        let result = DensityModel::fit(&set, 0.1);
        assert!(matches!(
            result,
            Err(GeoInsightsError::ModelFitError { .. })
        ));
    }

    #[test]
    fn test_fit_invalid_coordinates_fail() {
        let set = set_from(&[(17.38, 78.48), (95.0, 78.48)]);
        let result = DensityModel::fit(&set, 0.1);
        assert!(matches!(
            result,
            Err(GeoInsightsError::ModelFitError { .. })
        ));
    }

    #[test]
    fn test_fit_non_positive_bandwidth_fails() {
        let set = set_from(&[(17.38, 78.48), (17.39, 78.49)]);
        assert!(matches!(
            DensityModel::fit(&set, 0.0),
            Err(GeoInsightsError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            DensityModel::fit(&set, f64::NAN),
            Err(GeoInsightsError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let set = set_from(&[
            (17.380, 78.480),
            (17.381, 78.481),
            (17.382, 78.479),
            (17.500, 78.600),
        ]);
        let model = DensityModel::fit(&set, 0.05).unwrap();
        let coords = set.coords();
        let first = model.score_samples(&coords);
        let second = model.score_samples(&coords);
        assert_eq!(first, second);
    }

    #[test]
    fn test_cluster_scores_above_isolated_point() {
        // Three points within ~150m of each other, one a degree away.
        let set = set_from(&[
            (17.3800, 78.4800),
            (17.3805, 78.4805),
            (17.3810, 78.4795),
            (18.3800, 79.4800),
        ]);
        let model = DensityModel::fit(&set, 0.05).unwrap();
        let scores = model.score_samples(&set.coords());

        let isolated = scores[3];
        for &s in &scores[..3] {
            assert!(s > isolated, "cluster score {} <= isolated {}", s, isolated);
        }
    }

    #[test]
    fn test_weights_shift_density() {
        // Identical twin clusters; hospitals carry 2x the bus stop weight,
        // so the hospital cluster must dominate.
        let bus_stops = vec![
            PoiRecord::new("b1", 17.3800, 78.4800),
            PoiRecord::new("b2", 17.3805, 78.4805),
        ];
        let hospitals = vec![
            PoiRecord::new("h1", 18.3800, 79.4800),
            PoiRecord::new("h2", 18.3805, 79.4805),
        ];
        let config = SiteConfig {
            bus_stops_weight: 0.5,
            hospitals_weight: 1.0,
            ..SiteConfig::default()
        };
        let set = merge_datasets(&bus_stops, &hospitals, &[], &config).unwrap();
        let model = DensityModel::fit(&set, 0.05).unwrap();
        let scores = model.score_samples(&set.coords());

        assert!(scores[2] > scores[0]);
        assert!(scores[3] > scores[1]);
    }

    #[test]
    fn test_zero_total_weight_fails_fit() {
        let bus_stops = vec![PoiRecord::new("b1", 17.38, 78.48)];
        let config = SiteConfig {
            bus_stops_weight: 0.0,
            ..SiteConfig::default()
        };
        let set = merge_datasets(&bus_stops, &[], &[], &config).unwrap();
        assert!(matches!(
            DensityModel::fit(&set, 0.05),
            Err(GeoInsightsError::ModelFitError { .. })
        ));
    }

    #[test]
    fn test_far_query_scores_neg_infinity() {
        let set = set_from(&[(17.380, 78.480), (17.381, 78.481)]);
        let model = DensityModel::fit(&set, 0.001).unwrap();
        // ~9 degrees away with a tiny bandwidth: every kernel term underflows
        let scores = model.score_samples(&[GeoPoint::new(8.0, 70.0)]);
        assert_eq!(scores[0], f64::NEG_INFINITY);
    }

    #[test]
    fn test_prune_radius_degenerates_at_pole() {
        let coords = vec![GeoPoint::new(89.5, 10.0), GeoPoint::new(89.6, 20.0)];
        assert_eq!(prune_radius(&coords, 0.01), None);
    }
}
