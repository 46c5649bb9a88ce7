//! Silverman rule-of-thumb bandwidth selection.
//!
//! The rule is applied independently to the latitude and longitude columns
//! of the merged point set, and the larger of the two results becomes the
//! working bandwidth — an isotropic choice that favors the dimension with
//! the larger spread. The max-across-dimensions policy is fixed, not
//! tunable.

use crate::error::{GeoInsightsError, Result};
use crate::merge::PointSet;

/// Interquartile range normalizer for the Gaussian distribution
/// (q75 - q25 of a standard normal ≈ 1.349).
const IQR_NORMALIZER: f64 = 1.349;

/// Linearly-interpolated percentile of a sample, `q` in [0, 1].
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q * (n - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let frac = pos - lower as f64;
    sorted[lower] + frac * (sorted[upper] - sorted[lower])
}

/// Sample standard deviation (ddof = 1).
fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    var.sqrt()
}

/// Silverman's rule-of-thumb bandwidth for one dimension:
///
/// ```text
/// 0.9 * min(sample_std, IQR / 1.349) * n^(-1/5)
/// ```
///
/// Returns 0.0 for degenerate input (fewer than 2 values, or no spread);
/// callers decide whether that is an error.
pub fn silverman_bandwidth(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let iqr = percentile(&sorted, 0.75) - percentile(&sorted, 0.25);
    let spread = sample_std(values).min(iqr / IQR_NORMALIZER);

    0.9 * spread * (n as f64).powf(-0.2)
}

/// Select the working bandwidth for the density model.
///
/// Applies [`silverman_bandwidth`] to each coordinate dimension and takes
/// the maximum. Fails with `InsufficientData` when the estimator is
/// ill-defined: fewer than 2 points, or zero spread in both dimensions
/// (for example, all points at the same coordinate).
pub fn select_bandwidth(points: &PointSet) -> Result<f64> {
    let n = points.len();
    if n < 2 {
        return Err(GeoInsightsError::InsufficientData {
            point_count: n,
            message: "bandwidth selection needs at least 2 points".to_string(),
        });
    }

    let coords = points.coords();
    let lats: Vec<f64> = coords.iter().map(|p| p.latitude).collect();
    let lons: Vec<f64> = coords.iter().map(|p| p.longitude).collect();

    let bw_lat = silverman_bandwidth(&lats);
    let bw_lon = silverman_bandwidth(&lons);
    let bandwidth = bw_lat.max(bw_lon);

    if !(bandwidth > 0.0) {
        return Err(GeoInsightsError::InsufficientData {
            point_count: n,
            message: "coordinates have zero spread in both dimensions".to_string(),
        });
    }

    log::debug!(
        "[Bandwidth] silverman lat={:.6} lon={:.6} -> {:.6}",
        bw_lat,
        bw_lon,
        bandwidth
    );

    Ok(bandwidth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::{merge_datasets, PoiRecord, SiteConfig};

    fn point_set(coords: &[(f64, f64)]) -> PointSet {
        let records: Vec<PoiRecord> = coords
            .iter()
            .enumerate()
            .map(|(i, (lat, lon))| PoiRecord::new(&format!("p{}", i), *lat, *lon))
            .collect();
        merge_datasets(&records, &[], &[], &SiteConfig::default()).unwrap()
    }

    #[test]
    fn test_percentile_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 1.0), 4.0);
        assert_eq!(percentile(&sorted, 0.5), 2.5);
        assert_eq!(percentile(&sorted, 0.25), 1.75);
    }

    #[test]
    fn test_silverman_positive_for_spread_sample() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        assert!(silverman_bandwidth(&values) > 0.0);
    }

    #[test]
    fn test_silverman_zero_for_constant_sample() {
        let values = [3.0; 10];
        assert_eq!(silverman_bandwidth(&values), 0.0);
    }

    #[test]
    fn test_select_bandwidth_positive() {
        let set = point_set(&[
            (17.38, 78.48),
            (17.39, 78.49),
            (17.40, 78.46),
            (17.41, 78.50),
            (17.37, 78.47),
        ]);
        let bw = select_bandwidth(&set).unwrap();
        assert!(bw > 0.0);
    }

    #[test]
    fn test_select_bandwidth_uses_wider_dimension() {
        // Longitude spread is 10x the latitude spread; the working
        // bandwidth must come from the longitude column.
        let set = point_set(&[
            (17.380, 78.0),
            (17.381, 78.1),
            (17.382, 78.2),
            (17.383, 78.3),
            (17.384, 78.4),
        ]);
        let coords = set.coords();
        let lons: Vec<f64> = coords.iter().map(|p| p.longitude).collect();
        let bw = select_bandwidth(&set).unwrap();
        assert_eq!(bw, silverman_bandwidth(&lons));
    }

    #[test]
    fn test_select_bandwidth_single_point_fails() {
        let set = point_set(&[(17.38, 78.48)]);
        let result = select_bandwidth(&set);
        assert!(matches!(
            result,
            Err(crate::GeoInsightsError::InsufficientData { point_count: 1, .. })
        ));
    }

    #[test]
    fn test_select_bandwidth_coincident_points_fail() {
        let set = point_set(&[(17.38, 78.48), (17.38, 78.48), (17.38, 78.48)]);
        assert!(matches!(
            select_bandwidth(&set),
            Err(crate::GeoInsightsError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_zero_variance_one_dimension_still_works() {
        // All latitudes equal, longitudes spread out: the max rule still
        // produces a positive bandwidth.
        let set = point_set(&[(17.0, 78.1), (17.0, 78.2), (17.0, 78.3), (17.0, 78.4)]);
        assert!(select_bandwidth(&set).unwrap() > 0.0);
    }
}
