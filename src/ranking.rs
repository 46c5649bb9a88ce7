//! Top-K selection of scored locations and the map hand-off.
//!
//! Ranking is a total order by descending log-density with ties broken by
//! original merge order (first-encountered wins). The selector is a pure
//! function and degrades gracefully: asking for more locations than exist
//! returns all of them, ranked.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::merge::{PointSet, PoiCategory};

/// A recommended location, annotated with its rank (1 = highest density).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedLocation {
    pub rank: usize,
    pub id: String,
    pub category: PoiCategory,
    pub latitude: f64,
    pub longitude: f64,
    /// Estimated log-density at this location
    pub log_density: f64,
}

/// Rank all scored points descending by log-density and keep the top `k`.
///
/// `scores` is aligned positionally with the point set. The sort is stable,
/// so equal scores keep merge order. Returns `min(k, n)` locations with
/// contiguous ranks starting at 1.
///
/// # Panics
/// Panics if `scores.len() != points.len()`; the two always come from the
/// same scoring pass.
pub fn rank_top_locations(points: &PointSet, scores: &[f64], k: usize) -> Vec<RankedLocation> {
    assert_eq!(
        points.len(),
        scores.len(),
        "scores must align with the point set"
    );

    let mut order: Vec<usize> = (0..points.len()).collect();
    // Stable sort: ties keep ascending original index
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    order
        .into_iter()
        .take(k)
        .enumerate()
        .map(|(i, idx)| {
            let p = &points.points()[idx];
            RankedLocation {
                rank: i + 1,
                id: p.id.clone(),
                category: p.category,
                latitude: p.point.latitude,
                longitude: p.point.longitude,
                log_density: scores[idx],
            }
        })
        .collect()
}

/// Render ranked locations as a GeoJSON FeatureCollection.
///
/// This is the hand-off to the external map renderer: one Point feature per
/// location, coordinates in GeoJSON (longitude, latitude) order, with
/// `rank`, `id` and `category` as marker metadata.
pub fn locations_to_geojson(locations: &[RankedLocation]) -> Value {
    let features: Vec<Value> = locations
        .iter()
        .map(|loc| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [loc.longitude, loc.latitude],
                },
                "properties": {
                    "rank": loc.rank,
                    "id": loc.id,
                    "category": loc.category.as_str(),
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "name": "best_locations",
        "features": features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::{merge_datasets, PoiRecord, SiteConfig};

    fn scored_set() -> (PointSet, Vec<f64>) {
        let bus_stops = vec![
            PoiRecord::new("b1", 17.380, 78.480),
            PoiRecord::new("b2", 17.381, 78.481),
        ];
        let hospitals = vec![PoiRecord::new("h1", 17.382, 78.482)];
        let restaurants = vec![PoiRecord::new("r1", 17.383, 78.483)];
        let set = merge_datasets(&bus_stops, &hospitals, &restaurants, &SiteConfig::default())
            .unwrap();
        let scores = vec![-3.0, -1.0, -2.0, -1.0];
        (set, scores)
    }

    #[test]
    fn test_top_k_length_and_ranks() {
        let (set, scores) = scored_set();
        let top = rank_top_locations(&set, &scores, 3);
        assert_eq!(top.len(), 3);
        let ranks: Vec<usize> = top.iter().map(|l| l.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_scores_non_increasing() {
        let (set, scores) = scored_set();
        let top = rank_top_locations(&set, &scores, 4);
        for pair in top.windows(2) {
            assert!(pair[0].log_density >= pair[1].log_density);
        }
    }

    #[test]
    fn test_ties_keep_merge_order() {
        let (set, scores) = scored_set();
        // b2 (index 1) and r1 (index 3) tie at -1.0; b2 merged first
        let top = rank_top_locations(&set, &scores, 2);
        assert_eq!(top[0].id, "b2");
        assert_eq!(top[1].id, "r1");
    }

    #[test]
    fn test_k_larger_than_n_degrades_gracefully() {
        let (set, scores) = scored_set();
        let top = rank_top_locations(&set, &scores, 10);
        assert_eq!(top.len(), 4);
        assert_eq!(top.last().unwrap().rank, 4);
        assert_eq!(top.last().unwrap().id, "b1");
    }

    #[test]
    fn test_geojson_hand_off() {
        let (set, scores) = scored_set();
        let top = rank_top_locations(&set, &scores, 2);
        let geojson = locations_to_geojson(&top);

        assert_eq!(geojson["type"], "FeatureCollection");
        let features = geojson["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["properties"]["rank"], 1);
        assert_eq!(features[0]["properties"]["id"], "b2");
        assert_eq!(features[0]["properties"]["category"], "bus_stop");
        // GeoJSON coordinate order is (longitude, latitude)
        assert_eq!(features[0]["geometry"]["coordinates"][0], 78.481);
        assert_eq!(features[0]["geometry"]["coordinates"][1], 17.381);
    }
}
