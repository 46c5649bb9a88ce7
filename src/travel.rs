//! Daily travel distance from field-agent GPS pings.
//!
//! Pings are grouped by (entity, date) and ordered by time. Each ping is
//! paired with the next one; the final ping pairs with itself, so it never
//! produces a forward segment. Segment distances use the simplified chord
//! variant, and anything outside the configured kilometer window is dropped
//! as GPS noise or an unrealistic jump — a data-cleaning policy, not an
//! error. A group whose segments are all filtered yields no total at all
//! rather than a zero.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{GeoInsightsError, Result};
use crate::geo_utils::chord_distance_km;
use crate::GeoPoint;

/// Column names the ping input table must carry.
pub const REQUIRED_PING_COLUMNS: &[&str] = &["frm_id", "date_time", "latitude", "longitude"];

/// One raw location ping row, timestamp still unsplit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPing {
    pub frm_id: String,
    /// Combined timestamp, `YYYY-MM-DD HH:MM:SS`
    pub date_time: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl RawPing {
    pub fn new(frm_id: &str, date_time: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            frm_id: frm_id.to_string(),
            date_time: date_time.to_string(),
            latitude,
            longitude,
        }
    }
}

/// Segment filter thresholds for the travel aggregator.
///
/// The defaults (1 meter to 10 kilometers per segment) are inherited policy
/// constants; change them only with domain confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelConfig {
    /// Shortest segment kept, in kilometers. Default: 0.001 (1 m)
    pub min_segment_km: f64,
    /// Longest segment kept, in kilometers. Default: 10.0
    pub max_segment_km: f64,
}

impl Default for TravelConfig {
    fn default() -> Self {
        Self {
            min_segment_km: 0.001,
            max_segment_km: 10.0,
        }
    }
}

impl TravelConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.min_segment_km >= 0.0 && self.max_segment_km >= self.min_segment_km) {
            return Err(GeoInsightsError::InvalidConfiguration {
                message: format!(
                    "segment window [{}, {}] is not a valid non-negative range",
                    self.min_segment_km, self.max_segment_km
                ),
            });
        }
        Ok(())
    }
}

/// Total travel distance for one entity on one date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayTotal {
    pub entity_id: String,
    pub date: NaiveDate,
    pub total_distance_km: f64,
}

/// Split a combined timestamp at fixed character offsets:
/// date = characters 0..10, time = characters 11..19.
///
/// Returns `None` when either slice is absent or fails to parse; the
/// aggregator treats such rows as unusable and skips them.
pub fn split_date_time(s: &str) -> Option<(NaiveDate, NaiveTime)> {
    let date = NaiveDate::parse_from_str(s.get(0..10)?, "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(s.get(11..19)?, "%H:%M:%S").ok()?;
    Some((date, time))
}

/// Sum filtered consecutive-segment distances into per-(entity, date)
/// totals.
///
/// Totals are returned ordered by entity then date. Entity/date groups
/// whose segments were all filtered out are absent from the result —
/// missing, not zero.
pub fn daily_totals(pings: &[RawPing], config: &TravelConfig) -> Result<Vec<DayTotal>> {
    config.validate()?;

    let mut groups: BTreeMap<(String, NaiveDate), Vec<(NaiveTime, GeoPoint)>> = BTreeMap::new();
    let mut skipped = 0usize;
    for ping in pings {
        match split_date_time(&ping.date_time) {
            Some((date, time)) => {
                groups
                    .entry((ping.frm_id.clone(), date))
                    .or_default()
                    .push((time, GeoPoint::new(ping.latitude, ping.longitude)));
            }
            None => {
                skipped += 1;
                debug!(
                    "[Travel] Skipping ping for '{}' with unusable timestamp '{}'",
                    ping.frm_id, ping.date_time
                );
            }
        }
    }
    if skipped > 0 {
        debug!("[Travel] Skipped {} of {} pings", skipped, pings.len());
    }

    let mut totals = Vec::new();
    for ((entity_id, date), mut located) in groups {
        // Stable sort: pings at the same second keep input order
        located.sort_by(|a, b| a.0.cmp(&b.0));

        let mut total = 0.0;
        let mut kept = 0usize;
        for i in 0..located.len() {
            // The final ping pairs with itself: a zero-length segment that
            // never contributes forward distance.
            let next = if i + 1 < located.len() { i + 1 } else { i };
            let d = chord_distance_km(&located[i].1, &located[next].1);
            if d >= config.min_segment_km && d <= config.max_segment_km {
                total += d;
                kept += 1;
            }
        }

        if kept > 0 {
            totals.push(DayTotal {
                entity_id,
                date,
                total_distance_km: total,
            });
        }
    }

    Ok(totals)
}
