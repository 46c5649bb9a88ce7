//! User-retention cohort aggregation.
//!
//! A user's cohort is the earliest event date observed for them anywhere in
//! the data. Activity is counted as distinct users per (cohort, date), and
//! dates are renumbered 1, 2, 3, ... in chronological order of the distinct
//! dates observed for that cohort — a cohort whose users come back only
//! every 7th day still gets contiguous day numbers. The final table is
//! normalized to percentage of each cohort's day-1 count.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column names the cohort input table must carry.
pub const REQUIRED_COHORT_COLUMNS: &[&str] = &["user_id", "date"];

/// One user-activity event row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortEvent {
    pub user_id: String,
    pub date: NaiveDate,
}

impl CohortEvent {
    pub fn new(user_id: &str, date: NaiveDate) -> Self {
        Self {
            user_id: user_id.to_string(),
            date,
        }
    }
}

/// Policy for assigning day numbers within a cohort.
///
/// Only distinct-date rank is implemented; the enum keeps a calendar-offset
/// variant expressible without reshaping the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DayNumbering {
    /// Day N = the Nth distinct date on which the cohort was active
    #[default]
    DistinctDateRank,
}

/// Distinct-user activity count for one (cohort, day) cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortCell {
    pub cohort: NaiveDate,
    /// 1-based day number within the cohort
    pub day: usize,
    pub active_users: usize,
}

/// Cohort-by-day retention matrix, cells in percent of cohort size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionTable {
    cohorts: Vec<NaiveDate>,
    max_day: usize,
    cells: BTreeMap<(NaiveDate, usize), f64>,
}

impl RetentionTable {
    /// Cohort start dates, ascending.
    pub fn cohorts(&self) -> &[NaiveDate] {
        &self.cohorts
    }

    /// Largest day number present in any cohort.
    pub fn max_day(&self) -> usize {
        self.max_day
    }

    /// Percentage cell, or `None` where the cohort has no such day.
    pub fn percentage(&self, cohort: NaiveDate, day: usize) -> Option<f64> {
        self.cells.get(&(cohort, day)).copied()
    }
}

/// Count distinct active users per (cohort, day).
///
/// Events are grouped by the user's cohort and event date, then each
/// cohort's distinct dates are renumbered according to `numbering`.
/// Cells are returned ordered by (cohort, day).
pub fn cohort_counts(events: &[CohortEvent], numbering: DayNumbering) -> Vec<CohortCell> {
    // Cohort = first-seen date per user
    let mut first_seen: HashMap<&str, NaiveDate> = HashMap::new();
    for e in events {
        first_seen
            .entry(e.user_id.as_str())
            .and_modify(|d| *d = (*d).min(e.date))
            .or_insert(e.date);
    }

    // Distinct users per (cohort, date)
    let mut active: BTreeMap<(NaiveDate, NaiveDate), HashSet<&str>> = BTreeMap::new();
    for e in events {
        let cohort = first_seen[e.user_id.as_str()];
        active
            .entry((cohort, e.date))
            .or_default()
            .insert(e.user_id.as_str());
    }

    // Distinct observed dates per cohort, chronological
    let mut cohort_dates: BTreeMap<NaiveDate, BTreeSet<NaiveDate>> = BTreeMap::new();
    for (cohort, date) in active.keys() {
        cohort_dates.entry(*cohort).or_default().insert(*date);
    }

    let mut cells = Vec::with_capacity(active.len());
    for ((cohort, date), users) in &active {
        let day = match numbering {
            DayNumbering::DistinctDateRank => {
                cohort_dates[cohort].iter().position(|d| d == date).unwrap() + 1
            }
        };
        cells.push(CohortCell {
            cohort: *cohort,
            day,
            active_users: users.len(),
        });
    }
    cells.sort_by_key(|c| (c.cohort, c.day));
    cells
}

/// Build the normalized retention table from raw event rows.
///
/// Cell value = `100 * active(cohort, day) / active(cohort, 1)`. Day 1 of
/// every cohort is the cohort date itself, so the divisor always exists and
/// a single-user single-event cohort shows exactly 100 at day 1.
pub fn retention_table(events: &[CohortEvent]) -> RetentionTable {
    let counts = cohort_counts(events, DayNumbering::default());

    let mut day1: HashMap<NaiveDate, usize> = HashMap::new();
    for cell in &counts {
        if cell.day == 1 {
            day1.insert(cell.cohort, cell.active_users);
        }
    }

    let mut cohorts: Vec<NaiveDate> = day1.keys().copied().collect();
    cohorts.sort();

    let mut max_day = 0;
    let mut cells = BTreeMap::new();
    for cell in &counts {
        let size = day1[&cell.cohort];
        cells.insert(
            (cell.cohort, cell.day),
            100.0 * cell.active_users as f64 / size as f64,
        );
        max_day = max_day.max(cell.day);
    }

    log::debug!(
        "[Cohort] {} events -> {} cohorts, {} day columns",
        events.len(),
        cohorts.len(),
        max_day
    );

    RetentionTable {
        cohorts,
        max_day,
        cells,
    }
}
