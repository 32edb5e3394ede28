//! Progress views for a single exercise.
//!
//! Builds on [`crate::metrics`]: selects one exercise and an optional date
//! range, then produces chart series and a summary block.

use crate::metrics::{self, SessionLoad, SetMetrics};
use crate::{Error, Result, SetRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::str::FromStr;

/// Which progress series to render
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ChartKind {
    #[default]
    MaxWeight,
    EstimatedOneRepMax,
    SessionAverageLoad,
}

impl FromStr for ChartKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "max-weight" | "weight" => Ok(ChartKind::MaxWeight),
            "e1rm" | "1rm" => Ok(ChartKind::EstimatedOneRepMax),
            "load" | "session-load" => Ok(ChartKind::SessionAverageLoad),
            other => Err(Error::Parse(format!(
                "Unknown chart '{}' (expected max-weight, e1rm or load)",
                other
            ))),
        }
    }
}

/// Inclusive calendar date range; open ends match everything
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

/// One point of a chart series
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
    /// Trailing moving average, only present on the estimated 1RM chart
    pub moving_average: Option<f64>,
}

/// Headline numbers for one exercise over the selected range
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ExerciseSummary {
    pub sessions_logged: usize,
    pub max_weight: f64,
    pub max_estimated_1rm: f64,
    pub avg_reps_per_set: f64,
    pub avg_session_load: f64,
    pub total_sets: usize,
}

/// Working-set views for one exercise within a date range
#[derive(Clone, Debug)]
pub struct ExerciseView {
    pub exercise: String,
    pub sets: Vec<SetMetrics>,
    pub sessions: Vec<SessionLoad>,
}

impl ExerciseView {
    /// Select one exercise's working sets from the full log
    pub fn build(log: &[SetRecord], exercise: &str, range: DateRange) -> Self {
        let working = metrics::filter_working(log);

        let sets = metrics::set_metrics(&working)
            .into_iter()
            .filter(|s| s.exercise == exercise && range.contains(s.date))
            .collect();

        let sessions = metrics::session_loads(&working)
            .into_iter()
            .filter(|l| l.exercise == exercise && range.contains(l.date))
            .collect();

        Self {
            exercise: exercise.to_string(),
            sets,
            sessions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Chart series in chronological order
    pub fn series(&self, kind: ChartKind, window: usize) -> Vec<SeriesPoint> {
        match kind {
            ChartKind::MaxWeight => self
                .sets_by_date()
                .iter()
                .map(|s| SeriesPoint {
                    date: s.date,
                    value: s.weight,
                    moving_average: None,
                })
                .collect(),
            ChartKind::EstimatedOneRepMax => {
                let sorted = self.sets_by_date();
                let values: Vec<f64> = sorted.iter().map(|s| s.estimated_1rm).collect();
                sorted
                    .iter()
                    .zip(metrics::moving_average(&values, window))
                    .map(|(s, ma)| SeriesPoint {
                        date: s.date,
                        value: s.estimated_1rm,
                        moving_average: ma,
                    })
                    .collect()
            }
            ChartKind::SessionAverageLoad => self
                .sessions
                .iter()
                .map(|l| SeriesPoint {
                    date: l.date,
                    value: l.session_average_load,
                    moving_average: None,
                })
                .collect(),
        }
    }

    /// Summary block; `None` when no working sets were selected
    pub fn summary(&self) -> Option<ExerciseSummary> {
        if self.sets.is_empty() {
            return None;
        }

        let total_sets = self.sets.len();
        let max_weight = self.sets.iter().map(|s| s.weight).fold(f64::MIN, f64::max);
        let max_estimated_1rm = self
            .sets
            .iter()
            .map(|s| s.estimated_1rm)
            .fold(f64::MIN, f64::max);
        let avg_reps_per_set =
            self.sets.iter().map(|s| f64::from(s.reps)).sum::<f64>() / total_sets as f64;

        let avg_session_load = if self.sessions.is_empty() {
            0.0
        } else {
            self.sessions
                .iter()
                .map(|l| l.session_average_load)
                .sum::<f64>()
                / self.sessions.len() as f64
        };

        Some(ExerciseSummary {
            sessions_logged: self.sessions.len(),
            max_weight,
            max_estimated_1rm,
            avg_reps_per_set,
            avg_session_load,
            total_sets,
        })
    }

    /// Set-level rows, newest first
    pub fn sets_newest_first(&self) -> Vec<&SetMetrics> {
        let mut sets: Vec<&SetMetrics> = self.sets.iter().collect();
        sets.sort_by(|a, b| b.date.cmp(&a.date));
        sets
    }

    fn sets_by_date(&self) -> Vec<&SetMetrics> {
        let mut sets: Vec<&SetMetrics> = self.sets.iter().collect();
        sets.sort_by_key(|s| s.date);
        sets
    }
}
