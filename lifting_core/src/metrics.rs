//! Progress metrics derived from working sets.
//!
//! Nothing here is persisted: every view is recomputed from the log on read.

use crate::{SetRecord, SetType};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Per-set derived metrics for a working set
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SetMetrics {
    pub date: NaiveDate,
    pub workout_title: String,
    pub exercise: String,
    pub set_type: SetType,
    pub weight: f64,
    pub reps: u32,
    pub rir: Option<f64>,
    pub estimated_1rm: f64,
    pub volume: f64,
}

/// Aggregate of all working sets of one exercise on one calendar date
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SessionLoad {
    pub exercise: String,
    pub date: NaiveDate,
    pub total_volume: f64,
    pub num_sets: usize,
    pub session_average_load: f64,
}

/// Keep only working sets, preserving order
pub fn filter_working(log: &[SetRecord]) -> Vec<SetRecord> {
    log.iter().filter(|r| r.is_working()).cloned().collect()
}

/// Epley-style one-rep-max estimate; no rounding applied
pub fn estimated_1rm(weight: f64, reps: u32) -> f64 {
    weight * (1.0 + f64::from(reps) / 30.0)
}

/// Training volume of a single set
pub fn volume(weight: f64, reps: u32) -> f64 {
    weight * f64::from(reps)
}

/// Session average load: total volume divided by number of sets
///
/// Provisional heuristic, kept behind this one function so it can be swapped.
/// Returns `None` for an empty session.
pub fn session_average_load(total_volume: f64, num_sets: usize) -> Option<f64> {
    if num_sets == 0 {
        return None;
    }
    Some(total_volume / num_sets as f64)
}

/// Per-set view over working sets
pub fn set_metrics(working: &[SetRecord]) -> Vec<SetMetrics> {
    working
        .iter()
        .map(|r| SetMetrics {
            date: r.date,
            workout_title: r.workout_title.clone(),
            exercise: r.exercise.clone(),
            set_type: r.set_type,
            weight: r.weight,
            reps: r.reps,
            rir: r.rir,
            estimated_1rm: estimated_1rm(r.weight, r.reps),
            volume: volume(r.weight, r.reps),
        })
        .collect()
}

/// Per-session-day aggregates, sorted by exercise then date
///
/// Sets are grouped by exercise and calendar date only, so two workouts on the
/// same day contribute to one aggregate.
pub fn session_loads(working: &[SetRecord]) -> Vec<SessionLoad> {
    let mut groups: BTreeMap<(&str, NaiveDate), (f64, usize)> = BTreeMap::new();
    for r in working {
        let entry = groups.entry((r.exercise.as_str(), r.date)).or_insert((0.0, 0));
        entry.0 += volume(r.weight, r.reps);
        entry.1 += 1;
    }

    groups
        .into_iter()
        .filter_map(|((exercise, date), (total_volume, num_sets))| {
            session_average_load(total_volume, num_sets).map(|avg| SessionLoad {
                exercise: exercise.to_string(),
                date,
                total_volume,
                num_sets,
                session_average_load: avg,
            })
        })
        .collect()
}

/// Sorted, de-duplicated exercise names
pub fn exercise_names(records: &[SetRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.exercise.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

/// Trailing moving average; the first `window - 1` points have no value
pub fn moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 < window {
                None
            } else {
                let slice = &values[i + 1 - window..=i];
                Some(slice.iter().sum::<f64>() / window as f64)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, exercise: &str, set_type: SetType, weight: f64, reps: u32) -> SetRecord {
        SetRecord {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            workout_title: "Push".into(),
            exercise: exercise.into(),
            set_order: 1,
            set_type,
            weight,
            reps,
            rpe: None,
            rir: None,
            notes: None,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_estimated_1rm() {
        assert!((estimated_1rm(100.0, 10) - 133.333_333).abs() < 1e-3);
        assert_eq!(estimated_1rm(225.0, 0), 225.0);
        assert!(approx(estimated_1rm(300.0, 30), 600.0));
    }

    #[test]
    fn test_volume() {
        assert_eq!(volume(135.0, 10), 1350.0);
        assert_eq!(volume(135.0, 0), 0.0);
    }

    #[test]
    fn test_session_average_load_guards_empty() {
        assert_eq!(session_average_load(2430.0, 2), Some(1215.0));
        assert_eq!(session_average_load(0.0, 0), None);
    }

    #[test]
    fn test_filter_working_preserves_order() {
        let log = vec![
            record("2024-01-01", "Bench", SetType::Working, 135.0, 10),
            record("2024-01-01", "Bench", SetType::Warmup, 95.0, 5),
            record("2024-01-01", "Squat", SetType::Working, 225.0, 5),
        ];
        let working = filter_working(&log);
        assert_eq!(working.len(), 2);
        assert_eq!(working[0].exercise, "Bench");
        assert_eq!(working[1].exercise, "Squat");
    }

    #[test]
    fn test_session_loads_bench_example() {
        let working = vec![
            record("2024-01-01", "Bench", SetType::Working, 135.0, 10),
            record("2024-01-01", "Bench", SetType::Working, 135.0, 8),
        ];
        let loads = session_loads(&working);
        assert_eq!(loads.len(), 1);
        assert_eq!(loads[0].exercise, "Bench");
        assert_eq!(loads[0].total_volume, 2430.0);
        assert_eq!(loads[0].num_sets, 2);
        assert_eq!(loads[0].session_average_load, 1215.0);
    }

    #[test]
    fn test_session_loads_group_by_exercise_and_date() {
        let mut second_workout = record("2024-01-01", "Bench", SetType::Working, 100.0, 10);
        second_workout.workout_title = "Evening".into();
        let working = vec![
            record("2024-01-03", "Bench", SetType::Working, 150.0, 5),
            record("2024-01-01", "Squat", SetType::Working, 200.0, 5),
            record("2024-01-01", "Bench", SetType::Working, 135.0, 10),
            second_workout,
        ];
        let loads = session_loads(&working);
        let keys: Vec<_> = loads
            .iter()
            .map(|l| (l.exercise.as_str(), l.date.to_string(), l.num_sets))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Bench", "2024-01-01".to_string(), 2),
                ("Bench", "2024-01-03".to_string(), 1),
                ("Squat", "2024-01-01".to_string(), 1),
            ]
        );
        assert!(approx(loads[0].session_average_load, 1175.0));
    }

    #[test]
    fn test_empty_log_produces_nothing() {
        assert!(filter_working(&[]).is_empty());
        assert!(set_metrics(&[]).is_empty());
        assert!(session_loads(&[]).is_empty());
        assert!(exercise_names(&[]).is_empty());
    }

    #[test]
    fn test_set_metrics() {
        let working = vec![record("2024-01-01", "Bench", SetType::Working, 100.0, 10)];
        let metrics = set_metrics(&working);
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].volume, 1000.0);
        assert!((metrics[0].estimated_1rm - 133.33).abs() < 0.01);
    }

    #[test]
    fn test_metrics_are_idempotent() {
        let working = vec![
            record("2024-01-01", "Bench", SetType::Working, 135.0, 10),
            record("2024-01-02", "Bench", SetType::Working, 140.0, 8),
        ];
        assert_eq!(session_loads(&working), session_loads(&working));
        assert_eq!(set_metrics(&working), set_metrics(&working));
    }

    #[test]
    fn test_exercise_names_sorted_unique() {
        let log = vec![
            record("2024-01-01", "Squat", SetType::Working, 225.0, 5),
            record("2024-01-01", "Bench", SetType::Working, 135.0, 5),
            record("2024-01-02", "Squat", SetType::Working, 230.0, 5),
        ];
        assert_eq!(exercise_names(&log), vec!["Bench", "Squat"]);
    }

    #[test]
    fn test_moving_average() {
        let ma = moving_average(&[3.0, 6.0, 9.0, 12.0], 3);
        assert_eq!(ma, vec![None, None, Some(6.0), Some(9.0)]);
        assert_eq!(moving_average(&[1.0, 2.0], 3), vec![None, None]);
        assert_eq!(moving_average(&[5.0], 1), vec![Some(5.0)]);
        assert_eq!(moving_average(&[5.0], 0), vec![None]);
    }
}
