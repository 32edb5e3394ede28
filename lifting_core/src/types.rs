//! Core domain types for the lifting log.
//!
//! This module defines the fundamental types used throughout the system:
//! - Set types and logged set records
//! - Planned sets (template rows and session drafts)
//! - Session keys used for classification and aggregation

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

// ============================================================================
// Set Type
// ============================================================================

/// Whether a set counts toward training progress
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SetType {
    #[serde(alias = "warmup", alias = "WARMUP")]
    Warmup,
    #[serde(alias = "working", alias = "WORKING")]
    Working,
}

impl SetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetType::Warmup => "Warmup",
            SetType::Working => "Working",
        }
    }
}

impl fmt::Display for SetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SetType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "warmup" | "warm-up" | "w" => Ok(SetType::Warmup),
            "working" | "work" => Ok(SetType::Working),
            other => Err(Error::Parse(format!("Unknown set type: {}", other))),
        }
    }
}

// ============================================================================
// Session Key
// ============================================================================

/// Identity of a session-exercise unit: all sets of one exercise on one date
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    pub date: NaiveDate,
    pub exercise: String,
}

impl SessionKey {
    pub fn new(date: NaiveDate, exercise: impl Into<String>) -> Self {
        Self {
            date,
            exercise: exercise.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.date, self.exercise)
    }
}

// ============================================================================
// Set Record
// ============================================================================

/// One row of the lifting log
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetRecord {
    #[serde(rename = "Date", deserialize_with = "deserialize_log_date")]
    pub date: NaiveDate,
    #[serde(rename = "Workout Title", default)]
    pub workout_title: String,
    #[serde(rename = "Exercise")]
    pub exercise: String,
    #[serde(rename = "Set Order", deserialize_with = "deserialize_whole_number")]
    pub set_order: u32,
    #[serde(rename = "Set Type")]
    pub set_type: SetType,
    #[serde(rename = "Weight")]
    pub weight: f64,
    #[serde(rename = "Reps", deserialize_with = "deserialize_whole_number")]
    pub reps: u32,
    #[serde(rename = "RPE", default)]
    pub rpe: Option<f64>,
    #[serde(rename = "RIR", default)]
    pub rir: Option<f64>,
    #[serde(rename = "Notes", default)]
    pub notes: Option<String>,
}

impl SetRecord {
    pub fn session_key(&self) -> SessionKey {
        SessionKey::new(self.date, self.exercise.clone())
    }

    pub fn is_working(&self) -> bool {
        self.set_type == SetType::Working
    }
}

/// Header row of the log CSV, in serialization order of [`SetRecord`]
pub const LOG_HEADERS: [&str; 10] = [
    "Date",
    "Workout Title",
    "Exercise",
    "Set Order",
    "Set Type",
    "Weight",
    "Reps",
    "RPE",
    "RIR",
    "Notes",
];

// ============================================================================
// Planned Set
// ============================================================================

/// A set that has been planned but not yet logged
///
/// Used both as a template row and as a row of a session being entered.
/// `set_order` is only populated on saved templates; drafts get their order
/// assigned when the session is saved.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlannedSet {
    #[serde(rename = "Exercise")]
    pub exercise: String,
    #[serde(rename = "Set Type", default)]
    pub set_type: Option<SetType>,
    #[serde(rename = "Weight")]
    pub weight: f64,
    #[serde(rename = "Reps")]
    pub reps: u32,
    #[serde(rename = "RPE", default)]
    pub rpe: Option<f64>,
    #[serde(rename = "Notes", default)]
    pub notes: Option<String>,
    #[serde(rename = "Set Order", default, skip_serializing_if = "Option::is_none")]
    pub set_order: Option<u32>,
}

impl PlannedSet {
    pub fn new(exercise: impl Into<String>, weight: f64, reps: u32) -> Self {
        Self {
            exercise: exercise.into(),
            set_type: None,
            weight,
            reps,
            rpe: None,
            notes: None,
            set_order: None,
        }
    }
}

/// Parses `exercise,weight,reps[,set_type[,rpe[,notes]]]`
///
/// Notes may contain further commas; everything after the fifth comma is kept.
impl FromStr for PlannedSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.splitn(6, ',').map(str::trim).collect();
        if parts.len() < 3 {
            return Err(Error::Parse(format!(
                "Expected 'exercise,weight,reps[,type[,rpe[,notes]]]', got '{}'",
                s
            )));
        }

        let exercise = parts[0];
        if exercise.is_empty() {
            return Err(Error::Parse(format!("Missing exercise name in '{}'", s)));
        }

        let weight: f64 = parts[1]
            .parse()
            .map_err(|_| Error::Parse(format!("Invalid weight '{}'", parts[1])))?;
        if !weight.is_finite() || weight <= 0.0 {
            return Err(Error::Parse(format!("Weight must be positive, got {}", weight)));
        }

        let reps: u32 = parts[2]
            .parse()
            .map_err(|_| Error::Parse(format!("Invalid reps '{}'", parts[2])))?;

        let set_type = match parts.get(3) {
            Some(t) if !t.is_empty() => Some(t.parse()?),
            _ => None,
        };

        let rpe = match parts.get(4) {
            Some(r) if !r.is_empty() => Some(
                r.parse()
                    .map_err(|_| Error::Parse(format!("Invalid RPE '{}'", r)))?,
            ),
            _ => None,
        };

        let notes = parts
            .get(5)
            .filter(|n| !n.is_empty())
            .map(|n| n.to_string());

        Ok(PlannedSet {
            exercise: exercise.to_string(),
            set_type,
            weight,
            reps,
            rpe,
            notes,
            set_order: None,
        })
    }
}

// ============================================================================
// Date parsing
// ============================================================================

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Parse a calendar date, discarding any time-of-day component
pub fn parse_calendar_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt.date());
        }
    }

    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.date_naive())
        .map_err(|_| Error::Parse(format!("Invalid date: '{}'", s)))
}

fn deserialize_log_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_calendar_date(&raw).map_err(serde::de::Error::custom)
}

/// Parse a count that may have been written as a float (`10` or `10.0`)
pub fn parse_whole_number(s: &str) -> Result<u32> {
    let s = s.trim();
    if let Ok(n) = s.parse::<u32>() {
        return Ok(n);
    }

    match s.parse::<f64>() {
        Ok(n) if n.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&n) => Ok(n as u32),
        _ => Err(Error::Parse(format!("Expected a whole number, got '{}'", s))),
    }
}

fn deserialize_whole_number<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_whole_number(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_calendar_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(parse_calendar_date("2024-01-15").unwrap(), expected);
        assert_eq!(parse_calendar_date("2024-01-15 18:42:10").unwrap(), expected);
        assert_eq!(parse_calendar_date("2024-01-15 07:05").unwrap(), expected);
        assert_eq!(parse_calendar_date("2024-01-15T10:30:00Z").unwrap(), expected);
        assert!(parse_calendar_date("15/01/2024").is_err());
    }

    #[test]
    fn test_parse_whole_number_accepts_integral_floats() {
        assert_eq!(parse_whole_number("10").unwrap(), 10);
        assert_eq!(parse_whole_number(" 10.0 ").unwrap(), 10);
        assert_eq!(parse_whole_number("0").unwrap(), 0);
        assert!(parse_whole_number("10.5").is_err());
        assert!(parse_whole_number("-1").is_err());
        assert!(parse_whole_number("nan").is_err());
        assert!(parse_whole_number("").is_err());
    }

    #[test]
    fn test_set_type_parsing_is_case_insensitive() {
        assert_eq!("Warmup".parse::<SetType>().unwrap(), SetType::Warmup);
        assert_eq!("WORKING".parse::<SetType>().unwrap(), SetType::Working);
        assert_eq!("w".parse::<SetType>().unwrap(), SetType::Warmup);
        assert!("dropset".parse::<SetType>().is_err());
    }

    #[test]
    fn test_planned_set_minimal() {
        let set: PlannedSet = "Bench Press, 135, 10".parse().unwrap();
        assert_eq!(set.exercise, "Bench Press");
        assert_eq!(set.weight, 135.0);
        assert_eq!(set.reps, 10);
        assert_eq!(set.set_type, None);
        assert_eq!(set.rpe, None);
        assert_eq!(set.notes, None);
    }

    #[test]
    fn test_planned_set_full_keeps_commas_in_notes() {
        let set: PlannedSet = "Squat,225,5,working,8.5,felt heavy, belt on".parse().unwrap();
        assert_eq!(set.set_type, Some(SetType::Working));
        assert_eq!(set.rpe, Some(8.5));
        assert_eq!(set.notes.as_deref(), Some("felt heavy, belt on"));
    }

    #[test]
    fn test_planned_set_rejects_bad_input() {
        assert!("Bench,135".parse::<PlannedSet>().is_err());
        assert!(",135,5".parse::<PlannedSet>().is_err());
        assert!("Bench,heavy,5".parse::<PlannedSet>().is_err());
        assert!("Bench,0,5".parse::<PlannedSet>().is_err());
        assert!("Bench,135,-1".parse::<PlannedSet>().is_err());
        assert!("Bench,135,5,dropset".parse::<PlannedSet>().is_err());
    }

    #[test]
    fn test_session_key_display() {
        let key = SessionKey::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), "Bench");
        assert_eq!(key.to_string(), "2024-01-01 - Bench");
    }
}
