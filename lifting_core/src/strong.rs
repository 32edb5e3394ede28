//! Strong app export importer.
//!
//! Converts a Strong CSV export into log rows: parses each row, labels sets
//! with the classifier, and orders the result by date, exercise and set order.

use crate::classifier::{self, ClassifierRow};
use crate::{parse_calendar_date, parse_whole_number, Error, Result, SessionKey, SetRecord};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// The subset of Strong export columns we use
#[derive(Debug, Deserialize)]
struct StrongRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Workout Name", default)]
    workout_name: Option<String>,
    #[serde(rename = "Exercise Name")]
    exercise_name: String,
    #[serde(rename = "Set Order")]
    set_order: String,
    #[serde(rename = "Weight", default)]
    weight: Option<f64>,
    #[serde(rename = "Reps", default)]
    reps: Option<f64>,
    #[serde(rename = "RPE", default)]
    rpe: Option<f64>,
    #[serde(rename = "Notes", default)]
    notes: Option<String>,
}

const REQUIRED_COLUMNS: [&str; 5] = ["Date", "Exercise Name", "Set Order", "Weight", "Reps"];

/// A parsed export row before classification
struct ImportedSet {
    entry_index: usize,
    record: SetRecord,
    /// Non-numeric `Set Order` marker such as `W` or `D`
    special_order: Option<String>,
}

/// Convert a Strong export file
pub fn convert_strong_export(path: &Path, delimiter: u8) -> Result<Vec<SetRecord>> {
    let file = std::fs::File::open(path)?;
    tracing::info!("Converting Strong export {:?}", path);
    convert_strong_reader(file, delimiter)
}

/// Convert Strong export CSV from any reader
pub fn convert_strong_reader<R: Read>(reader: R, delimiter: u8) -> Result<Vec<SetRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(Error::Validation(format!(
                "Not a Strong export: missing column '{}'",
                column
            )));
        }
    }

    let mut imported = Vec::new();
    let mut skipped = 0;
    for (entry_index, result) in reader.deserialize::<StrongRow>().enumerate() {
        let parsed = result.map_err(Error::from).and_then(parse_row);
        match parsed {
            Ok((record, special_order)) => imported.push(ImportedSet {
                entry_index,
                record,
                special_order,
            }),
            Err(e) => {
                skipped += 1;
                tracing::warn!("Skipping export row {}: {}", entry_index + 2, e);
            }
        }
    }

    number_special_sets(&mut imported);
    let records = label_and_sort(imported);
    tracing::info!(
        "Converted {} sets ({} rows skipped)",
        records.len(),
        skipped
    );
    Ok(records)
}

fn parse_row(row: StrongRow) -> Result<(SetRecord, Option<String>)> {
    let date = parse_calendar_date(&row.date)?;

    if row.exercise_name.is_empty() {
        return Err(Error::Parse("missing exercise name".into()));
    }

    // Numbered later by `number_special_sets`
    let (set_order, special_order) = match parse_whole_number(&row.set_order) {
        Ok(order) => (order, None),
        Err(_) => (0, Some(row.set_order)),
    };

    let weight = row
        .weight
        .filter(|w| *w > 0.0)
        .ok_or_else(|| Error::Parse("missing or non-positive weight".into()))?;

    let reps = row
        .reps
        .filter(|r| *r >= 0.0 && r.fract() == 0.0)
        .ok_or_else(|| Error::Parse("missing or non-integer reps".into()))? as u32;

    let record = SetRecord {
        date,
        workout_title: row.workout_name.unwrap_or_default(),
        exercise: row.exercise_name,
        set_order,
        // Overwritten by the classifier
        set_type: crate::SetType::Working,
        weight,
        reps,
        rpe: row.rpe,
        rir: None,
        notes: row.notes.filter(|n| !n.is_empty()),
    };
    Ok((record, special_order))
}

/// Give sets with a non-numeric set order the orders after their group's
/// highest numeric one, in export order
fn number_special_sets(imported: &mut [ImportedSet]) {
    let mut next: HashMap<SessionKey, u32> = HashMap::new();
    for set in imported.iter().filter(|s| s.special_order.is_none()) {
        let highest = next.entry(set.record.session_key()).or_insert(0);
        *highest = (*highest).max(set.record.set_order);
    }

    for set in imported.iter_mut() {
        if let Some(marker) = &set.special_order {
            let highest = next.entry(set.record.session_key()).or_insert(0);
            *highest += 1;
            set.record.set_order = *highest;
            tracing::debug!(
                "Set order '{}' for {} numbered {}",
                marker,
                set.record.session_key(),
                set.record.set_order
            );
        }
    }
}

fn label_and_sort(imported: Vec<ImportedSet>) -> Vec<SetRecord> {
    let rows: Vec<ClassifierRow> = imported
        .iter()
        .map(|set| ClassifierRow {
            key: SessionKey::new(set.record.date, set.record.exercise.clone()),
            entry_index: set.entry_index,
            weight: set.record.weight,
            reps: set.record.reps,
        })
        .collect();
    let labels = classifier::classify(&rows);

    let mut records: Vec<SetRecord> = imported
        .into_iter()
        .zip(labels)
        .map(|(set, label)| SetRecord {
            set_type: label,
            ..set.record
        })
        .collect();

    // Stable: rows sharing a key keep export order
    records.sort_by(|a, b| {
        a.session_key()
            .cmp(&b.session_key())
            .then(a.set_order.cmp(&b.set_order))
    });
    records
}
