//! Warmup / working set classification.
//!
//! Sets are grouped by [`SessionKey`] and each set is labeled relative to the
//! heaviest set of its group (the top set):
//! 1. Any set with `reps <= 2` is a warmup, even the top set itself
//! 2. Lighter sets entered before the top set are warmups
//! 3. Everything else is a working set
//!
//! Ties for the top set go to the first occurrence in entry order. Entry order
//! is carried explicitly in [`ClassifierRow::entry_index`] rather than being
//! inferred from slice positions.

use crate::{SessionKey, SetType};
use std::collections::HashMap;

/// Sets with at most this many reps are never counted as working sets
pub const FORCED_WARMUP_MAX_REPS: u32 = 2;

/// Minimal view of a set needed for classification
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifierRow {
    pub key: SessionKey,
    pub entry_index: usize,
    pub weight: f64,
    pub reps: u32,
}

/// Classify a flat list of sets, grouping by session key
///
/// Returns one label per input row, aligned with the input. Groups never
/// influence each other.
pub fn classify(rows: &[ClassifierRow]) -> Vec<SetType> {
    let mut groups: HashMap<&SessionKey, Vec<usize>> = HashMap::new();
    for (pos, row) in rows.iter().enumerate() {
        groups.entry(&row.key).or_default().push(pos);
    }

    let mut labels = vec![SetType::Working; rows.len()];
    for positions in groups.values() {
        let group: Vec<&ClassifierRow> = positions.iter().map(|&p| &rows[p]).collect();
        for (&pos, label) in positions.iter().zip(classify_group(&group)) {
            labels[pos] = label;
        }
    }

    tracing::debug!(
        "Classified {} sets across {} session groups",
        rows.len(),
        groups.len()
    );

    labels
}

/// Classify the sets of a single session group
///
/// Labels are aligned with `group`. An empty group yields no labels.
pub fn classify_group(group: &[&ClassifierRow]) -> Vec<SetType> {
    let Some(top) = top_set(group) else {
        return Vec::new();
    };

    group
        .iter()
        .map(|row| {
            let forced = row.reps <= FORCED_WARMUP_MAX_REPS;
            let ramp_up = row.weight < top.weight && row.entry_index < top.entry_index;
            if forced || ramp_up {
                SetType::Warmup
            } else {
                SetType::Working
            }
        })
        .collect()
}

/// First set (by entry order) achieving the group's maximum weight
fn top_set<'a>(group: &[&'a ClassifierRow]) -> Option<&'a ClassifierRow> {
    group.iter().copied().reduce(|best, row| {
        let heavier = row.weight > best.weight;
        let tied_earlier = row.weight == best.weight && row.entry_index < best.entry_index;
        if heavier || tied_earlier {
            row
        } else {
            best
        }
    })
}
