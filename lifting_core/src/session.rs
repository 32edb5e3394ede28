//! Logging a training session.
//!
//! A [`SessionDraft`] collects planned sets (from a template and/or entered
//! by hand). Saving it assigns set order per exercise, labels any set whose
//! type was left open, appends the rows to the log and registers the
//! exercises used.

use crate::classifier::{self, ClassifierRow};
use crate::log_store::LogStore;
use crate::registry::ExerciseRegistry;
use crate::templates::{assign_set_orders, Template};
use crate::{Error, PlannedSet, Result, SessionKey, SetRecord};
use chrono::NaiveDate;

/// A session being entered, not yet written to the log
#[derive(Clone, Debug)]
pub struct SessionDraft {
    pub title: String,
    pub date: NaiveDate,
    pub sets: Vec<PlannedSet>,
}

impl SessionDraft {
    pub fn new(title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            date,
            sets: Vec::new(),
        }
    }

    /// Pre-populate from a template; its set order is discarded
    pub fn from_template(title: impl Into<String>, date: NaiveDate, template: &Template) -> Self {
        Self {
            title: title.into(),
            date,
            sets: template.to_draft_sets(),
        }
    }

    pub fn push(&mut self, set: PlannedSet) {
        self.sets.push(set);
    }

    /// Turn the draft into log rows
    ///
    /// Requires a title and at least one set. Sets without an explicit type
    /// are labeled by the classifier, treating draft position as entry order.
    pub fn finalize(self) -> Result<Vec<SetRecord>> {
        let title = self.title.trim().to_string();
        if title.is_empty() || self.sets.is_empty() {
            return Err(Error::Validation(
                "Please enter a workout title and at least one set".into(),
            ));
        }

        let orders = assign_set_orders(&self.sets);

        let rows: Vec<ClassifierRow> = self
            .sets
            .iter()
            .enumerate()
            .map(|(entry_index, set)| ClassifierRow {
                key: SessionKey::new(self.date, set.exercise.clone()),
                entry_index,
                weight: set.weight,
                reps: set.reps,
            })
            .collect();
        let inferred = classifier::classify(&rows);

        let date = self.date;
        let records = self
            .sets
            .into_iter()
            .zip(orders)
            .zip(inferred)
            .map(|((set, set_order), inferred)| SetRecord {
                date,
                workout_title: title.clone(),
                exercise: set.exercise,
                set_order,
                set_type: set.set_type.unwrap_or(inferred),
                weight: set.weight,
                reps: set.reps,
                rpe: set.rpe,
                rir: None,
                notes: set.notes,
            })
            .collect();

        Ok(records)
    }

    /// Validate, append to the log and register exercises
    ///
    /// Returns the rows written.
    pub fn save(
        self,
        log: &mut dyn LogStore,
        registry: &mut dyn ExerciseRegistry,
    ) -> Result<Vec<SetRecord>> {
        let records = self.finalize()?;
        log.append(&records)?;

        let mut added = 0;
        for record in &records {
            if registry.register(&record.exercise)? {
                added += 1;
            }
        }

        tracing::info!(
            "Saved session with {} sets ({} new exercises)",
            records.len(),
            added
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_store::MemoryLogStore;
    use crate::registry::MemoryExerciseRegistry;
    use crate::SetType::{Warmup, Working};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    #[test]
    fn test_set_order_contiguous_per_exercise() {
        let mut draft = SessionDraft::new("Upper", day());
        draft.push(PlannedSet::new("Bench", 135.0, 8));
        draft.push(PlannedSet::new("Row", 115.0, 10));
        draft.push(PlannedSet::new("Bench", 135.0, 8));
        draft.push(PlannedSet::new("Row", 115.0, 10));
        draft.push(PlannedSet::new("Bench", 135.0, 7));

        let records = draft.finalize().unwrap();
        let orders: Vec<_> = records
            .iter()
            .map(|r| (r.exercise.as_str(), r.set_order))
            .collect();
        assert_eq!(
            orders,
            vec![("Bench", 1), ("Row", 1), ("Bench", 2), ("Row", 2), ("Bench", 3)]
        );
        assert!(records.iter().all(|r| r.workout_title == "Upper" && r.date == day()));
    }

    #[test]
    fn test_explicit_set_type_wins_over_classifier() {
        let mut draft = SessionDraft::new("Legs", day());
        let mut explicit = PlannedSet::new("Squat", 135.0, 5);
        explicit.set_type = Some(Working);
        draft.push(explicit);
        draft.push(PlannedSet::new("Squat", 225.0, 5));
        draft.push(PlannedSet::new("Squat", 225.0, 1));

        let labels: Vec<_> = draft.finalize().unwrap().iter().map(|r| r.set_type).collect();
        assert_eq!(labels, vec![Working, Working, Warmup]);
    }

    #[test]
    fn test_inferred_set_types() {
        let mut draft = SessionDraft::new("Legs", day());
        draft.push(PlannedSet::new("Squat", 95.0, 5));
        draft.push(PlannedSet::new("Squat", 185.0, 3));
        draft.push(PlannedSet::new("Squat", 185.0, 1));

        let labels: Vec<_> = draft.finalize().unwrap().iter().map(|r| r.set_type).collect();
        assert_eq!(labels, vec![Warmup, Working, Warmup]);
    }

    #[test]
    fn test_validation() {
        let empty = SessionDraft::new("Upper", day());
        assert!(matches!(empty.finalize(), Err(Error::Validation(_))));

        let mut untitled = SessionDraft::new("   ", day());
        untitled.push(PlannedSet::new("Bench", 135.0, 8));
        assert!(matches!(untitled.finalize(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_from_template() {
        let template = Template::build(
            "Push",
            vec![PlannedSet::new("Bench", 135.0, 8), PlannedSet::new("Bench", 135.0, 8)],
        )
        .unwrap();

        let mut draft = SessionDraft::from_template("Push", day(), &template);
        assert!(draft.sets.iter().all(|s| s.set_order.is_none()));
        draft.push(PlannedSet::new("Dips", 25.0, 10));

        let records = draft.finalize().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].set_order, 2);
        assert_eq!(records[2].set_order, 1);
    }

    #[test]
    fn test_save_appends_and_registers() {
        let mut log = MemoryLogStore::new();
        let mut registry = MemoryExerciseRegistry::new();
        registry.register("Bench").unwrap();

        let mut draft = SessionDraft::new("Upper", day());
        draft.push(PlannedSet::new("Bench", 135.0, 8));
        draft.push(PlannedSet::new("Row", 115.0, 10));
        let written = draft.save(&mut log, &mut registry).unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(log.load().unwrap(), written);
        assert_eq!(registry.load().unwrap(), vec!["Bench", "Row"]);
    }

    #[test]
    fn test_save_does_not_deduplicate() {
        let mut log = MemoryLogStore::new();
        let mut registry = MemoryExerciseRegistry::new();

        for _ in 0..2 {
            let mut draft = SessionDraft::new("Upper", day());
            draft.push(PlannedSet::new("Bench", 135.0, 8));
            draft.save(&mut log, &mut registry).unwrap();
        }
        assert_eq!(log.load().unwrap().len(), 2);
    }

    #[test]
    fn test_failed_validation_writes_nothing() {
        let mut log = MemoryLogStore::new();
        let mut registry = MemoryExerciseRegistry::new();
        let draft = SessionDraft::new("", day());
        assert!(draft.save(&mut log, &mut registry).is_err());
        assert!(!log.exists());
    }
}
