//! Lifting log persistence.
//!
//! The log is a flat CSV file of [`SetRecord`] rows. Appends take an exclusive
//! file lock; whole-file rewrites (merges) go through a temp file that is
//! atomically renamed over the original. Rows that fail to parse are left out
//! of [`LogStore::load`] but carried through every rewrite unchanged.

use crate::{Error, Result, SetRecord, LOG_HEADERS};
use chrono::NaiveDate;
use fs2::FileExt;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Columns a log file must have for rows to be readable
const REQUIRED_COLUMNS: [&str; 6] = ["Date", "Exercise", "Set Order", "Set Type", "Weight", "Reps"];

/// Storage for the lifting log
pub trait LogStore {
    fn exists(&self) -> bool;
    fn load(&self) -> Result<Vec<SetRecord>>;
    /// Append records without any de-duplication
    fn append(&mut self, records: &[SetRecord]) -> Result<()>;
    /// Replace the whole log
    fn save(&mut self, records: &[SetRecord]) -> Result<()>;

    /// Add records that are not already stored (see [`merge_records`])
    fn merge(&mut self, incoming: &[SetRecord]) -> Result<MergeOutcome> {
        let (merged, outcome) = merge_records(self.load()?, incoming);
        self.save(&merged)?;
        Ok(outcome)
    }
}

/// Result of merging new records into the log
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub added: usize,
    pub duplicates_dropped: usize,
}

/// Identity used to detect duplicate rows
#[derive(Debug, PartialEq, Eq, Hash)]
struct DedupKey {
    date: NaiveDate,
    exercise: String,
    set_order: u32,
    weight_bits: u64,
    reps: u32,
}

impl From<&SetRecord> for DedupKey {
    fn from(r: &SetRecord) -> Self {
        DedupKey {
            date: r.date,
            exercise: r.exercise.clone(),
            set_order: r.set_order,
            weight_bits: r.weight.to_bits(),
            reps: r.reps,
        }
    }
}

/// Tracks which rows have been seen during a merge
#[derive(Default)]
struct Deduper {
    seen: HashSet<DedupKey>,
    outcome: MergeOutcome,
}

impl Deduper {
    fn keep_existing(&mut self, record: &SetRecord) -> bool {
        let keep = self.seen.insert(DedupKey::from(record));
        if !keep {
            self.outcome.duplicates_dropped += 1;
        }
        keep
    }

    fn keep_incoming(&mut self, record: &SetRecord) -> bool {
        let keep = self.keep_existing(record);
        if keep {
            self.outcome.added += 1;
        }
        keep
    }
}

/// Concatenate `existing` and `incoming`, dropping duplicates (first wins)
pub fn merge_records(existing: Vec<SetRecord>, incoming: &[SetRecord]) -> (Vec<SetRecord>, MergeOutcome) {
    let mut dedup = Deduper::default();
    let mut merged: Vec<SetRecord> = existing
        .into_iter()
        .filter(|record| dedup.keep_existing(record))
        .collect();
    merged.extend(
        incoming
            .iter()
            .filter(|record| dedup.keep_incoming(record))
            .cloned(),
    );
    (merged, dedup.outcome)
}

/// Merge records into a store, de-duplicating against what is already there
pub fn merge_into(store: &mut dyn LogStore, incoming: &[SetRecord]) -> Result<MergeOutcome> {
    let outcome = store.merge(incoming)?;

    tracing::debug!(
        "Merge dropped {} duplicate rows",
        outcome.duplicates_dropped
    );
    tracing::info!("Merged {} new rows into log", outcome.added);
    Ok(outcome)
}

// ============================================================================
// CSV-backed store
// ============================================================================

/// CSV file log store with file locking
pub struct CsvLogStore {
    path: PathBuf,
}

impl CsvLogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty log with only the header row if none exists
    pub fn init(&mut self) -> Result<()> {
        if !self.exists() {
            self.save(&[])?;
            tracing::info!("Created empty log at {:?}", self.path);
        }
        Ok(())
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// All data rows in file order, parsed or not
    fn read_rows(&self) -> Result<Vec<LogRow>> {
        if !self.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;
        let rows = read_rows(&file, &self.path);
        file.unlock()?;
        rows
    }

    /// Atomically replace the log with `existing` rows followed by `appended`
    fn write_rows(&self, existing: &[LogRow], appended: &[SetRecord]) -> Result<()> {
        self.ensure_parent_dir()?;

        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            // Unparsed rows may carry extra fields
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_writer(temp.as_file());
            writer.write_record(LOG_HEADERS)?;
            for row in existing {
                match row {
                    LogRow::Parsed(record) => writer.serialize(record)?,
                    LogRow::Unparsed(raw) => writer.write_record(raw)?,
                }
            }
            for record in appended {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!(
            "Wrote {} rows to {:?}",
            existing.len() + appended.len(),
            self.path
        );
        Ok(())
    }

    /// True if the file is missing, empty, or starts with [`LOG_HEADERS`]
    fn has_current_header(&self) -> Result<bool> {
        if !self.exists() || std::fs::metadata(&self.path)?.len() == 0 {
            return Ok(true);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)?;
        let headers = reader.headers()?;
        Ok(headers.iter().eq(LOG_HEADERS))
    }
}

impl LogStore for CsvLogStore {
    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn load(&self) -> Result<Vec<SetRecord>> {
        let records: Vec<SetRecord> = self
            .read_rows()?
            .into_iter()
            .filter_map(|row| match row {
                LogRow::Parsed(record) => Some(record),
                LogRow::Unparsed(_) => None,
            })
            .collect();

        tracing::debug!("Read {} rows from {:?}", records.len(), self.path);
        Ok(records)
    }

    fn append(&mut self, records: &[SetRecord]) -> Result<()> {
        self.ensure_parent_dir()?;

        // Rows must line up with the header already in the file
        if !self.has_current_header()? {
            tracing::info!("Rewriting {:?} with current log columns", self.path);
            let existing = self.read_rows()?;
            return self.write_rows(&existing, records);
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.lock_exclusive()?;

        let needs_headers = file.metadata()?.len() == 0;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(&file);

        if needs_headers {
            writer.write_record(LOG_HEADERS)?;
        }
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        drop(writer);

        file.sync_all()?;
        file.unlock()?;

        tracing::debug!("Appended {} rows to {:?}", records.len(), self.path);
        Ok(())
    }

    fn save(&mut self, records: &[SetRecord]) -> Result<()> {
        self.write_rows(&[], records)
    }

    fn merge(&mut self, incoming: &[SetRecord]) -> Result<MergeOutcome> {
        let mut dedup = Deduper::default();
        let existing: Vec<LogRow> = self
            .read_rows()?
            .into_iter()
            .filter(|row| match row {
                LogRow::Parsed(record) => dedup.keep_existing(record),
                LogRow::Unparsed(_) => true,
            })
            .collect();
        let added: Vec<SetRecord> = incoming
            .iter()
            .filter(|record| dedup.keep_incoming(record))
            .cloned()
            .collect();

        self.write_rows(&existing, &added)?;
        Ok(dedup.outcome)
    }
}

/// A data row of the log file
#[derive(Clone, Debug)]
enum LogRow {
    Parsed(SetRecord),
    /// Kept verbatim (in [`LOG_HEADERS`] order) so rewrites never drop it
    Unparsed(csv::StringRecord),
}

/// Read log rows; rows that fail to parse are warned about and kept raw
fn read_rows(file: &File, path: &Path) -> Result<Vec<LogRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Ok(Vec::new());
    }
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(Error::Validation(format!(
                "Log {:?} is missing required column '{}'",
                path, column
            )));
        }
    }

    let mut rows = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let raw = result?;
        match raw.deserialize::<SetRecord>(Some(&headers)) {
            Ok(record) => rows.push(LogRow::Parsed(record)),
            Err(e) => {
                // +2: header line and 1-based numbering
                tracing::warn!("Skipping malformed log row {}: {}", row + 2, e);
                rows.push(LogRow::Unparsed(to_current_columns(&headers, &raw)));
            }
        }
    }
    Ok(rows)
}

/// Rearrange a raw row into [`LOG_HEADERS`] order. Fields under columns the
/// log no longer has are appended at the end.
fn to_current_columns(headers: &csv::StringRecord, raw: &csv::StringRecord) -> csv::StringRecord {
    let mut row = csv::StringRecord::new();
    for name in LOG_HEADERS {
        let value = headers
            .iter()
            .position(|h| h == name)
            .and_then(|i| raw.get(i))
            .unwrap_or("");
        row.push_field(value);
    }
    for (i, value) in raw.iter().enumerate() {
        let known = headers.get(i).is_some_and(|h| LOG_HEADERS.contains(&h));
        if !known {
            row.push_field(value);
        }
    }
    row
}

// ============================================================================
// In-memory store
// ============================================================================

/// Log store held entirely in memory
#[derive(Clone, Debug, Default)]
pub struct MemoryLogStore {
    records: Option<Vec<SetRecord>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<SetRecord>) -> Self {
        Self {
            records: Some(records),
        }
    }
}

impl LogStore for MemoryLogStore {
    fn exists(&self) -> bool {
        self.records.is_some()
    }

    fn load(&self) -> Result<Vec<SetRecord>> {
        Ok(self.records.clone().unwrap_or_default())
    }

    fn append(&mut self, records: &[SetRecord]) -> Result<()> {
        self.records
            .get_or_insert_with(Vec::new)
            .extend_from_slice(records);
        Ok(())
    }

    fn save(&mut self, records: &[SetRecord]) -> Result<()> {
        self.records = Some(records.to_vec());
        Ok(())
    }
}
