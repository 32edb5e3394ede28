//! Known exercise names.
//!
//! The registry is append-only: names are added once and never removed.

use crate::Result;
use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const HEADER: &str = "Exercise Name";

/// Storage for the exercise name list
pub trait ExerciseRegistry {
    fn exists(&self) -> bool;
    fn load(&self) -> Result<Vec<String>>;
    fn save(&mut self, names: &[String]) -> Result<()>;

    /// Add a name unless it is already known. Returns true if it was added.
    fn register(&mut self, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }

        let mut names = self.load()?;
        if names.iter().any(|n| n == name) {
            tracing::debug!("Exercise '{}' already registered", name);
            return Ok(false);
        }

        names.push(name.to_string());
        self.save(&names)?;
        tracing::info!("Registered exercise '{}'", name);
        Ok(true)
    }
}

/// Single-column CSV registry file
pub struct CsvExerciseRegistry {
    path: PathBuf,
}

impl CsvExerciseRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty registry file if none exists
    pub fn init(&mut self) -> Result<()> {
        if !self.exists() {
            self.save(&[])?;
        }
        Ok(())
    }
}

impl ExerciseRegistry for CsvExerciseRegistry {
    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn load(&self) -> Result<Vec<String>> {
        if !self.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(&file);

        let mut names: Vec<String> = Vec::new();
        for result in reader.records() {
            match result {
                Ok(record) => {
                    if let Some(name) = record.get(0).filter(|n| !n.is_empty()) {
                        if !names.iter().any(|n| n == name) {
                            names.push(name.to_string());
                        }
                    }
                }
                Err(e) => tracing::warn!("Skipping unreadable registry row: {}", e),
            }
        }

        file.unlock()?;
        Ok(names)
    }

    fn save(&mut self, names: &[String]) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;
        {
            let mut writer = csv::Writer::from_writer(temp.as_file());
            writer.write_record([HEADER])?;
            for name in names {
                writer.write_record([name])?;
            }
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(&self.path)
            .map_err(|e| crate::Error::Io(e.error))?;
        Ok(())
    }
}

/// Registry held in memory
#[derive(Clone, Debug, Default)]
pub struct MemoryExerciseRegistry {
    names: Option<Vec<String>>,
}

impl MemoryExerciseRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExerciseRegistry for MemoryExerciseRegistry {
    fn exists(&self) -> bool {
        self.names.is_some()
    }

    fn load(&self) -> Result<Vec<String>> {
        Ok(self.names.clone().unwrap_or_default())
    }

    fn save(&mut self, names: &[String]) -> Result<()> {
        self.names = Some(names.to_vec());
        Ok(())
    }
}
