//! Reusable workout templates.
//!
//! A template is a named list of [`PlannedSet`] rows. Set order is assigned
//! per exercise when a template is built, so a stored template always carries
//! contiguous `1..N` orders for each exercise.

use crate::{Error, PlannedSet, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// A named, reusable session plan
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub sets: Vec<PlannedSet>,
}

impl Template {
    /// Validate the name and rows, then assign per-exercise set order
    pub fn build(name: &str, sets: Vec<PlannedSet>) -> Result<Self> {
        let name = validate_template_name(name)?;
        if sets.is_empty() {
            return Err(Error::Validation("Template cannot be empty".into()));
        }

        let orders = assign_set_orders(&sets);
        let sets = sets
            .into_iter()
            .zip(orders)
            .map(|(mut set, order)| {
                set.set_order = Some(order);
                set
            })
            .collect();

        Ok(Self { name, sets })
    }

    /// Rows ready to pre-populate a session, with set order cleared
    pub fn to_draft_sets(&self) -> Vec<PlannedSet> {
        self.sets
            .iter()
            .cloned()
            .map(|mut set| {
                set.set_order = None;
                set
            })
            .collect()
    }
}

/// 1-based position of each set within its exercise, in entry order
pub fn assign_set_orders(sets: &[PlannedSet]) -> Vec<u32> {
    let mut counters: HashMap<&str, u32> = HashMap::new();
    sets.iter()
        .map(|set| {
            let counter = counters.entry(set.exercise.as_str()).or_insert(0);
            *counter += 1;
            *counter
        })
        .collect()
}

/// Trimmed template name, rejecting names that cannot be used as a file stem
pub fn validate_template_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("Please enter a template name".into()));
    }
    if name.starts_with('.') || name.contains(['/', '\\']) {
        return Err(Error::Validation(format!(
            "Template name '{}' may not contain path separators or start with '.'",
            name
        )));
    }
    Ok(name.to_string())
}

/// Storage for templates
pub trait TemplateStore {
    /// Template names, sorted
    fn list(&self) -> Result<Vec<String>>;
    fn exists(&self, name: &str) -> bool;
    fn load(&self, name: &str) -> Result<Template>;
    fn save(&mut self, template: &Template) -> Result<()>;
}

/// One pretty-printed JSON file per template
///
/// The file holds only the row list; the template name is the file stem.
pub struct JsonTemplateStore {
    dir: PathBuf,
}

impl JsonTemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }
}

impl TemplateStore for JsonTemplateStore {
    fn list(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn exists(&self, name: &str) -> bool {
        validate_template_name(name)
            .map(|name| self.path_for(&name).exists())
            .unwrap_or(false)
    }

    fn load(&self, name: &str) -> Result<Template> {
        let name = validate_template_name(name)?;
        let path = self.path_for(&name);
        if !path.exists() {
            return Err(Error::TemplateNotFound(name));
        }

        let contents = std::fs::read_to_string(&path)?;
        let sets: Vec<PlannedSet> = serde_json::from_str(&contents)?;
        tracing::debug!("Loaded template '{}' ({} sets)", name, sets.len());
        Ok(Template { name, sets })
    }

    fn save(&mut self, template: &Template) -> Result<()> {
        let name = validate_template_name(&template.name)?;
        std::fs::create_dir_all(&self.dir)?;

        // Write to a temp file in the same directory, then rename over the old one
        let temp = NamedTempFile::new_in(&self.dir)?;
        temp.as_file().lock_exclusive()?;
        serde_json::to_writer_pretty(temp.as_file(), &template.sets)?;
        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(self.path_for(&name)).map_err(|e| Error::Io(e.error))?;

        tracing::info!("Saved template '{}'", name);
        Ok(())
    }
}

/// Templates held in memory
#[derive(Clone, Debug, Default)]
pub struct MemoryTemplateStore {
    templates: BTreeMap<String, Template>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn list(&self) -> Result<Vec<String>> {
        Ok(self.templates.keys().cloned().collect())
    }

    fn exists(&self, name: &str) -> bool {
        self.templates.contains_key(name.trim())
    }

    fn load(&self, name: &str) -> Result<Template> {
        self.templates
            .get(name.trim())
            .cloned()
            .ok_or_else(|| Error::TemplateNotFound(name.trim().to_string()))
    }

    fn save(&mut self, template: &Template) -> Result<()> {
        let name = validate_template_name(&template.name)?;
        self.templates.insert(name, template.clone());
        Ok(())
    }
}
