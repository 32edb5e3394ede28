#![forbid(unsafe_code)]

//! Core domain model and business logic for the liftlog system.
//!
//! This crate provides:
//! - Domain types (set records, planned sets, session keys)
//! - Warmup / working set classification
//! - Progress metrics and dashboard views
//! - Strong export import
//! - Persistence (log, exercise registry, templates)
//! - Session logging

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod classifier;
pub mod metrics;
pub mod dashboard;
pub mod strong;
pub mod log_store;
pub mod registry;
pub mod templates;
pub mod session;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{Config, DataPaths};
pub use classifier::{classify, ClassifierRow};
pub use dashboard::{ChartKind, DateRange, ExerciseSummary, ExerciseView};
pub use log_store::{merge_into, CsvLogStore, LogStore, MergeOutcome};
pub use registry::{CsvExerciseRegistry, ExerciseRegistry};
pub use templates::{JsonTemplateStore, Template, TemplateStore};
pub use session::SessionDraft;
pub use strong::convert_strong_export;
