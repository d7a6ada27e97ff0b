//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (DefinitionSource, ExportSource)
//! but are themselves concrete structs, not traits.

mod survey;

pub use survey::{label_columns, ColumnLabel, SurveyService};
