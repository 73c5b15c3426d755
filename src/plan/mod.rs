//! Declarative edit plans.
//!
//! A plan is a TOML file listing editor operations, so generators can ship
//! their Gruntfile changes as data.

pub mod applicator;
pub mod loader;
pub mod schema;

pub use applicator::{apply_plan, ApplicationError, EditOutcome};
pub use loader::{discover_plan_files, load_from_path, load_from_str, ConfigError, PlanOrigin};
pub use schema::{EditDefinition, EditPlan, Metadata, ValidationError, ValidationIssue};
