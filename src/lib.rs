//! Gruntfile Editor: idempotent structural edits for `Gruntfile.js`
//!
//! Scaffolding generators each contribute pieces of one Gruntfile: config
//! blocks, plugin loads, task pipelines, variables. This crate lets every
//! generator make its edit without caring what the others did before.
//!
//! # Architecture
//!
//! The source is parsed once with tree-sitter into a small typed model of the
//! builder function body ([`js::model`]). The [`GruntfileEditor`] works only
//! against the narrow [`Document`] capability and never touches text; the
//! document prints itself back in a canonical layout on demand.
//!
//! # Guarantees
//!
//! - Re-applying an edit never duplicates content
//! - Conflicting edits resolve as last write wins
//! - A rejected call leaves the document unchanged
//! - Statements an edit does not target keep their order
//!
//! # Example
//!
//! ```no_run
//! use gruntfile_editor::{GruntfileEditor, TaskOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut editor = GruntfileEditor::new();
//! editor
//!     .insert_variable("paths", "require('./bower.json').appPath")?
//!     .insert_config("concat.dist", "{ src: ['app/**/*.js'] }")?
//!     .load_npm_tasks("grunt-contrib-concat")?
//!     .register_task("build", "concat", TaskOptions::default())?;
//!
//! print!("{}", editor.serialize());
//! # Ok(())
//! # }
//! ```

pub mod document;
pub mod editor;
pub mod js;
pub mod output;
pub mod plan;
pub mod pool;
pub mod validate;

// Re-exports
pub use document::{CallShape, Document, NodeId};
pub use editor::{GruntfileEditor, TaskGroupInput, TaskOptions};
pub use js::{GruntfileDocument, ParseError, DEFAULT_GRUNTFILE};
pub use output::{write_gruntfile, WriteError, WriteResult};
pub use plan::{
    apply_plan, load_from_path, load_from_str, ApplicationError, ConfigError, EditOutcome,
    EditPlan,
};
pub use validate::{InvalidArgument, OneOrMany};
