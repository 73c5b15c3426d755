//! Tree-sitter backed JavaScript handling for Gruntfiles.
//!
//! Source is parsed once into a small typed model ([`model`]); edits work on
//! the model and [`printer`] renders it back in a canonical layout.

pub mod document;
pub mod errors;
pub mod lower;
pub mod model;
pub mod parser;
pub mod printer;
pub mod query;

pub use document::{GruntfileDocument, DEFAULT_GRUNTFILE};
pub use errors::ParseError;
pub use model::{
    ConfigRoot, DeclKind, Declaration, Declarator, Expr, Member, ObjectExpr, PropKey, Statement,
    TaskGroup, TaskList,
};
pub use parser::{JsParser, ParsedSource};
pub use query::{QueryEngine, QueryMatch};
