//! The structural editor.
//!
//! Each operation validates its arguments, looks up a matching statement in
//! the [`Document`] and either updates it in place or inserts a new one.
//! Operations return `&mut Self` so calls chain:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use gruntfile_editor::{GruntfileEditor, TaskOptions};
//!
//! let mut editor = GruntfileEditor::new();
//! editor
//!     .insert_config("compass", "{ dist: { options: { debug: false } } }")?
//!     .load_npm_tasks("grunt-contrib-compass")?
//!     .register_task("build", ["compass", "concat"], TaskOptions::default())?;
//! println!("{editor}");
//! # Ok(())
//! # }
//! ```

use crate::document::{CallShape, Document, NodeId};
use crate::js::model::{
    ConfigRoot, DeclKind, Declaration, Expr, ObjectExpr, Statement, TaskGroup, TaskList,
};
use crate::js::{GruntfileDocument, ParseError};
use crate::validate::{non_empty, string_list, task_list, ConfigPath, InvalidArgument, OneOrMany};
use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

/// Per-call options for task group edits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOptions {
    /// Append tokens already present in the group instead of skipping them.
    #[serde(default)]
    pub duplicates: bool,
}

impl TaskOptions {
    pub fn allow_duplicates() -> Self {
        Self { duplicates: true }
    }
}

/// Arguments of a task group edit, with or without a description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskGroupInput {
    Tasks(OneOrMany),
    Described {
        description: String,
        tasks: OneOrMany,
    },
}

/// Edits one Gruntfile in memory.
#[derive(Debug, Clone)]
pub struct GruntfileEditor<D = GruntfileDocument> {
    document: D,
}

impl GruntfileEditor<GruntfileDocument> {
    /// Editor over a fresh copy of the default template.
    pub fn new() -> Self {
        Self::with_document(GruntfileDocument::default_template())
    }

    /// Editor over an existing Gruntfile.
    pub fn from_source(source: &str) -> Result<Self, ParseError> {
        Ok(Self::with_document(GruntfileDocument::parse(source)?))
    }
}

impl Default for GruntfileEditor<GruntfileDocument> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Document> GruntfileEditor<D> {
    pub fn with_document(document: D) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn into_document(self) -> D {
        self.document
    }

    /// The document as source text.
    pub fn serialize(&self) -> String {
        self.document.serialize()
    }

    /// xxh3 hash of the serialized document.
    pub fn fingerprint(&self) -> u64 {
        xxh3_64(self.serialize().as_bytes())
    }

    /// Set the config value at dotted `path` to the expression `body`.
    ///
    /// Missing objects along the path are created. An existing value at the
    /// final key is replaced, never merged. When `initConfig` is called with
    /// a variable, the object literal that variable holds is edited instead.
    pub fn insert_config(&mut self, path: &str, body: &str) -> Result<&mut Self, InvalidArgument> {
        let path = ConfigPath::parse(path)?;
        let body = non_empty(body, "a task configuration body as a String")?;
        let value = self.document.parse_expression(&body);

        let id = match self.document.find_call(CallShape::InitConfig) {
            Some(id) => self.config_object(id)?,
            None => {
                tracing::trace!("creating config root");
                self.document
                    .insert_at_tail(Statement::ConfigRoot(ConfigRoot::Object(ObjectExpr::new())))
            }
        };

        match self.document.object_mut(id) {
            Some(root) => {
                let (parents, key) = path.split_last();
                let target = parents
                    .iter()
                    .fold(root, |object, segment| object.object_entry(segment));
                target.set(key, value);
                tracing::trace!(path = %path, "config entry set");
            }
            None => {
                tracing::warn!(?id, "document returned no object for its config root");
            }
        }
        Ok(self)
    }

    /// Node holding the object literal behind the `initConfig` call at `root`.
    fn config_object(&self, root: NodeId) -> Result<NodeId, InvalidArgument> {
        let uneditable = |config: &str| InvalidArgument::UneditableConfig {
            config: config.to_string(),
        };
        match self.document.statement(root) {
            Some(Statement::ConfigRoot(ConfigRoot::Reference(name))) => {
                let variable = self
                    .document
                    .find_variable(name)
                    .ok_or_else(|| uneditable(name.as_str()))?;
                match self.document.variable_value(variable) {
                    Some(Expr::Object(_)) => {
                        tracing::trace!(variable = %name, "editing config through its variable");
                        Ok(variable)
                    }
                    _ => Err(uneditable(name.as_str())),
                }
            }
            Some(Statement::ConfigRoot(ConfigRoot::Opaque(args))) => Err(uneditable(args.as_str())),
            _ => Ok(root),
        }
    }

    /// [`insert_config`](Self::insert_config) with a value given as data.
    pub fn insert_config_json(
        &mut self,
        path: &str,
        data: &serde_json::Value,
    ) -> Result<&mut Self, InvalidArgument> {
        self.insert_config(path, &data.to_string())
    }

    /// Load each plugin once. New loads go to the head of the builder.
    pub fn load_npm_tasks(
        &mut self,
        names: impl Into<OneOrMany>,
    ) -> Result<&mut Self, InvalidArgument> {
        let names = string_list(&names.into(), "a plugin name")?;

        for name in names {
            if self
                .document
                .find_call(CallShape::LoadNpmTasks(&name))
                .is_some()
            {
                tracing::debug!(plugin = %name, "plugin already loaded");
                continue;
            }
            tracing::trace!(plugin = %name, "loading plugin");
            self.document.insert_at_head(Statement::LoadTasks(name));
        }
        Ok(self)
    }

    /// Add tasks to group `group`, creating it at the tail when missing.
    pub fn register_task(
        &mut self,
        group: &str,
        tasks: impl Into<OneOrMany>,
        options: TaskOptions,
    ) -> Result<&mut Self, InvalidArgument> {
        self.register(group, TaskGroupInput::Tasks(tasks.into()), options)
    }

    /// Like [`register_task`](Self::register_task), also setting the
    /// group description.
    pub fn register_task_with_description(
        &mut self,
        group: &str,
        description: &str,
        tasks: impl Into<OneOrMany>,
        options: TaskOptions,
    ) -> Result<&mut Self, InvalidArgument> {
        let input = TaskGroupInput::Described {
            description: description.to_string(),
            tasks: tasks.into(),
        };
        self.register(group, input, options)
    }

    /// Task group upsert.
    ///
    /// An existing group keeps its tasks and their order; new tokens are
    /// appended in the order given. Unless `options.duplicates` is set, a
    /// token already in the group is skipped. A group registered with a
    /// task function cannot take tasks and is rejected.
    pub fn register(
        &mut self,
        group: &str,
        input: TaskGroupInput,
        options: TaskOptions,
    ) -> Result<&mut Self, InvalidArgument> {
        let group = non_empty(group, "a task group name")?;
        let (description, tasks) = match &input {
            TaskGroupInput::Tasks(tasks) => (None, tasks),
            TaskGroupInput::Described { description, tasks } => (
                Some(non_empty(description, "a description as a String")?),
                tasks,
            ),
        };
        let tasks = task_list(tasks)?;

        let id = match self.document.find_call(CallShape::RegisterTask(&group)) {
            Some(id) => {
                if let Some(Statement::TaskGroup(existing)) = self.document.statement_mut(id) {
                    if let TaskList::Opaque(_) = existing.tasks {
                        return Err(InvalidArgument::NotATaskList { group });
                    }
                    if let Some(description) = description {
                        existing.description = Some(Expr::Str(description));
                    }
                }
                id
            }
            None => {
                tracing::trace!(group = %group, "creating task group");
                self.document
                    .insert_at_tail(Statement::TaskGroup(TaskGroup::new(group.clone(), description)))
            }
        };

        for task in tasks {
            if !options.duplicates && self.document.array_elements(id).contains(&task) {
                tracing::debug!(group = %group, task = %task, "task already registered");
                continue;
            }
            self.document.push_array_element(id, task);
        }
        Ok(self)
    }

    /// Declare variable `name`, or replace its value where it stands.
    ///
    /// New declarations go to the head of the builder, ahead of the config.
    pub fn insert_variable(&mut self, name: &str, value: &str) -> Result<&mut Self, InvalidArgument> {
        let name = non_empty(name, "a variable name")?;
        let value = non_empty(value, "a variable value as a String")?;
        let value = self.document.parse_expression(&value);

        match self.document.find_variable(&name) {
            Some(id) => {
                tracing::trace!(variable = %name, "replacing variable value");
                self.document.replace_value(id, value);
            }
            None => {
                tracing::trace!(variable = %name, "declaring variable");
                let declaration = Declaration::single(DeclKind::Var, name, value);
                self.document.insert_at_head(Statement::Declaration(declaration));
            }
        }
        Ok(self)
    }

    /// Insert `code` at the tail of the builder.
    pub fn append_javascript(&mut self, code: &str) -> Result<&mut Self, InvalidArgument> {
        let code = non_empty(code, "code to be inserted")?;
        for statement in self.document.parse_statements(&code) {
            self.document.insert_at_tail(statement);
        }
        Ok(self)
    }

    /// Insert `code` at the head of the builder.
    pub fn prepend_javascript(&mut self, code: &str) -> Result<&mut Self, InvalidArgument> {
        let code = non_empty(code, "code to be inserted")?;
        // Reversed so a multi-statement fragment keeps its own order
        for statement in self.document.parse_statements(&code).into_iter().rev() {
            self.document.insert_at_head(statement);
        }
        Ok(self)
    }
}

impl<D: Document> fmt::Display for GruntfileEditor<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}
