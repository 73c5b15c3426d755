//! Plan applicator - runs plan edits against an editor
//!
//! Edits are applied in order to a staged copy of the editor. The copy only
//! replaces the caller's editor once every edit has succeeded, so a failing
//! plan leaves the document as it was.

use crate::document::Document;
use crate::editor::{GruntfileEditor, TaskGroupInput, TaskOptions};
use crate::plan::schema::{EditDefinition, EditPlan};
use crate::validate::InvalidArgument;
use std::fmt;

/// Result of applying a single edit
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "EditOutcome should be checked to report what changed"]
pub enum EditOutcome {
    /// The edit changed the document
    Applied { label: String },
    /// The document already contained the edit
    AlreadyApplied { label: String },
}

impl EditOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, EditOutcome::Applied { .. })
    }
}

impl fmt::Display for EditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditOutcome::Applied { label } => write!(f, "Applied {label}"),
            EditOutcome::AlreadyApplied { label } => write!(f, "Already applied {label}"),
        }
    }
}

/// Errors during plan application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationError {
    /// An edit was rejected by the editor
    InvalidArgument {
        index: usize,
        label: String,
        source: InvalidArgument,
    },
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationError::InvalidArgument {
                index,
                label,
                source,
            } => write!(f, "edit #{} ({label}) rejected: {source}", index + 1),
        }
    }
}

impl std::error::Error for ApplicationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApplicationError::InvalidArgument { source, .. } => Some(source),
        }
    }
}

/// Apply every edit of `plan` to `editor`.
///
/// Returns one outcome per edit. On error the editor is left untouched.
pub fn apply_plan<D>(
    plan: &EditPlan,
    editor: &mut GruntfileEditor<D>,
) -> Result<Vec<EditOutcome>, ApplicationError>
where
    D: Document + Clone,
{
    let mut staged = editor.clone();
    let mut outcomes = Vec::with_capacity(plan.edits.len());

    for (index, edit) in plan.edits.iter().enumerate() {
        let label = edit.label();
        let before = staged.fingerprint();

        apply_edit(edit, &mut staged).map_err(|source| ApplicationError::InvalidArgument {
            index,
            label: label.clone(),
            source,
        })?;

        if staged.fingerprint() == before {
            tracing::debug!(edit = %label, "edit already applied");
            outcomes.push(EditOutcome::AlreadyApplied { label });
        } else {
            tracing::debug!(edit = %label, "edit applied");
            outcomes.push(EditOutcome::Applied { label });
        }
    }

    *editor = staged;
    Ok(outcomes)
}

fn apply_edit<D: Document>(
    edit: &EditDefinition,
    editor: &mut GruntfileEditor<D>,
) -> Result<(), InvalidArgument> {
    match edit {
        EditDefinition::InsertConfig { path, body, data } => match (body, data) {
            (Some(body), _) => editor.insert_config(path, body)?,
            (None, Some(data)) => editor.insert_config_json(path, data)?,
            (None, None) => editor.insert_config(path, "")?,
        },
        EditDefinition::LoadNpmTasks { names } => editor.load_npm_tasks(names.clone())?,
        EditDefinition::RegisterTask {
            group,
            description,
            tasks,
            duplicates,
        } => {
            let input = match description {
                Some(description) => TaskGroupInput::Described {
                    description: description.clone(),
                    tasks: tasks.clone(),
                },
                None => TaskGroupInput::Tasks(tasks.clone()),
            };
            editor.register(group, input, TaskOptions { duplicates: *duplicates })?
        }
        EditDefinition::InsertVariable { name, value } => editor.insert_variable(name, value)?,
        EditDefinition::AppendJavascript { code } => editor.append_javascript(code)?,
        EditDefinition::PrependJavascript { code } => editor.prepend_javascript(code)?,
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::loader::load_from_str;

    const PLAN: &str = r#"
[[edits]]
type = "load-npm-tasks"
names = "grunt-contrib-concat"

[[edits]]
type = "insert-config"
path = "concat.dist"
data = { src = ["app/*.js"] }

[[edits]]
type = "register-task"
group = "build"
tasks = ["concat"]
"#;

    #[test]
    fn applies_then_reports_already_applied() {
        let plan = load_from_str(PLAN).unwrap();
        let mut editor = GruntfileEditor::new();

        let first = apply_plan(&plan, &mut editor).unwrap();
        assert!(first.iter().all(EditOutcome::is_applied));

        let text = editor.serialize();
        let second = apply_plan(&plan, &mut editor).unwrap();
        assert!(second.iter().all(|outcome| !outcome.is_applied()));
        assert_eq!(editor.serialize(), text);
    }

    #[test]
    fn failing_edit_rolls_back_the_whole_plan() {
        let plan = load_from_str(
            r#"
[[edits]]
type = "load-npm-tasks"
names = "grunt-contrib-concat"

[[edits]]
type = "insert-variable"
name = "paths"
value = "   "
"#,
        )
        .unwrap();
        let mut editor = GruntfileEditor::new();
        let before = editor.serialize();

        let err = apply_plan(&plan, &mut editor).unwrap_err();
        assert_eq!(
            err,
            ApplicationError::InvalidArgument {
                index: 1,
                label: "insert-variable paths".into(),
                source: InvalidArgument::Blank {
                    what: "a variable value as a String"
                },
            }
        );
        assert_eq!(editor.serialize(), before);
    }
}
