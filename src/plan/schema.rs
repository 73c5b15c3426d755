use crate::validate::OneOrMany;
use serde::Deserialize;
use std::fmt;

/// A named list of edits, as written in a TOML plan file.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct EditPlan {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub edits: Vec<EditDefinition>,
}

impl EditPlan {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.edits.is_empty() {
            issues.push(ValidationIssue::EmptyEditList);
        }

        for (index, edit) in self.edits.iter().enumerate() {
            if let EditDefinition::InsertConfig { body, data, .. } = edit {
                match (body, data) {
                    (Some(_), Some(_)) => issues.push(ValidationIssue::InvalidCombo {
                        index,
                        label: edit.label(),
                        message: "insert-config takes either `body` or `data`, not both"
                            .to_string(),
                    }),
                    (None, None) => issues.push(ValidationIssue::MissingField {
                        index,
                        label: edit.label(),
                        field: "body",
                    }),
                    _ => {}
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EditDefinition {
    InsertConfig {
        path: String,
        /// Value as JavaScript source text.
        #[serde(default)]
        body: Option<String>,
        /// Value as data, written out as a JSON literal.
        #[serde(default)]
        data: Option<serde_json::Value>,
    },
    LoadNpmTasks {
        names: OneOrMany,
    },
    RegisterTask {
        group: String,
        #[serde(default)]
        description: Option<String>,
        tasks: OneOrMany,
        #[serde(default)]
        duplicates: bool,
    },
    InsertVariable {
        name: String,
        value: String,
    },
    AppendJavascript {
        code: String,
    },
    PrependJavascript {
        code: String,
    },
}

impl EditDefinition {
    /// Short label used in reports.
    pub fn label(&self) -> String {
        match self {
            EditDefinition::InsertConfig { path, .. } => format!("insert-config {path}"),
            EditDefinition::LoadNpmTasks { names } => match names {
                OneOrMany::One(name) => format!("load-npm-tasks {name}"),
                OneOrMany::Many(names) => format!("load-npm-tasks {}", names.join(", ")),
            },
            EditDefinition::RegisterTask { group, .. } => format!("register-task {group}"),
            EditDefinition::InsertVariable { name, .. } => format!("insert-variable {name}"),
            EditDefinition::AppendJavascript { .. } => "append-javascript".to_string(),
            EditDefinition::PrependJavascript { .. } => "prepend-javascript".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyEditList,
    MissingField {
        index: usize,
        label: String,
        field: &'static str,
    },
    InvalidCombo {
        index: usize,
        label: String,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyEditList => write!(f, "edit plan contains no edits"),
            ValidationIssue::MissingField { index, label, field } => {
                write!(f, "edit #{} ({label}) missing required field '{field}'", index + 1)
            }
            ValidationIssue::InvalidCombo { index, label, message } => {
                write!(f, "edit #{} ({label}) has invalid configuration: {message}", index + 1)
            }
        }
    }
}
