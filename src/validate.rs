//! Argument validation and normalization.
//!
//! Every editor operation runs its inputs through these functions before it
//! touches the document, so a rejected call never leaves a partial edit.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The one error kind editor operations raise.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidArgument {
    #[error("You must provide {what}")]
    Blank { what: &'static str },

    #[error("You must provide {what}, got an empty list")]
    EmptyList { what: &'static str },

    #[error("You must provide {what}, entry {index} is blank")]
    BlankElement { what: &'static str, index: usize },

    #[error("Invalid config path `{path}`: {message}")]
    InvalidPath { path: String, message: String },

    #[error("initConfig is called with `{config}`, not an object literal that can take entries")]
    UneditableConfig { config: String },

    #[error("Task group `{group}` is registered with a task function, not a task list")]
    NotATaskList { group: String },
}

/// A single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for OneOrMany {
    fn from(value: &str) -> Self {
        OneOrMany::One(value.to_string())
    }
}

impl From<String> for OneOrMany {
    fn from(value: String) -> Self {
        OneOrMany::One(value)
    }
}

impl From<&String> for OneOrMany {
    fn from(value: &String) -> Self {
        OneOrMany::One(value.clone())
    }
}

impl From<Vec<String>> for OneOrMany {
    fn from(values: Vec<String>) -> Self {
        OneOrMany::Many(values)
    }
}

impl From<Vec<&str>> for OneOrMany {
    fn from(values: Vec<&str>) -> Self {
        OneOrMany::Many(values.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for OneOrMany {
    fn from(values: &[&str]) -> Self {
        OneOrMany::Many(values.iter().map(|value| value.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for OneOrMany {
    fn from(values: [&str; N]) -> Self {
        OneOrMany::Many(values.iter().map(|value| value.to_string()).collect())
    }
}

/// Trimmed `value`, rejected when blank.
pub fn non_empty(value: &str, what: &'static str) -> Result<String, InvalidArgument> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(InvalidArgument::Blank { what });
    }
    Ok(trimmed.to_string())
}

/// Normalize a name list: every entry trimmed, none blank, at least one.
///
/// A single string is one entry; commas carry no meaning here.
pub fn string_list(values: &OneOrMany, what: &'static str) -> Result<Vec<String>, InvalidArgument> {
    match values {
        OneOrMany::One(value) => Ok(vec![non_empty(value, what)?]),
        OneOrMany::Many(values) => list_entries(values, what),
    }
}

/// Normalize a task specification.
///
/// A single string is split on commas, with blank segments dropped. A list
/// is taken entry by entry, and a blank entry is an error.
pub fn task_list(tasks: &OneOrMany) -> Result<Vec<String>, InvalidArgument> {
    const WHAT: &str = "a task or an array of tasks";
    match tasks {
        OneOrMany::One(value) => {
            let tokens: Vec<String> = value
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect();
            if tokens.is_empty() {
                return Err(InvalidArgument::Blank { what: WHAT });
            }
            Ok(tokens)
        }
        OneOrMany::Many(values) => list_entries(values, WHAT),
    }
}

fn list_entries(values: &[String], what: &'static str) -> Result<Vec<String>, InvalidArgument> {
    if values.is_empty() {
        return Err(InvalidArgument::EmptyList { what });
    }
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Err(InvalidArgument::BlankElement { what, index })
            } else {
                Ok(trimmed.to_string())
            }
        })
        .collect()
}

/// Dotted path into the config object, e.g. `compass.dist`.
///
/// Segments are trimmed and may contain inner spaces (`'my key'` style keys).
/// Segments containing dots must be quoted: `copy."app.js"`. Empty segments
/// are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigPath {
    segments: Vec<String>,
}

impl ConfigPath {
    pub fn parse(input: &str) -> Result<Self, InvalidArgument> {
        let trimmed = non_empty(input, "a task name")?;
        let segments = parse_dotted_path(&trimmed)?;
        if segments.is_empty() {
            return Err(invalid_path(&trimmed, "empty path"));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Intermediate segments and the final key.
    pub fn split_last(&self) -> (&[String], &str) {
        match self.segments.split_last() {
            Some((last, parents)) => (parents, last.as_str()),
            None => (&[], ""),
        }
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

fn invalid_path(path: &str, message: &str) -> InvalidArgument {
    InvalidArgument::InvalidPath {
        path: path.to_string(),
        message: message.to_string(),
    }
}

const EMPTY_SEGMENT: &str = "empty path segment (quote keys that contain dots)";

fn parse_dotted_path(input: &str) -> Result<Vec<String>, InvalidArgument> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut segment_quoted = false;
    let mut chars = input.chars();
    let mut quote_char = '\0';

    let mut finish = |current: &mut String, segment_quoted: bool| {
        let segment = std::mem::take(current);
        let segment = if segment_quoted {
            segment
        } else {
            segment.trim().to_string()
        };
        if segment.is_empty() {
            return Err(invalid_path(input, EMPTY_SEGMENT));
        }
        segments.push(segment);
        Ok(())
    };

    while let Some(ch) = chars.next() {
        if let Some(close) = quoted.then_some(quote_char) {
            match ch {
                ch if ch == close => quoted = false,
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                }
                other => current.push(other),
            }
            continue;
        }

        match ch {
            '.' => {
                finish(&mut current, segment_quoted)?;
                segment_quoted = false;
            }
            '"' | '\'' => {
                if segment_quoted || !current.trim().is_empty() {
                    return Err(invalid_path(input, "unexpected quote inside segment"));
                }
                current.clear();
                quoted = true;
                segment_quoted = true;
                quote_char = ch;
            }
            // Spacing around a quoted segment
            ch if ch.is_whitespace() && segment_quoted => {}
            other => {
                if segment_quoted {
                    return Err(invalid_path(input, "unexpected text after quoted segment"));
                }
                current.push(other);
            }
        }
    }

    if quoted {
        return Err(invalid_path(input, "unterminated quoted segment"));
    }
    finish(&mut current, segment_quoted)?;

    Ok(segments)
}
