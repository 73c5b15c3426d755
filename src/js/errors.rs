use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("failed to set JavaScript language for parser")]
    LanguageSet,

    #[error("failed to parse source code")]
    ParseFailed,

    #[error("invalid tree-sitter query: {message}")]
    InvalidQuery { message: String },

    #[error("syntax error detected at byte {byte_start}..{byte_end}")]
    SyntaxError { byte_start: usize, byte_end: usize },

    #[error("no `module.exports = function (grunt) {{ ... }}` builder found")]
    MissingBuilder,

    #[error("found {count} `module.exports` builders, expected exactly 1")]
    AmbiguousBuilder { count: usize },
}
