//! Thread-local parser pooling.
//!
//! Every value handed to the editor (config bodies, variable values, raw
//! statements) is parsed on its own, so a single session creates many short
//! parses. The pool keeps one JavaScript parser per thread and reuses it.

use crate::js::{JsParser, ParseError};
use std::cell::RefCell;

thread_local! {
    static JS_PARSER: RefCell<Option<JsParser>> = const { RefCell::new(None) };
}

/// Execute function with pooled parser instance.
///
/// On first call per thread, creates new parser. Subsequent calls reuse
/// the same parser instance.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use gruntfile_editor::pool::with_parser;
///
/// let has_errors = with_parser(|parser| {
///     parser
///         .parse_with_source("grunt.initConfig({});")
///         .map(|parsed| parsed.has_errors())
/// })??;
/// assert!(!has_errors);
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(f: F) -> Result<R, ParseError>
where
    F: FnOnce(&mut JsParser) -> R,
{
    JS_PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        let parser = match slot.as_mut() {
            Some(parser) => parser,
            None => slot.insert(JsParser::new()?),
        };
        Ok(f(parser))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pooled_parser_is_reused() {
        let first = with_parser(|parser| parser.parse("var a = 1;").is_ok()).unwrap();
        let second = with_parser(|parser| parser.parse("var b = 2;").is_ok()).unwrap();
        assert!(first && second);
    }
}
