use crate::js::errors::ParseError;
use crate::js::parser::ParsedSource;
use ast_grep_language::{LanguageExt, SupportLang};
use std::collections::HashMap;
use tree_sitter::{Query, QueryCursor, StreamingIterator};

/// A match from a tree-sitter query with captured nodes.
#[derive(Debug, Clone)]
pub struct QueryMatch {
    /// The full match byte range
    pub byte_start: usize,
    pub byte_end: usize,
    /// Named captures: capture_name -> captured node
    pub captures: HashMap<String, CapturedNode>,
}

impl QueryMatch {
    pub fn capture(&self, name: &str) -> Option<&CapturedNode> {
        self.captures.get(name)
    }
}

#[derive(Debug, Clone)]
pub struct CapturedNode {
    pub byte_start: usize,
    pub byte_end: usize,
    pub text: String,
    pub kind: String,
}

/// Engine for executing tree-sitter queries against parsed JavaScript.
pub struct QueryEngine {
    query: Query,
    capture_names: Vec<String>,
}

impl QueryEngine {
    /// Create a new query engine from a tree-sitter query string.
    ///
    /// Queries use S-expression syntax; captures are prefixed with `@`:
    /// ```text
    /// (call_expression
    ///   function: (member_expression property: (property_identifier) @method)
    ///   arguments: (arguments) @args)
    /// ```
    pub fn new(query_str: &str) -> Result<Self, ParseError> {
        let language = SupportLang::JavaScript.get_ts_language();
        let query = Query::new(&language, query_str).map_err(|e| ParseError::InvalidQuery {
            message: e.to_string(),
        })?;

        let capture_names = query.capture_names().iter().map(|s| s.to_string()).collect();

        Ok(Self {
            query,
            capture_names,
        })
    }

    /// Execute the query against parsed source and return all matches.
    pub fn find_all(&self, parsed: &ParsedSource<'_>) -> Vec<QueryMatch> {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.query, parsed.root_node(), parsed.source.as_bytes());

        let mut results = Vec::new();

        // tree-sitter 0.25+ uses StreamingIterator
        while let Some(m) = matches.next() {
            let mut captures = HashMap::new();
            let mut overall_start = usize::MAX;
            let mut overall_end = 0usize;

            for capture in m.captures {
                let node = capture.node;
                let name = &self.capture_names[capture.index as usize];

                overall_start = overall_start.min(node.start_byte());
                overall_end = overall_end.max(node.end_byte());

                captures.insert(
                    name.clone(),
                    CapturedNode {
                        byte_start: node.start_byte(),
                        byte_end: node.end_byte(),
                        text: parsed.node_text(node).to_string(),
                        kind: node.kind().to_string(),
                    },
                );
            }

            if overall_start != usize::MAX {
                results.push(QueryMatch {
                    byte_start: overall_start,
                    byte_end: overall_end,
                    captures,
                });
            }
        }

        results
    }

    /// Get capture names defined in the query.
    pub fn capture_names(&self) -> &[String] {
        &self.capture_names
    }
}

/// Queries for the shapes a Gruntfile is built from.
pub mod queries {
    /// `module.exports = <function>` at the top level of the program.
    ///
    /// The right-hand side is captured as `@builder` and filtered by kind
    /// in code, so the query stays valid across grammar renames of the
    /// function expression node.
    pub const MODULE_EXPORTS_BUILDER: &str = r#"(program
        (expression_statement
            (assignment_expression
                left: (member_expression
                    object: (identifier) @object
                    property: (property_identifier) @property)
                right: (_) @builder)) @statement
        (#eq? @object "module")
        (#eq? @property "exports"))"#;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::js::parser::JsParser;

    #[test]
    fn find_module_exports_builder() {
        let mut parser = JsParser::new().unwrap();
        let source = "'use strict';\nmodule.exports = function (grunt) {\n    grunt.initConfig({});\n};\n";
        let parsed = parser.parse_with_source(source).unwrap();

        let engine = QueryEngine::new(queries::MODULE_EXPORTS_BUILDER).unwrap();
        let matches = engine.find_all(&parsed);

        assert_eq!(matches.len(), 1);
        let builder = matches[0].capture("builder").unwrap();
        assert!(builder.text.starts_with("function (grunt)"));
        assert!(builder.kind.contains("function"));
    }

    #[test]
    fn other_exports_do_not_match() {
        let mut parser = JsParser::new().unwrap();
        let source = "exports.foo = function () {};\nmodule.other = function () {};\n";
        let parsed = parser.parse_with_source(source).unwrap();

        let engine = QueryEngine::new(queries::MODULE_EXPORTS_BUILDER).unwrap();
        assert!(engine.find_all(&parsed).is_empty());
    }

    #[test]
    fn invalid_query_is_reported() {
        let result = QueryEngine::new("(call_expression");
        assert!(matches!(result, Err(ParseError::InvalidQuery { .. })));
    }
}
