//! Lowering from the tree-sitter CST into the typed model.

use crate::js::model::{
    ConfigRoot, DeclKind, Declaration, Declarator, Expr, Member, ObjectExpr, PropKey, Statement,
    TaskGroup, TaskList,
};
use crate::js::printer::quote;
use crate::pool::with_parser;
use std::collections::HashSet;
use tree_sitter::Node;

/// Parse a free-standing value expression.
///
/// Text that does not parse as exactly one expression is kept verbatim.
pub fn parse_expression(text: &str) -> Expr {
    let text = text.trim();
    // Parenthesized so that `{ ... }` reads as an object, not a block. The
    // newlines end any trailing line comment before the closing paren.
    let wrapped = format!("(\n{text}\n)");
    let lowered = with_parser(|parser| {
        let parsed = parser.parse_with_source(&wrapped).ok()?;
        if parsed.has_errors() {
            return None;
        }
        let statements = named_children(parsed.root_node());
        let [statement] = statements[..] else {
            return None;
        };
        let paren = first_named(statement)?;
        if paren.kind() != "parenthesized_expression"
            || paren.start_byte() != 0
            || paren.end_byte() != wrapped.len()
        {
            return None;
        }
        let inner: Vec<Node<'_>> = named_children(paren)
            .into_iter()
            .filter(|node| node.kind() != "comment")
            .collect();
        match inner[..] {
            [value] if value.kind() == "sequence_expression" => Some(Expr::Source(format!(
                "({})",
                canonical_source(value, &wrapped)
            ))),
            [value] => Some(lower_expression(value, &wrapped)),
            _ => None,
        }
    });

    match lowered {
        Ok(Some(expr)) => expr,
        Ok(None) => {
            tracing::warn!(value = text, "value is not a single expression, keeping it verbatim");
            Expr::Source(text.to_string())
        }
        Err(err) => {
            tracing::warn!(error = %err, "parser unavailable, keeping value verbatim");
            Expr::Source(text.to_string())
        }
    }
}

/// Parse a code fragment into raw statements, one per top-level statement.
///
/// A fragment that does not parse is kept as a single verbatim statement.
pub fn parse_statements(code: &str) -> Vec<Statement> {
    let code = code.trim();
    let lowered = with_parser(|parser| {
        let parsed = parser.parse_with_source(code).ok()?;
        if parsed.has_errors() {
            return None;
        }
        let statements: Vec<Statement> = named_children(parsed.root_node())
            .into_iter()
            .filter(|node| node.kind() != "hash_bang_line")
            .map(|node| Statement::Raw(canonical_source(node, code)))
            .collect();
        Some(statements)
    });

    match lowered {
        Ok(Some(statements)) if !statements.is_empty() => statements,
        Ok(_) => {
            tracing::warn!(code, "code fragment does not parse, inserting it verbatim");
            vec![Statement::Raw(code.to_string())]
        }
        Err(err) => {
            tracing::warn!(error = %err, "parser unavailable, inserting code verbatim");
            vec![Statement::Raw(code.to_string())]
        }
    }
}

/// Lower a value node into an [`Expr`].
pub fn lower_expression(node: Node<'_>, source: &str) -> Expr {
    match node.kind() {
        "string" => Expr::Str(unquote(&source[node.byte_range()])),
        "array" => Expr::Array(
            named_children(node)
                .into_iter()
                .filter(|child| child.kind() != "comment")
                .map(|child| lower_expression(child, source))
                .collect(),
        ),
        "object" => Expr::Object(lower_object(node, source)),
        _ => Expr::Source(canonical_source(node, source)),
    }
}

/// Lower an `object` node. Comments between members are dropped.
pub fn lower_object(node: Node<'_>, source: &str) -> ObjectExpr {
    let mut object = ObjectExpr::new();
    for child in named_children(node) {
        match child.kind() {
            "comment" => {}
            "pair" => {
                let (Some(key), Some(value)) = (
                    child.child_by_field_name("key"),
                    child.child_by_field_name("value"),
                ) else {
                    object
                        .members
                        .push(Member::Verbatim(canonical_source(child, source)));
                    continue;
                };
                let key = match key.kind() {
                    "property_identifier" => PropKey::Ident(source[key.byte_range()].to_string()),
                    "string" => PropKey::Str(unquote(&source[key.byte_range()])),
                    _ => PropKey::Verbatim(canonical_source(key, source)),
                };
                object.members.push(Member::Pair {
                    key,
                    value: lower_expression(value, source),
                });
            }
            _ => object
                .members
                .push(Member::Verbatim(canonical_source(child, source))),
        }
    }
    object
}

/// Source text of `node` with every string literal re-quoted canonically.
pub fn canonical_source(node: Node<'_>, source: &str) -> String {
    let mut spans = Vec::new();
    collect_string_spans(node, &mut spans);

    let range = node.byte_range();
    let mut out = String::with_capacity(range.len());
    let mut cursor = range.start;
    for span in spans {
        out.push_str(&source[cursor..span.start]);
        out.push_str(&quote(&unquote(&source[span.clone()])));
        cursor = span.end;
    }
    out.push_str(&source[cursor..range.end]);
    out
}

fn collect_string_spans(node: Node<'_>, spans: &mut Vec<std::ops::Range<usize>>) {
    if node.kind() == "string" {
        spans.push(node.byte_range());
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_string_spans(child, spans);
    }
}

/// Classifies builder body statements into the typed model.
///
/// Only the first `initConfig` call and the first `registerTask` call per
/// group become structural; later duplicates stay raw so the document
/// keeps a single editable node for each.
pub struct StatementLowering<'s> {
    source: &'s str,
    receiver: &'s str,
    in_prologue: bool,
    has_config_root: bool,
    groups: HashSet<String>,
}

impl<'s> StatementLowering<'s> {
    pub fn new(source: &'s str, receiver: &'s str) -> Self {
        Self {
            source,
            receiver,
            in_prologue: true,
            has_config_root: false,
            groups: HashSet::new(),
        }
    }

    pub fn lower(&mut self, node: Node<'_>) -> Statement {
        let statement = self.classify(node).unwrap_or_else(|| {
            Statement::Raw(canonical_source(node, self.source))
        });
        if !matches!(statement, Statement::Directive(_)) && node.kind() != "comment" {
            self.in_prologue = false;
        }
        statement
    }

    fn classify(&mut self, node: Node<'_>) -> Option<Statement> {
        match node.kind() {
            "expression_statement" => {
                let expression = first_named(node)?;
                match expression.kind() {
                    "string" if self.in_prologue => Some(Statement::Directive(unquote(
                        &self.source[expression.byte_range()],
                    ))),
                    "call_expression" => self.classify_call(expression),
                    _ => None,
                }
            }
            "variable_declaration" | "lexical_declaration" => self.classify_declaration(node),
            _ => None,
        }
    }

    fn classify_call(&mut self, call: Node<'_>) -> Option<Statement> {
        let callee = call.child_by_field_name("function")?;
        if callee.kind() != "member_expression" {
            return None;
        }
        let object = callee.child_by_field_name("object")?;
        let property = callee.child_by_field_name("property")?;
        if object.kind() != "identifier" || &self.source[object.byte_range()] != self.receiver {
            return None;
        }

        let arguments = call.child_by_field_name("arguments")?;
        if arguments.kind() != "arguments" {
            return None;
        }
        let args: Vec<Node<'_>> = named_children(arguments)
            .into_iter()
            .filter(|arg| arg.kind() != "comment")
            .collect();

        match &self.source[property.byte_range()] {
            "initConfig" if !self.has_config_root => {
                self.has_config_root = true;
                let root = match args.as_slice() {
                    [config] if config.kind() == "object" => {
                        ConfigRoot::Object(lower_object(*config, self.source))
                    }
                    [config] if config.kind() == "identifier" => {
                        ConfigRoot::Reference(self.source[config.byte_range()].to_string())
                    }
                    _ => ConfigRoot::Opaque(self.join_source(&args)),
                };
                Some(Statement::ConfigRoot(root))
            }
            "loadNpmTasks" => match args.as_slice() {
                [plugin] if plugin.kind() == "string" => Some(Statement::LoadTasks(unquote(
                    &self.source[plugin.byte_range()],
                ))),
                _ => None,
            },
            "registerTask" => self.classify_task_group(&args),
            _ => None,
        }
    }

    fn classify_task_group(&mut self, args: &[Node<'_>]) -> Option<Statement> {
        let (name, rest) = args.split_first()?;
        if name.kind() != "string" {
            return None;
        }
        let name = unquote(&self.source[name.byte_range()]);
        if self.groups.contains(&name) {
            return None;
        }

        let (description, tasks) = match rest {
            [tasks] => (None, self.task_list(*tasks)),
            [description, tasks] => (
                Some(lower_expression(*description, self.source)),
                self.task_list(*tasks),
            ),
            _ => (None, TaskList::Opaque(self.join_source(rest))),
        };

        self.groups.insert(name.clone());
        Some(Statement::TaskGroup(TaskGroup {
            name,
            description,
            tasks,
        }))
    }

    fn task_list(&self, node: Node<'_>) -> TaskList {
        match lower_expression(node, self.source) {
            Expr::Array(items) => TaskList::Names(items),
            _ => TaskList::Opaque(canonical_source(node, self.source)),
        }
    }

    fn classify_declaration(&self, node: Node<'_>) -> Option<Statement> {
        let keyword = node.child(0)?;
        let kind = DeclKind::from_keyword(&self.source[keyword.byte_range()])?;

        let declarators: Vec<Declarator> = named_children(node)
            .into_iter()
            .filter(|child| child.kind() == "variable_declarator")
            .map(|declarator| self.lower_declarator(declarator))
            .collect();
        if declarators.is_empty() {
            return None;
        }
        Some(Statement::Declaration(Declaration { kind, declarators }))
    }

    fn lower_declarator(&self, declarator: Node<'_>) -> Declarator {
        match declarator.child_by_field_name("name") {
            Some(name) if name.kind() == "identifier" => Declarator::Named {
                name: self.source[name.byte_range()].to_string(),
                value: declarator
                    .child_by_field_name("value")
                    .map(|value| lower_expression(value, self.source)),
            },
            _ => Declarator::Pattern(canonical_source(declarator, self.source)),
        }
    }

    fn join_source(&self, nodes: &[Node<'_>]) -> String {
        nodes
            .iter()
            .map(|node| canonical_source(*node, self.source))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let children = node.named_children(&mut cursor).collect();
    children
}

fn first_named(node: Node<'_>) -> Option<Node<'_>> {
    named_children(node)
        .into_iter()
        .find(|child| child.kind() != "comment")
}

/// Decode a quoted JavaScript string literal (quotes included).
pub fn unquote(raw: &str) -> String {
    let inner = if raw.len() >= 2 {
        &raw[1..raw.len() - 1]
    } else {
        ""
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('0') => out.push('\0'),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                push_code_point(&mut out, &hex, 'x');
            }
            Some('u') => {
                let hex: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    chars.by_ref().take_while(|ch| *ch != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                push_code_point(&mut out, &hex, 'u');
            }
            // Line continuations
            Some('\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            Some('\n') | Some('\u{2028}') | Some('\u{2029}') => {}
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn push_code_point(out: &mut String, hex: &str, escape: char) {
    match u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
        Some(ch) => out.push(ch),
        None => {
            out.push(escape);
            out.push_str(hex);
        }
    }
}
