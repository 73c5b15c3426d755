//! Canonical printer for the typed model.
//!
//! Layout follows escodegen defaults: four-space indentation, single
//! quotes, single-member objects inline as `{ key: value }`, single-element
//! arrays inline as `['a']`, everything longer one entry per line.

use crate::js::model::{ConfigRoot, Declarator, Expr, Member, ObjectExpr, PropKey, Statement, TaskList};
use std::fmt::Write;

pub const INDENT: &str = "    ";

/// Quote `value` as a single-quoted JavaScript string literal.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        match ch {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\u{b}' => out.push_str("\\v"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            ch if ch.is_control() => {
                let _ = write!(out, "\\x{:02X}", ch as u32);
            }
            ch => out.push(ch),
        }
    }
    out.push('\'');
    out
}

/// Print an expression whose first line sits at indentation `depth`.
pub fn print_expr(expr: &Expr, depth: usize) -> String {
    match expr {
        Expr::Str(value) => quote(value),
        Expr::Source(text) => text.clone(),
        Expr::Object(object) => print_object(object, depth),
        Expr::Array(items) => {
            let items: Vec<String> = items.iter().map(|item| print_expr(item, depth + 1)).collect();
            match items.as_slice() {
                [] => "[]".to_string(),
                [single] => format!("[{single}]"),
                _ => print_block('[', ']', &items, depth),
            }
        }
    }
}

pub fn print_object(object: &ObjectExpr, depth: usize) -> String {
    let members: Vec<String> = object
        .members
        .iter()
        .map(|member| print_member(member, depth + 1))
        .collect();
    match members.as_slice() {
        [] => "{}".to_string(),
        [single] if !single.contains('\n') => format!("{{ {single} }}"),
        _ => print_block('{', '}', &members, depth),
    }
}

fn print_member(member: &Member, depth: usize) -> String {
    match member {
        Member::Pair { key, value } => format!("{}: {}", print_key(key), print_expr(value, depth)),
        Member::Verbatim(text) => text.clone(),
    }
}

fn print_key(key: &PropKey) -> String {
    match key {
        PropKey::Ident(name) => name.clone(),
        PropKey::Str(name) => quote(name),
        PropKey::Verbatim(text) => text.clone(),
    }
}

fn print_block(open: char, close: char, entries: &[String], depth: usize) -> String {
    let inner = INDENT.repeat(depth + 1);
    let mut out = String::new();
    out.push(open);
    out.push('\n');
    for (idx, entry) in entries.iter().enumerate() {
        if idx > 0 {
            out.push_str(",\n");
        }
        out.push_str(&inner);
        out.push_str(entry);
    }
    out.push('\n');
    out.push_str(&INDENT.repeat(depth));
    out.push(close);
    out
}

/// Print one builder body statement at indentation `depth`, without the
/// leading indentation.
pub fn print_statement(statement: &Statement, receiver: &str, depth: usize) -> String {
    match statement {
        Statement::ConfigRoot(config) => {
            let argument = match config {
                ConfigRoot::Object(object) => print_object(object, depth),
                ConfigRoot::Reference(name) => name.clone(),
                ConfigRoot::Opaque(text) => text.clone(),
            };
            format!("{receiver}.initConfig({argument});")
        }
        Statement::LoadTasks(plugin) => format!("{receiver}.loadNpmTasks({});", quote(plugin)),
        Statement::TaskGroup(group) => {
            let mut args = vec![quote(&group.name)];
            if let Some(description) = &group.description {
                args.push(print_expr(description, depth));
            }
            match &group.tasks {
                TaskList::Names(items) => args.push(print_expr(&Expr::Array(items.clone()), depth)),
                TaskList::Opaque(text) if text.is_empty() => {}
                TaskList::Opaque(text) => args.push(text.clone()),
            }
            format!("{receiver}.registerTask({});", args.join(", "))
        }
        Statement::Declaration(declaration) => {
            let declarators: Vec<String> = declaration
                .declarators
                .iter()
                .map(|declarator| match declarator {
                    Declarator::Named { name, value: Some(value) } => {
                        format!("{name} = {}", print_expr(value, depth))
                    }
                    Declarator::Named { name, value: None } => name.clone(),
                    Declarator::Pattern(text) => text.clone(),
                })
                .collect();
            format!("{} {};", declaration.kind.keyword(), declarators.join(", "))
        }
        Statement::Directive(value) => format!("{};", quote(value)),
        Statement::Raw(text) => text.clone(),
    }
}
