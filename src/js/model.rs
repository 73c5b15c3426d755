//! Typed model of a Gruntfile builder body.
//!
//! Only the shapes the editor understands are structural. Everything else
//! survives as [`Statement::Raw`] or [`Expr::Source`] text.

/// A value expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A string literal, holding the decoded value.
    Str(String),
    Array(Vec<Expr>),
    Object(ObjectExpr),
    /// Opaque source text (identifiers, numbers, calls, functions...).
    Source(String),
}

impl Expr {
    pub fn as_object_mut(&mut self) -> Option<&mut ObjectExpr> {
        match self {
            Expr::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Expr::Str(value) => Some(value),
            _ => None,
        }
    }
}

/// Key of an object member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropKey {
    Ident(String),
    Str(String),
    /// Numeric or computed keys, kept as written.
    Verbatim(String),
}

impl PropKey {
    /// Key for a new member: bare when `name` is a valid identifier, quoted otherwise.
    pub fn for_name(name: &str) -> Self {
        if is_identifier(name) {
            PropKey::Ident(name.to_string())
        } else {
            PropKey::Str(name.to_string())
        }
    }

    /// Whether this key addresses the member `name`.
    pub fn is(&self, name: &str) -> bool {
        match self {
            PropKey::Ident(key) | PropKey::Str(key) => key == name,
            PropKey::Verbatim(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    Pair { key: PropKey, value: Expr },
    /// Shorthand properties, spreads and methods.
    Verbatim(String),
}

/// An object literal with ordered members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectExpr {
    pub members: Vec<Member>,
}

impl ObjectExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Expr> {
        self.members.iter().find_map(|member| match member {
            Member::Pair { key, value } if key.is(name) => Some(value),
            _ => None,
        })
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Expr> {
        self.members.iter_mut().find_map(|member| match member {
            Member::Pair { key, value } if key.is(name) => Some(value),
            _ => None,
        })
    }

    /// Replace the value under `name` in place, or append a new member.
    pub fn set(&mut self, name: &str, value: Expr) {
        match self.get_mut(name) {
            Some(slot) => *slot = value,
            None => self.members.push(Member::Pair {
                key: PropKey::for_name(name),
                value,
            }),
        }
    }

    /// Nested object under `name`, created empty when missing.
    ///
    /// A non-object value already stored under `name` is replaced by an
    /// empty object.
    pub fn object_entry(&mut self, name: &str) -> &mut ObjectExpr {
        let is_object = matches!(self.get(name), Some(Expr::Object(_)));
        if !is_object {
            self.set(name, Expr::Object(ObjectExpr::new()));
        }
        match self.get_mut(name) {
            Some(Expr::Object(object)) => object,
            _ => unreachable!("object member `{name}` was just ensured"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Var,
    Let,
    Const,
}

impl DeclKind {
    pub fn keyword(self) -> &'static str {
        match self {
            DeclKind::Var => "var",
            DeclKind::Let => "let",
            DeclKind::Const => "const",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "var" => Some(DeclKind::Var),
            "let" => Some(DeclKind::Let),
            "const" => Some(DeclKind::Const),
            _ => None,
        }
    }
}

/// One `name = value` entry of a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declarator {
    /// `name` or `name = value`
    Named { name: String, value: Option<Expr> },
    /// Destructuring patterns, kept as written.
    Pattern(String),
}

/// A `var` / `let` / `const` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub kind: DeclKind,
    pub declarators: Vec<Declarator>,
}

impl Declaration {
    /// `kind name = value;`
    pub fn single(kind: DeclKind, name: impl Into<String>, value: Expr) -> Self {
        Self {
            kind,
            declarators: vec![Declarator::Named {
                name: name.into(),
                value: Some(value),
            }],
        }
    }

    /// Index of the declarator binding `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.declarators.iter().position(
            |declarator| matches!(declarator, Declarator::Named { name: bound, .. } if bound == name),
        )
    }
}

/// Argument of the `initConfig` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigRoot {
    /// `initConfig({...})`
    Object(ObjectExpr),
    /// `initConfig(config)`, naming a variable
    Reference(String),
    /// Any other argument list, kept as written
    Opaque(String),
}

/// Task list of a `registerTask` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskList {
    /// `[...]`; elements other than string literals stay opaque.
    Names(Vec<Expr>),
    /// A task function or any other argument, kept as written.
    Opaque(String),
}

impl TaskList {
    /// Task names given as string literals, in order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            TaskList::Names(items) => items.iter().filter_map(Expr::as_str).collect(),
            TaskList::Opaque(_) => Vec::new(),
        }
    }
}

/// A `registerTask` call: group name, optional description, task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskGroup {
    pub name: String,
    pub description: Option<Expr>,
    pub tasks: TaskList,
}

impl TaskGroup {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description: description.map(Expr::Str),
            tasks: TaskList::Names(Vec::new()),
        }
    }
}

/// One statement of the builder body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `grunt.initConfig(...)`
    ConfigRoot(ConfigRoot),
    /// `grunt.loadNpmTasks('plugin')`
    LoadTasks(String),
    /// `grunt.registerTask('name', ...)`
    TaskGroup(TaskGroup),
    /// `var a = 1, b;`
    Declaration(Declaration),
    /// Directive prologue entry such as `'use strict'`.
    Directive(String),
    /// Anything else, including comments.
    Raw(String),
}

pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_detection() {
        assert!(is_identifier("compass"));
        assert!(is_identifier("_private"));
        assert!(is_identifier("$scope"));
        assert!(!is_identifier("generator-angular"));
        assert!(!is_identifier("1st"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn set_replaces_in_place() {
        let mut object = ObjectExpr::new();
        object.set("a", Expr::Source("1".into()));
        object.set("b", Expr::Source("2".into()));
        object.set("a", Expr::Source("3".into()));

        assert_eq!(object.members.len(), 2);
        assert_eq!(object.get("a"), Some(&Expr::Source("3".into())));
        assert!(matches!(&object.members[0], Member::Pair { key, .. } if key.is("a")));
    }

    #[test]
    fn quoted_keys_are_addressable() {
        let mut object = ObjectExpr {
            members: vec![Member::Pair {
                key: PropKey::Str("files".into()),
                value: Expr::Array(vec![]),
            }],
        };
        object.set("files", Expr::Str("x".into()));
        assert_eq!(object.members.len(), 1);
        assert_eq!(object.get("files").and_then(Expr::as_str), Some("x"));
    }

    #[test]
    fn object_entry_creates_and_overwrites_scalars() {
        let mut object = ObjectExpr::new();
        object.set("scalar", Expr::Source("42".into()));

        object.object_entry("fresh").set("x", Expr::Source("1".into()));
        object.object_entry("scalar").set("y", Expr::Source("2".into()));

        assert!(matches!(object.get("fresh"), Some(Expr::Object(o)) if o.get("x").is_some()));
        assert!(matches!(object.get("scalar"), Some(Expr::Object(o)) if o.get("y").is_some()));
    }

    #[test]
    fn new_keys_are_quoted_when_needed() {
        assert_eq!(PropKey::for_name("dist"), PropKey::Ident("dist".into()));
        assert_eq!(
            PropKey::for_name("generator-angular"),
            PropKey::Str("generator-angular".into())
        );
    }

    #[test]
    fn task_names_skip_non_literal_entries() {
        let tasks = TaskList::Names(vec![
            Expr::Str("clean".into()),
            Expr::Source("extra".into()),
            Expr::Str("concat".into()),
        ]);
        assert_eq!(tasks.names(), vec!["clean", "concat"]);
        assert!(TaskList::Opaque("function () {}".into()).names().is_empty());
    }

    #[test]
    fn declarator_positions() {
        let declaration = Declaration {
            kind: DeclKind::Var,
            declarators: vec![
                Declarator::Pattern("{ a } = b".into()),
                Declarator::Named { name: "a".into(), value: None },
            ],
        };
        assert_eq!(declaration.position("a"), Some(1));
        assert_eq!(declaration.position("b"), None);
    }
}
