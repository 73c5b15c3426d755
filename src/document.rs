//! The document capability the editor works against.
//!
//! The editor never touches source text. It asks a [`Document`] for
//! statements by shape, mutates them through the typed model, and asks
//! for text back on demand. [`crate::js::GruntfileDocument`] is the
//! tree-sitter backed implementation.

use crate::js::model::{ConfigRoot, Declarator, Expr, ObjectExpr, Statement, TaskList};

/// Handle to a statement of the builder body, or to one declarator of a
/// declaration statement.
///
/// Handles are positional and only valid until the next insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    statement: usize,
    slot: usize,
}

impl NodeId {
    pub fn new(index: usize) -> Self {
        Self::declarator(index, 0)
    }

    pub fn declarator(index: usize, slot: usize) -> Self {
        Self {
            statement: index,
            slot,
        }
    }

    pub fn index(self) -> usize {
        self.statement
    }

    /// Declarator position within the statement; 0 for other statements.
    pub fn slot(self) -> usize {
        self.slot
    }
}

/// Call statements the editor looks up by shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallShape<'a> {
    /// `grunt.initConfig(...)`, whatever its argument
    InitConfig,
    /// `grunt.loadNpmTasks('<plugin>')`
    LoadNpmTasks(&'a str),
    /// `grunt.registerTask('<group>', ...)`
    RegisterTask(&'a str),
}

pub trait Document {
    /// First statement of the builder body matching `shape`.
    fn find_call(&self, shape: CallShape<'_>) -> Option<NodeId>;

    /// The declaration of variable `name` in the builder body.
    fn find_variable(&self, name: &str) -> Option<NodeId>;

    /// Insert at the head of the builder body, after any directive prologue.
    fn insert_at_head(&mut self, statement: Statement) -> NodeId;

    /// Insert at the tail of the builder body.
    fn insert_at_tail(&mut self, statement: Statement) -> NodeId;

    fn statement(&self, id: NodeId) -> Option<&Statement>;

    fn statement_mut(&mut self, id: NodeId) -> Option<&mut Statement>;

    /// Turn caller-supplied value text into an expression node.
    fn parse_expression(&self, text: &str) -> Expr;

    /// Turn a caller-supplied code fragment into statements.
    fn parse_statements(&self, code: &str) -> Vec<Statement>;

    /// Current document as source text.
    fn serialize(&self) -> String;

    /// Replace the value of the variable declared at `id`, adding an
    /// initializer when it has none.
    ///
    /// Returns false when `id` is not a named declarator.
    fn replace_value(&mut self, id: NodeId, value: Expr) -> bool {
        let Some(Statement::Declaration(declaration)) = self.statement_mut(id) else {
            return false;
        };
        match declaration.declarators.get_mut(id.slot()) {
            Some(Declarator::Named { value: slot, .. }) => {
                *slot = Some(value);
                true
            }
            _ => false,
        }
    }

    /// Initializer of the variable declared at `id`.
    fn variable_value(&self, id: NodeId) -> Option<&Expr> {
        let Some(Statement::Declaration(declaration)) = self.statement(id) else {
            return None;
        };
        match declaration.declarators.get(id.slot())? {
            Declarator::Named { value, .. } => value.as_ref(),
            Declarator::Pattern(_) => None,
        }
    }

    /// Object literal held at `id`: a config root called with an object,
    /// or a variable initialized with one.
    fn object_mut(&mut self, id: NodeId) -> Option<&mut ObjectExpr> {
        match self.statement_mut(id)? {
            Statement::ConfigRoot(ConfigRoot::Object(object)) => Some(object),
            Statement::Declaration(declaration) => {
                match declaration.declarators.get_mut(id.slot())? {
                    Declarator::Named {
                        value: Some(Expr::Object(object)),
                        ..
                    } => Some(object),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Append a task to the task group at `id`.
    ///
    /// Returns false when `id` is not a task group with a task list.
    fn push_array_element(&mut self, id: NodeId, value: String) -> bool {
        match self.statement_mut(id) {
            Some(Statement::TaskGroup(group)) => match &mut group.tasks {
                TaskList::Names(items) => {
                    items.push(Expr::Str(value));
                    true
                }
                TaskList::Opaque(_) => false,
            },
            _ => false,
        }
    }

    /// Task names of the task group at `id`, in order.
    fn array_elements(&self, id: NodeId) -> Vec<String> {
        match self.statement(id) {
            Some(Statement::TaskGroup(group)) => {
                group.tasks.names().into_iter().map(str::to_string).collect()
            }
            _ => Vec::new(),
        }
    }
}
