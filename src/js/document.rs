use crate::document::{CallShape, Document, NodeId};
use crate::js::errors::ParseError;
use crate::js::lower::{self, canonical_source, named_children, StatementLowering};
use crate::js::model::{ConfigRoot, Expr, ObjectExpr, Statement};
use crate::js::printer::{print_statement, INDENT};
use crate::js::query::{queries, QueryEngine, QueryMatch};
use crate::pool::with_parser;
use tree_sitter::Node;

/// The Gruntfile shipped as the starting point for new projects.
pub const DEFAULT_GRUNTFILE: &str = include_str!("default_gruntfile.js");

const DEFAULT_RECEIVER: &str = "grunt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuilderStyle {
    Function,
    Arrow,
}

/// A Gruntfile: the `module.exports` builder plus whatever top-level code
/// surrounds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GruntfileDocument {
    leading: Vec<String>,
    style: BuilderStyle,
    receiver: String,
    body: Vec<Statement>,
    trailing: Vec<String>,
}

impl GruntfileDocument {
    /// A fresh copy of the default template.
    pub fn default_template() -> Self {
        Self {
            leading: Vec::new(),
            style: BuilderStyle::Function,
            receiver: DEFAULT_RECEIVER.to_string(),
            body: vec![
                Statement::Directive("use strict".to_string()),
                Statement::ConfigRoot(ConfigRoot::Object(ObjectExpr::new())),
            ],
            trailing: Vec::new(),
        }
    }

    /// Parse an existing Gruntfile.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        with_parser(|parser| -> Result<Self, ParseError> {
            let parsed = parser.parse_with_source(source)?;
            parsed.ensure_valid()?;

            let engine = QueryEngine::new(queries::MODULE_EXPORTS_BUILDER)?;
            let builders: Vec<QueryMatch> = engine
                .find_all(&parsed)
                .into_iter()
                .filter(|m| {
                    m.capture("builder")
                        .is_some_and(|builder| builder_style(&builder.kind).is_some())
                })
                .collect();

            let found = match builders.as_slice() {
                [] => return Err(ParseError::MissingBuilder),
                [found] => found,
                many => return Err(ParseError::AmbiguousBuilder { count: many.len() }),
            };
            let (Some(statement), Some(builder)) =
                (found.capture("statement"), found.capture("builder"))
            else {
                return Err(ParseError::MissingBuilder);
            };

            let root = parsed.root_node();
            let builder_node = root
                .descendant_for_byte_range(builder.byte_start, builder.byte_end)
                .ok_or(ParseError::MissingBuilder)?;
            let style = builder_style(builder_node.kind()).ok_or(ParseError::MissingBuilder)?;
            let block = builder_node
                .child_by_field_name("body")
                .filter(|body| body.kind() == "statement_block")
                .ok_or(ParseError::MissingBuilder)?;

            let receiver = builder_receiver(builder_node, source);
            let mut lowering = StatementLowering::new(source, &receiver);
            let body = named_children(block)
                .into_iter()
                .map(|node| lowering.lower(node))
                .collect();

            let mut leading = Vec::new();
            let mut trailing = Vec::new();
            for node in named_children(root) {
                if node.kind() == "hash_bang_line" {
                    leading.push(source[node.byte_range()].to_string());
                } else if node.end_byte() <= statement.byte_start {
                    leading.push(canonical_source(node, source));
                } else if node.start_byte() >= statement.byte_end {
                    trailing.push(canonical_source(node, source));
                }
            }

            tracing::trace!(
                receiver = %receiver,
                statements = block.named_child_count(),
                "parsed gruntfile builder"
            );

            Ok(Self {
                leading,
                style,
                receiver,
                body,
                trailing,
            })
        })?
    }

    /// Name of the builder's parameter, `grunt` by convention.
    pub fn receiver(&self) -> &str {
        &self.receiver
    }

    /// Statements of the builder body, in document order.
    pub fn body(&self) -> &[Statement] {
        &self.body
    }

    fn head_index(&self) -> usize {
        self.body
            .iter()
            .take_while(|statement| matches!(statement, Statement::Directive(_)))
            .count()
    }

    fn position(&self, predicate: impl Fn(&Statement) -> bool) -> Option<NodeId> {
        self.body.iter().position(predicate).map(NodeId::new)
    }
}

impl Default for GruntfileDocument {
    fn default() -> Self {
        Self::default_template()
    }
}

impl Document for GruntfileDocument {
    fn find_call(&self, shape: CallShape<'_>) -> Option<NodeId> {
        self.position(|statement| match (shape, statement) {
            (CallShape::InitConfig, Statement::ConfigRoot(_)) => true,
            (CallShape::LoadNpmTasks(name), Statement::LoadTasks(plugin)) => plugin == name,
            (CallShape::RegisterTask(name), Statement::TaskGroup(group)) => group.name == name,
            _ => false,
        })
    }

    fn find_variable(&self, name: &str) -> Option<NodeId> {
        self.body
            .iter()
            .enumerate()
            .find_map(|(index, statement)| match statement {
                Statement::Declaration(declaration) => declaration
                    .position(name)
                    .map(|slot| NodeId::declarator(index, slot)),
                _ => None,
            })
    }

    fn insert_at_head(&mut self, statement: Statement) -> NodeId {
        let index = self.head_index();
        self.body.insert(index, statement);
        NodeId::new(index)
    }

    fn insert_at_tail(&mut self, statement: Statement) -> NodeId {
        self.body.push(statement);
        NodeId::new(self.body.len() - 1)
    }

    fn statement(&self, id: NodeId) -> Option<&Statement> {
        self.body.get(id.index())
    }

    fn statement_mut(&mut self, id: NodeId) -> Option<&mut Statement> {
        self.body.get_mut(id.index())
    }

    fn parse_expression(&self, text: &str) -> Expr {
        lower::parse_expression(text)
    }

    fn parse_statements(&self, code: &str) -> Vec<Statement> {
        lower::parse_statements(code)
    }

    fn serialize(&self) -> String {
        let mut out = String::new();
        for item in &self.leading {
            out.push_str(item);
            out.push('\n');
        }

        match self.style {
            BuilderStyle::Function => {
                out.push_str(&format!("module.exports = function ({}) {{\n", self.receiver))
            }
            BuilderStyle::Arrow => {
                out.push_str(&format!("module.exports = ({}) => {{\n", self.receiver))
            }
        }
        for statement in &self.body {
            out.push_str(INDENT);
            out.push_str(&print_statement(statement, &self.receiver, 1));
            out.push('\n');
        }
        out.push_str("};\n");

        for item in &self.trailing {
            out.push_str(item);
            out.push('\n');
        }
        out
    }
}

fn builder_style(kind: &str) -> Option<BuilderStyle> {
    match kind {
        "function_expression" | "function" => Some(BuilderStyle::Function),
        "arrow_function" => Some(BuilderStyle::Arrow),
        _ => None,
    }
}

fn builder_receiver(builder: Node<'_>, source: &str) -> String {
    let parameter = builder.child_by_field_name("parameter").or_else(|| {
        builder
            .child_by_field_name("parameters")
            .and_then(|params| named_children(params).into_iter().next())
    });
    match parameter {
        Some(node) if node.kind() == "identifier" => source[node.byte_range()].to_string(),
        _ => DEFAULT_RECEIVER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::js::model::{DeclKind, Declaration, Declarator, TaskGroup, TaskList};

    #[test]
    fn default_template_prints_the_bundled_file() {
        assert_eq!(GruntfileDocument::default_template().serialize(), DEFAULT_GRUNTFILE);
    }

    #[test]
    fn bundled_file_parses_to_default_template() {
        let parsed = GruntfileDocument::parse(DEFAULT_GRUNTFILE).unwrap();
        assert_eq!(parsed, GruntfileDocument::default_template());
    }

    #[test]
    fn parse_classifies_statements() {
        let source = r#"'use strict';
// Generated on 2014-01-01
module.exports = function (grunt) {
    require('time-grunt')(grunt);
    var appConfig = { app: "app" };
    grunt.loadNpmTasks('grunt-contrib-concat');
    grunt.initConfig({
        yeoman: appConfig,
        watch: { js: { files: ["app/**/*.js"] } }
    });
    grunt.registerTask('build', 'Build it', ['concat', 'uglify']);
    grunt.registerTask('serve', function () {});
};
"#;
        let doc = GruntfileDocument::parse(source).unwrap();
        assert_eq!(doc.receiver(), "grunt");
        assert_eq!(doc.leading, vec!["'use strict';", "// Generated on 2014-01-01"]);

        let body = doc.body();
        assert_eq!(body.len(), 6);
        assert_eq!(body[0], Statement::Raw("require('time-grunt')(grunt);".into()));
        assert!(matches!(
            &body[1],
            Statement::Declaration(Declaration { kind: DeclKind::Var, declarators })
                if matches!(
                    declarators.as_slice(),
                    [Declarator::Named { name, value: Some(Expr::Object(_)) }] if name == "appConfig"
                )
        ));
        assert_eq!(body[2], Statement::LoadTasks("grunt-contrib-concat".into()));
        let Statement::ConfigRoot(ConfigRoot::Object(config)) = &body[3] else {
            panic!("expected config root, got {:?}", body[3]);
        };
        assert_eq!(config.get("yeoman"), Some(&Expr::Source("appConfig".into())));
        assert_eq!(
            body[4],
            Statement::TaskGroup(TaskGroup {
                name: "build".into(),
                description: Some(Expr::Str("Build it".into())),
                tasks: TaskList::Names(vec![Expr::Str("concat".into()), Expr::Str("uglify".into())]),
            })
        );
        assert_eq!(
            body[5],
            Statement::TaskGroup(TaskGroup {
                name: "serve".into(),
                description: None,
                tasks: TaskList::Opaque("function () {}".into()),
            })
        );
    }

    #[test]
    fn lookups_by_shape() {
        let source = "module.exports = function (g) {\n    g.registerTask('a', ['x']);\n    g.registerTask('a', ['y']);\n    var p = 1;\n};\n";
        let doc = GruntfileDocument::parse(source).unwrap();

        assert_eq!(doc.receiver(), "g");
        assert_eq!(doc.find_call(CallShape::RegisterTask("a")), Some(NodeId::new(0)));
        assert!(matches!(doc.body()[1], Statement::Raw(_)));
        assert_eq!(doc.find_variable("p"), Some(NodeId::new(2)));
        assert_eq!(doc.find_call(CallShape::InitConfig), None);
    }

    #[test]
    fn every_declarator_is_addressable() {
        let source = "module.exports = function (grunt) {\n    var a = 1, b = 2;\n    let { c } = opts, d;\n};\n";
        let doc = GruntfileDocument::parse(source).unwrap();

        assert_eq!(doc.find_variable("a"), Some(NodeId::declarator(0, 0)));
        assert_eq!(doc.find_variable("b"), Some(NodeId::declarator(0, 1)));
        assert_eq!(doc.find_variable("d"), Some(NodeId::declarator(1, 1)));
        assert_eq!(doc.find_variable("c"), None);
        assert_eq!(doc.variable_value(NodeId::declarator(0, 1)), Some(&Expr::Source("2".into())));
        assert_eq!(doc.variable_value(NodeId::declarator(1, 1)), None);
        assert_eq!(doc.serialize(), source);
    }

    #[test]
    fn any_init_config_call_is_the_config_root() {
        let source = "module.exports = function (grunt) {\n    var config = {};\n    grunt.initConfig(config);\n    grunt.initConfig({});\n};\n";
        let doc = GruntfileDocument::parse(source).unwrap();

        assert_eq!(doc.find_call(CallShape::InitConfig), Some(NodeId::new(1)));
        assert_eq!(doc.body()[1], Statement::ConfigRoot(ConfigRoot::Reference("config".into())));
        assert!(matches!(doc.body()[2], Statement::Raw(_)));

        let opaque = GruntfileDocument::parse(
            "module.exports = function (grunt) {\n    grunt.initConfig(require('./cfg'));\n};\n",
        )
        .unwrap();
        assert_eq!(
            opaque.body()[0],
            Statement::ConfigRoot(ConfigRoot::Opaque("require('./cfg')".into()))
        );
    }

    #[test]
    fn task_groups_keep_non_literal_members() {
        let source = "module.exports = function (grunt) {\n    grunt.registerTask('build', ['clean', extra]);\n};\n";
        let doc = GruntfileDocument::parse(source).unwrap();

        let id = doc.find_call(CallShape::RegisterTask("build")).unwrap();
        assert_eq!(doc.array_elements(id), vec!["clean"]);
        assert!(matches!(
            &doc.body()[0],
            Statement::TaskGroup(TaskGroup { tasks: TaskList::Names(items), .. }) if items.len() == 2
        ));
    }

    #[test]
    fn calls_on_other_receivers_stay_raw() {
        let source = "module.exports = function (grunt) {\n    other.loadNpmTasks('x');\n};\n";
        let doc = GruntfileDocument::parse(source).unwrap();
        assert_eq!(doc.find_call(CallShape::LoadNpmTasks("x")), None);
    }

    #[test]
    fn head_insertion_skips_directives() {
        let mut doc = GruntfileDocument::default_template();
        let id = doc.insert_at_head(Statement::LoadTasks("a".into()));
        assert_eq!(id, NodeId::new(1));
        assert!(matches!(doc.body()[0], Statement::Directive(_)));
    }

    #[test]
    fn canonical_files_round_trip() {
        let source = "var path = require('path');\nmodule.exports = function (grunt) {\n    'use strict';\n    var paths = 'foo';\n    grunt.loadNpmTasks('grunt-contrib-concat');\n    grunt.initConfig({\n        compass: { foo: 'bar' },\n        concat: {\n            dist: ['a.js'],\n            src: 'b'\n        }\n    });\n    grunt.registerTask('deploy', [\n        'foo',\n        'bar'\n    ]);\n};\n";
        let doc = GruntfileDocument::parse(source).unwrap();
        assert_eq!(doc.serialize(), source);
    }

    #[test]
    fn arrow_builders_keep_their_style() {
        let source = "module.exports = (grunt) => {\n    grunt.initConfig({});\n};\n";
        let doc = GruntfileDocument::parse(source).unwrap();
        assert_eq!(doc.serialize(), source);
    }

    #[test]
    fn rejects_missing_builder() {
        let result = GruntfileDocument::parse("var x = 1;\n");
        assert_eq!(result, Err(ParseError::MissingBuilder));
    }

    #[test]
    fn rejects_ambiguous_builder() {
        let source = "module.exports = function (grunt) {};\nmodule.exports = function (grunt) {};\n";
        assert_eq!(
            GruntfileDocument::parse(source),
            Err(ParseError::AmbiguousBuilder { count: 2 })
        );
    }

    #[test]
    fn rejects_syntax_errors() {
        let result = GruntfileDocument::parse("module.exports = function (grunt) {\n    grunt.initConfig({);\n};\n");
        assert!(matches!(result, Err(ParseError::SyntaxError { .. })));
    }
}
