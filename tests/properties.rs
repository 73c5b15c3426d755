//! Property tests for the upsert operations

use gruntfile_editor::js::Statement;
use gruntfile_editor::{GruntfileEditor, TaskOptions};
use proptest::prelude::*;

fn token() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9:-]{0,8}"
}

fn group_tasks(editor: &GruntfileEditor, name: &str) -> Vec<String> {
    editor
        .document()
        .body()
        .iter()
        .find_map(|statement| match statement {
            Statement::TaskGroup(group) if group.name == name => Some(
                group.tasks.names().into_iter().map(str::to_string).collect(),
            ),
            _ => None,
        })
        .unwrap_or_default()
}

proptest! {
    #[test]
    fn plugin_loads_are_idempotent(names in prop::collection::vec(token(), 1..8)) {
        let mut editor = GruntfileEditor::new();
        editor.load_npm_tasks(names.clone()).unwrap();
        let once = editor.serialize();
        editor.load_npm_tasks(names.clone()).unwrap();

        prop_assert_eq!(editor.serialize(), once.clone());
        for name in &names {
            let call = format!("grunt.loadNpmTasks('{name}');");
            prop_assert_eq!(once.matches(&call).count(), 1);
        }
    }

    #[test]
    fn task_groups_keep_first_seen_order(
        first in prop::collection::vec(token(), 1..6),
        second in prop::collection::vec(token(), 1..6),
    ) {
        let mut editor = GruntfileEditor::new();
        editor
            .register_task("g", first.clone(), TaskOptions::default())
            .unwrap()
            .register_task("g", second.clone(), TaskOptions::default())
            .unwrap();

        let mut expected: Vec<String> = Vec::new();
        for task in first.iter().chain(second.iter()) {
            if !expected.contains(task) {
                expected.push(task.clone());
            }
        }
        prop_assert_eq!(group_tasks(&editor, "g"), expected);
    }

    #[test]
    fn duplicates_keep_every_token(tasks in prop::collection::vec(token(), 1..6)) {
        let mut editor = GruntfileEditor::new();
        editor
            .register_task("g", tasks.clone(), TaskOptions::allow_duplicates())
            .unwrap()
            .register_task("g", tasks.clone(), TaskOptions::allow_duplicates())
            .unwrap();

        let expected: Vec<String> = tasks.iter().chain(tasks.iter()).cloned().collect();
        prop_assert_eq!(group_tasks(&editor, "g"), expected);
    }

    #[test]
    fn serialized_output_reparses_to_itself(
        plugins in prop::collection::vec(token(), 0..4),
        tasks in prop::collection::vec(token(), 1..4),
        key in "k[a-z]{0,5}",
    ) {
        let mut editor = GruntfileEditor::new();
        if !plugins.is_empty() {
            editor.load_npm_tasks(plugins).unwrap();
        }
        editor
            .register_task("build", tasks, TaskOptions::default())
            .unwrap()
            .insert_config(&format!("{key}.dist"), "{ src: ['a.js'] }")
            .unwrap();

        let text = editor.serialize();
        let reparsed = GruntfileEditor::from_source(&text).unwrap();
        prop_assert_eq!(reparsed.serialize(), text);
    }
}
