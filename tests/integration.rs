//! Integration tests for Nagare
//!
//! End-to-end tests covering editor documents, persistence and history.
//!
mod common;
use ahash::AHashMap;
use common::*;
use nagare::prelude::*;
use nagare::storage::{load_run, load_value, save_run, save_value};
use nagare::workflow::EditorWorkflow;
use std::sync::Arc;

/// A saved editor document: input -> llm -> output, with camelCase data keys.
const EDITOR_JSON: &str = r#"{
  "name": "Summarizer",
  "description": "Asks the model for a summary",
  "version": "1.0",
  "nodes": [
    { "id": "input-1", "type": "input", "x": 100, "y": 100,
      "data": { "name": "article", "defaultValue": "nothing yet" } },
    { "id": "llm-1", "type": "llm", "x": 320, "y": 100,
      "data": { "prompt": "Summarize: {{input}}", "systemPrompt": "Be brief.", "maxTokens": 256 } },
    { "id": "output-1", "type": "output", "x": 540, "y": 100,
      "data": { "outputFormat": "text" } }
  ],
  "connections": [
    { "id": "conn-1", "from": "input-1", "to": "llm-1" },
    { "id": "conn-2", "from": "llm-1", "to": "output-1" }
  ]
}"#;

/// Editor node types and option values beyond the basics: an `array` merge, an
/// `excludes` filter and a `json` transform.
const EDITOR_PIPELINE_JSON: &str = r#"{
  "name": "Pipeline",
  "nodes": [
    { "id": "in-1", "type": "input", "data": { "defaultValue": "keep me" } },
    { "id": "in-2", "type": "input", "data": { "defaultValue": "Skip this" } },
    { "id": "merge-1", "type": "merge", "data": { "mergeType": "array" } },
    { "id": "filter-1", "type": "filter",
      "data": { "filterType": "excludes", "filterValue": "skip", "caseSensitive": false } },
    { "id": "transform-1", "type": "transform", "data": { "transformType": "json" } },
    { "id": "output-1", "type": "output", "data": { "outputFormat": "text" } }
  ],
  "connections": [
    { "id": "conn-1", "from": "in-1", "to": "merge-1" },
    { "id": "conn-2", "from": "in-2", "to": "merge-1" },
    { "id": "conn-3", "from": "merge-1", "to": "filter-1" },
    { "id": "conn-4", "from": "filter-1", "to": "transform-1" },
    { "id": "conn-5", "from": "transform-1", "to": "output-1" }
  ]
}"#;

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_editor_document_converts_and_runs() {
        let workflow = EditorWorkflow::from_json(EDITOR_JSON)
            .unwrap()
            .into_workflow()
            .expect("editor document converts");

        assert_eq!(workflow.name, "Summarizer");
        assert_eq!(workflow.node("input-1").unwrap().role(), Role::Source);
        assert_eq!(workflow.node("llm-1").unwrap().role(), Role::Transform);
        assert_eq!(workflow.node("output-1").unwrap().role(), Role::Sink);

        let llm = &workflow.node("llm-1").unwrap().config;
        assert_eq!(llm.get_str("system_prompt"), Some("Be brief."));
        assert_eq!(llm.get_usize("max_tokens"), Some(256));
        assert_eq!(
            workflow.node("input-1").unwrap().config.get_str("default"),
            Some("nothing yet")
        );

        let compiler = Compiler::builder()
            .with_completion_service(Arc::new(EchoService::default()))
            .build();
        let plan = compiler.compile(&workflow).unwrap();

        let inputs = RunInputs::new().with("article", "Rust is fast.");
        let result = tokio_test::block_on(Runtime::new().run(&plan, &inputs.to_map()));
        assert!(result.is_success());
        assert_eq!(
            result.collected_output["output-1"],
            Value::text("Summarize: Rust is fast.")
        );

        let fallback = tokio_test::block_on(Runtime::new().run(&plan, &AHashMap::new()));
        assert_eq!(
            fallback.collected_output["output-1"],
            Value::text("Summarize: nothing yet")
        );
    }

    #[test]
    fn test_editor_merge_filter_and_transform_options_run() {
        let workflow = EditorWorkflow::from_json(EDITOR_PIPELINE_JSON)
            .unwrap()
            .into_workflow()
            .expect("editor document converts");
        assert_eq!(workflow.node("transform-1").unwrap().role(), Role::Transform);
        assert_eq!(
            workflow.node("merge-1").unwrap().config.get_str("strategy"),
            Some("array")
        );

        let result = compile_and_run(&workflow);
        assert!(result.is_success(), "run failed: {:?}", result.error);
        assert_eq!(
            result.per_node_output["merge-1"],
            Value::List(vec![Value::text("keep me"), Value::text("Skip this")])
        );
        assert_eq!(
            result.per_node_output["filter-1"],
            Value::List(vec![Value::text("keep me")])
        );
        assert_eq!(
            result.collected_output["output-1"],
            Value::text("[\n  \"keep me\"\n]")
        );
    }

    #[test]
    fn test_editor_transform_text_passes_through() {
        let doc = r#"{
          "name": "Plain",
          "nodes": [
            { "id": "i", "type": "input", "data": { "value": "as is" } },
            { "id": "t", "type": "transform", "data": { "transformType": "text" } },
            { "id": "o", "type": "output", "data": {} }
          ],
          "connections": [
            { "id": "conn-1", "from": "i", "to": "t" },
            { "id": "conn-2", "from": "t", "to": "o" }
          ]
        }"#;
        let workflow = EditorWorkflow::from_json(doc).unwrap().into_workflow().unwrap();
        let result = compile_and_run(&workflow);
        assert_eq!(result.collected_output["o"], Value::text("as is"));
    }

    #[test]
    fn test_editor_export_round_trips() {
        let mut workflow = create_fan_in_workflow("list");
        workflow.description = "two sources".to_string();

        let exported = EditorWorkflow::from(&workflow).to_json_pretty().unwrap();
        let restored = EditorWorkflow::from_json(&exported)
            .unwrap()
            .into_workflow()
            .unwrap();

        assert_eq!(restored.nodes(), workflow.nodes());
        assert_eq!(restored.connections(), workflow.connections());
        assert_eq!(restored.description, "two sources");
    }

    #[test]
    fn test_restored_workflow_keeps_generating_fresh_connection_ids() {
        let mut restored = EditorWorkflow::from_json(EDITOR_JSON)
            .unwrap()
            .into_workflow()
            .unwrap();
        restored
            .add_node(Node::transform("trim-1", "trim"))
            .unwrap();
        let added = restored.add_connection("input-1", "trim-1").unwrap();
        assert!(added.id != "conn-1" && added.id != "conn-2");
    }

    #[test]
    fn test_workflow_and_run_round_trip_through_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("state")).unwrap();

        let workflow = create_fan_in_workflow("object");
        save_workflow(&store, "draft", &workflow).unwrap();
        let loaded = load_workflow(&store, "draft").unwrap().expect("stored");
        assert_eq!(loaded, workflow);

        let result = compile_and_run(&loaded);
        save_run(&store, "last-run", &result).unwrap();
        let loaded_run = load_run(&store, "last-run").unwrap().expect("stored");
        assert_eq!(loaded_run, result);

        assert!(load_workflow(&store, "missing").unwrap().is_none());
        assert!(store.remove("draft").unwrap());
        assert!(load_workflow(&store, "draft").unwrap().is_none());
    }

    #[test]
    fn test_failed_run_round_trips_through_memory_store() {
        let failing = FnHandler::new(Arity::Exactly(1), |_: Vec<Value>, _: &Config| {
            Err(HandlerError::TypeMismatch {
                operation: "shout".into(),
                expected: "text".into(),
                found: Value::Number(1.0),
            })
        });
        let compiler = Compiler::builder()
            .with_handler("uppercase", Arc::new(failing))
            .build();
        let plan = compiler.compile(&create_shout_workflow()).unwrap();
        let result = tokio_test::block_on(Runtime::new().run(&plan, &AHashMap::new()));

        let store = MemoryStore::new();
        save_value(&store, "run", &result).unwrap();
        let loaded: RunResult = load_value(&store, "run").unwrap().unwrap();
        assert_eq!(loaded, result);
        assert_eq!(loaded.status, RunStatus::Failed);
    }

    #[test]
    fn test_history_undo_redo_restores_snapshots() {
        let mut history = WorkflowHistory::default();
        let mut workflow = Workflow::new("edit");
        history.push(&workflow, "empty");

        workflow.add_node(Node::source("A", "constant")).unwrap();
        history.push(&workflow, "add A");
        workflow.add_node(Node::sink("B", "collect")).unwrap();
        workflow.add_connection("A", "B").unwrap();
        history.push(&workflow, "connect A to B");

        assert!(history.can_undo());
        assert!(!history.can_redo());

        let previous = history.undo().cloned().unwrap();
        assert_eq!(previous.len(), 1);
        assert!(previous.connections().is_empty());
        assert_eq!(history.current().unwrap().description, "add A");

        let first = history.undo().cloned().unwrap();
        assert!(first.is_empty());
        assert!(history.undo().is_none());

        let redone = history.redo().cloned().unwrap();
        assert_eq!(redone.len(), 1);
        assert!(history.can_redo());

        // A new edit after undo drops the redo tail.
        let mut branch = redone;
        branch.add_node(Node::transform("C", "trim")).unwrap();
        history.push(&branch, "add C");
        assert!(!history.can_redo());
        assert_eq!(
            history.entries().map(|e| e.description.as_str()).collect::<Vec<_>>(),
            vec!["empty", "add A", "add C"]
        );
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = WorkflowHistory::new(3);
        let workflow = Workflow::new("bounded");
        let ids: Vec<u64> = (0..5)
            .map(|i| history.push(&workflow, format!("edit {}", i)))
            .collect();

        assert_eq!(history.len(), 3);
        assert_eq!(history.entries().next().unwrap().description, "edit 2");
        assert!(history.go_to(ids[0]).is_none());
        assert!(history.go_to(ids[3]).is_some());
        assert_eq!(history.current().unwrap().description, "edit 3");
    }
}
