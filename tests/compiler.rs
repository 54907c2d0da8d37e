//! Ordering and plan synthesis tests.
mod common;
use common::*;
use nagare::compiler::topological_order;
use nagare::prelude::*;
use std::sync::Arc;

#[cfg(test)]
mod compiler_tests {
    use super::*;

    /// A diamond plus an isolated node, inserted in reverse dependency order.
    fn diamond() -> Workflow {
        let mut workflow = Workflow::new("diamond");
        workflow.add_node(Node::sink("out", "collect")).unwrap();
        workflow.add_node(Node::transform("join", "merge")).unwrap();
        workflow.add_node(Node::transform("left", "uppercase")).unwrap();
        workflow.add_node(Node::transform("right", "lowercase")).unwrap();
        workflow.add_node(Node::source("src", "constant")).unwrap();
        workflow.add_node(Node::transform("lonely", "merge")).unwrap();
        workflow.add_connection("join", "out").unwrap();
        workflow.add_connection("left", "join").unwrap();
        workflow.add_connection("right", "join").unwrap();
        workflow.add_connection("src", "left").unwrap();
        workflow.add_connection("src", "right").unwrap();
        workflow
    }

    #[test]
    fn test_order_respects_every_connection() {
        let workflow = diamond();
        let order = topological_order(&workflow).unwrap();
        assert_eq!(order.len(), workflow.len());
        assert_respects_connections(&workflow, &order);
        assert!(order.contains(&"lonely".to_string()));
    }

    #[test]
    fn test_order_is_post_order_over_predecessors() {
        let order = topological_order(&diamond()).unwrap();
        assert_eq!(order, vec!["src", "left", "right", "join", "out", "lonely"]);
    }

    #[test]
    fn test_cycle_is_detected_with_its_path() {
        let mut workflow = Workflow::new("loop");
        workflow.add_node(Node::transform("A", "trim")).unwrap();
        workflow.add_node(Node::transform("B", "trim")).unwrap();
        workflow.add_node(Node::transform("C", "trim")).unwrap();
        workflow.add_connection("A", "B").unwrap();
        workflow.add_connection("B", "C").unwrap();
        workflow.add_connection("C", "A").unwrap();

        match topological_order(&workflow) {
            Err(CompileError::CycleDetected { node_id, cycle }) => {
                assert_eq!(cycle.first(), Some(&node_id));
                assert_eq!(cycle.last(), Some(&node_id));
                assert_eq!(cycle.len(), 4);
                for pair in cycle.windows(2) {
                    assert!(workflow.has_connection(&pair[0], &pair[1]));
                }
            }
            other => panic!("expected a cycle, got {:?}", other),
        }

        let err = Compiler::default().compile(&workflow).unwrap_err();
        assert!(matches!(err, CompileError::CycleDetected { .. }));
        assert!(err.to_string().contains(" -> "));
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let mut workflow = Workflow::new("deep");
        workflow.add_node(Node::source("n0", "constant")).unwrap();
        for i in 1..5_000 {
            workflow
                .add_node(Node::transform(format!("n{}", i), "trim"))
                .unwrap();
            workflow
                .add_connection(&format!("n{}", i - 1), &format!("n{}", i))
                .unwrap();
        }
        let order = topological_order(&workflow).unwrap();
        assert_eq!(order.len(), 5_000);
        assert_eq!(order.first().map(String::as_str), Some("n0"));
        assert_eq!(order.last().map(String::as_str), Some("n4999"));
    }

    #[test]
    fn test_compiling_twice_yields_identical_plans() {
        let workflow = diamond();
        let compiler = Compiler::default();
        let first = compiler.compile(&workflow);
        let second = compiler.compile(&workflow);
        // `lonely` is a merge with no inbound connections.
        assert_eq!(first.clone().unwrap_err(), second.unwrap_err());
        assert!(matches!(first, Err(CompileError::Arity { .. })));

        let workflow = create_shout_workflow();
        assert_eq!(
            compiler.compile(&workflow).unwrap(),
            compiler.compile(&workflow).unwrap()
        );
    }

    #[test]
    fn test_fan_in_inbound_ids_follow_connection_order() {
        let plan = Compiler::default()
            .compile(&create_fan_in_workflow("concat"))
            .unwrap();
        let merge = plan.step("M").unwrap();
        assert_eq!(merge.inbound_node_ids, vec!["B", "A"]);
        assert!(plan.step("A").unwrap().inbound_node_ids.is_empty());
    }

    #[test]
    fn test_plan_is_independent_of_later_edits() {
        let mut workflow = create_shout_workflow();
        let plan = Compiler::default().compile(&workflow).unwrap();
        workflow.remove_node("U");
        workflow
            .update_config("I", Config::new().with("value", "changed"))
            .unwrap();

        assert_eq!(plan.len(), 3);
        assert_eq!(plan.step("I").unwrap().config.get_str("value"), Some("hi"));
        assert_eq!(plan.step("O").unwrap().inbound_node_ids, vec!["U"]);
    }

    #[test]
    fn test_arity_mismatch_is_reported() {
        let mut workflow = create_shout_workflow();
        workflow.add_node(Node::source("I2", "constant")).unwrap();
        workflow.add_connection("I2", "U").unwrap();

        let err = Compiler::default().compile(&workflow).unwrap_err();
        assert_eq!(
            err,
            CompileError::Arity {
                node_id: "U".into(),
                kind: "uppercase".into(),
                expected: "exactly 1".into(),
                found: 2,
            }
        );
    }

    #[test]
    fn test_unknown_kind_is_reported() {
        let mut workflow = Workflow::new("unknown");
        workflow.add_node(Node::transform("X", "teleport")).unwrap();
        assert_eq!(
            Compiler::default().compile(&workflow).unwrap_err(),
            CompileError::UnknownKind {
                node_id: "X".into(),
                kind: "teleport".into()
            }
        );
    }

    #[test]
    fn test_invalid_config_is_reported_before_running() {
        let workflow = create_single_transform(
            Value::text("x"),
            "filter",
            Config::new().with("condition", "regex").with("value", "(unclosed"),
        );
        let err = Compiler::default().compile(&workflow).unwrap_err();
        assert!(matches!(err, CompileError::InvalidConfig { ref node_id, .. } if node_id == "T"));

        let workflow = create_single_transform(
            Value::text("x"),
            "sort",
            Config::new().with("by", "vibes"),
        );
        assert!(matches!(
            Compiler::default().compile(&workflow),
            Err(CompileError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_aliases_and_custom_handlers() {
        let mut workflow = Workflow::new("custom");
        workflow
            .add_node(Node::source("in", "textInput").with_config(Config::new().with("value", "a")))
            .unwrap();
        workflow.add_node(Node::transform("r", "reverse")).unwrap();
        workflow.add_node(Node::sink("out", "collect")).unwrap();
        workflow.add_connection("in", "r").unwrap();
        workflow.add_connection("r", "out").unwrap();

        let reverse = FnHandler::new(Arity::Exactly(1), |inbound: Vec<Value>, _config: &Config| {
            Ok(Value::text(inbound[0].to_text().chars().rev().collect::<String>()))
        });
        let compiler = Compiler::builder()
            .with_kind_alias("textInput", "constant-input")
            .with_handler("reverse", Arc::new(reverse))
            .build();
        let plan = compiler.compile(&workflow).unwrap();

        let input = plan.step("in").unwrap();
        assert_eq!(input.kind, "textInput");
        assert_eq!(input.handler_kind, "constant-input");
        assert_eq!(plan.step("r").unwrap().handler_kind, "reverse");
    }

    #[test]
    fn test_invoke_model_requires_a_service() {
        let workflow = create_single_transform(Value::text("q"), "llm", Config::new());
        assert!(matches!(
            Compiler::default().compile(&workflow),
            Err(CompileError::UnknownKind { .. })
        ));

        let compiler = Compiler::builder()
            .with_completion_service(Arc::new(EchoService::default()))
            .build();
        assert!(compiler.compile(&workflow).is_ok());

        let hot = create_single_transform(
            Value::text("q"),
            "llm",
            Config::new().with("temperature", 3.5),
        );
        assert!(matches!(
            compiler.compile(&hot),
            Err(CompileError::InvalidConfig { .. })
        ));
    }
}
