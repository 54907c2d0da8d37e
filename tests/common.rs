//! Common test utilities for building workflows and running plans.
use ahash::AHashMap;
use nagare::prelude::*;

/// `I(source, constant "hi") -> U(uppercase) -> O(collect)`.
#[allow(dead_code)]
pub fn create_shout_workflow() -> Workflow {
    let mut workflow = Workflow::new("shout");
    workflow
        .add_node(Node::source("I", "constant").with_config(Config::new().with("value", "hi")))
        .unwrap();
    workflow
        .add_node(Node::transform("U", "uppercase"))
        .unwrap();
    workflow.add_node(Node::sink("O", "collect")).unwrap();
    workflow.add_connection("I", "U").unwrap();
    workflow.add_connection("U", "O").unwrap();
    workflow
}

/// Two constant sources feeding a `merge`, which feeds a sink.
/// The `B -> M` connection is made before `A -> M`.
#[allow(dead_code)]
pub fn create_fan_in_workflow(strategy: &str) -> Workflow {
    let mut workflow = Workflow::new("fan-in");
    workflow
        .add_node(Node::source("A", "constant").with_config(Config::new().with("value", "first")))
        .unwrap();
    workflow
        .add_node(Node::source("B", "constant").with_config(Config::new().with("value", "second")))
        .unwrap();
    workflow
        .add_node(Node::transform("M", "merge").with_config(Config::new().with("strategy", strategy)))
        .unwrap();
    workflow.add_node(Node::sink("O", "collect")).unwrap();
    workflow.add_connection("B", "M").unwrap();
    workflow.add_connection("A", "M").unwrap();
    workflow.add_connection("M", "O").unwrap();
    workflow
}

/// A source with the given value, one transform of `kind` and a sink.
#[allow(dead_code)]
pub fn create_single_transform(value: Value, kind: &str, config: Config) -> Workflow {
    let mut workflow = Workflow::new(kind);
    workflow
        .add_node(Node::source("in", "constant").with_config(Config::new().with("value", value)))
        .unwrap();
    workflow
        .add_node(Node::transform("T", kind).with_config(config))
        .unwrap();
    workflow.add_node(Node::sink("out", "collect")).unwrap();
    workflow.add_connection("in", "T").unwrap();
    workflow.add_connection("T", "out").unwrap();
    workflow
}

/// Compiles with the default compiler and runs with no initial inputs.
#[allow(dead_code)]
pub fn compile_and_run(workflow: &Workflow) -> RunResult {
    let plan = Compiler::default()
        .compile(workflow)
        .expect("workflow should compile");
    tokio_test::block_on(Runtime::new().run(&plan, &AHashMap::new()))
}

/// Runs `workflow` and returns the output of the single transform `T`.
#[allow(dead_code)]
pub fn transform_output(workflow: &Workflow) -> Value {
    let result = compile_and_run(workflow);
    assert!(result.is_success(), "run failed: {:?}", result.error);
    result.per_node_output["T"].clone()
}

/// Asserts that every connection's `from` comes before its `to` in `order`.
#[allow(dead_code)]
pub fn assert_respects_connections(workflow: &Workflow, order: &[String]) {
    let position = |id: &str| order.iter().position(|n| n == id).expect("node in order");
    for connection in workflow.connections() {
        assert!(
            position(&connection.from) < position(&connection.to),
            "{} should precede {}",
            connection.from,
            connection.to
        );
    }
}

#[allow(dead_code)]
pub fn text_list(items: &[&str]) -> Value {
    Value::List(items.iter().map(|s| Value::text(*s)).collect())
}
