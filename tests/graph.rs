//! Graph model and connection validator tests.
mod common;
use common::*;
use nagare::prelude::*;
use nagare::workflow::is_legal;

#[cfg(test)]
mod graph_tests {
    use super::*;

    fn three_roles() -> Workflow {
        let mut workflow = Workflow::new("roles");
        workflow.add_node(Node::source("A", "constant")).unwrap();
        workflow.add_node(Node::transform("B", "trim")).unwrap();
        workflow.add_node(Node::sink("C", "collect")).unwrap();
        workflow
    }

    #[test]
    fn test_duplicate_node_id_is_rejected() {
        let mut workflow = three_roles();
        let err = workflow.add_node(Node::transform("B", "uppercase")).unwrap_err();
        assert_eq!(err, GraphError::DuplicateNode("B".to_string()));
        assert_eq!(workflow.len(), 3);
        assert_eq!(workflow.node("B").unwrap().kind, "trim");
    }

    #[test]
    fn test_illegal_connections_leave_graph_unchanged() {
        let mut workflow = three_roles();
        workflow.add_connection("A", "B").unwrap();
        let before = workflow.clone();

        let cases = [
            ("B", "B", ConnectionError::SelfLoop("B".into())),
            ("B", "A", ConnectionError::TargetIsSource("A".into())),
            ("C", "B", ConnectionError::OriginIsSink("C".into())),
            ("X", "B", ConnectionError::NodeNotFound("X".into())),
            ("B", "Y", ConnectionError::NodeNotFound("Y".into())),
            (
                "A",
                "B",
                ConnectionError::Duplicate {
                    from: "A".into(),
                    to: "B".into(),
                },
            ),
        ];
        for (from, to, expected) in cases {
            assert_eq!(workflow.add_connection(from, to).unwrap_err(), expected);
            assert!(!is_legal(&workflow, from, to));
        }
        assert_eq!(workflow, before);
    }

    #[test]
    fn test_sink_cannot_originate_even_to_a_source() {
        let mut workflow = three_roles();
        // Target role is checked before origin role.
        assert_eq!(
            workflow.add_connection("C", "A").unwrap_err(),
            ConnectionError::TargetIsSource("A".into())
        );
        assert!(workflow.connections().is_empty());
    }

    #[test]
    fn test_source_to_sink_allowed_unless_strict() {
        let mut relaxed = three_roles();
        assert!(relaxed.add_connection("A", "C").is_ok());

        let mut strict = three_roles().with_rules(ConnectionRules::strict());
        assert_eq!(
            strict.add_connection("A", "C").unwrap_err(),
            ConnectionError::SourceToSink {
                from: "A".into(),
                to: "C".into()
            }
        );
        assert!(strict.add_connection("A", "B").is_ok());
        assert!(strict.add_connection("B", "C").is_ok());
    }

    #[test]
    fn test_remove_node_cascades_and_is_idempotent() {
        let mut workflow = create_shout_workflow();
        assert_eq!(workflow.connections().len(), 2);

        let removed = workflow.remove_node("U");
        assert_eq!(removed.map(|n| n.id().to_string()), Some("U".to_string()));
        assert!(workflow.connections().is_empty());
        assert_eq!(workflow.len(), 2);

        let snapshot = workflow.clone();
        assert!(workflow.remove_node("U").is_none());
        assert_eq!(workflow, snapshot);
    }

    #[test]
    fn test_remove_connection_by_id() {
        let mut workflow = create_shout_workflow();
        let id = workflow.connections()[0].id.clone();
        assert!(workflow.remove_connection(&id).is_some());
        assert!(workflow.remove_connection(&id).is_none());
        assert!(!workflow.has_connection("I", "U"));
        assert!(workflow.has_connection("U", "O"));
    }

    #[test]
    fn test_connection_ids_are_never_reused() {
        let mut workflow = three_roles();
        let first = workflow.add_connection("A", "B").unwrap();
        workflow.remove_connection(&first.id);
        let second = workflow.add_connection("A", "B").unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(first.id, "conn-1");
        assert_eq!(second.id, "conn-2");
    }

    #[test]
    fn test_inbound_outbound_follow_creation_order() {
        let workflow = create_fan_in_workflow("list");
        let inbound: Vec<_> = workflow.inbound("M").map(|c| c.from.as_str()).collect();
        assert_eq!(inbound, vec!["B", "A"]);
        let outbound: Vec<_> = workflow.outbound("M").map(|c| c.to.as_str()).collect();
        assert_eq!(outbound, vec!["O"]);
        assert_eq!(workflow.sources().count(), 2);
        assert_eq!(workflow.sinks().count(), 1);
    }

    #[test]
    fn test_update_config_keeps_role_and_kind() {
        let mut workflow = create_shout_workflow();
        workflow
            .update_config("I", Config::new().with("value", "quiet"))
            .unwrap();
        let node = workflow.node("I").unwrap();
        assert_eq!(node.role(), Role::Source);
        assert_eq!(node.kind, "constant");
        assert_eq!(node.config.get_str("value"), Some("quiet"));

        assert_eq!(
            workflow.update_config("nope", Config::new()).unwrap_err(),
            GraphError::NodeNotFound("nope".into())
        );
    }

    #[test]
    fn test_integrity_check_catches_unvalidated_parts() {
        let nodes = vec![Node::source("A", "constant"), Node::sink("C", "collect")];
        let connections = vec![Connection {
            id: "c1".into(),
            from: "C".into(),
            to: "A".into(),
        }];
        let workflow = Workflow::from_parts("raw", nodes, connections);
        assert!(matches!(
            workflow.check_integrity(),
            Err(CompileError::InvalidConnection { ref connection_id, .. }) if connection_id == "c1"
        ));

        let duplicated = Workflow::from_parts(
            "dup",
            vec![Node::source("A", "constant"), Node::source("A", "constant")],
            vec![],
        );
        assert_eq!(
            duplicated.check_integrity(),
            Err(CompileError::DuplicateNode("A".into()))
        );
    }

    #[test]
    fn test_clear_empties_the_workflow() {
        let mut workflow = create_shout_workflow();
        workflow.clear();
        assert!(workflow.is_empty());
        assert!(workflow.connections().is_empty());
    }
}
