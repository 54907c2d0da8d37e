use super::validation::{ConnectionRules, check_connection};
use super::value::Config;
use crate::error::{CompileError, ConnectionError, GraphError};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Structural category of a node. Determines which edge directions are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Produces data, never receives a connection.
    Source,
    /// Receives and produces data.
    Transform,
    /// Receives data, never originates a connection.
    Sink,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Source => write!(f, "source"),
            Role::Transform => write!(f, "transform"),
            Role::Sink => write!(f, "sink"),
        }
    }
}

/// A typed unit of work in the workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: String,
    role: Role,
    pub kind: String,
    pub config: Config,
}

impl Node {
    pub fn new(id: impl Into<String>, role: Role, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            kind: kind.into(),
            config: Config::new(),
        }
    }

    pub fn source(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::new(id, Role::Source, kind)
    }

    pub fn transform(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::new(id, Role::Transform, kind)
    }

    pub fn sink(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::new(id, Role::Sink, kind)
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The role is fixed at creation.
    pub fn role(&self) -> Role {
        self.role
    }
}

/// A directed dependency from one node's output to another node's input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub from: String,
    pub to: String,
}

/// The owned aggregate of nodes and connections edited over the life of a workflow.
///
/// Nodes and connections keep their insertion order, which is what makes
/// ordering and plan synthesis deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    pub description: String,
    nodes: Vec<Node>,
    connections: Vec<Connection>,
    rules: ConnectionRules,
    next_connection_seq: u64,
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_rules(mut self, rules: ConnectionRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn rules(&self) -> ConnectionRules {
        self.rules
    }

    /// Adds a node. Fails without mutation if the id is already taken.
    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.node(node.id()).is_some() {
            warn!(node_id = %node.id(), "Rejected duplicate node id");
            return Err(GraphError::DuplicateNode(node.id().to_string()));
        }
        debug!(node_id = %node.id(), role = %node.role(), kind = %node.kind, "Added node");
        self.nodes.push(node);
        Ok(())
    }

    /// Removes a node and every connection touching it. Returns the removed
    /// node, or `None` if no such node existed.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let index = self.nodes.iter().position(|n| n.id() == id)?;
        let node = self.nodes.remove(index);
        let before = self.connections.len();
        self.connections.retain(|c| c.from != id && c.to != id);
        debug!(
            node_id = %id,
            removed_connections = before - self.connections.len(),
            "Removed node"
        );
        Some(node)
    }

    /// Replaces a node's config. Role and kind are left untouched.
    pub fn update_config(&mut self, id: &str, config: Config) -> Result<(), GraphError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id() == id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        node.config = config;
        Ok(())
    }

    /// Adds a connection after consulting the validator. On rejection the
    /// workflow is left unchanged.
    pub fn add_connection(&mut self, from: &str, to: &str) -> Result<Connection, ConnectionError> {
        if let Err(e) = check_connection(self, from, to) {
            warn!(from = %from, to = %to, reason = %e, "Rejected connection");
            return Err(e);
        }

        let connection = Connection {
            id: self.next_connection_id(),
            from: from.to_string(),
            to: to.to_string(),
        };
        debug!(connection_id = %connection.id, from = %from, to = %to, "Added connection");
        self.connections.push(connection.clone());
        Ok(connection)
    }

    fn next_connection_id(&mut self) -> String {
        loop {
            self.next_connection_seq += 1;
            let id = format!("conn-{}", self.next_connection_seq);
            if self.connection(&id).is_none() {
                return id;
            }
        }
    }

    /// Removes a connection by id. Returns `None` if no such connection existed.
    pub fn remove_connection(&mut self, id: &str) -> Option<Connection> {
        let index = self.connections.iter().position(|c| c.id == id)?;
        debug!(connection_id = %id, "Removed connection");
        Some(self.connections.remove(index))
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn connection(&self, id: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn has_connection(&self, from: &str, to: &str) -> bool {
        self.connections.iter().any(|c| c.from == from && c.to == to)
    }

    /// Connections pointing into `id`, in creation order.
    pub fn inbound<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.to == id)
    }

    /// Connections leaving `id`, in creation order.
    pub fn outbound<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.from == id)
    }

    pub fn sources(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.role() == Role::Source)
    }

    pub fn sinks(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.role() == Role::Sink)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.connections.clear();
    }

    /// Re-checks every invariant the mutation API normally guarantees.
    ///
    /// Workflows that were deserialized or built by a converter never went
    /// through `add_node`/`add_connection`, so the compiler runs this first.
    pub fn check_integrity(&self) -> Result<(), CompileError> {
        let mut seen_nodes = AHashSet::new();
        for node in &self.nodes {
            if !seen_nodes.insert(node.id()) {
                return Err(CompileError::DuplicateNode(node.id().to_string()));
            }
        }

        let mut seen_connections = AHashSet::new();
        for connection in &self.connections {
            if !seen_connections.insert(connection.id.as_str()) {
                return Err(CompileError::DuplicateConnection(connection.id.clone()));
            }
        }

        // Each connection is checked against the graph as it stood before it was added.
        let mut prefix = Workflow {
            nodes: self.nodes.clone(),
            rules: self.rules,
            ..Workflow::default()
        };
        for connection in &self.connections {
            check_connection(&prefix, &connection.from, &connection.to).map_err(|source| {
                CompileError::InvalidConnection {
                    connection_id: connection.id.clone(),
                    source,
                }
            })?;
            prefix.connections.push(connection.clone());
        }
        Ok(())
    }

    /// Assembles a workflow from raw parts without running the validator.
    /// Call [`Workflow::check_integrity`] (or compile it) before trusting it.
    pub fn from_parts(
        name: impl Into<String>,
        nodes: Vec<Node>,
        connections: Vec<Connection>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            next_connection_seq: connections.len() as u64,
            nodes,
            connections,
            rules: ConnectionRules::default(),
        }
    }
}
