use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt::Write as _;

use serde::Serialize;
use tracing::debug;

use crate::document::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Monitor,
    Group,
    StatusPage,
    Channel,
    RemoteAgent,
}

impl NodeKind {
    fn prefix(self) -> &'static str {
        match self {
            NodeKind::Monitor => "monitor",
            NodeKind::Group => "group",
            NodeKind::StatusPage => "status_page",
            NodeKind::Channel => "channel",
            NodeKind::RemoteAgent => "agent",
        }
    }

    fn shape(self) -> &'static str {
        match self {
            NodeKind::Monitor => "box",
            NodeKind::Group => "folder",
            NodeKind::StatusPage => "tab",
            NodeKind::Channel => "note",
            NodeKind::RemoteAgent => "ellipse",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeKey {
    pub kind: NodeKind,
    pub id: String,
}

impl NodeKey {
    pub fn new(kind: NodeKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    fn dot_id(&self) -> String {
        format!("{}:{}", self.kind.prefix(), self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    #[serde(flatten)]
    pub key: NodeKey,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    Member,
    Child,
    Notifies,
    ProbedBy,
    Shows,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: NodeKey,
    pub to: NodeKey,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    All,
    StatusPage(&'a str),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReferenceGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl ReferenceGraph {
    pub fn build(doc: &Document) -> Self {
        let mut graph = ReferenceGraph::default();

        for m in &doc.monitors {
            graph.add_node(NodeKind::Monitor, &m.id, &m.name);
        }
        for g in &doc.groups {
            graph.add_node(NodeKind::Group, &g.id, &g.name);
        }
        for sp in &doc.status_pages {
            graph.add_node(NodeKind::StatusPage, &sp.id, &sp.name);
        }
        for (key, ch) in &doc.notifications.channels {
            graph.add_node(NodeKind::Channel, ch.reference_id(key), &ch.name);
        }
        for agent in &doc.remote_agents {
            graph.add_node(NodeKind::RemoteAgent, &agent.id, &agent.name);
        }

        let ids: HashSet<NodeKey> = graph.nodes.iter().map(|n| n.key.clone()).collect();
        let mut edges = Vec::new();

        for m in &doc.monitors {
            let monitor = NodeKey::new(NodeKind::Monitor, m.id.clone());
            if let Some(group) = &m.group_id {
                edges.push(Edge {
                    from: NodeKey::new(NodeKind::Group, group.clone()),
                    to: monitor.clone(),
                    kind: EdgeKind::Member,
                });
            }
            for ch in &m.notification_channels {
                edges.push(Edge {
                    from: monitor.clone(),
                    to: NodeKey::new(NodeKind::Channel, ch.clone()),
                    kind: EdgeKind::Notifies,
                });
            }
            for agent in &m.pulse_monitors {
                edges.push(Edge {
                    from: monitor.clone(),
                    to: NodeKey::new(NodeKind::RemoteAgent, agent.clone()),
                    kind: EdgeKind::ProbedBy,
                });
            }
        }

        for g in &doc.groups {
            let group = NodeKey::new(NodeKind::Group, g.id.clone());
            if let Some(parent) = &g.parent_id {
                edges.push(Edge {
                    from: NodeKey::new(NodeKind::Group, parent.clone()),
                    to: group.clone(),
                    kind: EdgeKind::Child,
                });
            }
            for ch in &g.notification_channels {
                edges.push(Edge {
                    from: group.clone(),
                    to: NodeKey::new(NodeKind::Channel, ch.clone()),
                    kind: EdgeKind::Notifies,
                });
            }
        }

        for sp in &doc.status_pages {
            let page = NodeKey::new(NodeKind::StatusPage, sp.id.clone());
            for item in &sp.items {
                // An item id may name a group, a monitor, or both.
                for kind in [NodeKind::Group, NodeKind::Monitor] {
                    edges.push(Edge {
                        from: page.clone(),
                        to: NodeKey::new(kind, item.clone()),
                        kind: EdgeKind::Shows,
                    });
                }
            }
        }

        let total = edges.len();
        graph.edges = edges
            .into_iter()
            .filter(|e| ids.contains(&e.from) && ids.contains(&e.to))
            .collect();
        debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            dropped = total - graph.edges.len(),
            "reference graph built"
        );
        graph
    }

    fn add_node(&mut self, kind: NodeKind, id: &str, name: &str) {
        if id.is_empty() {
            return;
        }
        let key = NodeKey::new(kind, id);
        if self.nodes.iter().any(|n| n.key == key) {
            return;
        }
        let label = if name.is_empty() { id } else { name };
        self.nodes.push(Node {
            key,
            label: label.to_string(),
        });
    }

    pub fn node(&self, key: &NodeKey) -> Option<&Node> {
        self.nodes.iter().find(|n| n.key == *key)
    }

    pub fn contains(&self, kind: NodeKind, id: &str) -> bool {
        self.nodes.iter().any(|n| n.key.kind == kind && n.key.id == id)
    }

    /// Forward-reachable subgraph from `root`, or an empty graph when the
    /// root is not a node.
    pub fn scoped(&self, root: &NodeKey) -> ReferenceGraph {
        if self.node(root).is_none() {
            return ReferenceGraph::default();
        }

        let mut seen: BTreeSet<NodeKey> = BTreeSet::new();
        let mut queue = VecDeque::from([root.clone()]);
        seen.insert(root.clone());
        while let Some(current) = queue.pop_front() {
            for edge in self.edges.iter().filter(|e| e.from == current) {
                if seen.insert(edge.to.clone()) {
                    queue.push_back(edge.to.clone());
                }
            }
        }

        ReferenceGraph {
            nodes: self
                .nodes
                .iter()
                .filter(|n| seen.contains(&n.key))
                .cloned()
                .collect(),
            edges: self
                .edges
                .iter()
                .filter(|e| seen.contains(&e.from) && seen.contains(&e.to))
                .cloned()
                .collect(),
        }
    }

    pub fn select(&self, scope: Scope<'_>) -> ReferenceGraph {
        match scope {
            Scope::All => self.clone(),
            Scope::StatusPage(id) => self.scoped(&NodeKey::new(NodeKind::StatusPage, id)),
        }
    }

    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph references {\n    rankdir=LR;\n");
        for node in &self.nodes {
            let _ = writeln!(
                out,
                "    \"{}\" [label=\"{}\", shape={}];",
                dot_escape(&node.key.dot_id()),
                dot_escape(&node.label),
                node.key.kind.shape()
            );
        }
        for edge in &self.edges {
            let _ = writeln!(
                out,
                "    \"{}\" -> \"{}\" [label=\"{}\"];",
                dot_escape(&edge.from.dot_id()),
                dot_escape(&edge.to.dot_id()),
                edge_label(edge.kind)
            );
        }
        out.push_str("}\n");
        out
    }
}

fn edge_label(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Member => "member",
        EdgeKind::Child => "child",
        EdgeKind::Notifies => "notifies",
        EdgeKind::ProbedBy => "probed by",
        EdgeKind::Shows => "shows",
    }
}

fn dot_escape(input: &str) -> String {
    input.replace('\\', "\\\\").replace('"', "\\\"")
}
