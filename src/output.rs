//! Output types for renderer consumption.
//!
//! These structs are serialized to JSON and handed to the rendering layer,
//! which draws cards and connectors at the given bounds.

use std::collections::HashSet;

use serde::Serialize;

use crate::graph::{Person, Union};
use crate::layout::RectI;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Person,
    Union,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Partner to union marker
    Spouse,
    /// Union marker down to a child
    Child,
}

/// The entity a node was built from, passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeData {
    Person(Person),
    Union(Union),
}

/// A positioned node ready for the renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    /// Person or union id
    pub id: String,
    pub kind: NodeKind,
    /// 0 for the focus row; negative above, positive below
    pub generation: i32,
    pub bounds: RectI,
    pub label: String,
    /// Lifespan for people, start place for unions
    pub sublabel: String,
    pub data: NodeData,
}

impl LayoutNode {
    pub(crate) fn person(person: &Person, bounds: RectI, generation: i32) -> Self {
        Self {
            id: person.id.to_string(),
            kind: NodeKind::Person,
            generation,
            bounds,
            label: person.display_name(),
            sublabel: person.lifespan(),
            data: NodeData::Person(person.clone()),
        }
    }

    pub(crate) fn union(union: &Union, bounds: RectI, generation: i32) -> Self {
        Self {
            id: union.id.to_string(),
            kind: NodeKind::Union,
            generation,
            bounds,
            label: union.label(),
            sublabel: union.start_place.clone(),
            data: NodeData::Union(union.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

/// The combined output sent to the renderer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FamilyLayout {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
    #[serde(skip)]
    edge_ids: HashSet<String>,
}

impl FamilyLayout {
    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Nodes of one generation, in insertion order.
    pub fn generation(&self, generation: i32) -> Vec<&LayoutNode> {
        self.nodes.iter().filter(|n| n.generation == generation).collect()
    }

    /// Bounding box of every node, or None when empty.
    pub fn bounds(&self) -> Option<RectI> {
        let mut it = self.nodes.iter().map(|n| n.bounds);
        let first = it.next()?;
        Some(it.fold(first, |acc, r| acc.union(&r)))
    }

    pub(crate) fn push_node(&mut self, node: LayoutNode) {
        self.nodes.push(node);
    }

    /// Add an edge unless the same source/target pair is already present.
    pub(crate) fn push_edge(&mut self, kind: EdgeKind, source: &str, target: &str) {
        let id = format!("{}->{}", source, target);
        if self.edge_ids.insert(id.clone()) {
            self.edges.push(LayoutEdge { id, source: source.to_string(), target: target.to_string(), kind });
        }
    }

    pub(crate) fn translate(&mut self, dx: i32, dy: i32) {
        for n in &mut self.nodes {
            n.bounds = n.bounds.translated(dx, dy);
        }
    }
}
