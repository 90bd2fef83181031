// Legacy graph migration.
//
// The old editor persisted a positioned canvas, `{nodes, edges}`, where both
// people and unions were cards (`{id, type, position, data}`) and children hung
// off a union card's downward connector. This module turns whatever was
// persisted into a relational FamilyGraph.
//
// - relational input (`people` / `unions`) passes through as-is
// - canvas input is converted; positions are dropped
// - anything else is an empty graph
//
// Migration never fails. Converting its own output is a no-op.

use std::collections::HashSet;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::date::DateValue;
use crate::graph::{FamilyGraph, Gender, Person, PersonId, Union, UnionKind};

/// Source handles of a union card's downward (children) connector.
const CHILD_HANDLES: &[&str] = &["bottom", "children", "child"];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyGraph {
    pub nodes: Vec<LegacyNode>,
    pub edges: Vec<LegacyEdge>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Canvas position, discarded on migration
    pub position: Value,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegacyEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum CardKind {
    Person,
    Union,
}

fn card_kind(tag: &str) -> Option<CardKind> {
    match tag.to_ascii_lowercase().as_str() {
        "person" | "personnode" => Some(CardKind::Person),
        "union" | "unionnode" => Some(CardKind::Union),
        _ => None,
    }
}

/// Convert any persisted graph into the relational format.
pub fn migrate_to_new_format(value: &Value) -> FamilyGraph {
    let Some(obj) = value.as_object() else {
        warn!("migration: expected a JSON object, got {}; starting with an empty graph", kind_of(value));
        return FamilyGraph::default();
    };

    if obj.contains_key("people") || obj.contains_key("unions") {
        return match FamilyGraph::deserialize(value) {
            Ok(graph) => graph,
            Err(e) => {
                warn!("migration: unreadable relational graph ({}); starting with an empty graph", e);
                FamilyGraph::default()
            }
        };
    }

    if obj.contains_key("nodes") {
        return match LegacyGraph::deserialize(value) {
            Ok(legacy) => migrate_legacy(&legacy),
            Err(e) => {
                warn!("migration: unreadable legacy graph ({}); starting with an empty graph", e);
                FamilyGraph::default()
            }
        };
    }

    warn!("migration: unrecognized graph shape; starting with an empty graph");
    FamilyGraph::default()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Convert a canvas graph into the relational format.
pub fn migrate_legacy(legacy: &LegacyGraph) -> FamilyGraph {
    let mut graph = FamilyGraph::default();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut union_nodes: Vec<&LegacyNode> = Vec::new();

    for node in &legacy.nodes {
        let Some(kind) = card_kind(&node.kind) else {
            debug!("migration: skipping '{}' card '{}'", node.kind, node.id);
            continue;
        };
        if node.id.is_empty() || !seen.insert(node.id.as_str()) {
            warn!("migration: skipping card with empty or duplicate id '{}'", node.id);
            continue;
        }
        match kind {
            CardKind::Person => graph.people.push(legacy_person(node)),
            CardKind::Union => union_nodes.push(node),
        }
    }

    let cards = Cards {
        people: graph.people.iter().map(|p| p.id.as_str()).collect(),
        unions: union_nodes.iter().map(|n| n.id.as_str()).collect(),
    };
    let unions: Vec<Union> = union_nodes
        .iter()
        .map(|node| legacy_union(node, &legacy.edges, &cards))
        .collect();
    graph.unions = unions;

    debug!(
        "migration: {} nodes, {} edges -> {} people, {} unions",
        legacy.nodes.len(),
        legacy.edges.len(),
        graph.people.len(),
        graph.unions.len()
    );
    graph
}

/// Ids of the person and union cards that survived the first pass.
struct Cards<'a> {
    people: HashSet<&'a str>,
    unions: HashSet<&'a str>,
}

fn legacy_person(node: &LegacyNode) -> Person {
    let data = &node.data;
    let mut person = Person::new(node.id.as_str());
    person.given_name = text(data, &["givenName", "firstName"]);
    person.middle_name = text(data, &["middleName"]);
    person.last_name = text(data, &["lastName", "surname", "familyName"]);
    person.maiden_name = text(data, &["maidenName", "birthName"]);
    person.nick_name = text(data, &["nickName", "nickname"]);
    person.title = text(data, &["title"]);
    person.gender = gender(&text(data, &["gender", "sex"]));
    person.birth_date = date(data, &["birthDate", "born"]);
    person.death_date = date(data, &["deathDate", "died"]);
    person.birth_place = text(data, &["birthPlace"]);
    person.death_place = text(data, &["deathPlace"]);
    person.notes = text(data, &["notes", "note"]);

    if person.given_name.is_empty() && person.last_name.is_empty() {
        let (given, last) = split_name(&text(data, &["name", "fullName", "label"]));
        person.given_name = given;
        person.last_name = last;
    }
    person
}

fn legacy_union(node: &LegacyNode, edges: &[LegacyEdge], cards: &Cards<'_>) -> Union {
    let data = &node.data;
    let mut union = Union::new(node.id.as_str());
    union.partner1_id = partner(data, &["partner1Id", "partner1"], node, cards);
    union.partner2_id = partner(data, &["partner2Id", "partner2"], node, cards);
    if union.partner1_id.is_some() && union.partner1_id == union.partner2_id {
        warn!("migration: union '{}' lists the same partner twice; keeping one", node.id);
        union.partner2_id = None;
    }
    union.kind = union_kind(&text(data, &["unionType", "kind"]));
    union.start_date = date(data, &["startDate", "marriageDate"]);
    union.end_date = date(data, &["endDate", "divorceDate"]);
    union.start_place = text(data, &["startPlace", "marriagePlace", "place"]);

    for edge in edges {
        let downward = edge.source_handle.as_deref().is_some_and(|h| CHILD_HANDLES.contains(&h));
        // Dangling targets are kept like any other id; a union card can't be a child
        let to_union = cards.unions.contains(edge.target.as_str());
        if edge.source != node.id || !downward || edge.target.is_empty() || to_union {
            continue;
        }
        let child = PersonId::from(edge.target.as_str());
        if !union.has_child(&child) && !union.has_partner(&child) {
            union.child_ids.push(child);
        }
    }
    union
}

/// First non-empty string (or number) among `keys`.
fn text(data: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| match data.get(*k)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// Partner ids are taken as written; a dangling one resolves to nothing later.
fn partner(data: &Value, keys: &[&str], node: &LegacyNode, cards: &Cards<'_>) -> Option<PersonId> {
    let id = text(data, keys);
    if id.is_empty() {
        return None;
    }
    if !cards.people.contains(id.as_str()) {
        warn!("migration: union '{}' names partner '{}' with no person card", node.id, id);
    }
    Some(PersonId::from(id))
}

/// Legacy dates are free text or, in later saves, already structured.
fn date(data: &Value, keys: &[&str]) -> DateValue {
    for key in keys {
        match data.get(*key) {
            Some(Value::String(s)) if s.trim().is_empty() => {}
            Some(value @ (Value::String(_) | Value::Number(_) | Value::Object(_))) => {
                return DateValue::from(value.clone());
            }
            _ => {}
        }
    }
    DateValue::default()
}

fn gender(text: &str) -> Gender {
    match text.to_ascii_lowercase().as_str() {
        "m" | "male" | "man" => Gender::Male,
        "f" | "female" | "woman" => Gender::Female,
        "o" | "other" | "x" | "nonbinary" | "non-binary" => Gender::Other,
        _ => Gender::Unset,
    }
}

fn union_kind(text: &str) -> UnionKind {
    let normalized = text.trim().to_ascii_lowercase().replace([' ', '-'], "_");
    match normalized.as_str() {
        "civil_union" | "civil" => UnionKind::CivilUnion,
        "common_law" => UnionKind::CommonLaw,
        "partnership" | "partners" => UnionKind::Partnership,
        _ => UnionKind::Marriage,
    }
}

/// "Anna Maria Berg" -> ("Anna Maria", "Berg"); one word is a given name.
fn split_name(full: &str) -> (String, String) {
    let words: Vec<&str> = full.split_whitespace().collect();
    match words.split_last() {
        None => (String::new(), String::new()),
        Some((only, [])) => (only.to_string(), String::new()),
        Some((last, rest)) => (rest.join(" "), last.to_string()),
    }
}
