// Graph edits.
//
// Every function takes the current snapshot by reference and returns a new
// one; the caller's graph is never touched. That keeps undo/redo a matter of
// holding on to old snapshots.
//
// Checked at edit time:
// - ids are unique across people and unions
// - union partners exist and differ
// - children exist and aren't a partner of the same union

use log::debug;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::date::DateValue;
use crate::error::GraphError;
use crate::graph::types::*;

macro_rules! apply_fields {
    ($patch:ident => $target:ident: $($field:ident),* $(,)?) => {
        $(if let Some(v) = $patch.$field { $target.$field = v; })*
    };
}

/// Field-level patch for a person. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonPatch {
    pub given_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub maiden_name: Option<String>,
    pub nick_name: Option<String>,
    pub title: Option<String>,
    pub gender: Option<Gender>,
    pub birth_date: Option<DateValue>,
    pub death_date: Option<DateValue>,
    pub birth_place: Option<String>,
    pub death_place: Option<String>,
    pub notes: Option<String>,
    pub events: Option<Vec<LifeEvent>>,
}

impl PersonPatch {
    fn apply(self, p: &mut Person) {
        let patch = self;
        apply_fields!(patch => p:
            given_name, middle_name, last_name, maiden_name, nick_name, title, gender, birth_date, death_date,
            birth_place, death_place, notes, events
        );
    }
}

/// Field-level patch for a union. Partner and end-reason fields are
/// doubly optional so they can be cleared: `Some(None)` unsets. In JSON an
/// absent key leaves the field and an explicit `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UnionPatch {
    #[serde(deserialize_with = "present")]
    pub partner1_id: Option<Option<PersonId>>,
    #[serde(deserialize_with = "present")]
    pub partner2_id: Option<Option<PersonId>>,
    #[serde(rename = "type")]
    pub kind: Option<UnionKind>,
    pub start_date: Option<DateValue>,
    pub end_date: Option<DateValue>,
    pub start_place: Option<String>,
    #[serde(deserialize_with = "present")]
    pub end_reason: Option<Option<EndReason>>,
    /// Replaces the child list (reordering); every id must exist
    pub child_ids: Option<Vec<PersonId>>,
    pub sources: Option<Vec<String>>,
}

/// A key that is present, possibly `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

impl UnionPatch {
    fn apply(self, u: &mut Union) {
        let patch = self;
        apply_fields!(patch => u:
            partner1_id, partner2_id, kind, start_date, end_date, start_place, end_reason, child_ids, sources
        );
    }
}

/// Add a person under a freshly generated id.
pub fn add_person(graph: &FamilyGraph, attrs: PersonPatch) -> (FamilyGraph, PersonId) {
    let mut id = PersonId(Uuid::new_v4().to_string());
    while graph.id_in_use(id.as_str()) {
        id = PersonId(Uuid::new_v4().to_string());
    }
    let mut next = graph.clone();
    push_person(&mut next, id.clone(), attrs);
    (next, id)
}

/// Add a person under a caller-assigned id.
pub fn add_person_with_id(
    graph: &FamilyGraph,
    id: impl Into<PersonId>,
    attrs: PersonPatch,
) -> Result<(FamilyGraph, PersonId), GraphError> {
    let id = id.into();
    if graph.id_in_use(id.as_str()) {
        return Err(GraphError::DuplicateId(id.0));
    }
    let mut next = graph.clone();
    push_person(&mut next, id.clone(), attrs);
    Ok((next, id))
}

fn push_person(graph: &mut FamilyGraph, id: PersonId, attrs: PersonPatch) {
    let mut person = Person::new(id);
    attrs.apply(&mut person);
    debug!("add person {}", person.id);
    graph.people.push(person);
}

pub fn update_person(graph: &FamilyGraph, id: &PersonId, patch: PersonPatch) -> Result<FamilyGraph, GraphError> {
    let mut next = graph.clone();
    let person = next.person_mut(id).ok_or_else(|| GraphError::PersonNotFound(id.clone()))?;
    patch.apply(person);
    Ok(next)
}

/// Remove a person, strip them from every child list and drop every union
/// they were a partner in. Unknown ids are a no-op.
pub fn remove_person(graph: &FamilyGraph, id: &PersonId) -> FamilyGraph {
    let mut next = graph.clone();
    next.people.retain(|p| &p.id != id);
    next.unions.retain(|u| !u.has_partner(id));
    for u in &mut next.unions {
        u.child_ids.retain(|c| c != id);
    }
    debug!("remove person {} ({} people, {} unions left)", id, next.people.len(), next.unions.len());
    next
}

/// Record a union under a freshly generated id. Either partner may be
/// unknown.
pub fn add_union(
    graph: &FamilyGraph,
    partner1: Option<PersonId>,
    partner2: Option<PersonId>,
    attrs: UnionPatch,
) -> Result<(FamilyGraph, UnionId), GraphError> {
    let mut id = UnionId(Uuid::new_v4().to_string());
    while graph.id_in_use(id.as_str()) {
        id = UnionId(Uuid::new_v4().to_string());
    }
    add_union_with_id(graph, id, partner1, partner2, attrs)
}

pub fn add_union_with_id(
    graph: &FamilyGraph,
    id: impl Into<UnionId>,
    partner1: Option<PersonId>,
    partner2: Option<PersonId>,
    attrs: UnionPatch,
) -> Result<(FamilyGraph, UnionId), GraphError> {
    let id = id.into();
    if graph.id_in_use(id.as_str()) {
        return Err(GraphError::DuplicateId(id.0));
    }
    let mut union = Union::new(id.clone());
    attrs.apply(&mut union);
    union.partner1_id = partner1;
    union.partner2_id = partner2;
    validate_union(graph, &union)?;

    let mut next = graph.clone();
    debug!("add union {}", union.id);
    next.unions.push(union);
    Ok((next, id))
}

pub fn update_union(graph: &FamilyGraph, id: &UnionId, patch: UnionPatch) -> Result<FamilyGraph, GraphError> {
    let mut next = graph.clone();
    let union = next.union_mut(id).ok_or_else(|| GraphError::UnionNotFound(id.clone()))?;
    let mut updated = union.clone();
    patch.apply(&mut updated);
    validate_union(graph, &updated)?;
    *union = updated;
    Ok(next)
}

pub fn remove_union(graph: &FamilyGraph, id: &UnionId) -> FamilyGraph {
    let mut next = graph.clone();
    next.unions.retain(|u| &u.id != id);
    next
}

/// Append `child` to the union's children. Already present is a no-op.
pub fn add_child_to_union(
    graph: &FamilyGraph,
    union_id: &UnionId,
    child: &PersonId,
) -> Result<FamilyGraph, GraphError> {
    if !graph.contains_person(child) {
        return Err(GraphError::PersonNotFound(child.clone()));
    }
    let mut next = graph.clone();
    let union = next.union_mut(union_id).ok_or_else(|| GraphError::UnionNotFound(union_id.clone()))?;
    if union.has_partner(child) {
        return Err(GraphError::SelfParent(child.clone()));
    }
    if !union.has_child(child) {
        union.child_ids.push(child.clone());
    }
    Ok(next)
}

pub fn remove_child_from_union(
    graph: &FamilyGraph,
    union_id: &UnionId,
    child: &PersonId,
) -> Result<FamilyGraph, GraphError> {
    let mut next = graph.clone();
    let union = next.union_mut(union_id).ok_or_else(|| GraphError::UnionNotFound(union_id.clone()))?;
    union.child_ids.retain(|c| c != child);
    Ok(next)
}

fn validate_union(graph: &FamilyGraph, union: &Union) -> Result<(), GraphError> {
    for p in union.partners() {
        if !graph.contains_person(p) {
            return Err(GraphError::PersonNotFound(p.clone()));
        }
    }
    if let (Some(a), Some(b)) = (&union.partner1_id, &union.partner2_id) {
        if a == b {
            return Err(GraphError::SamePartner(a.clone()));
        }
    }
    for c in &union.child_ids {
        if !graph.contains_person(c) {
            return Err(GraphError::PersonNotFound(c.clone()));
        }
        if union.has_partner(c) {
            return Err(GraphError::SelfParent(c.clone()));
        }
    }
    Ok(())
}
