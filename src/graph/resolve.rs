//! Relationship queries over a [`FamilyGraph`].
//!
//! None of these fail. A dangling id simply resolves to nothing, and every
//! closure is guarded by a visited set so cyclic data still terminates.
//! Results are deduplicated and in first-seen order (store order), which the
//! layout engines rely on for determinism.

use std::collections::HashSet;

use crate::graph::types::{FamilyGraph, PersonId, Union};

/// The union `person` is a child of.
///
/// If bad data lists the person as a child of several unions, the first one
/// in store order wins.
pub fn parent_union<'g>(graph: &'g FamilyGraph, person: &PersonId) -> Option<&'g Union> {
    graph.unions.iter().find(|u| u.has_child(person))
}

/// Zero, one or two parent ids, from [`parent_union`].
pub fn get_parents(graph: &FamilyGraph, person: &PersonId) -> Vec<PersonId> {
    parent_union(graph, person)
        .map(|u| u.partners().cloned().collect())
        .unwrap_or_default()
}

/// Unions where `person` is a partner, in store order.
pub fn unions_of<'g>(graph: &'g FamilyGraph, person: &PersonId) -> Vec<&'g Union> {
    graph.unions.iter().filter(|u| u.has_partner(person)).collect()
}

/// Children across all of `person`'s unions, without duplicates.
pub fn get_children(graph: &FamilyGraph, person: &PersonId) -> Vec<PersonId> {
    let mut seen = HashSet::new();
    unions_of(graph, person)
        .into_iter()
        .flat_map(|u| u.child_ids.iter())
        .filter(|c| seen.insert((*c).clone()))
        .cloned()
        .collect()
}

/// The other partner of `union`, if `person` is one partner and the other
/// side is known.
pub fn get_spouse_id(union: &Union, person: &PersonId) -> Option<PersonId> {
    if union.partner1_id.as_ref() == Some(person) {
        union.partner2_id.clone()
    } else if union.partner2_id.as_ref() == Some(person) {
        union.partner1_id.clone()
    } else {
        None
    }
}

/// Everyone sharing a parent union with `person` (any of them), excluding
/// `person`.
pub fn get_siblings(graph: &FamilyGraph, person: &PersonId) -> Vec<PersonId> {
    let mut seen = HashSet::new();
    seen.insert(person.clone());
    graph
        .unions
        .iter()
        .filter(|u| u.has_child(person))
        .flat_map(|u| u.child_ids.iter())
        .filter(|c| seen.insert((*c).clone()))
        .cloned()
        .collect()
}

/// All descendants of `person` (never `person` itself), depth-first.
pub fn get_descendants(graph: &FamilyGraph, person: &PersonId) -> Vec<PersonId> {
    let mut visited = HashSet::from([person.clone()]);
    let mut out = Vec::new();
    collect_closure(graph, person, get_children, &mut visited, &mut out);
    out
}

/// All ancestors of `person` (never `person` itself), depth-first along
/// the first-union parent chain.
pub fn get_ancestors(graph: &FamilyGraph, person: &PersonId) -> Vec<PersonId> {
    let mut visited = HashSet::from([person.clone()]);
    let mut out = Vec::new();
    collect_closure(graph, person, get_parents, &mut visited, &mut out);
    out
}

fn collect_closure(
    graph: &FamilyGraph,
    person: &PersonId,
    step: fn(&FamilyGraph, &PersonId) -> Vec<PersonId>,
    visited: &mut HashSet<PersonId>,
    out: &mut Vec<PersonId>,
) {
    for next in step(graph, person) {
        if visited.insert(next.clone()) {
            out.push(next.clone());
            collect_closure(graph, &next, step, visited, out);
        }
    }
}

/// People who could be recorded as a parent of `person` without creating a
/// cycle: everyone except `person` and their descendants.
pub fn eligible_parents(graph: &FamilyGraph, person: &PersonId) -> Vec<PersonId> {
    let excluded: HashSet<PersonId> = get_descendants(graph, person).into_iter().collect();
    graph
        .people
        .iter()
        .map(|p| &p.id)
        .filter(|id| *id != person && !excluded.contains(*id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::{Person, Union};

    fn ids(list: &[&str]) -> Vec<PersonId> {
        list.iter().map(|s| PersonId::from(*s)).collect()
    }

    fn union(id: &str, p1: Option<&str>, p2: Option<&str>, children: &[&str]) -> Union {
        let mut u = Union::new(id);
        u.partner1_id = p1.map(PersonId::from);
        u.partner2_id = p2.map(PersonId::from);
        u.child_ids = ids(children);
        u
    }

    fn graph(people: &[&str], unions: Vec<Union>) -> FamilyGraph {
        FamilyGraph { people: people.iter().map(|p| Person::new(*p)).collect(), unions }
    }

    /// gp1+gp2 -> dad; dad+mom -> kid1, kid2; dad+step -> kid3
    fn family() -> FamilyGraph {
        graph(
            &["gp1", "gp2", "dad", "mom", "step", "kid1", "kid2", "kid3"],
            vec![
                union("u0", Some("gp1"), Some("gp2"), &["dad"]),
                union("u1", Some("dad"), Some("mom"), &["kid1", "kid2"]),
                union("u2", Some("dad"), Some("step"), &["kid3"]),
            ],
        )
    }

    #[test]
    fn test_parents() {
        let g = family();
        assert_eq!(get_parents(&g, &"kid1".into()), ids(&["dad", "mom"]));
        assert_eq!(get_parents(&g, &"gp1".into()), ids(&[]));
    }

    #[test]
    fn test_single_known_parent() {
        let g = graph(&["mom", "kid"], vec![union("u", None, Some("mom"), &["kid"])]);
        assert_eq!(get_parents(&g, &"kid".into()), ids(&["mom"]));
    }

    #[test]
    fn test_first_parent_union_wins() {
        let g = graph(
            &["a", "b", "c", "d", "kid"],
            vec![union("u1", Some("a"), Some("b"), &["kid"]), union("u2", Some("c"), Some("d"), &["kid"])],
        );
        assert_eq!(get_parents(&g, &"kid".into()), ids(&["a", "b"]));
        assert_eq!(parent_union(&g, &"kid".into()).map(|u| u.id.as_str()), Some("u1"));
    }

    #[test]
    fn test_children_across_unions() {
        let g = family();
        assert_eq!(get_children(&g, &"dad".into()), ids(&["kid1", "kid2", "kid3"]));
        assert_eq!(get_children(&g, &"mom".into()), ids(&["kid1", "kid2"]));
    }

    #[test]
    fn test_children_deduplicated() {
        // Same pair recorded twice, same child in both
        let g = graph(
            &["a", "b", "kid"],
            vec![union("u1", Some("a"), Some("b"), &["kid"]), union("u2", Some("b"), Some("a"), &["kid"])],
        );
        assert_eq!(get_children(&g, &"a".into()), ids(&["kid"]));
    }

    #[test]
    fn test_spouse() {
        let u = union("u", Some("a"), Some("b"), &[]);
        assert_eq!(get_spouse_id(&u, &"a".into()), Some("b".into()));
        assert_eq!(get_spouse_id(&u, &"b".into()), Some("a".into()));
        assert_eq!(get_spouse_id(&u, &"z".into()), None);

        let half = union("u", Some("a"), None, &[]);
        assert_eq!(get_spouse_id(&half, &"a".into()), None);
    }

    #[test]
    fn test_siblings() {
        let g = family();
        assert_eq!(get_siblings(&g, &"kid1".into()), ids(&["kid2"]));
        assert_eq!(get_siblings(&g, &"kid3".into()), ids(&[]));
    }

    #[test]
    fn test_descendants_and_ancestors() {
        let g = family();
        assert_eq!(get_descendants(&g, &"gp1".into()), ids(&["dad", "kid1", "kid2", "kid3"]));
        assert_eq!(get_ancestors(&g, &"kid1".into()), ids(&["dad", "gp1", "gp2", "mom"]));
    }

    #[test]
    fn test_descendants_terminate_on_cycle() {
        let g = graph(
            &["a", "b"],
            vec![union("u1", Some("a"), None, &["b"]), union("u2", Some("b"), None, &["a"])],
        );
        assert_eq!(get_descendants(&g, &"a".into()), ids(&["b"]));
        assert_eq!(get_ancestors(&g, &"a".into()), ids(&["b"]));
    }

    #[test]
    fn test_dangling_ids_resolve_to_nothing() {
        let g = graph(&["a"], vec![union("u1", Some("a"), Some("ghost"), &["phantom"])]);
        assert_eq!(get_children(&g, &"a".into()), ids(&["phantom"]));
        assert_eq!(get_descendants(&g, &"nobody".into()), ids(&[]));
        assert_eq!(get_parents(&g, &"nobody".into()), ids(&[]));
    }

    #[test]
    fn test_eligible_parents_exclude_descendants() {
        let g = family();
        assert_eq!(get_descendants(&g, &"dad".into()), ids(&["kid1", "kid2", "kid3"]));
        assert_eq!(eligible_parents(&g, &"dad".into()), ids(&["gp1", "gp2", "mom", "step"]));
    }
}
