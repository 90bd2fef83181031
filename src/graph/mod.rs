// Relational family graph.
//
// - types: Person / Union / FamilyGraph entity shapes
// - store: pure edit functions, (graph, args) -> graph
// - resolve: parent/child/sibling/ancestor/descendant queries
//
// People and unions live in flat vectors and refer to each other by id only,
// so a removed or never-existing id is just a lookup that returns nothing.

mod resolve;
mod store;
mod types;

pub use resolve::{
    eligible_parents, get_ancestors, get_children, get_descendants, get_parents, get_siblings, get_spouse_id,
    parent_union, unions_of,
};
pub use store::{
    add_child_to_union, add_person, add_person_with_id, add_union, add_union_with_id, remove_child_from_union,
    remove_person, remove_union, update_person, update_union, PersonPatch, UnionPatch,
};
pub use types::*;
