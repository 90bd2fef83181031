// Pedigree layout: the focus person in the middle row, their unions and
// spouses alongside, parents (and optionally grandparents) above, children
// below.
//
// Everything sits on a grid of slots. A slot is the widest node plus one
// gutter, and each node is centered in its own slot, so two nodes in
// different slots of one row can never overlap.
//
// Focus row, unions alternating right/left (ring k = index / 2):
//
//     ... S3 M3 S1 M1 [F] M0 S0 M2 S2 ...
//
// Ancestors are measured bottom-up into blocks of slots:
//
//     block(person) = 1                                 no parents shown
//                   = block(p1) + 1 (marker) + block(p2)
//
// and laid out as [block(p1)][marker][block(p2)] with the marker straight
// above the child, so every marker sits over its child's column and blocks of
// one generation are disjoint intervals.
//
// Children of each focus union form a block centered under its marker.
// Blocks are swept left-to-right (pushed right on collision) and the whole
// row is then re-centered.

use std::collections::HashSet;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::graph::{get_spouse_id, parent_union, unions_of, FamilyGraph, Person, PersonId, Union};
use crate::layout::{LayoutConfig, PointI, RectI};
use crate::output::{EdgeKind, FamilyLayout, LayoutNode};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PedigreeOptions {
    /// Add the generation above the parents.
    pub show_grandparents: bool,
    /// Add the focus person's children below.
    pub show_children: bool,
    /// Where the focus person's card is centered.
    pub center: PointI,
}

impl Default for PedigreeOptions {
    fn default() -> Self {
        Self { show_grandparents: false, show_children: true, center: PointI { x: 0, y: 0 } }
    }
}

/// Slot grid anchored on the focus person.
struct Grid {
    cfg: LayoutConfig,
    slot: i32,
    /// Left edge of the focus slot
    origin: i32,
    center_y: i32,
}

impl Grid {
    fn new(cfg: &LayoutConfig, center: PointI) -> Self {
        let cfg = cfg.normalized();
        let slot = cfg.slot();
        let person_left = center.x - cfg.person_size.w / 2;
        let origin = person_left - (cfg.max_node_w() - cfg.person_size.w) / 2;
        Self { cfg, slot, origin, center_y: center.y }
    }

    /// Left edge of slot `index` relative to the focus slot.
    fn slot_left(&self, index: i32) -> i32 {
        self.origin + index * self.slot
    }

    /// Left edge of a block of `slots` centered over the column at `left`.
    fn block_left(&self, left: i32, slots: i32) -> i32 {
        left - (slots - 1) * self.slot / 2
    }

    fn person_rect(&self, slot_left: i32, generation: i32) -> RectI {
        let size = self.cfg.person_size;
        RectI {
            x: slot_left + (self.cfg.max_node_w() - size.w) / 2,
            y: self.center_y - size.h / 2 + generation * self.cfg.generation_gap,
            w: size.w,
            h: size.h,
        }
    }

    fn union_rect(&self, slot_left: i32, generation: i32) -> RectI {
        let size = self.cfg.union_size;
        RectI {
            x: slot_left + (self.cfg.max_node_w() - size.w) / 2,
            y: self.center_y - size.h / 2 + generation * self.cfg.generation_gap,
            w: size.w,
            h: size.h,
        }
    }
}

/// A person and, if shown, the union they were born into with its partners.
///
/// The block spans `slots` columns: the first parent's block, the person's
/// own column (where their parents' marker sits) and the second parent's
/// block, so the person's column is `left_slots` from the block's left edge.
struct AncestorBlock<'g> {
    person: &'g Person,
    parent_union: Option<&'g Union>,
    parents: Vec<AncestorBlock<'g>>,
    left_slots: i32,
    slots: i32,
}

fn build_ancestors<'g>(
    graph: &'g FamilyGraph,
    person: &'g Person,
    generations: u32,
    placed: &mut HashSet<&'g str>,
) -> AncestorBlock<'g> {
    let mut block = AncestorBlock { person, parent_union: None, parents: Vec::new(), left_slots: 0, slots: 1 };
    if generations == 0 {
        return block;
    }
    let Some(union) = parent_union(graph, &person.id) else {
        return block;
    };
    if !placed.insert(union.id.as_str()) {
        return block;
    }

    for partner in union.partners() {
        let Some(parent) = graph.person(partner) else { continue };
        if placed.insert(parent.id.as_str()) {
            block.parents.push(build_ancestors(graph, parent, generations - 1, placed));
        }
    }
    block.parent_union = Some(union);
    block.left_slots = block.parents.first().map_or(0, |p| p.slots);
    block.slots = block.parents.iter().map(|p| p.slots).sum::<i32>() + 1;
    block
}

/// Place `block.person`'s parents one row above `generation`. The marker
/// sits straight above the person's column (`column`), the first parent's
/// block ends just left of it and the second parent's block starts just
/// right of it.
fn place_ancestors(grid: &Grid, block: &AncestorBlock<'_>, column: i32, generation: i32, layout: &mut FamilyLayout) {
    let Some(union) = block.parent_union else { return };
    let row = generation - 1;

    layout.push_node(LayoutNode::union(union, grid.union_rect(column, row), row));
    layout.push_edge(EdgeKind::Child, union.id.as_str(), block.person.id.as_str());

    let mut parents = block.parents.iter();
    if let Some(first) = parents.next() {
        let block_left = column - first.slots * grid.slot;
        place_parent(grid, first, block_left + first.left_slots * grid.slot, row, union, layout);
    }
    if let Some(second) = parents.next() {
        let block_left = column + grid.slot;
        place_parent(grid, second, block_left + second.left_slots * grid.slot, row, union, layout);
    }
}

fn place_parent(
    grid: &Grid,
    parent: &AncestorBlock<'_>,
    column: i32,
    row: i32,
    union: &Union,
    layout: &mut FamilyLayout,
) {
    layout.push_node(LayoutNode::person(parent.person, grid.person_rect(column, row), row));
    layout.push_edge(EdgeKind::Spouse, parent.person.id.as_str(), union.id.as_str());
    place_ancestors(grid, parent, column, row, layout);
}

pub fn compute_pedigree_layout(
    graph: &FamilyGraph,
    focus: &PersonId,
    opts: &PedigreeOptions,
    cfg: &LayoutConfig,
) -> FamilyLayout {
    let mut layout = FamilyLayout::default();
    let Some(focus_person) = graph.person(focus) else {
        warn!("pedigree layout: focus person '{}' not found", focus);
        return layout;
    };

    let grid = Grid::new(cfg, opts.center);
    let mut placed: HashSet<&str> = HashSet::from([focus_person.id.as_str()]);

    // 1. Focus
    layout.push_node(LayoutNode::person(focus_person, grid.person_rect(grid.slot_left(0), 0), 0));

    // 2. Ancestors (claimed before spouses/children so a person reachable both
    //    ways in bad data shows up as an ancestor)
    let generations = if opts.show_grandparents { 2 } else { 1 };
    let ancestors = build_ancestors(graph, focus_person, generations, &mut placed);

    // 3. Unions and spouses on the focus row
    let mut markers: Vec<(&Union, i32)> = Vec::new();
    for (i, union) in unions_of(graph, focus).into_iter().enumerate() {
        if !placed.insert(union.id.as_str()) {
            continue;
        }
        let side = if i % 2 == 0 { 1 } else { -1 };
        let ring = (i / 2) as i32;
        let marker = grid.slot_left(side * (2 * ring + 1));
        layout.push_node(LayoutNode::union(union, grid.union_rect(marker, 0), 0));
        layout.push_edge(EdgeKind::Spouse, focus.as_str(), union.id.as_str());

        if let Some(spouse) = get_spouse_id(union, focus).and_then(|s| graph.person(&s)) {
            if placed.insert(spouse.id.as_str()) {
                let column = grid.slot_left(side * (2 * ring + 2));
                layout.push_node(LayoutNode::person(spouse, grid.person_rect(column, 0), 0));
            }
            layout.push_edge(EdgeKind::Spouse, spouse.id.as_str(), union.id.as_str());
        }
        markers.push((union, marker));
    }

    place_ancestors(&grid, &ancestors, grid.slot_left(0), 0, &mut layout);

    // 4. Children
    if opts.show_children {
        place_children(graph, &grid, &markers, &mut placed, &mut layout);
    }

    debug!(
        "pedigree layout for '{}': {} nodes, {} edges",
        focus,
        layout.nodes.len(),
        layout.edges.len()
    );
    layout
}

fn place_children<'g>(
    graph: &'g FamilyGraph,
    grid: &Grid,
    markers: &[(&'g Union, i32)],
    placed: &mut HashSet<&'g str>,
    layout: &mut FamilyLayout,
) {
    struct Block<'g> {
        children: Vec<&'g Person>,
        ideal: i32,
    }

    let mut ordered: Vec<&(&Union, i32)> = markers.iter().collect();
    ordered.sort_by_key(|(_, marker)| *marker);

    let mut blocks: Vec<Block<'g>> = Vec::new();
    for (union, marker) in ordered {
        let children: Vec<&Person> = union
            .child_ids
            .iter()
            .filter_map(|c| graph.person(c))
            .filter(|c| placed.insert(c.id.as_str()))
            .collect();
        if children.is_empty() {
            continue;
        }
        let ideal = grid.block_left(*marker, children.len() as i32);
        blocks.push(Block { children, ideal });
    }

    // Sweep: push each block right of the previous one
    let mut lefts: Vec<i32> = Vec::with_capacity(blocks.len());
    let mut cursor = i32::MIN;
    for b in &blocks {
        let left = b.ideal.max(cursor);
        cursor = left + b.children.len() as i32 * grid.slot;
        lefts.push(left);
    }

    // Re-center the row on where it wanted to be
    if let (Some(first), Some(last)) = (blocks.first(), blocks.last()) {
        let width = |b: &Block<'_>| b.children.len() as i32 * grid.slot;
        let ideal_span = first.ideal + last.ideal + width(last);
        let actual_span = lefts[0] + lefts[lefts.len() - 1] + width(last);
        let shift = (actual_span - ideal_span) / 2;
        for left in &mut lefts {
            *left -= shift;
        }
    }

    for (b, left) in blocks.iter().zip(lefts) {
        for (j, child) in b.children.iter().enumerate() {
            let column = left + j as i32 * grid.slot;
            layout.push_node(LayoutNode::person(child, grid.person_rect(column, 1), 1));
        }
    }

    // A child listed under several of the focus's unions is drawn once but
    // connected to every one of them
    for (union, _) in markers {
        for c in &union.child_ids {
            if layout.node(c.as_str()).is_some_and(|n| n.generation == 1) {
                layout.push_edge(EdgeKind::Child, union.id.as_str(), c.as_str());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::test_support::{assert_no_row_overlap, graph, union};
    use crate::output::NodeKind;
    use proptest::prelude::*;

    fn opts(show_grandparents: bool, show_children: bool) -> PedigreeOptions {
        PedigreeOptions { show_grandparents, show_children, center: PointI { x: 0, y: 0 } }
    }

    /// focus "f" with parents "p1"/"p2" and `n` children with spouse "s".
    fn family_with_children(n: usize) -> FamilyGraph {
        let kids: Vec<String> = (0..n).map(|i| format!("k{}", i)).collect();
        let kid_refs: Vec<&str> = kids.iter().map(|s| s.as_str()).collect();
        let mut people = vec!["f", "p1", "p2", "s"];
        people.extend(kid_refs.iter().copied());
        graph(
            &people,
            vec![union("up", Some("p1"), Some("p2"), &["f"]), union("uf", Some("f"), Some("s"), &kid_refs)],
        )
    }

    #[test]
    fn test_focus_centered() {
        let g = family_with_children(0);
        let cfg = LayoutConfig::default();
        let o = PedigreeOptions { center: PointI { x: 500, y: 300 }, ..opts(false, true) };
        let layout = compute_pedigree_layout(&g, &"f".into(), &o, &cfg);
        assert_eq!(layout.node("f").unwrap().bounds.center(), PointI { x: 500, y: 300 });
    }

    #[test]
    fn test_marker_between_focus_and_spouse() {
        let g = family_with_children(0);
        let layout = compute_pedigree_layout(&g, &"f".into(), &opts(false, false), &LayoutConfig::default());
        let f = layout.node("f").unwrap().bounds.center().x;
        let s = layout.node("s").unwrap().bounds.center().x;
        let m = layout.node("uf").unwrap();
        assert_eq!(m.kind, NodeKind::Union);
        assert_eq!(m.bounds.center().x, (f + s) / 2);
        assert!(s > f);

        // Spouses connect through the marker only
        assert!(layout.edges.iter().any(|e| e.source == "f" && e.target == "uf"));
        assert!(layout.edges.iter().any(|e| e.source == "s" && e.target == "uf"));
        let direct = |a: &str, b: &str| layout.edges.iter().any(|e| e.source == a && e.target == b);
        assert!(!direct("f", "s") && !direct("s", "f"));
    }

    #[test]
    fn test_parents_triangle() {
        let g = family_with_children(0);
        let layout = compute_pedigree_layout(&g, &"f".into(), &opts(false, false), &LayoutConfig::default());
        let row: Vec<&str> = layout.generation(-1).iter().map(|n| n.id.as_str()).collect();
        assert_eq!(row, vec!["p1", "up", "p2"]);

        let marker = layout.node("up").unwrap().bounds.center().x;
        assert_eq!(marker, layout.node("f").unwrap().bounds.center().x);
        assert!(layout.edges.iter().any(|e| e.source == "p1" && e.target == "up" && e.kind == EdgeKind::Spouse));
        assert!(layout.edges.iter().any(|e| e.source == "p2" && e.target == "up"));
        assert!(layout.edges.iter().any(|e| e.source == "up" && e.target == "f" && e.kind == EdgeKind::Child));
    }

    #[test]
    fn test_children_hidden_when_disabled() {
        let g = family_with_children(3);
        let layout = compute_pedigree_layout(&g, &"f".into(), &opts(false, false), &LayoutConfig::default());
        assert!(layout.generation(1).is_empty());
        assert!(!layout.edges.iter().any(|e| e.kind == EdgeKind::Child && e.source == "uf"));
    }

    #[test]
    fn test_children_centered_under_marker() {
        let g = family_with_children(4);
        let layout = compute_pedigree_layout(&g, &"f".into(), &opts(false, true), &LayoutConfig::default());
        let row = layout.generation(1);
        assert_eq!(row.len(), 4);
        let lo = row.iter().map(|n| n.bounds.x).min().unwrap();
        let hi = row.iter().map(|n| n.bounds.right()).max().unwrap();
        let marker = layout.node("uf").unwrap().bounds.center().x;
        assert!(((lo + hi) / 2 - marker).abs() <= 1);
        assert_eq!(layout.edges.iter().filter(|e| e.source == "uf" && e.kind == EdgeKind::Child).count(), 4);
    }

    #[test]
    fn test_no_overlap_for_child_counts_0_to_10() {
        let cfg = LayoutConfig::default();
        for n in 0..=10 {
            let g = family_with_children(n);
            let layout = compute_pedigree_layout(&g, &"f".into(), &opts(true, true), &cfg);
            assert_eq!(layout.generation(1).len(), n);
            assert_no_row_overlap(&layout, cfg.gutter);
        }
    }

    #[test]
    fn test_multiple_unions_alternate_sides() {
        let g = graph(
            &["f", "s1", "s2", "s3", "a", "b", "c"],
            vec![
                union("u1", Some("f"), Some("s1"), &["a", "b"]),
                union("u2", Some("s2"), Some("f"), &["c"]),
                union("u3", Some("f"), Some("s3"), &[]),
            ],
        );
        let cfg = LayoutConfig::default();
        let layout = compute_pedigree_layout(&g, &"f".into(), &opts(false, true), &cfg);
        let x = |id: &str| layout.node(id).unwrap().bounds.center().x;
        assert!(x("s1") > x("f"));
        assert!(x("s2") < x("f"));
        assert!(x("s3") > x("s1"));
        assert_no_row_overlap(&layout, cfg.gutter);
    }

    #[test]
    fn test_grandparents_over_parent_columns() {
        let g = graph(
            &["f", "p1", "p2", "g1", "g2", "g3", "g4"],
            vec![
                union("up", Some("p1"), Some("p2"), &["f"]),
                union("ug1", Some("g1"), Some("g2"), &["p1"]),
                union("ug2", Some("g3"), Some("g4"), &["p2"]),
            ],
        );
        let cfg = LayoutConfig::default();
        let without = compute_pedigree_layout(&g, &"f".into(), &opts(false, false), &cfg);
        assert!(without.generation(-2).is_empty());

        let layout = compute_pedigree_layout(&g, &"f".into(), &opts(true, false), &cfg);
        let x = |id: &str| layout.node(id).unwrap().bounds.center().x;
        assert_eq!(x("ug1"), x("p1"));
        assert_eq!(x("ug2"), x("p2"));
        assert!(x("g2") < x("g3"));
        assert_eq!(layout.generation(-2).len(), 6);
        assert_no_row_overlap(&layout, cfg.gutter);
    }

    #[test]
    fn test_one_sided_grandparents_keep_marker_over_focus() {
        let g = graph(
            &["f", "p1", "p2", "g1", "g2"],
            vec![union("up", Some("p1"), Some("p2"), &["f"]), union("ug", Some("g1"), Some("g2"), &["p1"])],
        );
        let cfg = LayoutConfig::default();
        let slot = cfg.slot();
        let layout = compute_pedigree_layout(&g, &"f".into(), &opts(true, false), &cfg);
        let x = |id: &str| layout.node(id).unwrap().bounds.center().x;

        assert_eq!(x("up"), x("f"));
        // p1's block is [g1][ug][g2], ending one slot left of the marker
        assert_eq!(x("p1"), x("f") - 2 * slot);
        assert_eq!(x("p2"), x("f") + slot);
        assert_eq!(x("ug"), x("p1"));
        assert_eq!(x("g1"), x("p1") - slot);
        assert_eq!(x("g2"), x("f") - slot);
        assert_no_row_overlap(&layout, cfg.gutter);
    }

    #[test]
    fn test_second_parent_grandparents_stay_right_of_marker() {
        let g = graph(
            &["f", "p1", "p2", "g3", "g4"],
            vec![union("up", Some("p1"), Some("p2"), &["f"]), union("ug", Some("g3"), Some("g4"), &["p2"])],
        );
        let cfg = LayoutConfig::default();
        let slot = cfg.slot();
        let layout = compute_pedigree_layout(&g, &"f".into(), &opts(true, false), &cfg);
        let x = |id: &str| layout.node(id).unwrap().bounds.center().x;

        assert_eq!(x("up"), x("f"));
        assert_eq!(x("p1"), x("f") - slot);
        // p2's block is [g3][ug][g4] starting one slot right of the marker
        assert_eq!(x("p2"), x("f") + 2 * slot);
        assert_eq!(x("g3"), x("f") + slot);
        assert_eq!(x("ug"), x("p2"));
        assert_no_row_overlap(&layout, cfg.gutter);
    }

    #[test]
    fn test_cyclic_ancestry_terminates() {
        // a is b's parent and b is a's parent
        let g = graph(&["a", "b"], vec![union("u1", Some("a"), None, &["b"]), union("u2", Some("b"), None, &["a"])]);
        let layout = compute_pedigree_layout(&g, &"a".into(), &opts(true, true), &LayoutConfig::default());
        let ids: HashSet<&str> = layout.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids.len(), layout.nodes.len());
    }

    #[test]
    fn test_missing_focus_is_empty() {
        let g = family_with_children(2);
        let defaults = PedigreeOptions::default();
        let layout = compute_pedigree_layout(&g, &"nobody".into(), &defaults, &LayoutConfig::default());
        assert!(layout.nodes.is_empty());
        assert!(layout.edges.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let g = family_with_children(5);
        let cfg = LayoutConfig::default();
        let a = compute_pedigree_layout(&g, &"f".into(), &opts(true, true), &cfg);
        let b = compute_pedigree_layout(&g, &"f".into(), &opts(true, true), &cfg);
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn prop_no_overlap_many_unions(
            counts in proptest::collection::vec(0usize..6, 1..5),
            gutter in 0i32..60,
            person_w in 20i32..200,
        ) {
            let mut people = vec!["f".to_string()];
            let mut unions = Vec::new();
            for (i, n) in counts.iter().enumerate() {
                let spouse = format!("s{}", i);
                people.push(spouse.clone());
                let kids: Vec<String> = (0..*n).map(|k| format!("k{}_{}", i, k)).collect();
                people.extend(kids.iter().cloned());
                let kid_refs: Vec<&str> = kids.iter().map(|s| s.as_str()).collect();
                unions.push(union(&format!("u{}", i), Some("f"), Some(spouse.as_str()), &kid_refs));
            }
            let people_refs: Vec<&str> = people.iter().map(|s| s.as_str()).collect();
            let g = graph(&people_refs, unions);
            let cfg = LayoutConfig {
                gutter,
                person_size: crate::layout::SizeI { w: person_w, h: 60 },
                ..LayoutConfig::default()
            };
            let layout = compute_pedigree_layout(&g, &"f".into(), &opts(true, true), &cfg);
            assert_no_row_overlap(&layout, cfg.gutter);
        }
    }
}
