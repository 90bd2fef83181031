// Descendants layout: a top-down tree rooted at the focus person.
//
// Three passes:
// 1. build: depth-first tree of person -> unions -> children, with one
//    visited set for the whole call (each person/union appears at most once)
//    and silent truncation at max_depth
// 2. measure: bottom-up subtree widths
//        row(person)   = person + per union (marker [+ spouse]), gutters between
//        width(person) = max(row, sum(children blocks) + gutters)
// 3. place: top-down; every subtree owns the span [left, left + width) and
//    everything below it stays inside that span, so sibling subtrees can't
//    overlap.
//
// Spouses alternate right/left of the person like in the pedigree view:
//
//     S1 M1 [P] M0 S0 M2 S2

use std::collections::HashSet;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::graph::{get_spouse_id, unions_of, FamilyGraph, Person, PersonId, Union};
use crate::layout::{LayoutConfig, PointI, RectI};
use crate::output::{EdgeKind, FamilyLayout, LayoutNode};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DescendantsOptions {
    /// Where the root person's card is centered.
    pub start: PointI,
    /// Generations below the root to include.
    pub max_depth: u32,
}

impl Default for DescendantsOptions {
    fn default() -> Self {
        Self { start: PointI { x: 0, y: 0 }, max_depth: 4 }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

struct Subtree<'g> {
    person: &'g Person,
    branches: Vec<Branch<'g>>,
    row_width: i32,
    width: i32,
}

struct Branch<'g> {
    union: &'g Union,
    spouse: Option<&'g Person>,
    children: Vec<Subtree<'g>>,
    side: Side,
    children_width: i32,
}

fn build<'g>(
    graph: &'g FamilyGraph,
    person: &'g Person,
    depth: u32,
    max_depth: u32,
    visited: &mut HashSet<&'g str>,
) -> Subtree<'g> {
    let mut branches: Vec<Branch<'g>> = Vec::new();
    for union in unions_of(graph, &person.id) {
        if !visited.insert(union.id.as_str()) {
            continue;
        }
        let spouse = get_spouse_id(union, &person.id)
            .and_then(|s| graph.person(&s))
            .filter(|s| visited.insert(s.id.as_str()));

        let mut children = Vec::new();
        if depth < max_depth {
            for c in &union.child_ids {
                let Some(child) = graph.person(c) else { continue };
                if visited.insert(child.id.as_str()) {
                    children.push(build(graph, child, depth + 1, max_depth, visited));
                }
            }
        }

        // Nothing to draw for a union with no spouse and no children
        if spouse.is_none() && children.is_empty() {
            continue;
        }
        let side = if branches.len() % 2 == 0 { Side::Right } else { Side::Left };
        branches.push(Branch { union, spouse, children, side, children_width: 0 });
    }
    Subtree { person, branches, row_width: 0, width: 0 }
}

fn measure(tree: &mut Subtree<'_>, cfg: &LayoutConfig) {
    let gutter = cfg.gutter;
    let mut row = cfg.person_size.w;
    let mut blocks = Vec::new();

    for branch in &mut tree.branches {
        row = row.saturating_add(gutter + cfg.union_size.w);
        if branch.spouse.is_some() {
            row = row.saturating_add(gutter + cfg.person_size.w);
        }
        for child in &mut branch.children {
            measure(child, cfg);
        }
        branch.children_width = packed_width(branch.children.iter().map(|c| c.width), gutter);
        if !branch.children.is_empty() {
            blocks.push(branch.children_width);
        }
    }

    tree.row_width = row;
    tree.width = row.max(packed_width(blocks.into_iter(), gutter));
}

/// Total width of items laid side by side with one gutter between each.
/// Saturates at `i32::MAX`.
fn packed_width(widths: impl Iterator<Item = i32>, gutter: i32) -> i32 {
    widths
        .enumerate()
        .fold(0i32, |total, (i, w)| {
            let gap = if i == 0 { 0 } else { gutter };
            total.saturating_add(gap).saturating_add(w)
        })
}

fn person_rect(cfg: &LayoutConfig, x: i32, depth: i32) -> RectI {
    RectI { x, y: depth * cfg.generation_gap, w: cfg.person_size.w, h: cfg.person_size.h }
}

fn union_rect(cfg: &LayoutConfig, x: i32, depth: i32) -> RectI {
    let size = cfg.union_size;
    RectI {
        x,
        y: depth * cfg.generation_gap + (cfg.person_size.h - size.h) / 2,
        w: size.w,
        h: size.h,
    }
}

fn place(tree: &Subtree<'_>, left: i32, depth: i32, cfg: &LayoutConfig, layout: &mut FamilyLayout) {
    let gutter = cfg.gutter;
    let (pw, uw) = (cfg.person_size.w, cfg.union_size.w);
    let person_id = tree.person.id.as_str();

    // Row, left to right: outermost left branch first
    let left_side: Vec<&Branch<'_>> = tree.branches.iter().filter(|b| b.side == Side::Left).collect();
    let right_side: Vec<&Branch<'_>> = tree.branches.iter().filter(|b| b.side == Side::Right).collect();

    let mut cursor = left + (tree.width - tree.row_width) / 2;
    let mut row_order: Vec<(&Branch<'_>, i32)> = Vec::with_capacity(tree.branches.len());

    for branch in left_side.iter().rev() {
        if let Some(spouse) = branch.spouse {
            layout.push_node(LayoutNode::person(spouse, person_rect(cfg, cursor, depth), depth));
            cursor += pw + gutter;
        }
        let marker = union_rect(cfg, cursor, depth);
        layout.push_node(LayoutNode::union(branch.union, marker, depth));
        row_order.push((*branch, marker.center().x));
        cursor += uw + gutter;
    }

    layout.push_node(LayoutNode::person(tree.person, person_rect(cfg, cursor, depth), depth));
    cursor += pw + gutter;

    for branch in &right_side {
        let marker = union_rect(cfg, cursor, depth);
        layout.push_node(LayoutNode::union(branch.union, marker, depth));
        row_order.push((*branch, marker.center().x));
        cursor += uw + gutter;
        if let Some(spouse) = branch.spouse {
            layout.push_node(LayoutNode::person(spouse, person_rect(cfg, cursor, depth), depth));
            cursor += pw + gutter;
        }
    }

    for (branch, _) in &row_order {
        let union_id = branch.union.id.as_str();
        layout.push_edge(EdgeKind::Spouse, person_id, union_id);
        if let Some(spouse) = branch.spouse {
            layout.push_edge(EdgeKind::Spouse, spouse.id.as_str(), union_id);
        }
    }

    // Children blocks: centered under their marker where there's room,
    // clamped into [left, left + width) without overlapping each other
    let blocks: Vec<(&Branch<'_>, i32)> = row_order
        .iter()
        .filter(|(b, _)| !b.children.is_empty())
        .map(|(b, marker_x)| (*b, marker_x - b.children_width / 2))
        .collect();

    let mut lefts: Vec<i32> = Vec::with_capacity(blocks.len());
    let mut min_left = left;
    for (branch, ideal) in &blocks {
        let l = (*ideal).max(min_left);
        min_left = l + branch.children_width + gutter;
        lefts.push(l);
    }
    let mut max_right = left + tree.width;
    for ((branch, _), l) in blocks.iter().zip(lefts.iter_mut()).rev() {
        *l = (*l).min(max_right - branch.children_width);
        max_right = *l - gutter;
    }

    for ((branch, _), l) in blocks.iter().zip(lefts) {
        let mut x = l;
        for child in &branch.children {
            place(child, x, depth + 1, cfg, layout);
            layout.push_edge(EdgeKind::Child, branch.union.id.as_str(), child.person.id.as_str());
            x += child.width + gutter;
        }
    }
}

pub fn compute_descendants_layout(
    graph: &FamilyGraph,
    focus: &PersonId,
    opts: &DescendantsOptions,
    cfg: &LayoutConfig,
) -> FamilyLayout {
    let mut layout = FamilyLayout::default();
    let Some(root) = graph.person(focus) else {
        warn!("descendants layout: focus person '{}' not found", focus);
        return layout;
    };

    let cfg = cfg.normalized();
    let mut visited: HashSet<&str> = HashSet::from([root.id.as_str()]);
    let mut tree = build(graph, root, 0, opts.max_depth, &mut visited);
    measure(&mut tree, &cfg);
    place(&tree, 0, 0, &cfg, &mut layout);

    if let Some(center) = layout.node(root.id.as_str()).map(|n| n.bounds.center()) {
        layout.translate(opts.start.x - center.x, opts.start.y - center.y);
    }

    debug!(
        "descendants layout for '{}': width {}, {} nodes, {} edges",
        focus,
        tree.width,
        layout.nodes.len(),
        layout.edges.len()
    );
    layout
}
