// Family tree layouts.
//
// Goals:
// - Deterministic: no randomness, no iteration budgets, store order decides ties
// - Positionless in, positioned out: the graph never stores coordinates
// - No overlap within a generation, by construction of the spacing arithmetic
//   (there is no post-hoc overlap fixing)
//
// Submodules:
// - pedigree: focus in the middle, ancestors above, children below
// - descendants: top-down tree rooted at the focus
//
// Output:
// - FamilyLayout (see crate::output) with node bounds in world coordinates.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::graph::{FamilyGraph, PersonId};
use crate::output::FamilyLayout;

mod descendants;
mod pedigree;

pub use descendants::{compute_descendants_layout, DescendantsOptions};
pub use pedigree::{compute_pedigree_layout, PedigreeOptions};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PointI {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeI {
    pub w: i32,
    pub h: i32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectI {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl RectI {
    pub fn right(&self) -> i32 { self.x + self.w }
    pub fn bottom(&self) -> i32 { self.y + self.h }

    pub fn center(&self) -> PointI {
        PointI { x: self.x + self.w / 2, y: self.y + self.h / 2 }
    }

    pub fn overlaps(&self, other: &RectI) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    pub fn union(&self, other: &RectI) -> RectI {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        RectI { x: x0, y: y0, w: x1 - x0, h: y1 - y0 }
    }

    pub fn translated(&self, dx: i32, dy: i32) -> RectI {
        RectI { x: self.x.saturating_add(dx), y: self.y.saturating_add(dy), ..*self }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Size of a person card.
    pub person_size: SizeI,
    /// Size of a union marker.
    pub union_size: SizeI,
    /// Minimum horizontal space between neighbouring nodes in a row.
    pub gutter: i32,
    /// Vertical distance between the tops of consecutive generations.
    pub generation_gap: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            person_size: SizeI { w: 160, h: 72 },
            union_size: SizeI { w: 20, h: 20 },
            gutter: 40,
            generation_gap: 160,
        }
    }
}

/// Largest node size, gutter or generation gap a layout will use.
pub const MAX_EXTENT: i32 = 10_000;

impl LayoutConfig {
    /// Clamp every value into `0..=MAX_EXTENT` (sizes at least 1) so the
    /// spacing arithmetic stays valid for any deserialized config.
    pub fn normalized(&self) -> LayoutConfig {
        let size = |s: SizeI| SizeI { w: s.w.clamp(1, MAX_EXTENT), h: s.h.clamp(1, MAX_EXTENT) };
        let person_size = size(self.person_size);
        let union_size = size(self.union_size);
        let tallest = person_size.h.max(union_size.h);
        LayoutConfig {
            person_size,
            union_size,
            gutter: self.gutter.clamp(0, MAX_EXTENT),
            generation_gap: self.generation_gap.clamp(tallest, MAX_EXTENT),
        }
    }

    /// Widest node in a row; every grid slot has room for it.
    pub(crate) fn max_node_w(&self) -> i32 {
        self.person_size.w.max(self.union_size.w)
    }

    /// Pedigree grid slot: widest node plus one gutter.
    pub(crate) fn slot(&self) -> i32 {
        self.max_node_w() + self.gutter
    }
}

/// A layout algorithm over a family graph, seen from one focus person.
pub trait LayoutEngine {
    fn layout(&self, graph: &FamilyGraph, focus: &PersonId, cfg: &LayoutConfig) -> FamilyLayout;
}

impl LayoutEngine for PedigreeOptions {
    fn layout(&self, graph: &FamilyGraph, focus: &PersonId, cfg: &LayoutConfig) -> FamilyLayout {
        compute_pedigree_layout(graph, focus, self, cfg)
    }
}

impl LayoutEngine for DescendantsOptions {
    fn layout(&self, graph: &FamilyGraph, focus: &PersonId, cfg: &LayoutConfig) -> FamilyLayout {
        compute_descendants_layout(graph, focus, self, cfg)
    }
}

/// Chart types the UI can switch between.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Pedigree,
    Descendants,
}

impl FromStr for View {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pedigree" => Ok(View::Pedigree),
            "descendants" => Ok(View::Descendants),
            other => Err(Error::UnknownView(other.to_string())),
        }
    }
}
