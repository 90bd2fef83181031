//! Lineage core: family graph, date grammar and tree layouts.
//!
//! - date: free-text date parsing, formatting and offset resolution
//! - graph: relational people/unions store and relationship queries
//! - layout: pedigree and descendants charts
//! - migrate: legacy canvas graphs to the relational format
//! - wasm: JSON entry points for the web frontend

pub mod date;
pub mod error;
pub mod graph;
pub mod layout;
pub mod migrate;
pub mod output;
pub mod wasm;

pub use date::{format_date, parse_date_string, resolve_offset, DateValue};
pub use error::{Error, GraphError, Result};
pub use graph::{FamilyGraph, Person, PersonId, Union, UnionId};
pub use layout::{
    compute_descendants_layout, compute_pedigree_layout, DescendantsOptions, LayoutConfig, LayoutEngine,
    PedigreeOptions, View,
};
pub use migrate::{migrate_legacy, migrate_to_new_format, LegacyGraph};
pub use output::{FamilyLayout, LayoutEdge, LayoutNode};
