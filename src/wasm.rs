//! WASM bindings for the lineage-core library.
//!
//! All functions exposed to JavaScript via wasm-bindgen are defined here.
//! Every entry point takes and returns JSON strings; failures come back as
//! `{"error": "..."}`.

use log::{error, Level, LevelFilter, Log, Metadata, Record};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use wasm_bindgen::prelude::*;

use crate::date::{format_date, parse_date_string, resolve_offset, DateValue};
use crate::error::Result;
use crate::graph::{
    add_child_to_union, add_person, add_person_with_id, add_union, eligible_parents, get_ancestors, get_children,
    get_descendants, get_parents, get_siblings, remove_child_from_union, remove_person, remove_union, update_person,
    update_union, FamilyGraph, PersonId, PersonPatch, UnionId, UnionPatch,
};
use crate::layout::{DescendantsOptions, LayoutConfig, LayoutEngine, PedigreeOptions, View};
use crate::migrate::migrate_to_new_format;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = log)]
    pub fn console_log(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = error)]
    pub fn console_error(s: &str);
}

/// `log` backend writing to the browser console.
struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("[{}] {}: {}", record.level(), record.target(), record.args());
        if record.level() <= Level::Warn {
            console_error(&line);
        } else {
            console_log(&line);
        }
    }

    fn flush(&self) {}
}

/// Route `log` output to the console. Calling it again only changes the level.
#[wasm_bindgen]
pub fn init_logging(level: &str) {
    // Already installed on repeat calls
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(parse_level(level));
}

fn parse_level(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::Info)
}

/// Options and config objects: an empty string means defaults.
fn from_json_or_default<T: DeserializeOwned + Default>(json: &str) -> Result<T> {
    if json.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_json::from_str(json)?)
}

/// Relational or legacy graph JSON, migrated on the way in.
fn graph_from_json(json: &str) -> Result<FamilyGraph> {
    let value: Value = serde_json::from_str(json)?;
    Ok(migrate_to_new_format(&value))
}

fn respond(result: Result<String>) -> String {
    result.unwrap_or_else(|e| {
        error!("{}", e);
        json!({ "error": e.to_string() }).to_string()
    })
}

fn layout_json(
    graph_json: &str,
    focus_id: &str,
    view: View,
    options_json: &str,
    config_json: &str,
) -> Result<String> {
    let graph = graph_from_json(graph_json)?;
    let cfg: LayoutConfig = from_json_or_default(config_json)?;
    let focus = PersonId::from(focus_id);
    let layout = match view {
        View::Pedigree => {
            let opts: PedigreeOptions = from_json_or_default(options_json)?;
            opts.layout(&graph, &focus, &cfg)
        }
        View::Descendants => {
            let opts: DescendantsOptions = from_json_or_default(options_json)?;
            opts.layout(&graph, &focus, &cfg)
        }
    };
    Ok(serde_json::to_string(&layout)?)
}

#[wasm_bindgen]
pub fn pedigree_layout(graph_json: &str, focus_id: &str, options_json: &str, config_json: &str) -> String {
    respond(layout_json(graph_json, focus_id, View::Pedigree, options_json, config_json))
}

#[wasm_bindgen]
pub fn descendants_layout(graph_json: &str, focus_id: &str, options_json: &str, config_json: &str) -> String {
    respond(layout_json(graph_json, focus_id, View::Descendants, options_json, config_json))
}

/// Lay out the view named by `view` ("pedigree" or "descendants").
#[wasm_bindgen]
pub fn layout_family(
    graph_json: &str,
    focus_id: &str,
    view: &str,
    options_json: &str,
    config_json: &str,
) -> String {
    respond(
        view.parse::<View>()
            .and_then(|view| layout_json(graph_json, focus_id, view, options_json, config_json)),
    )
}

// Resolvers: (graph, person id) -> JSON array of person ids. Forms call
// these on demand, e.g. `eligible_parents_of` fills a "select father"
// dropdown without the person's own descendants.

fn query(graph_json: &str, person_id: &str, resolve: fn(&FamilyGraph, &PersonId) -> Vec<PersonId>) -> String {
    respond(graph_from_json(graph_json).and_then(|graph| {
        let ids = resolve(&graph, &PersonId::from(person_id));
        Ok(serde_json::to_string(&ids)?)
    }))
}

#[wasm_bindgen]
pub fn parents_of(graph_json: &str, person_id: &str) -> String {
    query(graph_json, person_id, get_parents)
}

#[wasm_bindgen]
pub fn children_of(graph_json: &str, person_id: &str) -> String {
    query(graph_json, person_id, get_children)
}

#[wasm_bindgen]
pub fn siblings_of(graph_json: &str, person_id: &str) -> String {
    query(graph_json, person_id, get_siblings)
}

#[wasm_bindgen]
pub fn ancestors_of(graph_json: &str, person_id: &str) -> String {
    query(graph_json, person_id, get_ancestors)
}

#[wasm_bindgen]
pub fn descendants_of(graph_json: &str, person_id: &str) -> String {
    query(graph_json, person_id, get_descendants)
}

#[wasm_bindgen]
pub fn eligible_parents_of(graph_json: &str, person_id: &str) -> String {
    query(graph_json, person_id, eligible_parents)
}

// Edits: the graph comes back as JSON, adds come back as `{graph, id}`.
// Contract violations (unknown ids, same partner twice, ...) come back as
// `{"error": ...}` with the graph left as it was.

#[derive(Serialize)]
struct Added<'a, I> {
    graph: &'a FamilyGraph,
    id: &'a I,
}

fn edit(graph_json: &str, apply: impl FnOnce(&FamilyGraph) -> Result<FamilyGraph>) -> String {
    respond(graph_from_json(graph_json).and_then(|graph| Ok(serde_json::to_string(&apply(&graph)?)?)))
}

fn add<I: Serialize>(graph_json: &str, apply: impl FnOnce(&FamilyGraph) -> Result<(FamilyGraph, I)>) -> String {
    respond(graph_from_json(graph_json).and_then(|graph| {
        let (graph, id) = apply(&graph)?;
        Ok(serde_json::to_string(&Added { graph: &graph, id: &id })?)
    }))
}

/// Blank means "no partner".
fn partner(id: &str) -> Option<PersonId> {
    let id = id.trim();
    (!id.is_empty()).then(|| PersonId::from(id))
}

/// Add a person; `attrs_json` is a person patch (may be empty). A blank
/// `id` gets a generated one.
#[wasm_bindgen]
pub fn add_person_json(graph_json: &str, id: &str, attrs_json: &str) -> String {
    add(graph_json, |graph| {
        let attrs: PersonPatch = from_json_or_default(attrs_json)?;
        if id.trim().is_empty() {
            Ok(add_person(graph, attrs))
        } else {
            Ok(add_person_with_id(graph, id.trim(), attrs)?)
        }
    })
}

#[wasm_bindgen]
pub fn update_person_json(graph_json: &str, person_id: &str, patch_json: &str) -> String {
    edit(graph_json, |graph| {
        let patch: PersonPatch = from_json_or_default(patch_json)?;
        Ok(update_person(graph, &PersonId::from(person_id), patch)?)
    })
}

#[wasm_bindgen]
pub fn remove_person_json(graph_json: &str, person_id: &str) -> String {
    edit(graph_json, |graph| Ok(remove_person(graph, &PersonId::from(person_id))))
}

/// Add a union between up to two partners (blank for unknown).
#[wasm_bindgen]
pub fn add_union_json(graph_json: &str, partner1_id: &str, partner2_id: &str, attrs_json: &str) -> String {
    add(graph_json, |graph| {
        let attrs: UnionPatch = from_json_or_default(attrs_json)?;
        Ok(add_union(graph, partner(partner1_id), partner(partner2_id), attrs)?)
    })
}

#[wasm_bindgen]
pub fn update_union_json(graph_json: &str, union_id: &str, patch_json: &str) -> String {
    edit(graph_json, |graph| {
        let patch: UnionPatch = from_json_or_default(patch_json)?;
        Ok(update_union(graph, &UnionId::from(union_id), patch)?)
    })
}

#[wasm_bindgen]
pub fn remove_union_json(graph_json: &str, union_id: &str) -> String {
    edit(graph_json, |graph| Ok(remove_union(graph, &UnionId::from(union_id))))
}

#[wasm_bindgen]
pub fn add_child_json(graph_json: &str, union_id: &str, child_id: &str) -> String {
    edit(graph_json, |graph| {
        Ok(add_child_to_union(graph, &UnionId::from(union_id), &PersonId::from(child_id))?)
    })
}

#[wasm_bindgen]
pub fn remove_child_json(graph_json: &str, union_id: &str, child_id: &str) -> String {
    edit(graph_json, |graph| {
        Ok(remove_child_from_union(graph, &UnionId::from(union_id), &PersonId::from(child_id))?)
    })
}

/// Convert persisted graph JSON (either format) to the relational format.
#[wasm_bindgen]
pub fn migrate_graph(json: &str) -> String {
    respond(graph_from_json(json).and_then(|graph| Ok(serde_json::to_string(&graph)?)))
}

#[wasm_bindgen]
pub fn parse_date(text: &str) -> String {
    respond(serde_json::to_string(&parse_date_string(text)).map_err(Into::into))
}

/// Display text for a DateValue, as a JSON string.
#[wasm_bindgen]
pub fn format_date_json(json: &str) -> String {
    respond(
        serde_json::from_str::<DateValue>(json)
            .and_then(|value| serde_json::to_string(&format_date(&value)))
            .map_err(Into::into),
    )
}

/// Apply an offset like "+2d" to a DateValue.
#[wasm_bindgen]
pub fn resolve_offset_date(offset: &str, base_json: &str) -> String {
    respond(
        serde_json::from_str::<DateValue>(base_json)
            .and_then(|base| serde_json::to_string(&resolve_offset(offset, &base)))
            .map_err(Into::into),
    )
}
