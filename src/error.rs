//! Error types.
//!
//! Only contract violations on graph mutations are errors. Bad dates,
//! dangling ids and unrecognized migration input all degrade instead.

use thiserror::Error;

use crate::graph::{PersonId, UnionId};

/// A graph mutation that can't be applied as asked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("person '{0}' not found")]
    PersonNotFound(PersonId),

    #[error("union '{0}' not found")]
    UnionNotFound(UnionId),

    #[error("id '{0}' is already in use")]
    DuplicateId(String),

    #[error("person '{0}' cannot be both partners of one union")]
    SamePartner(PersonId),

    #[error("person '{0}' cannot be a child of their own union")]
    SelfParent(PersonId),
}

/// Errors surfaced at the JSON boundary.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown view '{0}'; expected 'pedigree' or 'descendants'")]
    UnknownView(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
