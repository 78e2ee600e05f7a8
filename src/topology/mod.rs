//! Top-level module for mesh topology abstractions.
//!
//! This module provides the identifier types, the cell type table and the
//! algorithms that reason about connectivity:
//! - [`ids`]: positional node/face/cell identifiers
//! - [`cell_type`]: element arity and local face tables
//! - [`faces`]: expansion of node-based volume cells into shared faces
//! - [`validation`]: referential and well-formedness checks

pub mod cell_type;
pub mod faces;
pub mod ids;
pub mod validation;

pub use cell_type::CellType;
pub use ids::{CellId, Entity, EntityKind, FaceId, NodeId};

#[cfg(test)]
mod tests;
