//! Data layer: input/output types and the seen-traces store

pub mod cache;
pub mod types;
