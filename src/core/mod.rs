//! Core settings engine — schema, document reader, category store,
//! default-factoring writer, registry, bounds, file persistence.

pub mod bounds;
pub mod document;
pub mod persist;
pub mod registry;
pub mod store;
pub mod types;
pub mod writer;
