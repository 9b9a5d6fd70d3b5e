//! Fresar — CAM settings persistence.
//!
//! Layered default inheritance. Ordinal cross-references. Toolpath
//! provenance stamping. One human-editable text format in, the same
//! format back out.

pub mod cli;
pub mod core;
pub mod toolpath;
