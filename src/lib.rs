//! Compiles XSD schemas into a class model and emits Rust binding code.
//!
//! The crate is organized around three parts: the [`xsd`] module holds the
//! schema component graph and its reader, the [`binding`] module the policy
//! deciding how schema constructs map to classes, and the [`generator`]
//! module the traversal engine that walks the graph and hands each resolved
//! class to an emission sink exactly once.

pub mod binding;
pub mod diagnostics;
pub mod generator;
pub mod xsd;
