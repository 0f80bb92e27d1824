//! Dependency graph for a single scheduling request.

pub mod dependency_graph;

pub use dependency_graph::{DanglingReference, DependencyGraph};
