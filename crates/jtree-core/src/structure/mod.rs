//! Compilation of a network into a junction forest.
//!
//! moralize -> triangulate -> maximal cliques -> maximum-weight spanning forest

pub mod cliques;
pub mod graph;
pub mod junction;
pub mod moral;
pub mod triangulate;
