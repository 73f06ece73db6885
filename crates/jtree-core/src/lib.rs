//! # jtree core
//!
//! Exact inference on discrete Bayesian networks with the junction-tree
//! (Hugin) algorithm.
//!
//! A validated [`Network`] is compiled into a junction forest. Every potential
//! the engine touches is a node of one de-duplicated formula graph whose
//! values are memoized, so evidence changes only invalidate cached numbers.
//! Queries over arbitrary variable sets are answered by fusing clique
//! posteriors along the smallest covering subtree.

pub mod engine;
pub mod model;
pub mod potential;
pub mod snapshot;
pub mod structure;

// Re-export commonly used types
pub use engine::config::EngineConfig;
pub use engine::errors::InferenceError;
pub use engine::evidence::{Evidence, Observation};
pub use engine::inference::{CompilationStats, InferenceEngine, VariableMarginal};
pub use model::distribution::{event, Distribution, DistributionDump, DistributionVariable, Event};
pub use model::network::{CptRow, Network, NetworkBuilder, NodeDefinition, ProbabilityTable, VarId};
pub use snapshot::EngineDump;
