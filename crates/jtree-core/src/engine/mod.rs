//! The inference engine.
//!
//! This module provides:
//! - **errors**: Error type shared by construction, evidence and queries
//! - **config**: Engine configuration
//! - **evidence**: Named evidence assertions and their resolved weights
//! - **propagation**: Hugin collect/distribute planning over the formula graph
//! - **join**: Joint and conditional queries over arbitrary variable sets
//! - **inference**: The `InferenceEngine` facade

pub mod config;
pub mod errors;
pub mod evidence;
pub mod inference;
pub mod join;
pub mod propagation;
