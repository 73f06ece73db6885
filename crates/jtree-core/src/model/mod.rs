//! Network and distribution types.

pub mod distribution;
pub mod network;
