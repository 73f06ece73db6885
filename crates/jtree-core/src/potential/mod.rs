//! Potentials: mixed-radix domains, the formula graph and its evaluator.
//!
//! - **domain**: Sorted variable sets and index encoding
//! - **formula**: The de-duplicated formula arena
//! - **evaluate**: Memoized evaluation of formulas
//! - **fast**: Evaluated potentials and their algebra

pub mod domain;
pub mod evaluate;
pub mod fast;
pub mod formula;
pub(crate) mod kernels;
