//! Heuristics module.
//!
//! This module exports the EDA engine and the operators it is built from.

pub mod fitness;
pub mod ranking;
pub mod model;
pub mod mutation;
pub mod eda;

pub use fitness::*;
pub use ranking::*;
pub use model::*;
pub use mutation::*;
pub use eda::*;
