//! Analysis modules.
//!
//! Pure computations over data that has already been fetched.

pub mod aggregator;

pub use aggregator::*;
