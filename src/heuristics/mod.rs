//! Heuristics module for wave picking.
//! 
//! This module exports the greedy aisle coverage, the GRASP construction,
//! the VND local search and the random-jump diversifier.

pub mod coverage;
pub mod construction;
pub mod local_search;
pub mod diversify;

pub use coverage::*;
pub use construction::*;
pub use local_search::*;
pub use diversify::*;
