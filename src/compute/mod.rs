//! Compute module - Forward model and evolutionary search.

mod kinetics;

pub mod evolution;

pub use evolution::{DIVERGED_FITNESS, FITNESS_FLOOR};
pub use kinetics::*;
