//! Compute module - circle geometry, image scoring and search.

mod coverage;
mod fitness;
mod generator;
mod geometry;
mod gradient;
mod pruning;
mod seeding;
mod segments;

pub mod evolution;

pub use coverage::*;
pub use fitness::*;
pub use generator::*;
pub use geometry::*;
pub use gradient::*;
pub use pruning::*;
pub use seeding::*;
pub use segments::*;
