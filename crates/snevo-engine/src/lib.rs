//! Grid-world snake simulation used as the fitness environment.
//!
//! The crate is split like the rest of the workspace:
//!
//! - [`core`] - Directions, positions and validated board configuration
//! - [`engine`] - The game state machine, state encodings and episode runner
//!
//! Every episode is a pure function of its [`BoardConfig`], its seed and the
//! directions requested, which is what makes fitness evaluation reproducible.

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;
