//! Game logic and episode driving.
//!
//! - [`SnakeGame`] - Deterministic single-episode state machine
//! - [`StateEncoding`] - Feature vector layouts fed to networks
//! - [`Decider`] - Anything that turns a state vector into a [`Direction`](crate::Direction)
//! - [`run_episode`] - Plays a game to termination with a decider
//!
//! # Episode Flow
//!
//! 1. Create a [`SnakeGame`] from a [`BoardConfig`](crate::BoardConfig) and a seed
//! 2. Extract the state vector for the configured [`StateEncoding`]
//! 3. Ask the decider for a direction and apply it
//! 4. Repeat until the game terminates, then read its [`SimulationOutcome`]

pub use self::{episode::*, snake_game::*, state_encoding::*};

mod episode;
mod snake_game;
mod state_encoding;
