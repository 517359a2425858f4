//! Grid primitives shared by the game and the state encodings.

pub use self::{board_config::*, direction::*, position::*};

pub(crate) mod board_config;
pub(crate) mod direction;
pub(crate) mod position;
