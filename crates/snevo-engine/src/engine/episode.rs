use std::convert::Infallible;

use serde::{Deserialize, Serialize};

use crate::core::Direction;

use super::{SnakeGame, StateEncoding, TerminationCause};

/// Summary of an episode, as consumed by fitness functions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub score: usize,
    pub steps_survived: usize,
    pub terminal: bool,
    pub cause: Option<TerminationCause>,
    /// Distinct cells the head has occupied, including the start cell.
    pub cells_visited: usize,
    pub board_cells: usize,
    /// Euclidean distance from the head to the food; 0 when there is no food.
    pub final_food_distance: f64,
}

/// Chooses a direction from a state vector.
pub trait Decider {
    type Error;

    fn decide(&mut self, state: &[f64]) -> Result<Direction, Self::Error>;
}

/// Replays a fixed list of directions, then repeats the last one.
///
/// An empty script always answers `Right`, the initial heading.
#[derive(Debug, Clone)]
pub struct ScriptedDecider {
    moves: Vec<Direction>,
    cursor: usize,
}

impl ScriptedDecider {
    #[must_use]
    pub fn new(moves: Vec<Direction>) -> Self {
        Self { moves, cursor: 0 }
    }
}

impl Decider for ScriptedDecider {
    type Error = Infallible;

    fn decide(&mut self, _state: &[f64]) -> Result<Direction, Self::Error> {
        let Some(last) = self.moves.last().copied() else {
            return Ok(Direction::Right);
        };
        let dir = self.moves.get(self.cursor).copied().unwrap_or(last);
        self.cursor += 1;
        Ok(dir)
    }
}

/// Plays `game` to termination, asking `decider` for a direction every tick.
///
/// Termination is guaranteed by the stalling cap.
///
/// # Example
///
/// ```
/// use std::num::NonZeroUsize;
/// use snevo_engine::{
///     BoardConfig, Direction, EdgePolicy, ScriptedDecider, SnakeGame, StateEncoding,
///     TerminationCause, run_episode,
/// };
///
/// let cap = NonZeroUsize::new(100).unwrap();
/// let config = BoardConfig::new(8, 8, EdgePolicy::Walled, cap, 3).unwrap();
/// let mut game = SnakeGame::new(config, 0);
/// let mut decider = ScriptedDecider::new(vec![Direction::Up]);
///
/// let outcome = run_episode(&mut game, StateEncoding::Compact, &mut decider).unwrap();
/// assert!(outcome.terminal);
/// assert!(outcome.steps_survived <= 5);
/// ```
pub fn run_episode<D>(
    game: &mut SnakeGame,
    encoding: StateEncoding,
    decider: &mut D,
) -> Result<SimulationOutcome, D::Error>
where
    D: Decider + ?Sized,
{
    while game.state().is_running() {
        let state = game.state_vector(encoding);
        let dir = decider.decide(&state)?;
        game.apply_direction(dir);
    }
    Ok(game.outcome())
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::core::{BoardConfig, EdgePolicy, Position};

    fn config(cap: usize) -> BoardConfig {
        BoardConfig::new(10, 10, EdgePolicy::Walled, NonZeroUsize::new(cap).unwrap(), 3).unwrap()
    }

    #[test]
    fn test_scripted_decider_repeats_last_move() {
        let mut decider = ScriptedDecider::new(vec![Direction::Up, Direction::Left]);
        let moves = (0..4)
            .map(|_| decider.decide(&[]).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(
            moves,
            [Direction::Up, Direction::Left, Direction::Left, Direction::Left]
        );
        let mut empty = ScriptedDecider::new(Vec::new());
        assert_eq!(empty.decide(&[]).unwrap(), Direction::Right);
    }

    #[test]
    fn test_episode_runs_to_wall() {
        let mut game = SnakeGame::new(config(100), 5);
        game.set_food(Position::new(0, 0));
        let mut decider = ScriptedDecider::new(vec![Direction::Down]);
        let outcome = run_episode(&mut game, StateEncoding::Minimal, &mut decider).unwrap();
        assert!(outcome.terminal);
        assert_eq!(outcome.cause, Some(TerminationCause::WallCollision));
        assert_eq!(outcome.steps_survived, 5);
    }

    #[test]
    fn test_circling_snake_stalls() {
        let mut game = SnakeGame::new(config(20), 5);
        game.set_food(Position::new(0, 0));
        let cycle = [Direction::Down, Direction::Left, Direction::Up, Direction::Right];
        let mut decider = ScriptedDecider::new(cycle.into_iter().cycle().take(40).collect());
        let outcome = run_episode(&mut game, StateEncoding::Vision, &mut decider).unwrap();
        assert_eq!(outcome.cause, Some(TerminationCause::Stalled));
        assert_eq!(outcome.steps_survived, 20);
        assert_eq!(outcome.cells_visited, 4);
    }

    #[test]
    fn test_episode_is_deterministic() {
        let script = vec![
            Direction::Up,
            Direction::Up,
            Direction::Left,
            Direction::Down,
            Direction::Down,
            Direction::Right,
        ];
        let play = || {
            let mut game = SnakeGame::new(config(30), 1234);
            let mut decider = ScriptedDecider::new(script.clone());
            run_episode(&mut game, StateEncoding::Compact, &mut decider).unwrap()
        };
        assert_eq!(play(), play());
    }
}
