use std::collections::VecDeque;

use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::core::{BoardConfig, Direction, Position};

use super::SimulationOutcome;

/// Why an episode ended.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum TerminationCause {
    #[display("wall collision")]
    WallCollision,
    #[display("self collision")]
    SelfCollision,
    #[display("stalled")]
    Stalled,
    /// The body covers every cell, so no food can be placed.
    #[display("board filled")]
    BoardFilled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum GameState {
    Running,
    Terminated(TerminationCause),
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum StepOutcome {
    Moved,
    Ate,
    Terminated(TerminationCause),
}

/// A single snake episode on a bounded grid.
///
/// The game owns its own seeded generator, used only to place food, so an episode
/// is fully determined by its seed and the sequence of requested directions.
///
/// # Tick Rules
///
/// 1. A request for the exact reverse of the current heading is replaced by the
///    current heading.
/// 2. The head moves one cell. Leaving a walled board, or entering a body cell
///    other than the tail that is about to move, ends the episode.
/// 3. Eating the food grows the body, relocates the food and resets the stall
///    counter. Otherwise the tail moves and the stall counter grows.
/// 4. The episode ends once the stall counter reaches the configured cap.
///
/// # Example
///
/// ```
/// use std::num::NonZeroUsize;
/// use snevo_engine::{BoardConfig, Direction, EdgePolicy, SnakeGame};
///
/// let cap = NonZeroUsize::new(50).unwrap();
/// let config = BoardConfig::new(10, 10, EdgePolicy::Walled, cap, 3).unwrap();
/// let mut game = SnakeGame::new(config, 42);
///
/// game.apply_direction(Direction::Up);
/// assert_eq!(game.heading(), Direction::Up);
/// assert_eq!(game.steps(), 1);
/// assert!(game.state().is_running());
/// ```
#[derive(Debug, Clone)]
pub struct SnakeGame {
    config: BoardConfig,
    rng: Pcg32,
    /// Front is the head.
    body: VecDeque<Position>,
    occupied: Vec<bool>,
    visited: Vec<bool>,
    cells_visited: usize,
    heading: Direction,
    food: Option<Position>,
    score: usize,
    steps: usize,
    steps_without_food: usize,
    state: GameState,
}

impl SnakeGame {
    #[must_use]
    pub fn new(config: BoardConfig, seed: u64) -> Self {
        let cells = config.cell_count();
        let start = config.start();
        let mut game = Self {
            config,
            rng: Pcg32::seed_from_u64(seed),
            body: VecDeque::with_capacity(cells),
            occupied: vec![false; cells],
            visited: vec![false; cells],
            cells_visited: 0,
            heading: Direction::Right,
            food: None,
            score: 0,
            steps: 0,
            steps_without_food: 0,
            state: GameState::Running,
        };
        for i in 0..config.initial_length() {
            let pos = Position::new(start.x - i, start.y);
            game.body.push_back(pos);
            game.occupied[config.index(pos)] = true;
        }
        game.mark_visited(start);
        game.place_food();
        game
    }

    #[must_use]
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> GameState {
        self.state
    }

    #[must_use]
    pub fn termination(&self) -> Option<TerminationCause> {
        match self.state {
            GameState::Running => None,
            GameState::Terminated(cause) => Some(cause),
        }
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    /// Returns the number of ticks applied, including a terminating one.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    #[must_use]
    pub fn steps_without_food(&self) -> usize {
        self.steps_without_food
    }

    /// Returns the body cells, head first.
    pub fn body(&self) -> impl ExactSizeIterator<Item = Position> + '_ {
        self.body.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    #[must_use]
    pub fn head(&self) -> Position {
        self.body[0]
    }

    /// Returns the food cell, or `None` once the board is filled.
    #[must_use]
    pub fn food(&self) -> Option<Position> {
        self.food
    }

    #[must_use]
    pub fn heading(&self) -> Direction {
        self.heading
    }

    /// Returns the number of distinct cells the head has occupied.
    #[must_use]
    pub fn cells_visited(&self) -> usize {
        self.cells_visited
    }

    /// Returns whether `pos` holds a body segment.
    #[must_use]
    pub fn is_occupied(&self, pos: Position) -> bool {
        self.occupied[self.config.index(pos)]
    }

    /// Summarises the episode so far.
    #[must_use]
    pub fn outcome(&self) -> SimulationOutcome {
        let head = self.head();
        SimulationOutcome {
            score: self.score,
            steps_survived: self.steps,
            terminal: self.state.is_terminated(),
            cause: self.termination(),
            cells_visited: self.cells_visited,
            board_cells: self.config.cell_count(),
            final_food_distance: self.food.map_or(0.0, |food| head.distance(food)),
        }
    }

    /// Advances the game by one tick.
    pub fn apply_direction(&mut self, requested: Direction) -> StepOutcome {
        if let GameState::Terminated(cause) = self.state {
            return StepOutcome::Terminated(cause);
        }

        if requested != self.heading.opposite() {
            self.heading = requested;
        }
        self.steps += 1;

        let (dx, dy) = self.heading.delta();
        let Some(next) = self.config.offset(self.head(), dx, dy) else {
            return self.terminate(TerminationCause::WallCollision);
        };
        let tail = self.body[self.body.len() - 1];
        if self.is_occupied(next) && next != tail {
            return self.terminate(TerminationCause::SelfCollision);
        }

        if self.food == Some(next) {
            self.push_head(next);
            self.score += 1;
            self.steps_without_food = 0;
            if !self.place_food() {
                return self.terminate(TerminationCause::BoardFilled);
            }
            return StepOutcome::Ate;
        }

        if let Some(tail) = self.body.pop_back() {
            let index = self.config.index(tail);
            self.occupied[index] = false;
        }
        self.push_head(next);
        self.steps_without_food += 1;
        if self.steps_without_food >= self.config.max_steps_without_food().get() {
            return self.terminate(TerminationCause::Stalled);
        }
        StepOutcome::Moved
    }

    fn terminate(&mut self, cause: TerminationCause) -> StepOutcome {
        self.state = GameState::Terminated(cause);
        StepOutcome::Terminated(cause)
    }

    fn push_head(&mut self, pos: Position) {
        self.body.push_front(pos);
        let index = self.config.index(pos);
        self.occupied[index] = true;
        self.mark_visited(pos);
    }

    fn mark_visited(&mut self, pos: Position) {
        let index = self.config.index(pos);
        if !self.visited[index] {
            self.visited[index] = true;
            self.cells_visited += 1;
        }
    }

    /// Moves the food to a uniformly random free cell.
    ///
    /// Returns `false`, leaving no food, when every cell is occupied.
    fn place_food(&mut self) -> bool {
        let free = self.config.cell_count() - self.body.len();
        if free == 0 {
            self.food = None;
            return false;
        }
        let target = self.rng.random_range(0..free);
        let width = self.config.width();
        self.food = self
            .occupied
            .iter()
            .enumerate()
            .filter(|(_, occupied)| !**occupied)
            .nth(target)
            .map(|(index, _)| Position::new(index % width, index / width));
        self.food.is_some()
    }

    #[cfg(test)]
    pub(crate) fn set_food(&mut self, pos: Position) {
        assert!(!self.is_occupied(pos));
        self.food = Some(pos);
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::core::EdgePolicy;

    fn config(width: usize, height: usize, policy: EdgePolicy, cap: usize, len: usize) -> BoardConfig {
        BoardConfig::new(width, height, policy, NonZeroUsize::new(cap).unwrap(), len).unwrap()
    }

    fn game(width: usize, height: usize, policy: EdgePolicy, cap: usize, len: usize) -> SnakeGame {
        SnakeGame::new(config(width, height, policy, cap, len), 7)
    }

    #[test]
    fn test_initial_layout() {
        let game = game(10, 10, EdgePolicy::Walled, 100, 3);
        let body = game.body().collect::<Vec<_>>();
        assert_eq!(
            body,
            [Position::new(5, 5), Position::new(4, 5), Position::new(3, 5)]
        );
        assert_eq!(game.heading(), Direction::Right);
        assert_eq!(game.cells_visited(), 1);
        let food = game.food().unwrap();
        assert!(!game.is_occupied(food));
        assert!(game.state().is_running());
    }

    #[test]
    fn test_wall_collision() {
        let mut game = game(5, 5, EdgePolicy::Walled, 100, 3);
        game.set_food(Position::new(0, 0));
        assert_eq!(game.apply_direction(Direction::Right), StepOutcome::Moved);
        assert_eq!(game.apply_direction(Direction::Right), StepOutcome::Moved);
        assert_eq!(game.head(), Position::new(4, 2));
        assert_eq!(
            game.apply_direction(Direction::Right),
            StepOutcome::Terminated(TerminationCause::WallCollision)
        );
        assert_eq!(game.steps(), 3);
        assert_eq!(game.termination(), Some(TerminationCause::WallCollision));
    }

    #[test]
    fn test_terminated_game_ignores_ticks() {
        let mut game = game(5, 5, EdgePolicy::Walled, 100, 1);
        game.set_food(Position::new(0, 0));
        while game.state().is_running() {
            game.apply_direction(Direction::Down);
        }
        let steps = game.steps();
        let score = game.score();
        let head = game.head();
        // Food on the cell the extra tick would move into must not be eaten.
        game.set_food(Position::new(head.x - 1, head.y));
        assert!(game.apply_direction(Direction::Left).is_terminated());
        assert_eq!(game.steps(), steps);
        assert_eq!(game.score(), score);
        assert_eq!(game.head(), head);
        assert_eq!(game.food(), Some(Position::new(head.x - 1, head.y)));
    }

    #[test]
    fn test_reverse_request_continues_heading() {
        let mut game = game(10, 10, EdgePolicy::Walled, 100, 3);
        game.set_food(Position::new(0, 0));
        assert_eq!(game.apply_direction(Direction::Left), StepOutcome::Moved);
        assert_eq!(game.heading(), Direction::Right);
        assert_eq!(game.head(), Position::new(6, 5));
    }

    #[test]
    fn test_self_collision() {
        let mut game = game(10, 10, EdgePolicy::Walled, 100, 5);
        game.set_food(Position::new(9, 9));
        assert_eq!(game.apply_direction(Direction::Up), StepOutcome::Moved);
        assert_eq!(game.apply_direction(Direction::Left), StepOutcome::Moved);
        assert_eq!(
            game.apply_direction(Direction::Down),
            StepOutcome::Terminated(TerminationCause::SelfCollision)
        );
    }

    #[test]
    fn test_moving_into_vacated_tail_is_allowed() {
        // A length-4 body circling a 2x2 block always steps onto its own tail.
        let mut game = game(10, 10, EdgePolicy::Walled, 100, 4);
        game.set_food(Position::new(0, 0));
        let cycle = [Direction::Down, Direction::Left, Direction::Up, Direction::Right];
        for dir in cycle.into_iter().cycle().take(12) {
            assert_eq!(game.apply_direction(dir), StepOutcome::Moved);
        }
    }

    #[test]
    fn test_stall_cap_terminates_exactly() {
        let mut game = game(10, 10, EdgePolicy::Walled, 20, 3);
        game.set_food(Position::new(0, 0));
        let cycle = [Direction::Down, Direction::Left, Direction::Up, Direction::Right];
        for dir in cycle.into_iter().cycle().take(19) {
            assert_eq!(game.apply_direction(dir), StepOutcome::Moved);
        }
        assert_eq!(game.steps_without_food(), 19);
        assert_eq!(
            game.apply_direction(Direction::Right),
            StepOutcome::Terminated(TerminationCause::Stalled)
        );
        assert_eq!(game.steps(), 20);
    }

    #[test]
    fn test_eating_grows_and_resets_stall_counter() {
        let mut game = game(10, 10, EdgePolicy::Walled, 100, 3);
        game.set_food(Position::new(0, 0));
        game.apply_direction(Direction::Up);
        assert_eq!(game.steps_without_food(), 1);

        game.set_food(Position::new(6, 4));
        assert_eq!(game.apply_direction(Direction::Right), StepOutcome::Ate);
        assert_eq!(game.score(), 1);
        assert_eq!(game.len(), 4);
        assert_eq!(game.steps_without_food(), 0);
        let food = game.food().unwrap();
        assert!(!game.is_occupied(food));
    }

    #[test]
    fn test_filling_the_board_ends_the_episode() {
        let mut game = game(2, 2, EdgePolicy::Walled, 100, 2);
        game.set_food(Position::new(1, 0));
        assert_eq!(game.apply_direction(Direction::Up), StepOutcome::Ate);
        assert_eq!(game.food(), Some(Position::new(0, 0)));
        assert_eq!(
            game.apply_direction(Direction::Left),
            StepOutcome::Terminated(TerminationCause::BoardFilled)
        );
        assert_eq!(game.score(), 2);
        assert_eq!(game.food(), None);
        assert_eq!(game.outcome().final_food_distance, 0.0);
    }

    #[test]
    fn test_wrapping_board() {
        let mut game = game(5, 5, EdgePolicy::Wrapping, 100, 1);
        game.set_food(Position::new(0, 0));
        for _ in 0..3 {
            assert_eq!(game.apply_direction(Direction::Right), StepOutcome::Moved);
        }
        assert_eq!(game.head(), Position::new(0, 2));
        assert_eq!(game.cells_visited(), 4);
    }

    #[test]
    fn test_same_seed_same_food() {
        let config = config(12, 9, EdgePolicy::Walled, 100, 3);
        let a = SnakeGame::new(config, 99);
        let b = SnakeGame::new(config, 99);
        assert_eq!(a.food(), b.food());
    }

    #[test]
    fn test_outcome_fields() {
        let mut game = game(5, 5, EdgePolicy::Walled, 100, 3);
        game.set_food(Position::new(0, 0));
        game.apply_direction(Direction::Up);
        let outcome = game.outcome();
        assert_eq!(outcome.score, 0);
        assert_eq!(outcome.steps_survived, 1);
        assert!(!outcome.terminal);
        assert_eq!(outcome.cause, None);
        assert_eq!(outcome.cells_visited, 2);
        assert_eq!(outcome.board_cells, 25);
        assert!((outcome.final_food_distance - 5.0_f64.sqrt()).abs() < 1e-12);
    }
}
