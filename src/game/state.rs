use std::sync::Arc;

use super::direction::Direction;
use super::obstacle::Obstacle;

/// A position on the game grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move position by delta
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// The snake in the game
///
/// The head travels in fractional cells (`speed` per frame) and the body only
/// shifts when the head crosses into a new cell. Movement wraps at the grid
/// edges, so every body cell always lies on the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    /// Body segments, with head at index 0
    body: Vec<Position>,
    head_x: f32,
    head_y: f32,
    /// Current direction of movement
    pub direction: Direction,
    /// Heading of the last cell change; reversals are judged against it
    heading: Direction,
    /// Cells travelled per frame
    pub speed: f32,
    pub alive: bool,
    growing: bool,
}

impl Snake {
    /// Create a new snake with given starting position and direction
    ///
    /// Extra segments are laid out behind the head, opposite to `direction`.
    pub fn new(head: Position, direction: Direction, length: usize, speed: f32) -> Self {
        let mut body = vec![head];

        let (dx, dy) = direction.delta();
        for i in 1..length.max(1) {
            let prev = body[i - 1];
            body.push(prev.moved_by(-dx, -dy));
        }

        Self {
            body,
            head_x: head.x as f32,
            head_y: head.y as f32,
            direction,
            heading: direction,
            speed,
            alive: true,
            growing: false,
        }
    }

    /// Get the head position
    pub fn head(&self) -> Position {
        self.body[0]
    }

    /// All cells, head first
    pub fn body(&self) -> &[Position] {
        &self.body
    }

    /// Get body segments (excluding head)
    pub fn body_segments(&self) -> &[Position] {
        &self.body[1..]
    }

    /// Check if position collides with snake body (excluding head)
    pub fn collides_with_body(&self, pos: Position) -> bool {
        self.body_segments().contains(&pos)
    }

    /// Check if any cell of the snake, head included, is at `pos`
    pub fn occupies(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    /// True while a segment added by [`Snake::grow`] is still stacked on the tail
    pub fn is_growing(&self) -> bool {
        self.growing
    }

    /// Change heading. A snake longer than one cell cannot reverse into itself.
    ///
    /// Reversal is judged against the way the head last moved, not the last
    /// accepted heading. Returns whether the heading was accepted.
    pub fn steer(&mut self, direction: Direction) -> bool {
        if self.len() > 1 && self.heading.is_opposite(direction) {
            return false;
        }
        self.direction = direction;
        true
    }

    /// Advance the head by one frame's worth of movement
    ///
    /// Returns true when the head entered a new cell. Entering a cell already
    /// covered by the body kills the snake.
    pub fn advance(&mut self, grid_width: usize, grid_height: usize) -> bool {
        let previous = self.head();
        let (dx, dy) = self.direction.delta();

        self.head_x = (self.head_x + dx as f32 * self.speed).rem_euclid(grid_width as f32);
        self.head_y = (self.head_y + dy as f32 * self.speed).rem_euclid(grid_height as f32);

        // rem_euclid on f32 can round up to the modulus itself
        let current = Position::new(
            (self.head_x.floor() as i32).rem_euclid(grid_width as i32),
            (self.head_y.floor() as i32).rem_euclid(grid_height as i32),
        );
        if current == previous {
            return false;
        }

        self.body.insert(0, current);
        self.body.pop();
        self.growing = false;
        self.heading = self.direction;

        if self.collides_with_body(current) {
            self.alive = false;
        }
        true
    }

    /// Wrap every cell onto a `grid_width` x `grid_height` grid
    pub(crate) fn wrap_to(&mut self, grid_width: usize, grid_height: usize) {
        let (width, height) = (grid_width as i32, grid_height as i32);
        for cell in &mut self.body {
            *cell = Position::new(cell.x.rem_euclid(width), cell.y.rem_euclid(height));
        }
        let head = self.head();
        self.head_x = head.x as f32;
        self.head_y = head.y as f32;
    }

    /// Add one segment. It sits on the tail until the next cell change.
    pub fn grow(&mut self) {
        let tail = self.body[self.body.len() - 1];
        self.body.push(tail);
        self.growing = true;
    }

    /// Get the length of the snake
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Check if the snake is empty (should never happen in practice)
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Complete game state
///
/// Shared between the frame loop and the obstacle workers behind the
/// coordinator's lock; nothing outside the `game` module holds a reference to it.
#[derive(Debug, Clone)]
pub struct GameState {
    pub snake: Snake,
    pub food: Position,
    pub obstacles: Vec<Arc<Obstacle>>,
    pub grid_width: usize,
    pub grid_height: usize,
    pub score: u32,
}

impl GameState {
    /// Create a new game state
    ///
    /// Snake cells laid out past an edge are wrapped onto the grid.
    pub fn new(mut snake: Snake, food: Position, grid_width: usize, grid_height: usize) -> Self {
        snake.wrap_to(grid_width, grid_height);
        Self {
            snake,
            food,
            obstacles: Vec::new(),
            grid_width,
            grid_height,
            score: 0,
        }
    }

    /// Check if a position is within the grid bounds
    pub fn is_in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0
            && pos.x < self.grid_width as i32
            && pos.y >= 0
            && pos.y < self.grid_height as i32
    }

    /// Check if a position is occupied by the snake
    pub fn is_occupied_by_snake(&self, pos: Position) -> bool {
        self.snake.occupies(pos)
    }

    /// Check if a position is covered by any live obstacle
    pub fn is_occupied_by_obstacle(&self, pos: Position) -> bool {
        self.obstacles.iter().any(|o| o.occupies(pos))
    }

    /// A cell food may be placed on
    pub fn is_free(&self, pos: Position) -> bool {
        !self.is_occupied_by_snake(pos) && !self.is_occupied_by_obstacle(pos)
    }

    /// Check whether `candidate` could join the obstacle set: on the grid,
    /// clear of the snake and the food, and overlapping no other obstacle
    pub fn can_place_obstacle(&self, candidate: &Obstacle) -> bool {
        candidate.fits_within(self.grid_width, self.grid_height)
            && !candidate.cells().iter().any(|&c| self.snake.occupies(c))
            && !candidate.occupies(self.food)
            && !self.obstacles.iter().any(|o| o.overlaps(candidate))
    }

    /// Remove exactly this obstacle handle; returns whether it was present
    pub fn remove_obstacle(&mut self, obstacle: &Arc<Obstacle>) -> bool {
        let before = self.obstacles.len();
        self.obstacles.retain(|o| !Arc::ptr_eq(o, obstacle));
        self.obstacles.len() != before
    }

    /// Flattened cells of every live obstacle
    pub fn obstacle_cells(&self) -> Vec<Position> {
        self.obstacles
            .iter()
            .flat_map(|o| o.cells().iter().copied())
            .collect()
    }

    /// Owned copy of everything the renderer needs
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            snake: self.snake.body().to_vec(),
            food: self.food,
            obstacle_cells: self.obstacle_cells(),
            score: self.score,
            alive: self.snake.alive,
            grid_width: self.grid_width,
            grid_height: self.grid_height,
        }
    }
}

/// One frame's worth of renderable state, taken under the lock
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    /// Snake cells, head first
    pub snake: Vec<Position>,
    pub food: Position,
    pub obstacle_cells: Vec<Position>,
    pub score: u32,
    pub alive: bool,
    pub grid_width: usize,
    pub grid_height: usize,
}

impl FrameSnapshot {
    pub fn head(&self) -> Position {
        self.snake[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_position_movement() {
        let pos = Position::new(5, 5);
        assert_eq!(pos.moved_by(1, 0), Position::new(6, 5));
        assert_eq!(pos.moved_by(-1, 0), Position::new(4, 5));
        assert_eq!(pos.moved_by(0, 1), Position::new(5, 6));
        assert_eq!(pos.moved_by(0, -1), Position::new(5, 4));
    }

    #[test]
    fn test_snake_creation() {
        let snake = Snake::new(Position::new(5, 5), Direction::Right, 3, 1.0);
        assert_eq!(snake.len(), 3);
        assert_eq!(snake.head(), Position::new(5, 5));
        assert_eq!(snake.body()[1], Position::new(4, 5));
        assert_eq!(snake.body()[2], Position::new(3, 5));
        assert!(snake.alive);
    }

    #[test]
    fn test_fractional_movement_shifts_on_cell_change() {
        let mut snake = Snake::new(Position::new(5, 5), Direction::Right, 2, 0.5);

        assert!(!snake.advance(20, 20));
        assert_eq!(snake.head(), Position::new(5, 5));

        assert!(snake.advance(20, 20));
        assert_eq!(snake.head(), Position::new(6, 5));
        assert_eq!(snake.body()[1], Position::new(5, 5));
        assert_eq!(snake.len(), 2);
    }

    #[test]
    fn test_wraps_at_edges() {
        let mut snake = Snake::new(Position::new(9, 0), Direction::Right, 1, 1.0);
        snake.advance(10, 10);
        assert_eq!(snake.head(), Position::new(0, 0));

        snake.steer(Direction::Up);
        snake.advance(10, 10);
        assert_eq!(snake.head(), Position::new(0, 9));
        assert!(snake.alive);
    }

    #[test]
    fn test_grow_adds_segment_immediately() {
        let mut snake = Snake::new(Position::new(5, 5), Direction::Right, 1, 1.0);
        snake.grow();
        assert_eq!(snake.len(), 2);
        assert!(snake.is_growing());

        snake.advance(20, 20);
        assert_eq!(snake.body(), &[Position::new(6, 5), Position::new(5, 5)]);
        assert!(!snake.is_growing());
        assert!(snake.alive);
    }

    #[test]
    fn test_steer_rejects_reversal_when_long() {
        let mut snake = Snake::new(Position::new(5, 5), Direction::Right, 3, 1.0);
        assert!(!snake.steer(Direction::Left));
        assert_eq!(snake.direction, Direction::Right);
        assert!(snake.steer(Direction::Up));

        let mut single = Snake::new(Position::new(5, 5), Direction::Right, 1, 1.0);
        assert!(single.steer(Direction::Left));
    }

    #[test]
    fn test_two_turns_within_one_cell_cannot_reverse() {
        let mut snake = Snake::new(Position::new(5, 5), Direction::Right, 3, 0.1);
        assert!(snake.steer(Direction::Up));
        assert!(!snake.steer(Direction::Left));
        assert_eq!(snake.direction, Direction::Up);

        for _ in 0..20 {
            snake.advance(20, 20);
        }
        assert!(snake.alive);
        assert_eq!(snake.head().x, 5);

        // Once the head has actually moved up, turning left is an ordinary turn
        assert!(snake.steer(Direction::Left));
    }

    #[test]
    fn test_initial_body_wraps_onto_grid() {
        let state = GameState::new(
            Snake::new(Position::new(0, 3), Direction::Right, 3, 1.0),
            Position::new(5, 5),
            10,
            10,
        );
        assert_eq!(
            state.snake.body(),
            &[Position::new(0, 3), Position::new(9, 3), Position::new(8, 3)]
        );
        assert!(state.snake.body().iter().all(|&cell| state.is_in_bounds(cell)));
    }

    #[test]
    fn test_self_collision_kills() {
        // (5,5) (4,5) (3,5) (2,5) (1,5) going right, then curl back into the body
        let mut snake = Snake::new(Position::new(5, 5), Direction::Right, 5, 1.0);
        snake.steer(Direction::Down);
        snake.advance(10, 10);
        snake.steer(Direction::Left);
        snake.advance(10, 10);
        snake.steer(Direction::Up);
        snake.advance(10, 10);

        assert_eq!(snake.head(), Position::new(4, 5));
        assert!(!snake.alive);
    }

    #[test]
    fn test_bounds_checking() {
        let state = GameState::new(
            Snake::new(Position::new(5, 5), Direction::Right, 3, 1.0),
            Position::new(10, 10),
            20,
            20,
        );

        assert!(state.is_in_bounds(Position::new(0, 0)));
        assert!(state.is_in_bounds(Position::new(19, 19)));
        assert!(!state.is_in_bounds(Position::new(-1, 0)));
        assert!(!state.is_in_bounds(Position::new(20, 0)));
        assert!(!state.is_in_bounds(Position::new(0, 20)));
    }

    #[test]
    fn test_obstacle_placement_rules() {
        let mut state = GameState::new(
            Snake::new(Position::new(5, 5), Direction::Right, 3, 1.0),
            Position::new(10, 10),
            20,
            20,
        );
        let secs = Duration::from_secs(5);

        assert!(!state.can_place_obstacle(&Obstacle::new(Position::new(4, 4), 2, secs)));
        assert!(!state.can_place_obstacle(&Obstacle::new(Position::new(19, 0), 2, secs)));
        assert!(!state.can_place_obstacle(&Obstacle::new(Position::new(9, 9), 2, secs)));

        let placed = Arc::new(Obstacle::new(Position::new(10, 0), 3, secs));
        assert!(state.can_place_obstacle(&placed));
        state.obstacles.push(placed.clone());

        assert!(!state.can_place_obstacle(&Obstacle::new(Position::new(12, 2), 2, secs)));
        assert!(state.is_occupied_by_obstacle(Position::new(11, 1)));
        assert!(!state.is_free(Position::new(11, 1)));
        assert!(!state.is_free(Position::new(4, 5)));
        assert!(state.is_free(Position::new(0, 19)));
        assert_eq!(state.obstacle_cells().len(), 9);
    }

    #[test]
    fn test_remove_obstacle_by_handle() {
        let mut state = GameState::new(
            Snake::new(Position::new(5, 5), Direction::Right, 1, 1.0),
            Position::new(10, 10),
            20,
            20,
        );
        let twin_a = Arc::new(Obstacle::new(Position::new(0, 0), 2, Duration::from_secs(1)));
        let twin_b = Arc::new(Obstacle::new(Position::new(0, 0), 2, Duration::from_secs(1)));
        state.obstacles.push(twin_a.clone());
        state.obstacles.push(twin_b.clone());

        assert!(state.remove_obstacle(&twin_a));
        assert_eq!(state.obstacles.len(), 1);
        assert!(Arc::ptr_eq(&state.obstacles[0], &twin_b));
        assert!(!state.remove_obstacle(&twin_a));
    }

    #[test]
    fn test_snapshot_copies_renderable_state() {
        let mut state = GameState::new(
            Snake::new(Position::new(5, 5), Direction::Right, 2, 1.0),
            Position::new(10, 10),
            20,
            20,
        );
        state.score = 4;
        state
            .obstacles
            .push(Arc::new(Obstacle::new(Position::new(0, 0), 2, Duration::from_secs(1))));

        let snapshot = state.snapshot();
        assert_eq!(snapshot.head(), Position::new(5, 5));
        assert_eq!(snapshot.snake.len(), 2);
        assert_eq!(snapshot.obstacle_cells.len(), 4);
        assert_eq!(snapshot.score, 4);
        assert!(snapshot.alive);
    }
}
