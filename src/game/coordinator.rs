use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rand::Rng;
use tokio::runtime::Handle;
use tokio::time::Instant;
use tracing::{debug, info};

use super::{
    config::GameConfig,
    direction::Direction,
    lifecycle::{ObstacleWorker, ShutdownReport, WorkerRegistry},
    obstacle::Obstacle,
    state::{FrameSnapshot, GameState, Position, Snake},
};
use crate::persistence::{ScoreError, TopScoreStore};

/// Information about a frame update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepInfo {
    /// Whether the snake ate food this frame
    pub ate_food: bool,
    /// Whether eating placed a new obstacle
    pub placed_obstacle: bool,
    /// Whether the score became a new top score
    pub new_top_score: bool,
}

/// Result of a frame update
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// The snake was already dead; nothing changed
    pub terminated: bool,
    pub info: StepInfo,
}

/// Sole owner of the shared game state
///
/// The frame loop and every obstacle worker go through the same lock. No
/// method holds it across a sleep, an `.await` or a whole sampling loop.
pub struct Coordinator {
    config: GameConfig,
    world: Arc<Mutex<GameState>>,
    workers: WorkerRegistry,
    store: Arc<TopScoreStore>,
}

impl Coordinator {
    /// Start a game: a one-cell snake in the middle of the grid heading up,
    /// and the first food.
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime; obstacle workers are
    /// spawned onto it.
    pub fn new(config: GameConfig, store: Arc<TopScoreStore>) -> Self {
        let center = Position::new(
            (config.grid_width / 2) as i32,
            (config.grid_height / 2) as i32,
        );
        let snake = Snake::new(center, Direction::Up, 1, config.initial_speed);
        let state = GameState::new(snake, center, config.grid_width, config.grid_height);

        let coordinator = Self::with_state(config, state, store);
        coordinator.place_food();
        coordinator
    }

    /// Wrap an existing state as-is (food is not re-placed)
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_state(config: GameConfig, state: GameState, store: Arc<TopScoreStore>) -> Self {
        Self {
            config,
            world: Arc::new(Mutex::new(state)),
            workers: WorkerRegistry::new(Handle::current()),
            store,
        }
    }

    fn lock(&self) -> MutexGuard<'_, GameState> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advance the game by one frame
    ///
    /// A dead snake makes this a no-op. Eating scores exactly once per food:
    /// score, growth and speed-up happen in one critical section, then new
    /// food (and every `obstacle_every` points an obstacle) is placed.
    pub fn update(&self) -> Result<StepResult, ScoreError> {
        let head = {
            let mut world = self.lock();
            if !world.snake.alive {
                return Ok(StepResult {
                    terminated: true,
                    info: StepInfo::default(),
                });
            }
            let (width, height) = (world.grid_width, world.grid_height);
            world.snake.advance(width, height);
            world.snake.head()
        };

        let Some(score) = self.eat_food_at(head) else {
            return Ok(StepResult {
                terminated: false,
                info: StepInfo::default(),
            });
        };

        let mut info = StepInfo {
            ate_food: true,
            ..StepInfo::default()
        };

        self.place_food();

        if score % self.config.obstacle_every == 0 {
            info.placed_obstacle = self.place_obstacle().is_some();
        }

        if score > self.store.top_score() {
            self.store.set_top_score(score)?;
            info.new_top_score = true;
        }

        debug!(score, "food eaten");
        Ok(StepResult {
            terminated: false,
            info,
        })
    }

    /// Second critical section of a frame: score the food under `head`
    ///
    /// Returns the new score, or `None` if there was nothing to eat or the
    /// snake died (or moved on) since the head was read.
    fn eat_food_at(&self, head: Position) -> Option<u32> {
        let mut world = self.lock();
        if !world.snake.alive || world.food != head || world.snake.head() != head {
            return None;
        }
        world.score += 1;
        world.snake.grow();
        world.snake.speed += self.config.speed_increment;
        Some(world.score)
    }

    /// Move the food to a random cell free of snake and obstacles
    ///
    /// Candidates are drawn outside the lock; only the acceptance check and
    /// the write happen under it. Loops until a free cell turns up.
    pub fn place_food(&self) -> Position {
        let mut rng = rand::thread_rng();
        loop {
            let candidate = Position::new(
                rng.gen_range(0..self.config.grid_width) as i32,
                rng.gen_range(0..self.config.grid_height) as i32,
            );

            let mut world = self.lock();
            if world.is_free(candidate) {
                world.food = candidate;
                return candidate;
            }
        }
    }

    /// Place a random obstacle and start its lifecycle worker
    ///
    /// Returns once the worker is spawned; it is not awaited. Returns `None`
    /// once [`Coordinator::shutdown`] has started.
    pub fn place_obstacle(&self) -> Option<Arc<Obstacle>> {
        let mut rng = rand::thread_rng();
        let config = &self.config;
        loop {
            if self.workers.is_cancelled() {
                return None;
            }

            let size = rng.gen_range(config.obstacle_min_size..=config.obstacle_max_size);
            let origin = Position::new(
                rng.gen_range(0..config.grid_width) as i32,
                rng.gen_range(0..config.grid_height) as i32,
            );
            let duration = Duration::from_millis(
                rng.gen_range(config.obstacle_min_duration_ms..=config.obstacle_max_duration_ms),
            );

            let candidate = Obstacle::new(origin, size, duration);
            if !candidate.fits_within(config.grid_width, config.grid_height) {
                continue;
            }

            if let Some(obstacle) = self.try_place_obstacle_at(candidate) {
                return Some(obstacle);
            }
        }
    }

    /// Insert `obstacle` if it fits the grid and overlaps neither the snake
    /// nor another obstacle, then spawn its lifecycle worker
    ///
    /// After shutdown has started no worker is spawned, and the obstacle is
    /// taken back out and `None` returned.
    pub fn try_place_obstacle_at(&self, obstacle: Obstacle) -> Option<Arc<Obstacle>> {
        let obstacle = Arc::new(obstacle);
        let placed_at = {
            let mut world = self.lock();
            if !world.can_place_obstacle(&obstacle) {
                return None;
            }
            world.obstacles.push(obstacle.clone());
            Instant::now()
        };

        let spawned = self.workers.spawn(ObstacleWorker::new(
            obstacle.clone(),
            self.world.clone(),
            placed_at,
            self.config.poll_interval(),
            self.workers.subscribe(),
        ));
        if !spawned {
            self.lock().remove_obstacle(&obstacle);
            return None;
        }

        let origin = obstacle.origin();
        info!(
            x = origin.x,
            y = origin.y,
            size = obstacle.size(),
            duration_ms = obstacle.duration().as_millis() as u64,
            "obstacle placed"
        );
        Some(obstacle)
    }

    /// Stop every obstacle worker and wait for all of them to finish
    ///
    /// Placement is refused from here on, so no worker can be spawned that
    /// this call does not join.
    pub async fn shutdown(&self) -> ShutdownReport {
        let report = self.workers.shutdown().await;
        info!(
            expired = report.expired,
            collided = report.collided,
            cancelled = report.cancelled,
            failed = report.failed,
            "obstacle workers stopped"
        );
        report
    }

    /// Change the snake's heading (controller entry point)
    pub fn steer(&self, direction: Direction) -> bool {
        self.lock().snake.steer(direction)
    }

    /// Copy of the renderable state, consistent at a single point in time
    pub fn snapshot(&self) -> FrameSnapshot {
        self.lock().snapshot()
    }

    pub fn score(&self) -> u32 {
        self.lock().score
    }

    pub fn snake_len(&self) -> usize {
        self.lock().snake.len()
    }

    pub fn is_alive(&self) -> bool {
        self.lock().snake.alive
    }

    /// Number of obstacles currently on the grid
    pub fn obstacle_count(&self) -> usize {
        self.lock().obstacles.len()
    }

    pub fn top_score(&self) -> u32 {
        self.store.top_score()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }
}
