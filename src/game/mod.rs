//! Core game logic
//!
//! Spatial primitives, the lock-owning [`Coordinator`] and the obstacle
//! lifecycle workers. Nothing here does terminal I/O.

pub mod config;
pub mod coordinator;
pub mod direction;
pub mod lifecycle;
pub mod obstacle;
pub mod state;

// Re-export commonly used types
pub use config::GameConfig;
pub use coordinator::{Coordinator, StepInfo, StepResult};
pub use direction::Direction;
pub use lifecycle::{LifecycleOutcome, ShutdownReport};
pub use obstacle::Obstacle;
pub use state::{FrameSnapshot, GameState, Position, Snake};
