//! Top-score persistence
//!
//! The store keeps the score in memory and writes it from a background thread
//! so the game loop never waits on disk.

pub mod backend;
pub mod error;
pub mod record;
pub mod top_score;

pub use backend::{FileBackend, MemoryBackend, ScoreBackend};
pub use error::{RecordError, ScoreError};
pub use top_score::TopScoreStore;
