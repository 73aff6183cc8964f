use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the game
///
/// Every field has a default, so a JSON config file only needs to name the
/// values it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Width of the game grid
    pub grid_width: usize,
    /// Height of the game grid
    pub grid_height: usize,

    /// Cells travelled per frame at game start
    pub initial_speed: f32,
    /// Speed added every time the snake eats
    pub speed_increment: f32,

    /// An obstacle is placed whenever the score is a multiple of this
    pub obstacle_every: u32,
    /// Smallest obstacle side length (inclusive)
    pub obstacle_min_size: usize,
    /// Largest obstacle side length (inclusive)
    pub obstacle_max_size: usize,
    /// Shortest obstacle lifetime in milliseconds (inclusive)
    pub obstacle_min_duration_ms: u64,
    /// Longest obstacle lifetime in milliseconds (inclusive)
    pub obstacle_max_duration_ms: u64,
    /// How often each obstacle worker checks for expiry and collision
    pub obstacle_poll_ms: u64,

    /// Target frame rate of the main loop
    pub frames_per_second: u32,
    /// Where the top score is persisted
    pub score_file: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: 32,
            grid_height: 32,
            initial_speed: 0.1,
            speed_increment: 0.02,
            obstacle_every: 3,
            obstacle_min_size: 2,
            obstacle_max_size: 4,
            obstacle_min_duration_ms: 5_000,
            obstacle_max_duration_ms: 30_000,
            obstacle_poll_ms: 1,
            frames_per_second: 60,
            score_file: PathBuf::from("./game_data.txt"),
        }
    }
}

impl GameConfig {
    /// Create a new configuration with custom grid size
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            grid_width: width,
            grid_height: height,
            ..Default::default()
        }
    }

    /// Create a small grid for testing
    pub fn small() -> Self {
        Self::new(10, 10)
    }

    /// Load a configuration from a JSON file; missing fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: GameConfig = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    /// Polling interval of the obstacle lifecycle workers
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.obstacle_poll_ms)
    }

    /// Target duration of one frame
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs(1) / self.frames_per_second.max(1)
    }

    /// Validate configuration parameters
    ///
    /// Returns `Err(String)` describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(format!(
                "grid must be non-empty, got {}x{}",
                self.grid_width, self.grid_height
            ));
        }

        if self.initial_speed <= 0.0 {
            return Err(format!(
                "initial_speed must be positive, got {}",
                self.initial_speed
            ));
        }

        if self.speed_increment < 0.0 {
            return Err(format!(
                "speed_increment must be non-negative, got {}",
                self.speed_increment
            ));
        }

        if self.obstacle_every == 0 {
            return Err("obstacle_every must be at least 1".to_string());
        }

        if self.obstacle_min_size < 2 {
            return Err(format!(
                "obstacle_min_size must be at least 2, got {}",
                self.obstacle_min_size
            ));
        }

        if self.obstacle_min_size > self.obstacle_max_size {
            return Err(format!(
                "obstacle_min_size ({}) cannot exceed obstacle_max_size ({})",
                self.obstacle_min_size, self.obstacle_max_size
            ));
        }

        if self.obstacle_max_size > self.grid_width.min(self.grid_height) {
            return Err(format!(
                "obstacle_max_size ({}) does not fit a {}x{} grid",
                self.obstacle_max_size, self.grid_width, self.grid_height
            ));
        }

        if self.obstacle_min_duration_ms > self.obstacle_max_duration_ms {
            return Err(format!(
                "obstacle_min_duration_ms ({}) cannot exceed obstacle_max_duration_ms ({})",
                self.obstacle_min_duration_ms, self.obstacle_max_duration_ms
            ));
        }

        if self.obstacle_poll_ms == 0 {
            return Err("obstacle_poll_ms must be at least 1".to_string());
        }

        if self.frames_per_second == 0 {
            return Err("frames_per_second must be at least 1".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.grid_width, 32);
        assert_eq!(config.grid_height, 32);
        assert_eq!(config.obstacle_every, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_config() {
        let config = GameConfig::new(15, 12);
        assert_eq!(config.grid_width, 15);
        assert_eq!(config.grid_height, 12);
        assert_eq!(config.speed_increment, 0.02);
    }

    #[test]
    fn test_frame_duration() {
        let config = GameConfig::default();
        assert_eq!(config.frame_duration(), Duration::from_secs(1) / 60);
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_validation_obstacle_too_small() {
        let mut config = GameConfig::default();
        config.obstacle_min_size = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_obstacle_larger_than_grid() {
        let mut config = GameConfig::new(3, 3);
        config.obstacle_max_size = 4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_inverted_ranges() {
        let mut config = GameConfig::default();
        config.obstacle_min_duration_ms = 10;
        config.obstacle_max_duration_ms = 5;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.obstacle_min_size = 4;
        config.obstacle_max_size = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_rates() {
        let mut config = GameConfig::default();
        config.frames_per_second = 0;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.obstacle_poll_ms = 0;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.initial_speed = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "grid_width": 20, "obstacle_poll_ms": 5 }"#).unwrap();

        let config = GameConfig::from_json_file(&path).unwrap();
        assert_eq!(config.grid_width, 20);
        assert_eq!(config.grid_height, 32);
        assert_eq!(config.obstacle_poll_ms, 5);
    }

    #[test]
    fn test_missing_json_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(GameConfig::from_json_file(&dir.path().join("nope.json")).is_err());
    }
}
