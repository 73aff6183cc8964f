use std::time::{Duration, Instant};

/// Values shown in the header, refreshed once per second
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TitleStats {
    pub score: u32,
    pub fps: u32,
    pub top_score: u32,
}

/// Frame-rate bookkeeping for the main loop
pub struct GameMetrics {
    pub start_time: Instant,
    pub elapsed_time: Duration,
    title_timestamp: Instant,
    frame_count: u32,
    pub title: TitleStats,
}

impl GameMetrics {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            start_time: now,
            elapsed_time: Duration::ZERO,
            title_timestamp: now,
            frame_count: 0,
            title: TitleStats::default(),
        }
    }

    /// Count one finished frame
    ///
    /// Once at least a second has passed since the last refresh the header
    /// stats are replaced (FPS is the number of frames in that window) and
    /// true is returned.
    pub fn on_frame(&mut self, now: Instant, score: u32, top_score: u32) -> bool {
        self.frame_count += 1;
        self.elapsed_time = now.duration_since(self.start_time);

        if now.duration_since(self.title_timestamp) < Duration::from_secs(1) {
            return false;
        }

        self.title = TitleStats {
            score,
            fps: self.frame_count,
            top_score,
        };
        self.frame_count = 0;
        self.title_timestamp = now;
        true
    }

    pub fn format_time(&self) -> String {
        let total_secs = self.elapsed_time.as_secs();
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;
        format!("{:02}:{:02}", minutes, seconds)
    }
}

impl Default for GameMetrics {
    fn default() -> Self {
        Self::new()
    }
}
