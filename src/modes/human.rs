use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stderr, stderr};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

use crate::game::{Coordinator, Direction, GameConfig};
use crate::input::{InputHandler, KeyAction};
use crate::metrics::GameMetrics;
use crate::persistence::TopScoreStore;
use crate::render::Renderer;

/// Final numbers of a finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSummary {
    pub score: u32,
    pub size: usize,
}

/// Interactive play in the terminal
///
/// Each frame: apply buffered input, `Coordinator::update`, then render a
/// snapshot taken under the world lock.
pub struct HumanMode {
    coordinator: Coordinator,
    metrics: GameMetrics,
    renderer: Renderer,
    input_handler: InputHandler,
    should_quit: bool,
    pending_direction: Option<Direction>,
}

impl HumanMode {
    /// Must be called from within the tokio runtime that will drive `run`
    pub fn new(config: GameConfig, store: Arc<TopScoreStore>) -> Self {
        Self {
            coordinator: Coordinator::new(config, store),
            metrics: GameMetrics::new(),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            should_quit: false,
            pending_direction: None,
        }
    }

    /// Play until the user quits, then stop every obstacle worker
    pub async fn run(&mut self) -> Result<GameSummary> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        // Run game loop with cleanup
        let result = self.run_game_loop(&mut terminal).await;

        // Cleanup terminal
        self.cleanup_terminal(&mut terminal)?;

        let report = self.coordinator.shutdown().await;
        if report.failed > 0 {
            warn!(failed = report.failed, "some obstacle workers did not stop cleanly");
        }

        result?;
        Ok(self.summary())
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        // Sleep out the rest of a frame rather than bursting to catch up
        let mut frame_timer = interval(self.coordinator.config().frame_duration());
        frame_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            fps = self.coordinator.config().frames_per_second,
            "game loop started"
        );

        loop {
            tokio::select! {
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event);
                    }
                }

                _ = frame_timer.tick() => {
                    self.frame(terminal)?;
                }

                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        info!(score = self.coordinator.score(), "game loop stopped");
        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        let Event::Key(key) = event else {
            return;
        };
        // Only process key press events, not release
        if key.kind != KeyEventKind::Press {
            return;
        }

        match self.input_handler.handle_key_event(key) {
            KeyAction::Steer(direction) => self.pending_direction = Some(direction),
            KeyAction::Quit => self.should_quit = true,
            KeyAction::None => {}
        }
    }

    /// Input, update, render
    fn frame(&mut self, terminal: &mut Terminal<CrosstermBackend<Stderr>>) -> Result<()> {
        if let Some(direction) = self.pending_direction.take() {
            self.coordinator.steer(direction);
        }

        let result = self
            .coordinator
            .update()
            .context("Failed to record top score")?;
        if result.info.new_top_score {
            info!(score = self.coordinator.score(), "new top score");
        }

        let snapshot = self.coordinator.snapshot();
        self.metrics.on_frame(
            Instant::now(),
            snapshot.score,
            self.coordinator.top_score(),
        );

        terminal
            .draw(|frame| {
                self.renderer.render(frame, &snapshot, &self.metrics);
            })
            .context("Failed to draw frame")?;

        Ok(())
    }

    fn summary(&self) -> GameSummary {
        GameSummary {
            score: self.coordinator.score(),
            size: self.coordinator.snake_len(),
        }
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}
