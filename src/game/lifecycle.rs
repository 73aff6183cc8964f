//! Obstacle lifecycle workers
//!
//! Every placed obstacle gets one tokio task that polls its own expiry and
//! whether the snake has run into it. The task ends in exactly one of
//! [`LifecycleOutcome::Expired`], [`LifecycleOutcome::Collided`] or
//! [`LifecycleOutcome::Cancelled`].
//!
//! Workers share the coordinator's world lock. It is taken for the short
//! check of each tick and always released before the worker sleeps.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use super::obstacle::Obstacle;
use super::state::GameState;

/// How a lifecycle worker ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOutcome {
    /// Duration elapsed; the obstacle removed itself from the world
    Expired,
    /// The snake head entered the obstacle; the snake is dead
    Collided,
    /// Shutdown was signalled first; nothing was mutated
    Cancelled,
}

/// Monitors one obstacle until it expires, is hit, or shutdown is signalled
pub(crate) struct ObstacleWorker {
    obstacle: Arc<Obstacle>,
    world: Arc<Mutex<GameState>>,
    placed_at: Instant,
    poll_interval: Duration,
    cancel: watch::Receiver<bool>,
}

impl ObstacleWorker {
    pub(crate) fn new(
        obstacle: Arc<Obstacle>,
        world: Arc<Mutex<GameState>>,
        placed_at: Instant,
        poll_interval: Duration,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        Self {
            obstacle,
            world,
            placed_at,
            poll_interval,
            cancel,
        }
    }

    pub(crate) async fn run(mut self) -> LifecycleOutcome {
        let origin = self.obstacle.origin();
        let outcome = loop {
            if *self.cancel.borrow() {
                break LifecycleOutcome::Cancelled;
            }

            if let Some(outcome) = self.tick() {
                break outcome;
            }

            tokio::select! {
                _ = sleep(self.poll_interval) => {}
                changed = self.cancel.changed() => {
                    // A dropped sender means the coordinator is gone
                    if changed.is_err() || *self.cancel.borrow() {
                        break LifecycleOutcome::Cancelled;
                    }
                }
            }
        };

        debug!(x = origin.x, y = origin.y, ?outcome, "obstacle worker finished");
        outcome
    }

    /// One locked check; `Some` once a terminal state was reached and applied
    fn tick(&self) -> Option<LifecycleOutcome> {
        let mut world = self.world.lock().unwrap_or_else(PoisonError::into_inner);

        if self.placed_at.elapsed() >= self.obstacle.duration() {
            world.remove_obstacle(&self.obstacle);
            return Some(LifecycleOutcome::Expired);
        }

        if self.obstacle.occupies(world.snake.head()) {
            world.snake.alive = false;
            return Some(LifecycleOutcome::Collided);
        }

        None
    }
}

/// Terminal outcomes of the workers a registry has retired
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub expired: usize,
    pub collided: usize,
    pub cancelled: usize,
    /// Workers that panicked or were aborted by the runtime
    pub failed: usize,
}

impl ShutdownReport {
    fn record(&mut self, result: Result<LifecycleOutcome, JoinError>) {
        match result {
            Ok(LifecycleOutcome::Expired) => self.expired += 1,
            Ok(LifecycleOutcome::Collided) => self.collided += 1,
            Ok(LifecycleOutcome::Cancelled) => self.cancelled += 1,
            Err(err) => {
                warn!(%err, "obstacle worker did not finish cleanly");
                self.failed += 1;
            }
        }
    }

    /// Number of workers accounted for
    pub fn total(&self) -> usize {
        self.expired + self.collided + self.cancelled + self.failed
    }
}

#[derive(Default)]
struct RegistryInner {
    handles: Vec<JoinHandle<LifecycleOutcome>>,
    retired: ShutdownReport,
}

/// Tracks every spawned lifecycle worker and the shared cancellation flag
pub(crate) struct WorkerRegistry {
    runtime: Handle,
    cancel: watch::Sender<bool>,
    inner: Mutex<RegistryInner>,
}

impl WorkerRegistry {
    pub(crate) fn new(runtime: Handle) -> Self {
        let (cancel, _rx) = watch::channel(false);
        Self {
            runtime,
            cancel,
            inner: Mutex::new(RegistryInner::default()),
        }
    }

    /// Receiver for a new worker's cancellation flag
    pub(crate) fn subscribe(&self) -> watch::Receiver<bool> {
        self.cancel.subscribe()
    }

    /// Spawn `worker` on the runtime and keep its handle
    ///
    /// Handles of workers that already finished are collected first, so the
    /// registry grows with live obstacles rather than with total placements.
    /// Returns false, without spawning, once shutdown has been signalled.
    pub(crate) fn spawn(&self, worker: ObstacleWorker) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        // Checked under the registry lock: shutdown flips the flag before
        // taking the handles, so every accepted worker is joined
        if self.is_cancelled() {
            return false;
        }

        let handle = self.runtime.spawn(worker.run());
        let RegistryInner { handles, retired } = &mut *inner;
        handles.retain_mut(|handle| match handle.now_or_never() {
            Some(result) => {
                retired.record(result);
                false
            }
            None => true,
        });
        handles.push(handle);
        true
    }

    /// Whether shutdown has been signalled
    pub(crate) fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Workers spawned and not yet collected
    pub(crate) fn tracked(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .handles
            .len()
    }

    /// Signal cancellation and wait for every tracked worker to finish
    ///
    /// The returned report covers every worker retired since the previous
    /// shutdown, so a second call only reports stragglers spawned in between.
    pub(crate) async fn shutdown(&self) -> ShutdownReport {
        self.cancel.send_replace(true);

        let RegistryInner {
            handles,
            mut retired,
        } = std::mem::take(&mut *self.inner.lock().unwrap_or_else(PoisonError::into_inner));

        for handle in handles {
            retired.record(handle.await);
        }
        retired
    }
}

impl Drop for WorkerRegistry {
    fn drop(&mut self) {
        // Workers cannot be awaited here; make sure they at least stop polling
        self.cancel.send_replace(true);
    }
}
