//! Durable top score with non-blocking writes.
//!
//! The frame loop only touches an in-memory record. A dedicated flush thread
//! sleeps on a condition variable until the record is marked dirty (or the
//! store shuts down) and then writes it through the [`ScoreBackend`].

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info, warn};

use super::backend::ScoreBackend;
use super::error::ScoreError;
use super::record::{format_record, parse_record};

#[derive(Debug, Default)]
struct Record {
    top_score: u32,
    pending: bool,
    shutdown: bool,
    fault: Option<ScoreError>,
}

struct Shared {
    record: Mutex<Record>,
    dirty: Condvar,
    backend: Box<dyn ScoreBackend>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Record> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Single monotonic high-score counter backed by durable storage
pub struct TopScoreStore {
    shared: Arc<Shared>,
    flusher: Mutex<Option<JoinHandle<Result<(), ScoreError>>>>,
}

impl TopScoreStore {
    /// Hydrate from `backend` and start the flush thread
    ///
    /// A missing record starts at 0. An unreadable or malformed record also
    /// starts at 0; that is logged, not returned.
    pub fn open(backend: impl ScoreBackend) -> std::io::Result<Self> {
        let top_score = hydrate(&backend);

        let shared = Arc::new(Shared {
            record: Mutex::new(Record {
                top_score,
                ..Record::default()
            }),
            dirty: Condvar::new(),
            backend: Box::new(backend),
        });

        let worker = shared.clone();
        let handle = thread::Builder::new()
            .name("top-score-flush".into())
            .spawn(move || flush_loop(&worker))?;

        Ok(Self {
            shared,
            flusher: Mutex::new(Some(handle)),
        })
    }

    /// Last known top score; never does I/O
    pub fn top_score(&self) -> u32 {
        self.shared.lock().top_score
    }

    /// Raise the top score and schedule a background write
    ///
    /// Fails with [`ScoreError::InvariantViolation`] if `score` is below the
    /// current value (the stored value is left unchanged), and with
    /// [`ScoreError::Flush`] once a background write has failed.
    pub fn set_top_score(&self, score: u32) -> Result<(), ScoreError> {
        let mut record = self.shared.lock();

        if let Some(fault) = &record.fault {
            return Err(fault.clone());
        }

        if score < record.top_score {
            return Err(ScoreError::InvariantViolation {
                current: record.top_score,
                attempted: score,
            });
        }

        record.top_score = score;
        record.pending = true;
        self.shared.dirty.notify_one();
        Ok(())
    }

    /// The write failure that stopped the flush thread, if any
    pub fn fault(&self) -> Option<ScoreError> {
        self.shared.lock().fault.clone()
    }

    /// Flush any pending write, stop the flush thread and wait for it
    ///
    /// Safe to call more than once; later calls only report the fault.
    pub fn shutdown(&self) -> Result<(), ScoreError> {
        {
            let mut record = self.shared.lock();
            record.shutdown = true;
            self.shared.dirty.notify_one();
        }

        let handle = self
            .flusher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("top score flush thread panicked");
            }
        }

        match self.fault() {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }
}

impl Drop for TopScoreStore {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            error!(%err, "top score was not persisted");
        }
    }
}

fn hydrate(backend: &dyn ScoreBackend) -> u32 {
    let contents = match backend.load() {
        Ok(Some(contents)) => contents,
        Ok(None) => {
            info!("no saved top score, starting from 0");
            return 0;
        }
        Err(err) => {
            warn!(%err, "could not read saved top score, starting from 0");
            return 0;
        }
    };

    match parse_record(&contents) {
        Ok(score) => {
            let score = score.unwrap_or(0);
            info!(score, "loaded top score");
            score
        }
        Err(err) => {
            warn!(%err, "saved top score is malformed, starting from 0");
            0
        }
    }
}

fn flush_loop(shared: &Shared) -> Result<(), ScoreError> {
    debug!("top score flush thread started");
    let mut record = shared.lock();

    loop {
        record = shared
            .dirty
            .wait_while(record, |r| !r.pending && !r.shutdown)
            .unwrap_or_else(PoisonError::into_inner);

        if record.pending {
            let score = record.top_score;
            record.pending = false;
            drop(record);

            let result = shared.backend.save(&format_record(score));

            record = shared.lock();
            if let Err(err) = result {
                let fault = ScoreError::Flush(Arc::new(err));
                error!(score, err = %fault, "top score flush failed");
                record.fault = Some(fault.clone());
                return Err(fault);
            }
            debug!(score, "top score flushed");
            continue;
        }

        if record.shutdown {
            debug!("top score flush thread stopping");
            return Ok(());
        }
    }
}
