use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Durable storage for the encoded top-score record
///
/// Implementations are called from the store's flush thread, never from the
/// frame loop.
pub trait ScoreBackend: Send + Sync + 'static {
    /// Read the stored record; `Ok(None)` when nothing was saved yet
    fn load(&self) -> io::Result<Option<String>>;

    /// Replace the stored record
    fn save(&self, contents: &str) -> io::Result<()>;
}

/// Record kept in a plain text file
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoreBackend for FileBackend {
    fn load(&self) -> io::Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Writes a sibling temp file and renames it over the record, so a crash
    /// mid-write leaves the previous record intact.
    fn save(&self, contents: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)
    }
}

/// Record kept in memory; clones share the same slot
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing record
    pub fn with_contents(contents: &str) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(contents.to_string()))),
        }
    }

    /// Current record, if any was saved
    pub fn contents(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ScoreBackend for MemoryBackend {
    fn load(&self) -> io::Result<Option<String>> {
        Ok(self.contents())
    }

    fn save(&self, contents: &str) -> io::Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(contents.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_none() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path().join("game_data.txt"));
        assert_eq!(backend.load().unwrap(), None);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path().join("nested").join("game_data.txt"));

        backend.save("TOP_SCORE=3\n").unwrap();
        backend.save("TOP_SCORE=5\n").unwrap();

        assert_eq!(backend.load().unwrap().as_deref(), Some("TOP_SCORE=5\n"));
        assert!(!backend.path().with_extension("tmp").exists());
    }

    #[test]
    fn test_memory_backend_shares_slot() {
        let backend = MemoryBackend::new();
        let view = backend.clone();
        backend.save("TOP_SCORE=1\n").unwrap();
        assert_eq!(view.contents().as_deref(), Some("TOP_SCORE=1\n"));
    }
}
