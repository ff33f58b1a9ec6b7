use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tracing::{debug, warn};
use wizardpro_phase_api::RunState;
use wizardpro_utils::atomic_write::write_file_atomic;

use crate::{StateStore, StoreError, check_key, decode};

/// Stores each run as `<dir>/<run_id>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: Utf8PathBuf,
}

impl JsonFileStore {
    /// The directory is created on first save.
    #[must_use]
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, run_id: &str) -> Utf8PathBuf {
        self.dir.join(format!("{run_id}.json"))
    }
}

impl StateStore for JsonFileStore {
    fn save(&self, run_id: &str, state: &RunState) -> Result<(), StoreError> {
        check_key(run_id)?;
        let path = self.path_for(run_id);
        let json = serde_json::to_string_pretty(state)?;

        let result = write_file_atomic(&path, &json).map_err(|err| {
            let source = match err.downcast::<std::io::Error>() {
                Ok(io) => io,
                Err(other) => std::io::Error::other(format!("{other:#}")),
            };
            StoreError::io(path.clone(), source)
        })?;
        for warning in &result.warnings {
            warn!(run_id, path = %path, "{warning}");
        }
        debug!(run_id, path = %path, bytes = result.bytes_written, "Saved run state");
        Ok(())
    }

    fn load(&self, run_id: &str) -> Result<Option<RunState>, StoreError> {
        check_key(run_id)?;
        let path = self.path_for(run_id);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };
        decode(run_id, &json).map(Some)
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(self.dir.clone(), e)),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(self.dir.clone(), e))?;
            let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else {
                continue;
            };
            if path.extension() != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem()
                && check_key(stem).is_ok()
            {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}
