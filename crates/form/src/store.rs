use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::state::FormState;

/// Name the draft is stored under.
pub const STORAGE_KEY: &str = "localranklens-form-state";

/// Durable home for the form draft.
///
/// `load` never fails: a missing or unreadable draft yields the default form.
pub trait DraftStore {
    fn load(&self) -> FormState;
    fn save(&self, state: &FormState) -> anyhow::Result<()>;
    fn clear(&self) -> anyhow::Result<()>;
}

/// Keeps the draft as `<dir>/localranklens-form-state.json`.
pub struct FileDraftStore {
    path: PathBuf,
}

impl FileDraftStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{STORAGE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DraftStore for FileDraftStore {
    fn load(&self) -> FormState {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %self.path.display(), error = %err, "failed to read draft");
                }
                return FormState::default();
            }
        };
        decode(&raw).unwrap_or_else(|| {
            tracing::warn!(path = %self.path.display(), "draft is corrupt, starting fresh");
            FormState::default()
        })
    }

    fn save(&self, state: &FormState) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(state).context("failed to encode draft")?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }

    fn clear(&self) -> anyhow::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("failed to remove {}", self.path.display()))
            }
        }
    }
}

/// Holds the serialized draft in memory, the way a browser keeps it in
/// local storage.
#[derive(Default)]
pub struct MemoryDraftStore {
    raw: Mutex<Option<String>>,
}

impl MemoryDraftStore {
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.lock().ok().and_then(|guard| guard.clone())
    }
}

impl DraftStore for MemoryDraftStore {
    fn load(&self) -> FormState {
        self.raw()
            .as_deref()
            .and_then(decode)
            .unwrap_or_default()
    }

    fn save(&self, state: &FormState) -> anyhow::Result<()> {
        let raw = serde_json::to_string(state).context("failed to encode draft")?;
        let mut guard = self
            .raw
            .lock()
            .map_err(|_| anyhow::anyhow!("draft store lock poisoned"))?;
        *guard = Some(raw);
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        let mut guard = self
            .raw
            .lock()
            .map_err(|_| anyhow::anyhow!("draft store lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}

fn decode(raw: &str) -> Option<FormState> {
    serde_json::from_str::<FormState>(raw)
        .ok()
        .and_then(FormState::repaired)
}
