//! Dark-mode preference.
//!
//! The flag is process-wide: [`init`] reads it once from the preference
//! store at startup and [`toggle`] is the only way to change it afterwards,
//! writing the new value back to the store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::{debug, warn};

pub const DARK_MODE_KEY: &str = "darkMode";

static DARK_MODE: OnceCell<AtomicBool> = OnceCell::new();

#[derive(Debug, Error)]
pub enum PrefError {
    #[error("failed to read preferences '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse preferences '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write preferences '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// String key-value file, one JSON object.
#[derive(Clone, Debug)]
pub struct PrefStore {
    path: PathBuf,
}

impl PrefStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, PrefError> {
        Ok(self.load()?.remove(key))
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), PrefError> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());

        let display = self.path.display().to_string();
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PrefError::Write {
                path: display.clone(),
                source: e,
            })?;
        }
        let body = serde_json::to_vec_pretty(&entries).map_err(|e| PrefError::Parse {
            path: display.clone(),
            source: e,
        })?;
        std::fs::write(&self.path, body).map_err(|e| PrefError::Write {
            path: display,
            source: e,
        })
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, PrefError> {
        Ok(self.get(key)?.as_deref() == Some("true"))
    }

    pub fn set_bool(&self, key: &str, value: bool) -> Result<(), PrefError> {
        self.set(key, if value { "true" } else { "false" })
    }

    fn load(&self) -> Result<BTreeMap<String, String>, PrefError> {
        let display = self.path.display().to_string();
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| PrefError::Parse {
                path: display,
                source: e,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(PrefError::Read {
                path: display,
                source: e,
            }),
        }
    }
}

/// Loads the stored flag. Later calls keep the first value.
pub fn init(store: &PrefStore) -> bool {
    let dark = match store.get_bool(DARK_MODE_KEY) {
        Ok(dark) => dark,
        Err(err) => {
            warn!(error = %err, "falling back to light mode");
            false
        }
    };
    let cell = DARK_MODE.get_or_init(|| AtomicBool::new(dark));
    let current = cell.load(Ordering::SeqCst);
    debug!(dark = current, "theme initialised");
    current
}

pub fn is_dark() -> bool {
    DARK_MODE
        .get()
        .map(|flag| flag.load(Ordering::SeqCst))
        .unwrap_or(false)
}

/// Flips the flag and persists it. The in-memory flag changes even if the
/// write fails.
pub fn toggle(store: &PrefStore) -> Result<bool, PrefError> {
    let flag = DARK_MODE.get_or_init(|| AtomicBool::new(false));
    let next = !flag.fetch_xor(true, Ordering::SeqCst);
    store.set_bool(DARK_MODE_KEY, next)?;
    debug!(dark = next, "theme toggled");
    Ok(next)
}

pub fn label(dark: bool) -> &'static str {
    if dark {
        "dark"
    } else {
        "light"
    }
}
