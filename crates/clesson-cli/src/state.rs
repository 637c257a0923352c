//! Learner-local client state.
//!
//! Stored as JSON at `~/.c-learning/config.json`. The file is created with a
//! fresh user id the first time the CLI runs.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Directory under the home directory that holds the state file.
const STATE_DIR: &str = ".c-learning";

/// State file name.
const STATE_FILE: &str = "config.json";

/// Workspace directory name under the home directory.
const WORKSPACE_DIR: &str = "c-learning";

/// Returns the user's home directory, falling back to the current directory.
fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Default location of the state file.
pub fn default_state_path() -> PathBuf {
    home_dir().join(STATE_DIR).join(STATE_FILE)
}

/// Persisted client state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientState {
    /// Learner id sent to the server.
    pub user_id: String,

    /// Lesson most recently opened.
    #[serde(default = "default_last_lesson")]
    pub last_lesson: u32,

    /// Root directory for lesson workspaces.
    pub working_dir: PathBuf,

    /// Workspace of the active lesson; empty when none is active.
    #[serde(default)]
    pub current_dir: PathBuf,
}

const fn default_last_lesson() -> u32 {
    1
}

impl ClientState {
    /// Creates state for a new learner rooted at `working_dir`.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            user_id: uuid::Uuid::new_v4().to_string(),
            last_lesson: default_last_lesson(),
            working_dir: working_dir.into(),
            current_dir: PathBuf::new(),
        }
    }

    /// Loads state from `path`, creating and saving a fresh record if the
    /// file does not exist.
    pub fn load_or_create(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let state: Self = serde_json::from_str(&contents).with_context(|| {
                    format!(
                        "Invalid client state in '{}'\n\nSuggestion: Fix or delete the file to start over",
                        path.display()
                    )
                })?;
                debug!(path = %path.display(), user_id = %state.user_id, "Loaded client state");
                Ok(state)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let state = Self::new(home_dir().join(WORKSPACE_DIR));
                state.save(path)?;
                info!(path = %path.display(), user_id = %state.user_id, "Created client state");
                Ok(state)
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read '{}'", path.display())),
        }
    }

    /// Writes state to `path` as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create '{}'", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write '{}'", path.display()))
    }

    /// Returns the active lesson workspace, if any.
    pub fn active_dir(&self) -> Option<&Path> {
        if self.current_dir.as_os_str().is_empty() {
            None
        } else {
            Some(&self.current_dir)
        }
    }

    /// Records `lesson_id` as active in `dir`.
    pub fn activate(&mut self, lesson_id: u32, dir: impl Into<PathBuf>) {
        self.last_lesson = lesson_id;
        self.current_dir = dir.into();
    }
}
