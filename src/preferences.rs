//! User preferences
//!
//! A small key-value record persisted between runs. The training core only
//! reads `volume` and `metronome_enabled`; the last selection is remembered
//! so a front end can preselect it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserPreferences {
    pub last_shot_type: Option<String>,
    pub last_pro: Option<String>,
    pub volume: f32,
    pub metronome_enabled: bool,
    pub haptic_feedback_enabled: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            last_shot_type: None,
            last_pro: None,
            volume: 0.8,
            metronome_enabled: true,
            haptic_feedback_enabled: true,
        }
    }
}

impl UserPreferences {
    pub fn reset_to_defaults(&mut self) {
        *self = Self::default();
    }

    /// Master volume limited to `[0, 1]`; NaN reads as silent.
    pub fn clamped_volume(&self) -> f32 {
        if self.volume.is_nan() {
            0.0
        } else {
            self.volume.clamp(0.0, 1.0)
        }
    }
}

/// Storage behind [`UserPreferences`].
pub trait PreferenceStore: Send + Sync {
    /// Current preferences; defaults when nothing has been stored.
    fn load(&self) -> UserPreferences;

    fn save(&self, preferences: &UserPreferences) -> anyhow::Result<()>;
}

/// JSON file store
pub struct JsonPreferenceStore {
    path: PathBuf,
}

impl JsonPreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn load(&self) -> UserPreferences {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return UserPreferences::default();
            }
            Err(err) => {
                log::warn!(
                    "[Preferences] Failed to read {:?}: {}. Using defaults.",
                    self.path,
                    err
                );
                return UserPreferences::default();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|err| {
            log::warn!(
                "[Preferences] Failed to parse {:?}: {}. Using defaults.",
                self.path,
                err
            );
            UserPreferences::default()
        })
    }

    fn save(&self, preferences: &UserPreferences) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(preferences)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryPreferenceStore {
    inner: Mutex<UserPreferences>,
}

impl MemoryPreferenceStore {
    pub fn new(preferences: UserPreferences) -> Self {
        Self {
            inner: Mutex::new(preferences),
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> UserPreferences {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn save(&self, preferences: &UserPreferences) -> anyhow::Result<()> {
        *self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = preferences.clone();
        Ok(())
    }
}
