// Global preferences for the avatar gallery (not user-specific)
use std::fs;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{TooltipStyle, DEFAULT_AVATAR_SIZE};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AvatarPrefs {
    pub avatar_size: f32,
    pub tooltip_style: TooltipStyle,
    pub log_file: Option<PathBuf>,
}

impl Default for AvatarPrefs {
    fn default() -> Self {
        Self {
            avatar_size: DEFAULT_AVATAR_SIZE,
            tooltip_style: TooltipStyle::default(),
            log_file: None,
        }
    }
}

impl AvatarPrefs {
    pub fn config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".nexus_avatar_prefs.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("nexus-avatar.log"))
    }

    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Reads prefs from `path`, falling back to defaults when missing or malformed.
    pub fn load_from(path: &std::path::Path) -> Self {
        if let Ok(data) = fs::read_to_string(path) {
            match serde_json::from_str(&data) {
                Ok(prefs) => return prefs,
                Err(e) => warn!(path = %path.display(), error = %e, "ignoring malformed avatar prefs"),
            }
        }
        Self::default()
    }

    pub fn save(&self) {
        let path = Self::config_path();
        if let Ok(data) = serde_json::to_string_pretty(self) {
            if let Err(e) = fs::write(&path, data) {
                warn!(path = %path.display(), error = %e, "failed to save avatar prefs");
            }
        }
    }
}

static GLOBAL_PREFS: OnceCell<RwLock<AvatarPrefs>> = OnceCell::new();

pub fn init_global_prefs() {
    GLOBAL_PREFS.set(RwLock::new(AvatarPrefs::load())).ok();
}

pub fn global_prefs() -> RwLockReadGuard<'static, AvatarPrefs> {
    GLOBAL_PREFS
        .get_or_init(|| RwLock::new(AvatarPrefs::load()))
        .read()
        .unwrap_or_else(|e| e.into_inner())
}

pub fn global_prefs_mut() -> RwLockWriteGuard<'static, AvatarPrefs> {
    GLOBAL_PREFS
        .get_or_init(|| RwLock::new(AvatarPrefs::load()))
        .write()
        .unwrap_or_else(|e| e.into_inner())
}
