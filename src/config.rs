use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Settings read by the rewrite pipeline. Key names follow the host's stored
/// configuration so an existing config file deserializes unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub enable_ad_block: bool,
    pub enable_paid_promotion_overlay: bool,
    /// Codec substring to keep in adaptive formats; "any" disables filtering.
    pub video_preferred_codec: String,
    pub enable_hide_end_screen_cards: bool,
    /// Keep the "are you still watching" prompt.
    pub enable_you_there_renderer: bool,
    pub enable_shorts: bool,
    pub enable_previews: bool,
    pub enable_de_arrow: bool,
    pub enable_de_arrow_thumbnails: bool,
    pub enable_hq_thumbnails: bool,
    pub enable_long_press: bool,
    pub enable_hide_watched_videos: bool,
    /// Page contexts where watched videos are hidden. Empty means every page.
    pub hide_watched_videos_pages: Vec<String>,
    /// Progress percentage at or above which a video counts as watched.
    pub hide_watched_videos_threshold: f64,
    pub enable_hide_watched_in_playlists: bool,
    /// Sponsor segment categories offered as manual skip actions.
    pub sponsor_block_manual_skips: Vec<String>,
    pub enable_sponsor_block_highlight: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_ad_block: true,
            enable_paid_promotion_overlay: false,
            video_preferred_codec: "any".to_string(),
            enable_hide_end_screen_cards: false,
            enable_you_there_renderer: false,
            enable_shorts: true,
            enable_previews: false,
            enable_de_arrow: false,
            enable_de_arrow_thumbnails: false,
            enable_hq_thumbnails: false,
            enable_long_press: true,
            enable_hide_watched_videos: false,
            hide_watched_videos_pages: Vec::new(),
            hide_watched_videos_threshold: 90.0,
            enable_hide_watched_in_playlists: false,
            sponsor_block_manual_skips: Vec::new(),
            enable_sponsor_block_highlight: true,
        }
    }
}

impl Settings {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::Config(format!("invalid json settings: {e}")))
    }

    /// Load settings from a `.json` or `.toml` file (by extension, TOML otherwise).
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&raw),
            _ => Self::from_toml_str(&raw),
        }
    }

    /// Load from `path`, or the per-user default location. A missing file
    /// falls back to defaults; a malformed one is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            warn!("config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(&path)
    }
}

/// `<config dir>/reshelf/config.toml` for the current user.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "reshelf").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Source of the settings snapshot taken once per payload.
pub trait ConfigReader: Send + Sync {
    fn settings(&self) -> Settings;
}

impl ConfigReader for Settings {
    fn settings(&self) -> Settings {
        self.clone()
    }
}

/// Settings the host may replace between payloads.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<Settings>>,
}

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self { inner: Arc::new(RwLock::new(settings)) }
    }

    pub fn update(&self, f: impl FnOnce(&mut Settings)) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard);
    }
}

impl ConfigReader for SharedSettings {
    fn settings(&self) -> Settings {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
