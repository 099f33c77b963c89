use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::feed::MatchFeed;
use crate::summary::MatchSummary;
use crate::theme::{ThemePresentation, ThemeState};
use crate::viewport::ViewportSignal;

// ── Constants ──────────────────────────────────────────────────────────

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:17890";
pub const DEFAULT_OVERLAY_DIR: &str = "overlay";
pub const DEFAULT_LOG_DIR: &str = "logs";

// ── Shared state type aliases ──────────────────────────────────────────

pub type SharedMatchFeed = Arc<Mutex<MatchFeed>>;
pub type SharedThemeState = Arc<Mutex<ThemeState>>;
pub type SharedViewport = Arc<ViewportSignal>;

#[derive(Clone)]
pub struct OverlayServerState {
    pub feed: SharedMatchFeed,
    pub theme: SharedThemeState,
    pub viewport: SharedViewport,
}

impl OverlayServerState {
    pub fn new(narrow_viewport_px: u32) -> Self {
        OverlayServerState {
            feed: Arc::new(Mutex::new(MatchFeed::new())),
            theme: Arc::new(Mutex::new(ThemeState::default())),
            viewport: Arc::new(ViewportSignal::new(narrow_viewport_px, narrow_viewport_px)),
        }
    }
}

// ── Overlay types ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayState {
    #[serde(rename = "match")]
    pub current_match: Option<MatchSummary>,
    pub theme: ThemePresentation,
    pub is_narrow_viewport: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeUpdate {
    pub theme: Option<String>,
    pub night_mode: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportReport {
    pub width: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportState {
    pub is_narrow_viewport: bool,
    pub changed: bool,
}

// ── Config types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub overlay_dir: String,
    pub log_dir: String,
    pub narrow_viewport_px: u32,
}
