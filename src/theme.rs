use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const THEME_COOKIE: &str = "tennisjs_theme";
pub const NIGHT_COOKIE: &str = "tennisjs_night";
pub const COOKIE_MAX_AGE_SECS: i64 = 31_536_000;
/// Palette id from before hard courts were split in two.
pub const LEGACY_HARD_THEME: &str = "hard";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeName {
    #[default]
    Grass,
    Clay,
    HardA,
    HardB,
}

impl ThemeName {
    /// Reads a persisted palette id, migrating the legacy `"hard"` id.
    pub fn parse(raw: &str) -> Option<ThemeName> {
        match raw.trim() {
            "grass" => Some(ThemeName::Grass),
            "clay" => Some(ThemeName::Clay),
            "hard-a" | LEGACY_HARD_THEME => Some(ThemeName::HardA),
            "hard-b" => Some(ThemeName::HardB),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeName::Grass => "grass",
            ThemeName::Clay => "clay",
            ThemeName::HardA => "hard-a",
            ThemeName::HardB => "hard-b",
        }
    }

    pub fn primary_color(self) -> &'static str {
        match self {
            ThemeName::Grass => "#006400",
            ThemeName::Clay => "#b35940",
            ThemeName::HardA => "#a52a2a",
            ThemeName::HardB => "#004C93",
        }
    }
}

/// Values the overlay page applies to its root element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemePresentation {
    pub theme: ThemeName,
    pub night: String,
    pub primary_color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedTheme {
    pub presentation: ThemePresentation,
    #[serde(skip)]
    pub set_cookies: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeState {
    pub current_theme: ThemeName,
    pub night_mode: bool,
}

impl ThemeState {
    /// Restores persisted values from a `Cookie` header, keeping defaults for
    /// anything missing or unknown. Later cookies win, as in a browser jar.
    pub fn load(cookie_header: Option<&str>) -> ThemeState {
        let mut state = ThemeState::default();
        let Some(header) = cookie_header else {
            return state;
        };
        for (name, value) in parse_cookie_header(header) {
            if name == THEME_COOKIE {
                match ThemeName::parse(value) {
                    Some(theme) => {
                        if value == LEGACY_HARD_THEME {
                            tracing::debug!("migrating legacy theme cookie to hard-a");
                        }
                        state.current_theme = theme;
                    }
                    None => tracing::debug!("ignoring unknown theme cookie {value:?}"),
                }
            } else if name == NIGHT_COOKIE {
                state.night_mode = value == "true";
            }
        }
        state
    }

    pub fn presentation(&self) -> ThemePresentation {
        ThemePresentation {
            theme: self.current_theme,
            night: self.night_mode.to_string(),
            primary_color: self.current_theme.primary_color().to_string(),
        }
    }

    /// Recomputes the presentation and the cookies that persist this state.
    pub fn apply(&self, now: DateTime<Utc>) -> AppliedTheme {
        AppliedTheme {
            presentation: self.presentation(),
            set_cookies: vec![
                set_cookie(THEME_COOKIE, self.current_theme.as_str(), now),
                set_cookie(NIGHT_COOKIE, &self.night_mode.to_string(), now),
            ],
        }
    }

    /// Applies a partial change; returns whether anything changed.
    pub fn update(&mut self, theme: Option<ThemeName>, night_mode: Option<bool>) -> bool {
        let before = *self;
        if let Some(theme) = theme {
            self.current_theme = theme;
        }
        if let Some(night_mode) = night_mode {
            self.night_mode = night_mode;
        }
        before != *self
    }
}

pub fn parse_cookie_header(header: &str) -> Vec<(&str, &str)> {
    header
        .split(';')
        .filter_map(|part| {
            let (name, value) = part.trim().split_once('=')?;
            Some((name.trim(), value.trim()))
        })
        .collect()
}

/// One-year, root-scoped cookie.
pub fn set_cookie(name: &str, value: &str, now: DateTime<Utc>) -> String {
    let expires = now + Duration::seconds(COOKIE_MAX_AGE_SECS);
    format!(
        "{name}={value};path=/;max-age={COOKIE_MAX_AGE_SECS};expires={}",
        expires.format("%a, %d %b %Y %H:%M:%S GMT")
    )
}
