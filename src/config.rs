use crate::types::*;
use std::{
  env,
  fs,
  path::{Path, PathBuf},
};

pub fn repo_root() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn resolve_repo_path(raw: &str) -> PathBuf {
  let path = PathBuf::from(raw);
  if path.is_absolute() {
    path
  } else {
    repo_root().join(path)
  }
}

pub fn config_path() -> PathBuf {
  match env_default("SCOREBOARD_CONFIG_PATH") {
    Some(raw) => resolve_repo_path(&raw),
    None => repo_root().join("config.json"),
  }
}

pub fn env_default(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

pub fn apply_env_defaults(mut config: AppConfig) -> AppConfig {
  if config.bind_addr.trim().is_empty() {
    config.bind_addr = env_default("SCOREBOARD_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
  }
  if config.overlay_dir.trim().is_empty() {
    config.overlay_dir = env_default("OVERLAY_DIR").unwrap_or_else(|| DEFAULT_OVERLAY_DIR.to_string());
  }
  if config.log_dir.trim().is_empty() {
    config.log_dir = env_default("SCOREBOARD_LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.to_string());
  }
  if config.narrow_viewport_px == 0 {
    config.narrow_viewport_px = crate::viewport::DEFAULT_NARROW_VIEWPORT_PX;
  }
  config
}

pub fn load_config_inner() -> Result<AppConfig, String> {
  load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<AppConfig, String> {
  if !path.is_file() {
    return Ok(apply_env_defaults(AppConfig::default()));
  }
  let data = fs::read_to_string(path).map_err(|e| format!("read config {}: {e}", path.display()))?;
  let config =
    serde_json::from_str::<AppConfig>(&data).map_err(|e| format!("parse config {}: {e}", path.display()))?;
  Ok(apply_env_defaults(config))
}

pub fn save_config_to(path: &Path, config: AppConfig) -> Result<AppConfig, String> {
  let payload = serde_json::to_string_pretty(&config).map_err(|e| e.to_string())?;
  fs::write(path, payload).map_err(|e| format!("write config {}: {e}", path.display()))?;
  Ok(config)
}

/// Writes `config` to `path` on first run so the effective settings are
/// visible and editable. Returns whether a file was written.
pub fn write_default_config(path: &Path, config: &AppConfig) -> Result<bool, String> {
  if path.is_file() {
    return Ok(false);
  }
  save_config_to(path, config.clone())?;
  Ok(true)
}

pub fn load_env_file() {
  load_env_file_from(&repo_root().join(".env"));
}

pub fn load_env_file_from(env_path: &Path) {
  if !env_path.is_file() {
    return;
  }
  let contents = match fs::read_to_string(env_path) {
    Ok(data) => data,
    Err(_) => return,
  };
  for line in contents.lines() {
    if let Some((key, value)) = parse_env_line(line) {
      if env::var_os(&key).is_none() {
        env::set_var(key, value);
      }
    }
  }
}

/// Keys a `.env` file may set besides the `SCOREBOARD_` family.
const ENV_FILE_KEYS: &[&str] = &["OVERLAY_DIR", "RUST_LOG"];

fn is_scoreboard_key(key: &str) -> bool {
  key.starts_with("SCOREBOARD_") || ENV_FILE_KEYS.contains(&key)
}

/// Parses one `.env` line. Keys outside the scoreboard's own set are skipped
/// so a shared `.env` cannot leak unrelated settings into the process.
pub fn parse_env_line(line: &str) -> Option<(String, String)> {
  let line = line.trim();
  if line.starts_with('#') {
    return None;
  }
  let (key, raw) = line.strip_prefix("export ").unwrap_or(line).split_once('=')?;
  let key = key.trim();
  if !is_scoreboard_key(key) {
    return None;
  }
  Some((key.to_string(), env_value(raw.trim()).to_string()))
}

fn env_value(raw: &str) -> &str {
  for quote in ['"', '\''] {
    if let Some(inner) = raw.strip_prefix(quote).and_then(|rest| rest.strip_suffix(quote)) {
      return inner;
    }
  }
  match raw.split_once(" #") {
    Some((value, _comment)) => value.trim_end(),
    None => raw,
  }
}

pub fn log_config_warnings(config: &AppConfig) {
  let overlay_dir = resolve_repo_path(&config.overlay_dir);
  if !overlay_dir.is_dir() {
    tracing::warn!(
      "overlay dir {} does not exist; only the JSON endpoints will be served",
      overlay_dir.display()
    );
  }
  if config.bind_addr.parse::<std::net::SocketAddr>().is_err() {
    tracing::warn!("bind address {:?} is not a socket address", config.bind_addr);
  }
}
