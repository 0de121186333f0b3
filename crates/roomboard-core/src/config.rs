use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_INACTIVE_DURATION_MS: u32 = 60_000;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub timing: TimingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralConfig {
    /// Room whose schedule this kiosk shows.
    #[serde(default)]
    pub room_id: String,
    /// Overrides the default `<config_dir>/roomboard/schedule.json`.
    #[serde(default)]
    pub schedule_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    /// Passed through to renderers; the engine itself ignores it.
    #[serde(default)]
    pub dark_theme: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "TimingConfig::default_inactive")]
    pub inactive_duration_ms: u32,
    #[serde(default = "TimingConfig::default_popup")]
    pub popup_duration_ms: u64,
}

impl TimingConfig {
    fn default_inactive() -> u32 {
        DEFAULT_INACTIVE_DURATION_MS
    }
    fn default_popup() -> u64 {
        3000
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            inactive_duration_ms: Self::default_inactive(),
            popup_duration_ms: Self::default_popup(),
        }
    }
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("roomboard")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let mut config: Config =
            toml::from_str(&contents).with_context(|| "parsing config TOML")?;
        // A zero inactivity duration would return to today on every poll;
        // treat it as unset.
        if config.timing.inactive_duration_ms == 0 {
            config.timing.inactive_duration_ms = DEFAULT_INACTIVE_DURATION_MS;
        }
        Ok(config)
    }

    pub fn schedule_path(&self) -> PathBuf {
        self.general
            .schedule_path
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("schedule.json"))
    }
}

pub fn socket_path() -> PathBuf {
    // ROOMBOARD_SOCK env var overrides for testing.
    if let Ok(path) = std::env::var("ROOMBOARD_SOCK") {
        return PathBuf::from(path);
    }
    PathBuf::from("/run/roomboard/roomboard.sock")
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- defaults ---

    #[test]
    fn default_inactive_duration_is_one_minute() {
        let config = Config::default();
        assert_eq!(config.timing.inactive_duration_ms, 60_000);
    }

    #[test]
    fn default_popup_duration_is_3000ms() {
        let config = Config::default();
        assert_eq!(config.timing.popup_duration_ms, 3000);
    }

    #[test]
    fn default_theme_is_light() {
        let config = Config::default();
        assert!(!config.display.dark_theme);
    }

    // --- TOML parsing ---

    #[test]
    fn parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.timing.inactive_duration_ms, 60_000);
        assert_eq!(config.timing.popup_duration_ms, 3000);
        assert_eq!(config.general.room_id, "");
    }

    #[test]
    fn parse_custom_timing() {
        let toml = r#"
[timing]
inactive_duration_ms = 120000
popup_duration_ms = 1500
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.timing.inactive_duration_ms, 120_000);
        assert_eq!(config.timing.popup_duration_ms, 1500);
    }

    #[test]
    fn parse_room_and_theme() {
        let toml = r#"
[general]
room_id = "204"

[display]
dark_theme = true
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.general.room_id, "204");
        assert!(config.display.dark_theme);
    }

    // --- zero inactivity duration is invalid ---

    #[test]
    fn zero_inactive_duration_resets_to_default_on_load() {
        let dir = std::env::temp_dir().join("roomboard-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[timing]\ninactive_duration_ms = 0\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.timing.inactive_duration_ms, 60_000);
        let _ = std::fs::remove_file(&path);
    }

    // --- schedule path ---

    #[test]
    fn schedule_path_override_wins() {
        let toml = r#"
[general]
schedule_path = "/tmp/rooms/204.json"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.schedule_path(), PathBuf::from("/tmp/rooms/204.json"));
    }

    #[test]
    fn schedule_path_defaults_under_config_dir() {
        let config = Config::default();
        assert_eq!(
            config.schedule_path().file_name().unwrap(),
            "schedule.json"
        );
    }

    // --- socket path ---

    #[test]
    fn socket_path_ends_with_roomboard_sock() {
        let path = socket_path();
        assert_eq!(path.file_name().unwrap(), "roomboard.sock");
    }
}
