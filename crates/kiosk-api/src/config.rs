use std::path::{Path, PathBuf};

use kiosk_core::day_schedule::ScheduleLayout;
use kiosk_core::mailbox::DEFAULT_COMMAND_TTL_SECS;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for a single kiosk; override via the
/// environment (or a `.env` file) in deployment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Root of all persisted state.
    pub data_dir: PathBuf,
    /// Uploaded images.
    pub media_dir: PathBuf,
    /// Captured video thumbnails.
    pub thumbnail_dir: PathBuf,
    /// The settings document.
    pub settings_file: PathBuf,
    /// External video player executable.
    pub player_binary: String,
    /// Command that raises the player window, if the window manager needs one.
    pub focus_command: Option<Vec<String>>,
    pub layout: ScheduleLayout,
    /// Period of the day-schedule watcher.
    pub schedule_poll_secs: u64,
    /// Lifetime of a pull-mailbox command.
    pub command_ttl_secs: i64,
}

impl ServerConfig {
    /// Defaults with every data path rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            cors_origins: vec!["http://localhost:5173".into()],
            request_timeout_secs: 30,
            media_dir: data_dir.join("images"),
            thumbnail_dir: data_dir.join("thumbnails"),
            settings_file: data_dir.join("settings.json"),
            data_dir,
            player_binary: "mpv".into(),
            focus_command: None,
            layout: ScheduleLayout::default(),
            schedule_poll_secs: 30,
            command_ttl_secs: DEFAULT_COMMAND_TTL_SECS,
        }
    }

    /// Directory for player IPC sockets.
    pub fn ipc_dir(&self) -> PathBuf {
        self.data_dir.join("ipc")
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `KIOSK_DATA_DIR`       | `./data`                   |
    /// | `KIOSK_MEDIA_DIR`      | `<data>/images`            |
    /// | `KIOSK_THUMBNAIL_DIR`  | `<data>/thumbnails`        |
    /// | `KIOSK_SETTINGS_FILE`  | `<data>/settings.json`     |
    /// | `KIOSK_PLAYER_BINARY`  | `mpv`                      |
    /// | `KIOSK_FOCUS_COMMAND`  | unset                      |
    /// | `DAY_SLOT_COUNT`       | `12`                       |
    /// | `DAY_SLOT_HOURS`       | `2`                        |
    /// | `DAY_START_HOUR`       | `6`                        |
    /// | `SCHEDULE_POLL_SECS`   | `30`                       |
    /// | `COMMAND_TTL_SECS`     | `5`                        |
    ///
    /// Panics on malformed values; misconfiguration should fail at startup.
    pub fn from_env() -> Self {
        let data_dir = env_or("KIOSK_DATA_DIR", "./data");
        let mut config = Self::with_data_dir(data_dir);

        config.host = env_or("HOST", "0.0.0.0");
        config.port = env_parse("PORT", config.port);
        config.cors_origins = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        config.request_timeout_secs = env_parse("REQUEST_TIMEOUT_SECS", config.request_timeout_secs);

        if let Ok(dir) = std::env::var("KIOSK_MEDIA_DIR") {
            config.media_dir = dir.into();
        }
        if let Ok(dir) = std::env::var("KIOSK_THUMBNAIL_DIR") {
            config.thumbnail_dir = dir.into();
        }
        if let Ok(file) = std::env::var("KIOSK_SETTINGS_FILE") {
            config.settings_file = file.into();
        }
        config.player_binary = env_or("KIOSK_PLAYER_BINARY", "mpv");
        config.focus_command = std::env::var("KIOSK_FOCUS_COMMAND")
            .ok()
            .map(|raw| raw.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .filter(|parts| !parts.is_empty());

        config.layout = ScheduleLayout::new(
            env_parse("DAY_SLOT_COUNT", config.layout.slot_count()),
            env_parse("DAY_SLOT_HOURS", config.layout.slot_hours()),
            env_parse("DAY_START_HOUR", config.layout.start_hour()),
        )
        .unwrap_or_else(|e| panic!("Invalid day schedule layout: {e}"));

        config.schedule_poll_secs = env_parse("SCHEDULE_POLL_SECS", config.schedule_poll_secs);
        config.command_ttl_secs = env_parse("COMMAND_TTL_SECS", config.command_ttl_secs);

        config
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} must be a valid {}: {e}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_paths_hang_off_data_dir() {
        let config = ServerConfig::with_data_dir("/srv/kiosk");
        assert_eq!(config.media_dir, PathBuf::from("/srv/kiosk/images"));
        assert_eq!(config.thumbnail_dir, PathBuf::from("/srv/kiosk/thumbnails"));
        assert_eq!(config.settings_file, PathBuf::from("/srv/kiosk/settings.json"));
        assert_eq!(config.ipc_dir(), PathBuf::from("/srv/kiosk/ipc"));
        assert_eq!(config.layout, ScheduleLayout::default());
        assert_eq!(config.command_ttl_secs, 5);
    }
}
