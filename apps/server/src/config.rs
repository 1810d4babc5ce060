// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server configuration loaded from environment variables.

use std::str::FromStr;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on.
    pub port: u16,
    /// Root URL of the project-data backend.
    pub backend_url: String,
    /// Root URL of the Nominatim-compatible reverse geocoder.
    pub geocoder_url: String,
    /// User-Agent sent to the geocoder.
    pub geocoder_user_agent: String,
    /// JSON file holding the ideas notebook.
    pub notes_path: String,
    /// Request timeout in seconds, also used for upstream calls.
    pub request_timeout_secs: u64,
    /// How long explorer requests wait for cascading fetches.
    pub settle_timeout_ms: u64,
    /// Explorer sessions untouched for this long are dropped.
    pub session_idle_secs: u64,
    /// Upper bound on live explorer sessions; the least recently used goes first.
    pub max_sessions: usize,
    /// Allowed CORS origins (comma-separated, or "*" for all).
    pub cors_origins: Vec<String>,
    /// Emit JSON log lines instead of pretty output.
    pub log_json: bool,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            port: env_or("PORT", 8080),
            backend_url: env_string("BACKEND_URL", "http://localhost:8000"),
            geocoder_url: env_string("GEOCODER_URL", "https://nominatim.openstreetmap.org"),
            geocoder_user_agent: env_string("GEOCODER_USER_AGENT", "Revit-Map-App/1.0"),
            notes_path: env_string("NOTES_PATH", "./.data/notes.json"),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            settle_timeout_ms: env_or("SETTLE_TIMEOUT_MS", 5000),
            session_idle_secs: env_or("SESSION_IDLE_SECS", 1800),
            max_sessions: env_or("MAX_SESSIONS", 256),
            cors_origins: parse_origins(&env_string(
                "CORS_ORIGINS",
                // Common development origins
                "http://localhost:3000,http://localhost:5173,http://127.0.0.1:3000,http://127.0.0.1:5173",
            )),
            log_json: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }

    /// Whether every origin is allowed.
    pub fn cors_any(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed() {
        assert_eq!(
            parse_origins(" http://a.test ,, http://b.test"),
            vec!["http://a.test", "http://b.test"]
        );
    }

    #[test]
    fn wildcard_origin_allows_all() {
        let config = Config {
            cors_origins: parse_origins("*"),
            ..Config::from_env()
        };
        assert!(config.cors_any());
    }
}
