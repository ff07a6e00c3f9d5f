// Application configuration, loaded from environment variables and CLI flags.

use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;

use crate::auth::AllowList;
use crate::clock::DEFAULT_COURT_TZ;
use crate::hours::OperatingHours;

/// Placeholder tokens shipped in sample env files; treated as unset.
const PLACEHOLDER_TOKENS: [&str; 2] = ["YOUR_BOT_TOKEN_HERE", "your_bot_token_here"];

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP server to.
    pub host: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Directory holding the status page.
    pub static_dir: PathBuf,
    /// Telegram bot token. `None` disables the bot.
    pub telegram_token: Option<String>,
    /// Telegram user ids allowed to change court state.
    pub authorized_users: Vec<i64>,
    /// Named API keys allowed to change court state, as `(name, key)`.
    pub api_keys: Vec<(String, String)>,
    pub latitude: f64,
    pub longitude: f64,
    /// Sent to MET Norway, which requires an identifying User-Agent.
    pub weather_user_agent: String,
    /// Default daily window for automatic opening.
    pub hours: OperatingHours,
    /// How often the automatic status is recomputed.
    pub refresh_interval: Duration,
    /// Time zone used for opening hours and the day of an hours override.
    pub court_tz: Tz,
}

impl Config {
    /// Load configuration from environment variables and CLI arguments.
    ///
    /// Environment variables:
    /// - `HOST` - bind address (default: `0.0.0.0`)
    /// - `PORT` - HTTP server port (default: 5001)
    /// - `STATIC_DIR` - status page directory (default: `static`)
    /// - `TELEGRAM_BOT_TOKEN` - bot token; unset disables the bot
    /// - `AUTHORIZED_USERS` - comma-separated Telegram user ids
    /// - `ADMIN_API_KEYS` - comma-separated `name:key` pairs for the HTTP API
    /// - `WEATHER_LAT` / `WEATHER_LON` - location (default: New York)
    /// - `WEATHER_USER_AGENT` - User-Agent for api.met.no
    /// - `DEFAULT_OPEN_HOUR` / `DEFAULT_CLOSE_HOUR` - hours (default: 6 / 20)
    /// - `REFRESH_INTERVAL_SECS` - refresh period (default: 300)
    /// - `COURT_TZ` - IANA time zone of the courts (default: `America/New_York`)
    /// - `COURT_NO_BOT` - set to `true` to disable the bot
    ///
    /// CLI flags:
    /// - `--port <PORT>` - Override the port
    /// - `--no-bot` - Disable the Telegram bot
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        // Port: CLI flag --port takes precedence, then env var, then default
        let port = Self::parse_cli_value(&args, "--port")
            .and_then(|v| v.parse().ok())
            .or_else(|| env("PORT").and_then(|v| v.parse().ok()))
            .unwrap_or(5001);

        let no_bot = args.contains(&"--no-bot".to_string())
            || env("COURT_NO_BOT")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false);

        let telegram_token = if no_bot {
            None
        } else {
            env("TELEGRAM_BOT_TOKEN").filter(|t| !PLACEHOLDER_TOKENS.contains(&t.as_str()))
        };

        let hours = Self::parse_hours(env("DEFAULT_OPEN_HOUR"), env("DEFAULT_CLOSE_HOUR"));

        let refresh_secs = env("REFRESH_INTERVAL_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(300)
            .max(1);

        let court_tz = Self::parse_tz(env("COURT_TZ"));

        Config {
            host: env("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            static_dir: env("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("static")),
            telegram_token,
            authorized_users: env("AUTHORIZED_USERS")
                .map(|v| parse_user_ids(&v))
                .unwrap_or_default(),
            api_keys: env("ADMIN_API_KEYS")
                .map(|v| parse_api_keys(&v))
                .unwrap_or_default(),
            latitude: env("WEATHER_LAT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(40.7128),
            longitude: env("WEATHER_LON")
                .and_then(|v| v.parse().ok())
                .unwrap_or(-74.0060),
            weather_user_agent: env("WEATHER_USER_AGENT").unwrap_or_else(|| {
                format!("court-status/{}", env!("CARGO_PKG_VERSION"))
            }),
            hours,
            refresh_interval: Duration::from_secs(refresh_secs),
            court_tz,
        }
    }

    /// Build the allow-list from the configured users and keys.
    pub fn allow_list(&self) -> AllowList {
        self.api_keys.iter().fold(
            AllowList::new().with_telegram_users(self.authorized_users.iter().copied()),
            |list, (name, key)| list.with_api_key(name, key),
        )
    }

    /// Parse a CLI flag value like `--port 8080`.
    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }

    fn parse_tz(value: Option<String>) -> Tz {
        match value {
            Some(name) => name.trim().parse().unwrap_or_else(|e| {
                tracing::warn!("Ignoring COURT_TZ {name}: {e}");
                DEFAULT_COURT_TZ
            }),
            None => DEFAULT_COURT_TZ,
        }
    }

    fn parse_hours(open: Option<String>, close: Option<String>) -> OperatingHours {
        let default = OperatingHours::default();
        let open = open.and_then(|v| v.trim().parse().ok()).unwrap_or(default.open);
        let close = close
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default.close);
        OperatingHours::new(open, close).unwrap_or_else(|e| {
            tracing::warn!("Ignoring configured hours {open}-{close}: {e}");
            default
        })
    }
}

/// Parse `AUTHORIZED_USERS`, skipping entries that are not numeric ids.
pub fn parse_user_ids(value: &str) -> Vec<i64> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!("Ignoring invalid Telegram user id in AUTHORIZED_USERS: {s}");
                None
            }
        })
        .collect()
}

/// Parse `ADMIN_API_KEYS` (`name:key,name:key`), skipping malformed entries.
pub fn parse_api_keys(value: &str) -> Vec<(String, String)> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|entry| match entry.split_once(':') {
            Some((name, key)) if !name.trim().is_empty() && !key.trim().is_empty() => {
                Some((name.trim().to_string(), key.trim().to_string()))
            }
            _ => {
                tracing::warn!("Ignoring malformed ADMIN_API_KEYS entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Authorizer, CallerId};

    #[test]
    fn test_parse_user_ids() {
        assert_eq!(parse_user_ids("123, 456,,abc, -7"), vec![123, 456, -7]);
        assert!(parse_user_ids("").is_empty());
    }

    #[test]
    fn test_parse_api_keys() {
        assert_eq!(
            parse_api_keys("frontdesk:abc123, broken, :nokey, coach:x:y"),
            vec![
                ("frontdesk".to_string(), "abc123".to_string()),
                ("coach".to_string(), "x:y".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_cli_value() {
        let args: Vec<String> = ["court-status", "--port", "8080"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(Config::parse_cli_value(&args, "--port").as_deref(), Some("8080"));
        assert_eq!(Config::parse_cli_value(&args, "--host"), None);
    }

    #[test]
    fn test_parse_hours_falls_back_on_invalid_pair() {
        assert_eq!(
            Config::parse_hours(Some("7".into()), Some("19".into())),
            OperatingHours { open: 7, close: 19 }
        );
        assert_eq!(
            Config::parse_hours(Some("21".into()), Some("19".into())),
            OperatingHours::default()
        );
        assert_eq!(Config::parse_hours(None, None), OperatingHours::default());
    }

    #[test]
    fn test_parse_tz() {
        assert_eq!(Config::parse_tz(None), chrono_tz::America::New_York);
        assert_eq!(
            Config::parse_tz(Some("Europe/Oslo".into())),
            chrono_tz::Europe::Oslo
        );
        assert_eq!(Config::parse_tz(Some("Mars/Olympus".into())), DEFAULT_COURT_TZ);
    }

    #[test]
    fn test_allow_list_from_config() {
        let config = Config {
            host: "127.0.0.1".into(),
            port: 0,
            static_dir: PathBuf::from("static"),
            telegram_token: None,
            authorized_users: vec![42],
            api_keys: vec![("frontdesk".into(), "k".into())],
            latitude: 0.0,
            longitude: 0.0,
            weather_user_agent: "test".into(),
            hours: OperatingHours::default(),
            refresh_interval: Duration::from_secs(1),
            court_tz: DEFAULT_COURT_TZ,
        };
        let list = config.allow_list();
        assert!(list.is_authorized(&CallerId::telegram(42, None)));
        assert!(list.authenticate_api_key("k").is_some());
    }
}
