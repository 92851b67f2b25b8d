use std::{env, fs, path::Path, path::PathBuf, time::Duration};

use crate::{errors::Error, messaging::throttled::ThrottleConfig, Result};

/// Run mode. `Dev` turns on debug logging for our crates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    Dev,
    #[default]
    Prod,
}

impl Mode {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "dev" | "development" => Mode::Dev,
            _ => Mode::Prod,
        }
    }
}

/// Typed configuration, read from the environment (and an optional `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    pub mode: Mode,

    // Storage
    pub db_path: PathBuf,
    pub db_max_connections: u32,

    // Operator console on stdin
    pub console_enabled: bool,

    // Outbound flood control
    pub throttle: ThrottleConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(env_str)
    }

    /// Build the config from any key lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let mode = get("MODE").map(|m| Mode::parse(&m)).unwrap_or_default();

        let db_path = get("DB_PATH")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("wishbot.db"));
        let db_max_connections = parse_num::<u32>(get("DB_MAX_CONNECTIONS"))
            .unwrap_or(4)
            .max(1);

        let console_enabled = parse_bool(get("CONSOLE_ENABLED")).unwrap_or(true);

        let defaults = ThrottleConfig::default();
        let throttle = ThrottleConfig {
            global_min_interval: parse_num::<u64>(get("THROTTLE_GLOBAL_MS"))
                .map(Duration::from_millis)
                .unwrap_or(defaults.global_min_interval),
            per_chat_min_interval: parse_num::<u64>(get("THROTTLE_PER_CHAT_MS"))
                .map(Duration::from_millis)
                .unwrap_or(defaults.per_chat_min_interval),
        };

        Ok(Self {
            telegram_bot_token,
            mode,
            db_path,
            db_max_connections,
            console_enabled,
            throttle,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }
        out.push((key.to_string(), val));
    }
    out
}

fn parse_bool(v: Option<String>) -> Option<bool> {
    v.map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn parse_num<T: std::str::FromStr>(v: Option<String>) -> Option<T> {
    v.and_then(|s| s.trim().parse::<T>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn token_is_required() {
        assert!(matches!(config(&[]), Err(Error::Config(_))));
        assert!(matches!(
            config(&[("TELEGRAM_BOT_TOKEN", "  ")]),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[("TELEGRAM_BOT_TOKEN", "t")]).unwrap();
        assert_eq!(cfg.mode, Mode::Prod);
        assert_eq!(cfg.db_path, PathBuf::from("wishbot.db"));
        assert_eq!(cfg.db_max_connections, 4);
        assert!(cfg.console_enabled);
        assert_eq!(cfg.throttle, ThrottleConfig::default());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = config(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("MODE", "DEV"),
            ("DB_PATH", "/var/lib/wishbot/db.sqlite"),
            ("DB_MAX_CONNECTIONS", "0"),
            ("CONSOLE_ENABLED", "off"),
            ("THROTTLE_PER_CHAT_MS", "200"),
            ("THROTTLE_GLOBAL_MS", "junk"),
        ])
        .unwrap();
        assert_eq!(cfg.mode, Mode::Dev);
        assert_eq!(cfg.db_path, PathBuf::from("/var/lib/wishbot/db.sqlite"));
        assert_eq!(cfg.db_max_connections, 1);
        assert!(!cfg.console_enabled);
        assert_eq!(cfg.throttle.per_chat_min_interval, Duration::from_millis(200));
        assert_eq!(
            cfg.throttle.global_min_interval,
            ThrottleConfig::default().global_min_interval
        );
    }

    #[test]
    fn unknown_mode_falls_back_to_prod() {
        assert_eq!(Mode::parse("staging"), Mode::Prod);
    }

    #[test]
    fn dotenv_lines_are_parsed() {
        let parsed = parse_dotenv("# comment\nA=1\n B = \"two words\" \nnoequals\n=x\nC='3'\n");
        assert_eq!(
            parsed,
            vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "two words".to_string()),
                ("C".to_string(), "3".to_string()),
            ]
        );
    }
}
