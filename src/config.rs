use std::env;
use std::str::FromStr;

use tracing::warn;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_SEARCH_HOST: &str = "www.google.com";
pub const DEFAULT_MAX_HTML_BYTES: usize = 5 * 1024 * 1024;

/// Service settings, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub bind_addr: String,
    /// Host used for link resolution when a request names neither a host
    /// nor a page URL.
    pub default_search_host: String,
    /// Request body limit.
    pub max_html_bytes: usize,
    /// Echo the submitted markup back in responses.
    pub save_html: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            default_search_host: DEFAULT_SEARCH_HOST.to_string(),
            max_html_bytes: DEFAULT_MAX_HTML_BYTES,
            save_html: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup. Unset keys take the default;
    /// values that do not parse are logged and take the default too.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: parsed(&lookup, "PORT", defaults.port),
            bind_addr: lookup("BIND_ADDR")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.bind_addr),
            default_search_host: lookup("DEFAULT_SEARCH_HOST")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.default_search_host),
            max_html_bytes: parsed(&lookup, "MAX_HTML_BYTES", defaults.max_html_bytes),
            save_html: parsed(&lookup, "SAVE_HTML", defaults.save_html),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(key, value = %raw, default = ?default, "invalid config value, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn unset_keys_take_defaults() {
        assert_eq!(from_pairs(&[]), Config::default());
    }

    #[test]
    fn reads_every_key() {
        let config = from_pairs(&[
            ("PORT", "8080"),
            ("BIND_ADDR", "127.0.0.1"),
            ("DEFAULT_SEARCH_HOST", "www.google.de"),
            ("MAX_HTML_BYTES", "1024"),
            ("SAVE_HTML", "true"),
        ]);

        assert_eq!(config.listen_addr(), "127.0.0.1:8080");
        assert_eq!(config.default_search_host, "www.google.de");
        assert_eq!(config.max_html_bytes, 1024);
        assert!(config.save_html);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = from_pairs(&[("PORT", "eighty"), ("SAVE_HTML", "yes please")]);

        assert_eq!(config.port, DEFAULT_PORT);
        assert!(!config.save_html);
    }
}
