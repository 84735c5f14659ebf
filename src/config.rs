use crate::error::{LedgerError, Result};
use crate::models::report::LabelLocale;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "zakat_ledger.db";
pub const DEFAULT_BASE_URL: &str = "localhost:3000";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    /// Host (and optional port) used in receipt verification links.
    pub base_url: String,
    pub locale: LabelLocale,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            base_url: DEFAULT_BASE_URL.to_string(),
            locale: LabelLocale::English,
        }
    }
}

impl Config {
    /// Reads `ZAKAT_DB`, `ZAKAT_BASE_URL` and `ZAKAT_LOCALE`, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();
        if let Some(path) = lookup("ZAKAT_DB").filter(|v| !v.trim().is_empty()) {
            config.db_path = PathBuf::from(path.trim());
        }
        if let Some(url) = lookup("ZAKAT_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = normalize_base_url(&url)?;
        }
        if let Some(locale) = lookup("ZAKAT_LOCALE").filter(|v| !v.trim().is_empty()) {
            config.locale = locale.parse()?;
        }
        Ok(config)
    }

    pub fn with_db_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.db_path = path;
        }
        self
    }

    pub fn with_locale(mut self, locale: Option<&str>) -> Result<Self> {
        if let Some(locale) = locale {
            self.locale = locale.parse()?;
        }
        Ok(self)
    }
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return Err(LedgerError::Config(format!("invalid base url '{}'", raw.trim())));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_env_empty() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_env_values_override_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("ZAKAT_DB", "/tmp/masjid.db"),
            ("ZAKAT_BASE_URL", "https://zakat.example.org/"),
            ("ZAKAT_LOCALE", "id"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/masjid.db"));
        assert_eq!(config.base_url, "zakat.example.org");
        assert_eq!(config.locale, LabelLocale::Indonesian);
    }

    #[test]
    fn test_unknown_locale_is_config_error() {
        let result = Config::from_lookup(lookup_from(&[("ZAKAT_LOCALE", "klingon")]));
        assert!(matches!(result, Err(LedgerError::Config(_))));
    }

    #[test]
    fn test_cli_overrides_apply_on_top() {
        let config = Config::default()
            .with_db_path(Some(PathBuf::from("other.db")))
            .with_locale(Some("id"))
            .unwrap();
        assert_eq!(config.db_path, PathBuf::from("other.db"));
        assert_eq!(config.locale, LabelLocale::Indonesian);

        let unchanged = Config::default().with_db_path(None).with_locale(None).unwrap();
        assert_eq!(unchanged, Config::default());
    }
}
