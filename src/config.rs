/*!
# Service Configuration

Настройки индекса контекста, кэша запросов и значений по умолчанию для запросов.

Порядок применения: встроенные значения → TOML файл → переменные окружения → флаги CLI.

```toml
[index]
path = "/opt/1cv8/context-export"
lookup_timeout_ms = 5000

[cache]
max_entries = 1024
ttl_seconds = 300

[query]
default_locale = "ru"
default_limit = 10
max_limit = 50
```
*/

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::Locale;
use crate::resolver::QueryDefaults;

pub const CONFIG_ENV: &str = "BSL_CONTEXT_CONFIG";
pub const CONTEXT_PATH_ENV: &str = "BSL_CONTEXT_PATH";
pub const LOCALE_ENV: &str = "BSL_CONTEXT_LOCALE";
pub const CACHE_TTL_ENV: &str = "BSL_CONTEXT_CACHE_TTL";

/// Location of the platform context export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Каталог JSON выгрузки контекста платформы
    pub path: Option<PathBuf>,
    /// Ограничение ожидания одного обращения к библиотеке
    pub lookup_timeout_ms: u64,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            path: None,
            lookup_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub max_entries: usize,
    pub ttl_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: 1024,
            ttl_seconds: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub default_locale: Locale,
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            default_locale: Locale::Ru,
            default_limit: 10,
            max_limit: 50,
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub index: IndexSettings,
    pub cache: CacheSettings,
    pub query: QuerySettings,
}

impl ServiceConfig {
    /// Resolves the configuration file and applies environment overrides
    ///
    /// Явно указанный файл (флагом или `BSL_CONTEXT_CONFIG`) обязан существовать;
    /// файл в каталоге конфигурации пользователя читается, только если он есть.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut config = match explicit.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::load_from_file(&path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::load_from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/bsl-context/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("bsl-context").join("config.toml"))
    }

    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).with_context(|| {
            format!("Failed to read config from {}", path.as_ref().display())
        })?;

        let config: Self = toml::from_str(&content).with_context(|| {
            format!("Failed to parse TOML config from {}", path.as_ref().display())
        })?;

        tracing::debug!("Configuration loaded from {}", path.as_ref().display());
        Ok(config)
    }

    /// Applies `BSL_CONTEXT_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(path) = present(CONTEXT_PATH_ENV) {
            self.index.path = Some(PathBuf::from(path));
        }
        if let Some(raw) = present(LOCALE_ENV) {
            self.query.default_locale = Locale::parse(&raw)
                .with_context(|| format!("{} has unknown locale '{}'", LOCALE_ENV, raw))?;
        }
        if let Some(raw) = present(CACHE_TTL_ENV) {
            self.cache.ttl_seconds = raw
                .trim()
                .parse()
                .with_context(|| {
                    format!("{} must be a number of seconds, got '{}'", CACHE_TTL_ENV, raw)
                })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.max_entries == 0 {
            bail!("cache.max_entries must be greater than zero");
        }
        if self.index.lookup_timeout_ms == 0 {
            bail!("index.lookup_timeout_ms must be greater than zero");
        }
        if self.query.max_limit == 0 {
            bail!("query.max_limit must be greater than zero");
        }
        if self.query.default_limit > self.query.max_limit {
            bail!(
                "query.default_limit ({}) exceeds query.max_limit ({})",
                self.query.default_limit,
                self.query.max_limit
            );
        }
        Ok(())
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.index.lookup_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_seconds)
    }

    pub fn query_defaults(&self) -> QueryDefaults {
        QueryDefaults {
            locale: self.query.default_locale,
            default_limit: self.query.default_limit,
            max_limit: self.query.max_limit,
        }
    }
}
