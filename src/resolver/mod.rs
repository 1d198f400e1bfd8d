/*!
# Query Resolver

Единая точка входа для обоих транспортов (CLI и MCP).

Резолвер проверяет и нормализует сырой запрос, строит канонический запрос,
обращается к кэшу (а через него к адаптеру индекса), ранжирует результаты
поиска по префиксу и применяет ограничение количества. Тип отказа,
пришедший из адаптера, никогда не меняется.
*/

pub mod ranking;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, RequestCache};
use crate::config::ServiceConfig;
use crate::context::{ContextIndexAdapter, ContextLibrary, JsonContextLibrary};
use crate::core::{
    CanonicalQuery, Locale, Matches, QueryError, QueryKind, QueryResult, SymbolKind,
};

/// How the request name is interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryMode {
    Exact,
    Prefix,
    /// `name` is the type whose members are listed
    Members,
    /// `name` is a member of `type_name`
    Member { type_name: String },
    /// `name` is the type whose constructors are listed; the kind filter is ignored
    Constructors,
}

/// Raw request as it arrives from a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub name: String,
    pub kind: Option<String>,
    pub mode: QueryMode,
    pub locale: Option<String>,
    pub limit: Option<usize>,
}

impl QueryRequest {
    pub fn new(name: impl Into<String>, mode: QueryMode) -> Self {
        Self {
            name: name.into(),
            kind: None,
            mode,
            locale: None,
            limit: None,
        }
    }

    pub fn exact(name: impl Into<String>) -> Self {
        Self::new(name, QueryMode::Exact)
    }

    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::new(prefix, QueryMode::Prefix)
    }

    pub fn members(type_name: impl Into<String>) -> Self {
        Self::new(type_name, QueryMode::Members)
    }

    pub fn constructors(type_name: impl Into<String>) -> Self {
        Self::new(type_name, QueryMode::Constructors)
    }

    pub fn member(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(
            name,
            QueryMode::Member {
                type_name: type_name.into(),
            },
        )
    }

    pub fn with_kind(mut self, kind: Option<String>) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_locale(mut self, locale: Option<String>) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

/// Capability shared by both dispatchers
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, request: QueryRequest) -> QueryResult;

    /// Reloads the backing index; previously cached answers are dropped on success
    async fn refresh(&self) -> Result<(), QueryError>;
}

/// Значения, подставляемые при отсутствии параметров в запросе
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryDefaults {
    pub locale: Locale,
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            locale: Locale::Ru,
            default_limit: 10,
            max_limit: 50,
        }
    }
}

/// Resolver over the context index adapter with a shared request cache
pub struct QueryResolver {
    adapter: ContextIndexAdapter,
    cache: RequestCache,
    defaults: QueryDefaults,
}

impl QueryResolver {
    pub fn new(
        adapter: ContextIndexAdapter,
        cache: RequestCache,
        defaults: QueryDefaults,
    ) -> Self {
        Self {
            adapter,
            cache,
            defaults,
        }
    }

    /// Wires a library into an adapter and cache sized by `config`
    pub fn with_library(library: Box<dyn ContextLibrary>, config: &ServiceConfig) -> Self {
        let adapter = ContextIndexAdapter::with_timeout(library, config.lookup_timeout());
        let cache = RequestCache::new(config.cache.max_entries, config.cache_ttl());
        Self::new(adapter, cache, config.query_defaults())
    }

    /// Opens the JSON export named by `config.index.path`
    ///
    /// Без пути библиотека остается незагруженной: текущий каталог не читается.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let library = match config.index.path.as_deref() {
            Some(root) if !root.as_os_str().is_empty() => JsonContextLibrary::open(root),
            _ => {
                warn!(
                    "Platform context path is not configured; \
                     every query will report IndexUnavailable"
                );
                JsonContextLibrary::unconfigured()
            }
        };
        Self::with_library(Box::new(library), config)
    }

    pub fn defaults(&self) -> QueryDefaults {
        self.defaults
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Validates and normalizes a raw request
    pub fn canonicalize(&self, request: &QueryRequest) -> Result<CanonicalQuery, QueryError> {
        let kind_filter = match present(request.kind.as_deref()) {
            Some(raw) => Some(SymbolKind::parse_filter(raw).ok_or_else(|| {
                QueryError::invalid_input(format!(
                    "unknown kind '{}'; expected one of GlobalFunction, Type, Method, \
                     Property, Constant, Constructor",
                    raw
                ))
            })?),
            None => None,
        };

        let locale = match present(request.locale.as_deref()) {
            Some(raw) => Locale::parse(raw).ok_or_else(|| {
                QueryError::invalid_input(format!("unknown locale '{}'; expected ru or en", raw))
            })?,
            None => self.defaults.locale,
        };

        match &request.mode {
            QueryMode::Exact => CanonicalQuery::exact(&request.name, kind_filter, locale),
            QueryMode::Prefix => CanonicalQuery::prefix(&request.name, kind_filter, locale),
            QueryMode::Members => CanonicalQuery::members_of(&request.name, kind_filter, locale),
            QueryMode::Member { type_name } => {
                CanonicalQuery::member(type_name, &request.name, kind_filter, locale)
            }
            QueryMode::Constructors => CanonicalQuery::constructors_of(&request.name, locale),
        }
    }

    fn effective_limit(&self, requested: Option<usize>) -> usize {
        let max_limit = self.defaults.max_limit.max(1);
        requested
            .unwrap_or(self.defaults.default_limit)
            .clamp(1, max_limit)
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Ранжирование до кэша: кэшированный и свежий ответы совпадают
fn ranked(query: &CanonicalQuery, result: QueryResult) -> QueryResult {
    if query.kind() != QueryKind::PrefixSearch {
        return result;
    }
    result.map(|matches| {
        let mut symbols = matches.to_vec();
        ranking::sort_by_relevance(query.target(), &mut symbols);
        Matches::new(symbols).unwrap_or(matches)
    })
}

#[async_trait]
impl Resolver for QueryResolver {
    async fn resolve(&self, request: QueryRequest) -> QueryResult {
        let query = self.canonicalize(&request)?;
        debug!("Resolving {}", query);

        let adapter = self.adapter.clone();
        let key = query.clone();
        let result = self
            .cache
            .get_or_resolve(query.clone(), move || async move {
                let result = adapter.resolve(&key).await;
                ranked(&key, result)
            })
            .await;

        match query.kind() {
            QueryKind::PrefixSearch => {
                result.map(|m| m.truncated(self.effective_limit(request.limit)))
            }
            _ => result,
        }
    }

    async fn refresh(&self) -> Result<(), QueryError> {
        self.adapter.refresh().await?;
        let stats = self.cache.stats();
        self.cache.clear();
        info!(
            "Platform context index refreshed, request cache cleared ({} entries, hit rate {:.1}%)",
            stats.entries,
            stats.hit_rate() * 100.0
        );
        Ok(())
    }
}
