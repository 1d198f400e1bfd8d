/*!
# BSL Platform Context

Справочник по объектной модели платформы 1С:Предприятие (глобальные функции,
типы, их методы, свойства, значения и конструкторы) для двух потребителей:

- человека в терминале (`bsl-context lookup СтрНайти`);
- AI-ассистентов через Model Context Protocol (`bsl-context mcp-server`).

## Architecture

```text
CLI / MCP dispatcher
└── Query Resolver       - validation, canonical query, ranking, limit
    ├── Request Cache    - TTL + LRU, single-flight
    └── Index Adapter    - bounded, panic-safe calls into the context library
        └── ContextLibrary (JSON export of the platform help)
Result Formatter         - text, markdown, JSON, XML
```

Один и тот же отказ (`InvalidInput`, `NotFound`, `IndexUnavailable`, `Internal`)
одинаково доходит до обоих транспортов.

## Usage

```bash
bsl-context --context-path ./context-export lookup СтрНайти
bsl-context search Стр --limit 5 --format json
bsl-context members Массив --locale en
bsl-context member ТаблицаЗначений Добавить
bsl-context constructors Массив
bsl-context mcp-server
```

### Library
```rust,ignore
use bsl_context::{open, QueryRequest, Resolver};

let resolver = open("./context-export");
let result = resolver.resolve(QueryRequest::exact("СтрНайти")).await;
println!("{}", bsl_context::format::to_text(&result));
```
*/

pub mod cache;
pub mod cli;
pub mod config;
pub mod context;
pub mod core;
pub mod format;
pub mod mcp_server;
pub mod resolver;

pub use cache::{CacheStats, RequestCache};
pub use config::ServiceConfig;
pub use context::{
    ContextIndexAdapter, ContextLibrary, JsonContextLibrary, LibraryError, PlatformIndex,
};
pub use self::core::{
    CanonicalQuery, FailureKind, Locale, Matches, QueryError, QueryKind, QueryResult, Symbol,
    SymbolKind,
};
pub use format::Encoding;
pub use resolver::{QueryMode, QueryRequest, QueryResolver, Resolver};

use std::path::Path;

/// Opens a resolver over a JSON export directory with default settings
pub fn open<P: AsRef<Path>>(context_path: P) -> QueryResolver {
    let mut config = ServiceConfig::default();
    config.index.path = Some(context_path.as_ref().to_path_buf());
    QueryResolver::from_config(&config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_missing_export_reports_index_unavailable() {
        let dir = tempfile::TempDir::new().unwrap();
        let resolver = open(dir.path().join("missing"));

        let err = resolver.resolve(QueryRequest::exact("СтрНайти")).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::IndexUnavailable);
        // Отказ индекса не кэшируется
        assert_eq!(resolver.cache_stats().entries, 0);
    }
}
