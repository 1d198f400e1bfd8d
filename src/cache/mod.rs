/*!
# Request Cache

Кэш результатов канонических запросов к контексту платформы.

## Возможности
- LRU стратегия вытеснения с ограничением по количеству записей
- Время жизни записи (TTL): устаревшая запись считается отсутствующей
- Single-flight: одновременные одинаковые запросы выполняются один раз
- Кэшируются только успешные ответы и `NotFound`

## Использование

```rust,ignore
use bsl_context::cache::RequestCache;

let cache = RequestCache::new(1024, Duration::from_secs(300));
let result = cache
    .get_or_resolve(query.clone(), move || async move { adapter.resolve(&query).await })
    .await;
```
*/

pub mod request_cache;

pub use request_cache::{CacheStats, RequestCache};
