/// <module>
///   <name>adapter</name>
///   <purpose>Фасад над библиотекой контекста: канонический запрос -> вызов библиотеки</purpose>
/// </module>
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, warn};

use super::{ContextLibrary, LibraryError};
use crate::core::{CanonicalQuery, Locale, Matches, QueryError, QueryKind, QueryResult, Symbol};

pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

type SharedLibrary = Arc<RwLock<Box<dyn ContextLibrary>>>;

/// <type>
///   <name>ContextIndexAdapter</name>
///   <purpose>Cache-free, concurrency-safe access to the context library</purpose>
///   <description>
///     Запросы берут разделяемую блокировку, перезагрузка - эксклюзивную.
///     Один срок на вызов покрывает и ожидание блокировки, и работу библиотеки
///     в blocking-пуле: зависший вызов не держит остальные запросы дольше срока.
///   </description>
/// </type>
#[derive(Clone)]
pub struct ContextIndexAdapter {
    library: SharedLibrary,
    lookup_timeout: Duration,
}

impl ContextIndexAdapter {
    pub fn new(library: Box<dyn ContextLibrary>) -> Self {
        Self::with_timeout(library, DEFAULT_LOOKUP_TIMEOUT)
    }

    pub fn with_timeout(library: Box<dyn ContextLibrary>, lookup_timeout: Duration) -> Self {
        Self {
            library: Arc::new(RwLock::new(library)),
            lookup_timeout,
        }
    }

    /// Resolves one canonical query; failures are values, never panics
    pub async fn resolve(&self, query: &CanonicalQuery) -> QueryResult {
        let deadline = Instant::now() + self.lookup_timeout;

        let guard = match timeout_at(deadline, self.library.clone().read_owned()).await {
            Ok(guard) => guard,
            Err(_) => {
                warn!(
                    "Context library stayed locked for {} longer than {:?}",
                    query, self.lookup_timeout
                );
                return Err(self.busy("context library is busy").with_query(query));
            }
        };

        let owned_query = query.clone();
        let task = tokio::task::spawn_blocking(move || execute(guard.as_ref(), &owned_query));

        match timeout_at(deadline, task).await {
            Ok(Ok(result)) => result.map_err(|e| e.with_query(query)),
            Ok(Err(join_error)) => {
                error!("Context library call failed for {}: {}", query, join_error);
                Err(QueryError::internal(format!("context library call failed: {}", join_error))
                    .with_query(query))
            }
            Err(_) => {
                warn!(
                    "Context library did not answer {} within {:?}",
                    query, self.lookup_timeout
                );
                Err(self.busy("context library did not answer").with_query(query))
            }
        }
    }

    /// Reloads the backing index under exclusive access
    ///
    /// Ожидание блокировки и сама перезагрузка ограничены тем же сроком, что и запросы.
    pub async fn refresh(&self) -> Result<(), QueryError> {
        let deadline = Instant::now() + self.lookup_timeout;

        let mut guard = match timeout_at(deadline, self.library.clone().write_owned()).await {
            Ok(guard) => guard,
            Err(_) => {
                warn!(
                    "Refresh could not lock the context library within {:?}",
                    self.lookup_timeout
                );
                return Err(self.busy("refresh failed: context library is busy"));
            }
        };
        info!("Refreshing platform context index");

        let task = tokio::task::spawn_blocking(move || guard.refresh_index());
        match timeout_at(deadline, task).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(e))) => Err(QueryError::index_unavailable(format!("refresh failed: {}", e))),
            Ok(Err(join_error)) => {
                error!("Context library refresh panicked: {}", join_error);
                Err(QueryError::internal(format!("refresh failed: {}", join_error)))
            }
            Err(_) => {
                warn!("Context library refresh did not finish within {:?}", self.lookup_timeout);
                Err(self.busy("refresh failed: reload did not finish"))
            }
        }
    }

    fn busy(&self, what: &str) -> QueryError {
        QueryError::index_unavailable(format!(
            "{}: gave up after {} ms",
            what,
            self.lookup_timeout.as_millis()
        ))
    }
}

fn library_failure(error: LibraryError) -> QueryError {
    QueryError::index_unavailable(error.to_string())
}

fn execute(library: &dyn ContextLibrary, query: &CanonicalQuery) -> QueryResult {
    debug!("Context library call: {}", query);

    let found = match query.kind() {
        QueryKind::ExactLookup => library.lookup(query.target()),
        QueryKind::PrefixSearch => library.prefix_search(query.target()),
        QueryKind::MemberEnumeration => library.members_of(query.target()),
        QueryKind::MemberLookup => library
            .members_of(query.declaring_type().unwrap_or_default())
            .map(|members| {
                members
                    .into_iter()
                    .filter(|m| m.has_name(query.target()))
                    .collect()
            }),
        QueryKind::ConstructorEnumeration => library.constructors_of(query.target()),
    }
    .map_err(library_failure)?;

    let locale = query.locale();
    let prefix = query.target().to_lowercase();
    let symbols: Vec<Symbol> = found
        .into_iter()
        .filter(|s| query.kind_filter().map_or(true, |kind| s.kind == kind))
        .map(|s| localize(s, locale))
        .filter(|s| {
            query.kind() != QueryKind::PrefixSearch || s.name.to_lowercase().starts_with(&prefix)
        })
        .collect();

    Matches::new(symbols).ok_or_else(|| QueryError::not_found(not_found_message(query)))
}

fn not_found_message(query: &CanonicalQuery) -> String {
    match query.kind() {
        QueryKind::ExactLookup => format!("symbol '{}' not found", query.target()),
        QueryKind::PrefixSearch => format!("no symbols start with '{}'", query.target()),
        QueryKind::MemberEnumeration => {
            format!("type '{}' not found or has no members", query.target())
        }
        QueryKind::MemberLookup => format!(
            "member '{}' not found in type '{}'",
            query.target(),
            query.declaring_type().unwrap_or_default()
        ),
        QueryKind::ConstructorEnumeration => {
            format!("type '{}' not found or has no constructors", query.target())
        }
    }
}

/// Presents the symbol under the query's locale
fn localize(mut symbol: Symbol, locale: Locale) -> Symbol {
    if locale == Locale::En {
        if let Some(english) = symbol.english_name.take() {
            symbol.english_name = Some(std::mem::replace(&mut symbol.name, english));
        }
    }
    symbol
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PlatformIndex;
    use crate::core::{FailureKind, SymbolKind};

    fn adapter() -> ContextIndexAdapter {
        ContextIndexAdapter::new(Box::new(PlatformIndex::from_symbols(vec![
            Symbol::new("СтрДлина", SymbolKind::GlobalFunction).with_english_name("StrLen"),
            Symbol::new("Строка", SymbolKind::Type).with_english_name("String"),
            Symbol::new("Массив", SymbolKind::Type).with_english_name("Array"),
            Symbol::new("Добавить", SymbolKind::Method)
                .with_english_name("Add")
                .with_declaring_type("Массив"),
            Symbol::new("Массив", SymbolKind::Constructor)
                .with_english_name("Array")
                .with_declaring_type("Массив"),
        ])))
    }

    struct HangingLibrary;

    impl ContextLibrary for HangingLibrary {
        fn lookup(&self, _name: &str) -> Result<Vec<Symbol>, LibraryError> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(Vec::new())
        }
        fn prefix_search(&self, _prefix: &str) -> Result<Vec<Symbol>, LibraryError> {
            Ok(Vec::new())
        }
        fn members_of(&self, _type_name: &str) -> Result<Vec<Symbol>, LibraryError> {
            panic!("corrupted index")
        }
        fn refresh_index(&mut self) -> Result<(), LibraryError> {
            Err(LibraryError::Unavailable("archive missing".to_string()))
        }
    }

    /// Перезагрузка, которая не возвращается: эксклюзивная блокировка остается занятой
    struct StuckReload;

    impl ContextLibrary for StuckReload {
        fn lookup(&self, _name: &str) -> Result<Vec<Symbol>, LibraryError> {
            Ok(Vec::new())
        }
        fn prefix_search(&self, _prefix: &str) -> Result<Vec<Symbol>, LibraryError> {
            Ok(Vec::new())
        }
        fn members_of(&self, _type_name: &str) -> Result<Vec<Symbol>, LibraryError> {
            Ok(Vec::new())
        }
        fn refresh_index(&mut self) -> Result<(), LibraryError> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_kind_filter_can_empty_the_result() {
        let adapter = adapter();
        let query =
            CanonicalQuery::exact("Строка", Some(SymbolKind::GlobalFunction), Locale::Ru).unwrap();
        let err = adapter.resolve(&query).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::NotFound);
        assert_eq!(err.query, Some(query.to_string()));
    }

    #[tokio::test]
    async fn test_english_locale_renames_and_matches_english_prefix() {
        let adapter = adapter();
        let query = CanonicalQuery::prefix("str", None, Locale::En).unwrap();
        let found = adapter.resolve(&query).await.unwrap();
        let names: Vec<_> = found.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["StrLen", "String"]);
        assert_eq!(found[0].english_name.as_deref(), Some("СтрДлина"));
    }

    #[tokio::test]
    async fn test_member_lookup() {
        let adapter = adapter();
        let query = CanonicalQuery::member("Array", "Add", None, Locale::Ru).unwrap();
        let found = adapter.resolve(&query).await.unwrap();
        assert_eq!(found.first().qualified_name(), "Массив.Добавить");

        let query = CanonicalQuery::member("Массив", "Удалить", None, Locale::Ru).unwrap();
        assert_eq!(adapter.resolve(&query).await.unwrap_err().kind, FailureKind::NotFound);
    }

    #[tokio::test]
    async fn test_constructor_enumeration() {
        let adapter = adapter();
        let query = CanonicalQuery::constructors_of("Array", Locale::En).unwrap();
        let found = adapter.resolve(&query).await.unwrap();
        assert_eq!(found.first().kind, SymbolKind::Constructor);
        assert_eq!(found.first().name, "Array");

        let query = CanonicalQuery::constructors_of("Строка", Locale::Ru).unwrap();
        let err = adapter.resolve(&query).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::NotFound);
        assert!(err.message.contains("no constructors"));
    }

    #[tokio::test]
    async fn test_libraries_without_constructor_data_report_not_found() {
        let adapter = ContextIndexAdapter::new(Box::new(StuckReload));
        let query = CanonicalQuery::constructors_of("Массив", Locale::Ru).unwrap();
        let err = adapter.resolve(&query).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::NotFound);
    }

    #[tokio::test]
    async fn test_hanging_library_is_bounded() {
        let adapter =
            ContextIndexAdapter::with_timeout(Box::new(HangingLibrary), Duration::from_millis(50));
        let query = CanonicalQuery::exact("Х", None, Locale::Ru).unwrap();
        let err = adapter.resolve(&query).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::IndexUnavailable);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_refresh_queued_behind_hung_lookup_does_not_stall_queries() {
        let adapter =
            ContextIndexAdapter::with_timeout(Box::new(HangingLibrary), Duration::from_millis(50));
        // Перезагрузка с длинным сроком встает в очередь за зависшим чтением
        let patient = ContextIndexAdapter {
            library: adapter.library.clone(),
            lookup_timeout: Duration::from_secs(5),
        };

        let hung = CanonicalQuery::exact("Х", None, Locale::Ru).unwrap();
        assert_eq!(
            adapter.resolve(&hung).await.unwrap_err().kind,
            FailureKind::IndexUnavailable
        );

        let refresh = tokio::spawn(async move { patient.refresh().await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let started = std::time::Instant::now();
        let query = CanonicalQuery::prefix("Х", None, Locale::Ru).unwrap();
        let outcome = tokio::time::timeout(Duration::from_secs(1), adapter.resolve(&query))
            .await
            .expect("query must not wait for the queued refresh");
        let err = outcome.unwrap_err();
        assert_eq!(err.kind, FailureKind::IndexUnavailable);
        assert!(err.message.contains("busy"));
        assert!(started.elapsed() < Duration::from_millis(400));

        let refreshed = refresh.await.unwrap();
        assert_eq!(refreshed.unwrap_err().kind, FailureKind::IndexUnavailable);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stuck_reload_is_bounded_for_refresh_and_queries() {
        let adapter =
            ContextIndexAdapter::with_timeout(Box::new(StuckReload), Duration::from_millis(50));

        let started = std::time::Instant::now();
        let err = adapter.refresh().await.unwrap_err();
        assert_eq!(err.kind, FailureKind::IndexUnavailable);

        let query = CanonicalQuery::exact("Сообщить", None, Locale::Ru).unwrap();
        let err = adapter.resolve(&query).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::IndexUnavailable);
        assert_eq!(err.query, Some(query.to_string()));
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_library_panic_is_internal() {
        let adapter = ContextIndexAdapter::new(Box::new(HangingLibrary));
        let query = CanonicalQuery::members_of("Х", None, Locale::Ru).unwrap();
        let err = adapter.resolve(&query).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::Internal);
    }

    #[tokio::test]
    async fn test_refresh_failure_is_index_unavailable() {
        let adapter = ContextIndexAdapter::new(Box::new(HangingLibrary));
        let err = adapter.refresh().await.unwrap_err();
        assert_eq!(err.kind, FailureKind::IndexUnavailable);
    }
}
