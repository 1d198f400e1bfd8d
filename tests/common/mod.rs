//! Общие помощники интеграционных тестов

#![allow(dead_code)]

use bsl_context::{
    ContextLibrary, JsonContextLibrary, LibraryError, QueryResolver, ServiceConfig, Symbol,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/platform")
}

pub fn fixture_library() -> JsonContextLibrary {
    let library = JsonContextLibrary::open(fixture_path());
    assert!(library.is_loaded(), "fixture export must load");
    library
}

pub fn fixture_resolver() -> QueryResolver {
    QueryResolver::with_library(Box::new(fixture_library()), &ServiceConfig::default())
}

/// Счетчики обращений к библиотеке, разделяемые с тестом
#[derive(Clone, Default)]
pub struct LibraryControl {
    pub calls: Arc<AtomicUsize>,
    pub unavailable: Arc<AtomicBool>,
}

impl LibraryControl {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

/// Wraps the fixture library: counts calls, sleeps, can simulate an outage
pub struct InstrumentedLibrary {
    inner: JsonContextLibrary,
    delay: Duration,
    control: LibraryControl,
}

impl InstrumentedLibrary {
    pub fn new(delay: Duration) -> (Self, LibraryControl) {
        let control = LibraryControl::default();
        let library = Self {
            inner: fixture_library(),
            delay,
            control: control.clone(),
        };
        (library, control)
    }

    fn enter(&self) -> Result<(), LibraryError> {
        self.control.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        if self.control.unavailable.load(Ordering::SeqCst) {
            return Err(LibraryError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }
}

impl ContextLibrary for InstrumentedLibrary {
    fn lookup(&self, name: &str) -> Result<Vec<Symbol>, LibraryError> {
        self.enter()?;
        self.inner.lookup(name)
    }

    fn prefix_search(&self, prefix: &str) -> Result<Vec<Symbol>, LibraryError> {
        self.enter()?;
        self.inner.prefix_search(prefix)
    }

    fn members_of(&self, type_name: &str) -> Result<Vec<Symbol>, LibraryError> {
        self.enter()?;
        self.inner.members_of(type_name)
    }

    fn constructors_of(&self, type_name: &str) -> Result<Vec<Symbol>, LibraryError> {
        self.enter()?;
        self.inner.constructors_of(type_name)
    }

    fn refresh_index(&mut self) -> Result<(), LibraryError> {
        self.inner.refresh_index()
    }
}

pub fn instrumented_resolver(
    delay: Duration,
    config: &ServiceConfig,
) -> (QueryResolver, LibraryControl) {
    let (library, control) = InstrumentedLibrary::new(delay);
    (QueryResolver::with_library(Box::new(library), config), control)
}
