/*!
# Platform Context

Граница с внешней библиотекой контекста платформы и адаптер над ней.

Библиотека отвечает на четыре основных вопроса: поиск по имени, поиск по
префиксу, перечисление членов типа и перезагрузка индекса. Конструкторы типа
идут отдельным необязательным вызовом. Все остальное (локализация, фильтр
видов, ограничение ожидания) делает адаптер.
*/

pub mod adapter;
pub mod index;
pub mod json_library;

pub use adapter::ContextIndexAdapter;
pub use index::PlatformIndex;
pub use json_library::JsonContextLibrary;

use crate::core::Symbol;
use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by a context library implementation
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("platform context is not loaded: {0}")]
    Unavailable(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed platform context in {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Query surface of the external metadata library
///
/// Реализации обязаны быть безопасны для одновременного чтения; `refresh_index`
/// вызывается только под эксклюзивной блокировкой адаптера.
pub trait ContextLibrary: Send + Sync {
    /// Symbols whose name (localized or English) equals `name`, case-sensitive
    fn lookup(&self, name: &str) -> Result<Vec<Symbol>, LibraryError>;

    /// Symbols whose name starts with `prefix`, case-insensitive, in declaration order
    fn prefix_search(&self, prefix: &str) -> Result<Vec<Symbol>, LibraryError>;

    /// Members of the type named `type_name`; empty when the type is unknown
    fn members_of(&self, type_name: &str) -> Result<Vec<Symbol>, LibraryError>;

    /// Constructor variants of `type_name`; libraries without constructor data report none
    fn constructors_of(&self, _type_name: &str) -> Result<Vec<Symbol>, LibraryError> {
        Ok(Vec::new())
    }

    fn refresh_index(&mut self) -> Result<(), LibraryError>;
}
