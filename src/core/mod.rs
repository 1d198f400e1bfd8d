/*!
# Core Module

Доменная модель слоя запросов: символы платформы, канонический запрос
и единая таксономия отказов.
*/

pub mod errors;
pub mod query;
pub mod symbol;

pub use errors::{FailureKind, QueryError};
pub use query::{CanonicalQuery, Locale, QueryKind};
pub use symbol::{Matches, Parameter, QueryResult, Signature, Symbol, SymbolKind};
