//! Символы API платформы и результат запроса

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use super::errors::QueryError;

/// Kind of a platform API element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SymbolKind {
    GlobalFunction,
    Type,
    Method,
    Property,
    Constant,
    /// `Новый Тип(...)`; одна запись на вариант вызова
    Constructor,
}

/// Алиасы видов для фильтра (русские и английские, как их пишут LLM)
static KIND_ALIASES: Lazy<HashMap<&'static str, SymbolKind>> = Lazy::new(|| {
    let mut aliases = HashMap::new();

    for alias in [
        "globalfunction",
        "global-function",
        "global_function",
        "function",
        "функция",
        "глобальнаяфункция",
    ] {
        aliases.insert(alias, SymbolKind::GlobalFunction);
    }
    for alias in ["type", "object", "class", "datatype", "тип", "объект", "класс"] {
        aliases.insert(alias, SymbolKind::Type);
    }
    for alias in ["method", "метод", "процедура"] {
        aliases.insert(alias, SymbolKind::Method);
    }
    for alias in ["property", "свойство", "реквизит", "поле", "атрибут"] {
        aliases.insert(alias, SymbolKind::Property);
    }
    for alias in ["constant", "константа", "значение"] {
        aliases.insert(alias, SymbolKind::Constant);
    }
    for alias in ["constructor", "new", "конструктор", "новый"] {
        aliases.insert(alias, SymbolKind::Constructor);
    }

    aliases
});

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::GlobalFunction => "GlobalFunction",
            SymbolKind::Type => "Type",
            SymbolKind::Method => "Method",
            SymbolKind::Property => "Property",
            SymbolKind::Constant => "Constant",
            SymbolKind::Constructor => "Constructor",
        }
    }

    /// Parses a kind filter, accepting canonical names and aliases (case-insensitive)
    pub fn parse_filter(raw: &str) -> Option<SymbolKind> {
        let normalized = raw.trim().to_lowercase();
        KIND_ALIASES.get(normalized.as_str()).copied()
    }

    /// Вызываемые элементы печатаются со списком параметров
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            SymbolKind::GlobalFunction | SymbolKind::Method | SymbolKind::Constructor
        )
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter of a method signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
}

/// A named element of the BSL platform API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub english_name: Option<String>,
    pub kind: SymbolKind,
    pub declaring_type: Option<String>,
    pub signature: Signature,
    pub summary: Option<String>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            english_name: None,
            kind,
            declaring_type: None,
            signature: Signature::default(),
            summary: None,
        }
    }

    pub fn with_english_name(mut self, english_name: impl Into<String>) -> Self {
        self.english_name = Some(english_name.into());
        self
    }

    pub fn with_declaring_type(mut self, declaring_type: impl Into<String>) -> Self {
        self.declaring_type = Some(declaring_type.into());
        self
    }

    pub fn with_parameter(mut self, name: &str, type_name: Option<&str>, required: bool) -> Self {
        self.signature.parameters.push(Parameter {
            name: name.to_string(),
            type_name: type_name.map(str::to_string),
            required,
        });
        self
    }

    pub fn with_return_type(mut self, return_type: impl Into<String>) -> Self {
        self.signature.return_type = Some(return_type.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// `Type.Member` for members, the bare name otherwise
    pub fn qualified_name(&self) -> String {
        match &self.declaring_type {
            Some(owner) => format!("{}.{}", owner, self.name),
            None => self.name.clone(),
        }
    }

    /// Точное совпадение с русским или английским именем (с учетом регистра)
    pub fn has_name(&self, name: &str) -> bool {
        self.name == name || self.english_name.as_deref() == Some(name)
    }
}

/// Non-empty ordered sequence of symbols, best match first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matches(Arc<[Symbol]>);

impl Matches {
    /// Returns `None` for an empty sequence
    pub fn new(symbols: Vec<Symbol>) -> Option<Self> {
        if symbols.is_empty() {
            None
        } else {
            Some(Self(symbols.into()))
        }
    }

    pub fn first(&self) -> &Symbol {
        &self.0[0]
    }

    /// Keeps at most `limit` leading symbols (at least one)
    pub fn truncated(&self, limit: usize) -> Matches {
        if limit >= self.0.len() {
            return self.clone();
        }
        Matches(self.0[..limit.max(1)].to_vec().into())
    }

    /// Several symbols answered one exact name (overloads, homonyms)
    pub fn is_ambiguous(&self) -> bool {
        self.0.len() > 1
    }
}

impl Deref for Matches {
    type Target = [Symbol];

    fn deref(&self) -> &[Symbol] {
        &self.0
    }
}

/// Either a ranked non-empty set of symbols or a typed failure
pub type QueryResult = Result<Matches, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter_aliases() {
        assert_eq!(SymbolKind::parse_filter("GlobalFunction"), Some(SymbolKind::GlobalFunction));
        assert_eq!(SymbolKind::parse_filter("  Функция "), Some(SymbolKind::GlobalFunction));
        assert_eq!(SymbolKind::parse_filter("объект"), Some(SymbolKind::Type));
        assert_eq!(SymbolKind::parse_filter("Реквизит"), Some(SymbolKind::Property));
        assert_eq!(SymbolKind::parse_filter("method"), Some(SymbolKind::Method));
        assert_eq!(SymbolKind::parse_filter("константа"), Some(SymbolKind::Constant));
        assert_eq!(SymbolKind::parse_filter("Новый"), Some(SymbolKind::Constructor));
        assert_eq!(SymbolKind::parse_filter("widget"), None);
    }

    #[test]
    fn test_qualified_name() {
        let method = Symbol::new("Добавить", SymbolKind::Method).with_declaring_type("Массив");
        assert_eq!(method.qualified_name(), "Массив.Добавить");
        assert_eq!(Symbol::new("Массив", SymbolKind::Type).qualified_name(), "Массив");
    }

    #[test]
    fn test_has_name_is_case_sensitive() {
        let symbol =
            Symbol::new("СтрНайти", SymbolKind::GlobalFunction).with_english_name("StrFind");
        assert!(symbol.has_name("СтрНайти"));
        assert!(symbol.has_name("StrFind"));
        assert!(!symbol.has_name("стрнайти"));
    }

    #[test]
    fn test_matches_rejects_empty_and_truncates() {
        assert!(Matches::new(Vec::new()).is_none());

        let matches = Matches::new(vec![
            Symbol::new("А", SymbolKind::Type),
            Symbol::new("Б", SymbolKind::Type),
            Symbol::new("В", SymbolKind::Type),
        ])
        .unwrap();
        assert!(matches.is_ambiguous());
        assert_eq!(matches.truncated(2).len(), 2);
        assert_eq!(matches.truncated(0).len(), 1);
        assert_eq!(matches.truncated(10).len(), 3);
    }
}
