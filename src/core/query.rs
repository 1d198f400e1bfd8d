//! Canonical query: the transport-independent cache key

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::QueryError;
use super::symbol::SymbolKind;

/// Язык имен и документации в ответе
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ru,
    En,
}

impl Locale {
    pub fn parse(raw: &str) -> Option<Locale> {
        match raw.trim().to_lowercase().as_str() {
            "ru" | "rus" | "russian" | "рус" | "русский" => Some(Locale::Ru),
            "en" | "eng" | "english" | "англ" => Some(Locale::En),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::Ru => "ru",
            Locale::En => "en",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    ExactLookup,
    PrefixSearch,
    MemberEnumeration,
    MemberLookup,
    ConstructorEnumeration,
}

/// Normalized request; structurally equal queries are interchangeable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalQuery {
    kind: QueryKind,
    target: String,
    declaring_type: Option<String>,
    kind_filter: Option<SymbolKind>,
    locale: Locale,
}

fn non_empty(value: &str, what: &str) -> Result<String, QueryError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(QueryError::invalid_input(format!("{} must not be empty", what)));
    }
    Ok(trimmed.to_string())
}

impl CanonicalQuery {
    pub fn exact(
        name: &str,
        kind_filter: Option<SymbolKind>,
        locale: Locale,
    ) -> Result<Self, QueryError> {
        Ok(Self {
            kind: QueryKind::ExactLookup,
            target: non_empty(name, "symbol name")?,
            declaring_type: None,
            kind_filter,
            locale,
        })
    }

    pub fn prefix(
        prefix: &str,
        kind_filter: Option<SymbolKind>,
        locale: Locale,
    ) -> Result<Self, QueryError> {
        Ok(Self {
            kind: QueryKind::PrefixSearch,
            target: non_empty(prefix, "search prefix")?,
            declaring_type: None,
            kind_filter,
            locale,
        })
    }

    /// Member enumeration requires a non-empty declaring type
    pub fn members_of(
        type_name: &str,
        kind_filter: Option<SymbolKind>,
        locale: Locale,
    ) -> Result<Self, QueryError> {
        Ok(Self {
            kind: QueryKind::MemberEnumeration,
            target: non_empty(type_name, "declaring type")?,
            declaring_type: None,
            kind_filter,
            locale,
        })
    }

    pub fn member(
        type_name: &str,
        member_name: &str,
        kind_filter: Option<SymbolKind>,
        locale: Locale,
    ) -> Result<Self, QueryError> {
        Ok(Self {
            kind: QueryKind::MemberLookup,
            target: non_empty(member_name, "member name")?,
            declaring_type: Some(non_empty(type_name, "declaring type")?),
            kind_filter,
            locale,
        })
    }

    /// Constructors of a type; the kind filter is meaningless here and is not taken
    pub fn constructors_of(type_name: &str, locale: Locale) -> Result<Self, QueryError> {
        Ok(Self {
            kind: QueryKind::ConstructorEnumeration,
            target: non_empty(type_name, "type name")?,
            declaring_type: None,
            kind_filter: None,
            locale,
        })
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn declaring_type(&self) -> Option<&str> {
        self.declaring_type.as_deref()
    }

    pub fn kind_filter(&self) -> Option<SymbolKind> {
        self.kind_filter
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }
}

impl fmt::Display for CanonicalQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            QueryKind::ExactLookup => write!(f, "lookup \"{}\"", self.target)?,
            QueryKind::PrefixSearch => write!(f, "search \"{}\"", self.target)?,
            QueryKind::MemberEnumeration => write!(f, "members of \"{}\"", self.target)?,
            QueryKind::MemberLookup => write!(
                f,
                "member \"{}\" of \"{}\"",
                self.target,
                self.declaring_type.as_deref().unwrap_or_default()
            )?,
            QueryKind::ConstructorEnumeration => write!(f, "constructors of \"{}\"", self.target)?,
        }
        if let Some(kind) = self.kind_filter {
            write!(f, " kind={}", kind)?;
        }
        write!(f, " locale={}", self.locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FailureKind;

    #[test]
    fn test_exact_trims_and_rejects_empty() {
        let query = CanonicalQuery::exact("  СтрНайти \n", None, Locale::Ru).unwrap();
        assert_eq!(query.target(), "СтрНайти");

        let err = CanonicalQuery::exact("   ", None, Locale::Ru).unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidInput);
    }

    #[test]
    fn test_members_of_requires_declaring_type() {
        let err = CanonicalQuery::members_of("", None, Locale::Ru).unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidInput);

        let err = CanonicalQuery::member(" ", "Добавить", None, Locale::Ru).unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidInput);

        let err = CanonicalQuery::constructors_of("\t", Locale::Ru).unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidInput);
    }

    #[test]
    fn test_equal_queries_share_key() {
        use std::collections::HashSet;

        let mut keys = HashSet::new();
        keys.insert(CanonicalQuery::exact("Массив", None, Locale::Ru).unwrap());
        keys.insert(CanonicalQuery::exact(" Массив", None, Locale::Ru).unwrap());
        keys.insert(CanonicalQuery::exact("Массив", Some(SymbolKind::Type), Locale::Ru).unwrap());
        keys.insert(CanonicalQuery::exact("Массив", None, Locale::En).unwrap());
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn test_display() {
        let query =
            CanonicalQuery::member("Массив", "Добавить", Some(SymbolKind::Method), Locale::En)
                .unwrap();
        assert_eq!(
            query.to_string(),
            "member \"Добавить\" of \"Массив\" kind=Method locale=en"
        );

        let query = CanonicalQuery::constructors_of("Array", Locale::Ru).unwrap();
        assert_eq!(query.to_string(), "constructors of \"Array\" locale=ru");
    }

    #[test]
    fn test_locale_parse() {
        assert_eq!(Locale::parse("EN"), Some(Locale::En));
        assert_eq!(Locale::parse("русский"), Some(Locale::Ru));
        assert_eq!(Locale::parse("de"), None);
    }
}
