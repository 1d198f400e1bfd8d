//! In-memory platform index: symbols plus name and member lookup tables

use std::collections::HashMap;

use super::{ContextLibrary, LibraryError};
use crate::core::{Symbol, SymbolKind};

/// Read-only index over a loaded set of platform symbols
///
/// Конструкторы хранятся отдельно: они не участвуют в поиске по имени и
/// префиксу и не входят в список членов типа.
#[derive(Debug, Clone, Default)]
pub struct PlatformIndex {
    symbols: Vec<Symbol>,
    constructors: Vec<Symbol>,
    /// Имя (рус/англ) и полное имя члена -> позиции символов
    by_name: HashMap<String, Vec<usize>>,
    /// Имя типа (рус/англ) -> позиции его членов
    members_by_type: HashMap<String, Vec<usize>>,
    /// Имя типа (рус/англ) -> позиции в `constructors`
    constructors_by_type: HashMap<String, Vec<usize>>,
}

impl PlatformIndex {
    /// Builds the index; the order of `symbols` is the declaration order
    pub fn from_symbols(symbols: Vec<Symbol>) -> Self {
        let (constructors, symbols): (Vec<Symbol>, Vec<Symbol>) = symbols
            .into_iter()
            .partition(|s| s.kind == SymbolKind::Constructor);

        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        let mut members_by_type: HashMap<String, Vec<usize>> = HashMap::new();
        let mut constructors_by_type: HashMap<String, Vec<usize>> = HashMap::new();

        for (position, symbol) in symbols.iter().enumerate() {
            match &symbol.declaring_type {
                Some(owner) => {
                    members_by_type.entry(owner.clone()).or_default().push(position);
                    by_name
                        .entry(symbol.qualified_name())
                        .or_default()
                        .push(position);
                }
                None => {
                    by_name.entry(symbol.name.clone()).or_default().push(position);
                    if let Some(english) = &symbol.english_name {
                        if english != &symbol.name {
                            by_name.entry(english.clone()).or_default().push(position);
                        }
                    }
                }
            }
        }

        for (position, constructor) in constructors.iter().enumerate() {
            let owner = constructor.declaring_type.as_ref().unwrap_or(&constructor.name);
            constructors_by_type.entry(owner.clone()).or_default().push(position);
        }

        // Английское имя типа ведет к тем же членам и конструкторам
        let type_aliases: Vec<(String, String)> = symbols
            .iter()
            .filter(|s| s.kind == SymbolKind::Type)
            .filter_map(|s| s.english_name.clone().map(|en| (en, s.name.clone())))
            .collect();
        for (english, russian) in type_aliases {
            for table in [&mut members_by_type, &mut constructors_by_type] {
                if let Some(positions) = table.get(&russian).cloned() {
                    table.entry(english.clone()).or_insert(positions);
                }
            }
        }

        Self {
            symbols,
            constructors,
            by_name,
            members_by_type,
            constructors_by_type,
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn count_by_kind(&self, kind: SymbolKind) -> usize {
        if kind == SymbolKind::Constructor {
            return self.constructors.len();
        }
        self.symbols.iter().filter(|s| s.kind == kind).count()
    }
}

fn collect(from: &[Symbol], positions: Option<&Vec<usize>>) -> Vec<Symbol> {
    positions
        .map(|positions| positions.iter().map(|&p| from[p].clone()).collect())
        .unwrap_or_default()
}

impl ContextLibrary for PlatformIndex {
    fn lookup(&self, name: &str) -> Result<Vec<Symbol>, LibraryError> {
        Ok(collect(&self.symbols, self.by_name.get(name)))
    }

    fn prefix_search(&self, prefix: &str) -> Result<Vec<Symbol>, LibraryError> {
        let prefix = prefix.to_lowercase();
        Ok(self
            .symbols
            .iter()
            .filter(|symbol| {
                symbol.name.to_lowercase().starts_with(&prefix)
                    || symbol
                        .english_name
                        .as_ref()
                        .is_some_and(|en| en.to_lowercase().starts_with(&prefix))
            })
            .cloned()
            .collect())
    }

    fn members_of(&self, type_name: &str) -> Result<Vec<Symbol>, LibraryError> {
        Ok(collect(&self.symbols, self.members_by_type.get(type_name)))
    }

    fn constructors_of(&self, type_name: &str) -> Result<Vec<Symbol>, LibraryError> {
        Ok(collect(&self.constructors, self.constructors_by_type.get(type_name)))
    }

    fn refresh_index(&mut self) -> Result<(), LibraryError> {
        Ok(())
    }
}
