//! Context library over the platform context JSON export
//!
//! Каталог выгрузки содержит три файла: `global-methods.json`,
//! `global-properties.json` и `types.json`. Обязателен только первый.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::index::PlatformIndex;
use super::{ContextLibrary, LibraryError};
use crate::core::{Parameter, Signature, Symbol, SymbolKind};

pub const GLOBAL_METHODS_FILE: &str = "global-methods.json";
pub const GLOBAL_PROPERTIES_FILE: &str = "global-properties.json";
pub const TYPES_FILE: &str = "types.json";

const NOT_CONFIGURED: &str = "platform context path is not configured";

#[derive(Debug, Deserialize)]
struct ParameterRecord {
    name: String,
    #[serde(rename = "type")]
    type_name: Option<String>,
    #[serde(default)]
    required: bool,
}

#[derive(Debug, Deserialize)]
struct SignatureRecord {
    /// Имя варианта вызова, например `ПоКоличествуЭлементов`
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    params: Vec<ParameterRecord>,
}

#[derive(Debug, Deserialize)]
struct MethodRecord {
    name: String,
    name_en: Option<String>,
    description: Option<String>,
    #[serde(default)]
    signature: Vec<SignatureRecord>,
    #[serde(rename = "return")]
    return_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PropertyRecord {
    name: String,
    #[serde(rename = "nameEn", alias = "name_en")]
    name_en: Option<String>,
    description: Option<String>,
    #[serde(rename = "type")]
    type_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValueRecord {
    name: String,
    name_en: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TypeRecord {
    name: String,
    name_en: Option<String>,
    description: Option<String>,
    #[serde(default)]
    methods: Vec<MethodRecord>,
    #[serde(default)]
    properties: Vec<PropertyRecord>,
    #[serde(default)]
    values: Vec<ValueRecord>,
    #[serde(default)]
    constructors: Vec<SignatureRecord>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Один символ на каждую сигнатуру метода, в порядке объявления
fn convert_method(
    record: MethodRecord,
    kind: SymbolKind,
    owner: Option<&str>,
    out: &mut Vec<Symbol>,
) {
    let base = Symbol {
        name: record.name,
        english_name: non_blank(record.name_en),
        kind,
        declaring_type: owner.map(str::to_string),
        signature: Signature {
            parameters: Vec::new(),
            return_type: non_blank(record.return_type),
        },
        summary: non_blank(record.description),
    };

    if record.signature.is_empty() {
        out.push(base);
        return;
    }

    for signature in record.signature {
        let mut symbol = base.clone();
        symbol.signature.parameters = convert_params(signature.params);
        if symbol.summary.is_none() {
            symbol.summary = non_blank(signature.description);
        }
        out.push(symbol);
    }
}

fn convert_params(params: Vec<ParameterRecord>) -> Vec<Parameter> {
    params
        .into_iter()
        .map(|p| Parameter {
            name: p.name,
            type_name: non_blank(p.type_name),
            required: p.required,
        })
        .collect()
}

/// Конструктор называется именем типа; описание варианта берется из сигнатуры
fn convert_constructor(record: SignatureRecord, type_name: &str, english: Option<&str>) -> Symbol {
    Symbol {
        name: type_name.to_string(),
        english_name: english.map(str::to_string),
        kind: SymbolKind::Constructor,
        declaring_type: Some(type_name.to_string()),
        signature: Signature {
            parameters: convert_params(record.params),
            return_type: None,
        },
        summary: non_blank(record.description).or_else(|| non_blank(record.name)),
    }
}

fn convert_property(record: PropertyRecord, owner: Option<&str>) -> Symbol {
    Symbol {
        name: record.name,
        english_name: non_blank(record.name_en),
        kind: SymbolKind::Property,
        declaring_type: owner.map(str::to_string),
        signature: Signature {
            parameters: Vec::new(),
            return_type: non_blank(record.type_name),
        },
        summary: non_blank(record.description),
    }
}

fn read_records<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, LibraryError> {
    let content = fs::read_to_string(path).map_err(|source| LibraryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    // Выгрузки из Windows часто начинаются с BOM
    let content = content.trim_start_matches('\u{feff}');
    serde_json::from_str(content).map_err(|source| LibraryError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

fn read_optional_records<T: for<'de> Deserialize<'de>>(
    path: &Path,
) -> Result<Vec<T>, LibraryError> {
    if path.exists() {
        read_records(path)
    } else {
        Ok(Vec::new())
    }
}

/// Loads an export directory into a `PlatformIndex`
pub fn load_export(root: &Path) -> Result<PlatformIndex, LibraryError> {
    // Пустой путь означал бы текущий каталог
    if root.as_os_str().is_empty() {
        return Err(LibraryError::Unavailable(NOT_CONFIGURED.to_string()));
    }

    let methods: Vec<MethodRecord> = read_records(&root.join(GLOBAL_METHODS_FILE))?;
    let properties: Vec<PropertyRecord> =
        read_optional_records(&root.join(GLOBAL_PROPERTIES_FILE))?;
    let types: Vec<TypeRecord> = read_optional_records(&root.join(TYPES_FILE))?;

    let mut symbols = Vec::new();
    for method in methods {
        convert_method(method, SymbolKind::GlobalFunction, None, &mut symbols);
    }
    for property in properties {
        symbols.push(convert_property(property, None));
    }

    // Сначала все типы, затем их члены: порядок объявления внутри типа сохраняется
    let mut members = Vec::new();
    for type_record in types {
        let owner = type_record.name.clone();
        let english = non_blank(type_record.name_en);
        for constructor in type_record.constructors {
            members.push(convert_constructor(constructor, &owner, english.as_deref()));
        }
        symbols.push(Symbol {
            name: type_record.name,
            english_name: english,
            kind: SymbolKind::Type,
            declaring_type: None,
            signature: Signature::default(),
            summary: non_blank(type_record.description),
        });
        for method in type_record.methods {
            convert_method(method, SymbolKind::Method, Some(&owner), &mut members);
        }
        for property in type_record.properties {
            members.push(convert_property(property, Some(&owner)));
        }
        for value in type_record.values {
            members.push(Symbol {
                name: value.name,
                english_name: non_blank(value.name_en),
                kind: SymbolKind::Constant,
                declaring_type: Some(owner.clone()),
                signature: Signature::default(),
                summary: non_blank(value.description),
            });
        }
    }
    symbols.extend(members);

    Ok(PlatformIndex::from_symbols(symbols))
}

/// Platform context backed by a JSON export directory
pub struct JsonContextLibrary {
    root: PathBuf,
    state: Result<PlatformIndex, String>,
}

impl JsonContextLibrary {
    /// Opens the export; a load failure leaves the library unloaded, not absent
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let state = match load_export(&root) {
            Ok(index) => {
                log_loaded(&root, &index);
                Ok(index)
            }
            Err(e) => {
                warn!("Platform context at {} is unavailable: {}", root.display(), e);
                Err(e.to_string())
            }
        };
        Self { root, state }
    }

    /// A library with no export behind it; every call reports `Unavailable`
    pub fn unconfigured() -> Self {
        Self {
            root: PathBuf::new(),
            state: Err(NOT_CONFIGURED.to_string()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_loaded(&self) -> bool {
        self.state.is_ok()
    }

    fn index(&self) -> Result<&PlatformIndex, LibraryError> {
        self.state
            .as_ref()
            .map_err(|reason| LibraryError::Unavailable(reason.clone()))
    }
}

fn log_loaded(root: &Path, index: &PlatformIndex) {
    info!(
        "Loaded platform context from {}: {} global functions, {} types, {} symbols total",
        root.display(),
        index.count_by_kind(SymbolKind::GlobalFunction),
        index.count_by_kind(SymbolKind::Type),
        index.len()
    );
}

impl ContextLibrary for JsonContextLibrary {
    fn lookup(&self, name: &str) -> Result<Vec<Symbol>, LibraryError> {
        self.index()?.lookup(name)
    }

    fn prefix_search(&self, prefix: &str) -> Result<Vec<Symbol>, LibraryError> {
        self.index()?.prefix_search(prefix)
    }

    fn members_of(&self, type_name: &str) -> Result<Vec<Symbol>, LibraryError> {
        self.index()?.members_of(type_name)
    }

    fn constructors_of(&self, type_name: &str) -> Result<Vec<Symbol>, LibraryError> {
        self.index()?.constructors_of(type_name)
    }

    /// Re-reads the export; a failed reload keeps the previous index
    fn refresh_index(&mut self) -> Result<(), LibraryError> {
        match load_export(&self.root) {
            Ok(index) => {
                log_loaded(&self.root, &index);
                self.state = Ok(index);
                Ok(())
            }
            Err(e) => {
                warn!("Platform context refresh failed: {}", e);
                if self.state.is_err() {
                    self.state = Err(e.to_string());
                }
                Err(e)
            }
        }
    }
}
