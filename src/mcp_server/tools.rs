/// <module>
///   <name>tools</name>
///   <purpose>MCP инструменты для запросов к контексту платформы</purpose>
/// </module>
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::types::{McpError, McpResult};
use crate::core::QueryResult;
use crate::format::{self, Encoding};
use crate::resolver::{QueryRequest, Resolver};

pub const LOOKUP_SYMBOL: &str = "lookup-symbol";
pub const SEARCH_SYMBOLS: &str = "search-symbols";
pub const LIST_MEMBERS: &str = "list-members";
pub const LOOKUP_MEMBER: &str = "lookup-member";
pub const LIST_CONSTRUCTORS: &str = "list-constructors";
pub const REFRESH_INDEX: &str = "refresh-index";

/// <type>
///   <name>ResponseFormat</name>
///   <purpose>Кодировка полезной нагрузки инструмента</purpose>
/// </type>
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Json,
    Xml,
}

impl From<ResponseFormat> for Encoding {
    fn from(format: ResponseFormat) -> Self {
        match format {
            ResponseFormat::Json => Encoding::Json,
            ResponseFormat::Xml => Encoding::Xml,
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SymbolArgs {
    /// Имя символа (русское или английское), для членов - `Тип.Член`
    pub name: String,
    /// Фильтр вида: GlobalFunction, Type, Method, Property, Constant, Constructor
    pub kind: Option<String>,
    /// Язык имен в ответе: ru или en
    pub locale: Option<String>,
    /// Формат ответа: json (по умолчанию) или xml
    pub format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchArgs {
    /// Префикс имени, без учета регистра
    pub name: String,
    pub kind: Option<String>,
    pub locale: Option<String>,
    /// Максимальное количество результатов
    pub limit: Option<usize>,
    pub format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MembersArgs {
    /// Имя типа
    pub name: String,
    pub kind: Option<String>,
    pub locale: Option<String>,
    pub format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MemberArgs {
    /// Имя типа
    pub type_name: String,
    /// Имя члена типа
    pub name: String,
    pub kind: Option<String>,
    pub locale: Option<String>,
    pub format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConstructorsArgs {
    /// Имя типа (русское или английское)
    pub name: String,
    pub locale: Option<String>,
    pub format: Option<ResponseFormat>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct RefreshArgs {}

fn input_schema<T: JsonSchema>() -> Value {
    let mut schema =
        serde_json::to_value(schema_for!(T)).unwrap_or_else(|_| json!({"type": "object"}));
    if let Some(object) = schema.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
    }
    schema
}

fn tool(name: &str, description: &str, schema: Value) -> Value {
    json!({
        "name": name,
        "description": description,
        "inputSchema": schema,
    })
}

/// Описания всех инструментов для `tools/list`
pub fn tool_definitions() -> Vec<Value> {
    vec![
        tool(
            LOOKUP_SYMBOL,
            "Точный поиск глобальной функции, типа или члена типа (Тип.Член) в контексте 1С",
            input_schema::<SymbolArgs>(),
        ),
        tool(
            SEARCH_SYMBOLS,
            "Поиск символов контекста платформы по префиксу имени",
            input_schema::<SearchArgs>(),
        ),
        tool(
            LIST_MEMBERS,
            "Методы, свойства и значения типа платформы",
            input_schema::<MembersArgs>(),
        ),
        tool(
            LOOKUP_MEMBER,
            "Один метод, свойство или значение типа платформы",
            input_schema::<MemberArgs>(),
        ),
        tool(
            LIST_CONSTRUCTORS,
            "Конструкторы типа платформы (варианты Новый Тип(...))",
            input_schema::<ConstructorsArgs>(),
        ),
        tool(
            REFRESH_INDEX,
            "Перечитать выгрузку контекста платформы и сбросить кэш запросов",
            input_schema::<RefreshArgs>(),
        ),
    ]
}

fn parse_args<T: DeserializeOwned>(tool_name: &str, arguments: Value) -> McpResult<T> {
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    serde_json::from_value(arguments)
        .map_err(|e| McpError::InvalidParams(format!("{}: {}", tool_name, e)))
}

/// `tools/call` result; `isError` mirrors the payload status
pub fn tool_result(text: String, is_error: bool) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error,
    })
}

fn query_result(result: &QueryResult, format: Option<ResponseFormat>) -> Value {
    let encoding = Encoding::from(format.unwrap_or_default());
    tool_result(format::format(result, encoding), result.is_err())
}

/// Executes one tool against the resolver
pub async fn call_tool(resolver: &dyn Resolver, name: &str, arguments: Value) -> McpResult<Value> {
    match name {
        LOOKUP_SYMBOL => {
            let args: SymbolArgs = parse_args(name, arguments)?;
            let request = QueryRequest::exact(args.name)
                .with_kind(args.kind)
                .with_locale(args.locale);
            Ok(query_result(&resolver.resolve(request).await, args.format))
        }
        SEARCH_SYMBOLS => {
            let args: SearchArgs = parse_args(name, arguments)?;
            let request = QueryRequest::prefix(args.name)
                .with_kind(args.kind)
                .with_locale(args.locale)
                .with_limit(args.limit);
            Ok(query_result(&resolver.resolve(request).await, args.format))
        }
        LIST_MEMBERS => {
            let args: MembersArgs = parse_args(name, arguments)?;
            let request = QueryRequest::members(args.name)
                .with_kind(args.kind)
                .with_locale(args.locale);
            Ok(query_result(&resolver.resolve(request).await, args.format))
        }
        LOOKUP_MEMBER => {
            let args: MemberArgs = parse_args(name, arguments)?;
            let request = QueryRequest::member(args.type_name, args.name)
                .with_kind(args.kind)
                .with_locale(args.locale);
            Ok(query_result(&resolver.resolve(request).await, args.format))
        }
        LIST_CONSTRUCTORS => {
            let args: ConstructorsArgs = parse_args(name, arguments)?;
            let request = QueryRequest::constructors(args.name).with_locale(args.locale);
            Ok(query_result(&resolver.resolve(request).await, args.format))
        }
        REFRESH_INDEX => {
            let _: RefreshArgs = parse_args(name, arguments)?;
            Ok(match resolver.refresh().await {
                Ok(()) => tool_result(json!({"status": "ok"}).to_string(), false),
                Err(e) => tool_result(format::to_json(&Err(e)), true),
            })
        }
        other => Err(McpError::UnknownTool(other.to_string())),
    }
}
