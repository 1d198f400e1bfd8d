/// <module>
///   <name>types</name>
///   <purpose>Типы JSON-RPC и ошибки протокола MCP сервера</purpose>
/// </module>
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub const JSONRPC_VERSION: &str = "2.0";

/// <type>
///   <name>McpResult</name>
///   <purpose>Результат выполнения MCP операций</purpose>
/// </type>
pub type McpResult<T> = Result<T, McpError>;

/// <type>
///   <name>McpError</name>
///   <purpose>Ошибки уровня протокола</purpose>
///   <description>
///     Отказы запросов к контексту сюда не попадают: они возвращаются
///     внутри результата инструмента со status = "error".
///   </description>
/// </type>
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum McpError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),
}

impl McpError {
    pub fn code(&self) -> i32 {
        match self {
            McpError::Parse(_) => -32700,
            McpError::InvalidRequest(_) => -32600,
            McpError::MethodNotFound(_) | McpError::UnknownTool(_) => -32601,
            McpError::InvalidParams(_) => -32602,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// <type>
///   <name>JsonRpcResponse</name>
///   <purpose>Ответ JSON-RPC: ровно одно из result / error</purpose>
/// </type>
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Value,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: Value, error: &McpError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            result: None,
            error: Some(JsonRpcError {
                code: error.code(),
                message: error.to_string(),
                data: None,
            }),
            id,
        }
    }

    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
