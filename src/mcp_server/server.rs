/// <module>
///   <name>server</name>
///   <purpose>JSON-RPC диспетчер MCP поверх построчного stdio</purpose>
///   <description>
///     Каждый запрос обрабатывается отдельной задачей, ответы пишет одна
///     задача-писатель. notifications/cancelled прерывает задачу запроса,
///     ответ на отмененный запрос не отправляется.
///   </description>
/// </module>
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinSet};
use tracing::{debug, info, warn};

use super::tools;
use super::types::{JsonRpcResponse, McpError, McpResult};
use crate::resolver::Resolver;

pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "bsl-context";

/// id запроса (в виде JSON текста) -> (порядковый номер, задача)
type InFlight = Arc<Mutex<HashMap<String, (u64, AbortHandle)>>>;

/// <type>
///   <name>McpDispatcher</name>
///   <purpose>Отображение сообщений MCP на вызовы резолвера</purpose>
/// </type>
pub struct McpDispatcher {
    resolver: Arc<dyn Resolver>,
}

impl McpDispatcher {
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self { resolver }
    }

    /// Handles one decoded message; `None` for notifications
    pub async fn handle_message(&self, message: Value) -> Option<Value> {
        let id = message.get("id").cloned();

        let outcome = match request_method(&message) {
            Ok(method) => {
                let request_id = id.as_ref().map_or_else(|| "-".to_string(), |v| v.to_string());
                debug!("MCP request {}: {}", request_id, method);
                self.handle_method(method, message.get("params")).await
            }
            Err(e) => Err(e),
        };

        // На уведомления не отвечают даже ошибкой
        let id = id?;
        Some(match outcome {
            Ok(Some(result)) => JsonRpcResponse::success(id, result).into_value(),
            Ok(None) => return None,
            Err(e) => {
                warn!("MCP request {} failed: {}", id, e);
                JsonRpcResponse::failure(id, &e).into_value()
            }
        })
    }

    async fn handle_method(
        &self,
        method: &str,
        params: Option<&Value>,
    ) -> McpResult<Option<Value>> {
        match method {
            "initialize" => {
                let protocol_version = params
                    .and_then(|p| p.get("protocolVersion"))
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_PROTOCOL_VERSION);
                Ok(Some(json!({
                    "protocolVersion": protocol_version,
                    "capabilities": { "tools": { "listChanged": false } },
                    "serverInfo": {
                        "name": SERVER_NAME,
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                })))
            }
            "notifications/initialized" | "notifications/cancelled" => Ok(None),
            "ping" => Ok(Some(json!({}))),
            "tools/list" => Ok(Some(json!({ "tools": tools::tool_definitions() }))),
            "tools/call" => {
                let params = params.and_then(Value::as_object).ok_or_else(|| {
                    McpError::InvalidParams("tools/call expects an object".to_string())
                })?;
                let name = params.get("name").and_then(Value::as_str).ok_or_else(|| {
                    McpError::InvalidParams("tools/call requires a tool name".to_string())
                })?;
                let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

                tools::call_tool(self.resolver.as_ref(), name, arguments)
                    .await
                    .map(Some)
            }
            other => Err(McpError::MethodNotFound(other.to_string())),
        }
    }

    /// Serves newline-delimited JSON-RPC until the reader is exhausted
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (sender, mut receiver) = mpsc::unbounded_channel::<String>();
        let writer_task = tokio::spawn(async move {
            while let Some(line) = receiver.recv().await {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Ok::<(), std::io::Error>(())
        });

        let in_flight: InFlight = Arc::new(Mutex::new(HashMap::new()));
        let mut tasks = JoinSet::new();
        let mut sequence = 0u64;
        let mut lines = reader.lines();

        loop {
            let line = tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => line,
                    None => break,
                },
                Some(_) = tasks.join_next(), if !tasks.is_empty() => continue,
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let message: Value = match serde_json::from_str(line) {
                Ok(message) => message,
                Err(e) => {
                    warn!("Failed to parse MCP message: {}", e);
                    let response =
                        JsonRpcResponse::failure(Value::Null, &McpError::Parse(e.to_string()));
                    let _ = sender.send(response.into_value().to_string());
                    continue;
                }
            };

            if message.get("method").and_then(Value::as_str) == Some("notifications/cancelled") {
                cancel(&in_flight, &message);
                continue;
            }

            sequence += 1;
            let key = message.get("id").map(Value::to_string);
            let dispatcher = Arc::clone(&self);
            let sender = sender.clone();
            let registry = Arc::clone(&in_flight);
            let task_key = key.clone();
            let task_sequence = sequence;

            // Регистрация под блокировкой: задача не снимет себя раньше, чем будет записана
            {
                let mut registered = lock(&in_flight);
                let handle = tasks.spawn(async move {
                    if let Some(response) = dispatcher.handle_message(message).await {
                        let _ = sender.send(response.to_string());
                    }
                    if let Some(key) = task_key {
                        let mut registered = lock(&registry);
                        if registered.get(&key).is_some_and(|(seq, _)| *seq == task_sequence) {
                            registered.remove(&key);
                        }
                    }
                });
                if let Some(key) = key {
                    registered.insert(key, (task_sequence, handle));
                }
            }
        }

        while tasks.join_next().await.is_some() {}
        drop(sender);
        writer_task
            .await
            .unwrap_or_else(|e| Err(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
        info!("MCP input closed, server stopped");
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn request_method(message: &Value) -> McpResult<&str> {
    let object = message
        .as_object()
        .ok_or_else(|| McpError::InvalidRequest("message must be a JSON object".to_string()))?;
    if let Some(version) = object.get("jsonrpc") {
        if version != "2.0" {
            return Err(McpError::InvalidRequest(format!(
                "unsupported jsonrpc version {}",
                version
            )));
        }
    }
    object
        .get("method")
        .and_then(Value::as_str)
        .ok_or_else(|| McpError::InvalidRequest("missing method".to_string()))
}

fn cancel(in_flight: &InFlight, message: &Value) {
    let Some(request_id) = message.get("params").and_then(|p| p.get("requestId")) else {
        warn!("notifications/cancelled without requestId");
        return;
    };
    match lock(in_flight).remove(&request_id.to_string()) {
        Some((_, handle)) => {
            handle.abort();
            debug!("MCP request {} cancelled", request_id);
        }
        None => debug!("MCP request {} already finished, nothing to cancel", request_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PlatformIndex;
    use crate::config::ServiceConfig;
    use crate::core::{Symbol, SymbolKind};
    use crate::resolver::QueryResolver;

    fn dispatcher() -> McpDispatcher {
        let library = PlatformIndex::from_symbols(vec![
            Symbol::new("Сообщить", SymbolKind::GlobalFunction).with_english_name("Message"),
        ]);
        McpDispatcher::new(Arc::new(QueryResolver::with_library(
            Box::new(library),
            &ServiceConfig::default(),
        )))
    }

    #[tokio::test]
    async fn test_initialize_echoes_protocol_version() {
        let response = dispatcher()
            .handle_message(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize",
                "params": {"protocolVersion": "2025-03-26"}}))
            .await
            .unwrap();
        assert_eq!(response["result"]["protocolVersion"], "2025-03-26");
        assert_eq!(response["result"]["serverInfo"]["name"], SERVER_NAME);

        let response = dispatcher()
            .handle_message(json!({"jsonrpc": "2.0", "id": 2, "method": "initialize"}))
            .await
            .unwrap();
        assert_eq!(response["result"]["protocolVersion"], DEFAULT_PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn test_request_ids_of_any_json_type_are_echoed() {
        let dispatcher = dispatcher();
        for id in [json!(7), json!("req-7"), json!({"nested": [1, 2]})] {
            let response = dispatcher
                .handle_message(json!({"jsonrpc": "2.0", "id": id.clone(), "method": "ping"}))
                .await
                .unwrap();
            assert_eq!(response["id"], id);
            assert_eq!(response["result"], json!({}));
        }
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let dispatcher = dispatcher();
        assert!(dispatcher
            .handle_message(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await
            .is_none());
        assert!(dispatcher
            .handle_message(json!({"jsonrpc": "2.0", "method": "unknown/notification"}))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_protocol_faults() {
        let dispatcher = dispatcher();

        let response = dispatcher
            .handle_message(json!({"jsonrpc": "2.0", "id": 1, "method": "resources/list"}))
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], -32601);

        let response = dispatcher
            .handle_message(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call",
                "params": {"name": "no-such-tool", "arguments": {}}}))
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], -32601);

        let response = dispatcher
            .handle_message(json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
                "params": {"name": "lookup-symbol", "arguments": {"name": 42}}}))
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], -32602);

        let response = dispatcher.handle_message(json!({"jsonrpc": "2.0", "id": 4})).await.unwrap();
        assert_eq!(response["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn test_query_failure_stays_in_payload() {
        let response = dispatcher()
            .handle_message(json!({"jsonrpc": "2.0", "id": 7, "method": "tools/call",
                "params": {"name": "lookup-symbol", "arguments": {"name": "   "}}}))
            .await
            .unwrap();

        assert!(response.get("error").is_none());
        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        let payload: Value = serde_json::from_str(text).unwrap();
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error"]["kind"], "InvalidInput");
    }
}
