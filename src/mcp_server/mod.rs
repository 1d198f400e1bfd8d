/// <module>
///   <name>mcp_server</name>
///   <purpose>Model Context Protocol server over the platform context resolver</purpose>
///   <description>
///     Простой JSON-RPC протокол без внешних MCP библиотек.
///     Отказы запросов возвращаются внутри результата инструмента,
///     ошибки JSON-RPC - только для нарушений протокола.
///   </description>
/// </module>

mod server;
mod tools;
mod types;

pub use server::{McpDispatcher, DEFAULT_PROTOCOL_VERSION, SERVER_NAME};
pub use tools::{
    call_tool, tool_definitions, ResponseFormat, LIST_CONSTRUCTORS, LIST_MEMBERS, LOOKUP_MEMBER,
    LOOKUP_SYMBOL, REFRESH_INDEX, SEARCH_SYMBOLS,
};
pub use types::{JsonRpcResponse, McpError, McpResult};

use std::sync::Arc;
use tokio::io::BufReader;

use crate::resolver::Resolver;

/// Runs the dispatcher on process stdin/stdout
pub async fn serve_stdio(resolver: Arc<dyn Resolver>) -> std::io::Result<()> {
    let dispatcher = Arc::new(McpDispatcher::new(resolver));
    dispatcher
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
}
