/// MCP сервер контекста платформы 1С
///
/// Реализован через простой JSON-RPC протокол без внешних MCP библиотек.
/// Настраивается только через конфигурационный файл и переменные окружения:
/// - `BSL_CONTEXT_PATH` - каталог JSON выгрузки контекста
/// - `BSL_CONTEXT_CONFIG` - путь к TOML конфигурации
/// - `BSL_CONTEXT_LOCALE`, `BSL_CONTEXT_CACHE_TTL`
///
/// Для запуска: cargo run --bin bsl-context-mcp
use anyhow::{Context, Result};
use bsl_context::{mcp_server, QueryResolver, ServiceConfig};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Логи только в stderr: stdout занят протоколом
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = ServiceConfig::load(None).context("Invalid configuration")?;
    tracing::info!(
        "Starting BSL context MCP server (context: {})",
        config
            .index
            .path
            .as_ref()
            .map_or_else(|| "<not configured>".to_string(), |p| p.display().to_string())
    );

    let resolver = QueryResolver::from_config(&config);
    mcp_server::serve_stdio(Arc::new(resolver))
        .await
        .context("MCP server failed")?;

    Ok(())
}
