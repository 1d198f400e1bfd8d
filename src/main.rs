/*!
# BSL Context CLI

Command-line interface for the BSL (1C:Enterprise) platform context.
*/

use anyhow::{Context, Result};
use bsl_context::cli::{self, Cli, EXIT_INTERNAL, EXIT_OK, EXIT_USAGE};
use bsl_context::{mcp_server, QueryResolver, ServiceConfig};
use clap::Parser;
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() {
    // Ошибки разбора аргументов clap завершает с кодом 2, --help/--version с кодом 0
    let cli = Cli::try_parse().unwrap_or_else(|e| e.exit());

    if let Err(e) = cli::init_logging(cli.verbose) {
        eprintln!("{}", e);
    }

    let code = match load_config(&cli) {
        Ok(config) => match run(cli, config).await {
            Ok(code) => code,
            Err(e) => {
                cli::print_error(&format!("{:#}", e));
                EXIT_INTERNAL
            }
        },
        Err(e) => {
            cli::print_error(&format!("{:#}", e));
            EXIT_USAGE
        }
    };

    std::process::exit(code);
}

fn load_config(cli: &Cli) -> Result<ServiceConfig> {
    let mut config = ServiceConfig::load(cli.config.as_deref()).context("Invalid configuration")?;
    if let Some(path) = &cli.context_path {
        config.index.path = Some(path.clone());
    }
    Ok(config)
}

async fn run(cli: Cli, config: ServiceConfig) -> Result<i32> {
    let resolver = QueryResolver::from_config(&config);

    let Some(request) = cli.to_request() else {
        info!("Starting MCP server on stdio");
        mcp_server::serve_stdio(Arc::new(resolver))
            .await
            .context("MCP server failed")?;
        return Ok(EXIT_OK);
    };

    let color = std::io::stderr().is_terminal();
    let mut stdout = std::io::stdout().lock();
    let mut stderr = std::io::stderr().lock();
    Ok(cli::run_query(&resolver, request, cli.format, color, &mut stdout, &mut stderr).await)
}
