//! Общий модуль для CLI
//!
//! Содержит:
//! - Инициализацию логирования (всегда в stderr, stdout остается для результата)
//! - Разбор аргументов командной строки
//! - Выполнение одного запроса и отображение отказа в код выхода

use anyhow::Result;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

pub mod args;
pub mod dispatch;

pub use args::{Cli, Commands};
pub use dispatch::{exit_code, run_query};

pub const EXIT_OK: i32 = 0;
pub const EXIT_INTERNAL: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_NOT_FOUND: i32 = 3;
pub const EXIT_INDEX_UNAVAILABLE: i32 = 4;

/// Инициализирует систему логирования; `RUST_LOG` имеет приоритет
pub fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

/// Выводит ошибку
pub fn print_error(message: &str) {
    eprintln!("{} {}", "❌".red(), message.red());
}
