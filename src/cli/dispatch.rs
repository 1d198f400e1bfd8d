//! Один вызов резолвера на запуск: результат в stdout, отказ в stderr

use colored::Colorize;
use std::io::Write;
use tracing::error;

use super::{EXIT_INDEX_UNAVAILABLE, EXIT_INTERNAL, EXIT_NOT_FOUND, EXIT_OK, EXIT_USAGE};
use crate::core::{FailureKind, QueryResult};
use crate::format::{self, Encoding};
use crate::resolver::{QueryRequest, Resolver};

/// Код выхода процесса для результата запроса
pub fn exit_code(result: &QueryResult) -> i32 {
    match result {
        Ok(_) => EXIT_OK,
        Err(e) => match e.kind {
            FailureKind::InvalidInput => EXIT_USAGE,
            FailureKind::NotFound => EXIT_NOT_FOUND,
            FailureKind::IndexUnavailable => EXIT_INDEX_UNAVAILABLE,
            FailureKind::Internal => EXIT_INTERNAL,
        },
    }
}

/// Resolves one request and writes it in `encoding`; returns the exit code
///
/// `color` подсвечивает текстовый отказ, включается только для терминала.
pub async fn run_query(
    resolver: &dyn Resolver,
    request: QueryRequest,
    encoding: Encoding,
    color: bool,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> i32 {
    let result = resolver.resolve(request).await;

    let mut rendered = format::format(&result, encoding);
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }

    let written = match &result {
        Ok(_) => stdout.write_all(rendered.as_bytes()).and_then(|_| stdout.flush()),
        Err(_) if color && encoding == Encoding::Text => {
            writeln!(stderr, "{} {}", "❌".red(), rendered.trim_end().red())
        }
        Err(_) => stderr.write_all(rendered.as_bytes()),
    };

    match written {
        Ok(()) => exit_code(&result),
        Err(e) => {
            error!("Failed to write query output: {}", e);
            EXIT_INTERNAL
        }
    }
}
