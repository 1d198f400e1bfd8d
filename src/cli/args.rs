//! Аргументы командной строки `bsl-context`

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CONTEXT_PATH_ENV;
use crate::format::Encoding;
use crate::resolver::QueryRequest;

#[derive(Parser, Debug)]
#[command(
    name = "bsl-context",
    version = env!("CARGO_PKG_VERSION"),
    author = "BSL Analyzer Team",
    about = "Query the BSL (1C:Enterprise) platform context: global functions, types, members"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory with the platform context JSON export
    #[arg(long, env = CONTEXT_PATH_ENV, global = true)]
    pub context_path: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Kind filter (GlobalFunction, Type, Method, Property, Constant, Constructor or an alias)
    #[arg(short, long, global = true)]
    pub kind: Option<String>,

    /// Locale of names in the answer (ru, en)
    #[arg(short, long, global = true)]
    pub locale: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Encoding::Text, global = true)]
    pub format: Encoding,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Exact lookup of a global function, type or `Type.Member`
    Lookup {
        /// Symbol name (Russian or English)
        name: String,
    },

    /// Symbols whose name starts with a prefix
    Search {
        /// Name prefix, case-insensitive
        prefix: String,

        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Members of a type
    Members {
        /// Type name
        #[arg(value_name = "TYPE")]
        type_name: String,
    },

    /// One member of a type
    Member {
        /// Type name
        #[arg(value_name = "TYPE")]
        type_name: String,

        /// Member name
        name: String,
    },

    /// Constructors of a type (`Новый Тип(...)`)
    Constructors {
        /// Type name
        #[arg(value_name = "TYPE")]
        type_name: String,
    },

    /// Serve MCP (JSON-RPC over stdio)
    McpServer,
}

impl Cli {
    /// Request for the query subcommands; `None` for `mcp-server`
    pub fn to_request(&self) -> Option<QueryRequest> {
        let request = match &self.command {
            Commands::Lookup { name } => QueryRequest::exact(name.as_str()),
            Commands::Search { prefix, limit } => {
                QueryRequest::prefix(prefix.as_str()).with_limit(*limit)
            }
            Commands::Members { type_name } => QueryRequest::members(type_name.as_str()),
            Commands::Member { type_name, name } => {
                QueryRequest::member(type_name.as_str(), name.as_str())
            }
            Commands::Constructors { type_name } => QueryRequest::constructors(type_name.as_str()),
            Commands::McpServer => return None,
        };
        Some(
            request
                .with_kind(self.kind.clone())
                .with_locale(self.locale.clone()),
        )
    }
}
