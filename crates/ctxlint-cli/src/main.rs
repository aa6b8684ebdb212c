// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! ctxlint: finds Entity Framework contexts shared across threads.

mod commands;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ctxlint", version, about = "Finds DbContext instances shared across threads")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze C# files and directories
    Check {
        /// Files or directories (searched for *.cs)
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(long, value_enum, default_value_t = Format::Human)]
        format: Format,
        /// Exit non-zero when any warning is reported
        #[arg(long)]
        deny_warnings: bool,
    },
    /// Print the token stream of a file
    Lex { file: PathBuf },
    /// Print the syntax tree of a file
    Parse { file: PathBuf },
    /// Print every resolved reference of a file
    Symbols { file: PathBuf },
    /// Describe a diagnostic code, or list all codes
    Explain { code: Option<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Human,
    Json,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CTXLINT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    output::init();
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Check {
            paths,
            format,
            deny_warnings,
        } => commands::check::cmd_check(&paths, format, deny_warnings),
        Commands::Lex { file } => commands::inspect::cmd_lex(&file),
        Commands::Parse { file } => commands::inspect::cmd_parse(&file),
        Commands::Symbols { file } => commands::inspect::cmd_symbols(&file),
        Commands::Explain { code } => commands::explain::cmd_explain(code.as_deref()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {}", output::error_label(), e);
            ExitCode::from(2)
        }
    }
}
