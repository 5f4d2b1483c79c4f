use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use pyfront_parser::error_fmt::format_syntax_error;
use pyfront_parser::{
    ParseError, ParseOptions, RenderError, dump, dump_stmt, parse_module_with,
    parse_while_statement, tokenize, unparse,
};
use thiserror::Error;
use tracing::{debug, info};

/// Parse Python-like source and print what the parser sees.
#[derive(Parser, Debug)]
#[command(name = "pyfront", version, about = "Python-like front end: tokens, AST dumps, unparsing")]
struct Cli {
    /// Log level for tracing output (overridden by RUST_LOG).
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum DumpFormat {
    /// Indented tree (default).
    #[default]
    Tree,
    /// The AST as JSON.
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a module and print its AST.
    Dump {
        /// Source file, or `-` for stdin.
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = DumpFormat::Tree)]
        format: DumpFormat,
        /// Deepest allowed nesting of expressions and blocks.
        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// Print the token stream, one token per line.
    Tokens {
        /// Source file, or `-` for stdin.
        input: PathBuf,
    },
    /// Parse a module and print it back as normalised source.
    Unparse {
        /// Source file, or `-` for stdin.
        input: PathBuf,
    },
    /// Parse a single while statement and print its AST.
    While {
        /// Source file, or `-` for stdin.
        input: PathBuf,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("error: cannot read `{path}`: {source}")]
    Io { path: String, source: io::Error },

    /// Already formatted with source context
    #[error("{0}")]
    Syntax(String),

    #[error("error: {0}")]
    Render(#[from] RenderError),

    #[error("error: cannot serialize AST: {0}")]
    Json(#[from] serde_json::Error),

    #[error("error: `{0}` does not start with a while statement")]
    NotAWhileStatement(String),
}

/// Source text plus the name used in diagnostics
struct Input {
    name: String,
    source: String,
}

fn read_input(path: &Path) -> Result<Input, CliError> {
    if path == Path::new("-") {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .map_err(|source| CliError::Io {
                path: "<stdin>".to_string(),
                source,
            })?;
        return Ok(Input {
            name: "<stdin>".to_string(),
            source,
        });
    }
    let name = path.display().to_string();
    let source = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: name.clone(),
        source,
    })?;
    Ok(Input { name, source })
}

fn syntax_error(input: &Input, err: &ParseError) -> CliError {
    let (line, column) = err.location();
    debug!(file = %input.name, line, column, %err, "parse failed");
    CliError::Syntax(format_syntax_error(&input.name, err, &input.source))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    match execute(cli.command) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprint!("{}", err);
            if !err.to_string().ends_with('\n') {
                eprintln!();
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Run one command and return what it prints on stdout
fn execute(command: Command) -> Result<String, CliError> {
    match command {
        Command::Dump {
            input,
            format,
            max_depth,
        } => {
            let input = read_input(&input)?;
            let mut options = ParseOptions::default();
            if let Some(max_depth) = max_depth {
                options.max_depth = max_depth;
            }
            let module = parse_module_with(&input.source, &options)
                .map_err(|err| syntax_error(&input, &err))?;
            info!(file = %input.name, statements = module.body.len(), "parsed");
            match format {
                DumpFormat::Tree => Ok(format!("{}\n", dump(&module)?)),
                DumpFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(&module)?)),
            }
        }
        Command::Tokens { input } => {
            let input = read_input(&input)?;
            let tokens = tokenize(&input.source)
                .map_err(|err| syntax_error(&input, &ParseError::from(err)))?;
            Ok(tokens.iter().map(|token| format!("{}\n", token)).collect())
        }
        Command::Unparse { input } => {
            let input = read_input(&input)?;
            let module = parse_module_with(&input.source, &ParseOptions::default())
                .map_err(|err| syntax_error(&input, &err))?;
            Ok(unparse(&module)?)
        }
        Command::While { input } => {
            let input = read_input(&input)?;
            match parse_while_statement(&input.source)
                .map_err(|err| syntax_error(&input, &err))?
            {
                Some(stmt) => Ok(format!("{}\n", dump_stmt(&stmt)?)),
                None => Err(CliError::NotAWhileStatement(input.name)),
            }
        }
    }
}
