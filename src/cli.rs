use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value as JsonValue;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::{EngineConfig, MissingVariablePolicy};
use crate::executor::{join_variable_id, FunctionRegistry, Resolver, Value};
use crate::parser::{find_referenced_variables, ExpressionParser};

#[derive(Parser)]
#[command(name = "surface-expr")]
#[command(about = "Parse, inspect and evaluate control-surface expressions", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the normalized syntax tree as JSON
    Parse {
        /// Expression source
        expression: String,
    },

    /// List referenced variables, in order of appearance
    Refs {
        /// Expression source
        expression: String,
    },

    /// Evaluate an expression and print the result as JSON
    Eval {
        /// Expression source
        expression: String,

        /// Variables file (.json or .toml)
        #[arg(short = 'v', long = "variables")]
        variables: Option<PathBuf>,

        /// Fail when a referenced variable has no value
        #[arg(long)]
        strict: bool,
    },
}

/// Run the CLI by parsing process arguments
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli)
}

/// Run the CLI with provided arguments
pub fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli)
}

fn run_cli_with_args(cli: Cli) -> Result<()> {
    let config = EngineConfig::builder().config_path(cli.config.clone()).build()?;
    init_tracing(&config.log_level);

    let output = execute(&cli.command, &config)?;
    println!("{}", output);
    Ok(())
}

/// Install a stderr subscriber; `RUST_LOG` wins over the configured level
///
/// Does nothing if the host already installed a global subscriber.
pub fn init_tracing(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run one command and return what it prints
pub fn execute(command: &Commands, config: &EngineConfig) -> Result<String> {
    let parser = ExpressionParser::new();

    match command {
        Commands::Parse { expression } => {
            let node = parser.parse(expression)?;
            Ok(serde_json::to_string_pretty(&node)?)
        }

        Commands::Refs { expression } => {
            let node = parser.parse(expression)?;
            Ok(find_referenced_variables(&node).join("\n"))
        }

        Commands::Eval {
            expression,
            variables,
            strict,
        } => {
            let node = parser.parse(expression)?;
            let variables = match variables {
                Some(path) => load_variables(path)?,
                None => HashMap::new(),
            };
            let functions = if config.stdlib {
                FunctionRegistry::with_stdlib()
            } else {
                FunctionRegistry::new()
            };

            let mut resolver = Resolver::new(&variables, &functions).with_config(config);
            if *strict {
                resolver = resolver.with_missing_variable_policy(MissingVariablePolicy::Error);
            }
            let resolution = resolver.evaluate(&node)?;
            debug!(variables = ?resolution.variable_ids, "variables read");

            Ok(match resolution.value {
                Value::Undefined => "undefined".to_string(),
                value => serde_json::to_string_pretty(&value)?,
            })
        }
    }
}

/// Load a variables file (`.toml`, anything else is read as JSON)
///
/// Top-level keys containing `:` are full variable ids. Other keys holding
/// a table are labels whose entries are the variables of that label; the
/// remaining keys are unlabelled variables.
pub fn load_variables(path: &Path) -> Result<HashMap<String, Value>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read variables file {}", path.display()))?;

    let document: JsonValue = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&text)
            .with_context(|| format!("Invalid TOML in {}", path.display()))?,
        _ => serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?,
    };

    flatten_variables(document)
}

fn flatten_variables(document: JsonValue) -> Result<HashMap<String, Value>> {
    let JsonValue::Object(entries) = document else {
        bail!("Variables file must contain a table of variables");
    };

    let mut variables = HashMap::new();
    for (key, value) in entries {
        match value {
            JsonValue::Object(table) if !key.contains(':') => {
                for (name, value) in table {
                    variables.insert(join_variable_id(&key, &name), Value::from(value));
                }
            }
            value => {
                variables.insert(key, Value::from(value));
            }
        }
    }
    Ok(variables)
}
