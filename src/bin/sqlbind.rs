//! sqlbind: the command line front end
//!
//! Renders SQL templates with named placeholders into plain SQL.
//!
//! # Usage
//!
//! ```bash
//! # Render a template
//! sqlbind 'select * from t where id in :ids' -b 'ids=[1,2,3]'
//!
//! # Template from a file, bindings from JSON
//! sqlbind -f report.sql --bindings params.json
//!
//! # Show how a template is lexed
//! sqlbind tokens 'select :x -- comment'
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use sqlbind::substitute::Target;
use sqlbind::{Bindings, Config, Substituter, Value, encode};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlbind")]
#[command(version)]
#[command(about = "Expand named and array-valued placeholders into literal SQL", long_about = None)]
#[command(after_help = "EXAMPLES:
    sqlbind 'select * from t where id in :ids' -b 'ids=[1,2,3]'
    sqlbind 'select #:ids' -b 'ids=[1,2,3]'
    sqlbind -f report.sql --bindings params.json
    sqlbind placeholders -f report.sql
    sqlbind encode '[\"a\", 1, null]'")]
struct Cli {
    /// The SQL template (read from --file or stdin when omitted)
    template: Option<String>,

    /// Read the template from a file
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    /// Bind a value as NAME=VALUE; VALUE is parsed as JSON, else taken as a string
    #[arg(short, long = "bind", value_name = "NAME=VALUE", global = true)]
    bind: Vec<String>,

    /// JSON file holding an object of bindings
    #[arg(long, value_name = "FILE", global = true)]
    bindings: Option<PathBuf>,

    /// Configuration file
    #[arg(long, env = "SQLBIND_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the token stream of a template
    Tokens {
        /// The SQL template
        template: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// List the placeholders of a template and whether they are bound
    Placeholders {
        /// The SQL template
        template: Option<String>,
    },
    /// Encode a JSON value as a SQL literal
    Encode {
        /// The value, as JSON
        value: String,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = Config::discover(cli.config.as_deref()).context("failed to load configuration")?;
    init_logging(&config, cli.verbose);
    if !config.color {
        colored::control::set_override(false);
    }

    let substituter = Substituter::new()?;

    match &cli.command {
        Some(Commands::Tokens { template, format }) => {
            let sql = read_template(template.as_deref(), cli.file.as_deref())?;
            show_tokens(&substituter, &sql, format)
        }
        Some(Commands::Placeholders { template }) => {
            let sql = read_template(template.as_deref(), cli.file.as_deref())?;
            let bindings = collect_bindings(cli, &config)?;
            show_placeholders(&substituter, &sql, &bindings)
        }
        Some(Commands::Encode { value }) => {
            println!("{}", encode(&parse_value(value)?)?);
            Ok(())
        }
        None => {
            let sql = read_template(cli.template.as_deref(), cli.file.as_deref())?;
            let bindings = collect_bindings(cli, &config)?;
            let rendered = substituter.substitute(&sql, &bindings)?;
            print!("{}", rendered);
            if !rendered.ends_with('\n') {
                println!();
            }
            Ok(())
        }
    }
}

fn init_logging(config: &Config, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("sqlbind=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_template(template: Option<&str>, file: Option<&Path>) -> Result<String> {
    match (template, file) {
        (Some(_), Some(_)) => bail!("give either a template or --file, not both"),
        (Some(template), None) => Ok(template.to_string()),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("failed to read template {}", path.display())),
        (None, None) => {
            let mut template = String::new();
            io::stdin()
                .read_to_string(&mut template)
                .context("failed to read template from stdin")?;
            Ok(template)
        }
    }
}

/// Config bindings, then the --bindings file, then -b flags; later wins.
fn collect_bindings(cli: &Cli, config: &Config) -> Result<BTreeMap<String, Value>> {
    let mut bindings = config.bindings()?;

    if let Some(path) = &cli.bindings {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read bindings {}", path.display()))?;
        let json: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("{} is not valid JSON", path.display()))?;
        let serde_json::Value::Object(map) = json else {
            bail!("{} must contain a JSON object", path.display());
        };
        for (name, value) in map {
            let value = Value::try_from(value).with_context(|| format!("binding '{}'", name))?;
            bindings.insert(name, value);
        }
    }

    for arg in &cli.bind {
        let (name, value) = parse_binding(arg)?;
        bindings.insert(name, value);
    }

    tracing::debug!(count = bindings.len(), "collected bindings");
    Ok(bindings)
}

fn parse_binding(arg: &str) -> Result<(String, Value)> {
    let Some((name, raw)) = arg.split_once('=') else {
        bail!("binding '{}' must look like NAME=VALUE", arg);
    };
    if name.is_empty() {
        bail!("binding '{}' has an empty name", arg);
    }

    let value = parse_value(raw).with_context(|| format!("binding '{}'", name))?;
    Ok((name.to_string(), value))
}

/// JSON first so `3`, `[1, 2]` and `null` keep their type; anything that
/// isn't JSON is a plain string.
fn parse_value(raw: &str) -> Result<Value> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) => Ok(Value::try_from(json)?),
        Err(_) => Ok(Value::from(raw)),
    }
}

fn show_tokens(substituter: &Substituter, sql: &str, format: &OutputFormat) -> Result<()> {
    let tokens: Vec<_> = substituter.tokens(sql).collect();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&tokens)?);
        }
        OutputFormat::Text => {
            for token in &tokens {
                let span = format!("{}..{}", token.range.start, token.range.end);
                let kind = match token.kind {
                    Some(kind) => kind.name().cyan(),
                    None => "-".dimmed(),
                };
                println!("{:>10}  {:30} {}", span.dimmed(), kind, format!("{:?}", token.text).white());
            }
            println!();
            println!("{} token(s)", tokens.len().to_string().cyan());
        }
    }

    Ok(())
}

fn show_placeholders(
    substituter: &Substituter,
    sql: &str,
    bindings: &BTreeMap<String, Value>,
) -> Result<()> {
    let placeholders = substituter.placeholders(sql)?;
    if placeholders.is_empty() {
        println!("{}", "(no placeholders)".dimmed());
        return Ok(());
    }

    for p in &placeholders {
        let target = match p.target {
            Target::Value => "value",
            Target::Length => "length",
        };
        let status = if Bindings::get(bindings, p.name).is_some() {
            "bound".green()
        } else {
            "unbound".yellow()
        };
        println!(
            "{:>10}  {:20} {:8} {}",
            format!("{}..{}", p.range.start, p.range.end).dimmed(),
            p.name.white().bold(),
            target,
            status
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_binding_json() {
        let (name, value) = parse_binding("ids=[1, 2, 3]").unwrap();
        assert_eq!(name, "ids");
        assert_eq!(value, Value::from(vec![1, 2, 3]));

        let (_, value) = parse_binding("n=null").unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn test_parse_binding_plain_string() {
        let (name, value) = parse_binding("name=O'Brien").unwrap();
        assert_eq!(name, "name");
        assert_eq!(value, Value::from("O'Brien"));

        let (_, value) = parse_binding("expr=a=b").unwrap();
        assert_eq!(value, Value::from("a=b"));
    }

    #[test]
    fn test_parse_binding_errors() {
        assert!(parse_binding("no-equals").is_err());
        assert!(parse_binding("=1").is_err());
        assert!(parse_binding("flag=true").is_err());
    }
}
