use clap::{Parser, Subcommand, ValueEnum};

use std::path::PathBuf;

use super::constants::{DEFAULT_TABLE, ENV_CONFIG, ENV_DIALECT, ENV_TRUTHY_TOKENS};
use crate::data::sql::Backend;

#[derive(Parser)]
#[command(name = "querysift")]
#[command(
    version,
    about = "Translate request filters into parameterised SQL",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// SQL dialect (postgres, sqlite, duckdb or clickhouse)
    #[arg(long, short = 'd', global = true, env = ENV_DIALECT, value_parser = parse_backend)]
    pub dialect: Option<Backend>,

    /// Tokens accepted as boolean true (comma-separated)
    #[arg(long, global = true, env = ENV_TRUTHY_TOKENS, value_delimiter = ',')]
    pub truthy: Option<Vec<String>>,
}

/// Parse SQL dialect from CLI/env string
fn parse_backend(s: &str) -> Result<Backend, String> {
    s.parse::<Backend>().map_err(|_| {
        format!(
            "Invalid dialect '{}'. Valid options: postgres, sqlite, duckdb, clickhouse",
            s
        )
    })
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Render filters and sorting for an entity as SQL
    Render {
        /// Entity filter definition (JSON)
        #[arg(long, short = 'D')]
        definition: PathBuf,

        /// Request query string, e.g. 'filters[status]=active&sortBy[]=name'
        #[arg(long, short = 'q', conflicts_with = "json")]
        query: Option<String>,

        /// Programmatic filter input as JSON ({"filters": ..., "sortBy": ..., "sortDesc": ...})
        #[arg(long, short = 'j')]
        json: Option<String>,

        /// Table the base SELECT reads from
        #[arg(long, short = 't', default_value = DEFAULT_TABLE)]
        table: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Validate an entity filter definition and list its fields
    Check {
        /// Entity filter definition (JSON)
        #[arg(long, short = 'D')]
        definition: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// SQL followed by one numbered line per parameter
    #[default]
    Text,
    /// `{"sql": ..., "params": [...]}`
    Json,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub dialect: Option<Backend>,
    pub truthy: Option<Vec<String>>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        dialect: cli.dialect,
        truthy: cli.truthy,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_render_command() {
        let cli = Cli::try_parse_from([
            "querysift",
            "--dialect",
            "sqlite",
            "render",
            "-D",
            "users.json",
            "--query",
            "filters[name]=bob",
        ])
        .unwrap();

        assert_eq!(cli.dialect, Some(Backend::Sqlite));
        match cli.command {
            Commands::Render {
                definition,
                query,
                json,
                table,
                format,
            } => {
                assert_eq!(definition, PathBuf::from("users.json"));
                assert_eq!(query.as_deref(), Some("filters[name]=bob"));
                assert!(json.is_none());
                assert_eq!(table, DEFAULT_TABLE);
                assert_eq!(format, OutputFormat::Text);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_truthy_tokens_are_comma_separated() {
        let cli = Cli::try_parse_from([
            "querysift",
            "check",
            "-D",
            "users.json",
            "--truthy",
            "yes,Y,1",
        ])
        .unwrap();
        assert_eq!(
            cli.truthy,
            Some(vec!["yes".to_string(), "Y".to_string(), "1".to_string()])
        );
    }

    #[test]
    fn test_invalid_dialect_is_rejected() {
        let result = Cli::try_parse_from(["querysift", "--dialect", "oracle", "check", "-D", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_query_and_json_conflict() {
        let result = Cli::try_parse_from([
            "querysift", "render", "-D", "x.json", "-q", "a=1", "-j", "{}",
        ]);
        assert!(result.is_err());
    }
}
