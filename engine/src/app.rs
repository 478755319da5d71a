//! Core application

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::cli::{self, CliConfig, Commands, OutputFormat};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME, DEFAULT_LOG_FILTER, ENV_LOG};
use crate::data::sql::SqlQuery;
use crate::filters::{FilterDefinition, FilterInput, FilterSource, QueryFilter, QueryParams, Scalar};
use crate::utils::file::expand_path;
use crate::utils::sql::is_safe_identifier;

pub struct CoreApp {
    pub config: AppConfig,
}

/// SQL statement with its bound parameters, in placeholder order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedQuery {
    pub sql: String,
    pub params: Vec<Scalar>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!(app = APP_NAME, "Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::init(&cli_config)?;
        app.execute(command)
    }

    fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        Ok(Self { config })
    }

    fn execute(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Render {
                definition,
                query,
                json,
                table,
                format,
            } => {
                let definition = self.load_definition(&definition)?;
                let input = match (query, json) {
                    (Some(query), _) => QueryParams::parse(&query).filters(),
                    (None, Some(json)) => {
                        FilterInput::from_json(&json).context("Failed to parse --json input")?
                    }
                    (None, None) => FilterInput::default(),
                };
                let rendered = self.render(&definition, &input, &table)?;
                println!("{}", Self::format_rendered(&rendered, format)?);
                Ok(())
            }
            Commands::Check { definition } => {
                let definition = self.load_definition(&definition)?;
                println!("{}", Self::describe(&definition));
                Ok(())
            }
        }
    }

    /// Load an entity definition, applying the configured truthy tokens
    pub fn load_definition(&self, path: &Path) -> Result<FilterDefinition> {
        let path = expand_path(&path.to_string_lossy());
        let definition = FilterDefinition::load(&path)
            .with_context(|| format!("Failed to load filter definition: {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            fields = definition.registry().len(),
            "Filter definition loaded"
        );
        Ok(definition.with_truthy_tokens(self.config.truthy()))
    }

    /// Apply filters and sorting from `source` to `SELECT * FROM table`
    pub fn render(
        &self,
        definition: &FilterDefinition,
        source: &impl FilterSource,
        table: &str,
    ) -> Result<RenderedQuery> {
        if !is_safe_identifier(table) {
            anyhow::bail!("Invalid table name: {}", table);
        }

        let query = QueryFilter::from_source(definition, source)
            .apply_filters_and_sorting(SqlQuery::new(self.config.dialect));

        let rendered = RenderedQuery {
            sql: query.to_sql(&format!("SELECT * FROM {}", table)),
            params: query.params().to_vec(),
        };
        tracing::debug!(
            dialect = %self.config.dialect,
            params = rendered.params.len(),
            "Query rendered"
        );
        Ok(rendered)
    }

    fn format_rendered(rendered: &RenderedQuery, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(rendered)?),
            OutputFormat::Text => {
                let mut out = rendered.sql.clone();
                for (idx, param) in rendered.params.iter().enumerate() {
                    out.push_str(&format!("\n  [{}] {}", idx + 1, serde_json::to_string(param)?));
                }
                Ok(out)
            }
        }
    }

    fn describe(definition: &FilterDefinition) -> String {
        let mut lines = vec![format!("{} field(s)", definition.registry().len())];
        for (name, spec) in definition.registry().iter() {
            let mut line = format!(
                "  {:<20} {:<12} {}",
                name,
                spec.field_type.as_str(),
                spec.column_or(name)
            );
            if let Some(columns) = spec.sort_columns() {
                line.push_str(&format!(" (sort: {})", columns.join(", ")));
            }
            lines.push(line);
        }
        if !definition.default_sort().is_empty() {
            let sort: Vec<String> = definition
                .default_sort()
                .iter()
                .map(|(field, direction)| format!("{} {}", field, direction))
                .collect();
            lines.push(format!("default sort: {}", sort.join(", ")));
        }
        if !definition.fast_search().is_empty() {
            lines.push(format!("fast search: {}", definition.fast_search().join(", ")));
        }
        lines.join("\n")
    }

    fn init_logging() {
        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }
}
