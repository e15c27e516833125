//! CLI Tooling
//!
//! Offline inspection of an asset export (a JSON array of assets). Bindings
//! are derived with the same registry and grouping rules the live service uses.

use crate::asset::{Asset, AssetType, AttributeRef};
use crate::config::{ConfigLoader, TwinlinkConfig};
use crate::error::ApiError;
use crate::linking::LinkingEngine;
use crate::protocol::ProtocolSet;
use crate::registry::BindingRegistry;
use crate::store::{AssetQuery, AssetStore, MemoryAssetStore};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Twinlink CLI - agent links and protocol bindings of a digital twin
#[derive(Parser)]
#[command(name = "twinlink")]
#[command(about = "Inspect agent links and protocol bindings of a digital twin")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every protocol configuration with the attributes linked to it
    Bindings {
        /// JSON file holding an array of assets
        #[arg(long)]
        assets: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Report agent links and protocol configurations that cannot resolve
    Validate {
        /// JSON file holding an array of assets
        #[arg(long)]
        assets: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

/// Rendered command result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    /// False when the command found problems; the binary exits non-zero
    pub success: bool,
}

impl CommandOutput {
    fn ok(text: String) -> Self {
        Self {
            text,
            success: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(format: &str) -> Result<Self, ApiError> {
        match format {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(ApiError::ConfigError(format!(
                "Invalid output format: {} (must be 'text' or 'json')",
                other
            ))),
        }
    }
}

/// CLI context: resolved configuration shared by all commands
pub struct CliContext {
    config: TwinlinkConfig,
}

impl CliContext {
    pub fn new(config_path: Option<&Path>) -> Result<Self, ApiError> {
        let config = ConfigLoader::load(config_path)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TwinlinkConfig {
        &self.config
    }

    /// Apply `--log-*` flags over the loaded logging configuration
    pub fn apply_log_overrides(&mut self, cli: &Cli) {
        let logging = &mut self.config.logging;
        if let Some(level) = &cli.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &cli.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &cli.log_output {
            logging.output = output.clone();
        }
        if let Some(file) = &cli.log_file {
            logging.file = Some(file.clone());
        }
    }

    /// Execute a CLI command
    pub async fn execute(&self, command: &Commands) -> Result<CommandOutput, ApiError> {
        match command {
            Commands::Bindings { assets, format } => {
                let format = OutputFormat::parse(format)?;
                let store = Arc::new(MemoryAssetStore::load_from_file(assets)?);
                let rows = collect_bindings(store).await?;
                info!(configurations = rows.len(), "Listed protocol bindings");
                Ok(CommandOutput::ok(format_bindings(&rows, format)?))
            }
            Commands::Validate { assets, format } => {
                let format = OutputFormat::parse(format)?;
                let store = MemoryAssetStore::load_from_file(assets)?;
                let problems = collect_problems(&store.find_all(&AssetQuery::All).await?);
                info!(problems = problems.len(), "Validated agent links");
                Ok(CommandOutput {
                    text: format_problems(&problems, format)?,
                    success: problems.is_empty(),
                })
            }
        }
    }
}

/// One protocol configuration and the attributes bound to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct BindingRow {
    configuration: String,
    protocol: String,
    attributes: Vec<String>,
}

async fn collect_bindings(store: Arc<MemoryAssetStore>) -> Result<Vec<BindingRow>, ApiError> {
    let registry = Arc::new(BindingRegistry::new());
    for agent in store.find_all(&AssetQuery::OfType(AssetType::Agent)).await? {
        for configuration in agent.protocol_configurations() {
            registry.register(configuration);
        }
    }

    let assets = store.find_all(&AssetQuery::All).await?;
    let engine = LinkingEngine::new(Arc::clone(&registry), Arc::new(ProtocolSet::new()), store);
    let groups = engine.group_agent_linked_attributes(
        assets.iter().flat_map(Asset::agent_linked_attributes),
        |_| true,
    );

    Ok(registry
        .snapshot()
        .into_iter()
        .map(|configuration| {
            let attributes = groups
                .iter()
                .filter(|group| group.configuration.reference() == configuration.reference())
                .flat_map(|group| group.attributes.iter())
                .map(|attribute| attribute.reference().to_string())
                .collect();
            BindingRow {
                configuration: configuration.reference().to_string(),
                protocol: configuration.protocol_name().unwrap_or_default().to_string(),
                attributes,
            }
        })
        .collect())
}

fn format_bindings(rows: &[BindingRow], format: OutputFormat) -> Result<String, ApiError> {
    if format == OutputFormat::Json {
        return serde_json::to_string_pretty(rows).map_err(|e| ApiError::Io(e.to_string()));
    }
    if rows.is_empty() {
        return Ok("No protocol configurations found".to_string());
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Configuration", "Protocol", "Linked Attributes"]);
    for row in rows {
        let attributes = if row.attributes.is_empty() {
            "-".to_string()
        } else {
            row.attributes.join("\n")
        };
        table.add_row(vec![&row.configuration, &row.protocol, &attributes]);
    }
    Ok(table.to_string())
}

/// Something in the export that will not link at runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct Problem {
    asset: String,
    attribute: String,
    message: String,
}

fn collect_problems(assets: &[Asset]) -> Vec<Problem> {
    let configurations: Vec<AttributeRef> = assets
        .iter()
        .filter(|asset| asset.is_agent())
        .flat_map(Asset::protocol_configurations)
        .map(|configuration| configuration.reference().clone())
        .collect();

    let mut problems = Vec::new();
    for asset in assets {
        for attribute in &asset.attributes {
            let relevant = attribute.has_agent_link() || attribute.is_protocol_configuration();
            let mut report = |message: String| {
                debug!(asset = %asset.id, attribute = %attribute.name, %message, "Validation problem");
                problems.push(Problem {
                    asset: asset.id.to_string(),
                    attribute: attribute.name.clone(),
                    message,
                });
            };

            if relevant && asset.id.as_str().is_empty() {
                report(
                    ApiError::MissingReference {
                        attribute: attribute.name.clone(),
                    }
                    .to_string(),
                );
                continue;
            }

            if attribute.is_protocol_configuration() {
                if !asset.is_agent() {
                    report("Protocol configuration on a non-agent asset".to_string());
                } else if attribute.value_as_str().map_or(true, str::is_empty) {
                    report("Protocol configuration has an empty protocol name".to_string());
                }
            }

            if let Some(target) = attribute.agent_link() {
                if !configurations.contains(&target) {
                    let invalid = ApiError::InvalidAgentLink {
                        attribute: AttributeRef::new(asset.id.clone(), attribute.name.clone()),
                    };
                    report(format!("{} (no configuration {})", invalid, target));
                }
            }
        }
    }
    problems
}

fn format_problems(problems: &[Problem], format: OutputFormat) -> Result<String, ApiError> {
    if format == OutputFormat::Json {
        return serde_json::to_string_pretty(problems).map_err(|e| ApiError::Io(e.to_string()));
    }
    if problems.is_empty() {
        return Ok(format!("{}", "All agent links resolve".green()));
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Asset", "Attribute", "Problem"]);
    for problem in problems {
        table.add_row(vec![&problem.asset, &problem.attribute, &problem.message]);
    }
    Ok(format!(
        "{}\n{}",
        table,
        format!("{} problem(s) found", problems.len()).red()
    ))
}
