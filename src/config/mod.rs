pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::time_domain::TimeDomain;
#[cfg(feature = "cli")]
use crate::core::mapping::Layout;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use toml_config::ImportConfig;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "dataset-importer")]
#[command(about = "Import a CSV dataset of variables x entities x time into the data backend")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// CSV/TSV file to import (overrides input.path)
    #[arg(short, long)]
    pub file: Option<String>,

    #[arg(long)]
    pub base_url: Option<String>,

    /// year, decade, quarter century, half century or century
    #[arg(long)]
    pub time_domain: Option<String>,

    #[arg(long, value_parser = ["wide", "long"])]
    pub layout: Option<String>,

    #[arg(long)]
    pub variable_name: Option<String>,

    #[arg(long)]
    pub dataset_name: Option<String>,

    /// Fail when an entity name is not in the server's canonical list
    #[arg(long)]
    pub strict_entities: bool,

    /// Map and validate only; write the mapped JSON instead of importing
    #[arg(long)]
    pub dry_run: bool,

    /// Output directory for --dry-run
    #[arg(long)]
    pub output: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub log_format: String,
}

#[cfg(feature = "cli")]
impl CliArgs {
    /// 載入 TOML 設定（若有），再套用命令列覆蓋
    pub fn load_config(&self) -> Result<ImportConfig> {
        let mut config = match &self.config {
            Some(path) => ImportConfig::from_file(path)?,
            None => ImportConfig::default(),
        };
        self.apply_overrides(&mut config)?;
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut ImportConfig) -> Result<()> {
        if let Some(file) = &self.file {
            config.input.path = file.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.server.base_url = base_url.clone();
        }
        if let Some(domain) = &self.time_domain {
            config.input.time_domain = domain.parse::<TimeDomain>()?;
        }
        if let Some(layout) = &self.layout {
            config.input.layout = if layout == "long" { Layout::Long } else { Layout::Wide };
        }
        if let Some(name) = &self.variable_name {
            config.input.variable_name = Some(name.clone());
        }
        if let Some(name) = &self.dataset_name {
            config.dataset.name = name.clone();
        }
        if self.strict_entities {
            config.validation.strict_entities = true;
        }
        if self.dry_run {
            config.output.dry_run = true;
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        Ok(())
    }
}
