use crate::config::toml_config::{CacheMode, TomlConfig, WindSource};
use crate::utils::error::Result;
use chrono::NaiveDate;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "renewable-cost")]
#[command(
    about = "Estimate the generation and battery storage cost of meeting UK demand with wind and solar"
)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// First day of the analysis period (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last day of the analysis period (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    #[arg(long, value_enum)]
    pub wind_source: Option<WindSource>,

    #[arg(long, value_enum)]
    pub cache_mode: Option<CacheMode>,

    #[arg(long)]
    pub cache_dir: Option<String>,

    #[arg(long)]
    pub output_path: Option<String>,

    /// Bundle all outputs into a single zip archive
    #[arg(long)]
    pub compress: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    pub monitor: Option<bool>,

    /// Show the requests that would be made without fetching anything
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// 載入設定檔（若有）並套用命令列覆蓋
    pub fn load_config(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut TomlConfig) {
        if let Some(start) = self.start {
            config.analysis.start = start;
        }
        if let Some(end) = self.end {
            config.analysis.end = end;
        }
        if let Some(wind) = self.wind_source {
            config.sources.wind = wind;
        }
        if let Some(mode) = self.cache_mode {
            config.cache.mode = mode;
        }
        if let Some(dir) = &self.cache_dir {
            config.cache.directory = dir.clone();
        }
        if let Some(path) = &self.output_path {
            config.load.output_path = path.clone();
        }
        if self.compress {
            config.load.compression = true;
        }
        if let Some(enabled) = self.monitor {
            config.monitoring.get_or_insert_with(Default::default).enabled = enabled;
        }
    }
}
