use crate::adapters::{
    ApiClient, DiskCache, ElexonClient, ElexonDemand, ElexonWind, LocalStorage, NationalGridWind,
    SheffieldSolar,
};
use crate::config::toml_config::{AssumptionsConfig, TomlConfig, WindSource};
use crate::core::report::{chart_rows, render_report, to_csv};
use crate::core::resample::{daily_mean, join_daily};
use crate::core::{costs, profile};
use crate::core::{Pipeline, SeriesSource, Storage};
use crate::domain::model::{CostAnalysis, CostData, Period, SourceData, Summary};
use crate::utils::error::Result;
use serde::Serialize;
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const PROFILES_FILE: &str = "profiles.csv";
pub const CHART_FILE: &str = "chart.csv";
pub const COSTS_FILE: &str = "costs.json";
pub const REPORT_FILE: &str = "report.txt";

/// The three datasets the analysis needs.
pub struct Sources {
    pub wind: Box<dyn SeriesSource>,
    pub solar: Box<dyn SeriesSource>,
    pub demand: Box<dyn SeriesSource>,
}

impl Sources {
    /// 依設定建立資料來源，共用同一個 HTTP 客戶端
    pub fn from_config(config: &TomlConfig) -> Result<Self> {
        let api = ApiClient::from_config(&config.sources)?;
        let elexon = ElexonClient::new(api.clone(), config.sources.elexon_base_url.clone());

        let wind: Box<dyn SeriesSource> = match config.sources.wind {
            WindSource::Elexon => Box::new(ElexonWind::new(elexon.clone())),
            WindSource::NationalGrid => Box::new(NationalGridWind::new(
                api.clone(),
                config.sources.national_grid_url.clone(),
                config.sources.national_grid_resource_id.clone(),
            )),
        };

        Ok(Self {
            wind,
            solar: Box::new(SheffieldSolar::new(
                api,
                config.sources.sheffield_base_url.clone(),
            )),
            demand: Box::new(ElexonDemand::new(
                elexon,
                config.sources.demand_page_days,
                config.sources.demand_measure,
            )),
        })
    }
}

#[derive(Serialize)]
struct CostRecord<'a> {
    analysis: &'a str,
    period: Period,
    wind_source: WindSource,
    assumptions: &'a AssumptionsConfig,
    summary: &'a Summary,
    costs: &'a CostData,
}

pub struct CostPipeline<S: Storage> {
    output: S,
    cache: DiskCache<S>,
    config: TomlConfig,
    sources: Sources,
}

impl<S: Storage> CostPipeline<S> {
    pub fn new(output: S, cache: DiskCache<S>, config: TomlConfig, sources: Sources) -> Self {
        Self {
            output,
            cache,
            config,
            sources,
        }
    }

    pub fn config(&self) -> &TomlConfig {
        &self.config
    }

    fn bundle(&self, files: &[(&str, Vec<u8>)]) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, data) in files {
            zip.start_file(*name, SimpleFileOptions::default())?;
            zip.write_all(data)?;
        }
        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

impl CostPipeline<LocalStorage> {
    /// 使用本機目錄作為快取與輸出
    pub fn from_config(config: TomlConfig) -> Result<Self> {
        let sources = Sources::from_config(&config)?;
        let output = LocalStorage::new(config.load.output_path.clone());
        let cache = DiskCache::new(
            LocalStorage::new(config.cache.directory.clone()),
            config.cache.mode,
        );
        Ok(Self::new(output, cache, config, sources))
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for CostPipeline<S> {
    async fn extract(&self) -> Result<SourceData> {
        let period = self.config.period();
        tracing::info!(
            "🚀 Extracting wind, solar and demand for {} .. {}",
            period.start,
            period.end
        );

        let (wind, solar, demand) = tokio::try_join!(
            self.cache.load_or_fetch(self.sources.wind.as_ref(), &period),
            self.cache.load_or_fetch(self.sources.solar.as_ref(), &period),
            self.cache.load_or_fetch(self.sources.demand.as_ref(), &period),
        )?;

        Ok(SourceData {
            wind,
            solar,
            demand,
        })
    }

    async fn transform(&self, data: SourceData) -> Result<CostAnalysis> {
        let rows = join_daily(
            &daily_mean(&data.wind),
            &daily_mean(&data.solar),
            &daily_mean(&data.demand),
        );
        tracing::debug!("Joined {} days of data", rows.len());

        let profiles = profile::compute_profiles(&rows)?;
        let assumptions = &self.config.assumptions;
        let cost_data = costs::compute_costs(
            &profiles,
            &assumptions.wind,
            &assumptions.solar,
            assumptions.battery_cost_kwh,
        )?;
        let summary = costs::summarise(&profiles)?;

        Ok(CostAnalysis {
            profiles,
            costs: cost_data,
            summary,
        })
    }

    async fn load(&self, analysis: &CostAnalysis) -> Result<String> {
        let record = CostRecord {
            analysis: &self.config.analysis.name,
            period: self.config.period(),
            wind_source: self.config.sources.wind,
            assumptions: &self.config.assumptions,
            summary: &analysis.summary,
            costs: &analysis.costs,
        };

        let files = vec![
            (PROFILES_FILE, to_csv(&analysis.profiles)?),
            (
                CHART_FILE,
                to_csv(&chart_rows(&analysis.profiles, self.config.load.smoothing_span))?,
            ),
            (COSTS_FILE, serde_json::to_vec_pretty(&record)?),
            (
                REPORT_FILE,
                render_report(&analysis.summary, &analysis.costs).into_bytes(),
            ),
        ];

        let output_path = self.config.output_path().trim_end_matches('/');
        if self.config.load.compression {
            let archive_name = &self.config.load.archive_name;
            tracing::debug!("Creating ZIP file with {} files", files.len());
            let zip_data = self.bundle(&files)?;
            tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
            self.output.write_file(archive_name, &zip_data).await?;
            return Ok(format!("{}/{}", output_path, archive_name));
        }

        for (name, data) in &files {
            tracing::debug!("Writing {} ({} bytes)", name, data.len());
            self.output.write_file(name, data).await?;
        }
        Ok(output_path.to_string())
    }
}
