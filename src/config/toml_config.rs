use crate::domain::model::{LcoeParams, Period};
use crate::utils::error::{CostError, Result};
use crate::utils::validation::{self, Validate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ELEXON_BASE_URL: &str = "https://data.elexon.co.uk/bmrs/api/v1";
pub const SHEFFIELD_BASE_URL: &str = "https://api0.solar.sheffield.ac.uk/pvlive/api/v4";
pub const NATIONAL_GRID_URL: &str =
    "https://api.nationalgrideso.com/api/3/action/datastore_search_sql";
pub const NATIONAL_GRID_WIND_RESOURCE: &str = "f732e9bb-b573-46a7-8767-3affbbb29b45";
pub const MAX_DEMAND_PAGE_DAYS: usize = 366;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub analysis: AnalysisConfig,
    pub sources: SourcesConfig,
    pub cache: CacheConfig,
    pub assumptions: AssumptionsConfig,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            name: "uk-2022".to_string(),
            start: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2022, 12, 31).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum WindSource {
    Elexon,
    NationalGrid,
}

/// Elexon 需求量欄位：INDO 或 ITSDO
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandMeasure {
    Indo,
    Itsdo,
}

impl DemandMeasure {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemandMeasure::Indo => "indo",
            DemandMeasure::Itsdo => "itsdo",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub wind: WindSource,
    pub demand_measure: DemandMeasure,
    pub elexon_base_url: String,
    pub sheffield_base_url: String,
    pub national_grid_url: String,
    pub national_grid_resource_id: String,
    pub demand_page_days: usize,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub retry_delay_seconds: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            wind: WindSource::Elexon,
            demand_measure: DemandMeasure::Indo,
            elexon_base_url: ELEXON_BASE_URL.to_string(),
            sheffield_base_url: SHEFFIELD_BASE_URL.to_string(),
            national_grid_url: NATIONAL_GRID_URL.to_string(),
            national_grid_resource_id: NATIONAL_GRID_WIND_RESOURCE.to_string(),
            demand_page_days: 28,
            timeout_seconds: 120,
            retry_attempts: 3,
            retry_delay_seconds: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    /// Always fetch and overwrite the cache.
    Refresh,
    /// Use cached data when present, otherwise fetch and store it.
    Prefer,
    /// Never touch the network.
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub mode: CacheMode,
    pub directory: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            mode: CacheMode::Prefer,
            directory: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssumptionsConfig {
    pub battery_cost_kwh: f64,
    pub wind: LcoeParams,
    pub solar: LcoeParams,
}

impl Default for AssumptionsConfig {
    fn default() -> Self {
        Self {
            battery_cost_kwh: 200.0,
            wind: LcoeParams {
                periods_years: 20,
                discount_rate: 0.03,
                capital_cost_kw: 1500.0,
                capacity_factor: 0.25,
                fixed_om_cost_kw_yr: 25.0,
            },
            solar: LcoeParams {
                periods_years: 20,
                discount_rate: 0.03,
                capital_cost_kw: 1000.0,
                capacity_factor: 0.25,
                fixed_om_cost_kw_yr: 25.0,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub output_path: String,
    pub smoothing_span: usize,
    pub compression: bool,
    pub archive_name: String,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
            smoothing_span: 30,
            compression: false,
            archive_name: "renewable_cost_output.zip".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CostError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CostError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ELEXON_BASE_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| CostError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn period(&self) -> Period {
        Period::new(self.analysis.start, self.analysis.end)
    }

    pub fn output_path(&self) -> &str {
        &self.load.output_path
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("analysis.name", &self.analysis.name)?;
        if self.analysis.start >= self.analysis.end {
            return Err(CostError::InvalidConfigValueError {
                field: "analysis.end".to_string(),
                value: self.analysis.end.to_string(),
                reason: format!("End must be after start ({})", self.analysis.start),
            });
        }

        validation::validate_url("sources.elexon_base_url", &self.sources.elexon_base_url)?;
        validation::validate_url("sources.sheffield_base_url", &self.sources.sheffield_base_url)?;
        if self.sources.wind == WindSource::NationalGrid {
            validation::validate_url("sources.national_grid_url", &self.sources.national_grid_url)?;
            validation::validate_non_empty_string(
                "sources.national_grid_resource_id",
                &self.sources.national_grid_resource_id,
            )?;
        }
        validation::validate_range(
            "sources.demand_page_days",
            self.sources.demand_page_days,
            1,
            MAX_DEMAND_PAGE_DAYS,
        )?;
        validation::validate_range("sources.retry_attempts", self.sources.retry_attempts, 1, 10)?;
        validation::validate_range("sources.timeout_seconds", self.sources.timeout_seconds, 1, 3600)?;

        validation::validate_path("cache.directory", &self.cache.directory)?;
        validation::validate_path("load.output_path", &self.load.output_path)?;
        validation::validate_non_empty_string("load.archive_name", &self.load.archive_name)?;
        validation::validate_positive_number("load.smoothing_span", self.load.smoothing_span, 1)?;

        validation::validate_non_negative(
            "assumptions.battery_cost_kwh",
            self.assumptions.battery_cost_kwh,
        )?;
        validate_lcoe_params("assumptions.wind", &self.assumptions.wind)?;
        validate_lcoe_params("assumptions.solar", &self.assumptions.solar)?;

        Ok(())
    }
}

fn validate_lcoe_params(prefix: &str, params: &LcoeParams) -> Result<()> {
    validation::validate_range(
        &format!("{}.periods_years", prefix),
        params.periods_years,
        1,
        100,
    )?;
    validation::validate_range(
        &format!("{}.discount_rate", prefix),
        params.discount_rate,
        0.0,
        1.0,
    )?;
    validation::validate_range(
        &format!("{}.capacity_factor", prefix),
        params.capacity_factor,
        0.0,
        1.0,
    )?;
    if params.capacity_factor == 0.0 {
        return Err(CostError::InvalidConfigValueError {
            field: format!("{}.capacity_factor", prefix),
            value: params.capacity_factor.to_string(),
            reason: "A plant that never generates has no levelised cost".to_string(),
        });
    }
    validation::validate_non_negative(&format!("{}.capital_cost_kw", prefix), params.capital_cost_kw)?;
    validation::validate_non_negative(
        &format!("{}.fixed_om_cost_kw_yr", prefix),
        params.fixed_om_cost_kw_yr,
    )?;
    Ok(())
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_reference_scenario() {
        let config = TomlConfig::default();

        assert_eq!(config.analysis.start, NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
        assert_eq!(config.analysis.end, NaiveDate::from_ymd_opt(2022, 12, 31).unwrap());
        assert_eq!(config.sources.wind, WindSource::Elexon);
        assert_eq!(config.sources.demand_page_days, 28);
        assert_eq!(config.assumptions.wind.capital_cost_kw, 1500.0);
        assert_eq!(config.assumptions.solar.capital_cost_kw, 1000.0);
        assert_eq!(config.assumptions.battery_cost_kwh, 200.0);
        assert_eq!(config.load.smoothing_span, 30);
        assert!(!config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml_config() {
        let toml_content = r#"
[analysis]
name = "winter"
start = "2022-11-01"
end = "2023-02-28"

[sources]
wind = "national_grid"
demand_measure = "itsdo"

[cache]
mode = "offline"

[assumptions]
battery_cost_kwh = 150.0

[monitoring]
enabled = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.analysis.name, "winter");
        assert_eq!(config.period().days(), 119);
        assert_eq!(config.sources.wind, WindSource::NationalGrid);
        assert_eq!(config.sources.demand_measure, DemandMeasure::Itsdo);
        assert_eq!(config.sources.elexon_base_url, ELEXON_BASE_URL);
        assert_eq!(config.cache.mode, CacheMode::Offline);
        assert_eq!(config.assumptions.battery_cost_kwh, 150.0);
        // 未指定的技術參數保留預設值
        assert_eq!(config.assumptions.wind.periods_years, 20);
        assert!(config.monitoring_enabled());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("RC_TEST_ELEXON_URL", "http://localhost:9999/bmrs");

        let toml_content = r#"
[sources]
elexon_base_url = "${RC_TEST_ELEXON_URL}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.sources.elexon_base_url, "http://localhost:9999/bmrs");

        std::env::remove_var("RC_TEST_ELEXON_URL");
    }

    #[test]
    fn test_config_validation_rejects_bad_values() {
        let reversed = r#"
[analysis]
start = "2022-12-31"
end = "2022-01-01"
"#;
        assert!(TomlConfig::from_toml_str(reversed).unwrap().validate().is_err());

        let bad_url = r#"
[sources]
sheffield_base_url = "invalid-url"
"#;
        assert!(TomlConfig::from_toml_str(bad_url).unwrap().validate().is_err());

        let bad_rate = r#"
[assumptions.solar]
periods_years = 20
discount_rate = 1.5
capital_cost_kw = 1000.0
capacity_factor = 0.25
fixed_om_cost_kw_yr = 25.0
"#;
        let err = TomlConfig::from_toml_str(bad_rate).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("assumptions.solar.discount_rate"));

        let zero_cf = r#"
[assumptions.wind]
periods_years = 20
discount_rate = 0.03
capital_cost_kw = 1500.0
capacity_factor = 0.0
fixed_om_cost_kw_yr = 25.0
"#;
        assert!(TomlConfig::from_toml_str(zero_cf).unwrap().validate().is_err());
    }

    #[test]
    fn test_demand_page_days_is_bounded() {
        let huge = r#"
[sources]
demand_page_days = 1000000000
"#;
        let err = TomlConfig::from_toml_str(huge).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("sources.demand_page_days"));

        let year = r#"
[sources]
demand_page_days = 366
"#;
        assert!(TomlConfig::from_toml_str(year).unwrap().validate().is_ok());
    }

    #[test]
    fn test_unknown_enum_value_is_a_parse_error() {
        let content = r#"
[cache]
mode = "sometimes"
"#;
        assert!(matches!(
            TomlConfig::from_toml_str(content),
            Err(CostError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[analysis]
name = "file-test"

[load]
output_path = "./out"
compression = true
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.analysis.name, "file-test");
        assert_eq!(config.output_path(), "./out");
        assert!(config.load.compression);
    }
}
