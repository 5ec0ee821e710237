//! Elexon BMRS (balancing market reporting) wind generation and demand.
//!
//! Generation is reported per fuel type for each 30 minute settlement period.
//! See https://developer.data.elexon.co.uk/ for the endpoint reference.

use crate::adapters::http::ApiClient;
use crate::config::toml_config::DemandMeasure;
use crate::core::SeriesSource;
use crate::domain::model::{Period, Sample};
use crate::utils::error::{CostError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Deserialize;

pub const WIND_FUEL_TYPE: &str = "WIND";
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerationPeriod {
    start_time: DateTime<Utc>,
    data: Vec<FuelReport>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FuelReport {
    fuel_type: String,
    generation: f64,
}

#[derive(Debug, Deserialize)]
struct DemandResponse {
    data: Vec<DemandRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DemandRecord {
    publish_time: DateTime<Utc>,
    #[serde(rename = "initialDemandOutturn")]
    indo: Option<f64>,
    #[serde(rename = "initialTransmissionSystemDemandOutturn")]
    itsdo: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuelSample {
    pub timestamp: DateTime<Utc>,
    pub fuel_type: String,
    pub generation_mw: f64,
}

#[derive(Debug, Clone)]
pub struct ElexonClient {
    api: ApiClient,
    base_url: String,
}

impl ElexonClient {
    pub fn new(api: ApiClient, base_url: impl Into<String>) -> Self {
        Self {
            api,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn generation_url(&self) -> String {
        format!("{}/generation/outturn/summary", self.base_url)
    }

    pub fn demand_url(&self) -> String {
        format!("{}/demand", self.base_url)
    }

    /// Generation for every fuel type over the period, in MW.
    pub async fn generation_outturn(&self, period: &Period) -> Result<Vec<FuelSample>> {
        let query = [
            ("startTime", period.start_time().format(ISO_FORMAT).to_string()),
            ("endTime", period.end_time().format(ISO_FORMAT).to_string()),
            ("format", "json".to_string()),
        ];
        let periods: Vec<GenerationPeriod> = self
            .api
            .get_json("elexon", &self.generation_url(), &query)
            .await?;

        let samples: Vec<FuelSample> = periods
            .into_iter()
            .flat_map(|period| {
                let timestamp = period.start_time;
                period.data.into_iter().map(move |report| FuelSample {
                    timestamp,
                    fuel_type: report.fuel_type,
                    generation_mw: report.generation,
                })
            })
            .collect();

        tracing::debug!("Elexon returned {} fuel samples", samples.len());
        Ok(samples)
    }

    /// Demand outturn, requested in windows of `page_days` days.
    pub async fn demand_outturn(
        &self,
        period: &Period,
        page_days: usize,
        measure: DemandMeasure,
    ) -> Result<Vec<Sample>> {
        let mut samples = Vec::new();

        for (window_start, window_end) in demand_windows(period, page_days) {
            let query = [
                (
                    "settlementDateFrom",
                    window_start.and_time(chrono::NaiveTime::MIN).format(ISO_FORMAT).to_string(),
                ),
                (
                    "settlementDateTo",
                    window_end.and_time(chrono::NaiveTime::MIN).format(ISO_FORMAT).to_string(),
                ),
                ("format", "json".to_string()),
            ];
            tracing::debug!("Fetching Elexon demand {} .. {}", window_start, window_end);

            let response: DemandResponse = self
                .api
                .get_json("elexon", &self.demand_url(), &query)
                .await?;

            samples.extend(response.data.into_iter().filter_map(|record| {
                let value = match measure {
                    DemandMeasure::Indo => record.indo,
                    DemandMeasure::Itsdo => record.itsdo,
                };
                value.map(|v| Sample::new(record.publish_time, v))
            }));
        }

        Ok(samples)
    }
}

/// 以 `page_days` 天為一頁切分期間，最後一頁截到期間結束日
pub fn demand_windows(period: &Period, page_days: usize) -> Vec<(NaiveDate, NaiveDate)> {
    // 頁長超出日期範圍時整段期間只有一頁
    let span = i64::try_from(page_days.max(1) - 1)
        .ok()
        .and_then(Duration::try_days);
    let mut windows = Vec::new();
    let mut window_start = period.start;

    while window_start <= period.end {
        let window_end = span
            .and_then(|span| window_start.checked_add_signed(span))
            .map_or(period.end, |end| end.min(period.end));
        windows.push((window_start, window_end));

        match window_end.succ_opt() {
            Some(next) if window_end < period.end => window_start = next,
            _ => break,
        }
    }

    windows
}

pub struct ElexonWind {
    client: ElexonClient,
}

impl ElexonWind {
    pub fn new(client: ElexonClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SeriesSource for ElexonWind {
    fn name(&self) -> &str {
        "wind_elexon"
    }

    async fn fetch(&self, period: &Period) -> Result<Vec<Sample>> {
        let fuels = self.client.generation_outturn(period).await?;
        let wind: Vec<Sample> = fuels
            .iter()
            .filter(|s| s.fuel_type == WIND_FUEL_TYPE)
            .map(|s| Sample::new(s.timestamp, s.generation_mw))
            .collect();

        if wind.is_empty() {
            let mut seen: Vec<&str> = fuels.iter().map(|s| s.fuel_type.as_str()).collect();
            seen.sort_unstable();
            seen.dedup();
            let seen = if seen.is_empty() {
                "none".to_string()
            } else {
                seen.join(", ")
            };
            return Err(CostError::ParseError {
                source_name: "elexon".to_string(),
                message: format!(
                    "no {} generation in response (fuel types: {})",
                    WIND_FUEL_TYPE, seen
                ),
            });
        }

        Ok(wind)
    }
}

pub struct ElexonDemand {
    client: ElexonClient,
    page_days: usize,
    measure: DemandMeasure,
    name: String,
}

impl ElexonDemand {
    pub fn new(client: ElexonClient, page_days: usize, measure: DemandMeasure) -> Self {
        Self {
            client,
            page_days,
            measure,
            name: format!("demand_elexon_{}", measure.as_str()),
        }
    }
}

#[async_trait]
impl SeriesSource for ElexonDemand {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, period: &Period) -> Result<Vec<Sample>> {
        self.client
            .demand_outturn(period, self.page_days, self.measure)
            .await
    }
}
