//! Sheffield Solar PV_Live national solar generation estimates.
//!
//! Rows come back as positional arrays; the field order must match
//! `EXTRA_FIELDS` plus the three default columns.

use crate::adapters::http::ApiClient;
use crate::core::SeriesSource;
use crate::domain::model::{Period, Sample};
use crate::utils::error::{CostError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

const EXTRA_FIELDS: [&str; 2] = ["capacity_mwp", "installedcapacity_mwp"];
const ROW_WIDTH: usize = 5;
/// GSP 0 is the national total.
const NATIONAL_GSP: u32 = 0;

#[derive(Debug, Deserialize)]
struct PvLiveResponse {
    data: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PvLiveRecord {
    pub gsp_id: i64,
    pub datetime_gmt: DateTime<Utc>,
    pub generation_mw: Option<f64>,
    pub capacity_mwp: Option<f64>,
    pub installedcapacity_mwp: Option<f64>,
}

impl PvLiveRecord {
    fn from_row(row: &[serde_json::Value]) -> Result<Self> {
        if row.len() != ROW_WIDTH {
            return Err(parse_error(format!(
                "wrong number of values in row, expected {}, got {}",
                ROW_WIDTH,
                row.len()
            )));
        }

        let gsp_id = row[0]
            .as_i64()
            .ok_or_else(|| parse_error(format!("invalid gsp_id {}", row[0])))?;
        let datetime_gmt = row[1]
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| parse_error(format!("invalid datetime_gmt {}", row[1])))?;

        Ok(Self {
            gsp_id,
            datetime_gmt,
            generation_mw: row[2].as_f64(),
            capacity_mwp: row[3].as_f64(),
            installedcapacity_mwp: row[4].as_f64(),
        })
    }
}

fn parse_error(message: String) -> CostError {
    CostError::ParseError {
        source_name: "sheffield".to_string(),
        message,
    }
}

pub struct SheffieldSolar {
    api: ApiClient,
    base_url: String,
}

impl SheffieldSolar {
    pub fn new(api: ApiClient, base_url: impl Into<String>) -> Self {
        Self {
            api,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self) -> String {
        format!("{}/gsp/{}", self.base_url, NATIONAL_GSP)
    }

    pub async fn records(&self, period: &Period) -> Result<Vec<PvLiveRecord>> {
        let query = [
            ("start", period.start_time().format("%Y-%m-%dT%H:%M:%S").to_string()),
            ("end", period.end_time().format("%Y-%m-%dT%H:%M:%S").to_string()),
            ("extra_fields", EXTRA_FIELDS.join(",")),
        ];
        let response: PvLiveResponse = self.api.get_json("sheffield", &self.url(), &query).await?;

        response
            .data
            .iter()
            .map(|row| PvLiveRecord::from_row(row))
            .collect()
    }
}

#[async_trait]
impl SeriesSource for SheffieldSolar {
    fn name(&self) -> &str {
        "solar_sheffield"
    }

    async fn fetch(&self, period: &Period) -> Result<Vec<Sample>> {
        let records = self.records(period).await?;
        let total = records.len();

        let samples: Vec<Sample> = records
            .into_iter()
            .filter_map(|r| r.generation_mw.map(|mw| Sample::new(r.datetime_gmt, mw)))
            .collect();

        if samples.len() < total {
            tracing::debug!(
                "Skipped {} PV_Live rows without generation",
                total - samples.len()
            );
        }
        Ok(samples)
    }
}
