//! National Grid ESO open data: half-hourly wind outturn via the CKAN
//! datastore SQL endpoint. The dataset has no records before 2022-04-01.

use crate::adapters::http::ApiClient;
use crate::core::SeriesSource;
use crate::domain::model::{Period, Sample};
use crate::utils::error::{CostError, Result};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Deserializer};

#[derive(Debug, Deserialize)]
struct DatastoreResponse {
    result: DatastoreResult,
}

#[derive(Debug, Deserialize)]
struct DatastoreResult {
    records: Vec<WindRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindRecord {
    #[serde(rename = "England/Wales Wind Output", deserialize_with = "flexible_f64")]
    pub england_wales: f64,
    #[serde(rename = "Scottish Wind Output", deserialize_with = "flexible_f64")]
    pub scotland: f64,
    #[serde(rename = "Total", deserialize_with = "flexible_f64")]
    pub total: f64,
    #[serde(rename = "Sett_Date", deserialize_with = "settlement_date")]
    pub date: NaiveDate,
    #[serde(rename = "Sett_Period", deserialize_with = "flexible_f64")]
    pub period: f64,
}

impl WindRecord {
    /// 結算時段 1 從當日 00:00 開始，每段 30 分鐘
    pub fn sample(&self) -> Sample {
        let offset = Duration::minutes(((self.period.max(1.0) as i64) - 1) * 30);
        let timestamp = (self.date.and_time(chrono::NaiveTime::MIN) + offset).and_utc();
        Sample::new(timestamp, self.total)
    }
}

// CKAN 的數值欄位有時以字串回傳
fn flexible_f64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("number out of range")),
        serde_json::Value::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
        other => Err(serde::de::Error::custom(format!("expected number, got {}", other))),
    }
}

fn settlement_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    let date_part = raw.get(..10).unwrap_or(&raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(serde::de::Error::custom)
}

pub struct NationalGridWind {
    api: ApiClient,
    url: String,
    resource_id: String,
}

impl NationalGridWind {
    pub const FIRST_AVAILABLE: (i32, u32, u32) = (2022, 4, 1);

    pub fn new(api: ApiClient, url: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            api,
            url: url.into(),
            resource_id: resource_id.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn sql_query(&self, period: &Period) -> String {
        let start = period.start_time().format("%Y-%m-%dT%H:%M:%S.000Z");
        let end = period.end_time().format("%Y-%m-%dT%H:%M:%S.000Z");
        format!(
            "SELECT COUNT(*) OVER () AS _count, * FROM \"{}\" WHERE \"Sett_Date\" >= '{}' AND \"Sett_Date\" < '{}' ORDER BY \"_id\" ASC",
            self.resource_id, start, end
        )
    }

    pub async fn records(&self, period: &Period) -> Result<Vec<WindRecord>> {
        let query = [("sql", self.sql_query(period))];
        let response: DatastoreResponse = self
            .api
            .get_json("national_grid", &self.url, &query)
            .await?;
        Ok(response.result.records)
    }
}

#[async_trait]
impl SeriesSource for NationalGridWind {
    fn name(&self) -> &str {
        "wind_national_grid"
    }

    async fn fetch(&self, period: &Period) -> Result<Vec<Sample>> {
        let (y, m, d) = Self::FIRST_AVAILABLE;
        if let Some(first) = NaiveDate::from_ymd_opt(y, m, d) {
            if period.start < first {
                tracing::warn!(
                    "⚠️ National Grid ESO wind data starts at {}; earlier days will be missing",
                    first
                );
            }
        }

        let records = self.records(period).await?;
        if records.is_empty() {
            return Err(CostError::ParseError {
                source_name: "national_grid".to_string(),
                message: format!("no wind records for {} .. {}", period.start, period.end),
            });
        }
        tracing::debug!("National Grid returned {} wind records", records.len());

        Ok(records.iter().map(WindRecord::sample).collect())
    }
}
