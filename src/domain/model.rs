use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 分析期間，請求時使用兩端日期的午夜時間
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.start.and_time(chrono::NaiveTime::MIN)
    }

    pub fn end_time(&self) -> NaiveDateTime {
        self.end.and_time(chrono::NaiveTime::MIN)
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// 單一半小時資料點 (MW)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

pub type DailySeries = BTreeMap<NaiveDate, f64>;

#[derive(Debug, Clone, Default)]
pub struct SourceData {
    pub wind: Vec<Sample>,
    pub solar: Vec<Sample>,
    pub demand: Vec<Sample>,
}

/// One joined day before any scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyInput {
    pub date: NaiveDate,
    pub wind_mw: f64,
    pub solar_mw: f64,
    pub demand_mw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyProfile {
    pub date: NaiveDate,
    pub demand_mw: f64,
    pub wind_mw: f64,
    pub solar_mw: f64,
    pub supply_mw: f64,
    pub supply_mult_mw: f64,
    pub delta_mw: f64,
    pub surplus_mw: Option<f64>,
    pub deficit_mw: Option<f64>,
    pub storage_balance_gwh: f64,
}

/// Levelised cost inputs for one generation technology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LcoeParams {
    pub periods_years: u32,
    pub discount_rate: f64,
    /// 每 kW 裝置容量的總資本成本 (£)
    pub capital_cost_kw: f64,
    /// 機組實際發電的時間比例
    pub capacity_factor: f64,
    pub fixed_om_cost_kw_yr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostData {
    /// Wind generation required to meet demand.
    pub wind_mw: f64,
    pub solar_mw: f64,
    pub lcoe_wind_mwh: f64,
    pub lcoe_solar_mwh: f64,
    pub wind_cost: f64,
    pub solar_cost: f64,
    /// Cost of batteries sized to the peak storage balance.
    pub storage_cost: f64,
    pub max_storage_gwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub days: usize,
    pub mean_demand_mw: f64,
    pub mean_supply_mw: f64,
    pub mean_wind_mw: f64,
    pub mean_solar_mw: f64,
}

#[derive(Debug, Clone)]
pub struct CostAnalysis {
    pub profiles: Vec<DailyProfile>,
    pub costs: CostData,
    pub summary: Summary,
}
