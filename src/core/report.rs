use crate::core::resample::ewm_mean;
use crate::domain::model::{CostData, DailyProfile, Summary};
use crate::utils::error::{CostError, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write;

/// 與主控台輸出相同格式的文字報告
pub fn render_report(summary: &Summary, costs: &CostData) -> String {
    let mut out = String::new();
    // 寫入 String 不會失敗
    let _ = writeln!(out, "Average demand {:.1} GW", summary.mean_demand_mw / 1000.0);
    let _ = writeln!(
        out,
        "Average supply {:.1} GW (wind: {:.1} GW / solar: {:.1} GW)",
        summary.mean_supply_mw / 1000.0,
        summary.mean_wind_mw / 1000.0,
        summary.mean_solar_mw / 1000.0
    );
    let _ = writeln!(out, "Additional cost:");
    let _ = writeln!(
        out,
        "- wind {:.1} GW / £{:.1}bn @ {:.0} £/MWh",
        costs.wind_mw / 1000.0,
        costs.wind_cost / 1e9,
        costs.lcoe_wind_mwh
    );
    let _ = writeln!(
        out,
        "- solar {:.1} GW / £{:.1}bn @ {:.0} £/MWh",
        costs.solar_mw / 1000.0,
        costs.solar_cost / 1e9,
        costs.lcoe_solar_mwh
    );
    let _ = writeln!(
        out,
        "- battery  {:.1} TWh (peak) / £{:.1}tn",
        costs.max_storage_gwh.round_ties_even() / 1000.0,
        costs.storage_cost.round_ties_even() / 1e12
    );
    out
}

/// One day of dashboard series, in GW (storage in TWh).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub date: NaiveDate,
    pub wind_gw: f64,
    pub wind_gw_avg: f64,
    pub solar_gw: f64,
    pub solar_gw_avg: f64,
    pub demand_gw: f64,
    pub demand_gw_avg: f64,
    pub supply_gw: f64,
    pub supply_gw_avg: f64,
    pub supply_mult_gw: f64,
    pub supply_mult_gw_avg: f64,
    pub surplus_gw: f64,
    pub deficit_gw: f64,
    pub storage_balance_twh: f64,
}

pub fn chart_rows(profiles: &[DailyProfile], span: usize) -> Vec<ChartRow> {
    let wind = to_gw(profiles, |p| p.wind_mw);
    let solar = to_gw(profiles, |p| p.solar_mw);
    let demand = to_gw(profiles, |p| p.demand_mw);
    let supply = to_gw(profiles, |p| p.supply_mw);
    let supply_mult = to_gw(profiles, |p| p.supply_mult_mw);

    let wind_avg = ewm_mean(&wind, span);
    let solar_avg = ewm_mean(&solar, span);
    let demand_avg = ewm_mean(&demand, span);
    let supply_avg = ewm_mean(&supply, span);
    let supply_mult_avg = ewm_mean(&supply_mult, span);

    profiles
        .iter()
        .enumerate()
        .map(|(i, p)| ChartRow {
            date: p.date,
            wind_gw: wind[i],
            wind_gw_avg: wind_avg[i],
            solar_gw: solar[i],
            solar_gw_avg: solar_avg[i],
            demand_gw: demand[i],
            demand_gw_avg: demand_avg[i],
            supply_gw: supply[i],
            supply_gw_avg: supply_avg[i],
            supply_mult_gw: supply_mult[i],
            supply_mult_gw_avg: supply_mult_avg[i],
            surplus_gw: p.surplus_mw.unwrap_or(0.0) / 1000.0,
            deficit_gw: p.deficit_mw.unwrap_or(0.0) / 1000.0,
            storage_balance_twh: p.storage_balance_gwh / 1000.0,
        })
        .collect()
}

fn to_gw(profiles: &[DailyProfile], field: impl Fn(&DailyProfile) -> f64) -> Vec<f64> {
    profiles.iter().map(|p| field(p) / 1000.0).collect()
}

pub fn to_csv<T: Serialize>(rows: &[T]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| CostError::IoError(e.into_error()))
}
