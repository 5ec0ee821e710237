use crate::core::resample::mean;
use crate::domain::model::{DailyInput, DailyProfile};
use crate::utils::error::{CostError, Result};

/// Largest tolerated gap (MW) between mean demand and mean scaled supply.
const SCALING_TOLERANCE_MW: f64 = 1.0;

/// 把風電加太陽能放大到平均供給等於平均需求，並推算每日儲能餘額
pub fn compute_profiles(rows: &[DailyInput]) -> Result<Vec<DailyProfile>> {
    let mean_demand = mean(rows.iter().map(|r| r.demand_mw)).ok_or_else(|| {
        CostError::ProcessingError {
            message: "no overlapping days of wind, solar and demand data".to_string(),
        }
    })?;
    let mean_supply = mean(rows.iter().map(|r| r.wind_mw + r.solar_mw)).unwrap_or(0.0);

    if !(mean_supply > 0.0) {
        return Err(CostError::ProcessingError {
            message: format!(
                "mean wind+solar supply is {} MW, cannot scale to demand",
                mean_supply
            ),
        });
    }

    let factor = mean_demand / mean_supply;
    tracing::debug!(
        "Scaling supply by {:.3} (mean demand {:.0} MW, mean supply {:.0} MW)",
        factor,
        mean_demand,
        mean_supply
    );

    let mut profiles: Vec<DailyProfile> = rows
        .iter()
        .map(|row| {
            let supply_mw = row.wind_mw + row.solar_mw;
            let supply_mult_mw = supply_mw * factor;
            let delta_mw = supply_mult_mw - row.demand_mw;
            DailyProfile {
                date: row.date,
                demand_mw: row.demand_mw,
                wind_mw: row.wind_mw,
                solar_mw: row.solar_mw,
                supply_mw,
                supply_mult_mw,
                delta_mw,
                surplus_mw: (delta_mw >= 0.0).then_some(delta_mw),
                deficit_mw: (delta_mw < 0.0).then_some(delta_mw),
                storage_balance_gwh: 0.0,
            }
        })
        .collect();

    let mean_scaled = mean(profiles.iter().map(|p| p.supply_mult_mw)).unwrap_or(0.0);
    if (mean_demand - mean_scaled).abs() >= SCALING_TOLERANCE_MW {
        return Err(CostError::ValidationError {
            message: format!(
                "scaled supply mean {:.3} MW does not match demand mean {:.3} MW",
                mean_scaled, mean_demand
            ),
        });
    }

    // 累積餘額 (GWh)，再平移使最小值為 0
    let mut balance = 0.0;
    let mut min_balance = f64::INFINITY;
    for profile in profiles.iter_mut() {
        balance += profile.delta_mw * 24.0 / 1000.0;
        profile.storage_balance_gwh = balance;
        min_balance = min_balance.min(balance);
    }
    for profile in profiles.iter_mut() {
        profile.storage_balance_gwh -= min_balance;
    }

    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(day: u32, wind: f64, solar: f64, demand: f64) -> DailyInput {
        DailyInput {
            date: NaiveDate::from_ymd_opt(2022, 1, day).unwrap(),
            wind_mw: wind,
            solar_mw: solar,
            demand_mw: demand,
        }
    }

    #[test]
    fn test_supply_is_scaled_to_mean_demand() {
        let rows = vec![row(1, 8.0, 2.0, 30.0), row(2, 4.0, 1.0, 30.0)];
        let profiles = compute_profiles(&rows).unwrap();

        // mean supply 7.5, mean demand 30 -> factor 4
        assert_eq!(profiles[0].supply_mw, 10.0);
        assert_eq!(profiles[0].supply_mult_mw, 40.0);
        assert_eq!(profiles[1].supply_mult_mw, 20.0);
        assert_eq!(profiles[0].surplus_mw, Some(10.0));
        assert_eq!(profiles[0].deficit_mw, None);
        assert_eq!(profiles[1].surplus_mw, None);
        assert_eq!(profiles[1].deficit_mw, Some(-10.0));
    }

    #[test]
    fn test_storage_balance_starts_from_its_minimum() {
        // deltas: -10, -10, +20 MW -> cumulative -0.24, -0.48, 0.0 GWh
        let rows = vec![
            row(1, 2.0, 0.0, 30.0),
            row(2, 2.0, 0.0, 30.0),
            row(3, 5.0, 0.0, 30.0),
        ];
        let profiles = compute_profiles(&rows).unwrap();
        let balances: Vec<f64> = profiles.iter().map(|p| p.storage_balance_gwh).collect();

        assert!((balances[0] - 0.24).abs() < 1e-9);
        assert!(balances[1].abs() < 1e-9);
        assert!((balances[2] - 0.48).abs() < 1e-9);
        assert!(balances.iter().all(|b| *b >= 0.0));
    }

    #[test]
    fn test_zero_delta_counts_as_surplus() {
        let rows = vec![row(1, 5.0, 5.0, 10.0)];
        let profiles = compute_profiles(&rows).unwrap();

        assert_eq!(profiles[0].delta_mw, 0.0);
        assert_eq!(profiles[0].surplus_mw, Some(0.0));
        assert_eq!(profiles[0].deficit_mw, None);
        assert_eq!(profiles[0].storage_balance_gwh, 0.0);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(matches!(
            compute_profiles(&[]),
            Err(CostError::ProcessingError { .. })
        ));
    }

    #[test]
    fn test_zero_supply_is_an_error() {
        let rows = vec![row(1, 0.0, 0.0, 30.0)];
        assert!(compute_profiles(&rows).is_err());
    }
}
