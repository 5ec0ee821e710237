use crate::core::resample::mean;
use crate::domain::model::{CostData, DailyProfile, LcoeParams, Summary};
use crate::utils::error::{CostError, Result};

const HOURS_PER_YEAR: f64 = 24.0 * 365.0;

/// Capital recovery factor. With a zero discount rate the capital is simply
/// spread evenly over the lifetime.
pub fn capital_recovery_factor(discount_rate: f64, periods_years: u32) -> f64 {
    if discount_rate == 0.0 {
        return 1.0 / periods_years.max(1) as f64;
    }
    let intermediate = (1.0 + discount_rate).powi(periods_years as i32);
    discount_rate * intermediate / (intermediate - 1.0)
}

/// Levelised cost of energy in £/MWh: the average price per unit generated
/// needed to recover build and running costs over the plant's financial life.
///
/// See <https://www.nrel.gov/analysis/tech-lcoe.html>.
pub fn compute_lcoe(params: &LcoeParams) -> f64 {
    let crf = capital_recovery_factor(params.discount_rate, params.periods_years);
    let lifetime_cost = params.capital_cost_kw * crf + params.fixed_om_cost_kw_yr;
    let lifetime_energy = HOURS_PER_YEAR * params.capacity_factor;

    1000.0 * lifetime_cost / lifetime_energy
}

pub fn compute_costs(
    profiles: &[DailyProfile],
    wind: &LcoeParams,
    solar: &LcoeParams,
    battery_cost_kwh: f64,
) -> Result<CostData> {
    let summary = summarise(profiles)?;

    let wind_frac = summary.mean_wind_mw / summary.mean_supply_mw;
    let solar_frac = summary.mean_solar_mw / summary.mean_supply_mw;

    // 各電源需提供的平均發電量
    let wind_mw = summary.mean_demand_mw * wind_frac;
    let solar_mw = summary.mean_demand_mw * solar_frac;

    let max_storage_gwh = profiles
        .iter()
        .map(|p| p.storage_balance_gwh)
        .fold(0.0, f64::max);

    Ok(CostData {
        wind_mw,
        solar_mw,
        lcoe_wind_mwh: compute_lcoe(wind).round_ties_even(),
        lcoe_solar_mwh: compute_lcoe(solar).round_ties_even(),
        wind_cost: wind_mw * 1000.0 * wind.capital_cost_kw,
        solar_cost: solar_mw * 1000.0 * solar.capital_cost_kw,
        storage_cost: max_storage_gwh * 1000.0 * 1000.0 * battery_cost_kwh,
        max_storage_gwh,
    })
}

pub fn summarise(profiles: &[DailyProfile]) -> Result<Summary> {
    let empty = || CostError::ProcessingError {
        message: "no daily profiles to summarise".to_string(),
    };

    let summary = Summary {
        days: profiles.len(),
        mean_demand_mw: mean(profiles.iter().map(|p| p.demand_mw)).ok_or_else(empty)?,
        mean_supply_mw: mean(profiles.iter().map(|p| p.supply_mw)).ok_or_else(empty)?,
        mean_wind_mw: mean(profiles.iter().map(|p| p.wind_mw)).ok_or_else(empty)?,
        mean_solar_mw: mean(profiles.iter().map(|p| p.solar_mw)).ok_or_else(empty)?,
    };

    if summary.mean_supply_mw <= 0.0 {
        return Err(CostError::ProcessingError {
            message: "mean supply must be positive to split costs by source".to_string(),
        });
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::AssumptionsConfig;
    use chrono::NaiveDate;

    fn params(capital_cost_kw: f64) -> LcoeParams {
        LcoeParams {
            periods_years: 20,
            discount_rate: 0.03,
            capital_cost_kw,
            capacity_factor: 0.25,
            fixed_om_cost_kw_yr: 25.0,
        }
    }

    fn profile(day: u32, wind: f64, solar: f64, demand: f64, balance: f64) -> DailyProfile {
        DailyProfile {
            date: NaiveDate::from_ymd_opt(2022, 1, day).unwrap(),
            demand_mw: demand,
            wind_mw: wind,
            solar_mw: solar,
            supply_mw: wind + solar,
            supply_mult_mw: 0.0,
            delta_mw: 0.0,
            surplus_mw: None,
            deficit_mw: None,
            storage_balance_gwh: balance,
        }
    }

    #[test]
    fn test_lcoe_reference_value() {
        let cost = compute_lcoe(&params(1250.0));
        assert!((cost - 49.78).abs() < 0.01, "lcoe was {}", cost);
    }

    #[test]
    fn test_default_assumptions_lcoe() {
        let assumptions = AssumptionsConfig::default();
        assert_eq!(compute_lcoe(&assumptions.wind).round(), 57.0);
        assert_eq!(compute_lcoe(&assumptions.solar).round(), 42.0);
    }

    #[test]
    fn test_zero_discount_rate_spreads_capital_evenly() {
        let mut p = params(1000.0);
        p.discount_rate = 0.0;
        // 1000 / 20 + 25 = 75 £/kW/yr over 2190 h
        assert!((compute_lcoe(&p) - 75_000.0 / 2190.0).abs() < 1e-9);
    }

    #[test]
    fn test_crf_approaches_flat_rate_for_tiny_discount() {
        let flat = capital_recovery_factor(0.0, 20);
        let tiny = capital_recovery_factor(1e-9, 20);
        assert!((flat - tiny).abs() < 1e-6);
    }

    #[test]
    fn test_costs_split_demand_by_supply_share() {
        // wind 75% / solar 25% of supply, mean demand 40 MW
        let profiles = vec![
            profile(1, 6.0, 2.0, 40.0, 0.0),
            profile(2, 6.0, 2.0, 40.0, 1.5),
            profile(3, 6.0, 2.0, 40.0, 0.5),
        ];
        let costs = compute_costs(&profiles, &params(1500.0), &params(1000.0), 200.0).unwrap();

        assert!((costs.wind_mw - 30.0).abs() < 1e-9);
        assert!((costs.solar_mw - 10.0).abs() < 1e-9);
        assert!((costs.wind_cost - 30.0 * 1000.0 * 1500.0).abs() < 1e-3);
        assert!((costs.solar_cost - 10.0 * 1000.0 * 1000.0).abs() < 1e-3);
        assert_eq!(costs.max_storage_gwh, 1.5);
        assert!((costs.storage_cost - 1.5 * 1e6 * 200.0).abs() < 1e-3);
        assert_eq!(costs.lcoe_wind_mwh, 57.0);
        assert_eq!(costs.lcoe_solar_mwh, 42.0);
    }

    #[test]
    fn test_summarise_empty_profiles_fails() {
        assert!(summarise(&[]).is_err());
    }
}
