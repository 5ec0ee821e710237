use crate::domain::model::{DailyInput, DailySeries, Sample};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Mean of each UTC calendar day. Non-finite values are skipped.
pub fn daily_mean(samples: &[Sample]) -> DailySeries {
    let mut sums: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();

    for sample in samples.iter().filter(|s| s.value.is_finite()) {
        let entry = sums.entry(sample.timestamp.date_naive()).or_insert((0.0, 0));
        entry.0 += sample.value;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(date, (sum, count))| (date, sum / count as f64))
        .collect()
}

/// 只保留三個序列都有資料的日期
pub fn join_daily(wind: &DailySeries, solar: &DailySeries, demand: &DailySeries) -> Vec<DailyInput> {
    let rows: Vec<DailyInput> = demand
        .iter()
        .filter_map(|(date, demand_mw)| {
            Some(DailyInput {
                date: *date,
                wind_mw: *wind.get(date)?,
                solar_mw: *solar.get(date)?,
                demand_mw: *demand_mw,
            })
        })
        .collect();

    let all_dates = wind
        .keys()
        .chain(solar.keys())
        .chain(demand.keys())
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    if all_dates > rows.len() {
        tracing::warn!(
            "⚠️ Dropped {} day(s) missing from at least one series (wind {}, solar {}, demand {})",
            all_dates - rows.len(),
            wind.len(),
            solar.len(),
            demand.len()
        );
    }

    rows
}

/// Exponentially weighted mean with `alpha = 2 / (span + 1)` and adjusted
/// weights, so early values are not biased towards zero.
pub fn ewm_mean(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span.max(1) as f64 + 1.0);
    let decay = 1.0 - alpha;
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    values
        .iter()
        .map(|value| {
            numerator = value + decay * numerator;
            denominator = 1.0 + decay * denominator;
            numerator / denominator
        })
        .collect()
}

pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample(day: u32, hour: u32, value: f64) -> Sample {
        Sample::new(Utc.with_ymd_and_hms(2022, 1, day, hour, 0, 0).unwrap(), value)
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, day).unwrap()
    }

    #[test]
    fn test_daily_mean_groups_by_utc_day() {
        let samples = vec![
            sample(1, 0, 10.0),
            sample(1, 12, 20.0),
            sample(2, 6, 5.0),
            sample(2, 7, f64::NAN),
        ];
        let daily = daily_mean(&samples);

        assert_eq!(daily.len(), 2);
        assert_eq!(daily[&date(1)], 15.0);
        assert_eq!(daily[&date(2)], 5.0);
    }

    #[test]
    fn test_join_keeps_common_dates_only() {
        let wind: DailySeries = [(date(1), 1.0), (date(2), 2.0), (date(3), 3.0)].into();
        let solar: DailySeries = [(date(2), 0.5), (date(3), 0.7)].into();
        let demand: DailySeries = [(date(1), 10.0), (date(2), 11.0), (date(3), 12.0)].into();

        let rows = join_daily(&wind, &solar, &demand);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, date(2));
        assert_eq!(rows[0].wind_mw, 2.0);
        assert_eq!(rows[0].solar_mw, 0.5);
        assert_eq!(rows[1].demand_mw, 12.0);
    }

    #[test]
    fn test_ewm_mean_matches_adjusted_weights() {
        // span 3 -> alpha 0.5: [1, (2 + 0.5) / 1.5, (3 + 1 + 0.25) / 1.75]
        let smoothed = ewm_mean(&[1.0, 2.0, 3.0], 3);

        assert!((smoothed[0] - 1.0).abs() < 1e-12);
        assert!((smoothed[1] - 2.5 / 1.5).abs() < 1e-12);
        assert!((smoothed[2] - 4.25 / 1.75).abs() < 1e-12);
    }

    #[test]
    fn test_ewm_of_constant_is_constant() {
        let smoothed = ewm_mean(&[4.0; 10], 30);
        assert!(smoothed.iter().all(|v| (v - 4.0).abs() < 1e-12));
    }

    #[test]
    fn test_mean_of_empty_is_none() {
        assert_eq!(mean(Vec::<f64>::new()), None);
        assert_eq!(mean(vec![1.0, 2.0, 3.0]), Some(2.0));
    }
}
