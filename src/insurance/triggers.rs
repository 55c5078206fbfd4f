//! Parametric triggers: standard terms and payout rules

use crate::crops::CropCatalog;
use crate::model::{
    truncate_amount, Amount, Comparison, MeasurementWindow, SeasonType, TriggerPayout,
    WeatherMetric, WeatherTrigger, WeatherTriggerKind, YieldPayout, YieldTrigger,
    YieldTriggerKind,
};

const HEAT_THRESHOLD_CELSIUS: f64 = 42.0;
const DRY_SPELL_THRESHOLD_DAYS: f64 = 21.0;

const YIELD_LOSS_RATIO: f64 = 0.7;
const YIELD_FLOOR_RATIO: f64 = 0.5;
const YIELD_LOSS_MAX_PAYOUT_RATE: f64 = 0.8;
const CROP_FAILURE_RATIO: f64 = 0.2;

/// Weather triggers written into a new policy for this crop and season
pub fn default_weather_triggers(crops: &CropCatalog, crop_type: &str, season: SeasonType) -> Vec<WeatherTrigger> {
    let mut triggers = vec![WeatherTrigger {
        kind: WeatherTriggerKind::RainfallDeficit,
        metric: WeatherMetric::CumulativeRainfall,
        comparison: Comparison::LessThan,
        threshold: crops.rainfall_threshold(crop_type, season),
        payout: TriggerPayout::Scaled {
            base_amount: 10_000,
            scaling_factor: 2.0,
        },
        window: MeasurementWindow {
            start_offset_days: 0,
            duration_days: 90,
        },
    }];

    if crops.is_heat_sensitive(crop_type) {
        triggers.push(WeatherTrigger {
            kind: WeatherTriggerKind::ExtremeTemperature,
            metric: WeatherMetric::MaxTemperature,
            comparison: Comparison::GreaterThan,
            threshold: HEAT_THRESHOLD_CELSIUS,
            payout: TriggerPayout::Fixed { amount: 5_000 },
            window: MeasurementWindow {
                start_offset_days: 30,
                duration_days: 60,
            },
        });
    }

    triggers.push(WeatherTrigger {
        kind: WeatherTriggerKind::ProlongedDrought,
        metric: WeatherMetric::ConsecutiveDryDays,
        comparison: Comparison::GreaterThan,
        threshold: DRY_SPELL_THRESHOLD_DAYS,
        payout: TriggerPayout::Scaled {
            base_amount: 15_000,
            scaling_factor: 1.5,
        },
        window: MeasurementWindow {
            start_offset_days: 0,
            duration_days: 120,
        },
    });

    triggers
}

/// Yield triggers relative to the expected yield per acre
///
/// No yield cover is written when no expected yield is known.
pub fn default_yield_triggers(average_yield: Option<f64>) -> Vec<YieldTrigger> {
    let average = match average_yield {
        Some(y) if y.is_finite() && y > 0.0 => y,
        _ => return Vec::new(),
    };

    vec![
        YieldTrigger {
            kind: YieldTriggerKind::YieldLoss,
            threshold_yield: average * YIELD_LOSS_RATIO,
            comparison: Comparison::LessThan,
            payout: YieldPayout::Proportional {
                max_payout_rate: YIELD_LOSS_MAX_PAYOUT_RATE,
                floor_yield: average * YIELD_FLOOR_RATIO,
            },
        },
        YieldTrigger {
            kind: YieldTriggerKind::TotalCropFailure,
            threshold_yield: average * CROP_FAILURE_RATIO,
            comparison: Comparison::LessThan,
            payout: YieldPayout::FixedFraction { rate: 1.0 },
        },
    ]
}

/// Payout of a weather trigger for an observed value, `None` if it does not fire
pub fn weather_payout(trigger: &WeatherTrigger, actual: f64) -> Option<Amount> {
    if !actual.is_finite() || !trigger.comparison.holds(actual, trigger.threshold) {
        return None;
    }

    let amount = match trigger.payout {
        TriggerPayout::Fixed { amount } => amount,
        TriggerPayout::Scaled {
            base_amount,
            scaling_factor,
        } => {
            let deviation = (trigger.threshold - actual).abs();
            truncate_amount(base_amount as f64 * (1.0 + deviation * scaling_factor))
        }
    };
    Some(amount)
}

/// Payout of a yield trigger for a reported yield, `None` if it does not fire
pub fn yield_payout(trigger: &YieldTrigger, sum_insured: Amount, actual_yield: f64) -> Option<Amount> {
    if !actual_yield.is_finite() || !trigger.comparison.holds(actual_yield, trigger.threshold_yield) {
        return None;
    }

    let rate = match trigger.payout {
        YieldPayout::Proportional {
            max_payout_rate,
            floor_yield,
        } => {
            let band = trigger.threshold_yield - floor_yield;
            let severity = if band > 0.0 {
                ((trigger.threshold_yield - actual_yield) / band).clamp(0.0, 1.0)
            } else {
                1.0
            };
            max_payout_rate * severity
        }
        YieldPayout::FixedFraction { rate } => rate,
    };
    Some(truncate_amount(sum_insured as f64 * rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn rainfall_trigger(threshold: f64) -> WeatherTrigger {
        WeatherTrigger {
            kind: WeatherTriggerKind::RainfallDeficit,
            metric: WeatherMetric::CumulativeRainfall,
            comparison: Comparison::LessThan,
            threshold,
            payout: TriggerPayout::Scaled {
                base_amount: 10_000,
                scaling_factor: 2.0,
            },
            window: MeasurementWindow {
                start_offset_days: 0,
                duration_days: 90,
            },
        }
    }

    #[test]
    fn test_rainfall_deficit_scaled_payout() {
        let trigger = rainfall_trigger(400.0);
        // 10,000 × (1 + 150 × 2.0)
        assert_eq!(weather_payout(&trigger, 250.0), Some(3_010_000));
        assert_eq!(weather_payout(&trigger, 400.0), None);
        assert_eq!(weather_payout(&trigger, 520.0), None);
        assert_eq!(weather_payout(&trigger, f64::NAN), None);
    }

    #[test]
    fn test_fixed_payout_ignores_deviation() {
        let crops = CropCatalog::default_catalog();
        let triggers = default_weather_triggers(&crops, "WHEAT", SeasonType::Rabi);
        let heat = triggers
            .iter()
            .find(|t| t.kind == WeatherTriggerKind::ExtremeTemperature)
            .unwrap();
        assert_eq!(weather_payout(heat, 42.5), Some(5_000));
        assert_eq!(weather_payout(heat, 48.0), Some(5_000));
        assert_eq!(weather_payout(heat, 42.0), None);
    }

    #[test]
    fn test_default_weather_triggers() {
        let crops = CropCatalog::default_catalog();

        let rice = default_weather_triggers(&crops, "RICE", SeasonType::Kharif);
        assert_eq!(rice.len(), 2);
        assert_eq!(rice[0].kind, WeatherTriggerKind::RainfallDeficit);
        assert_abs_diff_eq!(rice[0].threshold, 800.0, epsilon = 1e-9);
        assert_eq!(rice[1].kind, WeatherTriggerKind::ProlongedDrought);
        assert_eq!(rice[1].window.duration_days, 120);

        let wheat = default_weather_triggers(&crops, "WHEAT", SeasonType::Rabi);
        assert_eq!(wheat.len(), 3);
        assert_abs_diff_eq!(wheat[0].threshold, 480.0, epsilon = 1e-9);
        assert_eq!(wheat[1].window.start_offset_days, 30);

        let unknown = default_weather_triggers(&crops, "MILLET", SeasonType::Zaid);
        assert_abs_diff_eq!(unknown[0].threshold, 500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_drought_payout_scales_with_dry_days() {
        let crops = CropCatalog::default_catalog();
        let triggers = default_weather_triggers(&crops, "RICE", SeasonType::Kharif);
        // 15,000 × (1 + 4 × 1.5)
        assert_eq!(weather_payout(&triggers[1], 25.0), Some(105_000));
        assert_eq!(weather_payout(&triggers[1], 21.0), None);
    }

    #[test]
    fn test_default_yield_triggers() {
        let triggers = default_yield_triggers(Some(20.0));
        assert_eq!(triggers.len(), 2);
        assert_abs_diff_eq!(triggers[0].threshold_yield, 14.0, epsilon = 1e-9);
        assert_abs_diff_eq!(triggers[1].threshold_yield, 4.0, epsilon = 1e-9);

        assert!(default_yield_triggers(None).is_empty());
        assert!(default_yield_triggers(Some(0.0)).is_empty());
    }

    #[test]
    fn test_proportional_yield_payout() {
        let trigger = YieldTrigger {
            kind: YieldTriggerKind::YieldLoss,
            threshold_yield: 14.0,
            comparison: Comparison::LessThan,
            payout: YieldPayout::Proportional {
                max_payout_rate: 0.8,
                floor_yield: 10.0,
            },
        };
        assert_eq!(yield_payout(&trigger, 100_000, 14.0), None);
        assert_eq!(yield_payout(&trigger, 100_000, 12.0), Some(40_000));
        assert_eq!(yield_payout(&trigger, 100_000, 10.0), Some(80_000));
        assert_eq!(yield_payout(&trigger, 100_000, 3.0), Some(80_000));
    }

    #[test]
    fn test_total_failure_pays_sum_insured() {
        let trigger = &default_yield_triggers(Some(20.0))[1];
        assert_eq!(yield_payout(trigger, 71_400, 2.5), Some(71_400));
        assert_eq!(yield_payout(trigger, 71_400, 6.0), None);
    }
}
