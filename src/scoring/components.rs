//! The six credit sub-scores
//!
//! Each function scores one sub-profile independently. An absent
//! sub-profile yields its fallback score instead of an error.

use std::collections::HashSet;

use crate::model::{
    ClimateZone, CropRecord, EducationLevel, FinancialHistory, FloodRisk, HarvestOutcome,
    LandOwnershipInfo, MarketAccessProfile, OwnershipType, SocialProfile, SoilQuality,
    WeatherRiskProfile,
};

/// Upper bound for every sub-score except weather
pub const SUB_SCORE_CAP: i32 = 850;
pub const WEATHER_SCORE_FLOOR: i32 = 300;
pub const WEATHER_SCORE_CAP: i32 = 800;

pub const LAND_FALLBACK: u32 = 300;
pub const CROP_FALLBACK: u32 = 400;
pub const FINANCIAL_FALLBACK: u32 = 350;
pub const WEATHER_FALLBACK: u32 = 500;
pub const MARKET_FALLBACK: u32 = 450;
pub const SOCIAL_FALLBACK: u32 = 500;

/// Incomes needed before stability is judged
const MIN_INCOME_SAMPLES: usize = 12;

fn capped(score: i32) -> u32 {
    score.clamp(0, SUB_SCORE_CAP) as u32
}

pub fn land_score(land: Option<&LandOwnershipInfo>) -> u32 {
    let Some(land) = land else {
        return LAND_FALLBACK;
    };

    let mut score = 500;

    if land.total_area > 10.0 {
        score += 150;
    } else if land.total_area > 5.0 {
        score += 100;
    } else if land.total_area > 2.0 {
        score += 50;
    }

    score += match land.ownership_type {
        OwnershipType::Owned => 100,
        OwnershipType::LeasedLongTerm => 50,
        OwnershipType::Other => 0,
    };

    if land.irrigation_available {
        score += 75;
    }

    score += match land.soil_quality {
        SoilQuality::Excellent => 75,
        SoilQuality::Good => 50,
        SoilQuality::Fair => 25,
        SoilQuality::Poor => 0,
    };

    capped(score)
}

pub fn crop_history_score(history: &[CropRecord]) -> u32 {
    if history.is_empty() {
        return CROP_FALLBACK;
    }

    let mut score = 500;
    let seasons = history.len();

    if seasons >= 10 {
        score += 150;
    } else if seasons >= 5 {
        score += 100;
    } else if seasons >= 3 {
        score += 50;
    }

    let successful = history
        .iter()
        .filter(|r| r.outcome == HarvestOutcome::Successful)
        .count();
    let success_rate = successful as f64 / seasons as f64;
    if success_rate > 0.8 {
        score += 100;
    } else if success_rate > 0.6 {
        score += 50;
    }

    let revenue: u64 = history.iter().map(|r| r.revenue).sum();
    let cost: u64 = history.iter().map(|r| r.cost).sum();
    if cost > 0 && revenue > cost {
        let margin = (revenue - cost) as f64 / cost as f64;
        if margin > 0.3 {
            score += 75;
        } else if margin > 0.15 {
            score += 50;
        }
    }

    let distinct: HashSet<String> = history
        .iter()
        .map(|r| r.crop_type.to_ascii_uppercase())
        .collect();
    if distinct.len() >= 3 {
        score += 50;
    }

    capped(score)
}

pub fn financial_score(financial: Option<&FinancialHistory>) -> u32 {
    let Some(financial) = financial else {
        return FINANCIAL_FALLBACK;
    };

    let mut score = 500;

    if let Some(rate) = financial.repayment_rate() {
        if rate >= 1.0 {
            score += 150;
        } else if rate > 0.9 {
            score += 100;
        } else if rate > 0.8 {
            score += 50;
        } else if rate < 0.5 {
            score -= 100;
        }
    }

    if let Some(utilization) = financial.credit_utilization() {
        if utilization < 0.3 {
            score += 50;
        } else if utilization > 0.8 {
            score -= 50;
        }
    }

    if financial.bank_account_age_years >= 5 {
        score += 50;
    } else if financial.bank_account_age_years >= 2 {
        score += 25;
    }

    if financial.monthly_incomes.len() >= MIN_INCOME_SAMPLES {
        let variability = financial.income_variability();
        if variability < 0.2 {
            score += 50;
        } else if variability > 0.5 {
            score -= 25;
        }
    }

    capped(score)
}

pub fn weather_score(weather: Option<&WeatherRiskProfile>) -> u32 {
    let Some(weather) = weather else {
        return WEATHER_FALLBACK;
    };

    let mut score = 600;

    score += match weather.climate_zone {
        ClimateZone::Arid | ClimateZone::SemiArid => -100,
        ClimateZone::Tropical | ClimateZone::Subtropical => 50,
        ClimateZone::Temperate => 75,
        ClimateZone::Other => 0,
    };

    if weather.drought_frequency >= 5 {
        score -= 150;
    } else if weather.drought_frequency >= 3 {
        score -= 75;
    } else if weather.drought_frequency <= 1 {
        score += 50;
    }

    score += match weather.flood_risk {
        FloodRisk::High => -100,
        FloodRisk::Medium => -50,
        FloodRisk::Low => 25,
        FloodRisk::Unknown => 0,
    };

    if weather.rainfall_variability > 0.4 {
        score -= 75;
    } else if weather.rainfall_variability < 0.2 {
        score += 50;
    }

    if weather.has_crop_insurance {
        score += 100;
    }

    score.clamp(WEATHER_SCORE_FLOOR, WEATHER_SCORE_CAP) as u32
}

pub fn market_score(market: Option<&MarketAccessProfile>) -> u32 {
    let Some(market) = market else {
        return MARKET_FALLBACK;
    };

    let mut score = 500;

    if market.distance_to_market_km < 10.0 {
        score += 100;
    } else if market.distance_to_market_km < 25.0 {
        score += 50;
    } else if market.distance_to_market_km > 50.0 {
        score -= 50;
    }

    if market.has_own_transport {
        score += 75;
    } else if market.has_transport_access {
        score += 50;
    }

    if market.has_storage_facility {
        score += 75;
    }

    if let Some(realization) = market.price_realization() {
        if realization > 0.9 {
            score += 100;
        } else if realization > 0.8 {
            score += 50;
        } else if realization < 0.7 {
            score -= 50;
        }
    }

    if market.number_of_buyers >= 5 {
        score += 50;
    } else if market.number_of_buyers >= 2 {
        score += 25;
    }

    if market.uses_digital_platforms {
        score += 50;
    }

    capped(score)
}

pub fn social_score(social: Option<&SocialProfile>) -> u32 {
    let Some(social) = social else {
        return SOCIAL_FALLBACK;
    };

    let mut score = 500;

    score += match social.education {
        EducationLevel::Graduate | EducationLevel::PostGraduate => 75,
        EducationLevel::HigherSecondary => 50,
        EducationLevel::Secondary => 25,
        EducationLevel::Primary => 10,
        EducationLevel::None => 0,
    };

    if (30..=50).contains(&social.age) {
        score += 50;
    } else if social.age > 60 {
        score -= 25;
    }

    if social.family_members_in_agriculture >= 2 {
        score += 50;
    }

    // connectivity
    if social.smartphone_access {
        score += 25;
    }
    if social.internet_access {
        score += 25;
    }

    if social.fpo_member {
        score += 50;
    }
    if social.shg_member {
        score += 25;
    }

    if social.received_training {
        score += 25;
    }
    if social.has_certifications {
        score += 50;
    }

    capped(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_fallback_scores() {
        assert_eq!(land_score(None), 300);
        assert_eq!(crop_history_score(&[]), 400);
        assert_eq!(financial_score(None), 350);
        assert_eq!(weather_score(None), 500);
        assert_eq!(market_score(None), 450);
        assert_eq!(social_score(None), 500);
    }

    #[test]
    fn test_land_score_tiers() {
        let mut land = testing::strong_land(8.0);
        assert_eq!(land_score(Some(&land)), 850);

        land.total_area = 3.0;
        land.ownership_type = OwnershipType::LeasedLongTerm;
        land.irrigation_available = false;
        land.soil_quality = SoilQuality::Fair;
        // 500 + 50 + 50 + 25
        assert_eq!(land_score(Some(&land)), 625);

        land.total_area = 2.0;
        land.ownership_type = OwnershipType::Other;
        land.soil_quality = SoilQuality::Poor;
        assert_eq!(land_score(Some(&land)), 500);
    }

    #[test]
    fn test_crop_history_score() {
        assert_eq!(crop_history_score(&testing::successful_history(10)), 850);

        // 3 seasons, one failure: 500 + 50 (experience) + 50 (67% success)
        // + 75 (margin 0.5) + 50 (three crops)
        let mut history = testing::successful_history(3);
        history[2].outcome = HarvestOutcome::Failed;
        assert_eq!(crop_history_score(&history), 725);
    }

    #[test]
    fn test_crop_history_loss_making() {
        let mut history = testing::successful_history(2);
        for record in history.iter_mut() {
            record.revenue = 50_000;
            record.cost = 60_000;
            record.crop_type = "RICE".to_string();
        }
        // 500 + 100 (all successful), no experience, margin or diversity bonus
        assert_eq!(crop_history_score(&history), 600);
    }

    #[test]
    fn test_financial_score_penalties() {
        let financial = FinancialHistory {
            total_loans: 4,
            successful_repayments: 1,
            credit_limit: 100_000,
            outstanding_debt: 90_000,
            bank_account_age_years: 0,
            monthly_incomes: vec![
                1_000, 30_000, 1_000, 30_000, 1_000, 30_000, 1_000, 30_000, 1_000, 30_000,
                1_000, 30_000,
            ],
        };
        // 500 - 100 - 50 - 25
        assert_eq!(financial_score(Some(&financial)), 325);
    }

    #[test]
    fn test_financial_score_ignores_short_income_series() {
        let financial = FinancialHistory {
            total_loans: 0,
            monthly_incomes: vec![1_000, 30_000],
            ..Default::default()
        };
        assert_eq!(financial_score(Some(&financial)), 500);
    }

    #[test]
    fn test_weather_score_clamped() {
        let worst = WeatherRiskProfile {
            climate_zone: ClimateZone::Arid,
            drought_frequency: 7,
            flood_risk: FloodRisk::High,
            rainfall_variability: 0.6,
            has_crop_insurance: false,
        };
        // 600 - 100 - 150 - 100 - 75 = 175, floored
        assert_eq!(weather_score(Some(&worst)), 300);

        let best = WeatherRiskProfile {
            climate_zone: ClimateZone::Temperate,
            drought_frequency: 0,
            flood_risk: FloodRisk::Low,
            rainfall_variability: 0.1,
            has_crop_insurance: true,
        };
        assert_eq!(weather_score(Some(&best)), 800);
    }

    #[test]
    fn test_market_score() {
        assert_eq!(market_score(Some(&testing::strong_market())), 850);

        let remote = MarketAccessProfile {
            distance_to_market_km: 60.0,
            has_own_transport: false,
            has_transport_access: true,
            has_storage_facility: false,
            average_sale_price: 650,
            average_market_price: 1_000,
            number_of_buyers: 1,
            uses_digital_platforms: false,
        };
        // 500 - 50 + 50 - 50
        assert_eq!(market_score(Some(&remote)), 450);
    }

    #[test]
    fn test_social_score() {
        assert_eq!(social_score(Some(&testing::strong_social())), 850);

        let mut social = testing::strong_social();
        social.education = EducationLevel::Primary;
        social.age = 65;
        social.family_members_in_agriculture = 1;
        social.smartphone_access = false;
        social.internet_access = false;
        social.fpo_member = false;
        social.shg_member = false;
        social.received_training = false;
        social.has_certifications = false;
        assert_eq!(social_score(Some(&social)), 485);
    }

    #[test]
    fn test_sub_scores_stay_in_range() {
        let zones = [ClimateZone::Arid, ClimateZone::Tropical, ClimateZone::Temperate, ClimateZone::Other];
        let floods = [FloodRisk::High, FloodRisk::Medium, FloodRisk::Low, FloodRisk::Unknown];
        for zone in zones {
            for flood in floods {
                for drought in 0..10 {
                    for variability in [0.1, 0.3, 0.5] {
                        for insured in [true, false] {
                            let profile = WeatherRiskProfile {
                                climate_zone: zone,
                                drought_frequency: drought,
                                flood_risk: flood,
                                rainfall_variability: variability,
                                has_crop_insurance: insured,
                            };
                            let score = weather_score(Some(&profile));
                            assert!((300..=800).contains(&score));
                        }
                    }
                }
            }
        }

        for area in [0.5, 3.0, 7.0, 50.0] {
            let mut land = testing::strong_land(area);
            for irrigation in [true, false] {
                land.irrigation_available = irrigation;
                assert!(land_score(Some(&land)) <= 850);
            }
        }
    }
}
