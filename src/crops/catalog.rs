//! Crop catalog with built-in defaults

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::loader;
use crate::error::EngineResult;
use crate::model::{Amount, SeasonType};

/// Tenor for crops with no catalog entry
const DEFAULT_TENURE_MONTHS: u32 = 6;
/// Sowing-to-harvest period for crops with no catalog entry
const DEFAULT_GROWING_MONTHS: u32 = 5;
/// Premium risk loading for crops with no catalog entry
const DEFAULT_RISK_FACTOR: f64 = 0.025;
/// Rainfall deficit threshold (mm) when no requirement is known
const DEFAULT_RAINFALL_THRESHOLD: f64 = 500.0;
/// Deficit trigger fires below this share of the seasonal requirement
const RAINFALL_THRESHOLD_RATIO: f64 = 0.8;

/// Reference data for one crop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropInfo {
    pub crop_type: String,
    /// Quintals per acre
    pub average_yield_per_area: Option<f64>,
    /// Price per quintal
    pub average_market_price: Option<Amount>,
    /// Premium loading added to the risk multiplier
    pub risk_factor: f64,
    pub tenure_months: u32,
    pub growing_months: u32,
    pub heat_sensitive: bool,
    /// Seasonal rainfall need in mm
    pub rainfall_requirements: Vec<(SeasonType, f64)>,
}

impl CropInfo {
    #[allow(clippy::too_many_arguments)]
    fn new(
        crop_type: &str,
        average_yield_per_area: f64,
        average_market_price: Amount,
        risk_factor: f64,
        tenure_months: u32,
        growing_months: u32,
        heat_sensitive: bool,
        rainfall_requirements: &[(SeasonType, f64)],
    ) -> Self {
        Self {
            crop_type: crop_type.to_string(),
            average_yield_per_area: Some(average_yield_per_area),
            average_market_price: Some(average_market_price),
            risk_factor,
            tenure_months,
            growing_months,
            heat_sensitive,
            rainfall_requirements: rainfall_requirements.to_vec(),
        }
    }

    /// Expected crop value per acre, if yield and price are both known
    pub fn expected_value_per_area(&self) -> Option<f64> {
        match (self.average_yield_per_area, self.average_market_price) {
            (Some(y), Some(p)) if y > 0.0 && p > 0 => Some(y * p as f64),
            _ => None,
        }
    }

    pub fn rainfall_requirement(&self, season: SeasonType) -> Option<f64> {
        self.rainfall_requirements
            .iter()
            .find(|(s, _)| *s == season)
            .map(|(_, mm)| *mm)
    }
}

/// Lookup table keyed by upper-case crop type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CropCatalog {
    crops: HashMap<String, CropInfo>,
}

impl CropCatalog {
    /// Built-in catalog for the common Indian field crops
    pub fn default_catalog() -> Self {
        use SeasonType::*;

        let crops = vec![
            CropInfo::new("RICE", 20.0, 2_100, 0.01, 6, 4, false, &[(Kharif, 1000.0), (Rabi, 800.0)]),
            CropInfo::new("WHEAT", 18.0, 2_200, 0.015, 6, 5, true, &[(Rabi, 600.0)]),
            CropInfo::new("COTTON", 8.0, 6_500, 0.03, 8, 6, false, &[(Kharif, 800.0)]),
            CropInfo::new("SUGARCANE", 350.0, 320, 0.02, 12, 12, false, &[(Annual, 1500.0)]),
            CropInfo::new("VEGETABLES", 60.0, 1_500, 0.05, 4, 3, false, &[]),
            CropInfo::new("PULSES", 6.0, 6_000, DEFAULT_RISK_FACTOR, 5, 4, false, &[]),
            CropInfo::new("MUSTARD", 7.0, 5_600, DEFAULT_RISK_FACTOR, 6, 5, true, &[]),
            CropInfo::new("POTATO", 100.0, 1_200, DEFAULT_RISK_FACTOR, 6, 5, true, &[]),
            CropInfo::new("TOMATO", 120.0, 1_000, DEFAULT_RISK_FACTOR, 6, 5, true, &[]),
        ];

        Self::from_crops(crops)
    }

    pub fn from_crops(crops: Vec<CropInfo>) -> Self {
        let crops = crops
            .into_iter()
            .map(|mut c| {
                c.crop_type = c.crop_type.trim().to_ascii_uppercase();
                (c.crop_type.clone(), c)
            })
            .collect();
        Self { crops }
    }

    /// Load the catalog from a CSV file
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        Ok(Self::from_crops(loader::load_crops(path)?))
    }

    pub fn get(&self, crop_type: &str) -> Option<&CropInfo> {
        self.crops.get(&crop_type.trim().to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }

    pub fn tenure_months(&self, crop_type: &str) -> u32 {
        self.get(crop_type)
            .map(|c| c.tenure_months)
            .unwrap_or(DEFAULT_TENURE_MONTHS)
    }

    pub fn growing_months(&self, crop_type: &str) -> u32 {
        self.get(crop_type)
            .map(|c| c.growing_months)
            .unwrap_or(DEFAULT_GROWING_MONTHS)
    }

    pub fn risk_factor(&self, crop_type: &str) -> f64 {
        self.get(crop_type)
            .map(|c| c.risk_factor)
            .unwrap_or(DEFAULT_RISK_FACTOR)
    }

    pub fn is_heat_sensitive(&self, crop_type: &str) -> bool {
        self.get(crop_type).map(|c| c.heat_sensitive).unwrap_or(false)
    }

    /// Cumulative rainfall below which the deficit trigger fires
    ///
    /// 80% of the seasonal requirement; 500mm flat when no requirement is
    /// recorded for the crop and season.
    pub fn rainfall_threshold(&self, crop_type: &str, season: SeasonType) -> f64 {
        self.get(crop_type)
            .and_then(|c| c.rainfall_requirement(season))
            .map(|mm| mm * RAINFALL_THRESHOLD_RATIO)
            .unwrap_or(DEFAULT_RAINFALL_THRESHOLD)
    }

    pub fn average_yield(&self, crop_type: &str) -> Option<f64> {
        self.get(crop_type).and_then(|c| c.average_yield_per_area)
    }
}
