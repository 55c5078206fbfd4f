//! CSV-based crop catalog loader
//!
//! One row per crop; rainfall columns are left empty for seasons the crop
//! is not grown in.

use std::io::Read;
use std::path::Path;

use csv::Reader;

use super::CropInfo;
use crate::error::EngineResult;
use crate::model::{Amount, SeasonType};

/// Default path to the crop catalog
pub const DEFAULT_CROPS_PATH: &str = "data/crops.csv";

#[derive(Debug, serde::Deserialize)]
struct CropRow {
    #[serde(rename = "CropType")]
    crop_type: String,
    #[serde(rename = "AverageYield")]
    average_yield: Option<f64>,
    #[serde(rename = "MarketPrice")]
    market_price: Option<Amount>,
    #[serde(rename = "RiskFactor")]
    risk_factor: f64,
    #[serde(rename = "TenureMonths")]
    tenure_months: u32,
    #[serde(rename = "GrowingMonths")]
    growing_months: u32,
    #[serde(rename = "HeatSensitive")]
    heat_sensitive: bool,
    #[serde(rename = "KharifRainfall")]
    kharif_rainfall: Option<f64>,
    #[serde(rename = "RabiRainfall")]
    rabi_rainfall: Option<f64>,
    #[serde(rename = "ZaidRainfall")]
    zaid_rainfall: Option<f64>,
    #[serde(rename = "AnnualRainfall")]
    annual_rainfall: Option<f64>,
}

impl From<CropRow> for CropInfo {
    fn from(row: CropRow) -> Self {
        let rainfall_requirements = [
            (SeasonType::Kharif, row.kharif_rainfall),
            (SeasonType::Rabi, row.rabi_rainfall),
            (SeasonType::Zaid, row.zaid_rainfall),
            (SeasonType::Annual, row.annual_rainfall),
        ]
        .into_iter()
        .filter_map(|(season, mm)| mm.map(|mm| (season, mm)))
        .collect();

        CropInfo {
            crop_type: row.crop_type,
            average_yield_per_area: row.average_yield,
            average_market_price: row.market_price,
            risk_factor: row.risk_factor,
            tenure_months: row.tenure_months,
            growing_months: row.growing_months,
            heat_sensitive: row.heat_sensitive,
            rainfall_requirements,
        }
    }
}

/// Load crop rows from a CSV file
pub fn load_crops<P: AsRef<Path>>(path: P) -> EngineResult<Vec<CropInfo>> {
    read_crops(Reader::from_path(path)?)
}

pub fn read_crops<R: Read>(mut reader: Reader<R>) -> EngineResult<Vec<CropInfo>> {
    let mut crops = Vec::new();
    for result in reader.deserialize() {
        let row: CropRow = result?;
        crops.push(CropInfo::from(row));
    }
    Ok(crops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crops::CropCatalog;
    use approx::assert_abs_diff_eq;

    const CROPS_CSV: &str = "\
CropType,AverageYield,MarketPrice,RiskFactor,TenureMonths,GrowingMonths,HeatSensitive,KharifRainfall,RabiRainfall,ZaidRainfall,AnnualRainfall
rice,22.0,2000,0.01,6,4,false,1100,,,
MILLET,,,0.02,5,4,false,,,,
";

    #[test]
    fn test_read_crops() {
        let crops = read_crops(Reader::from_reader(CROPS_CSV.as_bytes())).unwrap();
        assert_eq!(crops.len(), 2);
        assert_eq!(crops[0].rainfall_requirements, vec![(SeasonType::Kharif, 1100.0)]);
        assert!(crops[1].average_yield_per_area.is_none());
        assert!(crops[1].rainfall_requirements.is_empty());
    }

    #[test]
    fn test_loaded_catalog_normalizes_keys() {
        let crops = read_crops(Reader::from_reader(CROPS_CSV.as_bytes())).unwrap();
        let catalog = CropCatalog::from_crops(crops);
        assert_eq!(catalog.len(), 2);
        assert_abs_diff_eq!(catalog.rainfall_threshold("RICE", SeasonType::Kharif), 880.0);
        assert_eq!(catalog.tenure_months("millet"), 5);
    }
}
