//! Load crop history and weather observations from CSV

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::Reader;

use super::{CropRecord, HarvestOutcome, WeatherSnapshot};
use crate::error::{EngineError, EngineResult};

/// Raw CSV row of crop_history.csv
#[derive(Debug, serde::Deserialize)]
struct CropHistoryRow {
    #[serde(rename = "FarmerID")]
    farmer_id: String,
    #[serde(rename = "Season")]
    season: String,
    #[serde(rename = "CropType")]
    crop_type: String,
    #[serde(rename = "Outcome")]
    outcome: String,
    #[serde(rename = "Revenue")]
    revenue: u64,
    #[serde(rename = "Cost")]
    cost: u64,
    #[serde(rename = "YieldPerAcre")]
    yield_per_area: Option<f64>,
}

impl CropHistoryRow {
    fn to_record(self) -> EngineResult<(String, CropRecord)> {
        let outcome = match self.outcome.trim().to_ascii_uppercase().as_str() {
            "SUCCESSFUL" | "SUCCESS" => HarvestOutcome::Successful,
            "FAILED" | "FAILURE" => HarvestOutcome::Failed,
            other => {
                return Err(EngineError::Validation(format!(
                    "unknown harvest outcome '{}' for farmer {}",
                    other, self.farmer_id
                )))
            }
        };

        Ok((
            self.farmer_id,
            CropRecord {
                season: self.season,
                crop_type: self.crop_type.trim().to_ascii_uppercase(),
                outcome,
                revenue: self.revenue,
                cost: self.cost,
                yield_per_area: self.yield_per_area,
            },
        ))
    }
}

/// Raw CSV row of a station observation file
#[derive(Debug, serde::Deserialize)]
struct WeatherRow {
    #[serde(rename = "Station")]
    station: String,
    #[serde(rename = "ObservedOn")]
    observed_on: NaiveDate,
    #[serde(rename = "CumulativeRainfall")]
    cumulative_rainfall: f64,
    #[serde(rename = "MaxTemperature")]
    max_temperature: f64,
    #[serde(rename = "ConsecutiveDryDays")]
    consecutive_dry_days: u32,
    #[serde(rename = "Humidity")]
    humidity: Option<f64>,
    #[serde(rename = "YieldPerAcre")]
    yield_per_area: Option<f64>,
}

impl From<WeatherRow> for WeatherSnapshot {
    fn from(row: WeatherRow) -> Self {
        WeatherSnapshot {
            station: row.station,
            observed_on: row.observed_on,
            cumulative_rainfall: row.cumulative_rainfall,
            max_temperature: row.max_temperature,
            consecutive_dry_days: row.consecutive_dry_days,
            humidity: row.humidity,
            yield_per_area: row.yield_per_area,
        }
    }
}

/// Load crop history grouped by farmer, in file order within each farmer
pub fn load_crop_history<P: AsRef<Path>>(path: P) -> EngineResult<BTreeMap<String, Vec<CropRecord>>> {
    let reader = Reader::from_path(path)?;
    read_crop_history(reader)
}

pub fn read_crop_history<R: Read>(
    mut reader: Reader<R>,
) -> EngineResult<BTreeMap<String, Vec<CropRecord>>> {
    let mut history: BTreeMap<String, Vec<CropRecord>> = BTreeMap::new();

    for result in reader.deserialize() {
        let row: CropHistoryRow = result?;
        let (farmer_id, record) = row.to_record()?;
        history.entry(farmer_id).or_default().push(record);
    }

    Ok(history)
}

/// Load weather snapshots in file order
pub fn load_weather_snapshots<P: AsRef<Path>>(path: P) -> EngineResult<Vec<WeatherSnapshot>> {
    let reader = Reader::from_path(path)?;
    read_weather_snapshots(reader)
}

pub fn read_weather_snapshots<R: Read>(mut reader: Reader<R>) -> EngineResult<Vec<WeatherSnapshot>> {
    let mut snapshots = Vec::new();

    for result in reader.deserialize() {
        let row: WeatherRow = result?;
        snapshots.push(WeatherSnapshot::from(row));
    }

    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_crop_history_groups_by_farmer() {
        let data = "\
FarmerID,Season,CropType,Outcome,Revenue,Cost,YieldPerAcre
F1,KHARIF-2022,rice,SUCCESSFUL,120000,80000,22.5
F2,RABI-2022,WHEAT,FAILED,10000,40000,
F1,RABI-2023,WHEAT,Successful,90000,60000,18
";
        let history = read_crop_history(Reader::from_reader(data.as_bytes())).unwrap();

        assert_eq!(history.len(), 2);
        let f1 = &history["F1"];
        assert_eq!(f1.len(), 2);
        assert_eq!(f1[0].crop_type, "RICE");
        assert_eq!(f1[0].yield_per_area, Some(22.5));
        assert_eq!(f1[1].outcome, HarvestOutcome::Successful);
        assert_eq!(history["F2"][0].outcome, HarvestOutcome::Failed);
        assert_eq!(history["F2"][0].yield_per_area, None);
    }

    #[test]
    fn test_unknown_outcome_rejected() {
        let data = "\
FarmerID,Season,CropType,Outcome,Revenue,Cost,YieldPerAcre
F1,KHARIF-2022,RICE,PARTIAL,1,1,
";
        let err = read_crop_history(Reader::from_reader(data.as_bytes())).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_read_weather_snapshots() {
        let data = "\
Station,ObservedOn,CumulativeRainfall,MaxTemperature,ConsecutiveDryDays,Humidity,YieldPerAcre
PUNE-01,2024-09-15,250.0,38.5,12,,
PUNE-01,2024-11-30,610.0,33.0,4,62.0,14.0
";
        let snapshots = read_weather_snapshots(Reader::from_reader(data.as_bytes())).unwrap();

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].observed_on, NaiveDate::from_ymd_opt(2024, 9, 15).unwrap());
        assert_eq!(snapshots[0].consecutive_dry_days, 12);
        assert_eq!(snapshots[0].humidity, None);
        assert_eq!(snapshots[1].yield_per_area, Some(14.0));
    }
}
