// Data structures for reading the JSON snapshot and writing the summary configuration.

use rust_decimal::Decimal;
use seat_allocation::SeatRules;
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use snafu::prelude::*;
use std::fs;
use std::str::FromStr;

use crate::tally::*;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "reportName")]
    pub report_name: String,
    #[serde(rename = "reportDate")]
    pub report_date: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(rename = "minimumThreshold")]
    pub minimum_threshold: Option<JSValue>,
    #[serde(rename = "percentTolerance")]
    pub percent_tolerance: Option<JSValue>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DistrictConfig {
    pub id: u32,
    pub name: String,
    #[serde(rename = "deputySeats")]
    pub deputy_seats: i64,
    #[serde(rename = "totalDeputies")]
    pub total_deputies: Option<i64>,
    #[serde(rename = "senateSeats")]
    pub senate_seats: Option<i64>,
    #[serde(rename = "totalSenators")]
    pub total_senators: Option<i64>,
    #[serde(rename = "registeredVoters")]
    pub registered_voters: i64,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ListConfig {
    pub id: u32,
    pub district: u32,
    pub chamber: String,
    pub order: Option<u32>,
    pub code: String,
    pub name: String,
    pub alignment: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ScrutinyRecord {
    pub list: u32,
    pub percentage: JSValue,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "hasHeaders")]
    pub has_headers: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    pub rules: Option<RulesConfig>,
    pub districts: Vec<DistrictConfig>,
    pub lists: Vec<ListConfig>,
    pub scrutiny: Option<Vec<ScrutinyRecord>>,
    #[serde(rename = "scrutinyFileSources")]
    pub scrutiny_file_sources: Option<Vec<FileSource>>,
}

/// The configuration block written at the top of every summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub report: String,
    pub date: Option<String>,
    pub chamber: String,
    pub threshold: String,
}

impl OutputConfig {
    pub fn new(settings: &OutputSettings, chamber: &str, rules: &SeatRules) -> OutputConfig {
        OutputConfig {
            report: settings.report_name.clone(),
            date: settings.report_date.clone(),
            chamber: chamber.to_string(),
            threshold: rules.minimum_threshold.display(),
        }
    }
}

pub fn read_config(path: &str) -> TallyResult<SnapshotConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: SnapshotConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> TallyResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

/// Percentages and rules may be written as JSON numbers or strings.
pub fn read_js_decimal(x: &JSValue) -> TallyResult<Decimal> {
    let s = match x {
        JSValue::Number(n) => n.to_string(),
        JSValue::String(s) => s.trim().to_string(),
        _ => {
            return ParsingJsonNumberSnafu {
                value: x.to_string(),
            }
            .fail()
        }
    };
    Decimal::from_str(&s).context(ParsingPercentageSnafu { value: s.clone() })
}
