use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use snafu::prelude::*;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::tally::*;

/// Relative paths are resolved against the directory of the snapshot file.
pub fn resolve_path(root_path: &Path, file_path: &str) -> PathBuf {
    let p = Path::new(file_path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root_path.join(p)
    }
}

pub fn parse_timestamp(value: &str) -> TallyResult<DateTime<Utc>> {
    let ts = DateTime::parse_from_rfc3339(value.trim()).context(ParsingTimestampSnafu { value })?;
    Ok(ts.with_timezone(&Utc))
}

pub fn parse_percentage(value: &str) -> TallyResult<Decimal> {
    let v = value.trim();
    Decimal::from_str(v).context(ParsingPercentageSnafu { value: v })
}
