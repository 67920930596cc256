// Reader for percentage records stored in CSV files.
// Columns: list_id,percentage,updated_at

use log::debug;
use snafu::prelude::*;

use crate::tally::io_common::{parse_percentage, parse_timestamp};
use crate::tally::*;

pub fn read_csv_scrutiny(path: &str, has_headers: bool) -> TallyResult<Vec<ParsedScrutiny>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let row_offset = if has_headers { 2 } else { 1 };
    let mut res: Vec<ParsedScrutiny> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + row_offset;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let list_s = line.get(0).context(CsvLineTooShortSnafu { lineno })?;
        let list = list_s
            .parse::<u32>()
            .ok()
            .context(CsvListIdSnafu { lineno, value: list_s })?;
        let percentage = parse_percentage(line.get(1).context(CsvLineTooShortSnafu { lineno })?)?;
        let updated_at = parse_timestamp(line.get(2).context(CsvLineTooShortSnafu { lineno })?)?;
        debug!(
            "read_csv_scrutiny: line {}: list {} {} at {}",
            lineno, list, percentage, updated_at
        );
        res.push(ParsedScrutiny {
            list,
            percentage,
            updated_at,
        });
    }
    Ok(res)
}
