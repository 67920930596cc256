use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use seat_allocation::builder::{RawDistrict, SnapshotBuilder};
use seat_allocation::*;
use serde_json::{json, Value as JSValue};
use snafu::{prelude::*, Snafu};
use std::fs;
use std::path::{Path, PathBuf};
use text_diff::print_diff;

use crate::args::Args;
use crate::tally::config_reader::*;
use crate::tally::io_common::{parse_timestamp, resolve_path};

pub mod config_reader;
mod io_common;
mod io_csv;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TallyError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a number or a string, found {value}"))]
    ParsingJsonNumber { value: String },
    #[snafu(display("Invalid percentage {value:?}"))]
    ParsingPercentage {
        source: rust_decimal::Error,
        value: String,
    },
    #[snafu(display("Invalid timestamp {value:?}, expected RFC 3339"))]
    ParsingTimestamp {
        source: chrono::ParseError,
        value: String,
    },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading a CSV line"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("CSV line {lineno} is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("CSV line {lineno}: invalid list id {value:?}"))]
    CsvListId { lineno: usize, value: String },
    #[snafu(display("The rule {name} ({value}) has more than two decimals"))]
    RulePrecision { name: String, value: String },
    #[snafu(display("Invalid snapshot: {source}"))]
    InvalidSnapshot { source: SeatErrors },
    #[snafu(display("Cannot report: {source}"))]
    Lookup { source: SeatErrors },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The path {path} has no parent directory"))]
    MissingParentDir { path: String },
    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type TallyResult<T> = Result<T, TallyError>;

/// A percentage record read from one of the scrutiny sources.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedScrutiny {
    pub list: u32,
    pub percentage: Decimal,
    pub updated_at: DateTime<Utc>,
}

fn read_scrutiny_source(
    root_path: &Path,
    source: &FileSource,
) -> TallyResult<Vec<ParsedScrutiny>> {
    let p = resolve_path(root_path, &source.file_path);
    let p_str = p.as_os_str().to_str().context(MissingParentDirSnafu {
        path: source.file_path.clone(),
    })?;
    info!("Attempting to read scrutiny file {:?}", p_str);
    match source.provider.as_str() {
        "csv" => io_csv::read_csv_scrutiny(p_str, source.has_headers.unwrap_or(true)),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

// Rules are not rounded: a value with more than two decimals is rejected.
fn rule_percentage(name: &str, js_value: &JSValue) -> TallyResult<Percentage> {
    let value = read_js_decimal(js_value)?;
    ensure!(
        value.normalize().scale() <= 2,
        RulePrecisionSnafu {
            name,
            value: value.to_string(),
        }
    );
    Percentage::new(value).context(InvalidSnapshotSnafu {})
}

fn validate_rules(rules: &Option<RulesConfig>, threshold: Option<&str>) -> TallyResult<SeatRules> {
    let mut res = SeatRules::DEFAULT_RULES;
    if let Some(rc) = rules {
        if let Some(v) = &rc.minimum_threshold {
            res.minimum_threshold = rule_percentage("minimumThreshold", v)?;
        }
        if let Some(v) = &rc.percent_tolerance {
            res.tolerance = rule_percentage("percentTolerance", v)?;
        }
    }
    if let Some(t) = threshold {
        let v = JSValue::String(t.to_string());
        res.minimum_threshold = rule_percentage("threshold", &v)?;
    }
    info!("Rules: {:?}", res);
    Ok(res)
}

fn build_snapshot(
    config: &SnapshotConfig,
    root_path: &Path,
    extra_percentages: Option<&str>,
) -> TallyResult<Snapshot> {
    let mut builder = SnapshotBuilder::new();
    for d in config.districts.iter() {
        builder
            .add_district(&RawDistrict {
                id: DistrictId(d.id),
                name: d.name.clone(),
                deputy_seats: d.deputy_seats,
                total_deputies: d.total_deputies.unwrap_or(d.deputy_seats),
                senate_seats: d.senate_seats.unwrap_or(0),
                total_senators: d.total_senators.unwrap_or(0),
                registered_voters: d.registered_voters,
            })
            .context(InvalidSnapshotSnafu {})?;
    }
    for l in config.lists.iter() {
        let chamber = Chamber::parse(&l.chamber).context(InvalidSnapshotSnafu {})?;
        builder
            .add_list(&ElectionList {
                id: ListId(l.id),
                district: DistrictId(l.district),
                chamber,
                order: l.order.unwrap_or(l.id),
                code: l.code.clone(),
                name: l.name.clone(),
                alignment: l.alignment.clone(),
            })
            .context(InvalidSnapshotSnafu {})?;
    }

    let mut records: Vec<ParsedScrutiny> = Vec::new();
    for s in config.scrutiny.iter().flatten() {
        records.push(ParsedScrutiny {
            list: s.list,
            percentage: read_js_decimal(&s.percentage)?,
            updated_at: parse_timestamp(&s.updated_at)?,
        });
    }
    for fs in config.scrutiny_file_sources.iter().flatten() {
        records.extend(read_scrutiny_source(root_path, fs)?);
    }
    if let Some(p) = extra_percentages {
        info!("Attempting to read percentages file {:?}", p);
        records.extend(io_csv::read_csv_scrutiny(p, true)?);
    }
    debug!("build_snapshot: {} percentage records", records.len());

    for r in records.iter() {
        builder
            .add_percentage(ListId(r.list), r.percentage, r.updated_at)
            .context(InvalidSnapshotSnafu {})?;
    }
    Ok(builder.build())
}

fn timestamp_js(ts: Option<DateTime<Utc>>) -> JSValue {
    match ts {
        Some(t) => json!(t.to_rfc3339_opts(SecondsFormat::Secs, true)),
        None => JSValue::Null,
    }
}

fn entry_js(e: &ResultEntry) -> JSValue {
    json!({
        "listId": e.list_id.map(|l| l.0),
        "code": e.code,
        "name": e.name,
        "alignment": e.alignment,
        "percentage": e.percentage_display,
        "share": fixed_two_decimals(e.share),
        "seats": e.seats,
        "passesThreshold": e.passes_threshold,
        "updatedAt": timestamp_js(e.updated_at),
    })
}

fn chamber_js(cr: &ChamberResult) -> JSValue {
    let lists: Vec<JSValue> = cr.entries.iter().map(entry_js).collect();
    json!({
        "seats": cr.seats,
        "lists": lists,
    })
}

fn district_js(r: &DistrictResult) -> JSValue {
    let d = &r.district;
    json!({
        "id": d.id.0,
        "name": d.name,
        "deputySeats": d.deputy_seats,
        "totalDeputies": d.total_deputies,
        "senateSeats": d.senate_seats,
        "totalSenators": d.total_senators,
        "registeredVoters": d.registered_voters,
        "latestUpdate": timestamp_js(r.latest_update),
        "deputies": chamber_js(&r.deputies),
        "senators": chamber_js(&r.senators),
    })
}

fn distribution_js(nd: &NationalDistribution) -> JSValue {
    let items: Vec<JSValue> = nd
        .items
        .iter()
        .map(|item| {
            json!({
                "alignment": item.alignment,
                "seats": item.seats,
                "share": fixed_two_decimals(item.share),
            })
        })
        .collect();
    json!({
        "chamber": nd.chamber.name(),
        "method": nd.method.label(),
        "items": items,
    })
}

fn status_js(s: &DistrictStatus) -> JSValue {
    json!({
        "id": s.id.0,
        "name": s.name,
        "hasDeputies": s.has_deputies,
        "hasSenators": s.has_senators,
        "deputySeats": s.deputy_seats,
        "senateSeats": s.senate_seats,
        "weightPercentage": s.weight_percentage.map(fixed_two_decimals),
    })
}

fn stats_js(stats: &DashboardStats) -> JSValue {
    json!({
        "districtsReported": stats.districts_reported,
        "deputySeatsInPlay": stats.deputy_seats_in_play,
        "senateSeatsInPlay": stats.senate_seats_in_play,
        "listsReported": stats.lists_reported,
        "latestUpdate": timestamp_js(stats.latest_update),
    })
}

fn build_summary_js(config: &OutputConfig, summary: &NationalSummary) -> JSValue {
    let national: Vec<JSValue> = summary.distributions.iter().map(distribution_js).collect();
    let districts: Vec<JSValue> = summary.districts.iter().map(district_js).collect();
    let statuses: Vec<JSValue> = summary.statuses.iter().map(status_js).collect();
    json!({
        "config": config,
        "stats": stats_js(&summary.stats),
        "national": national,
        "districts": districts,
        "districtStatuses": statuses,
    })
}

fn build_detail_js(config: &OutputConfig, detail: &DistrictDetail) -> JSValue {
    let lists: Vec<JSValue> = detail.entries.iter().map(entry_js).collect();
    json!({
        "config": config,
        "district": {
            "id": detail.district.id.0,
            "name": detail.district.name,
        },
        "chamber": detail.chamber.name(),
        "method": detail.method.label(),
        "threshold": detail.threshold.display(),
        "latestUpdate": timestamp_js(detail.latest_update),
        "lists": lists,
    })
}

fn write_output(out: Option<PathBuf>, pretty: &str) -> TallyResult<()> {
    match out {
        Some(p) if p.as_os_str() != "stdout" => {
            info!("Writing output to {:?}", p);
            let path = p.display().to_string();
            fs::write(&p, pretty).context(WritingOutputSnafu { path })?;
        }
        _ => {
            println!("{}", pretty);
        }
    }
    Ok(())
}

fn check_reference(summary_path: &str, pretty_js_summary: &str) -> TallyResult<()> {
    let summary_ref = read_summary(summary_path)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_summary {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_summary, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    Ok(())
}

/// A tabulated summary, and where it should be written (None for stdout).
#[derive(Debug, Clone)]
pub struct Report {
    pub summary: JSValue,
    pub out_path: Option<PathBuf>,
}

/// Reads the snapshot and tabulates it, without writing anything.
pub fn build_report(args: &Args) -> TallyResult<Report> {
    let config_path = args.config.clone();
    let config = read_config(&config_path)?;
    info!("config: {:?}", config.output_settings);

    let root_path = Path::new(&config_path)
        .parent()
        .context(MissingParentDirSnafu {
            path: config_path.clone(),
        })?;

    let rules = validate_rules(&config.rules, args.threshold.as_deref())?;
    let snapshot = build_snapshot(&config, root_path, args.percentages.as_deref())?;

    let result_js = match args.district {
        Some(district_id) => {
            let chamber = args
                .chamber
                .clone()
                .unwrap_or_else(|| Chamber::Deputies.name().to_string());
            let detail = district_detail(&snapshot, DistrictId(district_id), &chamber, &rules)
                .context(LookupSnafu {})?;
            let output_config = OutputConfig::new(&config.output_settings, &chamber, &rules);
            build_detail_js(&output_config, &detail)
        }
        None => {
            let filter = ChamberFilter::parse(args.chamber.as_deref().unwrap_or("both"));
            let summary = national_summary(&snapshot, filter, &rules);
            let output_config = OutputConfig::new(&config.output_settings, filter.name(), &rules);
            build_summary_js(&output_config, &summary)
        }
    };
    let out_path: Option<PathBuf> = match (&args.out, &config.output_settings.output_directory) {
        (Some(out), _) => Some(PathBuf::from(out)),
        (None, Some(dir)) => Some(resolve_path(root_path, dir).join(format!(
            "{}_summary.json",
            config.output_settings.report_name.replace(' ', "_")
        ))),
        (None, None) => None,
    };
    Ok(Report {
        summary: result_js,
        out_path,
    })
}

/// Main entry point for the binary: reads the snapshot, tabulates it and reports the result.
pub fn run_report(args: &Args) -> TallyResult<()> {
    let report = build_report(args)?;
    let pretty_js_summary =
        serde_json::to_string_pretty(&report.summary).context(ParsingJsonSnafu {})?;
    write_output(report.out_path, &pretty_js_summary)?;

    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &pretty_js_summary)?;
    }
    Ok(())
}
