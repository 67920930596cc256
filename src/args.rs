use clap::Parser;

/// Seat tabulation program for provisional legislative results.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON snapshot with the districts, the lists and their reported percentages.
    /// For more information about the file format, read the documentation of the `manual` module.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (file path, optional) A CSV file with more percentage records (list_id,percentage,updated_at).
    /// When a list has several records, the most recent one is used.
    #[clap(short, long, value_parser)]
    pub percentages: Option<String>,

    /// (both, deputies or senators; default both) The chamber to report. With --district,
    /// the chamber of the detail view (default deputies).
    #[clap(long, value_parser)]
    pub chamber: Option<String>,

    /// (district id, optional) If specified, only the detail of this district is reported,
    /// with every list shown individually.
    #[clap(short, long, value_parser)]
    pub district: Option<u32>,

    /// (percentage, optional) Overrides the minimum threshold for deputies lists.
    #[clap(long, value_parser)]
    pub threshold: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the given
    /// location. Setting this option overrides the outputDirectory that may be specified in the snapshot.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing a summary in JSON format. If provided, seattab will
    /// check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
