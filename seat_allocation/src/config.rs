// ********* Input data structures ***********

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// A vote percentage, in the [0, 100] range, with two decimal places.
///
/// This is the only numeric type used for percentages in the public API.
/// Values coming from outside are checked once, with [Percentage::new].
/// Intermediate values (sums, remainders) are not range-checked.
#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash, Default)]
pub struct Percentage(Decimal);

impl Percentage {
    pub const ZERO: Percentage = Percentage(Decimal::ZERO);

    /// Builds a percentage from a number of hundredths: `from_hundredths(250)` is 2.50%.
    pub const fn from_hundredths(hundredths: u32) -> Percentage {
        Percentage(Decimal::from_parts(hundredths, 0, 0, false, 2))
    }

    /// Validates a reported value. It must lie in [0, 100] and is rounded to two decimals.
    pub fn new(value: Decimal) -> Result<Percentage, SeatErrors> {
        if (value.is_sign_negative() && !value.is_zero()) || value > Decimal::ONE_HUNDRED {
            return Err(SeatErrors::PercentageOutOfRange(value.to_string()));
        }
        Ok(Percentage(value.round_dp_with_strategy(
            2,
            RoundingStrategy::MidpointNearestEven,
        )))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// The fixed two-decimal rendering, e.g. `6.00`.
    pub fn display(&self) -> String {
        fixed_two_decimals(self.0)
    }
}

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl Add for Percentage {
    type Output = Percentage;
    fn add(self, rhs: Percentage) -> Percentage {
        Percentage(self.0 + rhs.0)
    }
}

impl Sub for Percentage {
    type Output = Percentage;
    fn sub(self, rhs: Percentage) -> Percentage {
        Percentage(self.0 - rhs.0)
    }
}

impl AddAssign for Percentage {
    fn add_assign(&mut self, rhs: Percentage) {
        self.0 += rhs.0;
    }
}

impl Sum for Percentage {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Percentage(iter.map(|p| p.0).sum())
    }
}

impl<'a> Sum<&'a Percentage> for Percentage {
    fn sum<I: Iterator<Item = &'a Percentage>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Renders a decimal with exactly two decimals (banker's rounding).
pub fn fixed_two_decimals(value: Decimal) -> String {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(2);
    rounded.to_string()
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct DistrictId(pub u32);

impl Display for DistrictId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct ListId(pub u32);

impl Display for ListId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two legislative bodies.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Chamber {
    Deputies,
    Senators,
}

impl Chamber {
    pub const ALL: [Chamber; 2] = [Chamber::Deputies, Chamber::Senators];

    /// Looks up a chamber by its name (`deputies` or `senators`, case insensitive).
    pub fn parse(name: &str) -> Result<Chamber, SeatErrors> {
        match name.trim().to_lowercase().as_str() {
            "deputies" => Ok(Chamber::Deputies),
            "senators" => Ok(Chamber::Senators),
            _ => Err(SeatErrors::UnknownChamber(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Chamber::Deputies => "deputies",
            Chamber::Senators => "senators",
        }
    }

    pub fn method(&self) -> AllocationMethod {
        match self {
            Chamber::Deputies => AllocationMethod::DHondt,
            Chamber::Senators => AllocationMethod::MajorityMinority,
        }
    }
}

/// The electoral formula used to turn percentages into seats.
///
/// - DHondt: highest averages among the lists reaching the minimum threshold.
/// - MajorityMinority: two seats for the first list, one for the runner-up.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum AllocationMethod {
    DHondt,
    MajorityMinority,
}

impl AllocationMethod {
    pub fn label(&self) -> &'static str {
        match self {
            AllocationMethod::DHondt => "D'Hondt method",
            AllocationMethod::MajorityMinority => "Majority 2 + first minority 1",
        }
    }
}

/// Restricts a national summary to one chamber or shows both.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ChamberFilter {
    Both,
    Deputies,
    Senators,
}

impl ChamberFilter {
    /// Unknown values are not an error: they fall back to [ChamberFilter::Both].
    pub fn parse(name: &str) -> ChamberFilter {
        match name.trim().to_lowercase().as_str() {
            "both" => ChamberFilter::Both,
            "deputies" => ChamberFilter::Deputies,
            "senators" => ChamberFilter::Senators,
            other => {
                log::warn!("Unknown chamber filter {:?}, showing both chambers", other);
                ChamberFilter::Both
            }
        }
    }

    pub fn includes(&self, chamber: Chamber) -> bool {
        matches!(
            (self, chamber),
            (ChamberFilter::Both, _)
                | (ChamberFilter::Deputies, Chamber::Deputies)
                | (ChamberFilter::Senators, Chamber::Senators)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChamberFilter::Both => "both",
            ChamberFilter::Deputies => "deputies",
            ChamberFilter::Senators => "senators",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct District {
    pub id: DistrictId,
    pub name: String,
    /// Deputy seats renewed in this election.
    pub deputy_seats: u32,
    pub total_deputies: u32,
    /// Senate seats renewed in this election.
    pub senate_seats: u32,
    pub total_senators: u32,
    pub registered_voters: u64,
}

impl District {
    pub fn seats_in_play(&self, chamber: Chamber) -> u32 {
        match chamber {
            Chamber::Deputies => self.deputy_seats,
            Chamber::Senators => self.senate_seats,
        }
    }
}

/// A ballot line presented by a party or alliance in one district, for one chamber.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionList {
    pub id: ListId,
    pub district: DistrictId,
    pub chamber: Chamber,
    /// Position on the ballot.
    pub order: u32,
    pub code: String,
    pub name: String,
    /// The national grouping this list belongs to.
    pub alignment: Option<String>,
}

impl ElectionList {
    /// The national alignment, or the name of the list when none is given.
    pub fn alignment_label(&self) -> String {
        match self.alignment.as_deref().map(str::trim) {
            Some(a) if !a.is_empty() => a.to_string(),
            _ => self.name.clone(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ReportedPercentage {
    pub list: ListId,
    pub percentage: Percentage,
    pub updated_at: DateTime<Utc>,
}

/// An immutable, validated view of the districts, the lists and their current percentage.
///
/// Build it with [crate::builder::SnapshotBuilder].
#[derive(PartialEq, Debug, Clone)]
pub struct Snapshot {
    // Sorted by name.
    pub(crate) districts: Vec<District>,
    // Sorted by (district, chamber, order, code).
    pub(crate) lists: Vec<ElectionList>,
    pub(crate) current: HashMap<ListId, ReportedPercentage>,
}

impl Snapshot {
    pub fn districts(&self) -> &[District] {
        &self.districts
    }

    pub fn district(&self, id: DistrictId) -> Option<&District> {
        self.districts.iter().find(|d| d.id == id)
    }

    pub fn lists(&self) -> &[ElectionList] {
        &self.lists
    }

    /// The lists of a district for one chamber, in ballot order.
    pub fn lists_of(
        &self,
        district: DistrictId,
        chamber: Chamber,
    ) -> impl Iterator<Item = &ElectionList> {
        self.lists
            .iter()
            .filter(move |l| l.district == district && l.chamber == chamber)
    }

    pub fn current_percentage(&self, list: ListId) -> Option<&ReportedPercentage> {
        self.current.get(&list)
    }

    /// The most recent update among all the current percentages.
    pub fn latest_update(&self) -> Option<DateTime<Utc>> {
        self.current.values().map(|rp| rp.updated_at).max()
    }
}

// ******** Output data structures *********

/// The name given to the synthetic entry that gathers unlisted or sub-threshold votes.
pub const OTHERS: &str = "Others";

/// One line of a per-district, per-chamber result.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResultEntry {
    /// None for the synthetic "Others" entry.
    pub list_id: Option<ListId>,
    pub code: String,
    pub name: String,
    pub alignment: String,
    pub percentage: Percentage,
    pub percentage_display: String,
    /// The percentage relative to the reconciled total, on a 0-100 scale.
    pub share: Decimal,
    pub seats: u32,
    pub passes_threshold: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ResultEntry {
    pub(crate) fn from_list(
        list: &ElectionList,
        reported: &ReportedPercentage,
        passes_threshold: bool,
    ) -> ResultEntry {
        ResultEntry {
            list_id: Some(list.id),
            code: if list.code.is_empty() {
                "-".to_string()
            } else {
                list.code.clone()
            },
            name: list.name.clone(),
            alignment: list.alignment_label(),
            percentage: reported.percentage,
            percentage_display: reported.percentage.display(),
            share: Decimal::ZERO,
            seats: 0,
            passes_threshold,
            updated_at: Some(reported.updated_at),
        }
    }

    pub fn others(percentage: Percentage, updated_at: Option<DateTime<Utc>>) -> ResultEntry {
        ResultEntry {
            list_id: None,
            code: "-".to_string(),
            name: OTHERS.to_string(),
            alignment: OTHERS.to_string(),
            percentage,
            percentage_display: percentage.display(),
            share: Decimal::ZERO,
            seats: 0,
            passes_threshold: false,
            updated_at,
        }
    }

    pub fn is_others(&self) -> bool {
        self.list_id.is_none() && self.name == OTHERS
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ChamberResult {
    pub chamber: Chamber,
    /// Seats in play in this district for this chamber.
    pub seats: u32,
    /// Ordered by seats, then percentage (both descending), then name.
    pub entries: Vec<ResultEntry>,
}

impl ChamberResult {
    pub fn has_data(&self) -> bool {
        !self.entries.is_empty()
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DistrictResult {
    pub district: District,
    pub deputies: ChamberResult,
    pub senators: ChamberResult,
    pub latest_update: Option<DateTime<Utc>>,
}

impl DistrictResult {
    pub fn chamber(&self, chamber: Chamber) -> &ChamberResult {
        match chamber {
            Chamber::Deputies => &self.deputies,
            Chamber::Senators => &self.senators,
        }
    }
}

/// All the lists of one district and chamber, shown individually.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DistrictDetail {
    pub district: District,
    pub chamber: Chamber,
    pub method: AllocationMethod,
    pub threshold: Percentage,
    pub entries: Vec<ResultEntry>,
    pub latest_update: Option<DateTime<Utc>>,
}

/// Totals for one alignment, across all the districts.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AggregateEntry {
    pub alignment: String,
    pub seats: u32,
    /// Sum of percentage x registered voters.
    pub weighted_votes: Decimal,
    /// National average percentage, on a 0-100 scale.
    pub share: Decimal,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct NationalDistribution {
    pub chamber: Chamber,
    pub method: AllocationMethod,
    pub items: Vec<AggregateEntry>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DistrictStatus {
    pub id: DistrictId,
    pub name: String,
    pub has_deputies: bool,
    pub has_senators: bool,
    pub deputy_seats: u32,
    pub senate_seats: u32,
    /// Share of the national registered voters, on a 0-100 scale.
    pub weight_percentage: Option<Decimal>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DashboardStats {
    pub districts_reported: usize,
    pub deputy_seats_in_play: u32,
    pub senate_seats_in_play: u32,
    pub lists_reported: usize,
    pub latest_update: Option<DateTime<Utc>>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct NationalSummary {
    pub filter: ChamberFilter,
    pub stats: DashboardStats,
    pub distributions: Vec<NationalDistribution>,
    /// The districts with data for at least one of the chambers in the filter.
    pub districts: Vec<DistrictResult>,
    /// Every district of the snapshot, whatever the filter.
    pub statuses: Vec<DistrictStatus>,
}

/// Errors raised on invalid input. Degenerate inputs (no votes, no seats) are not errors.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SeatErrors {
    NegativeSeats { district: String, seats: i64 },
    SeatCountTooLarge { district: String, seats: i64 },
    NegativeVoters { district: String, voters: i64 },
    PercentageOutOfRange(String),
    DuplicateDistrict(DistrictId),
    DuplicateList(ListId),
    DuplicateListCode {
        district: DistrictId,
        chamber: Chamber,
        code: String,
    },
    UnknownDistrict(DistrictId),
    UnknownList(ListId),
    UnknownChamber(String),
    DistrictNotFound(DistrictId),
}

impl Error for SeatErrors {}

impl Display for SeatErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeatErrors::NegativeSeats { district, seats } => {
                write!(f, "district {}: negative seat count {}", district, seats)
            }
            SeatErrors::SeatCountTooLarge { district, seats } => {
                write!(f, "district {}: seat count {} is too large", district, seats)
            }
            SeatErrors::NegativeVoters { district, voters } => {
                write!(f, "district {}: negative registered voters {}", district, voters)
            }
            SeatErrors::PercentageOutOfRange(v) => {
                write!(f, "percentage {} is outside of [0, 100]", v)
            }
            SeatErrors::DuplicateDistrict(id) => write!(f, "district {} defined twice", id),
            SeatErrors::DuplicateList(id) => write!(f, "list {} defined twice", id),
            SeatErrors::DuplicateListCode {
                district,
                chamber,
                code,
            } => write!(
                f,
                "list code {:?} used twice in district {} for {}",
                code,
                district,
                chamber.name()
            ),
            SeatErrors::UnknownDistrict(id) => write!(f, "unknown district {}", id),
            SeatErrors::UnknownList(id) => write!(f, "unknown list {}", id),
            SeatErrors::UnknownChamber(name) => write!(f, "chamber not found: {:?}", name),
            SeatErrors::DistrictNotFound(id) => write!(f, "district not found: {}", id),
        }
    }
}

// ********* Configuration **********

/// The constants that govern the tabulation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SeatRules {
    /// Minimum percentage for a deputies list to take part in the D'Hondt allocation.
    pub minimum_threshold: Percentage,
    /// Missing percentage below which no "Others" entry is added.
    pub tolerance: Percentage,
    pub total: Percentage,
}

impl SeatRules {
    pub const DEFAULT_RULES: SeatRules = SeatRules {
        minimum_threshold: Percentage::from_hundredths(300),
        tolerance: Percentage::from_hundredths(1),
        total: Percentage::from_hundredths(10000),
    };
}

impl Default for SeatRules {
    fn default() -> Self {
        SeatRules::DEFAULT_RULES
    }
}
