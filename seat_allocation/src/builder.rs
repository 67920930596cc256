use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::{debug, info};
use rust_decimal::Decimal;

pub use crate::config::*;

/// A district as read from outside, before its counts are checked.
///
/// Counts are signed so that a negative value is reported instead of wrapping.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawDistrict {
    pub id: DistrictId,
    pub name: String,
    pub deputy_seats: i64,
    pub total_deputies: i64,
    pub senate_seats: i64,
    pub total_senators: i64,
    pub registered_voters: i64,
}

/// A builder for assembling a validated [Snapshot].
///
/// ```
/// use chrono::Utc;
/// use rust_decimal::Decimal;
/// use seat_allocation::builder::{RawDistrict, SnapshotBuilder};
/// use seat_allocation::{Chamber, DistrictId, ElectionList, ListId, SeatErrors};
///
/// let mut builder = SnapshotBuilder::new();
/// builder.add_district(&RawDistrict {
///     id: DistrictId(1),
///     name: "Catamarca".to_string(),
///     deputy_seats: 2,
///     total_deputies: 5,
///     senate_seats: 0,
///     total_senators: 3,
///     registered_voters: 350000,
/// })?;
/// builder.add_list(&ElectionList {
///     id: ListId(10),
///     district: DistrictId(1),
///     chamber: Chamber::Deputies,
///     order: 1,
///     code: "501".to_string(),
///     name: "Frente Norte".to_string(),
///     alignment: None,
/// })?;
/// builder.add_percentage(ListId(10), Decimal::new(4512, 2), Utc::now())?;
/// let snapshot = builder.build();
/// assert_eq!(snapshot.districts().len(), 1);
///
/// # Ok::<(), SeatErrors>(())
/// ```
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    pub(crate) _districts: Vec<District>,
    pub(crate) _lists: Vec<ElectionList>,
    pub(crate) _current: HashMap<ListId, ReportedPercentage>,
}

impl SnapshotBuilder {
    pub fn new() -> SnapshotBuilder {
        SnapshotBuilder::default()
    }

    /// Adds a district. Negative seat or voter counts are rejected.
    pub fn add_district(&mut self, raw: &RawDistrict) -> Result<(), SeatErrors> {
        if self._districts.iter().any(|d| d.id == raw.id) {
            return Err(SeatErrors::DuplicateDistrict(raw.id));
        }
        let district = District {
            id: raw.id,
            name: raw.name.clone(),
            deputy_seats: checked_seats(&raw.name, raw.deputy_seats)?,
            total_deputies: checked_seats(&raw.name, raw.total_deputies)?,
            senate_seats: checked_seats(&raw.name, raw.senate_seats)?,
            total_senators: checked_seats(&raw.name, raw.total_senators)?,
            registered_voters: u64::try_from(raw.registered_voters).map_err(|_| {
                SeatErrors::NegativeVoters {
                    district: raw.name.clone(),
                    voters: raw.registered_voters,
                }
            })?,
        };
        debug!("add_district: {:?}", district);
        self._districts.push(district);
        Ok(())
    }

    /// Adds a list. Its district must be known, and its code must be unique for its
    /// district and chamber.
    pub fn add_list(&mut self, list: &ElectionList) -> Result<(), SeatErrors> {
        if !self._districts.iter().any(|d| d.id == list.district) {
            return Err(SeatErrors::UnknownDistrict(list.district));
        }
        if self._lists.iter().any(|l| l.id == list.id) {
            return Err(SeatErrors::DuplicateList(list.id));
        }
        if self._lists.iter().any(|l| {
            l.district == list.district && l.chamber == list.chamber && l.code == list.code
        }) {
            return Err(SeatErrors::DuplicateListCode {
                district: list.district,
                chamber: list.chamber,
                code: list.code.clone(),
            });
        }
        self._lists.push(list.clone());
        Ok(())
    }

    /// Records a reported percentage for a list.
    ///
    /// If the list already has one, the most recently updated record is kept (the last one
    /// added if both have the same timestamp).
    pub fn add_percentage(
        &mut self,
        list: ListId,
        value: Decimal,
        updated_at: DateTime<Utc>,
    ) -> Result<(), SeatErrors> {
        if !self._lists.iter().any(|l| l.id == list) {
            return Err(SeatErrors::UnknownList(list));
        }
        let percentage = Percentage::new(value)?;
        match self._current.get(&list) {
            Some(existing) if existing.updated_at > updated_at => {
                debug!(
                    "add_percentage: list {}: keeping {} (newer than {} at {})",
                    list, existing.percentage, percentage, updated_at
                );
            }
            _ => {
                self._current.insert(
                    list,
                    ReportedPercentage {
                        list,
                        percentage,
                        updated_at,
                    },
                );
            }
        }
        Ok(())
    }

    pub fn build(self) -> Snapshot {
        let mut districts = self._districts;
        districts.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        let mut lists = self._lists;
        lists.sort_by_key(|l| (l.district, l.chamber, l.order, l.code.clone()));
        info!(
            "Snapshot: {} districts, {} lists, {} reported percentages",
            districts.len(),
            lists.len(),
            self._current.len()
        );
        Snapshot {
            districts,
            lists,
            current: self._current,
        }
    }
}

fn checked_seats(district: &str, seats: i64) -> Result<u32, SeatErrors> {
    if seats < 0 {
        return Err(SeatErrors::NegativeSeats {
            district: district.to_string(),
            seats,
        });
    }
    u32::try_from(seats).map_err(|_| SeatErrors::SeatCountTooLarge {
        district: district.to_string(),
        seats,
    })
}
