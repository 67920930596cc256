// Snapshot construction helpers for the unit tests.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::builder::{RawDistrict, SnapshotBuilder};
use crate::config::*;

pub(crate) fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 26, hour, 0, 0).unwrap()
}

pub(crate) struct SnapshotFixture {
    builder: SnapshotBuilder,
}

impl SnapshotFixture {
    pub(crate) fn new() -> SnapshotFixture {
        let _ = env_logger::builder().is_test(true).try_init();
        SnapshotFixture {
            builder: SnapshotBuilder::new(),
        }
    }

    pub(crate) fn district(
        mut self,
        id: u32,
        name: &str,
        deputy_seats: i64,
        senate_seats: i64,
        registered_voters: i64,
    ) -> SnapshotFixture {
        self.builder
            .add_district(&RawDistrict {
                id: DistrictId(id),
                name: name.to_string(),
                deputy_seats,
                total_deputies: deputy_seats * 2,
                senate_seats,
                total_senators: senate_seats,
                registered_voters,
            })
            .unwrap();
        self
    }

    /// Adds a list whose ballot order is its id.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn list(
        mut self,
        id: u32,
        district: u32,
        chamber: Chamber,
        name: &str,
        alignment: Option<&str>,
        hundredths: i64,
        updated_at: DateTime<Utc>,
    ) -> SnapshotFixture {
        self = self.list_without_percentage_aligned(id, district, chamber, name, alignment);
        self.builder
            .add_percentage(ListId(id), Decimal::new(hundredths, 2), updated_at)
            .unwrap();
        self
    }

    pub(crate) fn list_without_percentage(
        self,
        id: u32,
        district: u32,
        chamber: Chamber,
        name: &str,
    ) -> SnapshotFixture {
        self.list_without_percentage_aligned(id, district, chamber, name, None)
    }

    fn list_without_percentage_aligned(
        mut self,
        id: u32,
        district: u32,
        chamber: Chamber,
        name: &str,
        alignment: Option<&str>,
    ) -> SnapshotFixture {
        self.builder
            .add_list(&ElectionList {
                id: ListId(id),
                district: DistrictId(district),
                chamber,
                order: id,
                code: format!("L{:03}", id),
                name: name.to_string(),
                alignment: alignment.map(str::to_string),
            })
            .unwrap();
        self
    }

    pub(crate) fn build(self) -> Snapshot {
        self.builder.build()
    }
}
