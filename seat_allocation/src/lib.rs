/*!
Seat allocation for provisional legislative results.

For every district and chamber, this crate turns the reported vote percentages
into seats, closes the percentages to 100% with an "Others" entry, and
aggregates the results nationally by alignment, weighted by the registered
voters of each district.

* Deputies: D'Hondt method among the lists reaching the minimum threshold (3%).
* Senators: two seats for the first list, one seat for the second.

All the functions are pure: they take an immutable [Snapshot] (see
[builder::SnapshotBuilder]) and return plain values.

```
use chrono::Utc;
use rust_decimal::Decimal;
use seat_allocation::builder::{RawDistrict, SnapshotBuilder};
use seat_allocation::*;

let mut builder = SnapshotBuilder::new();
builder.add_district(&RawDistrict {
    id: DistrictId(1),
    name: "Distrito Test".to_string(),
    deputy_seats: 3,
    total_deputies: 6,
    senate_seats: 0,
    total_senators: 0,
    registered_voters: 100000,
})?;
for (id, name, pct) in [(1, "Lista A", 5000), (2, "Lista B", 3000), (3, "Lista C", 2000)] {
    builder.add_list(&ElectionList {
        id: ListId(id),
        district: DistrictId(1),
        chamber: Chamber::Deputies,
        order: id,
        code: format!("{:02}", id),
        name: name.to_string(),
        alignment: None,
    })?;
    builder.add_percentage(ListId(id), Decimal::new(pct, 2), Utc::now())?;
}
let snapshot = builder.build();

let summary = national_summary(&snapshot, ChamberFilter::Both, &SeatRules::DEFAULT_RULES);
let seats: Vec<u32> = summary.districts[0].deputies.entries.iter().map(|e| e.seats).collect();
assert_eq!(seats, vec![2, 1, 0]);
# Ok::<(), SeatErrors>(())
```
*/

mod allocation;
mod config;
mod district;
mod national;
mod reconcile;
#[cfg(test)]
mod testing;

pub mod builder;
pub mod manual;

pub use crate::allocation::{
    allocate, dhondt_allocation, senate_allocation, Allocation, VotesByList, FIRST_MINORITY_SEATS,
    MAJORITY_SEATS,
};
pub use crate::config::*;
pub use crate::district::{district_detail, sort_entries, tabulate_district};
pub use crate::national::{district_statuses, national_distribution, national_summary};
pub use crate::reconcile::reconcile;
