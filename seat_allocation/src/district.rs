use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::allocation::{allocate, dhondt_allocation, senate_allocation, Allocation, VotesByList};
use crate::config::*;
use crate::reconcile::reconcile;

// A list of the district together with its current percentage.
type Reported<'a> = (&'a ElectionList, &'a ReportedPercentage);

fn reported_lists(
    snapshot: &Snapshot,
    district: DistrictId,
    chamber: Chamber,
) -> Vec<Reported<'_>> {
    snapshot
        .lists_of(district, chamber)
        .filter_map(|l| snapshot.current_percentage(l.id).map(|rp| (l, rp)))
        .collect()
}

fn latest<'a>(reported: impl Iterator<Item = &'a Reported<'a>>) -> Option<DateTime<Utc>> {
    reported.map(|(_, rp)| rp.updated_at).max()
}

fn passes_threshold(chamber: Chamber, percentage: Percentage, rules: &SeatRules) -> bool {
    match chamber {
        Chamber::Deputies => percentage >= rules.minimum_threshold,
        Chamber::Senators => true,
    }
}

fn seated_entry(
    (list, reported): &Reported,
    allocation: &Allocation,
    passes_threshold: bool,
) -> ResultEntry {
    let mut entry = ResultEntry::from_list(list, reported, passes_threshold);
    entry.seats = allocation.get(&list.id).copied().unwrap_or(0);
    entry
}

/// The deputies lists below the threshold, accumulated into a single amount.
#[derive(Debug, Default)]
struct MinorLists {
    total: Percentage,
    latest_update: Option<DateTime<Utc>>,
}

impl MinorLists {
    fn fold(self, reported: &ReportedPercentage) -> MinorLists {
        MinorLists {
            total: self.total + reported.percentage,
            latest_update: self.latest_update.max(Some(reported.updated_at)),
        }
    }
}

/// Computes the seats and the reconciled percentages of both chambers of a district.
pub fn tabulate_district(
    snapshot: &Snapshot,
    district: &District,
    rules: &SeatRules,
) -> DistrictResult {
    let deputies_reported = reported_lists(snapshot, district.id, Chamber::Deputies);
    let senators_reported = reported_lists(snapshot, district.id, Chamber::Senators);
    let latest_update = latest(deputies_reported.iter().chain(senators_reported.iter()));

    let deputies = tabulate_deputies(
        &deputies_reported,
        district.deputy_seats,
        latest_update,
        rules,
    );
    let senators = tabulate_senators(
        &senators_reported,
        district.senate_seats,
        latest_update,
        rules,
    );
    info!(
        "District {}: {} deputies entries, {} senators entries",
        district.name,
        deputies.entries.len(),
        senators.entries.len()
    );

    DistrictResult {
        district: district.clone(),
        deputies,
        senators,
        latest_update,
    }
}

fn tabulate_deputies(
    reported: &[Reported],
    seats: u32,
    district_latest: Option<DateTime<Utc>>,
    rules: &SeatRules,
) -> ChamberResult {
    let (eligible, minor): (Vec<&Reported>, Vec<&Reported>) = reported
        .iter()
        .partition(|(_, rp)| passes_threshold(Chamber::Deputies, rp.percentage, rules));

    let votes: VotesByList = eligible
        .iter()
        .map(|(l, rp)| (l.id, rp.percentage))
        .collect();
    let allocation = dhondt_allocation(&votes, seats);

    let mut entries: Vec<ResultEntry> = eligible
        .iter()
        .map(|r| seated_entry(r, &allocation, true))
        .collect();

    let minor = minor
        .iter()
        .fold(MinorLists::default(), |acc, (_, rp)| acc.fold(rp));
    if minor.total.is_positive() {
        debug!("tabulate_deputies: {} below threshold: {:?}", OTHERS, minor);
        entries.push(ResultEntry::others(
            minor.total,
            minor.latest_update.or(district_latest),
        ));
    }

    finish(Chamber::Deputies, seats, entries, district_latest, rules)
}

fn tabulate_senators(
    reported: &[Reported],
    seats: u32,
    district_latest: Option<DateTime<Utc>>,
    rules: &SeatRules,
) -> ChamberResult {
    let votes: VotesByList = reported
        .iter()
        .map(|(l, rp)| (l.id, rp.percentage))
        .collect();
    let allocation = senate_allocation(&votes, seats);
    let entries: Vec<ResultEntry> = reported
        .iter()
        .map(|r| seated_entry(r, &allocation, true))
        .collect();
    finish(Chamber::Senators, seats, entries, district_latest, rules)
}

fn finish(
    chamber: Chamber,
    seats: u32,
    mut entries: Vec<ResultEntry>,
    latest_update: Option<DateTime<Utc>>,
    rules: &SeatRules,
) -> ChamberResult {
    reconcile(&mut entries, latest_update, rules);
    sort_entries(&mut entries);
    ChamberResult {
        chamber,
        seats,
        entries,
    }
}

/// Most seats first, then highest percentage, then by name.
pub fn sort_entries(entries: &mut [ResultEntry]) {
    entries.sort_by(|a, b| {
        b.seats
            .cmp(&a.seats)
            .then(b.percentage.cmp(&a.percentage))
            .then(a.name.cmp(&b.name))
    });
}

/// Every list of one district and chamber, shown individually.
///
/// Unlike [tabulate_district], the deputies lists below the threshold are not folded into
/// "Others": they are listed with `passes_threshold = false` and no seats. Lists are ordered
/// by percentage, then by ballot order.
pub fn district_detail(
    snapshot: &Snapshot,
    district_id: DistrictId,
    chamber_name: &str,
    rules: &SeatRules,
) -> Result<DistrictDetail, SeatErrors> {
    let district = snapshot
        .district(district_id)
        .ok_or(SeatErrors::DistrictNotFound(district_id))?;
    let chamber = Chamber::parse(chamber_name)?;
    let method = chamber.method();

    let mut reported = reported_lists(snapshot, district.id, chamber);
    let latest_update = latest(reported.iter());

    let votes: VotesByList = reported
        .iter()
        .filter(|(_, rp)| passes_threshold(chamber, rp.percentage, rules))
        .map(|(l, rp)| (l.id, rp.percentage))
        .collect();
    let allocation = allocate(method, &votes, district.seats_in_play(chamber));

    reported.sort_by(|(la, ra), (lb, rb)| {
        rb.percentage
            .cmp(&ra.percentage)
            .then(la.order.cmp(&lb.order))
    });
    let mut entries: Vec<ResultEntry> = reported
        .iter()
        .map(|r| seated_entry(r, &allocation, passes_threshold(chamber, r.1.percentage, rules)))
        .collect();
    reconcile(&mut entries, latest_update, rules);

    Ok(DistrictDetail {
        district: district.clone(),
        chamber,
        method,
        threshold: rules.minimum_threshold,
        entries,
        latest_update,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn tabulate_first(snapshot: &Snapshot) -> DistrictResult {
        tabulate_district(snapshot, &snapshot.districts()[0], &SeatRules::DEFAULT_RULES)
    }

    fn detail_of(snapshot: &Snapshot, district: u32, chamber: &str) -> DistrictDetail {
        district_detail(snapshot, DistrictId(district), chamber, &SeatRules::DEFAULT_RULES).unwrap()
    }

    fn names_and_seats(result: &ChamberResult) -> Vec<(String, u32)> {
        result
            .entries
            .iter()
            .map(|e| (e.name.clone(), e.seats))
            .collect()
    }

    #[test]
    fn deputies_dhondt() {
        let snapshot = SnapshotFixture::new()
            .district(1, "Distrito Test", 3, 0, 100000)
            .list(1, 1, Chamber::Deputies, "Lista A", Some("Alianza A"), 5000, at(20))
            .list(2, 1, Chamber::Deputies, "Lista B", Some("Alianza B"), 3000, at(21))
            .list(3, 1, Chamber::Deputies, "Lista C", None, 2000, at(19))
            .build();
        let result = tabulate_first(&snapshot);
        assert_eq!(
            names_and_seats(&result.deputies),
            vec![
                ("Lista A".to_string(), 2),
                ("Lista B".to_string(), 1),
                ("Lista C".to_string(), 0)
            ]
        );
        assert_eq!(result.deputies.entries[2].alignment, "Lista C");
        assert!(result.deputies.has_data());
        assert!(!result.senators.has_data());
        assert_eq!(result.latest_update, Some(at(21)));
    }

    #[test]
    fn minor_lists_become_others() {
        let snapshot = SnapshotFixture::new()
            .district(1, "Distrito Umbral", 3, 0, 80000)
            .list(1, 1, Chamber::Deputies, "Mayoritaria", None, 9400, at(20))
            .list(2, 1, Chamber::Deputies, "Minoritaria", None, 250, at(21))
            .build();
        let result = tabulate_first(&snapshot);
        let entries = &result.deputies.entries;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Mayoritaria");
        assert_eq!(entries[0].seats, 3);
        assert!(entries[1].is_others());
        assert_eq!(entries[1].seats, 0);
        assert_eq!(entries[1].percentage_display, "6.00");
        assert_eq!(entries[1].updated_at, Some(at(21)));
        assert!(!entries.iter().any(|e| e.name == "Minoritaria"));
    }

    #[test]
    fn minor_lists_are_folded_once() {
        let snapshot = SnapshotFixture::new()
            .district(1, "Distrito", 2, 0, 1000)
            .list(1, 1, Chamber::Deputies, "A", None, 6000, at(18))
            .list(2, 1, Chamber::Deputies, "B", None, 3000, at(18))
            .list(3, 1, Chamber::Deputies, "C", None, 120, at(22))
            .list(4, 1, Chamber::Deputies, "D", None, 299, at(19))
            .build();
        let result = tabulate_first(&snapshot);
        let others: Vec<&ResultEntry> = result
            .deputies
            .entries
            .iter()
            .filter(|e| e.is_others())
            .collect();
        assert_eq!(others.len(), 1);
        // 1.20 + 2.99, then the missing 5.81 to reach 100.
        assert_eq!(others[0].percentage, Percentage::from_hundredths(1000));
        assert_eq!(others[0].updated_at, Some(at(22)));
        let total: Percentage = result.deputies.entries.iter().map(|e| e.percentage).sum();
        assert_eq!(total, Percentage::from_hundredths(10000));
    }

    #[test]
    fn threshold_comes_from_rules() {
        let snapshot = SnapshotFixture::new()
            .district(1, "Distrito", 3, 0, 1000)
            .list(1, 1, Chamber::Deputies, "A", None, 9400, at(20))
            .list(2, 1, Chamber::Deputies, "B", None, 250, at(20))
            .build();
        let rules = SeatRules {
            minimum_threshold: Percentage::from_hundredths(200),
            ..SeatRules::DEFAULT_RULES
        };
        let result = tabulate_district(&snapshot, &snapshot.districts()[0], &rules);
        assert!(result.deputies.entries.iter().any(|e| e.name == "B"));
    }

    #[test]
    fn senate_lists_are_all_shown() {
        let snapshot = SnapshotFixture::new()
            .district(1, "Distrito Senado", 0, 3, 50000)
            .list(1, 1, Chamber::Senators, "S1", None, 5500, at(20))
            .list(2, 1, Chamber::Senators, "S2", None, 3500, at(20))
            .list(3, 1, Chamber::Senators, "S3", None, 100, at(20))
            .build();
        let result = tabulate_first(&snapshot);
        assert_eq!(
            names_and_seats(&result.senators),
            vec![
                ("S1".to_string(), 2),
                ("S2".to_string(), 1),
                ("Others".to_string(), 0),
                ("S3".to_string(), 0)
            ]
        );
        assert!(!result.deputies.has_data());
    }

    #[test]
    fn ties_are_ordered_by_name() {
        let snapshot = SnapshotFixture::new()
            .district(1, "Distrito", 0, 0, 1000)
            .list(1, 1, Chamber::Deputies, "Zeta", None, 5000, at(20))
            .list(2, 1, Chamber::Deputies, "Alfa", None, 5000, at(20))
            .build();
        let result = tabulate_first(&snapshot);
        assert_eq!(result.deputies.entries[0].name, "Alfa");
        assert_eq!(result.deputies.entries[1].name, "Zeta");
    }

    #[test]
    fn lists_without_percentage_are_skipped() {
        let snapshot = SnapshotFixture::new()
            .district(1, "Distrito", 3, 0, 1000)
            .list(1, 1, Chamber::Deputies, "A", None, 6000, at(20))
            .list_without_percentage(2, 1, Chamber::Deputies, "B")
            .build();
        let result = tabulate_first(&snapshot);
        assert!(!result.deputies.entries.iter().any(|e| e.name == "B"));
        assert_eq!(result.deputies.entries[0].seats, 3);
    }

    #[test]
    fn detail_shows_minor_lists() {
        let snapshot = SnapshotFixture::new()
            .district(7, "Distrito Umbral", 3, 0, 80000)
            .list(1, 7, Chamber::Deputies, "Mayoritaria", None, 9400, at(20))
            .list(2, 7, Chamber::Deputies, "Minoritaria", None, 250, at(21))
            .build();
        let detail = detail_of(&snapshot, 7, "deputies");
        assert_eq!(detail.method, AllocationMethod::DHondt);
        assert_eq!(detail.latest_update, Some(at(21)));
        assert_eq!(detail.entries.len(), 3);
        assert_eq!(detail.entries[0].seats, 3);
        assert_eq!(detail.entries[1].name, "Minoritaria");
        assert!(!detail.entries[1].passes_threshold);
        assert_eq!(detail.entries[1].seats, 0);
        assert!(detail.entries[2].is_others());
        assert_eq!(detail.entries[2].percentage_display, "3.50");
    }

    #[test]
    fn detail_orders_by_percentage_then_ballot_order() {
        let snapshot = SnapshotFixture::new()
            .district(1, "Distrito Senado", 0, 3, 1000)
            .list(5, 1, Chamber::Senators, "B", None, 4000, at(20))
            .list(3, 1, Chamber::Senators, "A", None, 2000, at(20))
            .list(4, 1, Chamber::Senators, "C", None, 4000, at(20))
            .build();
        let detail = detail_of(&snapshot, 1, "senators");
        let names: Vec<&str> = detail.entries.iter().map(|e| e.name.as_str()).collect();
        // The fixture uses the list id as ballot order.
        assert_eq!(names, vec!["C", "B", "A"]);
        assert_eq!(detail.entries[0].seats, 2);
        assert_eq!(detail.entries[1].seats, 1);
        assert!(detail.entries.iter().all(|e| e.passes_threshold));
    }

    #[test]
    fn detail_lookup_errors() {
        let snapshot = SnapshotFixture::new()
            .district(1, "Distrito", 3, 0, 1000)
            .build();
        assert_eq!(
            district_detail(&snapshot, DistrictId(2), "deputies", &SeatRules::DEFAULT_RULES),
            Err(SeatErrors::DistrictNotFound(DistrictId(2)))
        );
        assert_eq!(
            district_detail(&snapshot, DistrictId(1), "governors", &SeatRules::DEFAULT_RULES),
            Err(SeatErrors::UnknownChamber("governors".to_string()))
        );
        let empty = detail_of(&snapshot, 1, "deputies");
        assert!(empty.entries.is_empty());
    }
}
