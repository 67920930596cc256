use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use log::{debug, info};
use rust_decimal::Decimal;

use crate::config::*;
use crate::district::tabulate_district;

/// Seats and voter-weighted vote share of every alignment, for one chamber.
///
/// Seats are summed over all the districts. The vote share is the average of the district
/// percentages weighted by registered voters, over the districts that have data for this
/// chamber and a positive number of voters. It is 0 when no such district exists.
///
/// Alignments are ordered by seats, then weighted votes (both descending), then by name.
pub fn national_distribution(
    results: &[DistrictResult],
    chamber: Chamber,
) -> Vec<AggregateEntry> {
    let mut seats: HashMap<String, u32> = HashMap::new();
    let mut weighted_votes: HashMap<String, Decimal> = HashMap::new();
    let mut electors = Decimal::ZERO;

    for result in results {
        let chamber_result = result.chamber(chamber);
        for entry in chamber_result.entries.iter() {
            *seats.entry(entry.alignment.clone()).or_insert(0) += entry.seats;
        }
        let voters = result.district.registered_voters;
        if chamber_result.has_data() && voters > 0 {
            let voter_base = Decimal::from(voters);
            electors += voter_base;
            for entry in chamber_result.entries.iter() {
                *weighted_votes
                    .entry(entry.alignment.clone())
                    .or_insert(Decimal::ZERO) += entry.percentage.value() * voter_base;
            }
        }
    }
    debug!(
        "national_distribution: {}: {} electors, seats: {:?}",
        chamber.name(),
        electors,
        seats
    );

    let alignments: BTreeSet<&String> = seats.keys().chain(weighted_votes.keys()).collect();
    let mut items: Vec<AggregateEntry> = alignments
        .into_iter()
        .map(|alignment| {
            let weighted = weighted_votes
                .get(alignment)
                .copied()
                .unwrap_or(Decimal::ZERO);
            AggregateEntry {
                alignment: alignment.clone(),
                seats: seats.get(alignment).copied().unwrap_or(0),
                weighted_votes: weighted,
                share: if electors.is_zero() {
                    Decimal::ZERO
                } else {
                    weighted / electors
                },
            }
        })
        .collect();
    items.sort_by(|a, b| {
        b.seats
            .cmp(&a.seats)
            .then(b.weighted_votes.cmp(&a.weighted_votes))
            .then(a.alignment.cmp(&b.alignment))
    });
    items
}

/// Which chambers each district reported, and its weight in the national electorate.
pub fn district_statuses(results: &[DistrictResult]) -> Vec<DistrictStatus> {
    let registered_total: Decimal = results
        .iter()
        .map(|r| Decimal::from(r.district.registered_voters))
        .sum();
    results
        .iter()
        .map(|r| {
            let voters = Decimal::from(r.district.registered_voters);
            DistrictStatus {
                id: r.district.id,
                name: r.district.name.clone(),
                has_deputies: r.deputies.has_data(),
                has_senators: r.senators.has_data(),
                deputy_seats: r.district.deputy_seats,
                senate_seats: r.district.senate_seats,
                weight_percentage: if voters.is_zero() || registered_total.is_zero() {
                    None
                } else {
                    Some(voters / registered_total * Decimal::ONE_HUNDRED)
                },
            }
        })
        .collect()
}

fn is_shown(result: &DistrictResult, filter: ChamberFilter) -> bool {
    Chamber::ALL
        .iter()
        .any(|c| filter.includes(*c) && result.chamber(*c).has_data())
}

fn dashboard_stats(
    results: &[DistrictResult],
    filter: ChamberFilter,
    latest_update: Option<DateTime<Utc>>,
) -> DashboardStats {
    let seats_in_play = |chamber: Chamber| -> u32 {
        results
            .iter()
            .filter(|r| r.chamber(chamber).has_data())
            .map(|r| r.district.seats_in_play(chamber))
            .sum()
    };
    let lists_reported: usize = results
        .iter()
        .flat_map(|r| Chamber::ALL.into_iter().map(move |c| r.chamber(c)))
        .filter(|cr| filter.includes(cr.chamber))
        .map(|cr| cr.entries.len())
        .sum();
    DashboardStats {
        districts_reported: results.iter().filter(|r| is_shown(r, filter)).count(),
        deputy_seats_in_play: seats_in_play(Chamber::Deputies),
        senate_seats_in_play: seats_in_play(Chamber::Senators),
        lists_reported,
        latest_update,
    }
}

/// Tabulates every district of the snapshot and aggregates the results nationally.
///
/// The filter selects the chambers of the national distributions, the districts that are
/// shown (those with data for a selected chamber) and the lists that are counted. The
/// statuses cover all the districts. A chamber without any entry has no distribution.
pub fn national_summary(
    snapshot: &Snapshot,
    filter: ChamberFilter,
    rules: &SeatRules,
) -> NationalSummary {
    info!(
        "national_summary: {} districts, filter: {}",
        snapshot.districts().len(),
        filter.name()
    );
    let results: Vec<DistrictResult> = snapshot
        .districts()
        .iter()
        .map(|d| tabulate_district(snapshot, d, rules))
        .collect();

    let statuses = district_statuses(&results);
    let stats = dashboard_stats(&results, filter, snapshot.latest_update());
    let distributions: Vec<NationalDistribution> = Chamber::ALL
        .iter()
        .filter(|c| filter.includes(**c))
        .filter_map(|c| {
            let items = national_distribution(&results, *c);
            if items.is_empty() {
                debug!("national_summary: no data for {}", c.name());
                None
            } else {
                Some(NationalDistribution {
                    chamber: *c,
                    method: c.method(),
                    items,
                })
            }
        })
        .collect();
    let districts: Vec<DistrictResult> = results
        .into_iter()
        .filter(|r| is_shown(r, filter))
        .collect();

    NationalSummary {
        filter,
        stats,
        distributions,
        districts,
        statuses,
    }
}
