use std::collections::BTreeMap;

use log::debug;
use rust_decimal::Decimal;

use crate::config::*;

/// Seats won by the list with the most votes under the 2+1 system.
pub const MAJORITY_SEATS: u32 = 2;
/// Seats won by the runner-up under the 2+1 system.
pub const FIRST_MINORITY_SEATS: u32 = 1;

/// The vote percentage of every participating list, keyed (and thus iterated) by ascending id.
pub type VotesByList = BTreeMap<ListId, Percentage>;

/// The number of seats won by each list. Every list of the input is present, possibly with 0.
pub type Allocation = BTreeMap<ListId, u32>;

fn empty_allocation(votes_by_list: &VotesByList) -> Allocation {
    votes_by_list.keys().map(|lid| (*lid, 0)).collect()
}

/// Applies the chamber's formula.
pub fn allocate(method: AllocationMethod, votes_by_list: &VotesByList, seats: u32) -> Allocation {
    match method {
        AllocationMethod::DHondt => dhondt_allocation(votes_by_list, seats),
        AllocationMethod::MajorityMinority => senate_allocation(votes_by_list, seats),
    }
}

/// Distributes the seats with the D'Hondt highest averages method.
///
/// Each seat goes to the list with the highest quotient `votes / (seats won + 1)`.
/// When several lists have the same quotient, the list with the lowest id wins.
///
/// The caller is responsible for removing the lists that do not reach the threshold.
pub fn dhondt_allocation(votes_by_list: &VotesByList, seats: u32) -> Allocation {
    let mut allocation = empty_allocation(votes_by_list);
    if seats == 0 || votes_by_list.is_empty() {
        return allocation;
    }
    let total_votes: Percentage = votes_by_list.values().sum();
    if !total_votes.is_positive() {
        debug!("dhondt_allocation: no votes, no seats assigned");
        return allocation;
    }

    for round in 1..=seats {
        // (list, votes, seats already won) of the best quotient so far
        let mut best: Option<(ListId, Percentage, u32)> = None;
        for (&lid, &votes) in votes_by_list.iter() {
            let won = allocation.get(&lid).copied().unwrap_or(0);
            best = match best {
                Some((_, best_votes, best_won))
                    if !quotient_greater(votes, won, best_votes, best_won) =>
                {
                    best
                }
                _ => Some((lid, votes, won)),
            };
        }
        if let Some((lid, votes, won)) = best {
            debug!(
                "dhondt_allocation: seat {} -> list {} ({} / {})",
                round,
                lid,
                votes,
                won + 1
            );
            *allocation.entry(lid).or_insert(0) += 1;
        }
    }
    allocation
}

// votes_a / (won_a + 1) > votes_b / (won_b + 1), compared without dividing.
fn quotient_greater(votes_a: Percentage, won_a: u32, votes_b: Percentage, won_b: u32) -> bool {
    votes_a.value() * Decimal::from(won_b + 1) > votes_b.value() * Decimal::from(won_a + 1)
}

/// Distributes the senate seats: two for the first list, one for the second.
///
/// Lists are ranked by percentage, the lowest id first in case of equality.
/// There is no threshold for this chamber.
pub fn senate_allocation(votes_by_list: &VotesByList, seats: u32) -> Allocation {
    let mut allocation = empty_allocation(votes_by_list);
    if seats == 0 || votes_by_list.is_empty() {
        return allocation;
    }

    let mut ordered: Vec<(ListId, Percentage)> =
        votes_by_list.iter().map(|(lid, p)| (*lid, *p)).collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let first_award = seats.min(MAJORITY_SEATS);
    if let Some(&(top, _)) = ordered.first() {
        allocation.insert(top, first_award);
    }
    let remaining = seats - first_award;
    if remaining > 0 {
        if let Some(&(second, _)) = ordered.get(1) {
            allocation.insert(second, remaining.min(FIRST_MINORITY_SEATS));
        }
    }
    debug!("senate_allocation: {} seats: {:?}", seats, allocation);
    allocation
}
