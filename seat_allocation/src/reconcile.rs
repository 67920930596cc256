use chrono::{DateTime, Utc};
use log::{debug, warn};
use rust_decimal::Decimal;

use crate::config::*;

/// Makes the percentages of a result add up to the expected total (100%).
///
/// The missing part goes to the "Others" entry, which is created if needed (with no seats,
/// not passing the threshold, updated at `latest_update`). A missing part within the tolerance
/// is ignored. The display string and the share of every entry are then refreshed.
///
/// Running it again on its own output only refreshes the display fields.
pub fn reconcile(
    entries: &mut Vec<ResultEntry>,
    latest_update: Option<DateTime<Utc>>,
    rules: &SeatRules,
) {
    if entries.is_empty() {
        return;
    }

    let total: Percentage = entries.iter().map(|e| e.percentage).sum();
    let remainder = rules.total - total;
    if remainder > rules.tolerance {
        debug!("reconcile: total {}, adding {} to {}", total, remainder, OTHERS);
        match entries.iter_mut().find(|e| e.is_others()) {
            Some(others) => {
                others.percentage += remainder;
                if others.updated_at.is_none() {
                    others.updated_at = latest_update;
                }
            }
            None => entries.push(ResultEntry::others(remainder, latest_update)),
        }
    } else if total > rules.total + rules.tolerance {
        warn!("reconcile: percentages add up to {}, above {}", total, rules.total);
    }

    let new_total: Percentage = entries.iter().map(|e| e.percentage).sum();
    for entry in entries.iter_mut() {
        entry.percentage_display = entry.percentage.display();
        entry.share = if new_total.is_positive() {
            entry.percentage.value() / new_total.value() * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 26, hour, 0, 0).unwrap()
    }

    fn entry(lid: u32, name: &str, hundredths: u32, seats: u32) -> ResultEntry {
        let p = Percentage::from_hundredths(hundredths);
        ResultEntry {
            list_id: Some(ListId(lid)),
            code: format!("L{:02}", lid),
            name: name.to_string(),
            alignment: name.to_string(),
            percentage: p,
            percentage_display: String::new(),
            share: Decimal::ZERO,
            seats,
            passes_threshold: true,
            updated_at: Some(at(20)),
        }
    }

    fn total(entries: &[ResultEntry]) -> Percentage {
        entries.iter().map(|e| e.percentage).sum()
    }

    #[test]
    fn empty_is_untouched() {
        let mut entries: Vec<ResultEntry> = vec![];
        reconcile(&mut entries, Some(at(21)), &SeatRules::DEFAULT_RULES);
        assert!(entries.is_empty());
    }

    #[test]
    fn appends_others() {
        let mut entries = vec![entry(1, "Mayoritaria", 9400, 3)];
        reconcile(&mut entries, Some(at(21)), &SeatRules::DEFAULT_RULES);
        assert_eq!(entries.len(), 2);
        let others = &entries[1];
        assert!(others.is_others());
        assert_eq!(others.code, "-");
        assert_eq!(others.percentage_display, "6.00");
        assert_eq!(others.seats, 0);
        assert!(!others.passes_threshold);
        assert_eq!(others.updated_at, Some(at(21)));
        assert_eq!(total(&entries), Percentage::from_hundredths(10000));
        assert_eq!(entries[0].share, Decimal::from(94));
    }

    #[test]
    fn completes_existing_others() {
        let mut entries = vec![
            entry(1, "A", 9000, 3),
            ResultEntry::others(Percentage::from_hundredths(250), None),
        ];
        reconcile(&mut entries, Some(at(22)), &SeatRules::DEFAULT_RULES);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].percentage, Percentage::from_hundredths(1000));
        assert_eq!(entries[1].updated_at, Some(at(22)));
    }

    #[test]
    fn keeps_existing_others_timestamp() {
        let mut entries = vec![
            entry(1, "A", 9000, 3),
            ResultEntry::others(Percentage::from_hundredths(250), Some(at(18))),
        ];
        reconcile(&mut entries, Some(at(22)), &SeatRules::DEFAULT_RULES);
        assert_eq!(entries[1].updated_at, Some(at(18)));
    }

    #[test]
    fn a_list_named_others_is_not_the_placeholder() {
        let mut entries = vec![entry(1, "A", 9000, 3), entry(2, OTHERS, 500, 0)];
        reconcile(&mut entries, None, &SeatRules::DEFAULT_RULES);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].percentage, Percentage::from_hundredths(500));
        assert_eq!(entries[2].percentage, Percentage::from_hundredths(500));
    }

    #[test]
    fn remainder_within_tolerance_is_ignored() {
        let mut entries = vec![entry(1, "A", 6000, 2), entry(2, "B", 3999, 1)];
        reconcile(&mut entries, None, &SeatRules::DEFAULT_RULES);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].percentage_display, "39.99");
    }

    #[test]
    fn idempotent() {
        let mut entries = vec![entry(1, "A", 5012, 2), entry(2, "B", 3071, 1)];
        reconcile(&mut entries, Some(at(21)), &SeatRules::DEFAULT_RULES);
        let once = entries.clone();
        reconcile(&mut entries, Some(at(23)), &SeatRules::DEFAULT_RULES);
        assert_eq!(entries, once);
        assert_eq!(total(&entries), Percentage::from_hundredths(10000));
    }

    #[test]
    fn shares_above_total() {
        let mut entries = vec![entry(1, "A", 6000, 2), entry(2, "B", 6000, 1)];
        reconcile(&mut entries, None, &SeatRules::DEFAULT_RULES);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].share, Decimal::from(50));
        assert_eq!(entries[0].percentage_display, "60.00");
    }

    #[test]
    fn zero_total_gives_zero_shares() {
        let rules = SeatRules {
            total: Percentage::ZERO,
            ..SeatRules::DEFAULT_RULES
        };
        let mut entries = vec![entry(1, "A", 0, 0), entry(2, "B", 0, 0)];
        reconcile(&mut entries, None, &rules);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.share == Decimal::ZERO));
        assert_eq!(entries[0].percentage_display, "0.00");
    }
}
