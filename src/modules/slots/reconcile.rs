use std::collections::{BTreeSet, HashMap, HashSet};

use sqlx::types::Uuid;
use time::Date;

use crate::db::{SlotRecord, TimeLabel};

/// Storage operations needed to move the persisted slots of the supplied
/// dates to the requested `dates x times` cross product.
#[derive(Debug, Default, PartialEq)]
pub struct SlotDiff {
    pub create: Vec<(Date, TimeLabel)>,
    pub delete: Vec<Uuid>,
}

impl SlotDiff {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.delete.is_empty()
    }
}

/// Diff existing slots against the desired state.
///
/// `existing` must already be restricted to `dates`; slots on unmentioned
/// days are out of scope and stay untouched. Slots held by a non-terminal
/// booking are never scheduled for deletion, whatever the request says.
pub fn diff_slots(existing: &[SlotRecord], dates: &[Date], times: &[TimeLabel]) -> SlotDiff {
    if dates.is_empty() {
        return SlotDiff::default();
    }

    let requested_times: BTreeSet<&TimeLabel> = times.iter().collect();
    let mut by_date: HashMap<Date, Vec<&SlotRecord>> = HashMap::new();
    for slot in existing {
        by_date.entry(slot.date).or_default().push(slot);
    }

    let mut diff = SlotDiff::default();
    let mut seen_dates = HashSet::new();
    for &date in dates {
        if !seen_dates.insert(date) {
            continue;
        }
        let on_date = by_date.remove(&date).unwrap_or_default();
        let present: BTreeSet<&TimeLabel> = on_date.iter().map(|s| &s.time_label).collect();

        for &time in &requested_times {
            if !present.contains(time) {
                diff.create.push((date, time.clone()));
            }
        }
        for slot in on_date {
            if !requested_times.contains(&slot.time_label) && !slot.booked {
                diff.delete.push(slot.id);
            }
        }
    }

    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;
    use time::OffsetDateTime;

    fn slot(date: Date, label: &str, booked: bool) -> SlotRecord {
        SlotRecord {
            id: Uuid::new_v4(),
            creator_id: Uuid::nil(),
            date,
            time_label: TimeLabel::parse(label).unwrap(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            booked,
        }
    }

    fn labels(values: &[&str]) -> Vec<TimeLabel> {
        values.iter().map(|v| TimeLabel::parse(v).unwrap()).collect()
    }

    #[test]
    fn creates_missing_pairs_across_dates() {
        let d1 = date!(2024 - 06 - 01);
        let d2 = date!(2024 - 06 - 02);
        let existing = vec![slot(d1, "09:00", false)];

        let diff = diff_slots(&existing, &[d1, d2], &labels(&["09:00", "09:15"]));

        assert_eq!(diff.delete, Vec::<Uuid>::new());
        let created: Vec<String> = diff
            .create
            .iter()
            .map(|(d, t)| format!("{d} {t}"))
            .collect();
        assert_eq!(
            created,
            vec!["2024-06-01 09:15", "2024-06-02 09:00", "2024-06-02 09:15"]
        );
    }

    #[test]
    fn deletes_unrequested_free_slots_only() {
        let d = date!(2024 - 06 - 01);
        let free = slot(d, "08:00", false);
        let held = slot(d, "08:15", true);
        let existing = vec![free.clone(), held];

        let diff = diff_slots(&existing, &[d], &labels(&["09:00"]));

        assert_eq!(diff.delete, vec![free.id]);
        assert_eq!(diff.create.len(), 1);
    }

    #[test]
    fn booked_slot_survives_even_when_unrequested() {
        let d = date!(2024 - 06 - 01);
        let existing = vec![slot(d, "10:00", true)];

        let diff = diff_slots(&existing, &[d], &[]);

        assert!(diff.is_empty());
    }

    #[test]
    fn empty_dates_is_a_noop() {
        let d = date!(2024 - 06 - 01);
        let existing = vec![slot(d, "10:00", false)];

        let diff = diff_slots(&existing, &[], &labels(&["10:00", "10:15"]));

        assert!(diff.is_empty());
    }

    #[test]
    fn reconcile_is_idempotent() {
        let d1 = date!(2024 - 06 - 01);
        let d2 = date!(2024 - 06 - 02);
        let times = labels(&["09:00", "09:15", "09:30"]);
        let mut state = vec![slot(d1, "07:00", false), slot(d1, "09:00", false)];

        let first = diff_slots(&state, &[d1, d2], &times);
        assert!(!first.is_empty());

        // Apply the diff to the simulated store.
        state.retain(|s| !first.delete.contains(&s.id));
        for (date, label) in &first.create {
            state.push(slot(*date, label.as_str(), false));
        }

        let second = diff_slots(&state, &[d1, d2], &times);
        assert!(second.is_empty());
    }

    #[test]
    fn duplicate_requested_dates_are_collapsed() {
        let d = date!(2024 - 06 - 01);
        let diff = diff_slots(&[], &[d, d], &labels(&["09:00"]));

        assert_eq!(diff.create.len(), 1);
    }
}
