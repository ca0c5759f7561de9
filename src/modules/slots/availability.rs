use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use time::Date;

use crate::db::{SlotRecord, TimeLabel};

/// Day-level availability of one sitter. Days with no slots at all appear
/// in neither set. Both calendars (the sitter's editor and the requester's
/// read-only view) render from this one derivation.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct DayClassification {
    pub active_days: BTreeSet<Date>,
    pub booked_only_days: BTreeSet<Date>,
}

pub fn classify_days(slots: &[SlotRecord]) -> DayClassification {
    let mut has_active: BTreeMap<Date, bool> = BTreeMap::new();
    for slot in slots {
        let entry = has_active.entry(slot.date).or_insert(false);
        *entry = *entry || !slot.booked;
    }

    let mut classification = DayClassification::default();
    for (date, active) in has_active {
        if active {
            classification.active_days.insert(date);
        } else {
            classification.booked_only_days.insert(date);
        }
    }
    classification
}

/// Per-label flags for the multi-date slot editor. The flags are not
/// mutually exclusive: across the dates under edit a label can be active
/// on one day, held on another and unset on a third.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditGridEntry {
    pub time_label: TimeLabel,
    pub is_active: bool,
    pub is_booked: bool,
    pub is_free: bool,
}

pub fn edit_grid(slots: &[SlotRecord], dates: &[Date]) -> Vec<EditGridEntry> {
    let date_count = dates.iter().collect::<BTreeSet<_>>().len();
    let mut per_label: BTreeMap<TimeLabel, (bool, bool, usize)> = BTreeMap::new();
    for slot in slots {
        if !dates.contains(&slot.date) {
            continue;
        }
        let entry = per_label.entry(slot.time_label.clone()).or_insert((false, false, 0));
        if slot.booked {
            entry.1 = true;
        } else {
            entry.0 = true;
        }
        entry.2 += 1;
    }

    TimeLabel::grid()
        .map(|label| {
            let (is_active, is_booked, set_count) =
                per_label.get(&label).copied().unwrap_or((false, false, 0));
            EditGridEntry {
                time_label: label,
                is_active,
                is_booked,
                // Unset on at least one of the dates under edit.
                is_free: set_count < date_count,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Uuid;
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

    #[test]
    fn day_with_any_active_slot_counts_as_active() {
        let d = date!(2024 - 06 - 01);
        let slots = vec![slot(d, "09:00", false), slot(d, "09:15", true)];

        let result = classify_days(&slots);

        assert!(result.active_days.contains(&d));
        assert!(result.booked_only_days.is_empty());
    }

    #[test]
    fn fully_consumed_day_is_booked_only() {
        let d = date!(2024 - 06 - 01);
        let slots = vec![slot(d, "09:00", true), slot(d, "09:15", true)];

        let result = classify_days(&slots);

        assert!(result.active_days.is_empty());
        assert!(result.booked_only_days.contains(&d));
    }

    #[test]
    fn slotless_day_is_absent_from_both_sets() {
        let result = classify_days(&[]);

        assert_eq!(result, DayClassification::default());
    }

    #[test]
    fn edit_grid_flags_are_not_exclusive() {
        let d1 = date!(2024 - 06 - 01);
        let d2 = date!(2024 - 06 - 02);
        let d3 = date!(2024 - 06 - 03);
        // 09:00 is active on d1, held on d2 and unset on d3.
        let slots = vec![slot(d1, "09:00", false), slot(d2, "09:00", true)];

        let grid = edit_grid(&slots, &[d1, d2, d3]);
        let entry = grid
            .iter()
            .find(|e| e.time_label.as_str() == "09:00")
            .unwrap();

        assert!(entry.is_active);
        assert!(entry.is_booked);
        assert!(entry.is_free);
    }

    #[test]
    fn label_set_on_every_date_is_not_free() {
        let d1 = date!(2024 - 06 - 01);
        let d2 = date!(2024 - 06 - 02);
        let slots = vec![slot(d1, "10:00", false), slot(d2, "10:00", true)];

        let grid = edit_grid(&slots, &[d1, d2]);
        let entry = grid
            .iter()
            .find(|e| e.time_label.as_str() == "10:00")
            .unwrap();

        assert!(!entry.is_free);
        // Unset labels stay free everywhere.
        let other = grid
            .iter()
            .find(|e| e.time_label.as_str() == "10:15")
            .unwrap();
        assert!(other.is_free);
        assert!(!other.is_active && !other.is_booked);
    }

    #[test]
    fn grid_always_covers_the_full_day() {
        let grid = edit_grid(&[], &[date!(2024 - 06 - 01)]);

        assert_eq!(grid.len(), 96);
    }
}
