use serde::Serialize;
use sqlx::types::Uuid;
use time::Date;

use crate::db::{
    ActivitySelection, BookingActivity, Location, PetPass, ServiceOffering, SitterProfile,
    SlotRecord, Species, SLOT_STEP_MINUTES,
};

/// Per-field warning flags for a booking request. All checks run; the
/// caller highlights every offending field at once instead of stopping at
/// the first. `slots_not_contiguous` is reported independently of the
/// slot emptiness check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookingWarnings {
    pub date: bool,
    pub slots: bool,
    pub slots_not_contiguous: bool,
    pub activities: bool,
    pub pet_passes: bool,
    pub location: bool,
}

impl BookingWarnings {
    pub fn any(&self) -> bool {
        self.date
            || self.slots
            || self.slots_not_contiguous
            || self.activities
            || self.pet_passes
            || self.location
    }
}

/// Everything the builder needs, resolved from storage by the handler.
pub struct BookingDraft<'a> {
    pub requester: Uuid,
    pub sitter: Uuid,
    pub date: Option<Date>,
    pub requested_slot_ids: &'a [Uuid],
    /// Slot rows found for `requested_slot_ids`; missing ids show up as a
    /// shorter list here.
    pub slots: &'a [SlotRecord],
    pub activities: &'a [ActivitySelection],
    pub offerings: &'a [ServiceOffering],
    pub requested_pet_ids: &'a [Uuid],
    pub pet_passes: &'a [PetPass],
    pub profile: Option<&'a SitterProfile>,
    pub location: Option<&'a Location>,
}

/// Validated, priced booking request ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedRequest {
    pub total_price: f64,
    pub activities: Vec<BookingActivity>,
}

pub fn validate(draft: &BookingDraft<'_>) -> Result<PricedRequest, BookingWarnings> {
    let mut warnings = BookingWarnings::default();

    if draft.date.is_none() {
        warnings.date = true;
    }

    warnings.slots = !valid_slots(draft);
    if !draft.slots.is_empty() && !is_contiguous(draft.slots) {
        warnings.slots_not_contiguous = true;
    }

    let priced_activities = price_activities(draft);
    if priced_activities.is_none() {
        warnings.activities = true;
    }

    warnings.pet_passes = !valid_pets(draft);
    warnings.location = !valid_location(draft.location);

    if warnings.any() {
        return Err(warnings);
    }

    let activities = priced_activities.unwrap_or_default();
    let total_minutes = SLOT_STEP_MINUTES * draft.slots.len() as i32;
    let total_price = round_price(
        activities
            .iter()
            .map(|line| {
                line.hourly_rate * f64::from(total_minutes) / 60.0 * f64::from(line.weight) / 100.0
            })
            .sum(),
    );

    Ok(PricedRequest {
        total_price,
        activities,
    })
}

fn valid_slots(draft: &BookingDraft<'_>) -> bool {
    if draft.requested_slot_ids.is_empty() || draft.slots.len() != draft.requested_slot_ids.len() {
        return false;
    }
    let Some(date) = draft.date else {
        // Without a date the slot selection cannot be checked against it;
        // the date warning already covers the miss.
        return true;
    };
    draft
        .slots
        .iter()
        .all(|slot| slot.date == date && slot.creator_id == draft.sitter)
}

/// Sorted time labels must step by exactly 15 minutes.
pub fn is_contiguous(slots: &[SlotRecord]) -> bool {
    let mut minutes: Vec<i32> = slots.iter().map(|s| s.time_label.minutes()).collect();
    minutes.sort_unstable();
    minutes
        .windows(2)
        .all(|pair| pair[1] - pair[0] == SLOT_STEP_MINUTES)
}

/// Resolve each selected activity against the sitter's offerings. The
/// entry flow sends a single 100% activity today, but any weighted split
/// summing to 100 is accepted.
fn price_activities(draft: &BookingDraft<'_>) -> Option<Vec<BookingActivity>> {
    if draft.activities.is_empty() {
        return None;
    }
    let weight_sum: i32 = draft.activities.iter().map(|a| a.weight).sum();
    if weight_sum != 100 || draft.activities.iter().any(|a| a.weight <= 0) {
        return None;
    }

    let mut lines = Vec::with_capacity(draft.activities.len());
    for selection in draft.activities {
        let offering = draft
            .offerings
            .iter()
            .find(|o| o.activity == selection.activity && o.offered)?;
        lines.push(BookingActivity {
            activity: selection.activity,
            weight: selection.weight,
            hourly_rate: offering.hourly_rate,
        });
    }
    Some(lines)
}

fn valid_pets(draft: &BookingDraft<'_>) -> bool {
    if draft.requested_pet_ids.is_empty()
        || draft.pet_passes.len() != draft.requested_pet_ids.len()
    {
        return false;
    }
    let Some(profile) = draft.profile else {
        return false;
    };
    draft.pet_passes.iter().all(|pet| {
        pet.owner_id == draft.requester
            && match pet.species {
                Species::Dog => profile.accepts_dogs,
                Species::Cat => profile.accepts_cats,
            }
    })
}

fn valid_location(location: Option<&Location>) -> bool {
    let Some(location) = location else {
        return false;
    };
    if location.address.trim().is_empty() {
        return false;
    }
    if !location.lat.is_finite() || !location.lng.is_finite() {
        return false;
    }
    // (0, 0) is the unset map sentinel, not a meeting point in the ocean.
    location.lat != 0.0 || location.lng != 0.0
}

pub fn round_price(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ServiceKind, TimeLabel};
    use time::macros::date;
    use time::OffsetDateTime;

    fn slot(id: Uuid, date: Date, label: &str, creator: Uuid) -> SlotRecord {
        SlotRecord {
            id,
            creator_id: creator,
            date,
            time_label: TimeLabel::parse(label).unwrap(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            booked: false,
        }
    }

    fn offering(sitter: Uuid, activity: ServiceKind, rate: f64) -> ServiceOffering {
        ServiceOffering {
            sitter_id: sitter,
            activity,
            offered: true,
            hourly_rate: rate,
        }
    }

    fn pet(owner: Uuid, species: Species) -> PetPass {
        PetPass {
            id: Uuid::new_v4(),
            owner_id: owner,
            name: "Bello".into(),
            species,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    struct Fixture {
        requester: Uuid,
        sitter: Uuid,
        date: Date,
        slot_ids: Vec<Uuid>,
        slots: Vec<SlotRecord>,
        activities: Vec<ActivitySelection>,
        offerings: Vec<ServiceOffering>,
        pet_ids: Vec<Uuid>,
        pets: Vec<PetPass>,
        profile: SitterProfile,
        location: Location,
    }

    impl Fixture {
        /// Four contiguous slots, one dog, gassi at 20.00/hour.
        fn new() -> Self {
            let requester = Uuid::new_v4();
            let sitter = Uuid::new_v4();
            let date = date!(2024 - 06 - 01);
            let slot_ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
            let slots = vec![
                slot(slot_ids[0], date, "09:00", sitter),
                slot(slot_ids[1], date, "09:15", sitter),
                slot(slot_ids[2], date, "09:30", sitter),
                slot(slot_ids[3], date, "09:45", sitter),
            ];
            let pets = vec![pet(requester, Species::Dog)];
            let pet_ids = pets.iter().map(|p| p.id).collect();
            Fixture {
                requester,
                sitter,
                date,
                slot_ids,
                slots,
                activities: vec![ActivitySelection {
                    activity: ServiceKind::Gassi,
                    weight: 100,
                }],
                offerings: vec![offering(sitter, ServiceKind::Gassi, 20.0)],
                pet_ids,
                pets,
                profile: SitterProfile {
                    sitter_id: sitter,
                    accepts_dogs: true,
                    accepts_cats: false,
                },
                location: Location {
                    address: "Hauptstrasse 1, Berlin".into(),
                    lat: 52.52,
                    lng: 13.405,
                },
            }
        }

        fn draft(&self) -> BookingDraft<'_> {
            BookingDraft {
                requester: self.requester,
                sitter: self.sitter,
                date: Some(self.date),
                requested_slot_ids: &self.slot_ids,
                slots: &self.slots,
                activities: &self.activities,
                offerings: &self.offerings,
                requested_pet_ids: &self.pet_ids,
                pet_passes: &self.pets,
                profile: Some(&self.profile),
                location: Some(&self.location),
            }
        }
    }

    #[test]
    fn one_hour_at_twenty_costs_twenty() {
        let fixture = Fixture::new();

        let priced = validate(&fixture.draft()).unwrap();

        assert_eq!(priced.total_price, 20.0);
        assert_eq!(priced.activities.len(), 1);
        assert_eq!(priced.activities[0].hourly_rate, 20.0);
    }

    #[test]
    fn weighted_split_prices_each_share() {
        let mut fixture = Fixture::new();
        fixture.activities = vec![
            ActivitySelection {
                activity: ServiceKind::Gassi,
                weight: 50,
            },
            ActivitySelection {
                activity: ServiceKind::Training,
                weight: 50,
            },
        ];
        fixture
            .offerings
            .push(offering(fixture.sitter, ServiceKind::Training, 30.0));

        let priced = validate(&fixture.draft()).unwrap();

        // One hour: 20.00 * 0.5 + 30.00 * 0.5
        assert_eq!(priced.total_price, 25.0);
    }

    #[test]
    fn gap_in_slots_flags_contiguity_only() {
        let mut fixture = Fixture::new();
        // 09:00, 09:15, 09:45 leaves a gap at 09:30.
        fixture.slots.remove(2);
        fixture.slot_ids.remove(2);

        let warnings = validate(&fixture.draft()).unwrap_err();

        assert!(warnings.slots_not_contiguous);
        assert!(!warnings.slots);
        assert!(!warnings.date && !warnings.activities);
        assert!(!warnings.pet_passes && !warnings.location);
    }

    #[test]
    fn missing_location_flags_location_only() {
        let fixture = Fixture::new();
        let mut draft = fixture.draft();
        draft.location = None;

        let warnings = validate(&draft).unwrap_err();

        assert!(warnings.location);
        assert!(!warnings.date);
        assert!(!warnings.slots && !warnings.slots_not_contiguous);
        assert!(!warnings.activities && !warnings.pet_passes);
    }

    #[test]
    fn unset_map_sentinel_is_not_a_location() {
        let mut fixture = Fixture::new();
        fixture.location.lat = 0.0;
        fixture.location.lng = 0.0;

        let warnings = validate(&fixture.draft()).unwrap_err();

        assert!(warnings.location);
    }

    #[test]
    fn all_missing_fields_are_reported_together() {
        let fixture = Fixture::new();
        let draft = BookingDraft {
            requester: fixture.requester,
            sitter: fixture.sitter,
            date: None,
            requested_slot_ids: &[],
            slots: &[],
            activities: &[],
            offerings: &fixture.offerings,
            requested_pet_ids: &[],
            pet_passes: &[],
            profile: Some(&fixture.profile),
            location: None,
        };

        let warnings = validate(&draft).unwrap_err();

        assert!(warnings.date);
        assert!(warnings.slots);
        assert!(warnings.activities);
        assert!(warnings.pet_passes);
        assert!(warnings.location);
        // An empty selection has no gaps to flag.
        assert!(!warnings.slots_not_contiguous);
    }

    #[test]
    fn weights_must_sum_to_one_hundred() {
        let mut fixture = Fixture::new();
        fixture.activities[0].weight = 80;

        let warnings = validate(&fixture.draft()).unwrap_err();

        assert!(warnings.activities);
    }

    #[test]
    fn unoffered_activity_is_rejected() {
        let mut fixture = Fixture::new();
        fixture.activities[0].activity = ServiceKind::Tierarzt;

        let warnings = validate(&fixture.draft()).unwrap_err();

        assert!(warnings.activities);
    }

    #[test]
    fn foreign_or_incompatible_pets_are_rejected() {
        let mut fixture = Fixture::new();
        fixture.pets[0].species = Species::Cat;

        let warnings = validate(&fixture.draft()).unwrap_err();
        assert!(warnings.pet_passes);

        let mut fixture = Fixture::new();
        fixture.pets[0].owner_id = Uuid::new_v4();

        let warnings = validate(&fixture.draft()).unwrap_err();
        assert!(warnings.pet_passes);
    }

    #[test]
    fn slots_must_belong_to_sitter_and_date() {
        let mut fixture = Fixture::new();
        fixture.slots[0].creator_id = Uuid::new_v4();

        let warnings = validate(&fixture.draft()).unwrap_err();
        assert!(warnings.slots);

        let mut fixture = Fixture::new();
        fixture.slots[1].date = date!(2024 - 06 - 02);

        let warnings = validate(&fixture.draft()).unwrap_err();
        assert!(warnings.slots);
    }

    #[test]
    fn price_rounds_to_two_decimals() {
        let mut fixture = Fixture::new();
        // Three slots (45 minutes) at 19.99/hour: 14.9925 -> 14.99.
        fixture.slots.pop();
        fixture.slot_ids.pop();
        fixture.offerings[0].hourly_rate = 19.99;

        let priced = validate(&fixture.draft()).unwrap();

        assert_eq!(priced.total_price, 14.99);
    }
}
