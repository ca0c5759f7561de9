use thiserror::Error;
use time::Date;

use crate::db::{BookingAction, BookingStatus, Party};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("{action:?} is not available in status {status:?}")]
    InvalidTransition {
        status: BookingStatus,
        action: BookingAction,
    },
    #[error("{action:?} is not {party:?}'s action in status {status:?}")]
    WrongParty {
        status: BookingStatus,
        action: BookingAction,
        party: Party,
    },
}

/// What the API reports for a booking, given its stored status and the
/// current date. Stored `accepted` reads as `current` on the booking day
/// and as `done` afterwards; the stored row is never rewritten by reads.
pub fn derive_effective_status(status: BookingStatus, date: Date, today: Date) -> BookingStatus {
    match status {
        BookingStatus::Accepted | BookingStatus::Current if today > date => BookingStatus::Done,
        BookingStatus::Accepted if today == date => BookingStatus::Current,
        other => other,
    }
}

/// The transition table. Decisions on a `requested` booking belong to the
/// sitter; an accepted (or already running) booking can be cancelled by
/// either side. Transition checks run against the effective status so a
/// booking whose day has passed can no longer be cancelled.
pub fn apply_action(
    effective: BookingStatus,
    action: BookingAction,
    party: Party,
) -> Result<BookingStatus, TransitionError> {
    match (effective, action) {
        (BookingStatus::Requested, BookingAction::Accept)
        | (BookingStatus::Requested, BookingAction::Decline) => {
            if party != Party::Provider {
                return Err(TransitionError::WrongParty {
                    status: effective,
                    action,
                    party,
                });
            }
            Ok(match action {
                BookingAction::Accept => BookingStatus::Accepted,
                _ => BookingStatus::Declined,
            })
        }
        (BookingStatus::Accepted, BookingAction::Cancel)
        | (BookingStatus::Current, BookingAction::Cancel) => Ok(BookingStatus::Cancelled),
        _ => Err(TransitionError::InvalidTransition {
            status: effective,
            action,
        }),
    }
}

/// Declining or cancelling hands the held slots back; accepting keeps
/// them consumed.
pub fn releases_slots(status: BookingStatus) -> bool {
    matches!(status, BookingStatus::Declined | BookingStatus::Cancelled)
}

/// Review bookkeeping is only open once the booking day has arrived.
pub fn review_open(effective: BookingStatus) -> bool {
    matches!(effective, BookingStatus::Current | BookingStatus::Done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    const DAY: Date = date!(2024 - 06 - 01);

    #[test]
    fn provider_accepts_and_declines_requested() {
        assert_eq!(
            apply_action(BookingStatus::Requested, BookingAction::Accept, Party::Provider),
            Ok(BookingStatus::Accepted)
        );
        assert_eq!(
            apply_action(BookingStatus::Requested, BookingAction::Decline, Party::Provider),
            Ok(BookingStatus::Declined)
        );
    }

    #[test]
    fn creator_may_not_decide_a_requested_booking() {
        for action in [BookingAction::Accept, BookingAction::Decline] {
            assert!(matches!(
                apply_action(BookingStatus::Requested, action, Party::Creator),
                Err(TransitionError::WrongParty { .. })
            ));
        }
        // Cancellation is not exposed before acceptance either.
        assert!(matches!(
            apply_action(BookingStatus::Requested, BookingAction::Cancel, Party::Creator),
            Err(TransitionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn either_party_cancels_an_accepted_booking() {
        for party in [Party::Creator, Party::Provider] {
            assert_eq!(
                apply_action(BookingStatus::Accepted, BookingAction::Cancel, party),
                Ok(BookingStatus::Cancelled)
            );
            assert_eq!(
                apply_action(BookingStatus::Current, BookingAction::Cancel, party),
                Ok(BookingStatus::Cancelled)
            );
        }
    }

    #[test]
    fn terminal_states_accept_no_actions() {
        for status in [
            BookingStatus::Declined,
            BookingStatus::Cancelled,
            BookingStatus::Done,
        ] {
            assert!(status.is_terminal());
            for action in [
                BookingAction::Accept,
                BookingAction::Decline,
                BookingAction::Cancel,
            ] {
                assert!(apply_action(status, action, Party::Provider).is_err());
            }
        }
        for status in [
            BookingStatus::Requested,
            BookingStatus::Accepted,
            BookingStatus::Current,
        ] {
            assert!(!status.is_terminal());
        }
    }

    #[test]
    fn accepted_becomes_current_on_the_day_and_done_after() {
        assert_eq!(
            derive_effective_status(BookingStatus::Accepted, DAY, date!(2024 - 05 - 31)),
            BookingStatus::Accepted
        );
        assert_eq!(
            derive_effective_status(BookingStatus::Accepted, DAY, DAY),
            BookingStatus::Current
        );
        assert_eq!(
            derive_effective_status(BookingStatus::Accepted, DAY, date!(2024 - 06 - 02)),
            BookingStatus::Done
        );
    }

    #[test]
    fn derivation_leaves_other_statuses_alone() {
        for status in [
            BookingStatus::Requested,
            BookingStatus::Declined,
            BookingStatus::Cancelled,
            BookingStatus::Done,
        ] {
            assert_eq!(
                derive_effective_status(status, DAY, date!(2024 - 07 - 01)),
                status
            );
        }
    }

    #[test]
    fn decline_and_cancel_release_slots_accept_does_not() {
        assert!(releases_slots(BookingStatus::Declined));
        assert!(releases_slots(BookingStatus::Cancelled));
        assert!(!releases_slots(BookingStatus::Accepted));
        assert!(!releases_slots(BookingStatus::Done));
    }

    #[test]
    fn reviews_open_from_the_booking_day_on() {
        assert!(review_open(BookingStatus::Current));
        assert!(review_open(BookingStatus::Done));
        assert!(!review_open(BookingStatus::Requested));
        assert!(!review_open(BookingStatus::Accepted));
    }
}
