use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::{Date, OffsetDateTime};
use validator::Validate;

use super::sitter_profile::ServiceKind;
use super::slot::TimeLabel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Requested,
    Accepted,
    Declined,
    Cancelled,
    Current,
    Done,
}

impl BookingStatus {
    /// Terminal bookings no longer hold their slots.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Declined | BookingStatus::Cancelled | BookingStatus::Done
        )
    }
}

/// The two sides of a booking: the requester created it, the sitter
/// provides the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Creator,
    Provider,
}

impl Party {
    pub fn counterparty(&self) -> Party {
        match self {
            Party::Creator => Party::Provider,
            Party::Provider => Party::Creator,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingAction {
    Accept,
    Decline,
    Cancel,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub booked_by: Uuid,
    pub booked_from: Uuid,
    pub date: Date,
    pub status: BookingStatus,
    pub location_address: String,
    pub location_lat: f64,
    pub location_lng: f64,
    pub notes: Option<String>,
    pub remarks: Option<String>,
    pub total_price: f64,
    pub is_new_creator: bool,
    pub is_new_provider: bool,
    pub review_creator: Option<bool>,
    pub review_provider: Option<bool>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// One weighted activity line of a booking. The rate is copied from the
/// sitter's offering at booking time so later price edits do not rewrite
/// history.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct BookingActivity {
    pub activity: ServiceKind,
    pub weight: i32,
    pub hourly_rate: f64,
}

/// Slot line as held by a booking; `slot_id` is detached when a released
/// slot is later deleted by its sitter.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct BookingSlot {
    pub slot_id: Option<Uuid>,
    pub time_label: TimeLabel,
    pub released_at: Option<OffsetDateTime>,
}

/// Fully assembled booking as returned by the API. `status` carries the
/// effective (date-derived) value, not necessarily the stored one.
#[derive(Debug, Clone, Serialize)]
pub struct BookingRecord {
    #[serde(flatten)]
    pub booking: Booking,
    pub slots: Vec<BookingSlot>,
    pub activities: Vec<BookingActivity>,
    pub pet_pass_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivitySelection {
    pub activity: ServiceKind,
    pub weight: i32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Location {
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

/// Booking creation payload. Required fields stay optional here so the
/// builder can flag every missing field at once instead of failing on
/// deserialization.
#[derive(Debug, Deserialize, Validate)]
pub struct NewBooking {
    pub booked_by: Uuid,
    pub booked_from: Uuid,
    pub date: Option<Date>,
    #[serde(default)]
    pub slot_ids: Vec<Uuid>,
    #[serde(default)]
    pub activities: Vec<ActivitySelection>,
    #[serde(default)]
    pub pet_pass_ids: Vec<Uuid>,
    pub location: Option<Location>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PatchBookingStatus {
    pub action: BookingAction,
    pub party: Party,
}

#[derive(Debug, Deserialize)]
pub struct MarkBookingRead {
    pub party: Party,
}

#[derive(Debug, Deserialize)]
pub struct ReviewBooking {
    pub party: Party,
    pub reviewed: bool,
}
