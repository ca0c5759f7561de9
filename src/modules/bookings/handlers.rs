use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::types::Uuid;
use sqlx::PgPool;
use time::{Date, OffsetDateTime};
use tracing::info;
use validator::Validate;

use crate::app_state::AppState;
use crate::db::{
    Booking, BookingRecord, BookingRepository, BookingSlot, DatabaseError, InsertBooking,
    MarkBookingRead, NewBooking, Party, PatchBookingStatus, ProfileRepository, ReviewBooking,
    SlotRepository, TimeLabel,
};
use crate::error::{AppError, AppResult};

use super::builder::{self, BookingDraft};
use super::lifecycle::{apply_action, derive_effective_status, releases_slots, review_open};

#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    pub user_id: Uuid,
}

pub async fn create_booking(
    State(state): State<AppState>,
    Json(payload): Json<NewBooking>,
) -> AppResult<(StatusCode, Json<BookingRecord>)> {
    payload
        .validate()
        .map_err(|err| AppError::BadRequest(err.to_string()))?;

    let slots = SlotRepository::fetch_by_ids(&state.db, &payload.slot_ids).await?;
    let offerings = ProfileRepository::service_offerings(&state.db, payload.booked_from).await?;
    let profile = ProfileRepository::sitter_profile(&state.db, payload.booked_from).await?;
    let pet_passes =
        ProfileRepository::pet_passes_by_ids(&state.db, &payload.pet_pass_ids).await?;

    let draft = BookingDraft {
        requester: payload.booked_by,
        sitter: payload.booked_from,
        date: payload.date,
        requested_slot_ids: &payload.slot_ids,
        slots: &slots,
        activities: &payload.activities,
        offerings: &offerings,
        requested_pet_ids: &payload.pet_pass_ids,
        pet_passes: &pet_passes,
        profile: profile.as_ref(),
        location: payload.location.as_ref(),
    };
    let priced = builder::validate(&draft).map_err(AppError::Validation)?;

    // Validation guarantees the fields below are present.
    let date = payload
        .date
        .ok_or_else(|| AppError::InternalServerError("validated date missing".to_string()))?;
    let location = payload
        .location
        .ok_or_else(|| AppError::InternalServerError("validated location missing".to_string()))?;

    let insert = InsertBooking {
        booked_by: payload.booked_by,
        booked_from: payload.booked_from,
        date,
        location_address: location.address,
        location_lat: location.lat,
        location_lng: location.lng,
        notes: payload.notes,
        total_price: priced.total_price,
    };
    let slot_holds: Vec<(Uuid, TimeLabel)> = slots
        .iter()
        .map(|slot| (slot.id, slot.time_label.clone()))
        .collect();

    // One transaction: the booking and its slot holds exist together or
    // not at all. The partial unique index on live holds turns a lost
    // race into a clean conflict.
    let mut tx = state.db.begin().await.map_err(DatabaseError::from)?;
    let booking = BookingRepository::create(
        &mut tx,
        &insert,
        &slot_holds,
        &priced.activities,
        &payload.pet_pass_ids,
    )
    .await
    .map_err(|err| match err {
        DatabaseError::Duplicate => AppError::Conflict(
            "One or more selected slots were booked in the meantime".to_string(),
        ),
        other => AppError::Database(other),
    })?;
    tx.commit().await.map_err(DatabaseError::from)?;

    info!(booking_id = %booking.id, sitter = %booking.booked_from, "Booking requested");

    let record = BookingRecord {
        booking,
        slots: slot_holds
            .into_iter()
            .map(|(slot_id, time_label)| BookingSlot {
                slot_id: Some(slot_id),
                time_label,
                released_at: None,
            })
            .collect(),
        activities: priced.activities,
        pet_pass_ids: payload.pet_pass_ids,
    };

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<ListBookingsQuery>,
) -> AppResult<Json<Vec<BookingRecord>>> {
    let today = OffsetDateTime::now_utc().date();
    let bookings = BookingRepository::list_for_party(&state.db, query.user_id).await?;

    let mut records = Vec::with_capacity(bookings.len());
    for booking in bookings {
        records.push(assemble_record(&state.db, booking, today).await?);
    }

    Ok(Json(records))
}

pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookingRecord>> {
    let booking = BookingRepository::fetch(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {id}")))?;

    let today = OffsetDateTime::now_utc().date();
    Ok(Json(assemble_record(&state.db, booking, today).await?))
}

/// Accept, decline or cancel. The acting party is checked against the
/// transition table; decline and cancel release the held slots in the
/// same transaction as the status write.
pub async fn patch_booking_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PatchBookingStatus>,
) -> AppResult<Json<BookingRecord>> {
    let today = OffsetDateTime::now_utc().date();

    let mut tx = state.db.begin().await.map_err(DatabaseError::from)?;
    let booking = BookingRepository::fetch_for_update(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {id}")))?;

    let effective = derive_effective_status(booking.status, booking.date, today);
    let next = apply_action(effective, payload.action, payload.party)
        .map_err(|err| AppError::BadRequest(err.to_string()))?;

    let updated =
        BookingRepository::update_status(&mut tx, id, next, payload.party.counterparty()).await?;
    if releases_slots(next) {
        let released = BookingRepository::release_slots(&mut tx, id).await?;
        info!(booking_id = %id, released, "Released booking slots");
    }
    tx.commit().await.map_err(DatabaseError::from)?;

    info!(booking_id = %id, action = ?payload.action, status = ?next, "Booking transition");

    Ok(Json(assemble_record(&state.db, updated, today).await?))
}

pub async fn mark_booking_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MarkBookingRead>,
) -> AppResult<Json<serde_json::Value>> {
    BookingRepository::mark_read(&state.db, id, payload.party).await?;

    Ok(Json(json!({ "acknowledged": true })))
}

/// Record that a party reviewed (or declined to review) a finished
/// booking. Never changes the booking status.
pub async fn review_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewBooking>,
) -> AppResult<Json<BookingRecord>> {
    let today = OffsetDateTime::now_utc().date();
    let booking = BookingRepository::fetch(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {id}")))?;

    let effective = derive_effective_status(booking.status, booking.date, today);
    if !review_open(effective) {
        return Err(AppError::BadRequest(
            "Reviews open once the booking day has arrived".to_string(),
        ));
    }
    let already = match payload.party {
        Party::Creator => booking.review_creator,
        Party::Provider => booking.review_provider,
    };
    if already.is_some() {
        return Err(AppError::BadRequest(
            "Review already recorded for this party".to_string(),
        ));
    }

    let updated =
        BookingRepository::set_review(&state.db, id, payload.party, payload.reviewed).await?;

    Ok(Json(assemble_record(&state.db, updated, today).await?))
}

async fn assemble_record(
    pool: &PgPool,
    mut booking: Booking,
    today: Date,
) -> Result<BookingRecord, AppError> {
    let slots = BookingRepository::fetch_slots(pool, booking.id).await?;
    let activities = BookingRepository::fetch_activities(pool, booking.id).await?;
    let pet_pass_ids = BookingRepository::fetch_pet_ids(pool, booking.id).await?;

    booking.status = derive_effective_status(booking.status, booking.date, today);

    Ok(BookingRecord {
        booking,
        slots,
        activities,
        pet_pass_ids,
    })
}
