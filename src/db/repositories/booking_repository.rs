use sqlx::types::Uuid;
use sqlx::{PgPool, Postgres, Transaction};
use time::Date;

use crate::db::models::{
    Booking, BookingActivity, BookingSlot, BookingStatus, Party, TimeLabel,
};
use crate::db::DatabaseError;

/// Column list shared by every query returning a full booking row.
const BOOKING_COLUMNS: &str = r#"
    id, booked_by, booked_from, date, status,
    location_address, location_lat, location_lng,
    notes, remarks, total_price,
    is_new_creator, is_new_provider,
    review_creator, review_provider,
    created_at, updated_at
"#;

/// Insert payload after validation and pricing.
pub struct InsertBooking {
    pub booked_by: Uuid,
    pub booked_from: Uuid,
    pub date: Date,
    pub location_address: String,
    pub location_lat: f64,
    pub location_lng: f64,
    pub notes: Option<String>,
    pub total_price: f64,
}

pub struct BookingRepository;

impl BookingRepository {
    /// Create the booking together with its slot holds, activity lines and
    /// pet links. Runs inside one transaction; a unique violation on the
    /// live-slot index aborts the whole insert and surfaces as `Duplicate`.
    pub async fn create(
        tx: &mut Transaction<'_, Postgres>,
        new: &InsertBooking,
        slots: &[(Uuid, TimeLabel)],
        activities: &[BookingActivity],
        pet_pass_ids: &[Uuid],
    ) -> Result<Booking, DatabaseError> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            r#"
            INSERT INTO bookings
                (booked_by, booked_from, date, status,
                 location_address, location_lat, location_lng,
                 notes, total_price, is_new_provider)
            VALUES ($1, $2, $3, 'requested', $4, $5, $6, $7, $8, TRUE)
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(new.booked_by)
        .bind(new.booked_from)
        .bind(new.date)
        .bind(&new.location_address)
        .bind(new.location_lat)
        .bind(new.location_lng)
        .bind(&new.notes)
        .bind(new.total_price)
        .fetch_one(&mut **tx)
        .await?;

        for (slot_id, time_label) in slots {
            sqlx::query(
                r#"
                INSERT INTO booking_slots (booking_id, slot_id, time_label)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(booking.id)
            .bind(slot_id)
            .bind(time_label)
            .execute(&mut **tx)
            .await?;
        }

        for line in activities {
            sqlx::query(
                r#"
                INSERT INTO booking_activities (booking_id, activity, weight, hourly_rate)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(booking.id)
            .bind(line.activity)
            .bind(line.weight)
            .bind(line.hourly_rate)
            .execute(&mut **tx)
            .await?;
        }

        for pet_pass_id in pet_pass_ids {
            sqlx::query(
                r#"
                INSERT INTO booking_pets (booking_id, pet_pass_id)
                VALUES ($1, $2)
                "#,
            )
            .bind(booking.id)
            .bind(pet_pass_id)
            .execute(&mut **tx)
            .await?;
        }

        Ok(booking)
    }

    pub async fn fetch(pool: &PgPool, id: Uuid) -> Result<Option<Booking>, DatabaseError> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(booking)
    }

    pub async fn fetch_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Booking>, DatabaseError> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(booking)
    }

    /// All bookings where the user appears on either side.
    pub async fn list_for_party(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<Booking>, DatabaseError> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS} FROM bookings
            WHERE booked_by = $1 OR booked_from = $1
            ORDER BY date DESC, created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(bookings)
    }

    pub async fn fetch_slots(
        pool: &PgPool,
        booking_id: Uuid,
    ) -> Result<Vec<BookingSlot>, DatabaseError> {
        let slots = sqlx::query_as::<_, BookingSlot>(
            r#"
            SELECT slot_id, time_label, released_at
            FROM booking_slots
            WHERE booking_id = $1
            ORDER BY time_label
            "#,
        )
        .bind(booking_id)
        .fetch_all(pool)
        .await?;

        Ok(slots)
    }

    pub async fn fetch_activities(
        pool: &PgPool,
        booking_id: Uuid,
    ) -> Result<Vec<BookingActivity>, DatabaseError> {
        let activities = sqlx::query_as::<_, BookingActivity>(
            r#"
            SELECT activity, weight, hourly_rate
            FROM booking_activities
            WHERE booking_id = $1
            ORDER BY weight DESC, activity
            "#,
        )
        .bind(booking_id)
        .fetch_all(pool)
        .await?;

        Ok(activities)
    }

    pub async fn fetch_pet_ids(
        pool: &PgPool,
        booking_id: Uuid,
    ) -> Result<Vec<Uuid>, DatabaseError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT pet_pass_id FROM booking_pets WHERE booking_id = $1",
        )
        .bind(booking_id)
        .fetch_all(pool)
        .await?;

        Ok(ids)
    }

    /// Write the new status and raise the unread flag of the party that
    /// did not initiate the transition.
    pub async fn update_status(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        status: BookingStatus,
        notify: Party,
    ) -> Result<Booking, DatabaseError> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            r#"
            UPDATE bookings
            SET status = $2,
                is_new_creator = is_new_creator OR $3,
                is_new_provider = is_new_provider OR $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .bind(notify == Party::Creator)
        .bind(notify == Party::Provider)
        .fetch_one(&mut **tx)
        .await?;

        Ok(booking)
    }

    /// Hand the booking's slots back to the free pool.
    pub async fn release_slots(
        tx: &mut Transaction<'_, Postgres>,
        booking_id: Uuid,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE booking_slots
            SET released_at = NOW()
            WHERE booking_id = $1 AND released_at IS NULL
            "#,
        )
        .bind(booking_id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected())
    }

    /// Clear the unread flag of the viewing party only.
    pub async fn mark_read(
        pool: &PgPool,
        id: Uuid,
        party: Party,
    ) -> Result<Booking, DatabaseError> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            r#"
            UPDATE bookings
            SET is_new_creator = is_new_creator AND NOT $2,
                is_new_provider = is_new_provider AND NOT $3
            WHERE id = $1
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(party == Party::Creator)
        .bind(party == Party::Provider)
        .fetch_one(pool)
        .await?;

        Ok(booking)
    }

    /// Record one party's review outcome; `reviewed = false` means the
    /// party declined to review.
    pub async fn set_review(
        pool: &PgPool,
        id: Uuid,
        party: Party,
        reviewed: bool,
    ) -> Result<Booking, DatabaseError> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            r#"
            UPDATE bookings
            SET review_creator = CASE WHEN $2 THEN $4 ELSE review_creator END,
                review_provider = CASE WHEN $3 THEN $4 ELSE review_provider END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(party == Party::Creator)
        .bind(party == Party::Provider)
        .bind(reviewed)
        .fetch_one(pool)
        .await?;

        Ok(booking)
    }
}
