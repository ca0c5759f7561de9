use sqlx::types::Uuid;
use sqlx::{PgPool, Postgres, Transaction};
use time::Date;

use crate::db::models::{SlotRecord, TimeLabel};
use crate::db::DatabaseError;

pub struct SlotRepository;

impl SlotRepository {
    /// Slots for a creator, newest-day first is left to the caller; rows
    /// come back ordered by (date, time). `dates` of `None` means all days.
    pub async fn list(
        pool: &PgPool,
        creator_id: Uuid,
        dates: Option<&[Date]>,
    ) -> Result<Vec<SlotRecord>, DatabaseError> {
        let rows = sqlx::query_as::<_, SlotRecord>(
            r#"
            SELECT s.id, s.creator_id, s.date, s.time_label, s.created_at,
                   EXISTS (
                       SELECT 1 FROM booking_slots bs
                       WHERE bs.slot_id = s.id AND bs.released_at IS NULL
                   ) AS booked
            FROM slots s
            WHERE s.creator_id = $1
              AND ($2::date[] IS NULL OR s.date = ANY($2))
            ORDER BY s.date, s.time_label
            "#,
        )
        .bind(creator_id)
        .bind(dates)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// Same selection inside a reconcile transaction, with the slot rows
    /// locked so a concurrent reconcile of the same days serializes.
    pub async fn lock_for_dates(
        tx: &mut Transaction<'_, Postgres>,
        creator_id: Uuid,
        dates: &[Date],
    ) -> Result<Vec<SlotRecord>, DatabaseError> {
        let rows = sqlx::query_as::<_, SlotRecord>(
            r#"
            SELECT s.id, s.creator_id, s.date, s.time_label, s.created_at,
                   EXISTS (
                       SELECT 1 FROM booking_slots bs
                       WHERE bs.slot_id = s.id AND bs.released_at IS NULL
                   ) AS booked
            FROM slots s
            WHERE s.creator_id = $1 AND s.date = ANY($2)
            ORDER BY s.date, s.time_label
            FOR UPDATE OF s
            "#,
        )
        .bind(creator_id)
        .bind(dates)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows)
    }

    /// Apply a computed reconcile diff. Creation tolerates races via
    /// ON CONFLICT; deletion re-checks consumption so a slot grabbed by a
    /// booking between read and write survives.
    pub async fn apply_diff(
        tx: &mut Transaction<'_, Postgres>,
        creator_id: Uuid,
        create: &[(Date, TimeLabel)],
        delete: &[Uuid],
    ) -> Result<(u64, u64), DatabaseError> {
        let mut created = 0;
        for (date, time_label) in create {
            let result = sqlx::query(
                r#"
                INSERT INTO slots (creator_id, date, time_label)
                VALUES ($1, $2, $3)
                ON CONFLICT (creator_id, date, time_label) DO NOTHING
                "#,
            )
            .bind(creator_id)
            .bind(date)
            .bind(time_label)
            .execute(&mut **tx)
            .await?;
            created += result.rows_affected();
        }

        let result = sqlx::query(
            r#"
            DELETE FROM slots s
            WHERE s.id = ANY($1)
              AND NOT EXISTS (
                  SELECT 1 FROM booking_slots bs
                  WHERE bs.slot_id = s.id AND bs.released_at IS NULL
              )
            "#,
        )
        .bind(delete)
        .execute(&mut **tx)
        .await?;

        Ok((created, result.rows_affected()))
    }

    /// Resolve requested slot ids for a booking draft; missing ids simply
    /// come back absent and the builder flags them.
    pub async fn fetch_by_ids(
        pool: &PgPool,
        slot_ids: &[Uuid],
    ) -> Result<Vec<SlotRecord>, DatabaseError> {
        let rows = sqlx::query_as::<_, SlotRecord>(
            r#"
            SELECT s.id, s.creator_id, s.date, s.time_label, s.created_at,
                   EXISTS (
                       SELECT 1 FROM booking_slots bs
                       WHERE bs.slot_id = s.id AND bs.released_at IS NULL
                   ) AS booked
            FROM slots s
            WHERE s.id = ANY($1)
            ORDER BY s.time_label
            "#,
        )
        .bind(slot_ids)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }
}
