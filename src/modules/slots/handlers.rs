use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::macros::format_description;
use time::Date;
use tracing::info;

use crate::app_state::AppState;
use crate::db::{DatabaseError, SlotRecord, SlotRepository, TimeLabel};
use crate::error::{AppError, AppResult};

use super::availability::{classify_days, edit_grid, DayClassification, EditGridEntry};
use super::reconcile::diff_slots;

#[derive(Debug, Deserialize)]
pub struct ListSlotsQuery {
    pub creator_id: Uuid,
    pub dates: Option<String>, // Comma-separated list of dates
    pub status: Option<SlotStatusFilter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatusFilter {
    Active,
    Booked,
}

#[derive(Debug, Deserialize)]
pub struct ReconcileRequest {
    pub creator_id: Uuid,
    pub dates: Vec<Date>,
    pub times: Vec<TimeLabel>,
}

/// Counts for the user-facing summary ("N slots created, M deleted").
#[derive(Debug, Serialize)]
pub struct ReconcileSummary {
    pub created: u64,
    pub deleted: u64,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub creator_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct EditGridQuery {
    pub creator_id: Uuid,
    pub dates: String, // Comma-separated list of dates
}

pub async fn list_slots(
    State(state): State<AppState>,
    Query(query): Query<ListSlotsQuery>,
) -> AppResult<Json<Vec<SlotRecord>>> {
    let dates = parse_date_list(query.dates.as_deref())?;
    let mut slots = SlotRepository::list(&state.db, query.creator_id, dates.as_deref()).await?;

    if let Some(filter) = query.status {
        slots.retain(|slot| match filter {
            SlotStatusFilter::Active => !slot.booked,
            SlotStatusFilter::Booked => slot.booked,
        });
    }

    Ok(Json(slots))
}

/// Move the persisted slots of the supplied dates to the requested
/// `dates x times` cross product, in one transaction. Slots held by a
/// non-terminal booking survive; unmentioned dates are untouched.
pub async fn reconcile_slots(
    State(state): State<AppState>,
    Json(payload): Json<ReconcileRequest>,
) -> AppResult<Json<ReconcileSummary>> {
    let mut tx = state.db.begin().await.map_err(DatabaseError::from)?;

    let existing =
        SlotRepository::lock_for_dates(&mut tx, payload.creator_id, &payload.dates).await?;
    let diff = diff_slots(&existing, &payload.dates, &payload.times);
    let (created, deleted) =
        SlotRepository::apply_diff(&mut tx, payload.creator_id, &diff.create, &diff.delete)
            .await?;

    tx.commit().await.map_err(DatabaseError::from)?;

    info!(
        creator_id = %payload.creator_id,
        created, deleted, "Reconciled availability slots"
    );

    Ok(Json(ReconcileSummary { created, deleted }))
}

pub async fn availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<DayClassification>> {
    let slots = SlotRepository::list(&state.db, query.creator_id, None).await?;
    Ok(Json(classify_days(&slots)))
}

pub async fn slot_edit_grid(
    State(state): State<AppState>,
    Query(query): Query<EditGridQuery>,
) -> AppResult<Json<Vec<EditGridEntry>>> {
    let dates = parse_date_list(Some(&query.dates))?
        .ok_or_else(|| AppError::BadRequest("dates must not be empty".to_string()))?;
    let slots = SlotRepository::list(&state.db, query.creator_id, Some(&dates)).await?;
    Ok(Json(edit_grid(&slots, &dates)))
}

fn parse_date_list(raw: Option<&str>) -> Result<Option<Vec<Date>>, AppError> {
    let format = format_description!("[year]-[month]-[day]");
    match raw {
        None => Ok(None),
        Some(value) => {
            let mut dates = Vec::new();
            for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let date = Date::parse(part, &format)
                    .map_err(|_| AppError::BadRequest(format!("Invalid date: {part}")))?;
                dates.push(date);
            }
            if dates.is_empty() {
                Ok(None)
            } else {
                Ok(Some(dates))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_comma_separated_dates() {
        let dates = parse_date_list(Some("2024-06-01, 2024-06-02"))
            .unwrap()
            .unwrap();

        assert_eq!(dates, vec![date!(2024 - 06 - 01), date!(2024 - 06 - 02)]);
    }

    #[test]
    fn blank_list_means_no_filter() {
        assert!(parse_date_list(None).unwrap().is_none());
        assert!(parse_date_list(Some("  ")).unwrap().is_none());
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(parse_date_list(Some("01.06.2024")).is_err());
    }
}
