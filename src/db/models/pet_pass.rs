use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "species", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Dog,
    Cat,
}

/// Pet profile referenced by bookings; owned by the requester.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct PetPass {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub species: Species,
    pub created_at: OffsetDateTime,
}
