use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;

/// The fixed set of bookable service activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "service_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Hausbesuch,
    Gassi,
    Training,
    Herberge,
    Tierarzt,
}

/// Per-activity offering on a sitter profile, administered outside this
/// service and read here for validation and pricing.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ServiceOffering {
    pub sitter_id: Uuid,
    pub activity: ServiceKind,
    pub offered: bool,
    pub hourly_rate: f64,
}

/// Species compatibility flags from the sitter profile.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct SitterProfile {
    pub sitter_id: Uuid,
    pub accepts_dogs: bool,
    pub accepts_cats: bool,
}
