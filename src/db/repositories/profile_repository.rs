use sqlx::types::Uuid;
use sqlx::PgPool;

use crate::db::models::{PetPass, ServiceOffering, SitterProfile};
use crate::db::DatabaseError;

/// Read-only access to collaborator-administered profile data: sitter
/// offerings, species flags and pet passes.
pub struct ProfileRepository;

impl ProfileRepository {
    pub async fn service_offerings(
        pool: &PgPool,
        sitter_id: Uuid,
    ) -> Result<Vec<ServiceOffering>, DatabaseError> {
        let offerings = sqlx::query_as::<_, ServiceOffering>(
            r#"
            SELECT sitter_id, activity, offered, hourly_rate
            FROM service_offerings
            WHERE sitter_id = $1
            "#,
        )
        .bind(sitter_id)
        .fetch_all(pool)
        .await?;

        Ok(offerings)
    }

    pub async fn sitter_profile(
        pool: &PgPool,
        sitter_id: Uuid,
    ) -> Result<Option<SitterProfile>, DatabaseError> {
        let profile = sqlx::query_as::<_, SitterProfile>(
            r#"
            SELECT sitter_id, accepts_dogs, accepts_cats
            FROM sitter_profiles
            WHERE sitter_id = $1
            "#,
        )
        .bind(sitter_id)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }

    pub async fn pet_passes_by_ids(
        pool: &PgPool,
        ids: &[Uuid],
    ) -> Result<Vec<PetPass>, DatabaseError> {
        let passes = sqlx::query_as::<_, PetPass>(
            r#"
            SELECT id, owner_id, name, species, created_at
            FROM pet_passes
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;

        Ok(passes)
    }
}
