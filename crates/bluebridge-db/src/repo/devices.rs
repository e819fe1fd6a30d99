use super::prelude::*;

pub struct DeviceTokenRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> DeviceTokenRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Binds `token` to `user_id`. An existing row for the same token is
    /// re-bound and reactivated instead of duplicated.
    pub async fn upsert(
        &self,
        user_id: Uuid,
        token: &str,
        device_type: DeviceType,
    ) -> Result<DeviceToken, sqlx_core::Error> {
        let now = Utc::now();
        query_as!(
            DeviceToken,
            r#"
            INSERT INTO device_tokens (
                token_id,
                user_id,
                token,
                device_type,
                last_used,
                is_active,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, TRUE, $5)
            ON CONFLICT (token) DO UPDATE
            SET user_id = EXCLUDED.user_id,
                device_type = EXCLUDED.device_type,
                last_used = EXCLUDED.last_used,
                is_active = TRUE
            RETURNING
                token_id,
                user_id,
                token,
                device_type,
                last_used,
                is_active,
                created_at
            "#,
            Uuid::new_v4(),
            user_id,
            token,
            device_type.as_i32(),
            now
        )
        .fetch_one(self.pool)
        .await
    }

    pub async fn delete(&self, user_id: Uuid, token: &str) -> Result<u64, sqlx_core::Error> {
        query!(
            r#"
            DELETE FROM device_tokens
            WHERE user_id = $1 AND token = $2
            "#,
            user_id,
            token
        )
        .execute(self.pool)
        .await
        .map(|result| result.rows_affected())
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<DeviceToken>, sqlx_core::Error> {
        query_as!(
            DeviceToken,
            r#"
            SELECT
                token_id,
                user_id,
                token,
                device_type,
                last_used,
                is_active,
                created_at
            FROM device_tokens
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
            user_id
        )
        .fetch_all(self.pool)
        .await
    }

    pub async fn list_active_by_users(
        &self,
        user_ids: &[Uuid],
    ) -> Result<Vec<DeviceToken>, sqlx_core::Error> {
        query_as!(
            DeviceToken,
            r#"
            SELECT
                token_id,
                user_id,
                token,
                device_type,
                last_used,
                is_active,
                created_at
            FROM device_tokens
            WHERE user_id = ANY($1) AND is_active = TRUE
            ORDER BY created_at ASC
            "#,
            user_ids
        )
        .fetch_all(self.pool)
        .await
    }

    pub async fn touch(&self, tokens: &[String]) -> Result<u64, sqlx_core::Error> {
        query!(
            r#"
            UPDATE device_tokens
            SET last_used = $2
            WHERE token = ANY($1)
            "#,
            tokens,
            Utc::now()
        )
        .execute(self.pool)
        .await
        .map(|result| result.rows_affected())
    }
}
