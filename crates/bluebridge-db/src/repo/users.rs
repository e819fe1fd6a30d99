use super::prelude::*;

macro_rules! user_columns {
    () => {
        r#"
        user_id,
        email,
        password_hash,
        first_name,
        last_name,
        username,
        role,
        location,
        water_needs,
        notification_preferences,
        login_token,
        phone_number,
        theme_preference,
        last_active,
        is_active,
        registration_date,
        is_well_owner,
        allow_location_sharing,
        created_at,
        updated_at
        "#
    };
}

/// Optional profile fields. `None` keeps the stored value.
#[derive(Debug, Default, Clone)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub phone_number: Option<String>,
    pub theme_preference: Option<i32>,
    pub location: Option<UserLocation>,
}

pub struct UserRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &User) -> Result<(), sqlx_core::Error> {
        query!(
            r#"
            INSERT INTO users (
                user_id,
                email,
                password_hash,
                first_name,
                last_name,
                username,
                role,
                location,
                water_needs,
                notification_preferences,
                login_token,
                phone_number,
                theme_preference,
                last_active,
                is_active,
                registration_date,
                is_well_owner,
                allow_location_sharing,
                created_at,
                updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
            )
            "#,
            user.user_id,
            user.email.as_str(),
            user.password_hash.as_str(),
            user.first_name.as_str(),
            user.last_name.as_str(),
            user.username.as_deref(),
            user.role.as_i32(),
            user.location.as_ref().map(|loc| Json(&loc.0)),
            Json(&user.water_needs.0),
            Json(&user.notification_preferences.0),
            user.login_token.as_deref(),
            user.phone_number.as_deref(),
            user.theme_preference,
            user.last_active,
            user.is_active,
            user.registration_date,
            user.is_well_owner,
            user.allow_location_sharing,
            user.created_at,
            user.updated_at
        )
        .execute(self.pool)
        .await
        .map(|_| ())
    }

    pub async fn get_by_id(&self, user_id: Uuid) -> Result<Option<User>, sqlx_core::Error> {
        query_as!(
            User,
            concat!("SELECT ", user_columns!(), " FROM users WHERE user_id = $1"),
            user_id
        )
        .fetch_optional(self.pool)
        .await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, sqlx_core::Error> {
        query_as!(
            User,
            concat!("SELECT ", user_columns!(), " FROM users WHERE email = $1"),
            email
        )
        .fetch_optional(self.pool)
        .await
    }

    pub async fn get_by_email_and_token(
        &self,
        email: &str,
        login_token: &str,
    ) -> Result<Option<User>, sqlx_core::Error> {
        query_as!(
            User,
            concat!(
                "SELECT ",
                user_columns!(),
                " FROM users WHERE email = $1 AND login_token = $2"
            ),
            email,
            login_token
        )
        .fetch_optional(self.pool)
        .await
    }

    pub async fn list_all(&self) -> Result<Vec<User>, sqlx_core::Error> {
        query_as!(
            User,
            concat!("SELECT ", user_columns!(), " FROM users ORDER BY email ASC")
        )
        .fetch_all(self.pool)
        .await
    }

    pub async fn list_by_emails(&self, emails: &[String]) -> Result<Vec<User>, sqlx_core::Error> {
        query_as!(
            User,
            concat!(
                "SELECT ",
                user_columns!(),
                " FROM users WHERE email = ANY($1) ORDER BY email ASC"
            ),
            emails
        )
        .fetch_all(self.pool)
        .await
    }

    /// Users that stored a location at least once.
    pub async fn list_with_location(&self) -> Result<Vec<User>, sqlx_core::Error> {
        query_as!(
            User,
            concat!(
                "SELECT ",
                user_columns!(),
                " FROM users WHERE location IS NOT NULL AND location <> 'null'::jsonb"
            )
        )
        .fetch_all(self.pool)
        .await
    }

    pub async fn rotate_login_token(
        &self,
        user_id: Uuid,
        login_token: &str,
        last_active: DateTime<Utc>,
    ) -> Result<u64, sqlx_core::Error> {
        query!(
            r#"
            UPDATE users
            SET login_token = $2,
                last_active = $3,
                updated_at = $3
            WHERE user_id = $1
            "#,
            user_id,
            login_token,
            last_active
        )
        .execute(self.pool)
        .await
        .map(|result| result.rows_affected())
    }

    /// Replaces a legacy stored password with its hash.
    pub async fn update_password_hash(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<u64, sqlx_core::Error> {
        query!(
            r#"
            UPDATE users
            SET password_hash = $2
            WHERE user_id = $1
            "#,
            user_id,
            password_hash
        )
        .execute(self.pool)
        .await
        .map(|result| result.rows_affected())
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<u64, sqlx_core::Error> {
        query!(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                username = COALESCE($4, username),
                phone_number = COALESCE($5, phone_number),
                theme_preference = COALESCE($6, theme_preference),
                location = COALESCE($7, location),
                updated_at = $8
            WHERE user_id = $1
            "#,
            user_id,
            update.first_name.as_deref(),
            update.last_name.as_deref(),
            update.username.as_deref(),
            update.phone_number.as_deref(),
            update.theme_preference,
            update.location.as_ref().map(Json),
            Utc::now()
        )
        .execute(self.pool)
        .await
        .map(|result| result.rows_affected())
    }

    pub async fn update_location(
        &self,
        user_id: Uuid,
        location: &UserLocation,
    ) -> Result<u64, sqlx_core::Error> {
        query!(
            r#"
            UPDATE users
            SET location = $2,
                updated_at = $3
            WHERE user_id = $1
            "#,
            user_id,
            Json(location),
            Utc::now()
        )
        .execute(self.pool)
        .await
        .map(|result| result.rows_affected())
    }

    pub async fn update_water_needs(
        &self,
        user_id: Uuid,
        water_needs: &[WaterNeed],
    ) -> Result<u64, sqlx_core::Error> {
        query!(
            r#"
            UPDATE users
            SET water_needs = $2,
                updated_at = $3
            WHERE user_id = $1
            "#,
            user_id,
            Json(water_needs),
            Utc::now()
        )
        .execute(self.pool)
        .await
        .map(|result| result.rows_affected())
    }

    pub async fn set_location_sharing(
        &self,
        user_id: Uuid,
        allow: bool,
    ) -> Result<u64, sqlx_core::Error> {
        query!(
            r#"
            UPDATE users
            SET allow_location_sharing = $2,
                updated_at = $3
            WHERE user_id = $1
            "#,
            user_id,
            allow,
            Utc::now()
        )
        .execute(self.pool)
        .await
        .map(|result| result.rows_affected())
    }

    /// Removes the user and every device token it owns in a single transaction.
    pub async fn delete_with_tokens(&self, user_id: Uuid) -> Result<u64, sqlx_core::Error> {
        let mut tx = self.pool.begin().await?;
        query!("DELETE FROM device_tokens WHERE user_id = $1", user_id)
            .execute(&mut *tx)
            .await?;
        let deleted = query!("DELETE FROM users WHERE user_id = $1", user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(deleted)
    }
}
