use bluebridge_core::{
    is_valid_coordinate, new_login_token, non_empty, normalize_email, DeleteAccountRequest,
    DeviceType, GeoPoint, LoginRequest, NotificationPreferences, Numeric, RegisterRequest,
    UpdateProfileRequest, User, UserLocation, UserResponse, UserRole, WaterNeed,
};
use bluebridge_db::repo::{DeviceTokenRepo, ProfileUpdate, UserRepo};
use chrono::Utc;
use serde_json::Value;
use sqlx_core::types::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::domains::auth::core::identity::user_from_email_token;
use crate::domains::auth::core::passwords::{check_stored_password, hash_password, PasswordMatch};
use crate::domains::errors::ServiceError;
use crate::infra::metrics;

pub struct RegisterCommand {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub username: Option<String>,
    pub phone_number: Option<String>,
    pub role: UserRole,
    pub location: Option<UserLocation>,
    pub water_needs: Vec<WaterNeed>,
    pub notification_preferences: NotificationPreferences,
    pub is_well_owner: bool,
    pub theme_preference: i32,
    pub device_token: Option<String>,
}

impl TryFrom<RegisterRequest> for RegisterCommand {
    type Error = ServiceError;

    fn try_from(payload: RegisterRequest) -> Result<Self, Self::Error> {
        let (Some(email), Some(password), Some(first_name), Some(last_name)) = (
            non_empty(payload.email.as_deref()),
            payload.password.as_deref().filter(|value| !value.is_empty()),
            non_empty(payload.first_name.as_deref()),
            non_empty(payload.last_name.as_deref()),
        ) else {
            return Err(ServiceError::BadRequest("Missing required fields"));
        };
        Ok(Self {
            email: normalize_email(email),
            password: password.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            username: non_empty(payload.username.as_deref()).map(str::to_string),
            phone_number: non_empty(payload.phone_number.as_deref()).map(str::to_string),
            role: payload.role.unwrap_or_default(),
            location: payload.location,
            water_needs: payload.water_needs.unwrap_or_default(),
            notification_preferences: payload.notification_preferences.unwrap_or_default(),
            is_well_owner: payload.is_well_owner.unwrap_or(false),
            theme_preference: payload.theme_preference.unwrap_or(0),
            device_token: non_empty(payload.device_token.as_deref()).map(str::to_string),
        })
    }
}

pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    fn parse(email: Option<&str>, password: Option<&str>) -> Result<Self, ServiceError> {
        match (non_empty(email), password.filter(|value| !value.is_empty())) {
            (Some(email), Some(password)) => Ok(Self {
                email: normalize_email(email),
                password: password.to_string(),
            }),
            _ => Err(ServiceError::BadRequest("Email and password required")),
        }
    }
}

impl TryFrom<LoginRequest> for Credentials {
    type Error = ServiceError;

    fn try_from(payload: LoginRequest) -> Result<Self, Self::Error> {
        Self::parse(payload.email.as_deref(), payload.password.as_deref())
    }
}

pub struct DeleteAccountCommand {
    pub credentials: Credentials,
    pub login_token: Option<String>,
}

impl TryFrom<DeleteAccountRequest> for DeleteAccountCommand {
    type Error = ServiceError;

    fn try_from(payload: DeleteAccountRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            credentials: Credentials::parse(payload.email.as_deref(), payload.password.as_deref())?,
            login_token: non_empty(payload.login_token.as_deref()).map(str::to_string),
        })
    }
}

pub struct UpdateProfileCommand {
    pub email: String,
    pub login_token: String,
    pub update: ProfileUpdate,
}

impl TryFrom<UpdateProfileRequest> for UpdateProfileCommand {
    type Error = ServiceError;

    fn try_from(payload: UpdateProfileRequest) -> Result<Self, Self::Error> {
        let (Some(email), Some(login_token)) = (
            non_empty(payload.email.as_deref()),
            non_empty(payload.login_token.as_deref()),
        ) else {
            return Err(ServiceError::BadRequest("Email and token are required"));
        };
        let text = |value: &Option<String>| non_empty(value.as_deref()).map(str::to_string);
        let location = payload.location.as_ref().and_then(|location| {
            match (
                location.latitude.as_ref().and_then(Numeric::as_f64),
                location.longitude.as_ref().and_then(Numeric::as_f64),
            ) {
                (Some(latitude), Some(longitude)) => {
                    Some(UserLocation::now(GeoPoint::new(latitude, longitude)))
                }
                _ => None,
            }
        });
        Ok(Self {
            email: email.to_string(),
            login_token: login_token.to_string(),
            update: ProfileUpdate {
                first_name: text(&payload.first_name),
                last_name: text(&payload.last_name),
                username: text(&payload.username),
                phone_number: text(&payload.phone_number),
                theme_preference: payload.theme_preference,
                location,
            },
        })
    }
}

fn db_error(event: &'static str, err: &sqlx_core::Error) -> ServiceError {
    tracing::error!(event, error = %err, "DB error");
    ServiceError::DbError
}

fn invalid_credentials(event: &'static str) -> ServiceError {
    metrics::auth_event(event, "rejected");
    ServiceError::Unauthorized("Invalid credentials")
}

async fn check_password(
    state: &AppState,
    operation: &'static str,
    user: &User,
    password: &str,
) -> Result<PasswordMatch, ServiceError> {
    let _permit = metrics::acquire_kdf_permit(&state.argon2_semaphore, operation)
        .await
        .map_err(|()| {
            tracing::error!(event = "auth_kdf_unavailable", operation);
            ServiceError::Internal("kdf_unavailable")
        })?;
    Ok(check_stored_password(&user.password_hash, password))
}

/// Replaces a plaintext password row with an argon2 hash. Failures are logged
/// and the row is retried on the next login.
async fn upgrade_legacy_password(state: &AppState, user: &User, password: &str) {
    let hashed = {
        let Ok(_permit) =
            metrics::acquire_kdf_permit(&state.argon2_semaphore, "auth_rehash").await
        else {
            return;
        };
        hash_password(password)
    };
    let result = match hashed {
        Ok(hash) => UserRepo::new(&state.db)
            .update_password_hash(user.user_id, &hash)
            .await
            .map_err(|err| err.to_string()),
        Err(reason) => Err(reason.to_string()),
    };
    match result {
        Ok(_) => tracing::info!(event = "auth_password_rehashed", user_id = %user.user_id),
        Err(error) => {
            tracing::warn!(event = "auth_password_rehash_failed", user_id = %user.user_id, error = %error);
        }
    }
}

/// Login view: unknown location and water needs get placeholders.
#[must_use]
pub fn session_view(user: &User) -> UserResponse {
    let mut view = UserResponse::with_token(user);
    if view.location.is_none() {
        view.location = Some(UserLocation::never());
    }
    view
}

pub async fn register(state: &AppState, cmd: RegisterCommand) -> Result<User, ServiceError> {
    let users = UserRepo::new(&state.db);
    if users
        .get_by_email(&cmd.email)
        .await
        .map_err(|err| db_error("auth_register_lookup_failed", &err))?
        .is_some()
    {
        metrics::auth_event("register", "conflict");
        return Err(ServiceError::Conflict("User already exists"));
    }

    let password_hash = {
        let _permit = metrics::acquire_kdf_permit(&state.argon2_semaphore, "auth_register")
            .await
            .map_err(|()| ServiceError::Internal("kdf_unavailable"))?;
        hash_password(&cmd.password).map_err(|reason| {
            tracing::error!(event = "auth_register_failed", reason);
            ServiceError::Internal(reason)
        })?
    };

    let now = Utc::now();
    let user = User {
        user_id: Uuid::new_v4(),
        email: cmd.email,
        password_hash,
        first_name: cmd.first_name,
        last_name: cmd.last_name,
        username: cmd.username,
        role: cmd.role,
        location: cmd.location.map(Json),
        water_needs: Json(cmd.water_needs),
        notification_preferences: Json(cmd.notification_preferences),
        login_token: Some(new_login_token()),
        phone_number: cmd.phone_number,
        theme_preference: cmd.theme_preference,
        last_active: Some(now),
        is_active: true,
        registration_date: now,
        is_well_owner: cmd.is_well_owner,
        allow_location_sharing: true,
        created_at: now,
        updated_at: now,
    };
    if let Err(err) = users.create(&user).await {
        if err
            .as_database_error()
            .is_some_and(|db_err| db_err.is_unique_violation())
        {
            metrics::auth_event("register", "conflict");
            return Err(ServiceError::Conflict("User already exists"));
        }
        return Err(db_error("auth_register_failed", &err));
    }

    if let Some(token) = cmd.device_token.as_deref() {
        if let Err(err) = DeviceTokenRepo::new(&state.db)
            .upsert(user.user_id, token, DeviceType::Android)
            .await
        {
            tracing::warn!(event = "device_token_register_failed", user_id = %user.user_id, error = %err);
        }
    }

    if let Some(mailer) = state.mailer.clone() {
        let email = user.email.clone();
        let full_name = user.display_name();
        tokio::spawn(async move {
            if let Err(err) = mailer.send_welcome(&email, &full_name).await {
                tracing::warn!(event = "welcome_email_failed", error = %err);
            }
        });
    }

    metrics::auth_event("register", "ok");
    tracing::info!(event = "user_registered", user_id = %user.user_id);
    Ok(user)
}

pub async fn login(state: &AppState, credentials: Credentials) -> Result<User, ServiceError> {
    let users = UserRepo::new(&state.db);
    let Some(mut user) = users
        .get_by_email(&credentials.email)
        .await
        .map_err(|err| db_error("auth_login_lookup_failed", &err))?
    else {
        return Err(invalid_credentials("login"));
    };
    match check_password(state, "auth_login", &user, &credentials.password).await? {
        PasswordMatch::Mismatch => {
            tracing::info!(event = "auth_login_rejected", user_id = %user.user_id);
            return Err(invalid_credentials("login"));
        }
        PasswordMatch::Legacy => upgrade_legacy_password(state, &user, &credentials.password).await,
        PasswordMatch::Hashed => {}
    }

    let token = new_login_token();
    let now = Utc::now();
    users
        .rotate_login_token(user.user_id, &token, now)
        .await
        .map_err(|err| db_error("auth_login_rotate_failed", &err))?;
    user.login_token = Some(token);
    user.last_active = Some(now);
    user.updated_at = now;

    metrics::auth_event("login", "ok");
    tracing::info!(event = "auth_login_ok", user_id = %user.user_id);
    Ok(user)
}

pub async fn delete_account(state: &AppState, cmd: DeleteAccountCommand) -> Result<(), ServiceError> {
    let users = UserRepo::new(&state.db);
    let Some(user) = users
        .get_by_email(&cmd.credentials.email)
        .await
        .map_err(|err| db_error("auth_delete_lookup_failed", &err))?
    else {
        return Err(invalid_credentials("delete_account"));
    };
    // A missing token is a mismatch like any other.
    if !cmd
        .login_token
        .as_deref()
        .is_some_and(|token| user.token_matches(token))
    {
        return Err(invalid_credentials("delete_account"));
    }
    if !check_password(state, "auth_delete", &user, &cmd.credentials.password)
        .await?
        .is_match()
    {
        return Err(invalid_credentials("delete_account"));
    }

    users
        .delete_with_tokens(user.user_id)
        .await
        .map_err(|err| db_error("auth_delete_failed", &err))?;
    metrics::auth_event("delete_account", "ok");
    tracing::info!(event = "account_deleted", user_id = %user.user_id);
    Ok(())
}

async fn reload(state: &AppState, user_id: Uuid, event: &'static str) -> Result<User, ServiceError> {
    UserRepo::new(&state.db)
        .get_by_id(user_id)
        .await
        .map_err(|err| db_error(event, &err))?
        .ok_or(ServiceError::NotFound("User not found"))
}

pub async fn update_profile(state: &AppState, cmd: UpdateProfileCommand) -> Result<User, ServiceError> {
    let user = user_from_email_token(state, &cmd.email, &cmd.login_token).await?;
    UserRepo::new(&state.db)
        .update_profile(user.user_id, &cmd.update)
        .await
        .map_err(|err| db_error("profile_update_failed", &err))?;
    tracing::info!(event = "profile_updated", user_id = %user.user_id);
    reload(state, user.user_id, "profile_reload_failed").await
}

/// Both coordinates are required and must be within range.
pub fn parse_coordinates(
    latitude: Option<&Numeric>,
    longitude: Option<&Numeric>,
) -> Result<GeoPoint, ServiceError> {
    let (Some(latitude), Some(longitude)) = (
        latitude.and_then(Numeric::as_f64),
        longitude.and_then(Numeric::as_f64),
    ) else {
        return Err(ServiceError::BadRequest("Latitude and longitude are required"));
    };
    if !is_valid_coordinate(latitude, longitude) {
        return Err(ServiceError::BadRequest("Invalid coordinates"));
    }
    Ok(GeoPoint::new(latitude, longitude))
}

pub async fn update_location(
    state: &AppState,
    user: &User,
    point: GeoPoint,
) -> Result<UserLocation, ServiceError> {
    let location = UserLocation::now(point);
    UserRepo::new(&state.db)
        .update_location(user.user_id, &location)
        .await
        .map_err(|err| db_error("location_update_failed", &err))?;
    tracing::info!(event = "location_updated", user_id = %user.user_id);
    Ok(location)
}

pub async fn update_water_needs(
    state: &AppState,
    user: &User,
    water_needs: Option<Vec<WaterNeed>>,
) -> Result<Vec<WaterNeed>, ServiceError> {
    let Some(water_needs) = water_needs else {
        return Err(ServiceError::BadRequest("Water needs array is required"));
    };
    UserRepo::new(&state.db)
        .update_water_needs(user.user_id, &water_needs)
        .await
        .map_err(|err| db_error("water_needs_update_failed", &err))?;
    tracing::info!(
        event = "water_needs_updated",
        user_id = %user.user_id,
        entries = water_needs.len()
    );
    Ok(water_needs)
}

/// Accepts only the strings `"true"` and `"false"`, ignoring case.
pub fn parse_sharing_flag(message: Option<&Value>) -> Result<bool, ServiceError> {
    match message {
        None => Err(ServiceError::BadRequest("Message field is required")),
        Some(Value::String(text)) => match text.to_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(ServiceError::BadRequest(
                "Invalid message value. Must be 'true' or 'false'.",
            )),
        },
        Some(_) => Err(ServiceError::BadRequest(
            "Invalid message type. Must be a string 'true' or 'false'.",
        )),
    }
}

pub async fn set_location_sharing(
    state: &AppState,
    user: &User,
    allow: bool,
) -> Result<(), ServiceError> {
    UserRepo::new(&state.db)
        .set_location_sharing(user.user_id, allow)
        .await
        .map_err(|err| db_error("location_sharing_update_failed", &err))?;
    tracing::info!(event = "location_sharing_updated", user_id = %user.user_id, allow);
    Ok(())
}
