use bluebridge_core::{round2, GeoPoint, NearbyUser, Numeric, User, DEFAULT_NEARBY_RADIUS_KM};
use bluebridge_db::repo::UserRepo;

use crate::app::AppState;
use crate::domains::errors::ServiceError;

pub struct NearbyUsersCommand {
    pub center: GeoPoint,
    pub radius_km: f64,
}

impl NearbyUsersCommand {
    pub fn parse(
        latitude: Option<&Numeric>,
        longitude: Option<&Numeric>,
        radius: Option<&Numeric>,
    ) -> Result<Self, ServiceError> {
        let (Some(latitude), Some(longitude)) = (
            latitude.and_then(Numeric::as_f64),
            longitude.and_then(Numeric::as_f64),
        ) else {
            return Err(ServiceError::BadRequest(
                "Missing required fields: latitude and longitude",
            ));
        };
        Ok(Self {
            center: GeoPoint::new(latitude, longitude),
            radius_km: radius
                .and_then(Numeric::as_f64)
                .unwrap_or(DEFAULT_NEARBY_RADIUS_KM),
        })
    }
}

/// Users sharing their location within the radius, closest first. The caller
/// is matched by email and never listed.
pub fn rank_users(
    users: &[User],
    center: GeoPoint,
    radius_km: f64,
    exclude_email: &str,
) -> Vec<NearbyUser> {
    let mut nearby: Vec<NearbyUser> = users
        .iter()
        .filter(|user| user.allow_location_sharing && user.email != exclude_email)
        .filter_map(|user| {
            let point = user.point()?;
            let distance = round2(center.distance_km(&point));
            (distance <= radius_km).then(|| NearbyUser {
                user_id: user.user_id,
                username: user.username.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                email: user.email.clone(),
                water_needs: user.water_needs.0.clone(),
                distance,
                latitude: point.latitude,
                longitude: point.longitude,
            })
        })
        .collect();
    nearby.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    nearby
}

pub async fn nearby_users(
    state: &AppState,
    caller: &User,
    cmd: NearbyUsersCommand,
) -> Result<Vec<NearbyUser>, ServiceError> {
    let users = UserRepo::new(&state.db)
        .list_with_location()
        .await
        .map_err(|err| {
            tracing::error!(event = "nearby_users_failed", error = %err);
            ServiceError::DbError
        })?;
    let nearby = rank_users(&users, cmd.center, cmd.radius_km, &caller.email);
    tracing::info!(
        event = "nearby_users",
        scanned = users.len(),
        matched = nearby.len(),
        radius_km = cmd.radius_km
    );
    Ok(nearby)
}
