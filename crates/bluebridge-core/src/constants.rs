/// Radius used when a nearby query omits one.
pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 50.0;

/// Users within this distance of a forecast point receive weather alerts.
pub const WEATHER_ALERT_RADIUS_KM: f64 = 30.0;

/// Upper bound of tokens per multicast request accepted by FCM.
pub const PUSH_MULTICAST_CHUNK: usize = 500;

pub mod wells {
    pub const DEFAULT_WATER_TYPE: &str = "Clean";
    pub const STATUS_ON_CREATE: &str = "Active";
    pub const STATUS_UNKNOWN: &str = "Unknown";
    pub const DEFAULT_PAGE_SIZE: i64 = 20;
    pub const MAX_PAGE_SIZE: i64 = 200;
}
