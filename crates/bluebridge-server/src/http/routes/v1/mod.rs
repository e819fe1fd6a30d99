use crate::app::AppState;
use crate::domains::{
    auth, bugreports, nearby, notifications, statistics, system, weather, wells,
};
use axum::Router;

pub fn router() -> Router<AppState> {
    // Statistics and the account routes answer under several historical prefixes.
    let api = Router::new()
        .nest("/wells", wells::http::v1::router())
        .nest("/auth", auth::http::v1::router())
        .nest("/users", auth::http::v1::router())
        .nest("/nearby-users", nearby::http::v1::router())
        .nest("/notifications", notifications::http::v1::router())
        .nest("/weather", weather::http::v1::router())
        .nest("/bugreports", bugreports::http::v1::router())
        .nest("/well-statistics", statistics::http::v1::router())
        .nest("/wellStats", statistics::http::v1::router())
        .nest("/stats", statistics::http::v1::router())
        .merge(auth::http::v1::legacy_router());

    Router::new()
        .nest("/api", api)
        .merge(system::http::v1::router())
}
