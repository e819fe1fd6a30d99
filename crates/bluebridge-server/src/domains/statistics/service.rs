use std::collections::BTreeMap;

use bluebridge_core::WellStatistics;
use bluebridge_db::repo::WellRepo;
use chrono::{Duration, Utc};

use crate::app::AppState;
use crate::domains::errors::ServiceError;

const RECENT_WINDOW_HOURS: i64 = 24;

pub async fn well_statistics(state: &AppState) -> Result<WellStatistics, ServiceError> {
    let repo = WellRepo::new(&state.db);
    let since = Utc::now() - Duration::hours(RECENT_WINDOW_HOURS);

    let aggregates = repo.aggregates(since).await.map_err(|err| {
        tracing::error!(event = "well_stats_failed", query = "aggregates", error = %err);
        ServiceError::DbError
    })?;
    let status_counts = repo.status_counts().await.map_err(|err| {
        tracing::error!(event = "well_stats_failed", query = "status_counts", error = %err);
        ServiceError::DbError
    })?;
    let water_type_counts = repo.water_type_counts().await.map_err(|err| {
        tracing::error!(event = "well_stats_failed", query = "water_type_counts", error = %err);
        ServiceError::DbError
    })?;

    let stats = WellStatistics::from_parts(
        &aggregates,
        status_counts.into_iter().collect::<BTreeMap<_, _>>(),
        water_type_counts.into_iter().collect::<BTreeMap<_, _>>(),
    );
    tracing::debug!(event = "well_stats", total_wells = stats.total_wells);
    Ok(stats)
}
