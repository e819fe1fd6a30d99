use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::Serialize;

use crate::{round2, WellAggregates};

#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WellStatistics {
    pub total_wells: i64,
    pub avg_capacity: f64,
    pub avg_water_level: f64,
    pub avg_consumption: f64,
    pub total_capacity: f64,
    pub total_water_level: f64,
    pub percentage_available: f64,
    pub status_counts: BTreeMap<String, i64>,
    pub water_type_counts: BTreeMap<String, i64>,
    pub recently_updated: i64,
}

impl WellStatistics {
    #[must_use]
    pub fn from_parts(
        aggregates: &WellAggregates,
        status_counts: BTreeMap<String, i64>,
        water_type_counts: BTreeMap<String, i64>,
    ) -> Self {
        let total_capacity = aggregates.total_capacity.unwrap_or(0.0);
        let total_water_level = aggregates.total_water_level.unwrap_or(0.0);
        let percentage_available = if total_capacity > 0.0 {
            total_water_level / total_capacity * 100.0
        } else {
            0.0
        };
        Self {
            total_wells: aggregates.total_wells,
            avg_capacity: round2(aggregates.avg_capacity.unwrap_or(0.0)),
            avg_water_level: round2(aggregates.avg_water_level.unwrap_or(0.0)),
            avg_consumption: round2(aggregates.avg_consumption.unwrap_or(0.0)),
            total_capacity: round2(total_capacity),
            total_water_level: round2(total_water_level),
            percentage_available: round2(percentage_available),
            status_counts,
            water_type_counts,
            recently_updated: aggregates.recently_updated,
        }
    }
}
