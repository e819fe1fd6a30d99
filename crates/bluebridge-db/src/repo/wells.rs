use super::prelude::*;

macro_rules! well_columns {
    () => {
        r#"
        id,
        esp_id,
        well_name,
        well_owner,
        owner_id,
        well_location,
        well_water_type,
        well_capacity,
        well_water_level,
        well_water_consumption,
        water_quality,
        extra_data,
        well_status,
        last_updated,
        created_at,
        updated_at
        "#
    };
}

// Each filter is bound even when absent; `$n IS NULL` disables it.
macro_rules! well_filter_clause {
    () => {
        r#"
        WHERE ($1::text IS NULL OR well_owner = $1)
          AND ($2::text IS NULL OR well_name ILIKE '%' || $2 || '%')
          AND ($3::text IS NULL OR well_status = $3)
          AND ($4::text IS NULL OR well_water_type = $4)
          AND ($5::text IS NULL OR esp_id = $5)
          AND ($6::float8 IS NULL OR well_water_level >= $6)
          AND ($7::float8 IS NULL OR well_water_level <= $7)
        "#
    };
}

/// Attribute filters for the wells listing.
#[derive(Debug, Default, Clone)]
pub struct WellFilter {
    pub owner: Option<String>,
    pub name_contains: Option<String>,
    pub status: Option<String>,
    pub water_type: Option<String>,
    pub esp_id: Option<String>,
    pub min_water_level: Option<f64>,
    pub max_water_level: Option<f64>,
}

pub struct WellRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> WellRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Inserts `well` and returns the stored row. `well.id` is ignored.
    pub async fn create(&self, well: &Well) -> Result<Well, sqlx_core::Error> {
        query_as!(
            Well,
            concat!(
                r#"
                INSERT INTO wells (
                    esp_id,
                    well_name,
                    well_owner,
                    owner_id,
                    well_location,
                    well_water_type,
                    well_capacity,
                    well_water_level,
                    well_water_consumption,
                    water_quality,
                    extra_data,
                    well_status,
                    last_updated,
                    created_at,
                    updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                RETURNING "#,
                well_columns!()
            ),
            well.esp_id.as_str(),
            well.well_name.as_str(),
            well.well_owner.as_deref(),
            well.owner_id,
            well.well_location.as_ref().map(|loc| Json(loc.0)),
            well.well_water_type.as_str(),
            well.well_capacity,
            well.well_water_level,
            well.well_water_consumption,
            well.water_quality.as_ref().map(|quality| Json(quality.0)),
            Json(&well.extra_data.0),
            well.well_status.as_str(),
            well.last_updated,
            well.created_at,
            well.updated_at
        )
        .fetch_one(self.pool)
        .await
    }

    pub async fn get_by_esp_id(&self, esp_id: &str) -> Result<Option<Well>, sqlx_core::Error> {
        query_as!(
            Well,
            concat!("SELECT ", well_columns!(), " FROM wells WHERE esp_id = $1"),
            esp_id
        )
        .fetch_optional(self.pool)
        .await
    }

    /// Writes every mutable column of `well`, matched by `esp_id`.
    pub async fn update(&self, well: &Well) -> Result<u64, sqlx_core::Error> {
        query!(
            r#"
            UPDATE wells
            SET well_name = $2,
                well_owner = $3,
                well_location = $4,
                well_water_type = $5,
                well_capacity = $6,
                well_water_level = $7,
                well_water_consumption = $8,
                water_quality = $9,
                extra_data = $10,
                well_status = $11,
                last_updated = $12,
                updated_at = $13
            WHERE esp_id = $1
            "#,
            well.esp_id.as_str(),
            well.well_name.as_str(),
            well.well_owner.as_deref(),
            well.well_location.as_ref().map(|loc| Json(loc.0)),
            well.well_water_type.as_str(),
            well.well_capacity,
            well.well_water_level,
            well.well_water_consumption,
            well.water_quality.as_ref().map(|quality| Json(quality.0)),
            Json(&well.extra_data.0),
            well.well_status.as_str(),
            well.last_updated,
            Utc::now()
        )
        .execute(self.pool)
        .await
        .map(|result| result.rows_affected())
    }

    pub async fn update_water_level(
        &self,
        esp_id: &str,
        water_level: f64,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx_core::Error> {
        query!(
            r#"
            UPDATE wells
            SET well_water_level = $2,
                last_updated = $3,
                updated_at = $3
            WHERE esp_id = $1
            "#,
            esp_id,
            water_level,
            now
        )
        .execute(self.pool)
        .await
        .map(|result| result.rows_affected())
    }

    pub async fn update_water_quality(
        &self,
        esp_id: &str,
        quality: &WaterQuality,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx_core::Error> {
        query!(
            r#"
            UPDATE wells
            SET water_quality = $2,
                last_updated = $3,
                updated_at = $3
            WHERE esp_id = $1
            "#,
            esp_id,
            Json(quality),
            now
        )
        .execute(self.pool)
        .await
        .map(|result| result.rows_affected())
    }

    pub async fn delete_by_esp_id(&self, esp_id: &str) -> Result<u64, sqlx_core::Error> {
        query!("DELETE FROM wells WHERE esp_id = $1", esp_id)
            .execute(self.pool)
            .await
            .map(|result| result.rows_affected())
    }

    pub async fn list_by_status(&self, status: &str) -> Result<Vec<Well>, sqlx_core::Error> {
        query_as!(
            Well,
            concat!(
                "SELECT ",
                well_columns!(),
                " FROM wells WHERE well_status = $1 ORDER BY well_name ASC, id ASC"
            ),
            status
        )
        .fetch_all(self.pool)
        .await
    }

    pub async fn list_with_location(&self) -> Result<Vec<Well>, sqlx_core::Error> {
        query_as!(
            Well,
            concat!(
                "SELECT ",
                well_columns!(),
                " FROM wells WHERE well_location IS NOT NULL AND well_location <> 'null'::jsonb",
                " ORDER BY well_name ASC, id ASC"
            )
        )
        .fetch_all(self.pool)
        .await
    }

    pub async fn count(&self, filter: &WellFilter) -> Result<i64, sqlx_core::Error> {
        let (total,) = query_as!(
            (i64,),
            concat!("SELECT COUNT(*) FROM wells", well_filter_clause!()),
            filter.owner.as_deref(),
            filter.name_contains.as_deref(),
            filter.status.as_deref(),
            filter.water_type.as_deref(),
            filter.esp_id.as_deref(),
            filter.min_water_level,
            filter.max_water_level
        )
        .fetch_one(self.pool)
        .await?;
        Ok(total)
    }

    /// Filtered page ordered by name. `limit = None` returns every match.
    pub async fn list(
        &self,
        filter: &WellFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<Well>, sqlx_core::Error> {
        query_as!(
            Well,
            concat!(
                "SELECT ",
                well_columns!(),
                " FROM wells",
                well_filter_clause!(),
                " ORDER BY well_name ASC, id ASC LIMIT $8 OFFSET $9"
            ),
            filter.owner.as_deref(),
            filter.name_contains.as_deref(),
            filter.status.as_deref(),
            filter.water_type.as_deref(),
            filter.esp_id.as_deref(),
            filter.min_water_level,
            filter.max_water_level,
            limit,
            offset
        )
        .fetch_all(self.pool)
        .await
    }

    pub async fn aggregates(
        &self,
        updated_since: DateTime<Utc>,
    ) -> Result<WellAggregates, sqlx_core::Error> {
        query_as!(
            WellAggregates,
            r#"
            SELECT
                COUNT(*) AS total_wells,
                AVG(well_capacity) AS avg_capacity,
                AVG(well_water_level) AS avg_water_level,
                AVG(well_water_consumption) AS avg_consumption,
                SUM(well_capacity) AS total_capacity,
                SUM(well_water_level) AS total_water_level,
                COUNT(*) FILTER (WHERE last_updated >= $1) AS recently_updated
            FROM wells
            "#,
            updated_since
        )
        .fetch_one(self.pool)
        .await
    }

    pub async fn status_counts(&self) -> Result<Vec<(String, i64)>, sqlx_core::Error> {
        query_as!(
            (String, i64),
            r#"
            SELECT well_status, COUNT(*)
            FROM wells
            GROUP BY well_status
            ORDER BY well_status
            "#
        )
        .fetch_all(self.pool)
        .await
    }

    pub async fn water_type_counts(&self) -> Result<Vec<(String, i64)>, sqlx_core::Error> {
        query_as!(
            (String, i64),
            r#"
            SELECT well_water_type, COUNT(*)
            FROM wells
            GROUP BY well_water_type
            ORDER BY well_water_type
            "#
        )
        .fetch_all(self.pool)
        .await
    }
}
