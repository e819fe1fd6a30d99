use super::prelude::*;

pub struct BugReportRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> BugReportRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        name: &str,
        description: &str,
        category: &str,
        extra: &serde_json::Value,
    ) -> Result<BugReport, sqlx_core::Error> {
        query_as!(
            BugReport,
            r#"
            INSERT INTO bug_reports (name, description, category, extra, timestamp)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, category, extra, timestamp
            "#,
            name,
            description,
            category,
            Json(extra),
            Utc::now()
        )
        .fetch_one(self.pool)
        .await
    }

    pub async fn list_recent(&self, limit: i64) -> Result<Vec<BugReport>, sqlx_core::Error> {
        query_as!(
            BugReport,
            r#"
            SELECT id, name, description, category, extra, timestamp
            FROM bug_reports
            ORDER BY timestamp DESC, id DESC
            LIMIT $1
            "#,
            limit
        )
        .fetch_all(self.pool)
        .await
    }
}
