use bluebridge_core::{new_login_token, GeoPoint, UserRole, WaterQuality};
use bluebridge_db::PgPool;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use sqlx_core::query::query;
use sqlx_core::types::Json;
use sqlx_postgres::Postgres;
use uuid::Uuid;

use crate::domains::auth::core::passwords::hash_password;

pub(crate) struct DemoUser {
    pub(crate) email: &'static str,
    pub(crate) password: &'static str,
    pub(crate) first_name: &'static str,
    pub(crate) last_name: &'static str,
    pub(crate) username: &'static str,
    pub(crate) role: UserRole,
}

pub(crate) struct DemoWell {
    pub(crate) esp_id: &'static str,
    pub(crate) name: &'static str,
    pub(crate) location: GeoPoint,
    pub(crate) capacity: f64,
    pub(crate) water_level: f64,
    pub(crate) consumption: f64,
    pub(crate) quality: WaterQuality,
    pub(crate) description: &'static str,
    pub(crate) access_info: &'static str,
    pub(crate) notes: &'static str,
}

const WELL_OWNER_EMAIL: &str = "owner@bluebridge.com";

pub(crate) fn demo_users() -> [DemoUser; 3] {
    [
        DemoUser {
            email: "admin@bluebridge.com",
            password: "admin123",
            first_name: "Admin",
            last_name: "User",
            username: "admin",
            role: UserRole::Admin,
        },
        DemoUser {
            email: "user@bluebridge.com",
            password: "user123",
            first_name: "Regular",
            last_name: "User",
            username: "user",
            role: UserRole::User,
        },
        DemoUser {
            email: WELL_OWNER_EMAIL,
            password: "owner123",
            first_name: "Well",
            last_name: "Owner",
            username: "owner",
            role: UserRole::WellOwner,
        },
    ]
}

pub(crate) fn demo_wells() -> [DemoWell; 2] {
    [
        DemoWell {
            esp_id: "esp32-001",
            name: "Central Park Well",
            location: GeoPoint::new(48.8589, 2.3469),
            capacity: 1000.0,
            water_level: 85.5,
            consumption: 50.0,
            quality: WaterQuality {
                ph: 7.2,
                turbidity: 0.5,
                tds: 120.0,
            },
            description: "Main water source for Central Park area",
            access_info: "24/7 access with key",
            notes: "Regular maintenance every 3 months",
        },
        DemoWell {
            esp_id: "esp32-002",
            name: "River Well",
            location: GeoPoint::new(48.857, 2.3504),
            capacity: 800.0,
            water_level: 75.0,
            consumption: 30.0,
            quality: WaterQuality {
                ph: 7.0,
                turbidity: 0.7,
                tds: 150.0,
            },
            description: "Secondary water source near the river",
            access_info: "Daytime access only",
            notes: "Water quality monitoring daily",
        },
    ]
}

#[derive(Debug, Default, Serialize)]
struct SeedOutput {
    users_created: Vec<&'static str>,
    users_skipped: Vec<&'static str>,
    wells_created: Vec<&'static str>,
    wells_skipped: Vec<&'static str>,
}

fn db_error(stage: &'static str, err: &sqlx_core::Error) -> String {
    tracing::error!(event = "seed_failed", stage, error = %err, "Seed failed");
    "db_error".to_string()
}

/// Inserts demo users and wells in one transaction. Rows that already exist
/// are left untouched.
pub async fn run(db: &PgPool) -> Result<(), String> {
    let now = Utc::now();
    let mut output = SeedOutput::default();
    let mut tx = db.begin().await.map_err(|err| db_error("begin", &err))?;

    for demo in demo_users() {
        let password_hash = hash_password(demo.password).map_err(str::to_string)?;
        let inserted = query::<Postgres>(
            r#"
            INSERT INTO users (
                user_id, email, password_hash, first_name, last_name, username, role,
                login_token, is_well_owner, registration_date, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10, $10)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(demo.email)
        .bind(password_hash)
        .bind(demo.first_name)
        .bind(demo.last_name)
        .bind(demo.username)
        .bind(demo.role.as_i32())
        .bind(new_login_token())
        .bind(demo.role == UserRole::WellOwner)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|err| db_error("users", &err))?
        .rows_affected();
        if inserted > 0 {
            output.users_created.push(demo.email);
        } else {
            output.users_skipped.push(demo.email);
        }
    }

    for demo in demo_wells() {
        let inserted = query::<Postgres>(
            r#"
            INSERT INTO wells (
                esp_id, well_name, well_owner, owner_id, well_location, well_water_type,
                well_capacity, well_water_level, well_water_consumption, water_quality,
                extra_data, well_status, last_updated, created_at, updated_at
            )
            VALUES (
                $1, $2, $3, (SELECT user_id FROM users WHERE email = $3), $4, 'Clean',
                $5, $6, $7, $8, $9, 'Active', $10, $10, $10
            )
            ON CONFLICT (esp_id) DO NOTHING
            "#,
        )
        .bind(demo.esp_id)
        .bind(demo.name)
        .bind(WELL_OWNER_EMAIL)
        .bind(Json(demo.location))
        .bind(demo.capacity)
        .bind(demo.water_level)
        .bind(demo.consumption)
        .bind(Json(demo.quality))
        .bind(Json(json!({
            "description": demo.description,
            "contactInfo": "Contact well owner for access",
            "accessInfo": demo.access_info,
            "notes": demo.notes,
        })))
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|err| db_error("wells", &err))?
        .rows_affected();
        if inserted > 0 {
            output.wells_created.push(demo.esp_id);
        } else {
            output.wells_skipped.push(demo.esp_id);
        }
    }

    tx.commit().await.map_err(|err| db_error("commit", &err))?;
    tracing::info!(
        event = "seed_completed",
        users = output.users_created.len(),
        wells = output.wells_created.len()
    );
    let rendered = serde_json::to_string_pretty(&output)
        .map_err(|err| format!("seed_output_failed: {err}"))?;
    println!("{rendered}");
    Ok(())
}
