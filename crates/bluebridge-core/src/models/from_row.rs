#[cfg(feature = "postgres")]
use sqlx_core::from_row::FromRow;
#[cfg(feature = "postgres")]
use sqlx_core::row::Row;
#[cfg(feature = "postgres")]
use sqlx_postgres::PgRow;

#[cfg(feature = "postgres")]
use super::*;

#[cfg(feature = "postgres")]
fn parse_enum<T: TryFrom<i32, Error = EnumParseError>>(value: i16) -> Result<T, sqlx_core::Error> {
    T::try_from(i32::from(value)).map_err(|err| sqlx_core::Error::Decode(Box::new(err)))
}

macro_rules! impl_from_row {
    ($ty:ty, $row:ident => $body:block) => {
        #[cfg(feature = "postgres")]
        impl FromRow<'_, PgRow> for $ty {
            fn from_row($row: &PgRow) -> Result<Self, sqlx_core::Error> {
                $body
            }
        }
    };
}

impl_from_row!(User, row => {
        let role: i16 = row.try_get("role")?;
        Ok(Self {
            user_id: row.try_get("user_id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            username: row.try_get("username")?,
            role: parse_enum(role)?,
            location: row.try_get("location")?,
            water_needs: row.try_get("water_needs")?,
            notification_preferences: row.try_get("notification_preferences")?,
            login_token: row.try_get("login_token")?,
            phone_number: row.try_get("phone_number")?,
            theme_preference: row.try_get("theme_preference")?,
            last_active: row.try_get("last_active")?,
            is_active: row.try_get("is_active")?,
            registration_date: row.try_get("registration_date")?,
            is_well_owner: row.try_get("is_well_owner")?,
            allow_location_sharing: row.try_get("allow_location_sharing")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
);

impl_from_row!(DeviceToken, row => {
        let device_type: i16 = row.try_get("device_type")?;
        Ok(Self {
            token_id: row.try_get("token_id")?,
            user_id: row.try_get("user_id")?,
            token: row.try_get("token")?,
            device_type: parse_enum(device_type)?,
            last_used: row.try_get("last_used")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
        })
    }
);

impl_from_row!(Well, row => {
        Ok(Self {
            id: row.try_get("id")?,
            esp_id: row.try_get("esp_id")?,
            well_name: row.try_get("well_name")?,
            well_owner: row.try_get("well_owner")?,
            owner_id: row.try_get("owner_id")?,
            well_location: row.try_get("well_location")?,
            well_water_type: row.try_get("well_water_type")?,
            well_capacity: row.try_get("well_capacity")?,
            well_water_level: row.try_get("well_water_level")?,
            well_water_consumption: row.try_get("well_water_consumption")?,
            water_quality: row.try_get("water_quality")?,
            extra_data: row.try_get("extra_data")?,
            well_status: row.try_get("well_status")?,
            last_updated: row.try_get("last_updated")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
);

impl_from_row!(BugReport, row => {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            category: row.try_get("category")?,
            extra: row.try_get("extra")?,
            timestamp: row.try_get("timestamp")?,
        })
    }
);

impl_from_row!(WellAggregates, row => {
        Ok(Self {
            total_wells: row.try_get("total_wells")?,
            avg_capacity: row.try_get("avg_capacity")?,
            avg_water_level: row.try_get("avg_water_level")?,
            avg_consumption: row.try_get("avg_consumption")?,
            total_capacity: row.try_get("total_capacity")?,
            total_water_level: row.try_get("total_water_level")?,
            recently_updated: row.try_get("recently_updated")?,
        })
    }
);
