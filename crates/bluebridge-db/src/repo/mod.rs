macro_rules! query {
    ($sql:expr $(, $arg:expr)* $(,)?) => {{
        #[allow(unused_mut)]
        let mut q = sqlx_core::query::query::<sqlx_postgres::Postgres>($sql);
        $(q = q.bind($arg);)*
        q
    }};
}

macro_rules! query_as {
    ($ty:ty, $sql:expr $(, $arg:expr)* $(,)?) => {{
        #[allow(unused_mut)]
        let mut q = sqlx_core::query_as::query_as::<sqlx_postgres::Postgres, $ty>($sql);
        $(q = q.bind($arg);)*
        q
    }};
}

pub(crate) mod prelude {
    pub(crate) use crate::PgPool;
    pub(crate) use bluebridge_core::{
        BugReport, DeviceToken, DeviceType, User, UserLocation, WaterNeed, WaterQuality, Well,
        WellAggregates,
    };
    pub(crate) use chrono::{DateTime, Utc};
    pub(crate) use sqlx_core::types::Json;
    pub(crate) use uuid::Uuid;
}

mod bug_reports;
mod devices;
mod users;
mod wells;

pub use bug_reports::BugReportRepo;
pub use devices::DeviceTokenRepo;
pub use users::{ProfileUpdate, UserRepo};
pub use wells::{WellFilter, WellRepo};
