#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::similar_names)]

pub mod api;
pub mod auth;
pub mod constants;
pub mod geo;
pub mod models;

pub use crate::api::*;
pub use crate::auth::*;
pub use crate::constants::*;
pub use crate::geo::*;
pub use crate::models::*;
