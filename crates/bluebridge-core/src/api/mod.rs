pub mod common;
pub mod notifications;
pub mod stats;
pub mod users;
pub mod weather;
pub mod wells;

pub use common::*;
pub use notifications::*;
pub use stats::*;
pub use users::*;
pub use weather::*;
pub use wells::*;
