pub mod email;
pub mod metrics;
pub mod push;
pub mod weather;
