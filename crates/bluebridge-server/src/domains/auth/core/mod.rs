pub mod extract;
pub mod identity;
pub mod middleware;
pub mod passwords;
pub use extract::JsonBody;
pub use middleware::token_middleware;
