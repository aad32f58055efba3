pub mod auth;
pub mod device_token;
pub mod user;

// Re-export common types
pub use auth::*;
pub use device_token::*;
pub use user::*;
