// Middleware modules for the auth core
// The policy gates that decorate requests with principal context

pub mod auth;
pub mod auth_middleware;

pub use auth::{AuthenticatedUser, InternalCaller};
pub use auth_middleware::{admin_middleware, auth_middleware, internal_middleware};
