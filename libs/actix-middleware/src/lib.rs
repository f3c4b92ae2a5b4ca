//! # Actix Middleware Library
//!
//! Middleware components shared by the platform's Actix services.
//!
//! ## Modules
//! - `jwt_auth`: JWT authentication middleware and token validation
//! - `request_id`: X-Request-ID propagation
//! - `logging`: request/response logging

pub mod jwt_auth;
pub mod logging;
pub mod request_id;

pub use jwt_auth::{Claims, JwtAuth, JwtValidator, UserId};
pub use logging::Logging;
pub use request_id::RequestId;
