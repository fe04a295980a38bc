//! REST client for the dashboard backend.
//!
//! - `client`: transport (credentials, JSON headers, timeout, interceptors)
//! - `interceptor`: response hooks, including the session-expiry handler
//! - `resources`: one typed method per backend endpoint
//! - `error`: error taxonomy and server error body parsing

mod client;
mod error;
pub mod interceptor;
pub mod resources;


pub use client::ApiClient;
pub use error::{ApiError, FieldError};
pub use interceptor::{ResponseInterceptor, SessionExpiryInterceptor};
pub use resources::ListParams;
