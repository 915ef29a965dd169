/// Middleware for the API server
///
/// - `security`: security response headers
/// - `auth`: bearer-token authentication for protected routes

pub mod auth;
pub mod security;
