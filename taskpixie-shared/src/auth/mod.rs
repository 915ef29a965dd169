/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and strength rules
/// - [`jwt`]: HS256 access/refresh tokens with per-token IDs
/// - [`session`]: request auth context, bearer parsing and session cache keys

pub mod jwt;
pub mod password;
pub mod session;

pub use jwt::{Claims, IssuedToken, JwtError, TokenManager, TokenType};
pub use session::AuthContext;
