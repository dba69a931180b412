//! Authentication: password hashing, JWT, register/login handlers.

mod handlers;
mod jwt;
mod password;

pub use handlers::{login, register};
pub use jwt::{Claims, IssuedToken, JwtTokenService, TokenError, TokenService};
pub use password::{Argon2Hasher, HashError, PasswordHasher};
