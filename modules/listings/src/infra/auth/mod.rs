pub mod google;
pub mod jwt;
pub mod password;

pub use google::GoogleIdentityVerifier;
pub use jwt::JwtTokenIssuer;
pub use password::Argon2Hasher;
