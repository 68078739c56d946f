pub mod credentials;
pub mod identity;
pub mod images;

pub use credentials::{PasswordHasher, TokenIssuer};
pub use identity::{ExternalIdentity, IdentityVerifier};
pub use images::ImageStore;
