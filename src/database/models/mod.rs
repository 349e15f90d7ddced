pub mod role;
pub mod user;

pub use role::Role;
pub use user::User;

/// Sentinel placed in the password field of any outbound user
/// representation. The field stays present; only the value is replaced.
pub const REDACTED_PASSWORD: &str = "<<secret-value>>";
