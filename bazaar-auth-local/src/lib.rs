pub mod password;
pub mod provider;

pub use provider::{LocalIdentityOptions, LocalIdentityProvider};
