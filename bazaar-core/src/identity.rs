use anyhow::Result;
use async_trait::async_trait;

use crate::errors::BazaarError;
use crate::session::Session;

/// Hosted identity provider: account creation, sign-in and sign-out.
///
/// All methods have default implementations that fail with
/// `NotImplemented`, so a provider can override only what it supports.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account and return the resulting session.
    async fn sign_up(&self, _email: &str, _password: &str) -> Result<Session> {
        Err(BazaarError::not_implemented("Method not implemented: sign_up").into_anyhow())
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> Result<Session> {
        Err(BazaarError::not_implemented("Method not implemented: sign_in").into_anyhow())
    }

    /// `None` signs out a guest, which providers should accept.
    async fn sign_out(&self, _session: Option<&Session>) -> Result<()> {
        Err(BazaarError::not_implemented("Method not implemented: sign_out").into_anyhow())
    }
}
