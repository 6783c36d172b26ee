// In-process identity provider backed by bcrypt hashes.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use async_trait::async_trait;
use bazaar_core::errors::BazaarError;
use bazaar_core::{IdentityProvider, Session};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::password::{hash_password, normalize_email, verify_password};

#[derive(Clone, Debug)]
pub struct LocalIdentityOptions {
    pub hash_cost: u32,
    pub min_password_length: usize,
    /// Returned for every failed sign-in, whatever the cause.
    pub error_message: String,
}

impl Default for LocalIdentityOptions {
    fn default() -> Self {
        Self {
            hash_cost: 10,
            min_password_length: 6,
            error_message: "Invalid login".to_string(),
        }
    }
}

struct Account {
    user_id: String,
    /// Address as registered (trimmed, original case).
    email: String,
    password_hash: String,
}

#[derive(Default)]
pub struct LocalIdentityProvider {
    options: LocalIdentityOptions,
    accounts: RwLock<HashMap<String, Account>>,
    signed_in: RwLock<HashSet<String>>,
}

impl LocalIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: LocalIdentityOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &LocalIdentityOptions {
        &self.options
    }

    pub async fn is_signed_in(&self, user_id: &str) -> bool {
        self.signed_in.read().await.contains(user_id)
    }

    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }

    fn invalid_login(&self) -> anyhow::Error {
        BazaarError::not_authenticated(&self.options.error_message).into_anyhow()
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
        let key = normalize_email(email)?;
        let email = email.trim().to_string();

        if password.chars().count() < self.options.min_password_length {
            return Err(BazaarError::unprocessable(format!(
                "Weak password: use at least {} characters",
                self.options.min_password_length
            ))
            .into_anyhow());
        }

        let password_hash = hash_password(password, self.options.hash_cost)?;

        let user_id = {
            let mut accounts = self.accounts.write().await;
            if accounts.contains_key(&key) {
                return Err(BazaarError::conflict(format!("Email '{email}' already in use")).into_anyhow());
            }
            let user_id = Uuid::new_v4().to_string();
            accounts.insert(
                key,
                Account {
                    user_id: user_id.clone(),
                    email: email.clone(),
                    password_hash,
                },
            );
            user_id
        };

        self.signed_in.write().await.insert(user_id.clone());
        tracing::info!(user_id = %user_id, "account created");

        Ok(Session::new(email, user_id))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let Ok(key) = normalize_email(email) else {
            return Err(self.invalid_login());
        };

        let (user_id, email, password_hash) = {
            let accounts = self.accounts.read().await;
            let account = accounts.get(&key).ok_or_else(|| self.invalid_login())?;
            (
                account.user_id.clone(),
                account.email.clone(),
                account.password_hash.clone(),
            )
        };

        if !verify_password(password, &password_hash)? {
            tracing::debug!(user_id = %user_id, "password mismatch");
            return Err(self.invalid_login());
        }

        self.signed_in.write().await.insert(user_id.clone());
        Ok(Session::new(email, user_id))
    }

    async fn sign_out(&self, session: Option<&Session>) -> Result<()> {
        if let Some(session) = session {
            self.signed_in.write().await.remove(&session.user_id);
        }
        Ok(())
    }
}
