use std::sync::Arc;

use anyhow::Result;
use bazaar_auth_local::{LocalIdentityOptions, LocalIdentityProvider};
use bazaar_core::{BazaarConfigSnapshot, DocumentStore, IdentityProvider, MemoryDocumentStore, Renderer};

use crate::services::OffersService;
use crate::views::{AskamaRenderer, View};

/// Shared collaborators handed to every route handler.
#[derive(Clone)]
pub struct BazaarState {
    pub offers: OffersService,
    pub identity: Arc<dyn IdentityProvider>,
    pub renderer: Arc<dyn Renderer<View>>,
}

impl BazaarState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        renderer: Arc<dyn Renderer<View>>,
        cas_retries: usize,
    ) -> Self {
        Self {
            offers: OffersService::new(store, cas_retries),
            identity,
            renderer,
        }
    }

    /// In-process store and identity provider, tuned from configuration.
    pub fn from_config(config: &BazaarConfigSnapshot) -> Result<Self> {
        let defaults = LocalIdentityOptions::default();
        let options = LocalIdentityOptions {
            hash_cost: config.get_u32("auth.hash_cost").unwrap_or(defaults.hash_cost),
            min_password_length: config
                .get_usize("auth.min_password_length")
                .unwrap_or(defaults.min_password_length),
            ..defaults
        };

        Ok(Self::new(
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(LocalIdentityProvider::new().with_options(options)),
            Arc::new(AskamaRenderer::new()),
            config.get_usize("store.cas_retries").unwrap_or(3),
        ))
    }
}
