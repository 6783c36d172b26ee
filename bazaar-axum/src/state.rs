use std::sync::Arc;

use bazaar_core::{Renderer, Router};

use crate::StorageRegistry;

/// Everything the fallback handler needs to serve one navigation.
pub struct BazaarAxumState<S, V>
where
    S: Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    pub router: Arc<Router<S, V>>,
    pub state: S,
    pub renderer: Arc<dyn Renderer<V>>,
    pub storage: Arc<StorageRegistry>,
}

impl<S, V> Clone for BazaarAxumState<S, V>
where
    S: Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            router: Arc::clone(&self.router),
            state: self.state.clone(),
            renderer: Arc::clone(&self.renderer),
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S, V> BazaarAxumState<S, V>
where
    S: Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    pub fn new(router: Router<S, V>, state: S, renderer: Arc<dyn Renderer<V>>) -> Self {
        Self {
            router: Arc::new(router),
            state,
            renderer,
            storage: Arc::new(StorageRegistry::new()),
        }
    }
}
