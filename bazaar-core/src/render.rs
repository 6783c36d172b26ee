use anyhow::Result;
use async_trait::async_trait;

/// Template renderer with named partials (header, footer, ...).
#[async_trait]
pub trait Renderer<V>: Send + Sync {
    /// Make the given `(name, template_ref)` partials available.
    ///
    /// Resolves with the names that are ready; views rendered before this
    /// completes go without them.
    async fn load_partials(&self, partials: &[(&str, &str)]) -> Result<Vec<String>>;

    fn render(&self, view: &V) -> Result<String>;
}
