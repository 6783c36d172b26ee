//! Per-navigation render context and the shared "extend" step every page
//! goes through before rendering.

use std::collections::HashMap;

use anyhow::Result;
use bazaar_core::{load_session, KeyValueStore, Renderer, Request};
use serde::Serialize;

use crate::services::OfferView;
use crate::views::View;

/// Layout fragments every page asks for: `(name, template)`.
pub const PARTIALS: [(&str, &str); 2] = [
    ("header", "partials/header.html"),
    ("footer", "partials/footer.html"),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderContext {
    /// Route params plus submitted fields (passwords excluded).
    pub params: HashMap<String, String>,
    pub is_logged_in: bool,
    pub user_email: String,
    pub offers: Vec<OfferView>,
    pub offer: Option<OfferView>,
    /// Partials loaded for this render.
    pub partials: Vec<String>,
}

impl RenderContext {
    pub fn new(req: &Request) -> Self {
        let mut params: HashMap<String, String> = req
            .form
            .iter()
            .filter(|(key, _)| !key.to_lowercase().contains("password"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        params.extend(req.params.clone());

        Self {
            params,
            ..Default::default()
        }
    }

    pub fn has_partial(&self, name: &str) -> bool {
        self.partials.iter().any(|p| p == name)
    }

    pub fn param(&self, name: &str) -> &str {
        self.params.get(name).map(|s| s.as_str()).unwrap_or_default()
    }
}

/// Mark login state from the client's session and load the layout partials.
///
/// Render only after this resolves, or the page goes out without header
/// and footer.
pub async fn extend_context(
    ctx: &mut RenderContext,
    storage: &dyn KeyValueStore,
    renderer: &dyn Renderer<View>,
) -> Result<()> {
    let session = load_session(storage);
    ctx.is_logged_in = session.is_some();
    ctx.user_email = session.map(|s| s.email).unwrap_or_default();

    ctx.partials = renderer.load_partials(&PARTIALS).await?;
    Ok(())
}
