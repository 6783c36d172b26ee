pub mod app;
pub mod context;
pub mod routes;
pub mod services;
pub mod views;

use anyhow::Result;
use bazaar_axum::AxumApp;
use bazaar_core::BazaarConfig;

pub use app::{bazaar_config, navigator, with_defaults};
pub use context::{extend_context, RenderContext};
pub use services::{BazaarState, Offer, OfferForm, OfferView, OffersService};
pub use views::{AskamaRenderer, View};

pub fn build(config: &BazaarConfig) -> Result<AxumApp<BazaarState, View>> {
    let state = BazaarState::from_config(&config.snapshot())?;
    app::bazaar_app(config, state)
}
