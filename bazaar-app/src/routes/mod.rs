//! Route table of the marketplace.

use anyhow::Result;
use bazaar_core::errors::BazaarError;
use bazaar_core::{load_session, FailurePolicy, Request, Router, Session};

use crate::context::{extend_context, RenderContext};
use crate::services::BazaarState;
use crate::views::View;

pub mod offers;
pub mod users;

pub fn routes(policy: FailurePolicy) -> Router<BazaarState, View> {
    Router::new(policy)
        .get("/home", offers::home)
        .get("/register", users::register_page)
        .get("/login", users::login_page)
        .post("/register", users::register)
        .post("/login", users::login)
        .get("/logout", users::logout)
        .get("/create-offer", offers::create_page)
        .get("/edit-offer/:offerId", offers::edit_offer_page)
        .get("/details/:offerId", offers::details)
        .post("/create-offer", offers::create)
        .get("/delete/:offerId", offers::remove)
        .get("/edit/:offerId", offers::edit_page)
        .post("/edit/:offerId", offers::edit)
        .get("/buy/:offerId", offers::buy)
}

/// Fresh context for `req`, extended with login state and partials.
pub(crate) async fn prepare(state: &BazaarState, req: &Request) -> Result<RenderContext> {
    let mut ctx = RenderContext::new(req);
    extend_context(&mut ctx, req.storage.as_ref(), state.renderer.as_ref()).await?;
    Ok(ctx)
}

pub(crate) fn require_session(req: &Request) -> Result<Session> {
    load_session(req.storage.as_ref())
        .ok_or_else(|| BazaarError::not_authenticated("Sign in first").into_anyhow())
}
