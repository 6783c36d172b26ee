use anyhow::Result;
use bazaar_core::{bail_bazaar, clear_session, load_session, save_session, Effect, Nav, Request};

use crate::routes::prepare;
use crate::services::BazaarState;
use crate::views::View;

pub async fn register_page(state: BazaarState, req: Request, nav: Nav) -> Result<Effect<View>> {
    let ctx = prepare(&state, &req).await?;
    Ok(nav.render(View::Register(ctx)))
}

pub async fn login_page(state: BazaarState, req: Request, nav: Nav) -> Result<Effect<View>> {
    let ctx = prepare(&state, &req).await?;
    Ok(nav.render(View::Login(ctx)))
}

pub async fn register(state: BazaarState, req: Request, nav: Nav) -> Result<Effect<View>> {
    let email = req.field("email").unwrap_or_default();
    let password = req.field("password").unwrap_or_default();

    if req.field("repeatPassword").unwrap_or_default() != password {
        bail_bazaar!(unprocessable, "Passwords do not match");
    }

    let session = state.identity.sign_up(email, password).await?;
    tracing::info!(user_id = %session.user_id, "registered");
    Ok(nav.redirect("/login"))
}

pub async fn login(state: BazaarState, req: Request, nav: Nav) -> Result<Effect<View>> {
    let email = req.field("email").unwrap_or_default();
    let password = req.field("password").unwrap_or_default();

    let session = state.identity.sign_in(email, password).await?;
    nav.ensure_current()?;

    save_session(req.storage.as_ref(), &session)?;
    tracing::info!(user_id = %session.user_id, "signed in");
    Ok(nav.redirect("/home"))
}

pub async fn logout(state: BazaarState, req: Request, nav: Nav) -> Result<Effect<View>> {
    let session = load_session(req.storage.as_ref());
    state.identity.sign_out(session.as_ref()).await?;

    clear_session(req.storage.as_ref());
    if let Some(session) = session {
        tracing::info!(user_id = %session.user_id, "signed out");
    }
    Ok(nav.redirect("/home"))
}
