use anyhow::Result;
use bazaar_core::{load_session, Effect, Nav, Request};

use crate::routes::{prepare, require_session};
use crate::services::{BazaarState, OfferForm, OfferView};
use crate::views::View;

fn viewer(req: &Request) -> Option<String> {
    load_session(req.storage.as_ref()).map(|s| s.user_id)
}

pub async fn home(state: BazaarState, req: Request, nav: Nav) -> Result<Effect<View>> {
    let offers = state.offers.list().await?;
    nav.ensure_current()?;

    let mut ctx = prepare(&state, &req).await?;
    let uid = viewer(&req);
    ctx.offers = offers
        .into_iter()
        .map(|(id, offer)| OfferView::new(id, offer, uid.as_deref()))
        .collect();

    if ctx.is_logged_in {
        Ok(nav.render(View::HomeUser(ctx)))
    } else {
        Ok(nav.render(View::HomeGuest(ctx)))
    }
}

pub async fn create_page(state: BazaarState, req: Request, nav: Nav) -> Result<Effect<View>> {
    let ctx = prepare(&state, &req).await?;
    Ok(nav.render(View::CreateOffer(ctx)))
}

/// Blank edit form for `:offerId`.
pub async fn edit_offer_page(state: BazaarState, req: Request, nav: Nav) -> Result<Effect<View>> {
    let ctx = prepare(&state, &req).await?;
    Ok(nav.render(View::EditOffer(ctx)))
}

pub async fn details(state: BazaarState, req: Request, nav: Nav) -> Result<Effect<View>> {
    let id = req.param("offerId")?;
    let offer = state.offers.get(id).await?;
    nav.ensure_current()?;

    let mut ctx = prepare(&state, &req).await?;
    ctx.offer = Some(OfferView::new(id, offer, viewer(&req).as_deref()));
    Ok(nav.render(View::Details(ctx)))
}

pub async fn create(state: BazaarState, req: Request, nav: Nav) -> Result<Effect<View>> {
    let salesman = require_session(&req)?;
    state
        .offers
        .create(OfferForm::from_request(&req), &salesman)
        .await?;
    Ok(nav.redirect("/home"))
}

pub async fn remove(state: BazaarState, req: Request, nav: Nav) -> Result<Effect<View>> {
    state.offers.remove(req.param("offerId")?).await?;
    Ok(nav.redirect("/home"))
}

pub async fn edit_page(state: BazaarState, req: Request, nav: Nav) -> Result<Effect<View>> {
    let id = req.param("offerId")?;
    let offer = state.offers.get(id).await?;
    nav.ensure_current()?;

    let mut ctx = prepare(&state, &req).await?;
    ctx.offer = Some(OfferView::new(id, offer, viewer(&req).as_deref()));
    Ok(nav.render(View::EditOffer(ctx)))
}

pub async fn edit(state: BazaarState, req: Request, nav: Nav) -> Result<Effect<View>> {
    let id = req.param("offerId")?;
    state.offers.edit(id, &OfferForm::from_request(&req)).await?;
    Ok(nav.redirect(format!("/details/{id}")))
}

pub async fn buy(state: BazaarState, req: Request, nav: Nav) -> Result<Effect<View>> {
    let buyer = require_session(&req)?;
    let id = req.param("offerId")?;
    state.offers.buy(id, &buyer).await?;
    Ok(nav.redirect(format!("/details/{id}")))
}
