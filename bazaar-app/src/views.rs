//! Page templates (askama) and the renderer that drives them.

use anyhow::Result;
use askama::Template;
use async_trait::async_trait;
use bazaar_core::errors::BazaarError;
use bazaar_core::Renderer;

use crate::context::{RenderContext, PARTIALS};
use crate::services::OfferView;

/// Every page the app can show, each carrying its render context.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    HomeGuest(RenderContext),
    HomeUser(RenderContext),
    Register(RenderContext),
    Login(RenderContext),
    CreateOffer(RenderContext),
    EditOffer(RenderContext),
    Details(RenderContext),
}

impl View {
    pub fn context(&self) -> &RenderContext {
        match self {
            View::HomeGuest(ctx)
            | View::HomeUser(ctx)
            | View::Register(ctx)
            | View::Login(ctx)
            | View::CreateOffer(ctx)
            | View::EditOffer(ctx)
            | View::Details(ctx) => ctx,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            View::HomeGuest(_) => "homeGuest",
            View::HomeUser(_) => "homeUser",
            View::Register(_) => "register",
            View::Login(_) => "login",
            View::CreateOffer(_) => "createOffer",
            View::EditOffer(_) => "editOffer",
            View::Details(_) => "details",
        }
    }
}

#[derive(Template)]
#[template(path = "home_guest.html")]
struct HomeGuestPage<'a> {
    ctx: &'a RenderContext,
}

#[derive(Template)]
#[template(path = "home_user.html")]
struct HomeUserPage<'a> {
    ctx: &'a RenderContext,
}

#[derive(Template)]
#[template(path = "register.html")]
struct RegisterPage<'a> {
    ctx: &'a RenderContext,
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginPage<'a> {
    ctx: &'a RenderContext,
}

#[derive(Template)]
#[template(path = "create_offer.html")]
struct CreateOfferPage<'a> {
    ctx: &'a RenderContext,
}

#[derive(Template)]
#[template(path = "edit_offer.html")]
struct EditOfferPage<'a> {
    ctx: &'a RenderContext,
    offer: &'a OfferView,
    action: String,
}

#[derive(Template)]
#[template(path = "details.html")]
struct DetailsPage<'a> {
    ctx: &'a RenderContext,
    offer: &'a OfferView,
}

fn template_error(err: askama::Error) -> anyhow::Error {
    BazaarError::general_error(format!("Template error: {err}")).into_anyhow()
}

/// Renders [`View`]s with the compiled askama templates.
#[derive(Debug, Default, Clone)]
pub struct AskamaRenderer;

impl AskamaRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Renderer<View> for AskamaRenderer {
    async fn load_partials(&self, partials: &[(&str, &str)]) -> Result<Vec<String>> {
        // Partials are compiled in, so loading only checks they exist.
        partials
            .iter()
            .map(|(name, template)| {
                if PARTIALS.iter().any(|(_, known)| known == template) {
                    Ok(name.to_string())
                } else {
                    Err(BazaarError::not_found(format!("Unknown partial template '{template}'")).into_anyhow())
                }
            })
            .collect()
    }

    fn render(&self, view: &View) -> Result<String> {
        let html = match view {
            View::HomeGuest(ctx) => HomeGuestPage { ctx }.render(),
            View::HomeUser(ctx) => HomeUserPage { ctx }.render(),
            View::Register(ctx) => RegisterPage { ctx }.render(),
            View::Login(ctx) => LoginPage { ctx }.render(),
            View::CreateOffer(ctx) => CreateOfferPage { ctx }.render(),
            View::EditOffer(ctx) => {
                let empty = OfferView::default();
                let offer = ctx.offer.as_ref().unwrap_or(&empty);
                let id = if offer.id.is_empty() { ctx.param("offerId") } else { offer.id.as_str() };
                EditOfferPage {
                    ctx,
                    offer,
                    action: format!("/edit/{id}"),
                }
                .render()
            }
            View::Details(ctx) => {
                let offer = ctx.offer.as_ref().ok_or_else(|| {
                    BazaarError::general_error("Details page rendered without an offer").into_anyhow()
                })?;
                DetailsPage { ctx, offer }.render()
            }
        };
        html.map_err(template_error)
    }
}
