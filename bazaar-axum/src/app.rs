use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::handler::Handler;
use axum::http::{header, HeaderMap, HeaderValue, Method as HttpMethod, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use bazaar_core::{Effect, KeyValueStore, Nav, Renderer};
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::params::{core_method, request_from_parts, session_id};
use crate::{BazaarAxumError, BazaarAxumState};

pub struct AxumApp<S, V>
where
    S: Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    pub app: BazaarAxumState<S, V>,
    pub router: Router<()>,
}

impl<S, V> Clone for AxumApp<S, V>
where
    S: Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            app: self.app.clone(),
            router: self.router.clone(),
        }
    }
}

impl<S, V> AxumApp<S, V>
where
    S: Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    pub fn new(router: bazaar_core::Router<S, V>, state: S, renderer: Arc<dyn Renderer<V>>) -> Self {
        let app = BazaarAxumState::new(router, state, renderer);
        Self {
            router: Router::new()
                .fallback(navigate::<S, V>)
                .with_state(app.clone()),
            app,
        }
    }

    /// Mount an auxiliary GET endpoint (health checks and the like).
    pub fn service<H, T>(mut self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        self.router = self.router.route(path, get(handler));
        self
    }

    /// The router with tracing and request-id layers applied.
    pub fn into_router(self) -> Router<()> {
        self.router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "listening");
        axum::serve(listener, self.into_router()).await?;
        Ok(())
    }
}

pub fn axum<S, V>(
    router: bazaar_core::Router<S, V>,
    state: S,
    renderer: Arc<dyn Renderer<V>>,
) -> AxumApp<S, V>
where
    S: Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    AxumApp::new(router, state, renderer)
}

async fn navigate<S, V>(
    State(app): State<BazaarAxumState<S, V>>,
    method: HttpMethod,
    uri: Uri,
    headers: HeaderMap,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Response
where
    S: Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    let browser = app.storage.resolve(session_id(&headers).as_deref());
    let storage: Arc<dyn KeyValueStore> = browser.store.clone();

    let mut response = match respond(&app, &method, &uri, form, storage).await {
        Ok(response) => response,
        Err(err) => BazaarAxumError::from(err).into_response(),
    };

    if app.storage.commit(&browser) {
        if let Ok(cookie) = HeaderValue::from_str(&browser.set_cookie()) {
            response.headers_mut().append(header::SET_COOKIE, cookie);
        }
    }
    response
}

async fn respond<S, V>(
    app: &BazaarAxumState<S, V>,
    method: &HttpMethod,
    uri: &Uri,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
    storage: Arc<dyn KeyValueStore>,
) -> anyhow::Result<Response>
where
    S: Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    let method = core_method(method)?;

    // An unreadable form fails the navigation like a handler would.
    let req = match request_from_parts(method, uri, form, storage) {
        Ok(req) => req,
        Err(err) => {
            app.router.policy().handle::<V>(uri.path(), err)?;
            return Ok(StatusCode::NO_CONTENT.into_response());
        }
    };

    let effect = app
        .router
        .dispatch(app.state.clone(), req, Nav::detached())
        .await?;

    let response = match effect {
        Effect::Render(view) => match app.renderer.render(&view) {
            Ok(html) => Html(html).into_response(),
            Err(err) => {
                app.router.policy().handle::<V>(uri.path(), err)?;
                StatusCode::NO_CONTENT.into_response()
            }
        },
        Effect::Redirect(to) => Redirect::to(&to).into_response(),
        Effect::Halt => StatusCode::NO_CONTENT.into_response(),
        Effect::Unmatched => StatusCode::NOT_FOUND.into_response(),
    };
    Ok(response)
}
