//! The browser side of the router.
//!
//! A [`Navigator`] owns the client's storage, current location and current
//! view. Every navigation takes a new generation; a handler finishing after
//! a newer navigation started has its effect dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;

use crate::bail_bazaar;
use crate::render::Renderer;
use crate::router::{Effect, Method, Nav, Request, Router};
use crate::session::KeyValueStore;

pub const DEFAULT_MAX_REDIRECTS: usize = 8;

/// How a navigation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A view was rendered at this location.
    Rendered(String),
    /// The handler stopped without a view change.
    Halted,
    /// Nothing matched this location; the view is blank.
    Blank(String),
    /// A newer navigation started first; nothing was applied.
    Superseded,
}

#[derive(Debug)]
struct Screen<V> {
    location: Option<String>,
    view: Option<V>,
    html: String,
    history: Vec<String>,
}

pub struct Navigator<S, V> {
    router: Arc<Router<S, V>>,
    state: S,
    renderer: Arc<dyn Renderer<V>>,
    storage: Arc<dyn KeyValueStore>,
    generation: Arc<AtomicU64>,
    screen: Mutex<Screen<V>>,
    max_redirects: usize,
}

impl<S, V> Navigator<S, V>
where
    S: Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    pub fn new(
        router: Arc<Router<S, V>>,
        state: S,
        renderer: Arc<dyn Renderer<V>>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            router,
            state,
            renderer,
            storage,
            generation: Arc::new(AtomicU64::new(0)),
            screen: Mutex::new(Screen {
                location: None,
                view: None,
                html: String::new(),
                history: Vec::new(),
            }),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.storage
    }

    /// Start the app at its default location.
    pub async fn run(&self, default_path: &str) -> Result<Outcome> {
        self.navigate(default_path).await
    }

    pub async fn navigate(&self, path: &str) -> Result<Outcome> {
        self.go(Method::Get, path, HashMap::new()).await
    }

    /// Submit a form (POST) to `path`.
    pub async fn submit<I, K, F>(&self, path: &str, fields: I) -> Result<Outcome>
    where
        I: IntoIterator<Item = (K, F)>,
        K: Into<String>,
        F: Into<String>,
    {
        let form = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.go(Method::Post, path, form).await
    }

    async fn go(&self, method: Method, path: &str, form: HashMap<String, String>) -> Result<Outcome> {
        let mut method = method;
        let mut path = path.to_string();
        let mut form = form;
        let mut hops = 0;

        loop {
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            let nav = Nav::bound(generation, Arc::clone(&self.generation));

            let req = Request::new(method, path.clone(), Arc::clone(&self.storage))
                .with_form(std::mem::take(&mut form));

            let result = self
                .router
                .dispatch(self.state.clone(), req, nav.clone())
                .await;

            // A superseded navigation reports nothing, not even its failure.
            if !nav.is_current() {
                tracing::debug!(%method, path = %path, "dropping result of superseded navigation");
                return Ok(Outcome::Superseded);
            }
            let effect = result?;

            match effect {
                Effect::Render(view) => {
                    let html = match self.renderer.render(&view) {
                        Ok(html) => html,
                        Err(err) => {
                            self.router.policy().handle::<V>(&path, err)?;
                            return Ok(Outcome::Halted);
                        }
                    };

                    let mut screen = self.screen.lock();
                    screen.location = Some(path.clone());
                    screen.history.push(path.clone());
                    screen.view = Some(view);
                    screen.html = html;
                    return Ok(Outcome::Rendered(path));
                }
                Effect::Redirect(to) => {
                    hops += 1;
                    if hops > self.max_redirects {
                        bail_bazaar!(general_error, "Too many redirects (last: {})", to);
                    }
                    tracing::debug!(from = %path, to = %to, "redirect");
                    method = Method::Get;
                    path = to;
                }
                Effect::Halt => return Ok(Outcome::Halted),
                Effect::Unmatched => {
                    let mut screen = self.screen.lock();
                    screen.location = Some(path.clone());
                    screen.history.push(path.clone());
                    screen.view = None;
                    screen.html.clear();
                    return Ok(Outcome::Blank(path));
                }
            }
        }
    }

    pub fn location(&self) -> Option<String> {
        self.screen.lock().location.clone()
    }

    pub fn html(&self) -> String {
        self.screen.lock().html.clone()
    }

    /// Locations that produced a view (or a blank page), oldest first.
    pub fn history(&self) -> Vec<String> {
        self.screen.lock().history.clone()
    }
}

impl<S, V> Navigator<S, V>
where
    S: Clone + Send + Sync + 'static,
    V: Clone + Send + 'static,
{
    pub fn view(&self) -> Option<V> {
        self.screen.lock().view.clone()
    }
}
