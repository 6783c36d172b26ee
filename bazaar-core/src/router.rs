//! Client-side router: a `(method, path pattern) → handler` table.
//!
//! Handlers receive the app state, the request (route params, submitted
//! form, the client's storage) and a [`Nav`]. They return the [`Effect`]
//! the driver should apply: render a view, redirect, or nothing.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use futures::future::BoxFuture;

use crate::errors::BazaarError;
use crate::policy::FailurePolicy;
use crate::session::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A path with named parameters, e.g. `/details/:offerId`.
///
/// Leading and trailing slashes are not significant, so `register` and
/// `/register/` both match `/register`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').filter(|s| !s.is_empty())
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = split_path(pattern)
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(s.to_string()),
            })
            .collect();

        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Captured parameters when `path` matches, `None` otherwise.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let parts: Vec<&str> = split_path(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(params)
    }
}

/// One navigation as seen by a handler.
#[derive(Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    /// Named route parameters captured from the path.
    pub params: HashMap<String, String>,
    /// Submitted form fields (POST) or query fields (GET).
    pub form: HashMap<String, String>,
    /// The client's local persistence.
    pub storage: Arc<dyn KeyValueStore>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>, storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            method,
            path: path.into(),
            params: HashMap::new(),
            form: HashMap::new(),
            storage,
        }
    }

    pub fn with_form(mut self, form: HashMap<String, String>) -> Self {
        self.form = form;
        self
    }

    pub fn param(&self, name: &str) -> Result<&str> {
        self.params
            .get(name)
            .map(|s| s.as_str())
            .ok_or_else(|| BazaarError::bad_request(format!("Missing route param '{name}'")).into_anyhow())
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.form.get(name).map(|s| s.as_str())
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &self.params)
            .field("form", &self.form.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// What a driver does once a handler has finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect<V> {
    Render(V),
    Redirect(String),
    /// Leave the current view untouched.
    Halt,
    /// No route matched; the view goes blank.
    Unmatched,
}

/// Navigation capability handed to handlers.
///
/// A `Nav` is bound to one navigation. Once a newer navigation starts on
/// the same client it stops being current and its effects are discarded.
#[derive(Clone, Debug)]
pub struct Nav {
    generation: u64,
    latest: Option<Arc<AtomicU64>>,
}

impl Nav {
    pub(crate) fn bound(generation: u64, latest: Arc<AtomicU64>) -> Self {
        Self {
            generation,
            latest: Some(latest),
        }
    }

    /// A navigation nobody can supersede (one HTTP request).
    pub fn detached() -> Self {
        Self {
            generation: 0,
            latest: None,
        }
    }

    pub fn is_current(&self) -> bool {
        match &self.latest {
            Some(latest) => latest.load(Ordering::SeqCst) == self.generation,
            None => true,
        }
    }

    /// Fails with `Cancelled` once this navigation was superseded.
    pub fn ensure_current(&self) -> Result<()> {
        if self.is_current() {
            Ok(())
        } else {
            Err(BazaarError::cancelled("Navigation superseded").into_anyhow())
        }
    }

    pub fn redirect<V>(&self, path: impl Into<String>) -> Effect<V> {
        Effect::Redirect(path.into())
    }

    pub fn render<V>(&self, view: V) -> Effect<V> {
        Effect::Render(view)
    }

    pub fn halt<V>(&self) -> Effect<V> {
        Effect::Halt
    }
}

type Handler<S, V> = Arc<dyn Fn(S, Request, Nav) -> BoxFuture<'static, Result<Effect<V>>> + Send + Sync>;

struct Route<S, V> {
    method: Method,
    pattern: PathPattern,
    handler: Handler<S, V>,
}

/// Route table plus the failure policy applied to every dispatch.
pub struct Router<S, V> {
    routes: Vec<Route<S, V>>,
    policy: FailurePolicy,
}

impl<S, V> Default for Router<S, V>
where
    S: Send + 'static,
    V: Send + 'static,
{
    fn default() -> Self {
        Self::new(FailurePolicy::default())
    }
}

impl<S, V> Router<S, V>
where
    S: Send + 'static,
    V: Send + 'static,
{
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            routes: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn route<F, Fut>(mut self, method: Method, pattern: &str, handler: F) -> Self
    where
        F: Fn(S, Request, Nav) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Effect<V>>> + Send + 'static,
    {
        let handler: Handler<S, V> = Arc::new(
            move |state: S, req: Request, nav: Nav| -> BoxFuture<'static, Result<Effect<V>>> {
                Box::pin(handler(state, req, nav))
            },
        );
        self.routes.push(Route {
            method,
            pattern: PathPattern::parse(pattern),
            handler,
        });
        self
    }

    pub fn get<F, Fut>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(S, Request, Nav) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Effect<V>>> + Send + 'static,
    {
        self.route(Method::Get, pattern, handler)
    }

    pub fn post<F, Fut>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(S, Request, Nav) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Effect<V>>> + Send + 'static,
    {
        self.route(Method::Post, pattern, handler)
    }

    /// Registered `(method, pattern)` pairs in match order.
    pub fn routes(&self) -> Vec<(Method, &str)> {
        self.routes
            .iter()
            .map(|r| (r.method, r.pattern.as_str()))
            .collect()
    }

    /// Run the first route matching both method and path.
    pub async fn dispatch(&self, state: S, mut req: Request, nav: Nav) -> Result<Effect<V>> {
        let found = self.routes.iter().find_map(|r| {
            if r.method != req.method {
                return None;
            }
            r.pattern.matches(&req.path).map(|params| (r, params))
        });

        let Some((route, params)) = found else {
            tracing::debug!(method = %req.method, path = %req.path, "no route matched");
            return Ok(Effect::Unmatched);
        };

        tracing::debug!(
            method = %req.method,
            path = %req.path,
            route = route.pattern.as_str(),
            "dispatching"
        );

        req.params.extend(params);
        let label = format!("{} {}", route.method, route.pattern.as_str());

        match (route.handler)(state, req, nav).await {
            Ok(effect) => Ok(effect),
            Err(err) => self.policy.handle(&label, err),
        }
    }
}
