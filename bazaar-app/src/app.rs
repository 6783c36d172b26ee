use std::sync::Arc;

use anyhow::Result;
use bazaar_axum::{axum, AxumApp};
use bazaar_core::{BazaarConfig, BazaarConfigSnapshot, FailurePolicy, KeyValueStore, Navigator};

use crate::routes::routes;
use crate::services::BazaarState;
use crate::views::View;

/// Prefix of environment overrides, e.g. `BAZAAR__HTTP__PORT=8080`.
pub const ENV_PREFIX: &str = "BAZAAR";

pub fn bazaar_config() -> BazaarConfig {
    let mut config = BazaarConfig::new();
    config.load_env(ENV_PREFIX);

    if let Ok(host) = std::env::var("HTTP_HOST") {
        config.set("http.host", host);
    }
    if let Ok(port) = std::env::var("HTTP_PORT") {
        config.set("http.port", port);
    }

    with_defaults(config)
}

pub fn with_defaults(mut config: BazaarConfig) -> BazaarConfig {
    config.set_default("http.host", "127.0.0.1");
    config.set_default("http.port", "3000");
    config.set_default("app.default_path", "/home");
    config.set_default("app.failure_policy", "log-only");
    config.set_default("store.cas_retries", "3");
    config.set_default("auth.hash_cost", "10");
    config.set_default("auth.min_password_length", "6");
    config.set_default("navigator.max_redirects", "8");
    config
}

pub fn failure_policy(config: &BazaarConfigSnapshot) -> Result<FailurePolicy> {
    config
        .get("app.failure_policy")
        .map(str::parse::<FailurePolicy>)
        .transpose()
        .map(Option::unwrap_or_default)
}

/// The marketplace served over HTTP.
pub fn bazaar_app(config: &BazaarConfig, state: BazaarState) -> Result<AxumApp<BazaarState, View>> {
    let snapshot = config.snapshot();
    let policy = failure_policy(&snapshot)?;
    tracing::debug!(%policy, "failure policy");

    let renderer = Arc::clone(&state.renderer);
    let ax = axum(routes(policy), state, renderer).service("/health", || async { "ok" });
    Ok(ax)
}

/// One client of the marketplace driven in-process, with its own storage.
pub fn navigator(
    config: &BazaarConfig,
    state: BazaarState,
    storage: Arc<dyn KeyValueStore>,
) -> Result<Navigator<BazaarState, View>> {
    let snapshot = config.snapshot();
    let policy = failure_policy(&snapshot)?;
    let renderer = Arc::clone(&state.renderer);

    let mut nav = Navigator::new(Arc::new(routes(policy)), state, renderer, storage);
    if let Some(max) = snapshot.get_usize("navigator.max_redirects") {
        nav = nav.with_max_redirects(max);
    }
    Ok(nav)
}
