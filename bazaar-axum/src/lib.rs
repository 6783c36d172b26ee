//! bazaar-axum: Axum adapter for Bazaar.
//!
//! Serves a core [`Router`](bazaar_core::Router) over HTTP: every request
//! is a navigation, the browser's storage is kept server-side and keyed by
//! a cookie.

pub mod app;
pub mod params;
pub mod state;
pub mod storage;
mod error;
pub use error::BazaarAxumError;
pub use state::BazaarAxumState;
pub use storage::{BrowserStorage, StorageRegistry, SESSION_COOKIE};

pub use app::{axum, AxumApp};
