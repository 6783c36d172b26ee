//! bazaar-core: framework-agnostic core for the Bazaar offers marketplace.
//!
//! The hosted collaborators (identity provider, document store, template
//! renderer, client storage) are traits; the router dispatches navigations
//! to handlers that talk to them.

pub mod config;
pub mod errors;
pub mod identity;
pub mod navigator;
pub mod policy;
pub mod render;
pub mod router;
pub mod session;
pub mod store;

pub use config::{BazaarConfig, BazaarConfigSnapshot};
pub use errors::{BazaarError, BazaarResult, ErrorKind};
pub use identity::IdentityProvider;
pub use navigator::{Navigator, Outcome};
pub use policy::FailurePolicy;
pub use render::Renderer;
pub use router::{Effect, Method, Nav, PathPattern, Request, Router};
pub use session::{clear_session, load_session, save_session, KeyValueStore, MemoryKeyValueStore, Session};
pub use store::{update_document, Document, DocumentStore, MemoryDocumentStore};
