//! Service layer
//!
//! Business logic shared by the HTTP handlers and the integration tests.

mod link_service;
mod redirect_resolver;

pub use link_service::{LinkService, ShortenResult};
pub use redirect_resolver::RedirectResolver;
