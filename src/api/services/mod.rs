pub mod health;
pub mod links;
pub mod redirect;

pub use health::{HealthService, health_routes};
pub use links::{LinkApi, link_routes};
pub use redirect::{RedirectService, redirect_routes};
