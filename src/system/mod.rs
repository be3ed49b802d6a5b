//! Process-level plumbing: logging

pub mod logging;

pub use logging::init_logging;
