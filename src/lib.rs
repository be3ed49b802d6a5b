//! snaplink - a URL shortener core
//!
//! # Architecture
//! - `allocator`: short code generation with adaptive length
//! - `storage`: `LinkStore` trait, SeaORM and in-memory backends
//! - `clicks`: batched, eventually consistent click accounting
//! - `services`: link creation and redirect resolution
//! - `api`: actix-web handlers
//! - `config`: layered configuration (TOML + env)
//! - `runtime`: startup wiring, server mode, shutdown
//! - `system`: logging

pub mod allocator;
pub mod api;
pub mod cli;
pub mod clicks;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
