//! Application lifecycle: startup wiring, server mode, shutdown

pub mod lifetime;
pub mod modes;
