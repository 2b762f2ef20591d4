//! Flutter-Rust bridge wrapper for roster-core.
//!
//! This crate serves as a thin wrapper that exposes `roster-core` to the
//! Flutter build system via Cargokit, and supplies the platform keyring as
//! the session credential store.

pub mod api;
pub mod keyring;
