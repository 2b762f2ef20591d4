//! Roster Core Library
//!
//! Core functionality for Roster - membership management for regional and
//! national representatives. This crate owns the session lifecycle, the
//! member record rules, and the client for the member service.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod member;
pub mod session;

pub use api::{MemberError, RosterCore};
pub use config::{ConfigError, CoreConfig};
pub use error::ErrorKind;
