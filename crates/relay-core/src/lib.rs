//! Core domain + application logic for the reply relay bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the optional
//! Supabase thread store live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod gate;
pub mod logging;
pub mod messaging;
pub mod relay;
pub mod resolver;
pub mod threads;

pub use errors::{Error, Result};
