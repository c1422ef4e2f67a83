//! Avvio kernel — provisions and evolves per-account data.
//!
//! Two engines share one plugin model: seed steps run once when an account
//! is created, ordered by priority and declared dependencies; update steps
//! advance the account's stored data along a version chain every time the
//! account is used. Neither engine wraps a whole run in one transaction —
//! failure handling is saga-style, compensating what already succeeded and
//! reporting a boolean outcome to the caller.

pub mod account;
pub mod config;
pub mod db;
pub mod error;
pub mod provision;
pub mod store;
