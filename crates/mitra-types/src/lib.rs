//! Shared domain types for Mitra.
//!
//! This crate contains the domain types used across the Mitra chat client:
//! chat messages, transport identifiers, user records, configuration, and
//! their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod transport;
