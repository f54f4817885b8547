//! Infrastructure layer for Mitra.
//!
//! Contains implementations of the ports defined in `mitra-core`: the hosted
//! chat API backend and the local mock backend, the file-backed user store,
//! plus config loading and data-directory resolution.

pub mod auth;
pub mod config;
pub mod filesystem;
pub mod transport;
