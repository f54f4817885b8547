//! Chat backend implementations.
//!
//! Contains concrete implementations of the [`ChatBackend`] trait defined in
//! `mitra-core`, plus a factory ([`create_backend`]) that picks one from a
//! [`GlobalConfig`] and wires it into a [`TransportAdapter`].
//!
//! [`ChatBackend`]: mitra_core::transport::ChatBackend

pub mod hosted;
pub mod mock;

use std::time::Duration;

use mitra_core::transport::{BoxChatBackend, TransportAdapter};
use mitra_types::config::{BackendKind, GlobalConfig};
use mitra_types::error::TransportError;

use self::hosted::HostedChatBackend;
use self::mock::MockChatBackend;

/// Create a [`BoxChatBackend`] for the configured backend kind.
pub fn create_backend(config: &GlobalConfig) -> Result<BoxChatBackend, TransportError> {
    match config.backend {
        BackendKind::Hosted => {
            let backend = HostedChatBackend::new(config.chat_api_base_url.clone())?;
            Ok(BoxChatBackend::new(backend))
        }
        BackendKind::Mock => {
            let delay = Duration::from_millis(config.mock_reply_delay_ms);
            Ok(BoxChatBackend::new(MockChatBackend::new(delay)))
        }
    }
}

/// Build the transport adapter with the configured backend and reply timeout.
pub fn create_adapter(config: &GlobalConfig) -> Result<TransportAdapter, TransportError> {
    let backend = create_backend(config)?;
    tracing::debug!(backend = backend.name(), "Chat backend selected");
    Ok(TransportAdapter::new(backend).with_reply_timeout(crate::config::reply_timeout(config)))
}
