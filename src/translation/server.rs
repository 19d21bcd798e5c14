/*!
 * Scoped translator server lifecycle.
 *
 * `ServerGuard` starts the translator's server when acquired and stops it when
 * dropped, so the server lives exactly as long as the command that needs it.
 */

use log::{debug, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;
use crate::providers::Translator;

/// Keeps a translator server running until dropped
#[derive(Debug)]
pub struct ServerGuard {
    translator: Arc<dyn Translator>,
    started: bool,
}

impl ServerGuard {
    /// Start the server; a start failure is logged and the guard is still returned
    ///
    /// Translation works without the server, only slower, so the only error
    /// surfaced here is cancellation.
    pub async fn acquire(
        translator: Arc<dyn Translator>,
        cancel: &CancellationToken,
    ) -> Result<Self, ProviderError> {
        let started = match translator.start_server(cancel).await {
            Ok(()) => true,
            Err(ProviderError::Cancelled) => return Err(ProviderError::Cancelled),
            Err(e) => {
                warn!("Could not start {} server, continuing without it: {}", translator.name(), e);
                false
            }
        };

        Ok(Self { translator, started })
    }

    /// Whether the server was started by this guard
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// The guarded translator
    pub fn translator(&self) -> Arc<dyn Translator> {
        Arc::clone(&self.translator)
    }
}

impl Drop for ServerGuard {
    fn drop(&mut self) {
        debug!("Releasing {} server", self.translator.name());
        if let Err(e) = self.translator.stop_server() {
            warn!("Failed to stop {} server: {}", self.translator.name(), e);
        }
    }
}
