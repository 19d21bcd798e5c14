/*!
 * Adapters for the external tools the pipeline shells out to.
 *
 * - `plamo`: plamo-translate, either one process per call or a long-lived server
 * - `whisper`: speech recognition producing timed segments
 * - `ytdlp`: channel and video metadata
 * - `mock`: in-process translator for tests and benchmarks
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::app_config::{TranslatorConfig, TranslatorMode};
use crate::errors::ProviderError;

/// Capability to translate text between two languages
///
/// Implementations may be backed by a short-lived process per call or by a
/// server that keeps the model loaded. The server methods are idempotent and
/// are no-ops for implementations without a server.
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Translate `text` from `from` to `to`
    ///
    /// # Arguments
    /// * `text` - Non-empty text to translate
    /// * `from` - Source language code
    /// * `to` - Target language code
    /// * `cancel` - Aborts the call promptly with `ProviderError::Cancelled`
    async fn translate(
        &self,
        text: &str,
        from: &str,
        to: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError>;

    /// Bring up the backing server; calling it while running is a no-op
    async fn start_server(&self, cancel: &CancellationToken) -> Result<(), ProviderError>;

    /// Tear down the backing server; calling it while stopped is a no-op
    fn stop_server(&self) -> Result<(), ProviderError>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Build the translator selected by configuration
pub fn build_translator(config: &TranslatorConfig) -> Arc<dyn Translator> {
    match config.mode {
        TranslatorMode::Simple => Arc::new(plamo::PlamoCli::new(config)),
        TranslatorMode::Server => Arc::new(plamo::PlamoServer::new(config)),
    }
}

pub mod process;
pub mod plamo;
pub mod whisper;
pub mod ytdlp;
pub mod mock;
