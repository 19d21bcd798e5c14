/*!
 * Translation pipeline for whole transcriptions.
 *
 * The pipeline fetches a transcription's segments, packs them into batches,
 * runs each batch through the fallback stages in order, and persists the
 * result as a single `Translation`. Nothing is persisted unless every batch
 * produced a result.
 */

use futures::stream::{self, TryStreamExt};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::batch::BatchBuilder;
use super::fallback::FallbackCoordinator;
use crate::app_config::Config;
use crate::database::models::{TranscriptSegment, Translation, TranslationSegment};
use crate::database::repository::{TranscriptionRepository, TranslationRepository};
use crate::errors::{ProviderError, TranslationError};
use crate::language_utils::{language_codes_match, validate_language_code};
use crate::providers::Translator;

/// Default batch token budget
pub const DEFAULT_MAX_TOKENS: i64 = 7000;

/// Options for a pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Language of the transcript segments
    pub source_language: String,

    /// Token budget per batch
    pub max_tokens: i64,

    /// Provenance tag stored with the translation
    pub source_tag: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            source_language: "en".to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            source_tag: "plamo".to_string(),
        }
    }
}

impl PipelineOptions {
    /// Options taken from the application configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            source_language: config.source_language.clone(),
            max_tokens: config.translator.max_tokens,
            source_tag: config.translator.source_tag.clone(),
        }
    }

    pub fn with_source_language(mut self, source_language: &str) -> Self {
        self.source_language = source_language.to_string();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: i64) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_source_tag(mut self, source_tag: &str) -> Self {
        self.source_tag = source_tag.to_string();
        self
    }
}

/// Translates whole transcriptions batch by batch
///
/// The pipeline may start the translator's server when there is more than one
/// batch, but never stops it; stopping belongs to whoever owns the translator.
pub struct TranslationPipeline {
    transcriptions: Arc<dyn TranscriptionRepository>,
    translations: Arc<dyn TranslationRepository>,
    translator: Arc<dyn Translator>,
    options: PipelineOptions,
}

impl TranslationPipeline {
    pub fn new(
        transcriptions: Arc<dyn TranscriptionRepository>,
        translations: Arc<dyn TranslationRepository>,
        translator: Arc<dyn Translator>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            transcriptions,
            translations,
            translator,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Translate all segments of a transcription and persist the result
    pub async fn create_translation(
        &self,
        transcription_id: &str,
        target_language: &str,
        cancel: &CancellationToken,
    ) -> Result<Translation, TranslationError> {
        self.create_translation_with_progress(transcription_id, target_language, cancel, |_, _| {})
            .await
    }

    /// Same as `create_translation`, reporting `(batches_done, batches_total)` after each batch
    pub async fn create_translation_with_progress(
        &self,
        transcription_id: &str,
        target_language: &str,
        cancel: &CancellationToken,
        progress: impl Fn(usize, usize),
    ) -> Result<Translation, TranslationError> {
        let source_language = self.options.source_language.as_str();
        let target_language = target_language.trim();

        if target_language.is_empty() {
            return Err(TranslationError::InvalidArgument("target language is empty".to_string()));
        }
        validate_language_code(target_language).map_err(|e| TranslationError::InvalidArgument(e.to_string()))?;
        if language_codes_match(source_language, target_language) {
            return Err(TranslationError::InvalidArgument(format!(
                "source and target language are both '{}'",
                target_language
            )));
        }

        let segments = self.fetch_segments(transcription_id, cancel).await?;
        if segments.is_empty() {
            return Err(TranslationError::EmptyInput(transcription_id.to_string()));
        }

        let batches = BatchBuilder::new(source_language).create_batches(&segments, self.options.max_tokens)?;
        let total = batches.len();
        info!(
            "Translating {} segments of {} in {} batches (budget {} tokens, {} -> {})",
            segments.len(),
            transcription_id,
            total,
            self.options.max_tokens,
            source_language,
            target_language
        );

        if total > 1 {
            self.ensure_server(cancel).await?;
        }

        let translator = self.translator.as_ref();
        let progress = &progress;
        let translated = stream::iter(batches.iter().enumerate().map(Ok::<_, TranslationError>))
            .try_fold(Vec::with_capacity(segments.len()), |mut acc, (index, batch)| async move {
                if cancel.is_cancelled() {
                    return Err(TranslationError::Cancelled);
                }

                let result =
                    FallbackCoordinator::translate_batch(batch, translator, source_language, target_language, cancel)
                        .await?;
                debug!("Batch {}/{} done via {}", index + 1, total, result.stage);

                acc.extend(result.segments);
                progress(index + 1, total);
                Ok(acc)
            })
            .await?;

        Self::verify_parity(&segments, &translated)?;

        if cancel.is_cancelled() {
            return Err(TranslationError::Cancelled);
        }

        let mut translation =
            Translation::from_segments(transcription_id, target_language, &self.options.source_tag, translated);
        self.translations
            .create(&mut translation)
            .await
            .map_err(|e| TranslationError::Persistence(e.to_string()))?;

        info!(
            "Saved translation {} ({} segments, {})",
            translation.id,
            translation.segments.len(),
            translation.target_language
        );
        Ok(translation)
    }

    async fn fetch_segments(
        &self,
        transcription_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<TranscriptSegment>, TranslationError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TranslationError::Cancelled),
            result = self.transcriptions.get_segments(transcription_id) => {
                result.map_err(|e| TranslationError::Persistence(e.to_string()))
            }
        }
    }

    /// Start the translator server; failures other than cancellation are only logged
    async fn ensure_server(&self, cancel: &CancellationToken) -> Result<(), TranslationError> {
        match self.translator.start_server(cancel).await {
            Ok(()) => Ok(()),
            Err(ProviderError::Cancelled) => Err(TranslationError::Cancelled),
            Err(e) => {
                warn!("Could not start {} server, translating without it: {}", self.translator.name(), e);
                Ok(())
            }
        }
    }

    /// One result per input segment, same indexes, same order
    fn verify_parity(
        segments: &[TranscriptSegment],
        translated: &[TranslationSegment],
    ) -> Result<(), TranslationError> {
        if segments.len() != translated.len() {
            return Err(TranslationError::InvalidArgument(format!(
                "translated {} segments, expected {}",
                translated.len(),
                segments.len()
            )));
        }

        let mismatch = segments
            .iter()
            .zip(translated)
            .find(|(source, result)| source.segment_index != result.segment_index);

        match mismatch {
            Some((source, result)) => Err(TranslationError::InvalidArgument(format!(
                "segment order broken: expected index {}, got {}",
                source.segment_index, result.segment_index
            ))),
            None => Ok(()),
        }
    }
}
