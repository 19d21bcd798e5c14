/*!
 * Three-stage fallback for batch translation.
 *
 * 1. Stage A: the batch joined with the primary separator
 * 2. Stage B: the batch joined with the secondary separator
 * 3. Stage C: one call per segment, keeping the source text for any segment
 *    whose call fails
 *
 * A separator stage is skipped outright when the batch's own text collides
 * with that separator.
 *
 * Stage C always yields one result per segment. Cancellation is the only
 * outcome that is never absorbed; it aborts the batch at any stage.
 */

use log::{debug, warn};
use std::fmt;
use tokio_util::sync::CancellationToken;

use super::batch::{PRIMARY_SEPARATOR, SECONDARY_SEPARATOR, SegmentBatch};
use super::separator::SeparatorTranslator;
use crate::database::models::TranslationSegment;
use crate::errors::TranslationError;
use crate::providers::Translator;

/// Strategy that produced a batch's result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackStage {
    /// Whole batch, primary separator
    Primary,
    /// Whole batch, secondary separator
    Secondary,
    /// One call per segment
    Individual,
}

impl fmt::Display for FallbackStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FallbackStage::Primary => write!(f, "primary separator"),
            FallbackStage::Secondary => write!(f, "secondary separator"),
            FallbackStage::Individual => write!(f, "individual segments"),
        }
    }
}

/// Result of translating one batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchTranslation {
    /// Stage that succeeded
    pub stage: FallbackStage,
    /// One result per batch segment, in order
    pub segments: Vec<TranslationSegment>,
}

/// Runs a batch through the fallback stages
pub struct FallbackCoordinator;

impl FallbackCoordinator {
    /// Translate `batch`, degrading through the stages until one succeeds
    ///
    /// # Errors
    /// Only `TranslationError::Cancelled`; every other failure is absorbed.
    pub async fn translate_batch(
        batch: &SegmentBatch,
        translator: &dyn Translator,
        source_language: &str,
        target_language: &str,
        cancel: &CancellationToken,
    ) -> Result<BatchTranslation, TranslationError> {
        let staged = [
            (FallbackStage::Primary, PRIMARY_SEPARATOR),
            (FallbackStage::Secondary, SECONDARY_SEPARATOR),
        ];

        for (stage, separator) in staged {
            let attempt = batch.with_separator(separator);
            if attempt.is_ambiguous() {
                warn!("Skipping {}: segment text collides with {:?}", stage, separator);
                continue;
            }

            match SeparatorTranslator::try_translate(&attempt, translator, source_language, target_language, cancel)
                .await
            {
                Ok(segments) => {
                    debug!("Batch of {} segments translated with {}", batch.len(), stage);
                    return Ok(BatchTranslation { stage, segments });
                }
                Err(e) if e.is_cancelled() => return Err(TranslationError::Cancelled),
                Err(e) => warn!("Batch translation with {} failed: {}", stage, e),
            }
        }

        warn!("Falling back to translating {} segments individually", batch.len());
        let segments = Self::translate_individually(batch, translator, source_language, target_language, cancel).await?;

        Ok(BatchTranslation {
            stage: FallbackStage::Individual,
            segments,
        })
    }

    /// Stage C: one call per segment, source text kept on failure
    async fn translate_individually(
        batch: &SegmentBatch,
        translator: &dyn Translator,
        source_language: &str,
        target_language: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<TranslationSegment>, TranslationError> {
        let mut segments = Vec::with_capacity(batch.len());

        for segment in &batch.segments {
            let translated = match translator
                .translate(&segment.text, source_language, target_language, cancel)
                .await
            {
                Ok(text) => text.trim().to_string(),
                Err(e) => {
                    let e = TranslationError::from(e);
                    if e.is_cancelled() {
                        return Err(TranslationError::Cancelled);
                    }
                    warn!(
                        "Segment {} could not be translated, keeping source text: {}",
                        segment.segment_index, e
                    );
                    segment.text.clone()
                }
            };

            segments.push(TranslationSegment {
                segment_index: segment.segment_index,
                source_text: segment.text.clone(),
                translated_text: translated,
            });
        }

        Ok(segments)
    }
}
