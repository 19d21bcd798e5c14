/*!
 * Single-separator batch translation.
 *
 * A batch is translated in one call and the result is split on the batch's
 * separator. Translators are free to drop, merge or translate the separator,
 * so the split is only accepted when it yields exactly one part per segment.
 */

use log::debug;
use tokio_util::sync::CancellationToken;

use super::batch::SegmentBatch;
use crate::database::models::TranslationSegment;
use crate::errors::TranslationError;
use crate::providers::Translator;

/// Translates one batch with the separator it was built with
pub struct SeparatorTranslator;

impl SeparatorTranslator {
    /// Translate `batch` with a single call and split the result per segment
    ///
    /// # Errors
    /// The translator's error unchanged (wrapped as `External`), or
    /// `SeparatorMismatch` when the part count differs from the segment count.
    pub async fn try_translate(
        batch: &SegmentBatch,
        translator: &dyn Translator,
        source_language: &str,
        target_language: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<TranslationSegment>, TranslationError> {
        let translated = translator
            .translate(&batch.combined_text, source_language, target_language, cancel)
            .await?;

        Self::split(batch, &translated)
    }

    /// Pair the parts of `translated` positionally with the batch's segments
    pub fn split(batch: &SegmentBatch, translated: &str) -> Result<Vec<TranslationSegment>, TranslationError> {
        let parts: Vec<&str> = translated.split(batch.separator).collect();

        if parts.len() != batch.segments.len() {
            debug!(
                "Separator {:?} split into {} parts, expected {}",
                batch.separator,
                parts.len(),
                batch.segments.len()
            );
            return Err(TranslationError::SeparatorMismatch {
                separator: batch.separator.to_string(),
                expected: batch.segments.len(),
                actual: parts.len(),
            });
        }

        Ok(batch
            .segments
            .iter()
            .zip(parts)
            .map(|(segment, part)| TranslationSegment {
                segment_index: segment.segment_index,
                source_text: segment.text.clone(),
                translated_text: part.trim().to_string(),
            })
            .collect())
    }
}
