/*!
 * Batch building for transcript translation.
 *
 * Segments are packed greedily, in order, into batches whose estimated token
 * count stays within a budget. Each batch carries the segments' texts joined
 * by a separator so that one translate call can cover many segments and the
 * result can be split back apart.
 */

use log::debug;

use super::tokens::TokenEstimator;
use crate::database::models::TranscriptSegment;
use crate::errors::TranslationError;

/// Preferred separator between segments of a batch
pub const PRIMARY_SEPARATOR: &str = "__";

/// Separator used when the primary one did not survive translation
pub const SECONDARY_SEPARATOR: &str = "<<<SEP>>>";

/// Separator candidates in the order they are tried
pub const SEPARATORS: [&str; 2] = [PRIMARY_SEPARATOR, SECONDARY_SEPARATOR];

/// An ordered group of segments translated with one call
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentBatch {
    /// Segments in segment index order
    pub segments: Vec<TranscriptSegment>,
    /// Segment texts joined by `separator`
    pub combined_text: String,
    /// Separator used in `combined_text`
    pub separator: &'static str,
}

impl SegmentBatch {
    /// Create a batch joining `segments` with `separator`
    pub fn new(segments: Vec<TranscriptSegment>, separator: &'static str) -> Self {
        let combined_text = segments
            .iter()
            .map(|segment| segment.text.as_str())
            .collect::<Vec<_>>()
            .join(separator);

        Self {
            segments,
            combined_text,
            separator,
        }
    }

    /// The same segments joined with another separator
    pub fn with_separator(&self, separator: &'static str) -> Self {
        if self.separator == separator {
            return self.clone();
        }
        Self::new(self.segments.clone(), separator)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether splitting `combined_text` on the separator could move text
    /// across segment boundaries
    ///
    /// True when a segment contains the separator, or when a segment edge
    /// next to a join overlaps the separator (`"my_func_" + "__"` reads as
    /// `"my_func" + "__" + "_"`). A part count that matches proves nothing in
    /// that case, so the separator must not be used for this batch.
    pub fn is_ambiguous(&self) -> bool {
        let separator = self.separator;
        if separator.is_empty() {
            return true;
        }
        let last = self.segments.len().saturating_sub(1);

        self.segments.iter().enumerate().any(|(position, segment)| {
            let text = segment.text.as_str();
            text.contains(separator)
                || (position < last && ends_with_separator_head(text, separator))
                || (position > 0 && starts_with_separator_tail(text, separator))
        })
    }
}

fn ends_with_separator_head(text: &str, separator: &str) -> bool {
    (1..separator.len())
        .filter(|&n| separator.is_char_boundary(n))
        .any(|n| text.ends_with(&separator[..n]))
}

fn starts_with_separator_tail(text: &str, separator: &str) -> bool {
    (1..separator.len())
        .filter(|&n| separator.is_char_boundary(n))
        .any(|n| text.starts_with(&separator[n..]))
}

/// Greedy token-budget batch packer
#[derive(Debug, Clone)]
pub struct BatchBuilder {
    estimator: TokenEstimator,
}

impl BatchBuilder {
    /// Create a builder estimating tokens for text in `source_language`
    pub fn new(source_language: &str) -> Self {
        Self {
            estimator: TokenEstimator::new(source_language),
        }
    }

    /// Pack `segments` into batches of at most `max_tokens` estimated tokens
    ///
    /// A segment larger than the budget on its own gets a batch to itself.
    /// All batches use the primary separator.
    ///
    /// # Errors
    /// `InvalidArgument` when `max_tokens` is zero or negative.
    pub fn create_batches(
        &self,
        segments: &[TranscriptSegment],
        max_tokens: i64,
    ) -> Result<Vec<SegmentBatch>, TranslationError> {
        if max_tokens <= 0 {
            return Err(TranslationError::InvalidArgument(format!(
                "max_tokens must be positive, got {}",
                max_tokens
            )));
        }
        let budget = usize::try_from(max_tokens).unwrap_or(usize::MAX);

        let mut batches = Vec::new();
        let mut current: Vec<TranscriptSegment> = Vec::new();
        let mut running_total = 0usize;

        for segment in segments {
            let tokens = self.estimator.count(&segment.text);

            if !current.is_empty() && running_total.saturating_add(tokens) > budget {
                batches.push(SegmentBatch::new(std::mem::take(&mut current), PRIMARY_SEPARATOR));
                running_total = 0;
            }

            current.push(segment.clone());
            running_total = running_total.saturating_add(tokens);
        }

        if !current.is_empty() {
            batches.push(SegmentBatch::new(current, PRIMARY_SEPARATOR));
        }

        debug!(
            "Packed {} segments into {} batches (budget {} tokens)",
            segments.len(),
            batches.len(),
            budget
        );

        Ok(batches)
    }
}
