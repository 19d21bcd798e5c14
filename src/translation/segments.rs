/*!
 * Segment reconstruction for translations stored without segment rows.
 *
 * The content is split after sentence punctuation. When the number of pieces
 * matches the number of source segments the pieces are paired with them
 * positionally; otherwise the pieces are returned without source text. This
 * is a heuristic: a translated sentence boundary does not have to fall where
 * a source segment ended.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::database::models::{TranscriptSegment, TranslationSegment};

/// A run of text up to and including its closing punctuation
static SENTENCE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^.!?。！？]+[.!?。！？]*").expect("Invalid sentence regex"));

/// Split `content` into sentence-like pieces
pub fn split_sentences(content: &str) -> Vec<String> {
    SENTENCE_REGEX
        .find_iter(content)
        .map(|m| m.as_str().trim().to_string())
        .filter(|piece| !piece.is_empty())
        .collect()
}

/// Reconstruct per-segment results from concatenated `content`
pub fn parse_translation_segments(content: &str, sources: &[TranscriptSegment]) -> Vec<TranslationSegment> {
    let pieces = split_sentences(content);

    if pieces.len() == sources.len() {
        return sources
            .iter()
            .zip(pieces)
            .map(|(source, piece)| TranslationSegment {
                segment_index: source.segment_index,
                source_text: source.text.clone(),
                translated_text: piece,
            })
            .collect();
    }

    pieces
        .into_iter()
        .enumerate()
        .map(|(index, piece)| TranslationSegment {
            segment_index: index as i64,
            source_text: String::new(),
            translated_text: piece,
        })
        .collect()
}
