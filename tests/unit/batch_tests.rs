/*!
 * Tests for token estimation and batch building
 */

use tubelingo::database::models::TranscriptSegment;
use tubelingo::errors::TranslationError;
use tubelingo::translation::{BatchBuilder, PRIMARY_SEPARATOR, SECONDARY_SEPARATOR, TokenEstimator};

use crate::common::make_segments;

#[test]
fn test_estimate_shouldFollowLanguageHeuristics() {
    // 20 bytes of English
    assert_eq!(TokenEstimator::estimate("The quick brown fox.", "en"), 5);
    // 6 characters, 18 bytes
    assert_eq!(TokenEstimator::estimate("日本語の文章", "ja"), 3);
    assert_eq!(TokenEstimator::estimate("日本語の文章", "und-unknown"), 3);
}

/// Two short segments and a huge budget
#[test]
fn test_createBatches_withTwoSegmentsAndHugeBudget_shouldJoinWithPrimarySeparator() {
    let segments = make_segments("t1", &["Hello", "World"]);

    let batches = BatchBuilder::new("en").create_batches(&segments, i64::MAX).unwrap();

    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].combined_text, "Hello__World");
    assert_eq!(batches[0].separator, PRIMARY_SEPARATOR);
    assert_eq!(batches[0].segments, segments);
}

/// Empty input
#[test]
fn test_createBatches_withNoSegments_shouldReturnEmptyList() {
    let batches = BatchBuilder::new("en").create_batches(&[], 7000).unwrap();
    assert!(batches.is_empty());
}

/// Zero budget
#[test]
fn test_createBatches_withZeroBudget_shouldBeInvalidArgument() {
    let segments = make_segments("t1", &["Hello", "World"]);

    let result = BatchBuilder::new("en").create_batches(&segments, 0);

    assert!(matches!(result, Err(TranslationError::InvalidArgument(_))));
}

#[test]
fn test_createBatches_withNegativeBudget_shouldBeInvalidArgument() {
    let segments = make_segments("t1", &["Hello"]);
    assert!(matches!(
        BatchBuilder::new("en").create_batches(&segments, i64::MIN),
        Err(TranslationError::InvalidArgument(_))
    ));
}

#[test]
fn test_createBatches_shouldNeverExceedBudgetExceptForSingleSegments() {
    let texts: Vec<String> = (0..200)
        .map(|i| "lorem ipsum dolor sit amet ".repeat(i % 11 + 1))
        .collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let segments = make_segments("t1", &refs);
    let budget = 40;

    let batches = BatchBuilder::new("en").create_batches(&segments, budget).unwrap();

    for batch in &batches {
        let total: usize = batch
            .segments
            .iter()
            .map(|segment| TokenEstimator::estimate(&segment.text, "en"))
            .sum();
        assert!(total <= budget as usize || batch.segments.len() == 1);
        assert_eq!(batch.combined_text.split(PRIMARY_SEPARATOR).count(), batch.segments.len());
    }

    let flattened: Vec<TranscriptSegment> = batches.into_iter().flat_map(|batch| batch.segments).collect();
    assert_eq!(flattened, segments);
}

#[test]
fn test_createBatches_withDenseSourceLanguage_shouldCountCharacters() {
    // 10 characters each: 5 tokens in Japanese, 7 tokens if counted as English bytes
    let segments = make_segments("t1", &["あいうえおかきくけこ", "さしすせそたちつてと"]);

    let japanese = BatchBuilder::new("ja").create_batches(&segments, 10).unwrap();
    let english = BatchBuilder::new("en").create_batches(&segments, 10).unwrap();

    assert_eq!(japanese.len(), 1);
    assert_eq!(english.len(), 2);
}

#[test]
fn test_withSeparator_shouldKeepSegmentsAndRejoin() {
    let segments = make_segments("t1", &["a", "b", "c"]);
    let batch = &BatchBuilder::new("en").create_batches(&segments, 100).unwrap()[0];

    let secondary = batch.with_separator(SECONDARY_SEPARATOR);

    assert_eq!(secondary.combined_text, "a<<<SEP>>>b<<<SEP>>>c");
    assert_eq!(secondary.segments, batch.segments);
    assert_eq!(secondary.len(), 3);
}
