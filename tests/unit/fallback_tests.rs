/*!
 * Tests for separator splitting and the fallback stages
 */

use tokio_util::sync::CancellationToken;
use tubelingo::errors::{ProviderError, TranslationError};
use tubelingo::providers::mock::{MockRequest, MockTranslator};
use tubelingo::translation::{
    FallbackCoordinator, FallbackStage, PRIMARY_SEPARATOR, SegmentBatch, SeparatorTranslator,
};

use crate::common::{init_logger, make_segments};

fn batch(texts: &[&str]) -> SegmentBatch {
    SegmentBatch::new(make_segments("t1", texts), PRIMARY_SEPARATOR)
}

fn hello_world_ja(request: &MockRequest) -> Result<String, ProviderError> {
    Ok(request.text.replace("Hello", "こんにちは").replace("World", "世界"))
}

fn loses_separators(request: &MockRequest) -> Result<String, ProviderError> {
    let merged = request.text.replace(PRIMARY_SEPARATOR, "").replace("<<<SEP>>>", "");
    hello_world_ja(&MockRequest { text: merged, ..request.clone() })
}

fn fails_on_batches(request: &MockRequest) -> Result<String, ProviderError> {
    if request.text.contains(PRIMARY_SEPARATOR) || request.text.contains("<<<SEP>>>") {
        return Err(ProviderError::ExecutionFailed {
            program: "mock".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "input too long".to_string(),
        });
    }
    Ok(format!("[{}]", request.text))
}

#[tokio::test]
async fn test_tryTranslate_withPreservedSeparator_shouldSplitPerSegment() {
    let translator = MockTranslator::working().with_custom_response(hello_world_ja);
    let cancel = CancellationToken::new();

    let segments = SeparatorTranslator::try_translate(&batch(&["Hello", "World"]), &translator, "en", "ja", &cancel)
        .await
        .unwrap();

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].translated_text, "こんにちは");
    assert_eq!(segments[1].translated_text, "世界");
    assert_eq!(segments[1].source_text, "World");
}

#[tokio::test]
async fn test_tryTranslate_withLostSeparator_shouldReportMismatch() {
    let translator = MockTranslator::strip_separators();
    let cancel = CancellationToken::new();

    let result = SeparatorTranslator::try_translate(&batch(&["Hello", "World"]), &translator, "en", "ja", &cancel).await;

    assert!(matches!(
        result,
        Err(TranslationError::SeparatorMismatch { expected: 2, actual: 1, .. })
    ));
}

/// Separator survives, primary stage only
#[tokio::test]
async fn test_translateBatch_withIntactSeparator_shouldNeverReachLaterStages() {
    init_logger();
    let translator = MockTranslator::working();
    let cancel = CancellationToken::new();
    let texts = ["one", "two", "three", "four"];

    let result = FallbackCoordinator::translate_batch(&batch(&texts), &translator, "en", "ja", &cancel)
        .await
        .unwrap();

    assert_eq!(result.stage, FallbackStage::Primary);
    assert_eq!(translator.request_count(), 1);
    assert_eq!(result.segments.len(), 4);
}

/// Separator lost twice, individual calls succeed
#[tokio::test]
async fn test_translateBatch_withSeparatorLostTwice_shouldTranslateEachSegment() {
    init_logger();
    let translator = MockTranslator::working().with_custom_response(loses_separators);
    let cancel = CancellationToken::new();

    let result = FallbackCoordinator::translate_batch(&batch(&["Hello", "World"]), &translator, "en", "ja", &cancel)
        .await
        .unwrap();

    assert_eq!(result.stage, FallbackStage::Individual);
    let texts: Vec<&str> = result.segments.iter().map(|s| s.translated_text.as_str()).collect();
    assert_eq!(texts, vec!["こんにちは", "世界"]);

    let requests: Vec<String> = translator.requests().into_iter().map(|r| r.text).collect();
    assert_eq!(requests, vec!["Hello__World", "Hello<<<SEP>>>World", "Hello", "World"]);
}

/// Every call fails, source text substituted
#[tokio::test]
async fn test_translateBatch_withEveryCallFailing_shouldSubstituteSourceText() {
    init_logger();
    let translator = MockTranslator::failing();
    let cancel = CancellationToken::new();

    let result = FallbackCoordinator::translate_batch(&batch(&["Complex text"]), &translator, "en", "ja", &cancel)
        .await
        .unwrap();

    assert_eq!(result.segments.len(), 1);
    assert_eq!(result.segments[0].translated_text, "Complex text");
    assert_eq!(result.segments[0].segment_index, 0);
    assert_eq!(translator.request_count(), 3);
}

#[tokio::test]
async fn test_translateBatch_withBatchErrors_shouldFallBackWithoutAborting() {
    let translator = MockTranslator::working().with_custom_response(fails_on_batches);
    let cancel = CancellationToken::new();

    let result = FallbackCoordinator::translate_batch(&batch(&["a", "b", "c"]), &translator, "en", "ja", &cancel)
        .await
        .unwrap();

    assert_eq!(result.stage, FallbackStage::Individual);
    let texts: Vec<&str> = result.segments.iter().map(|s| s.translated_text.as_str()).collect();
    assert_eq!(texts, vec!["[a]", "[b]", "[c]"]);
}

#[tokio::test]
async fn test_translateBatch_withIntermittentFailures_shouldKeepCardinality() {
    let translator = MockTranslator::intermittent(2);
    let cancel = CancellationToken::new();
    let texts = ["alpha", "beta", "gamma"];

    // Stage A succeeds on the first request
    let first = FallbackCoordinator::translate_batch(&batch(&texts), &translator, "en", "ja", &cancel)
        .await
        .unwrap();
    // Stage A fails, stage B succeeds
    let second = FallbackCoordinator::translate_batch(&batch(&texts), &translator, "en", "ja", &cancel)
        .await
        .unwrap();

    assert_eq!(first.stage, FallbackStage::Primary);
    assert_eq!(second.stage, FallbackStage::Secondary);
    assert_eq!(second.segments.len(), 3);
}

#[tokio::test]
async fn test_translateBatch_whenCancelledMidway_shouldReturnCancelled() {
    let translator = MockTranslator::slow(5_000);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let result = FallbackCoordinator::translate_batch(&batch(&["Hello", "World"]), &translator, "en", "ja", &cancel).await;

    assert!(matches!(result, Err(TranslationError::Cancelled)));
    // Cancellation is not retried with another separator
    assert_eq!(translator.request_count(), 1);
}
