/*!
 * Integration tests for the translation pipeline.
 *
 * Each case runs end to end through `TranslationPipeline` with a
 * scripted translator, against mock repositories or an in-memory database.
 */

use std::sync::Arc;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

use tubelingo::errors::{ProviderError, TranslationError};
use tubelingo::providers::mock::{MockRequest, MockTranslator};
use tubelingo::translation::{BatchBuilder, PipelineOptions, TranslationPipeline};

use crate::common::mock_repositories::{MockTranscriptions, MockTranslations};
use crate::common::{init_logger, make_segments, seeded_repository};

fn hello_world_ja(request: &MockRequest) -> Result<String, ProviderError> {
    Ok(request.text.replace("Hello", "こんにちは").replace("World", "世界"))
}

fn hello_world_ja_without_separators(request: &MockRequest) -> Result<String, ProviderError> {
    let merged = request.text.replace("__", "").replace("<<<SEP>>>", "");
    Ok(merged.replace("Hello", "こんにちは").replace("World", "世界"))
}

fn mock_pipeline(
    texts: &[&str],
    translator: &MockTranslator,
    options: PipelineOptions,
) -> (TranslationPipeline, Arc<MockTranslations>) {
    let translations = Arc::new(MockTranslations::new());
    let pipeline = TranslationPipeline::new(
        Arc::new(MockTranscriptions::with_segments(make_segments("t1", texts))),
        translations.clone(),
        Arc::new(translator.clone()),
        options,
    );
    (pipeline, translations)
}

/// One batch, separator preserved
#[tokio::test]
async fn test_createTranslation_withPreservedSeparator_shouldProduceJoinedContent() {
    init_logger();
    let translator = MockTranslator::working().with_custom_response(hello_world_ja);
    let (pipeline, translations) = mock_pipeline(&["Hello", "World"], &translator, PipelineOptions::default());
    let cancel = CancellationToken::new();

    let translation = pipeline.create_translation("t1", "ja", &cancel).await.unwrap();

    assert_eq!(translator.requests()[0].text, "Hello__World");
    assert_eq!(translation.segments.len(), 2);
    assert_eq!(translation.segments[0].translated_text, "こんにちは");
    assert_eq!(translation.segments[1].translated_text, "世界");
    assert_eq!(translation.content, "こんにちは 世界");
    assert_eq!(translation.target_language, "ja");
    assert_eq!(translations.created().len(), 1);
}

/// Separator lost on both separators, individual calls succeed
#[tokio::test]
async fn test_createTranslation_withSeparatorLost_shouldFallBackToIndividualCalls() {
    init_logger();
    let translator = MockTranslator::working().with_custom_response(hello_world_ja_without_separators);
    let (pipeline, _) = mock_pipeline(&["Hello", "World"], &translator, PipelineOptions::default());
    let cancel = CancellationToken::new();

    let translation = pipeline.create_translation("t1", "ja", &cancel).await.unwrap();

    assert_eq!(translation.segments.len(), 2);
    assert_eq!(translation.content, "こんにちは 世界");
    let requests: Vec<String> = translator.requests().into_iter().map(|r| r.text).collect();
    assert_eq!(requests, vec!["Hello__World", "Hello<<<SEP>>>World", "Hello", "World"]);
}

/// Every call fails, source text kept
#[tokio::test]
async fn test_createTranslation_withEveryCallFailing_shouldKeepSourceText() {
    init_logger();
    let translator = MockTranslator::failing();
    let (pipeline, translations) = mock_pipeline(&["Complex text"], &translator, PipelineOptions::default());
    let cancel = CancellationToken::new();

    let translation = pipeline.create_translation("t1", "ja", &cancel).await.unwrap();

    assert_eq!(translation.segments.len(), 1);
    assert_eq!(translation.segments[0].translated_text, "Complex text");
    assert_eq!(translation.content, "Complex text");
    assert_eq!(translations.create_calls(), 1);
}

/// Batching nothing is not an error
#[test]
fn test_createBatches_withNoSegments_shouldBuildNoBatches() {
    let batches = BatchBuilder::new("en").create_batches(&[], 7000);
    assert!(batches.unwrap().is_empty());
}

/// Zero budget is rejected
#[tokio::test]
async fn test_createTranslation_withZeroBudget_shouldRejectBeforeTranslating() {
    let segments = make_segments("t1", &["Hello", "World"]);
    assert!(matches!(
        BatchBuilder::new("en").create_batches(&segments, 0),
        Err(TranslationError::InvalidArgument(_))
    ));

    let translator = MockTranslator::working();
    let (pipeline, translations) = mock_pipeline(&["Hello", "World"], &translator, PipelineOptions::default().with_max_tokens(0));
    let cancel = CancellationToken::new();

    let result = pipeline.create_translation("t1", "ja", &cancel).await;

    assert!(matches!(result, Err(TranslationError::InvalidArgument(_))));
    assert_eq!(translator.request_count(), 0);
    assert_eq!(translations.create_calls(), 0);
}

/// An unknown target code never reaches the translator
#[tokio::test]
async fn test_createTranslation_withUnknownTargetCode_shouldRejectBeforeTranslating() {
    let translator = MockTranslator::working();
    let (pipeline, translations) = mock_pipeline(&["Hello", "World"], &translator, PipelineOptions::default());
    let cancel = CancellationToken::new();

    let result = pipeline.create_translation("t1", "xx", &cancel).await;

    assert!(matches!(result, Err(TranslationError::InvalidArgument(_))));
    assert_eq!(translator.request_count(), 0);
    assert_eq!(translations.create_calls(), 0);
}

/// A transcription without segments persists nothing
#[tokio::test]
async fn test_createTranslation_withEmptyTranscription_shouldNeverCallCreate() {
    let translator = MockTranslator::working();
    let translations = Arc::new(MockTranslations::new());
    let pipeline = TranslationPipeline::new(
        Arc::new(MockTranscriptions::empty()),
        translations.clone(),
        Arc::new(translator.clone()),
        PipelineOptions::default(),
    );
    let cancel = CancellationToken::new();

    let result = pipeline.create_translation("trans-with-no-segments", "ja", &cancel).await;

    assert!(matches!(result, Err(TranslationError::EmptyInput(_))));
    assert_eq!(translations.create_calls(), 0);
    assert_eq!(translator.request_count(), 0);
}

#[tokio::test]
async fn test_createTranslation_withManyBatchesAndMixedStages_shouldPreserveOrderAndCount() {
    init_logger();
    let texts: Vec<String> = (0..60).map(|i| format!("line {} of the talk", i)).collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    // Every third call fails, so some batches degrade to later stages
    let translator = MockTranslator::intermittent(3);
    let (pipeline, _) = mock_pipeline(&refs, &translator, PipelineOptions::default().with_max_tokens(16));
    let cancel = CancellationToken::new();
    let progress = Mutex::new(Vec::new());

    let translation = pipeline
        .create_translation_with_progress("t1", "ja", &cancel, |done, total| {
            progress.lock().unwrap().push((done, total));
        })
        .await
        .unwrap();

    assert_eq!(translation.segments.len(), texts.len());
    for (i, segment) in translation.segments.iter().enumerate() {
        assert_eq!(segment.segment_index, i as i64);
        assert_eq!(segment.source_text, texts[i]);
        assert!(segment.translated_text == texts[i].to_uppercase() || segment.translated_text == texts[i]);
    }

    let progress = progress.lock().unwrap();
    let total = progress[0].1;
    assert!(total > 1);
    assert_eq!(progress.len(), total);
    assert!(progress.iter().enumerate().all(|(i, (done, _))| *done == i + 1));
    assert_eq!(translator.server_starts(), 1);
}

#[tokio::test]
async fn test_createTranslation_withFailingTranscriptions_shouldBePersistenceError() {
    let translations = Arc::new(MockTranslations::new());
    let pipeline = TranslationPipeline::new(
        Arc::new(MockTranscriptions::failing()),
        translations.clone(),
        Arc::new(MockTranslator::working()),
        PipelineOptions::default(),
    );
    let cancel = CancellationToken::new();

    let result = pipeline.create_translation("t1", "ja", &cancel).await;

    assert!(matches!(result, Err(TranslationError::Persistence(ref msg)) if msg.contains("locked")));
    assert_eq!(translations.create_calls(), 0);
}

#[tokio::test]
async fn test_createTranslation_withFailingCreate_shouldSurfacePersistenceError() {
    let translations = Arc::new(MockTranslations::failing());
    let pipeline = TranslationPipeline::new(
        Arc::new(MockTranscriptions::with_segments(make_segments("t1", &["Hello"]))),
        translations.clone(),
        Arc::new(MockTranslator::working()),
        PipelineOptions::default(),
    );
    let cancel = CancellationToken::new();

    let result = pipeline.create_translation("t1", "ja", &cancel).await;

    assert!(matches!(result, Err(TranslationError::Persistence(_))));
    assert_eq!(translations.create_calls(), 1);
}

#[tokio::test]
async fn test_createTranslation_cancelledDuringTranslation_shouldPersistNothing() {
    let translator = MockTranslator::slow(5_000);
    let (pipeline, translations) = mock_pipeline(&["Hello", "World"], &translator, PipelineOptions::default());
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let result = pipeline.create_translation("t1", "ja", &cancel).await;

    assert!(result.unwrap_err().is_cancelled());
    assert_eq!(translations.create_calls(), 0);
}

#[tokio::test]
async fn test_createTranslation_withCustomSourceLanguage_shouldPassItToTranslator() {
    let translator = MockTranslator::working();
    let options = PipelineOptions::default().with_source_language("fr").with_source_tag("test");
    let (pipeline, _) = mock_pipeline(&["bonjour"], &translator, options);
    let cancel = CancellationToken::new();

    let translation = pipeline.create_translation("t1", "en", &cancel).await.unwrap();

    assert_eq!(translation.source, "test");
    let request = &translator.requests()[0];
    assert_eq!(request.source_language, "fr");
    assert_eq!(request.target_language, "en");
}

#[tokio::test]
async fn test_createTranslation_withSqliteRepository_shouldPersistSegments() {
    init_logger();
    let (repository, record) = seeded_repository(&["Hello", "World"]).await.unwrap();
    let translator = MockTranslator::working().with_custom_response(hello_world_ja);
    let pipeline = TranslationPipeline::new(
        repository.clone(),
        repository.clone(),
        Arc::new(translator),
        PipelineOptions::default(),
    );
    let cancel = CancellationToken::new();

    let created = pipeline.create_translation(&record.id, "ja", &cancel).await.unwrap();

    let listed = repository.list_translations(&record.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.id);

    let loaded = repository.get_translation(&created.id).await.unwrap().unwrap();
    assert_eq!(loaded.content, "こんにちは 世界");
    assert_eq!(loaded.segments.len(), 2);
    assert_eq!(loaded.segments[1].source_text, "World");
    assert_eq!(loaded.segments[1].translated_text, "世界");
}
