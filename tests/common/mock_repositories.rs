/*!
 * Mock repository implementations for testing
 *
 * These implement the two narrow contracts the translation pipeline consumes
 * so tests can observe exactly what the pipeline reads and writes.
 */

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tubelingo::database::models::{TranscriptSegment, Translation};
use tubelingo::database::{TranscriptionRepository, TranslationRepository};

/// Returns a fixed list of segments for any transcription
#[derive(Debug, Default)]
pub struct MockTranscriptions {
    segments: Vec<TranscriptSegment>,
    fail: bool,
}

impl MockTranscriptions {
    pub fn with_segments(segments: Vec<TranscriptSegment>) -> Self {
        Self { segments, fail: false }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { segments: Vec::new(), fail: true }
    }
}

#[async_trait]
impl TranscriptionRepository for MockTranscriptions {
    async fn get_segments(&self, _transcription_id: &str) -> Result<Vec<TranscriptSegment>> {
        if self.fail {
            return Err(anyhow!("database is locked"));
        }
        Ok(self.segments.clone())
    }
}

/// Records every translation passed to `create`
#[derive(Debug, Default)]
pub struct MockTranslations {
    created: Mutex<Vec<Translation>>,
    create_calls: AtomicUsize,
    fail: bool,
}

impl MockTranslations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    /// Number of times `create` was called, successful or not
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> Vec<Translation> {
        self.created.lock().map(|created| created.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TranslationRepository for MockTranslations {
    async fn create(&self, translation: &mut Translation) -> Result<()> {
        let call = self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("constraint violation"));
        }

        translation.id = format!("translation-{}", call + 1);
        self.created
            .lock()
            .map_err(|_| anyhow!("mock lock poisoned"))?
            .push(translation.clone());
        Ok(())
    }
}
