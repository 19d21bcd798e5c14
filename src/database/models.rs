/*!
 * Database entity models and DTOs.
 *
 * These structures map directly to database tables and provide
 * type-safe access to persisted data.
 */

use serde::{Deserialize, Serialize};

/// YouTube channel metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    /// Channel identifier as reported by yt-dlp
    pub id: String,
    /// Channel title
    pub title: String,
    /// Canonical channel URL
    pub url: String,
    /// When the metadata was fetched (ISO 8601)
    pub fetched_at: String,
}

/// YouTube video metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Video identifier
    pub id: String,
    /// Owning channel, when known
    pub channel_id: Option<String>,
    /// Video title
    pub title: String,
    /// Watch URL
    pub url: String,
    /// Duration in seconds
    pub duration_secs: Option<i64>,
    /// Upload date as YYYYMMDD
    pub upload_date: Option<String>,
    /// When the metadata was fetched (ISO 8601)
    pub fetched_at: String,
}

/// A speech recognition result for one video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionRecord {
    /// Unique identifier (UUID)
    pub id: String,
    /// Transcribed video
    pub video_id: String,
    /// Detected or configured spoken language
    pub language: String,
    /// Recognition model used
    pub model: String,
    /// Full transcript text
    pub content: String,
    /// Creation timestamp (ISO 8601)
    pub created_at: String,
}

impl TranscriptionRecord {
    /// Create a new transcription record with a fresh id
    pub fn new(video_id: String, language: String, model: String, content: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            video_id,
            language,
            model,
            content,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// One timed unit of a transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Stable identifier, derived from the transcription and index
    pub id: String,
    /// Owning transcription
    pub transcription_id: String,
    /// Position in the transcript; defines the original ordering
    pub segment_index: i64,
    /// Start time in milliseconds
    pub start_ms: i64,
    /// End time in milliseconds
    pub end_ms: i64,
    /// Source-language text
    pub text: String,
}

impl TranscriptSegment {
    /// Create a segment without timing information
    pub fn new(transcription_id: &str, segment_index: i64, text: impl Into<String>) -> Self {
        Self::with_timing(transcription_id, segment_index, 0, 0, text)
    }

    /// Create a segment with start and end times
    pub fn with_timing(
        transcription_id: &str,
        segment_index: i64,
        start_ms: i64,
        end_ms: i64,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: format!("{}:{}", transcription_id, segment_index),
            transcription_id: transcription_id.to_string(),
            segment_index,
            start_ms,
            end_ms,
            text: text.into(),
        }
    }
}

/// Translation result for a single transcript segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationSegment {
    /// Index of the source segment
    pub segment_index: i64,
    /// Original text
    pub source_text: String,
    /// Translated text (or the original text when translation failed)
    pub translated_text: String,
}

/// A persisted translation of a whole transcription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    /// Unique identifier (UUID); assigned on creation when empty
    pub id: String,
    /// Translated transcription
    pub transcription_id: String,
    /// Target language code
    pub target_language: String,
    /// All translated segments, space-joined in segment order
    pub content: String,
    /// Provenance tag, e.g. "plamo"
    pub source: String,
    /// Creation timestamp (ISO 8601)
    pub created_at: String,
    /// Per-segment results in segment order
    #[serde(default)]
    pub segments: Vec<TranslationSegment>,
}

impl Translation {
    /// Build an unsaved translation from ordered segment results
    pub fn from_segments(
        transcription_id: &str,
        target_language: &str,
        source: &str,
        segments: Vec<TranslationSegment>,
    ) -> Self {
        let content = segments
            .iter()
            .map(|segment| segment.translated_text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            id: String::new(),
            transcription_id: transcription_id.to_string(),
            target_language: target_language.to_string(),
            content,
            source: source.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            segments,
        }
    }
}
