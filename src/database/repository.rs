/*!
 * Repository layer for database operations.
 *
 * This module provides a high-level API for all database operations,
 * abstracting away the SQL details and providing type-safe access.
 * It also implements the two narrow contracts the translation pipeline
 * consumes: `TranscriptionRepository` and `TranslationRepository`.
 */

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::connection::DatabaseConnection;
use super::models::{
    ChannelRecord, TranscriptSegment, TranscriptionRecord, Translation, TranslationSegment,
    VideoRecord,
};
use crate::translation::segments::parse_translation_segments;

/// Source of transcript segments for the translation pipeline
#[async_trait]
pub trait TranscriptionRepository: Send + Sync {
    /// All segments of a transcription, ordered by segment index ascending
    async fn get_segments(&self, transcription_id: &str) -> Result<Vec<TranscriptSegment>>;
}

/// Sink for finished translations
#[async_trait]
pub trait TranslationRepository: Send + Sync {
    /// Persist a translation; assigns `translation.id` when it is empty
    async fn create(&self, translation: &mut Translation) -> Result<()>;
}

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Open (or create) the database file and wrap it in a repository
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Ok(Self::new(DatabaseConnection::new(path)?))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    // =========================================================================
    // Channel and video metadata
    // =========================================================================

    /// Insert or refresh a channel
    pub async fn upsert_channel(&self, channel: &ChannelRecord) -> Result<()> {
        let channel = channel.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO channels (id, title, url, fetched_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(id) DO UPDATE SET
                        title = excluded.title,
                        url = excluded.url,
                        fetched_at = excluded.fetched_at
                    "#,
                    params![channel.id, channel.title, channel.url, channel.fetched_at],
                )?;
                Ok(())
            })
            .await
    }

    /// Get a channel by ID
    pub async fn get_channel(&self, channel_id: &str) -> Result<Option<ChannelRecord>> {
        let channel_id = channel_id.to_string();

        self.db
            .execute_async(move |conn| {
                let result = conn
                    .query_row(
                        "SELECT id, title, url, fetched_at FROM channels WHERE id = ?1",
                        [channel_id],
                        |row| {
                            Ok(ChannelRecord {
                                id: row.get(0)?,
                                title: row.get(1)?,
                                url: row.get(2)?,
                                fetched_at: row.get(3)?,
                            })
                        },
                    )
                    .optional()?;
                Ok(result)
            })
            .await
    }

    /// Insert or refresh a video
    pub async fn upsert_video(&self, video: &VideoRecord) -> Result<()> {
        let video = video.clone();

        self.db
            .execute_async(move |conn| {
                Self::upsert_video_sync(conn, &video)?;
                Ok(())
            })
            .await
    }

    /// Insert or refresh many videos in one transaction
    pub async fn upsert_videos(&self, videos: &[VideoRecord]) -> Result<usize> {
        let videos = videos.to_vec();

        self.db
            .transaction_async(move |tx| {
                for video in &videos {
                    Self::upsert_video_sync(tx, video)?;
                }
                Ok(videos.len())
            })
            .await
    }

    fn upsert_video_sync(conn: &Connection, video: &VideoRecord) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO videos (id, channel_id, title, url, duration_secs, upload_date, fetched_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                channel_id = COALESCE(excluded.channel_id, videos.channel_id),
                title = excluded.title,
                url = excluded.url,
                duration_secs = excluded.duration_secs,
                upload_date = excluded.upload_date,
                fetched_at = excluded.fetched_at
            "#,
            params![
                video.id,
                video.channel_id,
                video.title,
                video.url,
                video.duration_secs,
                video.upload_date,
                video.fetched_at,
            ],
        )?;
        Ok(())
    }

    fn video_from_row(row: &Row<'_>) -> rusqlite::Result<VideoRecord> {
        Ok(VideoRecord {
            id: row.get(0)?,
            channel_id: row.get(1)?,
            title: row.get(2)?,
            url: row.get(3)?,
            duration_secs: row.get(4)?,
            upload_date: row.get(5)?,
            fetched_at: row.get(6)?,
        })
    }

    /// Get a video by ID
    pub async fn get_video(&self, video_id: &str) -> Result<Option<VideoRecord>> {
        let video_id = video_id.to_string();

        self.db
            .execute_async(move |conn| {
                let result = conn
                    .query_row(
                        r#"
                        SELECT id, channel_id, title, url, duration_secs, upload_date, fetched_at
                        FROM videos WHERE id = ?1
                        "#,
                        [video_id],
                        Self::video_from_row,
                    )
                    .optional()?;
                Ok(result)
            })
            .await
    }

    /// List the videos of a channel, newest upload first
    pub async fn list_videos(&self, channel_id: &str) -> Result<Vec<VideoRecord>> {
        let channel_id = channel_id.to_string();

        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, channel_id, title, url, duration_secs, upload_date, fetched_at
                    FROM videos WHERE channel_id = ?1
                    ORDER BY upload_date DESC, id ASC
                    "#,
                )?;

                let videos = stmt
                    .query_map([channel_id], Self::video_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                Ok(videos)
            })
            .await
    }

    // =========================================================================
    // Transcriptions
    // =========================================================================

    /// Store a transcription and all of its segments atomically
    pub async fn create_transcription(
        &self,
        transcription: &TranscriptionRecord,
        segments: &[TranscriptSegment],
    ) -> Result<()> {
        let transcription = transcription.clone();
        let segments = segments.to_vec();

        if let Some(foreign) = segments.iter().find(|s| s.transcription_id != transcription.id) {
            return Err(anyhow!(
                "Segment {} belongs to transcription {}, not {}",
                foreign.id,
                foreign.transcription_id,
                transcription.id
            ));
        }

        self.db
            .transaction_async(move |tx| {
                tx.execute(
                    r#"
                    INSERT INTO transcriptions (id, video_id, language, model, content, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                    params![
                        transcription.id,
                        transcription.video_id,
                        transcription.language,
                        transcription.model,
                        transcription.content,
                        transcription.created_at,
                    ],
                )?;

                let mut stmt = tx.prepare(
                    r#"
                    INSERT INTO transcript_segments (id, transcription_id, segment_index, start_ms, end_ms, text)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                )?;

                for segment in &segments {
                    stmt.execute(params![
                        segment.id,
                        segment.transcription_id,
                        segment.segment_index,
                        segment.start_ms,
                        segment.end_ms,
                        segment.text,
                    ])?;
                }

                debug!(
                    "Stored transcription {} with {} segments",
                    transcription.id,
                    segments.len()
                );
                Ok(())
            })
            .await
    }

    /// Get a transcription by ID
    pub async fn get_transcription(&self, transcription_id: &str) -> Result<Option<TranscriptionRecord>> {
        let transcription_id = transcription_id.to_string();

        self.db
            .execute_async(move |conn| {
                let result = conn
                    .query_row(
                        r#"
                        SELECT id, video_id, language, model, content, created_at
                        FROM transcriptions WHERE id = ?1
                        "#,
                        [transcription_id],
                        Self::transcription_from_row,
                    )
                    .optional()?;
                Ok(result)
            })
            .await
    }

    /// List the transcriptions of a video, newest first
    pub async fn list_transcriptions(&self, video_id: &str) -> Result<Vec<TranscriptionRecord>> {
        let video_id = video_id.to_string();

        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, video_id, language, model, content, created_at
                    FROM transcriptions WHERE video_id = ?1
                    ORDER BY created_at DESC
                    "#,
                )?;

                let transcriptions = stmt
                    .query_map([video_id], Self::transcription_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                Ok(transcriptions)
            })
            .await
    }

    fn transcription_from_row(row: &Row<'_>) -> rusqlite::Result<TranscriptionRecord> {
        Ok(TranscriptionRecord {
            id: row.get(0)?,
            video_id: row.get(1)?,
            language: row.get(2)?,
            model: row.get(3)?,
            content: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    /// Segments of a transcription in segment order (synchronous version)
    fn get_segments_sync(conn: &Connection, transcription_id: &str) -> Result<Vec<TranscriptSegment>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT id, transcription_id, segment_index, start_ms, end_ms, text
            FROM transcript_segments
            WHERE transcription_id = ?1
            ORDER BY segment_index ASC
            "#,
        )?;

        let segments = stmt
            .query_map([transcription_id], |row| {
                Ok(TranscriptSegment {
                    id: row.get(0)?,
                    transcription_id: row.get(1)?,
                    segment_index: row.get(2)?,
                    start_ms: row.get(3)?,
                    end_ms: row.get(4)?,
                    text: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(segments)
    }

    // =========================================================================
    // Translations
    // =========================================================================

    /// Store a translation and its segment rows atomically
    pub async fn create_translation(&self, translation: &mut Translation) -> Result<()> {
        let mut record = translation.clone();
        if record.id.is_empty() {
            record.id = uuid::Uuid::new_v4().to_string();
        }
        let id = record.id.clone();

        self.db
            .transaction_async(move |tx| {
                tx.execute(
                    r#"
                    INSERT INTO translations (id, transcription_id, target_language, content, source, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                    params![
                        record.id,
                        record.transcription_id,
                        record.target_language,
                        record.content,
                        record.source,
                        record.created_at,
                    ],
                )?;

                let mut stmt = tx.prepare(
                    r#"
                    INSERT INTO translation_segments (translation_id, segment_index, source_text, translated_text)
                    VALUES (?1, ?2, ?3, ?4)
                    "#,
                )?;

                for segment in &record.segments {
                    stmt.execute(params![
                        record.id,
                        segment.segment_index,
                        segment.source_text,
                        segment.translated_text,
                    ])?;
                }

                Ok(())
            })
            .await?;

        translation.id = id;
        Ok(())
    }

    /// Get a translation by ID, including its segments
    ///
    /// Rows that were written without segment rows get their segments
    /// reconstructed from `content`, which is lossy.
    pub async fn get_translation(&self, translation_id: &str) -> Result<Option<Translation>> {
        let translation_id = translation_id.to_string();

        self.db
            .execute_async(move |conn| {
                let translation = conn
                    .query_row(
                        r#"
                        SELECT id, transcription_id, target_language, content, source, created_at
                        FROM translations WHERE id = ?1
                        "#,
                        [&translation_id],
                        Self::translation_from_row,
                    )
                    .optional()?;

                let Some(mut translation) = translation else {
                    return Ok(None);
                };

                let mut stmt = conn.prepare(
                    r#"
                    SELECT segment_index, source_text, translated_text
                    FROM translation_segments
                    WHERE translation_id = ?1
                    ORDER BY segment_index ASC
                    "#,
                )?;

                let segments = stmt
                    .query_map([&translation_id], |row| {
                        Ok(TranslationSegment {
                            segment_index: row.get(0)?,
                            source_text: row.get(1)?,
                            translated_text: row.get(2)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                translation.segments = if segments.is_empty() {
                    debug!("Translation {} has no segment rows, reconstructing", translation.id);
                    let sources = Self::get_segments_sync(conn, &translation.transcription_id)?;
                    parse_translation_segments(&translation.content, &sources)
                } else {
                    segments
                };

                Ok(Some(translation))
            })
            .await
    }

    /// List translations of a transcription (without segments), newest first
    pub async fn list_translations(&self, transcription_id: &str) -> Result<Vec<Translation>> {
        let transcription_id = transcription_id.to_string();

        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, transcription_id, target_language, content, source, created_at
                    FROM translations WHERE transcription_id = ?1
                    ORDER BY created_at DESC
                    "#,
                )?;

                let translations = stmt
                    .query_map([transcription_id], Self::translation_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                Ok(translations)
            })
            .await
    }

    /// Delete a translation and its segment rows; returns whether a row existed
    pub async fn delete_translation(&self, translation_id: &str) -> Result<bool> {
        let translation_id = translation_id.to_string();

        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute("DELETE FROM translations WHERE id = ?1", [translation_id])?;
                Ok(deleted > 0)
            })
            .await
    }

    fn translation_from_row(row: &Row<'_>) -> rusqlite::Result<Translation> {
        Ok(Translation {
            id: row.get(0)?,
            transcription_id: row.get(1)?,
            target_language: row.get(2)?,
            content: row.get(3)?,
            source: row.get(4)?,
            created_at: row.get(5)?,
            segments: Vec::new(),
        })
    }
}

#[async_trait]
impl TranscriptionRepository for Repository {
    async fn get_segments(&self, transcription_id: &str) -> Result<Vec<TranscriptSegment>> {
        let transcription_id = transcription_id.to_string();

        self.db
            .execute_async(move |conn| Self::get_segments_sync(conn, &transcription_id))
            .await
    }
}

#[async_trait]
impl TranslationRepository for Repository {
    async fn create(&self, translation: &mut Translation) -> Result<()> {
        self.create_translation(translation).await
    }
}
