use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::app_config::Config;
use crate::database::Repository;
use crate::database::models::{
    ChannelRecord, TranscriptSegment, TranscriptionRecord, Translation, VideoRecord,
};
use crate::providers::whisper::{Whisper, seconds_to_ms};
use crate::providers::ytdlp::{VideoInfo, YtDlp};
use crate::providers::{Translator, build_translator};
use crate::translation::{PipelineOptions, ServerGuard, TranslationPipeline};

// @module: Application controller for the fetch, transcribe and translate commands

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    repository: Arc<Repository>,
    translator: Arc<dyn Translator>,
    whisper: Whisper,
    ytdlp: YtDlp,
}

impl Controller {
    // @method: Create a controller opening the configured database
    pub fn with_config(config: Config) -> Result<Self> {
        let db_path = config.resolve_database_path()?;
        debug!("Using database {}", db_path.display());
        let repository = Repository::open(&db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
        let translator = build_translator(&config.translator);

        Ok(Self::with_parts(config, Arc::new(repository), translator))
    }

    /// Create a controller from already built parts
    pub fn with_parts(config: Config, repository: Arc<Repository>, translator: Arc<dyn Translator>) -> Self {
        Self {
            whisper: Whisper::new(&config.whisper),
            ytdlp: YtDlp::new(&config.ytdlp),
            config,
            repository,
            translator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn repository(&self) -> Arc<Repository> {
        Arc::clone(&self.repository)
    }

    /// Fetch a channel and its video list, storing both; returns the channel and the number of videos stored
    pub async fn fetch_channel(&self, url: &str, cancel: &CancellationToken) -> Result<(ChannelRecord, usize)> {
        let channel = self.ytdlp.fetch_channel(url, cancel).await?;
        let fetched_at = Utc::now().to_rfc3339();

        let record = ChannelRecord {
            id: channel.id.clone(),
            title: channel.title.clone(),
            url: channel.url.clone(),
            fetched_at: fetched_at.clone(),
        };
        self.repository.upsert_channel(&record).await?;

        let videos: Vec<VideoRecord> = channel
            .videos
            .iter()
            .map(|video| VideoRecord {
                channel_id: Some(record.id.clone()),
                ..Self::video_record(video, &fetched_at)
            })
            .collect();
        let stored = self.repository.upsert_videos(&videos).await?;

        info!("Stored channel '{}' with {} videos", record.title, stored);
        Ok((record, stored))
    }

    /// Fetch a single video and store it
    pub async fn fetch_video(&self, url: &str, cancel: &CancellationToken) -> Result<VideoRecord> {
        let video = self.ytdlp.fetch_video(url, cancel).await?;
        let mut record = Self::video_record(&video, &Utc::now().to_rfc3339());

        // A video's channel may not have been fetched yet
        if let Some(channel_id) = record.channel_id.clone() {
            if self.repository.get_channel(&channel_id).await?.is_none() {
                debug!("Channel {} not stored, keeping video {} unlinked", channel_id, record.id);
                record.channel_id = None;
            }
        }

        self.repository.upsert_video(&record).await?;
        info!("Stored video '{}' ({})", record.title, record.id);
        Ok(record)
    }

    fn video_record(video: &VideoInfo, fetched_at: &str) -> VideoRecord {
        VideoRecord {
            id: video.id.clone(),
            channel_id: video.channel_id.clone(),
            title: video.title.clone(),
            url: video.url.clone(),
            duration_secs: video.duration_secs,
            upload_date: video.upload_date.clone(),
            fetched_at: fetched_at.to_string(),
        }
    }

    pub async fn list_videos(&self, channel_id: &str) -> Result<Vec<VideoRecord>> {
        self.repository.list_videos(channel_id).await
    }

    /// Transcribe a local audio file for a video and store the transcription with its segments
    pub async fn transcribe(
        &self,
        video_id: &str,
        audio_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<TranscriptionRecord> {
        if self.repository.get_video(video_id).await?.is_none() {
            warn!("Video {} has no stored metadata, transcribing anyway", video_id);
        }

        let transcript = self.whisper.transcribe(audio_path, cancel).await?;
        if transcript.segments.is_empty() {
            return Err(anyhow!("whisper produced no segments for {}", audio_path.display()));
        }

        let language = transcript
            .language
            .clone()
            .or_else(|| self.config.whisper.language.clone())
            .unwrap_or_else(|| self.config.source_language.clone());
        let content = if transcript.text.is_empty() {
            transcript
                .segments
                .iter()
                .map(|segment| segment.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            transcript.text.clone()
        };

        let record = TranscriptionRecord::new(
            video_id.to_string(),
            language,
            self.whisper.model().to_string(),
            content,
        );
        let segments: Vec<TranscriptSegment> = transcript
            .segments
            .iter()
            .enumerate()
            .map(|(index, segment)| {
                TranscriptSegment::with_timing(
                    &record.id,
                    index as i64,
                    seconds_to_ms(segment.start),
                    seconds_to_ms(segment.end),
                    segment.text.clone(),
                )
            })
            .collect();

        self.repository.create_transcription(&record, &segments).await?;
        info!(
            "Stored transcription {} ({} segments, {})",
            record.id,
            segments.len(),
            record.language
        );
        Ok(record)
    }

    /// Translate a stored transcription, keeping the translator server up for the duration
    pub async fn translate(
        &self,
        transcription_id: &str,
        target_language: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Translation> {
        let target_language = target_language.unwrap_or(&self.config.target_language);
        crate::language_utils::validate_language_code(target_language)?;

        if self.repository.get_transcription(transcription_id).await?.is_none() {
            return Err(anyhow!("Transcription not found: {}", transcription_id));
        }

        let _server = ServerGuard::acquire(Arc::clone(&self.translator), cancel).await?;

        let pipeline = TranslationPipeline::new(
            self.repository.clone(),
            self.repository.clone(),
            Arc::clone(&self.translator),
            PipelineOptions::from_config(&self.config),
        );

        let progress_bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.set_message(format!("{} -> {}", self.config.source_language, target_language));

        let result = pipeline
            .create_translation_with_progress(transcription_id, target_language, cancel, |done, total| {
                progress_bar.set_length(total as u64);
                progress_bar.set_position(done as u64);
            })
            .await;

        match result {
            Ok(translation) => {
                progress_bar.finish_with_message("done");
                Ok(translation)
            }
            Err(e) => {
                progress_bar.abandon();
                Err(e.into())
            }
        }
    }

    pub async fn show_translation(&self, translation_id: &str) -> Result<Option<Translation>> {
        self.repository.get_translation(translation_id).await
    }

    pub async fn delete_translation(&self, translation_id: &str) -> Result<bool> {
        let deleted = self.repository.delete_translation(translation_id).await?;
        if deleted {
            info!("Deleted translation {}", translation_id);
        } else {
            warn!("Translation {} does not exist", translation_id);
        }
        Ok(deleted)
    }
}
