/*!
 * whisper CLI adapter.
 *
 * Runs `whisper` on a local audio file with JSON output into a temporary
 * directory, then reads back the timed segments.
 */

use log::{debug, info};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::process::run_tool;
use crate::app_config::WhisperConfig;
use crate::errors::ProviderError;

/// One timed segment as produced by whisper
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WhisperSegment {
    /// Start in seconds
    pub start: f64,
    /// End in seconds
    pub end: f64,
    /// Recognized text
    pub text: String,
}

/// Parsed whisper JSON result
#[derive(Debug, Clone, Deserialize)]
pub struct WhisperTranscript {
    /// Detected or forced language code
    #[serde(default)]
    pub language: Option<String>,
    /// Full transcript text
    #[serde(default)]
    pub text: String,
    /// Timed segments
    #[serde(default)]
    pub segments: Vec<WhisperSegment>,
}

impl WhisperTranscript {
    /// Parse whisper's JSON output, dropping empty segments
    pub fn from_json(json: &str) -> Result<Self, ProviderError> {
        let mut transcript: WhisperTranscript = serde_json::from_str(json)
            .map_err(|e| ProviderError::ParseError(format!("invalid whisper JSON: {}", e)))?;

        transcript.segments = transcript
            .segments
            .into_iter()
            .filter_map(|segment| {
                let text = segment.text.trim().to_string();
                (!text.is_empty()).then_some(WhisperSegment { text, ..segment })
            })
            .collect();
        transcript.text = transcript.text.trim().to_string();

        Ok(transcript)
    }
}

/// Convert seconds to whole milliseconds
pub fn seconds_to_ms(seconds: f64) -> i64 {
    (seconds * 1000.0).round() as i64
}

/// whisper command-line runner
#[derive(Debug, Clone)]
pub struct Whisper {
    binary: String,
    model: String,
    language: Option<String>,
    timeout: Duration,
}

impl Whisper {
    pub fn new(config: &WhisperConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            model: config.model.clone(),
            language: config.language.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Model name recorded alongside transcriptions
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_args(&self, audio_path: &Path, output_dir: &Path) -> Vec<String> {
        let mut args = vec![
            audio_path.to_string_lossy().to_string(),
            "--model".to_string(),
            self.model.clone(),
            "--output_format".to_string(),
            "json".to_string(),
            "--output_dir".to_string(),
            output_dir.to_string_lossy().to_string(),
            "--verbose".to_string(),
            "False".to_string(),
        ];

        if let Some(language) = &self.language {
            args.push("--language".to_string());
            args.push(language.clone());
        }

        args
    }

    /// Transcribe a local audio file
    pub async fn transcribe(
        &self,
        audio_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<WhisperTranscript, ProviderError> {
        if !audio_path.is_file() {
            return Err(ProviderError::InvalidInput(format!(
                "audio file does not exist: {}",
                audio_path.display()
            )));
        }

        let output_dir = tempfile::tempdir()
            .map_err(|e| ProviderError::InvalidInput(format!("cannot create temp dir: {}", e)))?;

        info!("Transcribing {} with whisper model '{}'", audio_path.display(), self.model);
        let args = self.build_args(audio_path, output_dir.path());
        run_tool(&self.binary, &args, None, self.timeout, cancel).await?;

        let json_path = Self::output_path(audio_path, output_dir.path());
        debug!("Reading whisper output from {}", json_path.display());
        let json = tokio::fs::read_to_string(&json_path).await.map_err(|e| {
            ProviderError::ParseError(format!("missing whisper output {}: {}", json_path.display(), e))
        })?;

        WhisperTranscript::from_json(&json)
    }

    /// whisper names its output after the input file stem
    fn output_path(audio_path: &Path, output_dir: &Path) -> PathBuf {
        let stem = audio_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());
        output_dir.join(format!("{}.json", stem))
    }
}
