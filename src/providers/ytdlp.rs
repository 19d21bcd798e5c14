/*!
 * yt-dlp metadata adapter.
 *
 * Only metadata is fetched here; audio is expected to be provided as a local
 * file to the transcription step.
 */

use log::{debug, info};
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::process::run_tool;
use crate::app_config::YtDlpConfig;
use crate::errors::ProviderError;

/// Metadata for a single video
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub id: String,
    pub channel_id: Option<String>,
    pub title: String,
    pub url: String,
    pub duration_secs: Option<i64>,
    pub upload_date: Option<String>,
}

/// Metadata for a channel and its listed videos
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    pub id: String,
    pub title: String,
    pub url: String,
    pub videos: Vec<VideoInfo>,
}

/// yt-dlp command-line runner
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: String,
    timeout: Duration,
    playlist_limit: Option<usize>,
}

impl YtDlp {
    pub fn new(config: &YtDlpConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            playlist_limit: config.playlist_limit,
        }
    }

    /// Reject anything that is not an http(s) URL before spawning yt-dlp
    pub fn validate_url(raw: &str) -> Result<Url, ProviderError> {
        let url = Url::parse(raw.trim())
            .map_err(|e| ProviderError::InvalidInput(format!("invalid URL '{}': {}", raw, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ProviderError::InvalidInput(format!("unsupported URL scheme '{}'", scheme))),
        }
    }

    /// Fetch a channel and the flat list of its videos
    pub async fn fetch_channel(&self, url: &str, cancel: &CancellationToken) -> Result<ChannelInfo, ProviderError> {
        let url = Self::validate_url(url)?;

        let mut args = vec!["--flat-playlist".to_string(), "--dump-single-json".to_string()];
        if let Some(limit) = self.playlist_limit {
            args.push("--playlist-end".to_string());
            args.push(limit.to_string());
        }
        args.push(url.to_string());

        info!("Fetching channel metadata for {}", url);
        let output = run_tool(&self.binary, &args, None, self.timeout, cancel).await?;
        let json: Value = serde_json::from_str(&output.stdout)
            .map_err(|e| ProviderError::ParseError(format!("invalid yt-dlp JSON: {}", e)))?;

        let channel = parse_channel(&json, url.as_str())?;
        debug!("Channel {} lists {} videos", channel.id, channel.videos.len());
        Ok(channel)
    }

    /// Fetch metadata of a single video
    pub async fn fetch_video(&self, url: &str, cancel: &CancellationToken) -> Result<VideoInfo, ProviderError> {
        let url = Self::validate_url(url)?;
        let args = vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--skip-download".to_string(),
            url.to_string(),
        ];

        let output = run_tool(&self.binary, &args, None, self.timeout, cancel).await?;
        let json: Value = serde_json::from_str(&output.stdout)
            .map_err(|e| ProviderError::ParseError(format!("invalid yt-dlp JSON: {}", e)))?;

        parse_video(&json, None)
            .ok_or_else(|| ProviderError::ParseError("yt-dlp output has no video id".to_string()))
    }
}

fn string_field(json: &Value, key: &str) -> Option<String> {
    json.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse one video entry; entries without an id are skipped
pub fn parse_video(json: &Value, channel_id: Option<&str>) -> Option<VideoInfo> {
    let id = string_field(json, "id")?;
    let url = string_field(json, "webpage_url")
        .or_else(|| string_field(json, "url"))
        .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", id));

    Some(VideoInfo {
        title: string_field(json, "title").unwrap_or_else(|| id.clone()),
        channel_id: string_field(json, "channel_id").or_else(|| channel_id.map(str::to_string)),
        duration_secs: json.get("duration").and_then(|v| v.as_f64()).map(|d| d.round() as i64),
        upload_date: string_field(json, "upload_date"),
        url,
        id,
    })
}

/// Parse `--dump-single-json` output, flattening nested tab playlists
pub fn parse_channel(json: &Value, requested_url: &str) -> Result<ChannelInfo, ProviderError> {
    let id = string_field(json, "channel_id")
        .or_else(|| string_field(json, "id"))
        .ok_or_else(|| ProviderError::ParseError("yt-dlp output has no channel id".to_string()))?;

    let title = string_field(json, "channel")
        .or_else(|| string_field(json, "uploader"))
        .or_else(|| string_field(json, "title"))
        .unwrap_or_else(|| id.clone());

    let url = string_field(json, "channel_url")
        .or_else(|| string_field(json, "webpage_url"))
        .unwrap_or_else(|| requested_url.to_string());

    let mut videos = Vec::new();
    collect_entries(json, &id, &mut videos);

    Ok(ChannelInfo { id, title, url, videos })
}

fn collect_entries(json: &Value, channel_id: &str, videos: &mut Vec<VideoInfo>) {
    let Some(entries) = json.get("entries").and_then(|e| e.as_array()) else {
        return;
    };

    for entry in entries {
        if entry.get("entries").is_some() {
            // Channel root URLs list tabs (Videos, Shorts, ...) as nested playlists
            collect_entries(entry, channel_id, videos);
        } else if let Some(video) = parse_video(entry, Some(channel_id)) {
            if !videos.iter().any(|v| v.id == video.id) {
                videos.push(video);
            }
        }
    }
}
