/*!
 * # tubelingo - YouTube transcript translation
 *
 * A Rust library that fetches YouTube channel and video metadata, transcribes
 * audio with whisper and translates the transcripts with plamo-translate,
 * storing everything in SQLite.
 *
 * ## Features
 *
 * - Channel and video metadata through yt-dlp
 * - Timed transcript segments from whisper
 * - Batch translation with token-budget packing and separator fallback
 * - Per-segment translation results persisted next to the joined text
 * - ISO 639-1 and ISO 639-3 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `database`: SQLite connection, schema, models and repository
 * - `translation`: The batch translation core:
 *   - `translation::batch`: Token-bounded segment batches
 *   - `translation::fallback`: Primary, secondary and per-segment stages
 *   - `translation::pipeline`: Whole-transcription orchestration
 * - `providers`: Adapters for the external tools:
 *   - `providers::plamo`: plamo-translate, per call or server mode
 *   - `providers::whisper`: Speech recognition
 *   - `providers::ytdlp`: Metadata fetching
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod database;
pub mod errors;
pub mod language_utils;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use database::Repository;
pub use errors::{AppError, ProviderError, TranslationError};
pub use language_utils::{get_language_name, language_codes_match, normalize_language_code};
pub use providers::Translator;
pub use translation::{PipelineOptions, TranslationPipeline};
