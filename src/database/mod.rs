/*!
 * Database module for persistent storage of pipeline results.
 *
 * This module provides SQLite-based persistence for:
 * - Channel and video metadata
 * - Transcriptions with their timed segments
 * - Translations with their per-segment results
 */

pub mod schema;
pub mod connection;
pub mod repository;
pub mod models;

// Re-export main types
pub use connection::DatabaseConnection;
pub use repository::{Repository, TranscriptionRepository, TranslationRepository};
