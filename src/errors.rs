/*!
 * Error types for the tubelingo application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when driving an external tool (plamo-translate, whisper, yt-dlp)
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The tool binary could not be found on PATH
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// The tool ran but exited unsuccessfully
    #[error("{program} failed ({status}): {stderr}")]
    ExecutionFailed {
        /// Program that was executed
        program: String,
        /// Exit status description
        status: String,
        /// Filtered stderr output
        stderr: String,
    },

    /// The request was rejected before reaching the tool
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The tool did not finish in time
    #[error("{program} timed out after {secs} seconds")]
    Timeout {
        /// Program that was executed
        program: String,
        /// Timeout that elapsed
        secs: u64,
    },

    /// The caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// The tool output could not be parsed
    #[error("Failed to parse tool output: {0}")]
    ParseError(String),

    /// The long-lived translator server could not be brought up
    #[error("Translator server unavailable: {0}")]
    ServerUnavailable(String),
}

/// Errors raised by the batch translation core
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Bad parameters, such as a non-positive token budget
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The transcription has no segments to translate
    #[error("No segments found for transcription {0}")]
    EmptyInput(String),

    /// The translated text did not split back into one part per segment
    #[error("Separator mismatch for {separator:?}: expected {expected} parts, got {actual}")]
    SeparatorMismatch {
        /// Separator the batch was joined with
        separator: String,
        /// Number of segments in the batch
        expected: usize,
        /// Number of parts found in the translated text
        actual: usize,
    },

    /// The translate capability failed
    #[error("External failure: {0}")]
    External(#[from] ProviderError),

    /// Repository failure
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// The run was cancelled
    #[error("Translation cancelled")]
    Cancelled,
}

impl TranslationError {
    /// Whether this error (directly or through the provider) represents cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            TranslationError::Cancelled | TranslationError::External(ProviderError::Cancelled)
        )
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from an external tool
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
