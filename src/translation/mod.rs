/*!
 * Batch translation of transcripts.
 *
 * This module contains the translation core, split into several submodules:
 *
 * - `tokens`: Rough token estimation for batch sizing
 * - `batch`: Packing segments into token-bounded batches
 * - `separator`: Translating one batch and splitting it back per segment
 * - `fallback`: Primary separator, secondary separator, then per segment
 * - `pipeline`: Whole-transcription orchestration and persistence
 * - `server`: Scoped start/stop of the translator server
 * - `segments`: Reconstruction of segments from stored content
 */

pub use self::batch::{BatchBuilder, SegmentBatch, PRIMARY_SEPARATOR, SECONDARY_SEPARATOR, SEPARATORS};
pub use self::fallback::{BatchTranslation, FallbackCoordinator, FallbackStage};
pub use self::pipeline::{PipelineOptions, TranslationPipeline};
pub use self::separator::SeparatorTranslator;
pub use self::server::ServerGuard;
pub use self::tokens::TokenEstimator;

pub mod batch;
pub mod fallback;
pub mod pipeline;
pub mod segments;
pub mod separator;
pub mod server;
pub mod tokens;
