/*!
 * Token estimation for batch sizing.
 *
 * The estimate only decides where batches are cut; it is deliberately rough.
 * English text is counted by bytes, everything else by characters, which
 * overestimates for unknown languages and keeps batches under budget.
 */

use crate::language_utils::{is_dense_script, language_codes_match};

/// Approximate token counter
#[derive(Debug, Clone)]
pub struct TokenEstimator {
    /// Language the estimated text is written in
    language: String,
}

impl TokenEstimator {
    /// Create an estimator for text written in `language`
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
        }
    }

    /// Estimate the token count of `text` in this estimator's language
    pub fn count(&self, text: &str) -> usize {
        Self::estimate(text, &self.language)
    }

    /// Estimate the token count of `text` written in `language`
    ///
    /// English: bytes / 4. Dense scripts and unknown languages: chars / 2.
    pub fn estimate(text: &str, language: &str) -> usize {
        match language {
            lang if is_dense_script(lang) => text.chars().count() / 2,
            lang if language_codes_match(lang, "en") => text.len() / 4,
            _ => text.chars().count() / 2,
        }
    }
}
