/*!
 * Language utilities for ISO language code handling.
 *
 * Transcripts come back from whisper with ISO 639-1 codes, while users may
 * type either 639-1 or 639-2 codes on the command line. Everything is
 * normalized through this module before reaching the translator.
 *
 * ```
 * use tubelingo::language_utils::{language_codes_match, normalize_language_code};
 *
 * assert!(language_codes_match("ja", "jpn"));
 * assert_eq!(normalize_language_code("fre").unwrap(), "fr");
 * ```
 */

use anyhow::{Result, anyhow};
use isolang::Language;

/// Languages whose scripts pack many characters into few tokens
const DENSE_SCRIPT_LANGUAGES: &[&str] = &["ja", "zh", "ko", "th"];

/// Map ISO 639-2/B bibliographic codes to their 639-2/T equivalents
fn bibliographic_to_terminologic(code: &str) -> Option<&'static str> {
    let mapped = match code {
        "fre" => "fra",
        "ger" => "deu",
        "dut" => "nld",
        "gre" => "ell",
        "chi" => "zho",
        "cze" => "ces",
        "ice" => "isl",
        "alb" => "sqi",
        "arm" => "hye",
        "baq" => "eus",
        "bur" => "mya",
        "per" => "fas",
        "geo" => "kat",
        "may" => "msa",
        "mac" => "mkd",
        "rum" => "ron",
        "slo" => "slk",
        "wel" => "cym",
        _ => return None,
    };
    Some(mapped)
}

/// Resolve any supported code form to an isolang `Language`
fn resolve(code: &str) -> Option<Language> {
    let normalized = code.trim().to_lowercase();
    match normalized.len() {
        2 => Language::from_639_1(&normalized),
        3 => {
            let part2t = bibliographic_to_terminologic(&normalized).unwrap_or(&normalized);
            Language::from_639_3(part2t)
        }
        _ => None,
    }
}

/// Validate that a code is a known ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<()> {
    resolve(code)
        .map(|_| ())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-1 when one exists, ISO 639-3 otherwise
pub fn normalize_language_code(code: &str) -> Result<String> {
    let lang = resolve(code).ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;
    Ok(lang
        .to_639_1()
        .map(str::to_string)
        .unwrap_or_else(|| lang.to_639_3().to_string()))
}

/// Check if two language codes represent the same language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (resolve(code1), resolve(code2)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Get the English name of a language, e.g. "ja" -> "Japanese"
pub fn get_language_name(code: &str) -> Result<String> {
    let lang = resolve(code).ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;
    Ok(lang.to_name().to_string())
}

/// Whether the language is written in a dense multi-byte script
pub fn is_dense_script(code: &str) -> bool {
    match normalize_language_code(code) {
        Ok(normalized) => DENSE_SCRIPT_LANGUAGES.contains(&normalized.as_str()),
        Err(_) => false,
    }
}
