/*!
 * Tests for language code utilities
 */

use tubelingo::language_utils::{
    get_language_name, is_dense_script, language_codes_match, normalize_language_code,
    validate_language_code,
};

#[test]
fn test_validateLanguageCode_withValidAndInvalidCodes_shouldDiscriminate() {
    assert!(validate_language_code("en").is_ok());
    assert!(validate_language_code("jpn").is_ok());
    assert!(validate_language_code("fre").is_ok());
    assert!(validate_language_code("xx").is_err());
    assert!(validate_language_code("").is_err());
}

#[test]
fn test_normalizeLanguageCode_shouldPreferTwoLetterCodes() {
    assert_eq!(normalize_language_code("jpn").unwrap(), "ja");
    assert_eq!(normalize_language_code("ger").unwrap(), "de");
    assert_eq!(normalize_language_code("EN").unwrap(), "en");
}

#[test]
fn test_languageCodesMatch_shouldIgnoreCodeForm() {
    assert!(language_codes_match("en", "eng"));
    assert!(language_codes_match("fr", "fre"));
    assert!(!language_codes_match("en", "ja"));
    assert!(!language_codes_match("xx", "xx"));
}

#[test]
fn test_getLanguageName_shouldReturnEnglishNames() {
    assert_eq!(get_language_name("ja").unwrap(), "Japanese");
    assert_eq!(get_language_name("en").unwrap(), "English");
    assert!(get_language_name("qq").is_err());
}

#[test]
fn test_isDenseScript_shouldOnlyMatchDenseScripts() {
    assert!(is_dense_script("ja"));
    assert!(is_dense_script("zho"));
    assert!(!is_dense_script("en"));
    assert!(!is_dense_script("unknown"));
}
