/*!
 * Tests for language utility functions
 */

use jatoko::language_utils::{
    get_language_name, language_codes_match, normalize_to_part2t, validate_language_code, LanguageCodeType, Script,
};

#[test]
fn test_validate_language_code_withValidCodes_shouldReturnCorrectType() {
    assert!(matches!(validate_language_code("ja").unwrap(), LanguageCodeType::Part1));
    assert!(matches!(validate_language_code("kor").unwrap(), LanguageCodeType::Part2T));
    assert!(matches!(validate_language_code(" JPN ").unwrap(), LanguageCodeType::Part2T));
    assert!(validate_language_code("zz").is_err());
    assert!(validate_language_code("j").is_err());
}

#[test]
fn test_normalize_to_part2t_withValidCodes_shouldNormalizeCorrectly() {
    assert_eq!(normalize_to_part2t("ja").unwrap(), "jpn");
    assert_eq!(normalize_to_part2t("ko").unwrap(), "kor");
    assert_eq!(normalize_to_part2t("kor").unwrap(), "kor");
}

#[test]
fn test_language_codes_match_acrossFormats_shouldMatch() {
    assert!(language_codes_match("ja", "jpn"));
    assert!(language_codes_match("KO", "kor"));
    assert!(!language_codes_match("ja", "ko"));
}

#[test]
fn test_get_language_name_shouldReturnEnglishName() {
    assert_eq!(get_language_name("ja").unwrap(), "Japanese");
    assert_eq!(get_language_name("ko").unwrap(), "Korean");
}

#[test]
fn test_script_contains_withTranslatedLabel_shouldSeeBothScripts() {
    let label = "顧客 / 고객";
    assert!(Script::Japanese.contains(label));
    assert!(Script::Korean.contains(label));
    assert!(!Script::Korean.is_primarily(label, 0.6));
}
