use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities
///
/// ISO 639 code handling (validation, normalization, matching) plus the
/// script detectors used to decide which texts are translatable and which
/// already carry a translation.
/// Language code type
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

// ISO 639-2/B codes that differ from their 639-2/T counterpart
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

fn bibliographic_to_terminology(code: &str) -> Option<&'static str> {
    BIBLIOGRAPHIC_CODES
        .iter()
        .find(|(b, _)| *b == code)
        .map(|(_, t)| *t)
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let normalized_code = code.trim().to_lowercase();

    match normalized_code.len() {
        2 if Language::from_639_1(&normalized_code).is_some() => Ok(LanguageCodeType::Part1),
        3 if Language::from_639_3(&normalized_code).is_some() => Ok(LanguageCodeType::Part2T),
        3 if bibliographic_to_terminology(&normalized_code).is_some() => Ok(LanguageCodeType::Part2B),
        _ => Err(anyhow!("Invalid language code: {}", code)),
    }
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }
        if let Some(terminology) = bibliographic_to_terminology(&normalized_code) {
            return Ok(terminology.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let part2t = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&part2t)
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;

    Ok(lang.to_639_1().map(str::to_string).unwrap_or(part2t))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Writing systems the detectors recognise.
///
/// Detection is a plain Unicode range membership test. Mixed-language
/// strings count as containing every script they touch, so the
/// "already translated" check built on top of this is an approximation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    Japanese,
    Korean,
}

const JAPANESE_RANGES: &[(u32, u32)] = &[
    (0x3040, 0x309F), // Hiragana
    (0x30A0, 0x30FF), // Katakana
    (0x4E00, 0x9FAF), // CJK unified ideographs
    (0x3099, 0x309C), // combining (semi-)voiced marks
    (0x31F0, 0x31FF), // Katakana phonetic extensions
    (0xFF65, 0xFF9F), // halfwidth Katakana
];

const KOREAN_RANGES: &[(u32, u32)] = &[
    (0xAC00, 0xD7A3), // Hangul syllables
    (0x1100, 0x11FF), // Hangul Jamo
    (0x3130, 0x318F), // compatibility Jamo
    (0xFFA0, 0xFFDC), // halfwidth Hangul
];

impl Script {
    /// Map a language code (any ISO 639 form) to its script
    pub fn for_language(code: &str) -> Result<Self> {
        match normalize_to_part2t(code)?.as_str() {
            "jpn" => Ok(Self::Japanese),
            "kor" => Ok(Self::Korean),
            other => Err(anyhow!("No script detector for language: {}", other)),
        }
    }

    fn ranges(self) -> &'static [(u32, u32)] {
        match self {
            Self::Japanese => JAPANESE_RANGES,
            Self::Korean => KOREAN_RANGES,
        }
    }

    /// Whether a single character belongs to this script
    pub fn matches_char(self, c: char) -> bool {
        let code = c as u32;
        self.ranges().iter().any(|(lo, hi)| (*lo..=*hi).contains(&code))
    }

    /// Whether the text contains at least one character of this script
    pub fn contains(self, text: &str) -> bool {
        text.chars().any(|c| self.matches_char(c))
    }

    /// Whether at least `threshold` of the visible characters are in this script.
    ///
    /// Whitespace and control characters are not counted.
    pub fn is_primarily(self, text: &str, threshold: f64) -> bool {
        let (total, hits) = text
            .chars()
            .filter(|c| !c.is_whitespace() && !c.is_control())
            .fold((0usize, 0usize), |(total, hits), c| {
                (total + 1, hits + usize::from(self.matches_char(c)))
            });

        total > 0 && (hits as f64 / total as f64) >= threshold
    }
}
