/*!
 * Tests for the SVG document format
 */

use std::fs;

use jatoko::language_utils::Script;
use jatoko::svg::SvgFormat;
use jatoko::translation::{DocumentFormat, TranslationMap};

use crate::common::{create_temp_dir, create_test_file, SAMPLE_SVG};

fn format() -> SvgFormat {
    SvgFormat::new(Script::Japanese, Script::Korean)
}

#[test]
fn test_apply_withByteOrderMark_shouldKeepIt() {
    let dir = create_temp_dir().unwrap();
    let input = dir.path().join("bom.svg");
    let mut bytes = b"\xEF\xBB\xBF".to_vec();
    bytes.extend_from_slice(r#"<svg xmlns="http://www.w3.org/2000/svg"><text id="t1">顧客</text></svg>"#.as_bytes());
    fs::write(&input, &bytes).unwrap();
    let output = dir.path().join("out.svg");

    let units = format().extract(&input).unwrap().units;
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].original_text, "顧客");

    let map: TranslationMap = [("t1".to_string(), "고객".to_string())].into_iter().collect();
    let report = format().apply(&input, &output, &map).unwrap();

    assert_eq!(report.applied, 1);
    let written = fs::read(&output).unwrap();
    assert!(written.starts_with(b"\xEF\xBB\xBF"));
    let text = String::from_utf8(written).unwrap();
    assert!(text.contains("jp-text-wrapper"));
    assert!(text.contains(r#"data-original="顧客""#));
    assert!(text.contains("고객"));
}

#[test]
fn test_apply_withNamespacedForeignObject_shouldKeepPrefixes() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "screen.svg", SAMPLE_SVG).unwrap();
    let output = dir.path().join("out.svg");

    let map: TranslationMap = [("shape1".to_string(), "회원 등록".to_string())].into_iter().collect();
    let report = format().apply(&input, &output, &map).unwrap();

    assert_eq!(report.applied, 1);
    assert_eq!(report.missed.len(), 3);
    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains(r#"<xhtml:div class="jp-wrapper">"#));
    assert!(text.contains(r#"<xhtml:span class="text-edit jp-translated">会員登録</xhtml:span>"#));
    assert!(!text.contains("white-space: pre-wrap"));
    assert!(text.starts_with("<?xml"));
}

#[test]
fn test_apply_withMixedScriptText_shouldCountAsTranslated() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(
        dir.path(),
        "mixed.svg",
        r#"<svg xmlns="http://www.w3.org/2000/svg"><text id="t1">顧客 고객</text></svg>"#,
    )
    .unwrap();
    let output = dir.path().join("out.svg");

    let map: TranslationMap = [("t1".to_string(), "고객".to_string())].into_iter().collect();
    let report = format().apply(&input, &output, &map).unwrap();

    assert_eq!(report.applied, 0);
    assert_eq!(report.already_translated, 1);
    assert_eq!(fs::read(&input).unwrap(), fs::read(&output).unwrap());
}

#[test]
fn test_extract_withMalformedXml_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "broken.svg", "<svg><text>顧客</svg>").unwrap();

    assert!(format().extract(&input).is_err());
}

#[test]
fn test_apply_withSharedIds_shouldTranslateEveryNode() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(
        dir.path(),
        "shared.svg",
        r#"<svg><text id="s1">顧客</text><text id="s1">注文</text><g id="s1"><foreignObject><span class="text-edit">会員</span></foreignObject></g></svg>"#,
    )
    .unwrap();
    let output = dir.path().join("out.svg");

    let extraction = format().extract(&input).unwrap();
    assert_eq!(extraction.units.len(), 3);
    assert_eq!(extraction.report.len(), 2);

    let map: TranslationMap = extraction
        .units
        .iter()
        .map(|u| (u.id.clone(), format!("번역 {}", u.original_text)))
        .collect();
    let report = format().apply(&input, &output, &map).unwrap();

    assert_eq!(report.applied, 3);
    assert!(report.missed.is_empty());
    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains("번역 注文"));
    assert!(text.contains("번역 会員"));
}
