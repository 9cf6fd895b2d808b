/*!
 * Tests for the per-diagram-kind handlers through the diagram format
 */

use std::collections::HashSet;
use std::fs;

use serde_json::Value;

use jatoko::diagram::DiagramFormat;
use jatoko::language_utils::Script;
use jatoko::translation::{DocumentFormat, TranslationMap};

use crate::common::{create_temp_dir, create_test_file};

const MIXED_PROJECT: &str = r#"{
  "elements": [
    { "id": "pkg", "kind": "package", "name": "Model" },
    { "id": "e1", "kind": "er_entity", "name": "Customer", "logicalName": "顧客", "physicalName": "CUSTOMER", "owner": "pkg" },
    { "id": "e1a", "kind": "er_attribute", "logicalName": "顧客名", "physicalName": "NAME", "owner": "e1" },
    { "id": "i1", "kind": "interaction", "name": "注文処理", "owner": "pkg" },
    { "id": "l1", "kind": "lifeline", "name": "利用者", "owner": "i1" },
    { "id": "m1", "kind": "message", "name": "注文する", "argument": "商品", "returnValue": "結果", "guard": "在庫あり", "owner": "i1" },
    { "id": "act", "kind": "activity", "name": "受付", "owner": "pkg" },
    { "id": "s0", "kind": "activity_node", "name": "開始ノード1", "owner": "act" },
    { "id": "x1", "kind": "action", "name": "確認する", "owner": "act" }
  ],
  "diagrams": [
    {
      "id": "er",
      "kind": "er",
      "presentations": [
        { "modelId": "e1", "kind": "entity" },
        { "modelId": "ghost", "kind": "entity" },
        { "kind": "note", "label": "補足", "bounds": { "x": 5.0, "y": 5.0, "width": 50.0, "height": 20.0 } }
      ]
    },
    { "id": "seq", "kind": "sequence", "subject": "i1" },
    {
      "id": "mm",
      "kind": "mindmap",
      "rootTopic": {
        "label": "中心",
        "bounds": { "x": 0.0, "y": 0.0, "width": 60.0, "height": 20.0 },
        "children": [ { "label": "枝" }, { "modelId": "t9", "label": "葉" } ]
      }
    },
    {
      "id": "ad",
      "kind": "activity",
      "subject": "act",
      "presentations": [
        { "modelId": "s0", "kind": "initial", "label": "開始ノード1" },
        { "modelId": "x1", "kind": "action", "label": "確認する" }
      ]
    },
    { "id": "broken", "kind": "sequence", "subject": "nope" }
  ]
}
"#;

const TRANSLATION: &str = "번역";

fn format() -> DiagramFormat {
    DiagramFormat::new(Script::Japanese, Script::Korean)
}

fn element<'a>(project: &'a Value, id: &str) -> &'a Value {
    project["elements"]
        .as_array()
        .and_then(|elements| elements.iter().find(|e| e["id"] == id))
        .unwrap_or_else(|| panic!("element {} not found", id))
}

fn diagram<'a>(project: &'a Value, id: &str) -> &'a Value {
    project["diagrams"]
        .as_array()
        .and_then(|diagrams| diagrams.iter().find(|d| d["id"] == id))
        .unwrap_or_else(|| panic!("diagram {} not found", id))
}

#[test]
fn test_extract_withMixedDiagrams_shouldRouteToHandlers() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "mixed.uml.json", MIXED_PROJECT).unwrap();

    let extraction = format().extract(&input).unwrap();
    let ids: HashSet<&str> = extraction.units.iter().map(|u| u.id.as_str()).collect();

    for expected in [
        "i1", "act", "e1_logical", "e1a_logical", "l1", "m1_name", "m1_argument", "m1_return",
        "m1_guard", "topic_t9", "x1", "presentation_x1",
    ] {
        assert!(ids.contains(expected), "missing unit {}", expected);
    }
    // Latin names, control nodes and their shapes stay out
    for unexpected in ["pkg", "e1", "e1_physical", "s0", "presentation_s0"] {
        assert!(!ids.contains(unexpected), "unexpected unit {}", unexpected);
    }
    assert_eq!(ids.iter().filter(|id| id.starts_with("presentation_note_")).count(), 1);
    assert_eq!(ids.iter().filter(|id| id.starts_with("topic_")).count(), 3);
    assert_eq!(extraction.units.len(), ids.len());

    // Missing shape target and missing sequence subject
    assert_eq!(extraction.report.len(), 2);
}

#[test]
fn test_apply_withMixedDiagrams_shouldRewriteEverySlot() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "mixed.uml.json", MIXED_PROJECT).unwrap();
    let output = dir.path().join("mixed_translated.uml.json");

    let units = format().extract(&input).unwrap().units;
    let map: TranslationMap = units.iter().map(|u| (u.id.clone(), TRANSLATION.to_string())).collect();
    let report = format().apply(&input, &output, &map).unwrap();

    assert_eq!(report.applied, units.len());
    assert!(report.missed.is_empty());

    let project: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(element(&project, "e1")["logicalName"], "顧客\n번역");
    assert_eq!(element(&project, "e1")["physicalName"], "CUSTOMER");
    assert_eq!(element(&project, "e1a")["logicalName"], "顧客名\n번역");
    assert_eq!(element(&project, "i1")["name"], "注文処理\n번역");
    assert_eq!(element(&project, "m1")["returnValue"], "結果\n번역");
    assert_eq!(element(&project, "m1")["guard"], "在庫あり\n번역");
    assert_eq!(element(&project, "act")["name"], "受付 / 번역");
    assert_eq!(element(&project, "x1")["name"], "確認する / 번역");
    assert_eq!(element(&project, "s0")["name"], "開始ノード1");

    let mind_map = diagram(&project, "mm");
    assert_eq!(mind_map["rootTopic"]["label"], "中心\n번역");
    assert_eq!(mind_map["rootTopic"]["children"][1]["label"], "葉\n번역");

    let activity = diagram(&project, "ad");
    assert_eq!(activity["presentations"][0]["label"], "開始ノード1");
    assert_eq!(activity["presentations"][1]["label"], "確認する\n번역");

    let er = diagram(&project, "er");
    assert_eq!(er["presentations"][2]["label"], "補足\n번역");
}

#[test]
fn test_apply_onTranslatedOutput_shouldSkipEverySlot() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "mixed.uml.json", MIXED_PROJECT).unwrap();
    let first = dir.path().join("first.uml.json");
    let second = dir.path().join("second.uml.json");

    let units = format().extract(&input).unwrap().units;
    let map: TranslationMap = units.iter().map(|u| (u.id.clone(), TRANSLATION.to_string())).collect();
    format().apply(&input, &first, &map).unwrap();

    let report = format().apply(&first, &second, &map).unwrap();

    assert_eq!(report.applied, 0);
    assert_eq!(report.already_translated, units.len());
    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn test_apply_withPartialMap_shouldReportMisses() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "mixed.uml.json", MIXED_PROJECT).unwrap();
    let output = dir.path().join("out.uml.json");

    let map: TranslationMap = [("l1".to_string(), TRANSLATION.to_string())].into_iter().collect();
    let report = format().apply(&input, &output, &map).unwrap();

    assert_eq!(report.applied, 1);
    assert!(report.missed.contains(&"m1_name".to_string()));
    assert!(!report.missed.contains(&"l1".to_string()));
}
