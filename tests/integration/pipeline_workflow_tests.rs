/*!
 * End-to-end pipeline runs over SVG and diagram documents.
 *
 * Every run uses the mock backend, so request counts and batches can be
 * asserted exactly.
 */

use std::fs;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use jatoko::diagram::{DiagramFormat, JsonModelStore};
use jatoko::errors::PipelineError;
use jatoko::language_utils::Script;
use jatoko::providers::mock::MockBackend;
use jatoko::svg::SvgFormat;
use jatoko::translation::pipeline::{NoopProgress, RecordingProgress};
use jatoko::translation::{DocumentFormat, MetadataCache, TranslationMap};

use crate::common::{
    create_temp_dir, create_test_file, diagram_pipeline, mock_translation, pipeline_for, svg_pipeline,
    svg_with_labels, LATIN_SVG, SAMPLE_PROJECT, SAMPLE_SVG,
};

fn element<'a>(project: &'a Value, id: &str) -> &'a Value {
    project["elements"]
        .as_array()
        .and_then(|elements| elements.iter().find(|e| e["id"] == id))
        .unwrap_or_else(|| panic!("element {} not found", id))
}

#[tokio::test]
async fn test_run_withoutJapaneseText_shouldCopyInputUnchanged() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "latin.svg", LATIN_SVG).unwrap();
    let output = dir.path().join("latin_translated.svg");
    let backend = MockBackend::working();

    let summary = svg_pipeline(&backend, 50)
        .run(&input, &output, &NoopProgress, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.extracted, 0);
    assert_eq!(fs::read(&output).unwrap(), fs::read(&input).unwrap());
    assert_eq!(backend.request_count(), 0);
    assert!(!MetadataCache::metadata_path(&input).exists());
}

#[tokio::test]
async fn test_run_withSvg_shouldTranslateDuplicatesOnceAndOverlay() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "screen.svg", SAMPLE_SVG).unwrap();
    let output = dir.path().join("screen_translated.svg");
    let backend = MockBackend::working();

    let summary = svg_pipeline(&backend, 50)
        .run(&input, &output, &NoopProgress, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.extracted, 4);
    assert_eq!(summary.translated, 3);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.requests, 1);
    assert_eq!(summary.applied, 4);
    assert_eq!(backend.requested_texts(), vec!["顧客管理", "注文", "会員登録"]);

    let svg = fs::read_to_string(&output).unwrap();
    assert!(svg.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert_eq!(svg.matches("jp-overlay-style").count(), 1);
    assert_eq!(svg.matches(r#"class="jp-text-wrapper""#).count(), 3);
    assert!(svg.contains(&format!(">{}</text>", mock_translation("顧客管理"))));
    assert!(svg.contains(r#"<xhtml:span class="text-edit jp-translated">会員登録</xhtml:span>"#));
    assert!(svg.contains(r#"<xhtml:span class="jp-overlay" style="font-size: 13px;">"#));
    assert!(svg.contains("Order</text>"));

    let cache = MetadataCache::new().load(&input);
    assert_eq!(cache.len(), 4);
    assert_eq!(cache.lookup("copy", "顧客管理"), Some(mock_translation("顧客管理").as_str()));
}

#[tokio::test]
async fn test_run_withRepeatedText_shouldRequestTwoTextsAndCacheThreeEntries() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(
        dir.path(),
        "aba.svg",
        r#"<svg><text id="n1">登録</text><text id="n2">削除</text><text id="n3">登録</text></svg>"#,
    )
    .unwrap();
    let output = dir.path().join("aba_translated.svg");
    let backend = MockBackend::working();

    svg_pipeline(&backend, 50)
        .run(&input, &output, &NoopProgress, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(backend.requested_texts(), vec!["登録", "削除"]);
    let cache = MetadataCache::new().load(&input);
    assert_eq!(cache.len(), 3);
    assert_eq!(cache.lookup("n1", "登録"), cache.lookup("n3", "登録"));
    assert_eq!(cache.lookup("n3", "登録"), Some(mock_translation("登録").as_str()));
}

#[tokio::test]
async fn test_run_secondTimeWithoutChanges_shouldReuseCacheAndMatchOutput() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "screen.svg", SAMPLE_SVG).unwrap();
    let first_output = dir.path().join("first.svg");
    let second_output = dir.path().join("second.svg");
    let backend = MockBackend::working();
    let pipeline = svg_pipeline(&backend, 50);

    pipeline
        .run(&input, &first_output, &NoopProgress, &CancellationToken::new())
        .await
        .unwrap();
    let requests_after_first = backend.request_count();

    let summary = pipeline
        .run(&input, &second_output, &NoopProgress, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(backend.request_count(), requests_after_first);
    assert_eq!(summary.requests, 0);
    assert_eq!(summary.cache_hits, 3);
    assert_eq!(fs::read(&first_output).unwrap(), fs::read(&second_output).unwrap());
}

#[tokio::test]
async fn test_run_withChangedText_shouldOnlyTranslateTheChange() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "labels.svg", &svg_with_labels(3)).unwrap();
    let output = dir.path().join("labels_translated.svg");
    let backend = MockBackend::working();
    let pipeline = svg_pipeline(&backend, 50);

    pipeline
        .run(&input, &output, &NoopProgress, &CancellationToken::new())
        .await
        .unwrap();
    fs::write(&input, svg_with_labels(3).replace("項目1", "変更済み")).unwrap();

    let summary = pipeline
        .run(&input, &output, &NoopProgress, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.cache_hits, 2);
    assert_eq!(summary.translated, 1);
    assert_eq!(backend.requests().last().unwrap(), &vec!["変更済み".to_string()]);
}

#[tokio::test]
async fn test_run_withLargeBacklog_shouldIssueCeilChunks() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "many.svg", &svg_with_labels(7)).unwrap();
    let output = dir.path().join("many_translated.svg");
    let backend = MockBackend::working();

    let summary = svg_pipeline(&backend, 3)
        .run(&input, &output, &NoopProgress, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.requests, 3);
    let sizes: Vec<usize> = backend.requests().iter().map(|batch| batch.len()).collect();
    assert_eq!(sizes, vec![3, 3, 1]);
    let expected: Vec<String> = (0..7).map(|i| format!("項目{}", i)).collect();
    assert_eq!(backend.requested_texts(), expected);

    let cache = MetadataCache::new().load(&input);
    for i in 0..7 {
        let text = format!("項目{}", i);
        assert_eq!(cache.lookup(&format!("t{}", i), &text), Some(mock_translation(&text).as_str()));
    }
}

#[tokio::test]
async fn test_run_withFailureInSecondChunk_shouldPersistFirstChunk() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "partial.svg", &svg_with_labels(5)).unwrap();
    let output = dir.path().join("partial_translated.svg");
    let backend = MockBackend::failing_after(1);

    let error = svg_pipeline(&backend, 2)
        .run(&input, &output, &NoopProgress, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(error, PipelineError::Translation(_)));
    assert!(!output.exists());
    let cache = MetadataCache::new().load(&input);
    assert_eq!(cache.len(), 2);
    assert!(cache.lookup("t0", "項目0").is_some());
    assert!(cache.lookup("t1", "項目1").is_some());

    // A later run picks up where the failed one stopped
    let retry_backend = MockBackend::working();
    let summary = svg_pipeline(&retry_backend, 2)
        .run(&input, &output, &NoopProgress, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.cache_hits, 2);
    assert_eq!(retry_backend.requested_texts(), vec!["項目2", "項目3", "項目4"]);
}

#[tokio::test]
async fn test_run_withCancelledToken_shouldStopBeforeTranslating() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "cancel.svg", SAMPLE_SVG).unwrap();
    let output = dir.path().join("cancel_translated.svg");
    let backend = MockBackend::working();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let error = svg_pipeline(&backend, 50)
        .run(&input, &output, &NoopProgress, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(error, PipelineError::Cancelled));
    assert_eq!(backend.request_count(), 0);
    assert!(!output.exists());
}

#[tokio::test]
async fn test_run_progress_shouldBeMonotonicAndComplete() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "progress.svg", &svg_with_labels(5)).unwrap();
    let output = dir.path().join("progress_translated.svg");
    let progress = RecordingProgress::new();

    svg_pipeline(&MockBackend::working(), 2)
        .run(&input, &output, &progress, &CancellationToken::new())
        .await
        .unwrap();

    let percents = progress.percents();
    assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(percents.first(), Some(&5));
    assert_eq!(percents.last(), Some(&100));
}

#[tokio::test]
async fn test_run_withUnwritableCache_shouldStillWriteOutput() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "locked.svg", &svg_with_labels(2)).unwrap();
    let output = dir.path().join("locked_translated.svg");
    fs::create_dir(MetadataCache::metadata_path(&input)).unwrap();

    let summary = svg_pipeline(&MockBackend::working(), 50)
        .run(&input, &output, &NoopProgress, &CancellationToken::new())
        .await
        .unwrap();

    assert!(summary.persistence_error.is_some());
    assert_eq!(summary.applied, 2);
    assert!(fs::read_to_string(&output).unwrap().contains(&mock_translation("項目1")));
}

#[tokio::test]
async fn test_run_withDanglingOwner_shouldCountStructuralWarning() {
    let dir = create_temp_dir().unwrap();
    let project = SAMPLE_PROJECT.replacen(
        r#"{ "id": "c3","#,
        r#"{ "id": "lost", "kind": "class", "name": "迷子", "owner": "ghost" },
    { "id": "c3","#,
        1,
    );
    let input = create_test_file(dir.path(), "lost.uml.json", &project).unwrap();
    let output = dir.path().join("lost_translated.uml.json");
    let backend = MockBackend::working();

    let summary = diagram_pipeline(&backend, 50)
        .run(&input, &output, &NoopProgress, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.structural_warnings, 1);
    assert_eq!(summary.extracted, 8);
    assert!(!backend.requested_texts().contains(&"迷子".to_string()));

    let written: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(element(&written, "lost")["name"], "迷子");
}

#[tokio::test]
async fn test_run_withDiagramProject_shouldAppendTranslations() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "sales.uml.json", SAMPLE_PROJECT).unwrap();
    let output = dir.path().join("sales_translated.uml.json");
    let backend = MockBackend::working();

    let summary = diagram_pipeline(&backend, 50)
        .run(&input, &output, &NoopProgress, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.extracted, 8);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(backend.request_count(), 1);
    assert_eq!(backend.requested_texts().len(), 7);
    assert_eq!(summary.missed, 0);

    let project: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(element(&project, "c1")["name"], format!("顧客 / {}", mock_translation("顧客")));
    assert_eq!(element(&project, "a1")["name"], format!("氏名\n{}", mock_translation("氏名")));
    assert_eq!(element(&project, "c3")["name"], "Customer");
    assert_eq!(element(&project, "c1")["stereotype"], "entity");
    assert_eq!(
        element(&project, "n1")["body"],
        format!("顧客は複数の注文を持つ\n{}", mock_translation("顧客は複数の注文を持つ"))
    );

    let diagram = &project["diagrams"][0];
    assert_eq!(diagram["name"], format!("クラス図 / {}", mock_translation("クラス図")));
    assert_eq!(diagram["presentations"][0]["label"], format!("顧客\n{}", mock_translation("顧客")));
    assert_eq!(diagram["presentations"][1]["label"], format!("メモ\n{}", mock_translation("メモ")));
    assert_eq!(project["name"], "販売管理");
}

#[tokio::test]
async fn test_apply_twiceOnFreshLoads_shouldProduceIdenticalBytes() {
    let dir = create_temp_dir().unwrap();
    let svg_input = create_test_file(dir.path(), "screen.svg", SAMPLE_SVG).unwrap();
    let model_input = create_test_file(dir.path(), "sales.uml.json", SAMPLE_PROJECT).unwrap();

    let svg_format = SvgFormat::new(Script::Japanese, Script::Korean);
    let svg_units = svg_format.extract(&svg_input).unwrap().units;
    let svg_map: TranslationMap = svg_units
        .iter()
        .map(|u| (u.id.clone(), mock_translation(&u.original_text)))
        .collect();
    let first = dir.path().join("a.svg");
    let second = dir.path().join("b.svg");
    svg_format.apply(&svg_input, &first, &svg_map).unwrap();
    svg_format.apply(&svg_input, &second, &svg_map).unwrap();
    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());

    let model_format = DiagramFormat::new(Script::Japanese, Script::Korean);
    let model_units = model_format.extract(&model_input).unwrap().units;
    let model_map: TranslationMap = model_units
        .iter()
        .map(|u| (u.id.clone(), mock_translation(&u.original_text)))
        .collect();
    let first = dir.path().join("a.uml.json");
    let second = dir.path().join("b.uml.json");
    model_format.apply(&model_input, &first, &model_map).unwrap();
    model_format.apply(&model_input, &second, &model_map).unwrap();
    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[tokio::test]
async fn test_run_withDiagramProject_shouldCloseHandleOnSuccessAndFailure() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "sales.uml.json", SAMPLE_PROJECT).unwrap();
    let store = JsonModelStore::new();
    let pipeline = pipeline_for(
        DiagramFormat::with_store(store.clone(), Script::Japanese, Script::Korean),
        &MockBackend::working(),
        50,
    );

    pipeline
        .run(&input, &dir.path().join("ok.uml.json"), &NoopProgress, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(store.open_handles(), 0);

    // Saving into a missing directory fails after the project was opened
    let error = pipeline
        .run(
            &input,
            &dir.path().join("missing/dir/out.uml.json"),
            &NoopProgress,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(error, PipelineError::Application { .. }));
    assert_eq!(store.open_handles(), 0);
}

#[tokio::test]
async fn test_run_withMalformedProject_shouldReportExtractionError() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "broken.uml.json", "{ \"elements\": [").unwrap();
    let store = JsonModelStore::new();
    let pipeline = pipeline_for(
        DiagramFormat::with_store(store.clone(), Script::Japanese, Script::Korean),
        &MockBackend::working(),
        50,
    );

    let error = pipeline
        .run(&input, &dir.path().join("out.uml.json"), &NoopProgress, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(error, PipelineError::Extraction { .. }));
    assert_eq!(store.open_handles(), 0);
}
