/*!
 * Common test utilities for the jatoko test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use jatoko::app_config::{Config, TranslationProvider};
use jatoko::diagram::DiagramFormat;
use jatoko::language_utils::Script;
use jatoko::providers::mock::MockBackend;
use jatoko::svg::SvgFormat;
use jatoko::translation::client::RetryPolicy;
use jatoko::translation::{ClientSettings, DocumentFormat, Pipeline, TranslationClient};

/// SVG with two `<text>` labels, a duplicate and a foreignObject shape
pub const SAMPLE_SVG: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" xmlns:xhtml="http://www.w3.org/1999/xhtml" width="400" height="200">
  <text id="title" x="10" y="20" font-size="16px">顧客管理</text>
  <text x="10" y="60" fill="#333">注文</text>
  <text x="10" y="100" fill="#333">Order</text>
  <text id="copy" x="10" y="140">顧客管理</text>
  <g id="shape1">
    <foreignObject width="120" height="40">
      <xhtml:div style="display: flex; white-space: pre-wrap; font-size: 14px;">
        <xhtml:div><xhtml:span class="text-edit">会員登録</xhtml:span></xhtml:div>
      </xhtml:div>
    </foreignObject>
  </g>
</svg>
"##;

/// SVG without any Japanese text
pub const LATIN_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"><text id="t1">Customer</text><!-- note --></svg>
"#;

/// Diagram project with a class diagram, a free note shape and a duplicate label
pub const SAMPLE_PROJECT: &str = r#"{
  "name": "販売管理",
  "elements": [
    { "id": "pkg1", "kind": "package", "name": "販売" },
    { "id": "c1", "kind": "class", "name": "顧客", "owner": "pkg1", "stereotype": "entity" },
    { "id": "a1", "kind": "attribute", "name": "氏名", "owner": "c1" },
    { "id": "c2", "kind": "class", "name": "注文", "owner": "pkg1" },
    { "id": "c3", "kind": "class", "name": "Customer", "owner": "pkg1" },
    { "id": "n1", "kind": "comment", "body": "顧客は複数の注文を持つ", "owner": "pkg1" }
  ],
  "diagrams": [
    {
      "id": "d1",
      "name": "クラス図",
      "kind": "class",
      "owner": "pkg1",
      "presentations": [
        { "modelId": "c1", "kind": "class", "label": "顧客", "bounds": { "x": 10.0, "y": 10.0, "width": 80.0, "height": 40.0 } },
        { "kind": "note", "label": "メモ", "bounds": { "x": 200.0, "y": 20.0, "width": 100.0, "height": 40.0 } }
      ]
    }
  ]
}
"#;

/// Route library logs through env_logger; safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// `n` distinct Japanese labels as an SVG document
pub fn svg_with_labels(count: usize) -> String {
    let mut svg = String::from(r#"<svg xmlns="http://www.w3.org/2000/svg">"#);
    for i in 0..count {
        svg.push_str(&format!(r#"<text id="t{}">項目{}</text>"#, i, i));
    }
    svg.push_str("</svg>\n");
    svg
}

/// Client settings without pauses, so tests run at full speed
pub fn fast_settings(chunk_size: usize) -> ClientSettings {
    ClientSettings {
        chunk_size,
        chunk_delay: Duration::ZERO,
        retry: RetryPolicy::new(3, Duration::ZERO),
        ..ClientSettings::default()
    }
}

pub fn client(backend: &MockBackend, chunk_size: usize) -> TranslationClient {
    TranslationClient::new(Arc::new(backend.clone()), fast_settings(chunk_size))
}

pub fn svg_pipeline(backend: &MockBackend, chunk_size: usize) -> Pipeline<SvgFormat> {
    Pipeline::new(SvgFormat::new(Script::Japanese, Script::Korean), client(backend, chunk_size))
}

pub fn diagram_pipeline(backend: &MockBackend, chunk_size: usize) -> Pipeline<DiagramFormat> {
    Pipeline::new(DiagramFormat::new(Script::Japanese, Script::Korean), client(backend, chunk_size))
}

/// Generic pipeline over any format, for tests that drive a custom store
pub fn pipeline_for<F: DocumentFormat>(format: F, backend: &MockBackend, chunk_size: usize) -> Pipeline<F> {
    Pipeline::new(format, client(backend, chunk_size))
}

/// Japanese to Korean configuration that uses the mock backend
pub fn mock_config() -> Config {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Mock;
    config.translation.chunk_delay_ms = 0;
    config.translation.retry_backoff_ms = 0;
    config
}

/// The mock backend's answer for a text
pub fn mock_translation(text: &str) -> String {
    MockBackend::expected_translation(text, "ko")
}
