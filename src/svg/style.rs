//! Hover-overlay stylesheet and clipboard script injected into translated SVGs.

use super::dom::{NodeId, SvgDocument};

/// Marker id of the injected `<style>` element
pub const OVERLAY_STYLE_ID: &str = "jp-overlay-style";

const OVERLAY_CSS: &str = "\
.jp-text-wrapper { cursor: pointer; position: relative; }
.tooltip-text {
  opacity: 0;
  pointer-events: none;
  transition: opacity 0.3s ease;
}
.jp-text-wrapper:hover .original-text { opacity: 0; }
.jp-text-wrapper:hover .tooltip-text {
  opacity: 1;
  fill: #2563eb;
  font-weight: bold;
}
.jp-wrapper {
  position: relative;
  display: inline-block;
  cursor: pointer;
}
.jp-wrapper .jp-overlay {
  position: absolute;
  top: -4px;
  left: -2px;
  width: calc(100% + 6px);
  height: calc(100% + 8px);
  display: flex;
  align-items: center;
  justify-content: center;
  line-height: 1.3;
  background-color: rgba(37, 99, 235, 0.95);
  color: white;
  font-weight: bold;
  opacity: 0;
  pointer-events: none;
  transition: opacity 0.3s ease;
  z-index: 1000;
}
.jp-wrapper:hover .jp-overlay {
  opacity: 1;
}";

const COPY_SCRIPT: &str = "\
function copyOriginalText(event) {
  var originalText = event.currentTarget.getAttribute('data-original');
  if (originalText && navigator.clipboard) {
    navigator.clipboard.writeText(originalText);
    alert('원문 일본어가 복사되었습니다.');
  }
}";

/// Whether a previous run already injected the overlay styles
pub fn has_overlay_styles(doc: &SvgDocument) -> bool {
    overlay_style_node(doc).is_some()
}

/// Insert `<defs>` with the overlay styles as the root's first child.
///
/// Returns false when the styles were already present.
pub fn ensure_overlay_styles(doc: &mut SvgDocument) -> bool {
    if has_overlay_styles(doc) {
        return false;
    }
    let Some(root) = doc.root_element() else {
        return false;
    };
    let prefix = doc
        .element(root)
        .map(|e| e.prefix().to_string())
        .unwrap_or_default();

    let defs = doc.create_element(&format!("{}defs", prefix), &[]);
    let style = doc.create_element(
        &format!("{}style", prefix),
        &[("id", OVERLAY_STYLE_ID), ("type", "text/css")],
    );
    let css = doc.create_cdata(OVERLAY_CSS);
    doc.append_child(style, css);
    doc.append_child(defs, style);

    let script = doc.create_element(&format!("{}script", prefix), &[("type", "text/javascript")]);
    let js = doc.create_cdata(COPY_SCRIPT);
    doc.append_child(script, js);
    doc.append_child(defs, script);

    doc.insert_child(root, 0, defs);
    true
}

/// The `<style>` element carrying the marker, if any
pub fn overlay_style_node(doc: &SvgDocument) -> Option<NodeId> {
    doc.elements_by_name("style")
        .into_iter()
        .find(|&id| doc.element(id).and_then(|e| e.attr("id")).as_deref() == Some(OVERLAY_STYLE_ID))
}
