/*!
 * Location of translatable SVG text.
 *
 * Both passes go through `collect_targets`, so extraction and application
 * agree on ids by construction.
 */

use std::collections::HashSet;

use crate::language_utils::Script;
use crate::translation::document::{structural_hash, StructuralReport, TextUnit, UnitKind};
use crate::translation::pipeline::Extraction;

use super::dom::{NodeId, SvgDocument};

pub const TEXT_WRAPPER_CLASS: &str = "jp-text-wrapper";
pub const TRANSLATED_SPAN_CLASS: &str = "jp-translated";
const EDITABLE_SPAN_CLASS: &str = "text-edit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// A `<text>` element
    Text,
    /// The editable span inside a `<foreignObject>`
    Foreign,
}

impl TargetKind {
    pub fn unit_kind(self) -> UnitKind {
        match self {
            Self::Text => UnitKind::SvgText,
            Self::Foreign => UnitKind::SvgForeign,
        }
    }
}

/// A node holding source-language text
#[derive(Debug, Clone, PartialEq)]
pub struct SvgTarget {
    pub node: NodeId,
    pub id: String,
    pub text: String,
    pub kind: TargetKind,
}

/// Id of a `<text>` element: its `id`, or a hash of its position and
/// every other attribute
fn text_id(doc: &SvgDocument, node: NodeId) -> String {
    let Some(element) = doc.element(node) else {
        return String::new();
    };
    if let Some(id) = element.attr("id").filter(|id| !id.is_empty()) {
        return id;
    }

    let mut parts = vec![doc.path_signature(node)];
    parts.extend(
        element
            .attrs()
            .into_iter()
            .filter(|(key, _)| key != "id")
            .map(|(key, value)| format!("{}={}", key, value)),
    );
    format!("text_{}", structural_hash(parts))
}

/// Id of a foreignObject: the `id` of its parent `<g>`, or a structural hash
fn foreign_id(doc: &SvgDocument, foreign: NodeId) -> String {
    let group_id = doc
        .parent(foreign)
        .and_then(|parent| doc.element(parent))
        .filter(|parent| parent.local_name() == "g")
        .and_then(|parent| parent.attr("id"))
        .filter(|id| !id.is_empty());
    if let Some(id) = group_id {
        return id;
    }

    let mut parts = vec![doc.path_signature(foreign)];
    if let Some(element) = doc.element(foreign) {
        parts.extend(element.attrs().into_iter().map(|(key, value)| format!("{}={}", key, value)));
    }
    format!("foreign_{}", structural_hash(parts))
}

fn is_wrapped(doc: &SvgDocument, node: NodeId) -> bool {
    doc.parent(node)
        .and_then(|parent| doc.element(parent))
        .is_some_and(|parent| parent.local_name() == "g" && parent.has_class(TEXT_WRAPPER_CLASS))
}

fn editable_span(doc: &SvgDocument, foreign: NodeId) -> Option<NodeId> {
    doc.descendants(foreign).into_iter().find(|&id| {
        doc.element(id).is_some_and(|e| {
            e.local_name() == "span" && e.attr("class").is_some_and(|c| c.contains(EDITABLE_SPAN_CLASS))
        })
    })
}

/// Reserve `id` for `node`. A taken id is suffixed with a hash of the node's
/// position and the collision is reported.
fn claim_id(
    seen: &mut HashSet<String>,
    doc: &SvgDocument,
    node: NodeId,
    id: String,
    report: &mut StructuralReport,
) -> Option<String> {
    if seen.insert(id.clone()) {
        return Some(id);
    }
    let location = doc.path_signature(node);
    let unique = format!("{}_{}", id, structural_hash([location.as_str()]));
    if seen.insert(unique.clone()) {
        report.warn(location, format!("id {} is used twice, the later node is tracked as {}", id, unique));
        Some(unique)
    } else {
        report.warn(location, format!("id {} is used twice, node skipped", id));
        None
    }
}

/// Every node holding source-script text, in document order, one per id.
///
/// Nodes rewritten by an earlier run are skipped: `<text>` inside a wrapper
/// group and spans already marked as translated. Id collisions go to `report`.
pub fn collect_targets(doc: &SvgDocument, script: Script, report: &mut StructuralReport) -> Vec<SvgTarget> {
    let mut targets = Vec::new();
    let mut seen = HashSet::new();

    for node in doc.elements_by_name("text") {
        if is_wrapped(doc, node) {
            continue;
        }
        let text = doc.text_content(node).trim().to_string();
        if text.is_empty() || !script.contains(&text) {
            continue;
        }
        if let Some(id) = claim_id(&mut seen, doc, node, text_id(doc, node), report) {
            targets.push(SvgTarget { node, id, text, kind: TargetKind::Text });
        }
    }

    for foreign in doc.elements_by_name("foreignObject") {
        let Some(span) = editable_span(doc, foreign) else {
            continue;
        };
        if doc.element(span).is_some_and(|e| e.has_class(TRANSLATED_SPAN_CLASS)) {
            continue;
        }
        let text = doc.text_content(span).trim().to_string();
        if text.is_empty() || !script.contains(&text) {
            continue;
        }
        if let Some(id) = claim_id(&mut seen, doc, foreign, foreign_id(doc, foreign), report) {
            targets.push(SvgTarget { node: span, id, text, kind: TargetKind::Foreign });
        }
    }

    targets
}

/// Extract units from a parsed document
pub fn extract_document(doc: &SvgDocument, script: Script) -> Extraction {
    let mut report = StructuralReport::default();
    let units = collect_targets(doc, script, &mut report)
        .into_iter()
        .map(|target| TextUnit::new(target.id, target.text, target.kind.unit_kind()))
        .collect();
    Extraction { units, report }
}
