/*!
 * Overlay rewrite of translated SVG text.
 *
 * Targets are located before anything is mutated: wrapping nodes changes
 * the structural paths that fallback ids are hashed from.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::language_utils::Script;
use crate::translation::document::{ApplyReport, StructuralReport, TranslationMap};

use super::dom::{NodeId, SvgDocument};
use super::extract::{collect_targets, SvgTarget, TargetKind, TEXT_WRAPPER_CLASS, TRANSLATED_SPAN_CLASS};
use super::style::ensure_overlay_styles;

// Attributes copied from the original `<text>` onto the tooltip
const TOOLTIP_ATTRIBUTES: [&str; 7] = ["x", "y", "font-size", "font-family", "fill", "text-anchor", "transform"];

// Ancestors searched for an inherited font size
const FONT_SIZE_SEARCH_DEPTH: usize = 3;

static DOUBLE_SEMICOLON: Lazy<Regex> = Lazy::new(|| Regex::new(r";\s*;").expect("pattern is valid"));

/// Apply a translation map to a parsed document
pub fn apply_translations(
    doc: &mut SvgDocument,
    translations: &TranslationMap,
    source: Script,
    target: Script,
) -> ApplyReport {
    let mut report = ApplyReport::default();
    let mut matched: Vec<(SvgTarget, String)> = Vec::new();

    // Collisions were already reported by the extraction
    for found in collect_targets(doc, source, &mut StructuralReport::default()) {
        if target.contains(&found.text) {
            report.record_already_translated();
            continue;
        }
        match translations.get(&found.id) {
            Some(translated) => {
                let translated = translated.to_string();
                matched.push((found, translated));
            }
            None => report.record_miss(found.id),
        }
    }

    if matched.is_empty() {
        return report;
    }
    ensure_overlay_styles(doc);

    for (found, translated) in matched {
        match found.kind {
            TargetKind::Text => wrap_text(doc, found.node, &found.text, &translated),
            TargetKind::Foreign => overlay_span(doc, found.node, &translated),
        }
        report.record_applied();
    }
    report
}

/// Replace a `<text>` with a wrapper group holding the original and a
/// hidden tooltip carrying the translation
fn wrap_text(doc: &mut SvgDocument, node: NodeId, original: &str, translated: &str) {
    let Some(element) = doc.element(node) else {
        return;
    };
    let prefix = element.prefix().to_string();
    let copied: Vec<(&str, String)> = TOOLTIP_ATTRIBUTES
        .iter()
        .filter_map(|&key| element.attr(key).map(|value| (key, value)))
        .collect();

    let group = doc.create_element(
        &format!("{}g", prefix),
        &[
            ("class", TEXT_WRAPPER_CLASS),
            ("data-original", original),
            ("onclick", "copyOriginalText(event)"),
        ],
    );
    doc.replace_child(node, group);
    doc.append_child(group, node);
    if let Some(element) = doc.element_mut(node) {
        element.add_class("original-text");
    }

    let mut attrs: Vec<(&str, &str)> = vec![("class", "tooltip-text")];
    attrs.extend(copied.iter().map(|(key, value)| (*key, value.as_str())));
    let tooltip = doc.create_element(&format!("{}text", prefix), &attrs);
    let content = doc.create_text(translated);
    doc.append_child(tooltip, content);
    doc.append_child(group, tooltip);
}

/// Mark a foreignObject span as translated and wrap it with an overlay span
fn overlay_span(doc: &mut SvgDocument, span: NodeId, translated: &str) {
    let Some(element) = doc.element_mut(span) else {
        return;
    };
    element.add_class(TRANSLATED_SPAN_CLASS);
    let prefix = element.prefix().to_string();

    remove_pre_wrap(doc, span);
    let font_size = find_font_size(doc, span);

    let overlay_style = font_size
        .map(|size| format!("font-size: {};", reduce_font_size(&size)))
        .unwrap_or_default();
    let mut attrs = vec![("class", "jp-overlay")];
    if !overlay_style.is_empty() {
        attrs.push(("style", overlay_style.as_str()));
    }
    let overlay = doc.create_element(&format!("{}span", prefix), &attrs);
    let content = doc.create_text(translated);
    doc.append_child(overlay, content);

    let wrapper = doc.create_element(&format!("{}div", prefix), &[("class", "jp-wrapper")]);
    doc.replace_child(span, wrapper);
    doc.append_child(wrapper, span);
    doc.append_child(wrapper, overlay);
}

/// Drop `white-space: pre-wrap` from the span's grandparent so the overlay
/// can lay out on one line
fn remove_pre_wrap(doc: &mut SvgDocument, span: NodeId) {
    let Some(grandparent) = doc.parent(span).and_then(|parent| doc.parent(parent)) else {
        return;
    };
    let Some(element) = doc.element_mut(grandparent) else {
        return;
    };
    let Some(style) = element.attr("style").filter(|s| s.contains("white-space: pre-wrap")) else {
        return;
    };
    element.set_attr("style", &clean_style(&style.replace("white-space: pre-wrap", "")));
}

fn clean_style(style: &str) -> String {
    let collapsed = DOUBLE_SEMICOLON.replace_all(style, ";");
    collapsed
        .trim()
        .trim_matches(';')
        .trim()
        .to_string()
}

/// `font-size` declared on the span or one of its closest ancestors
fn find_font_size(doc: &SvgDocument, span: NodeId) -> Option<String> {
    let mut current = Some(span);
    for _ in 0..=FONT_SIZE_SEARCH_DEPTH {
        let node = current?;
        let declared = doc
            .element(node)
            .and_then(|e| e.attr("style"))
            .and_then(|style| font_size_from_style(&style));
        if declared.is_some() {
            return declared;
        }
        current = doc.parent(node);
    }
    None
}

pub fn font_size_from_style(style: &str) -> Option<String> {
    style.split(';').find_map(|declaration| {
        let (property, value) = declaration.split_once(':')?;
        let value = value.trim();
        (property.trim() == "font-size" && !value.is_empty()).then(|| value.to_string())
    })
}

/// Shrink a font size so the translation fits the original's box.
///
/// px: 15 and above lose 2, 10 and below stay, the rest lose 1.
/// pt: 15 and above lose 2, below 10 stay, the rest lose 1.
/// Never below 1; other units are returned unchanged.
pub fn reduce_font_size(size: &str) -> String {
    let size = size.trim();
    let (number, unit, small_limit_inclusive) = if let Some(number) = size.strip_suffix("px") {
        (number, "px", true)
    } else if let Some(number) = size.strip_suffix("pt") {
        (number, "pt", false)
    } else {
        return size.to_string();
    };

    let Ok(value) = number.trim().parse::<f64>() else {
        return size.to_string();
    };
    let small = if small_limit_inclusive { value <= 10.0 } else { value < 10.0 };
    let reduce_by = if value >= 15.0 {
        2.0
    } else if small {
        0.0
    } else {
        1.0
    };
    format!("{}{}", format_number((value - reduce_by).max(1.0)), unit)
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
