/*!
 * Application of translations to a freshly loaded diagram project.
 *
 * Every rewritten slot becomes `original + separator + translation`. The
 * walk re-derives the same ids the extraction produced; ids missing from the
 * map are left untouched and reported.
 */

use std::collections::HashSet;

use log::debug;

use crate::language_utils::Script;
use crate::translation::document::{ApplyReport, TranslationMap, UnitKind};

use super::extract::traversal_order;
use super::handlers::HandlerRegistry;
use super::model::{ElementKind, ModelArena, Project};

const INLINE_SEPARATOR: &str = " / ";
const LINE_SEPARATOR: &str = "\n";

/// Separator placed between original and translation.
///
/// Nodes rendered on a single line (class, package and activity shapes,
/// diagram titles) get an inline separator; everything else a line break.
pub fn separator_for(kind: &UnitKind) -> &'static str {
    let inline = match kind {
        UnitKind::Element(kind) => matches!(
            kind,
            ElementKind::Class
                | ElementKind::Interface
                | ElementKind::Package
                | ElementKind::Activity
                | ElementKind::Action
                | ElementKind::ActivityNode
                | ElementKind::Partition
        ),
        UnitKind::DiagramName => true,
        UnitKind::Presentation(shape) => shape.contains("activity") || shape.contains("partition"),
        _ => false,
    };
    if inline { INLINE_SEPARATOR } else { LINE_SEPARATOR }
}

/// State of one application pass
#[derive(Debug)]
pub struct ApplyContext<'a> {
    translations: &'a TranslationMap,
    source: Script,
    target: Script,
    touched: HashSet<String>,
    report: ApplyReport,
}

impl<'a> ApplyContext<'a> {
    pub fn new(translations: &'a TranslationMap, source: Script, target: Script) -> Self {
        Self {
            translations,
            source,
            target,
            touched: HashSet::new(),
            report: ApplyReport::default(),
        }
    }

    /// Rewrite one text slot identified by `id`.
    ///
    /// Each id is handled once per pass, so an element reached both by the
    /// model tree and by a diagram handler is neither doubled nor counted twice.
    pub fn rewrite(&mut self, id: &str, slot: &mut Option<String>, kind: &UnitKind) {
        if slot.as_deref().is_some_and(|t| !t.is_empty()) && !self.touched.insert(id.to_string()) {
            return;
        }
        self.rewrite_slot(id, slot, kind);
    }

    /// Rewrite a shape label.
    ///
    /// Several shapes may show the same element, so shapes sharing an id are
    /// each rewritten.
    pub fn rewrite_shape(&mut self, id: &str, slot: &mut Option<String>, kind: &UnitKind) {
        self.rewrite_slot(id, slot, kind);
    }

    fn rewrite_slot(&mut self, id: &str, slot: &mut Option<String>, kind: &UnitKind) {
        let Some(current) = slot.as_deref().filter(|t| !t.is_empty()) else {
            return;
        };
        if self.target.contains(current) {
            self.report.record_already_translated();
            return;
        }

        match self.translations.get(id) {
            Some(translated) => {
                let combined = format!("{}{}{}", current, separator_for(kind), translated);
                *slot = Some(combined);
                self.report.record_applied();
            }
            None if self.source.contains(current) => self.report.record_miss(id),
            None => {}
        }
    }

    /// Mark a slot as deliberately left alone
    pub fn skip(&mut self, id: &str) {
        self.touched.insert(id.to_string());
    }

    pub fn report_mut(&mut self) -> &mut ApplyReport {
        &mut self.report
    }

    pub fn into_report(self) -> ApplyReport {
        self.report
    }
}

/// Rewrite comment bodies and element names of the model tree
pub fn apply_model(model: &mut ModelArena, ctx: &mut ApplyContext<'_>) {
    for index in traversal_order(model) {
        let element = model.element_mut(index);
        match element.element_kind() {
            ElementKind::Comment => {
                let id = format!("{}_body", element.id);
                ctx.rewrite(&id, &mut element.body, &UnitKind::CommentBody);
            }
            ElementKind::Unknown => {}
            kind => ctx.rewrite(&element.id, &mut element.name, &UnitKind::Element(kind)),
        }
    }
}

/// Apply translations to every part of a project
pub fn apply_project(
    project: &mut Project,
    registry: &HandlerRegistry,
    translations: &TranslationMap,
    source: Script,
    target: Script,
) -> ApplyReport {
    let mut ctx = ApplyContext::new(translations, source, target);

    apply_model(&mut project.model, &mut ctx);

    for diagram in project.diagrams.iter_mut() {
        let id = format!("diagram_{}", diagram.id);
        ctx.rewrite(&id, &mut diagram.name, &UnitKind::DiagramName);

        if let Some(handler) = registry.handler_for(diagram) {
            debug!("Applying {} handler to diagram {}", handler.name(), diagram.id);
            handler.apply(diagram, &mut project.model, &mut ctx);
        }
    }

    ctx.into_report()
}
