/*!
 * Extraction of translatable text from a diagram project.
 *
 * Runs in two parts: the model tree first, then every diagram through the
 * first handler of the registry that supports it.
 */

use std::collections::HashSet;

use log::debug;

use crate::language_utils::Script;
use crate::translation::document::{StructuralReport, TextUnit, UnitKind};
use crate::translation::pipeline::Extraction;

use super::handlers::{is_control_node, HandlerRegistry};
use super::model::{ElementKind, ModelArena, Project};

/// Accumulates units, keeping only source-script texts and the first unit
/// for every id
#[derive(Debug)]
pub struct UnitCollector {
    script: Script,
    units: Vec<TextUnit>,
    seen: HashSet<String>,
}

impl UnitCollector {
    pub fn new(script: Script) -> Self {
        Self { script, units: Vec::new(), seen: HashSet::new() }
    }

    /// Offer a text slot; returns whether a unit was emitted
    pub fn offer(&mut self, id: impl Into<String>, text: Option<&str>, kind: UnitKind) -> bool {
        self.offer_unit(id.into(), text, kind, None)
    }

    /// Offer a text slot that belongs to a diagram
    pub fn offer_grouped(
        &mut self,
        id: impl Into<String>,
        text: Option<&str>,
        kind: UnitKind,
        group: &str,
    ) -> bool {
        self.offer_unit(id.into(), text, kind, Some(group))
    }

    fn offer_unit(&mut self, id: String, text: Option<&str>, kind: UnitKind, group: Option<&str>) -> bool {
        let Some(text) = text.filter(|t| !t.is_empty() && self.script.contains(t)) else {
            return false;
        };
        if !self.seen.insert(id.clone()) {
            return false;
        }

        let unit = TextUnit::new(id, text, kind);
        self.units.push(match group {
            Some(group) => unit.with_group(group),
            None => unit,
        });
        true
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn into_units(self) -> Vec<TextUnit> {
        self.units
    }
}

/// Elements visited by the model traversal, depth-first in document order.
///
/// The traversal only descends into containers (packages, classes and
/// interfaces); elements owned by anything else belong to a diagram handler.
/// Control nodes are left out even when a container owns them.
pub fn traversal_order(model: &ModelArena) -> Vec<usize> {
    let mut order = Vec::new();
    let mut stack: Vec<usize> = model.roots().iter().rev().copied().collect();

    while let Some(index) = stack.pop() {
        if is_control_node(model.element(index)) {
            continue;
        }
        order.push(index);
        if model.element(index).element_kind().is_container() {
            stack.extend(model.children(index).iter().rev().copied());
        }
    }
    order
}

/// Emit comment bodies and element names of the model tree
pub fn extract_model(model: &ModelArena, collector: &mut UnitCollector, report: &mut StructuralReport) {
    for issue in model.issues() {
        report.warn(issue.location.clone(), issue.reason.clone());
    }

    for index in traversal_order(model) {
        let element = model.element(index);
        match element.element_kind() {
            ElementKind::Comment => {
                collector.offer(format!("{}_body", element.id), element.body.as_deref(), UnitKind::CommentBody);
            }
            ElementKind::Unknown => {}
            kind => {
                collector.offer(element.id.clone(), element.name.as_deref(), UnitKind::Element(kind));
            }
        }
    }
}

/// Extract every unit of a project
pub fn extract_project(project: &Project, registry: &HandlerRegistry, script: Script) -> Extraction {
    let mut collector = UnitCollector::new(script);
    let mut report = StructuralReport::default();

    extract_model(&project.model, &mut collector, &mut report);
    debug!("Model tree yielded {} units", collector.len());

    for diagram in &project.diagrams {
        collector.offer_grouped(
            format!("diagram_{}", diagram.id),
            diagram.name.as_deref(),
            UnitKind::DiagramName,
            &diagram.id,
        );

        if let Some(handler) = registry.handler_for(diagram) {
            let before = collector.len();
            handler.extract(diagram, &project.model, &mut collector, &mut report);
            debug!(
                "{} handler yielded {} units from diagram {}",
                handler.name(),
                collector.len() - before,
                diagram.id
            );
        }
    }

    Extraction { units: collector.into_units(), report }
}
