/*!
 * Per-diagram-kind extraction and application.
 *
 * Handlers sit in a priority-ordered registry; a diagram goes to the first
 * handler whose `supports` accepts it. The generic handler accepts everything
 * and comes last.
 *
 * Handlers are pure: `extract` only reads the diagram and the model arena,
 * `apply` mirrors it and rewrites the same slots.
 */

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::translation::document::{structural_hash, MessagePart, StructuralReport, UnitKind};

use super::apply::ApplyContext;
use super::extract::UnitCollector;
use super::model::{Diagram, DiagramKind, ElementKind, ModelArena, ModelElement, Presentation, Topic};

// Control nodes keep their generated labels
static CONTROL_NODE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:開始ノード|終了ノード|フロー終了ノード)\d*$|^(?:デシジョンノード|マージノード|フォークノード|ジョインノード)",
    )
    .expect("control node pattern is valid")
});

/// Whether an activity node label is a generated control-node label
pub fn is_control_node_label(label: &str) -> bool {
    CONTROL_NODE_LABEL.is_match(label)
}

/// Activity node carrying a generated control-node label, wherever it is owned
pub fn is_control_node(element: &ModelElement) -> bool {
    element.element_kind().is_activity_node()
        && element.name.as_deref().map(is_control_node_label).unwrap_or(false)
}

pub trait DiagramHandler: Send + Sync {
    fn name(&self) -> &'static str;

    /// Lower values are tried first
    fn priority(&self) -> u32;

    fn supports(&self, diagram: &Diagram) -> bool;

    fn extract(
        &self,
        diagram: &Diagram,
        model: &ModelArena,
        collector: &mut UnitCollector,
        report: &mut StructuralReport,
    );

    fn apply(&self, diagram: &mut Diagram, model: &mut ModelArena, ctx: &mut ApplyContext<'_>);
}

/// Priority-ordered handler list
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn DiagramHandler>>,
}

impl HandlerRegistry {
    pub fn empty() -> Self {
        Self { handlers: Vec::new() }
    }

    /// Add a handler, keeping the list sorted by priority
    pub fn register(&mut self, handler: Box<dyn DiagramHandler>) {
        self.handlers.push(handler);
        self.handlers.sort_by_key(|h| h.priority());
    }

    pub fn handler_for(&self, diagram: &Diagram) -> Option<&dyn DiagramHandler> {
        self.handlers
            .iter()
            .find(|h| h.supports(diagram))
            .map(|h| h.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(ErHandler));
        registry.register(Box::new(SequenceHandler));
        registry.register(Box::new(MindMapHandler));
        registry.register(Box::new(ActivityHandler));
        registry.register(Box::new(GenericHandler));
        registry
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}

// Shapes

/// Ids of every presentation of a diagram, in order.
///
/// Shapes attached to a model element use the element id. Free shapes hash
/// the diagram id, the shape kind, the bounds and the ordinal among shapes of
/// the same kind; the label is left out so it can change between passes.
pub fn presentation_ids(diagram: &Diagram) -> Vec<String> {
    let mut ordinals: HashMap<String, usize> = HashMap::new();

    diagram
        .presentations
        .iter()
        .map(|presentation| {
            let shape = presentation.kind.to_lowercase();
            let counter = ordinals.entry(shape.clone()).or_insert(0);
            let ordinal = *counter;
            *counter += 1;

            match &presentation.model_id {
                Some(model_id) => format!("presentation_{}", model_id),
                None => {
                    let bounds = presentation
                        .bounds
                        .map(|b| b.fingerprint())
                        .unwrap_or_default();
                    let hash = structural_hash([
                        diagram.id.as_str(),
                        shape.as_str(),
                        bounds.as_str(),
                        ordinal.to_string().as_str(),
                    ]);
                    format!("presentation_{}_{}", shape, hash)
                }
            }
        })
        .collect()
}

fn shape_kind(presentation: &Presentation) -> UnitKind {
    UnitKind::Presentation(presentation.kind.to_lowercase())
}

fn extract_shapes<F>(diagram: &Diagram, collector: &mut UnitCollector, include: F)
where
    F: Fn(&Presentation) -> bool,
{
    let ids = presentation_ids(diagram);
    for (presentation, id) in diagram.presentations.iter().zip(ids) {
        if include(presentation) {
            collector.offer(id, presentation.label.as_deref(), shape_kind(presentation));
        }
    }
}

fn apply_shapes<F>(diagram: &mut Diagram, ctx: &mut ApplyContext<'_>, include: F)
where
    F: Fn(&Presentation) -> bool,
{
    let ids = presentation_ids(diagram);
    for (presentation, id) in diagram.presentations.iter_mut().zip(ids) {
        if include(&*presentation) {
            let kind = shape_kind(presentation);
            ctx.rewrite_shape(&id, &mut presentation.label, &kind);
        }
    }
}

fn is_free_shape(presentation: &Presentation) -> bool {
    presentation.model_id.is_none()
}

/// Resolve the diagram subject, reporting a dangling reference
fn resolve_subject(diagram: &Diagram, model: &ModelArena, report: &mut StructuralReport) -> Option<usize> {
    let subject = diagram.subject.as_deref()?;
    let index = model.index_of(subject);
    if index.is_none() {
        report.warn(
            format!("diagram {}", diagram.id),
            format!("subject {} does not exist", subject),
        );
    }
    index
}

fn offer_name(collector: &mut UnitCollector, element: &ModelElement) {
    collector.offer(
        element.id.clone(),
        element.name.as_deref(),
        UnitKind::Element(element.element_kind()),
    );
}

fn apply_name(ctx: &mut ApplyContext<'_>, element: &mut ModelElement) {
    let kind = UnitKind::Element(element.element_kind());
    ctx.rewrite(&element.id, &mut element.name, &kind);
}

// ER

/// ER diagrams: logical and physical names of entities and their attributes
#[derive(Debug, Default)]
pub struct ErHandler;

impl ErHandler {
    fn entities(diagram: &Diagram, model: &ModelArena, report: &mut StructuralReport) -> Vec<usize> {
        let mut entities = Vec::new();
        for model_id in diagram.presentations.iter().filter_map(|p| p.model_id.as_deref()) {
            match model.index_of(model_id) {
                Some(index) if model.element(index).element_kind() == ElementKind::ErEntity => {
                    if !entities.contains(&index) {
                        entities.push(index);
                    }
                }
                Some(_) => {}
                None => report.warn(
                    format!("diagram {}", diagram.id),
                    format!("shape references missing element {}", model_id),
                ),
            }
        }
        entities
    }

    fn with_attributes(model: &ModelArena, entities: Vec<usize>) -> Vec<usize> {
        entities
            .into_iter()
            .flat_map(|entity| {
                std::iter::once(entity).chain(model.children_of_kind(entity, ElementKind::ErAttribute))
            })
            .collect()
    }
}

impl DiagramHandler for ErHandler {
    fn name(&self) -> &'static str {
        "er"
    }

    fn priority(&self) -> u32 {
        1
    }

    fn supports(&self, diagram: &Diagram) -> bool {
        diagram.diagram_kind() == DiagramKind::Er
    }

    fn extract(
        &self,
        diagram: &Diagram,
        model: &ModelArena,
        collector: &mut UnitCollector,
        report: &mut StructuralReport,
    ) {
        let entities = Self::entities(diagram, model, report);
        for index in Self::with_attributes(model, entities) {
            let element = model.element(index);
            collector.offer(
                format!("{}_logical", element.id),
                element.logical_name.as_deref(),
                UnitKind::ErLogical,
            );
            collector.offer(
                format!("{}_physical", element.id),
                element.physical_name.as_deref(),
                UnitKind::ErPhysical,
            );
        }
        extract_shapes(diagram, collector, is_free_shape);
    }

    fn apply(&self, diagram: &mut Diagram, model: &mut ModelArena, ctx: &mut ApplyContext<'_>) {
        let entities = Self::entities(diagram, model, &mut ctx.report_mut().structural);
        for index in Self::with_attributes(model, entities) {
            let element = model.element_mut(index);
            let logical = format!("{}_logical", element.id);
            ctx.rewrite(&logical, &mut element.logical_name, &UnitKind::ErLogical);
            let physical = format!("{}_physical", element.id);
            ctx.rewrite(&physical, &mut element.physical_name, &UnitKind::ErPhysical);
        }
        apply_shapes(diagram, ctx, is_free_shape);
    }
}

// Sequence

fn message_slot(element: &ModelElement, part: MessagePart) -> Option<&str> {
    match part {
        MessagePart::Name => element.name.as_deref(),
        MessagePart::Argument => element.argument.as_deref(),
        MessagePart::Return => element.return_value.as_deref(),
        MessagePart::Guard => element.guard.as_deref(),
    }
}

fn message_slot_mut(element: &mut ModelElement, part: MessagePart) -> &mut Option<String> {
    match part {
        MessagePart::Name => &mut element.name,
        MessagePart::Argument => &mut element.argument,
        MessagePart::Return => &mut element.return_value,
        MessagePart::Guard => &mut element.guard,
    }
}

/// Sequence diagrams: interaction, lifelines and the four texts of each message
#[derive(Debug, Default)]
pub struct SequenceHandler;

impl DiagramHandler for SequenceHandler {
    fn name(&self) -> &'static str {
        "sequence"
    }

    fn priority(&self) -> u32 {
        2
    }

    fn supports(&self, diagram: &Diagram) -> bool {
        diagram.diagram_kind() == DiagramKind::Sequence
    }

    fn extract(
        &self,
        diagram: &Diagram,
        model: &ModelArena,
        collector: &mut UnitCollector,
        report: &mut StructuralReport,
    ) {
        if let Some(interaction) = resolve_subject(diagram, model, report) {
            offer_name(collector, model.element(interaction));

            for lifeline in model.children_of_kind(interaction, ElementKind::Lifeline) {
                offer_name(collector, model.element(lifeline));
            }

            for message in model.children_of_kind(interaction, ElementKind::Message) {
                let element = model.element(message);
                for part in MessagePart::ALL {
                    collector.offer(
                        format!("{}_{}", element.id, part.suffix()),
                        message_slot(element, part),
                        UnitKind::SequenceMessage(part),
                    );
                }
            }
        }
        extract_shapes(diagram, collector, is_free_shape);
    }

    fn apply(&self, diagram: &mut Diagram, model: &mut ModelArena, ctx: &mut ApplyContext<'_>) {
        if let Some(interaction) = resolve_subject(diagram, model, &mut ctx.report_mut().structural) {
            apply_name(ctx, model.element_mut(interaction));

            for lifeline in model.children_of_kind(interaction, ElementKind::Lifeline) {
                apply_name(ctx, model.element_mut(lifeline));
            }

            for message in model.children_of_kind(interaction, ElementKind::Message) {
                let element = model.element_mut(message);
                for part in MessagePart::ALL {
                    let id = format!("{}_{}", element.id, part.suffix());
                    ctx.rewrite(&id, message_slot_mut(element, part), &UnitKind::SequenceMessage(part));
                }
            }
        }
        apply_shapes(diagram, ctx, is_free_shape);
    }
}

// Mind map

/// Root topics of a mind map with their structural path prefix
fn topic_roots(diagram: &Diagram) -> Vec<(String, &Topic)> {
    let root = diagram.root_topic.iter().map(|t| ("root".to_string(), t));
    let floating = diagram
        .floating_topics
        .iter()
        .enumerate()
        .map(|(i, t)| (format!("floating{}", i), t));
    root.chain(floating).collect()
}

fn topic_id(diagram_id: &str, path: &str, topic: &Topic) -> String {
    match &topic.model_id {
        Some(model_id) => format!("topic_{}", model_id),
        None => {
            let bounds = topic.bounds.map(|b| b.fingerprint()).unwrap_or_default();
            format!("topic_{}", structural_hash([diagram_id, path, bounds.as_str()]))
        }
    }
}

fn extract_topic(diagram_id: &str, path: &str, topic: &Topic, collector: &mut UnitCollector) {
    collector.offer(topic_id(diagram_id, path, topic), topic.label.as_deref(), UnitKind::MindMapTopic);
    for (i, child) in topic.children.iter().enumerate() {
        extract_topic(diagram_id, &format!("{}/{}", path, i), child, collector);
    }
}

fn apply_topic(diagram_id: &str, path: &str, topic: &mut Topic, ctx: &mut ApplyContext<'_>) {
    let id = topic_id(diagram_id, path, topic);
    ctx.rewrite_shape(&id, &mut topic.label, &UnitKind::MindMapTopic);
    for (i, child) in topic.children.iter_mut().enumerate() {
        apply_topic(diagram_id, &format!("{}/{}", path, i), child, ctx);
    }
}

/// Mind maps: the root topic and floating topics, recursively
#[derive(Debug, Default)]
pub struct MindMapHandler;

impl DiagramHandler for MindMapHandler {
    fn name(&self) -> &'static str {
        "mindmap"
    }

    fn priority(&self) -> u32 {
        3
    }

    fn supports(&self, diagram: &Diagram) -> bool {
        diagram.diagram_kind() == DiagramKind::MindMap
    }

    fn extract(
        &self,
        diagram: &Diagram,
        _model: &ModelArena,
        collector: &mut UnitCollector,
        _report: &mut StructuralReport,
    ) {
        for (path, topic) in topic_roots(diagram) {
            extract_topic(&diagram.id, &path, topic, collector);
        }
    }

    fn apply(&self, diagram: &mut Diagram, _model: &mut ModelArena, ctx: &mut ApplyContext<'_>) {
        let diagram_id = diagram.id.clone();
        if let Some(root) = diagram.root_topic.as_mut() {
            apply_topic(&diagram_id, "root", root, ctx);
        }
        for (i, topic) in diagram.floating_topics.iter_mut().enumerate() {
            apply_topic(&diagram_id, &format!("floating{}", i), topic, ctx);
        }
    }
}

// Activity

/// Activity diagrams: the activity, its nodes and flows, and every shape.
///
/// Generated control-node labels are never translated.
#[derive(Debug, Default)]
pub struct ActivityHandler;

impl ActivityHandler {
    fn members(model: &ModelArena, activity: usize) -> Vec<usize> {
        model
            .children(activity)
            .iter()
            .copied()
            .filter(|&child| {
                matches!(
                    model.element(child).element_kind(),
                    ElementKind::Action | ElementKind::ActivityNode | ElementKind::Flow | ElementKind::Partition
                )
            })
            .collect()
    }

    /// Shapes attached to a control node keep their label too
    fn shows_control_node(model: &ModelArena, presentation: &Presentation) -> bool {
        presentation
            .model_id
            .as_deref()
            .and_then(|id| model.get(id))
            .map(|element| element.element_kind().is_activity_node())
            .unwrap_or(false)
            && presentation.label.as_deref().map(is_control_node_label).unwrap_or(false)
    }
}

impl DiagramHandler for ActivityHandler {
    fn name(&self) -> &'static str {
        "activity"
    }

    fn priority(&self) -> u32 {
        4
    }

    fn supports(&self, diagram: &Diagram) -> bool {
        diagram.diagram_kind() == DiagramKind::Activity
    }

    fn extract(
        &self,
        diagram: &Diagram,
        model: &ModelArena,
        collector: &mut UnitCollector,
        report: &mut StructuralReport,
    ) {
        if let Some(activity) = resolve_subject(diagram, model, report) {
            offer_name(collector, model.element(activity));
            for member in Self::members(model, activity) {
                let element = model.element(member);
                if !is_control_node(element) {
                    offer_name(collector, element);
                }
            }
        }
        extract_shapes(diagram, collector, |p| !Self::shows_control_node(model, p));
    }

    fn apply(&self, diagram: &mut Diagram, model: &mut ModelArena, ctx: &mut ApplyContext<'_>) {
        if let Some(activity) = resolve_subject(diagram, model, &mut ctx.report_mut().structural) {
            apply_name(ctx, model.element_mut(activity));
            for member in Self::members(model, activity) {
                let element = model.element_mut(member);
                if is_control_node(element) {
                    ctx.skip(&element.id);
                } else {
                    apply_name(ctx, element);
                }
            }
        }
        let model: &ModelArena = model;
        apply_shapes(diagram, ctx, |p| !Self::shows_control_node(model, p));
    }
}

// Generic

/// Every other diagram: all shape labels
#[derive(Debug, Default)]
pub struct GenericHandler;

impl DiagramHandler for GenericHandler {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn priority(&self) -> u32 {
        100
    }

    fn supports(&self, _diagram: &Diagram) -> bool {
        true
    }

    fn extract(
        &self,
        diagram: &Diagram,
        _model: &ModelArena,
        collector: &mut UnitCollector,
        _report: &mut StructuralReport,
    ) {
        extract_shapes(diagram, collector, |_| true);
    }

    fn apply(&self, diagram: &mut Diagram, _model: &mut ModelArena, ctx: &mut ApplyContext<'_>) {
        apply_shapes(diagram, ctx, |_| true);
    }
}
