/*!
 * In-memory diagram project.
 *
 * Model elements live in an arena (`Vec<ModelElement>`) with an id index and
 * an owner → children table built fresh on every load. Diagrams reference
 * elements by id only, so a diagram and the arena can be borrowed mutably at
 * the same time.
 *
 * Every struct keeps the JSON members it does not know about in `extra`, so a
 * load/save cycle preserves them.
 */

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::StructuralAccessWarning;
pub use crate::translation::document::ElementKind;

/// Kind of a diagram, used for handler dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramKind {
    Class,
    Usecase,
    Activity,
    Sequence,
    Er,
    MindMap,
    StateMachine,
    Other,
}

impl DiagramKind {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "class" => Self::Class,
            "usecase" | "use_case" => Self::Usecase,
            "activity" => Self::Activity,
            "sequence" => Self::Sequence,
            "er" => Self::Er,
            "mindmap" | "mind_map" => Self::MindMap,
            "statemachine" | "state_machine" => Self::StateMachine,
            _ => Self::Other,
        }
    }
}

/// One element of the model tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelElement {
    pub id: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModelElement {
    pub fn new(id: impl Into<String>, kind: ElementKind, name: Option<&str>) -> Self {
        Self {
            id: id.into(),
            kind: kind.as_str().to_string(),
            name: name.map(str::to_string),
            owner: None,
            body: None,
            logical_name: None,
            physical_name: None,
            argument: None,
            return_value: None,
            guard: None,
            extra: Map::new(),
        }
    }

    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn element_kind(&self) -> ElementKind {
        ElementKind::from_name(&self.kind)
    }
}

/// Shape rectangle on a diagram
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    /// Stable textual form used in structural hashes
    pub fn fingerprint(&self) -> String {
        format!("{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

/// A shape drawn on a diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Mind-map topic with its sub-topics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Topic>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Model element the diagram depicts (interaction, activity)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub presentations: Vec<Presentation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_topic: Option<Topic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub floating_topics: Vec<Topic>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Diagram {
    pub fn diagram_kind(&self) -> DiagramKind {
        DiagramKind::from_name(&self.kind)
    }
}

/// A whole project file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "elements")]
    pub model: ModelArena,
    #[serde(default)]
    pub diagrams: Vec<Diagram>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Model elements plus the derived ownership tree
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<ModelElement>", into = "Vec<ModelElement>")]
pub struct ModelArena {
    elements: Vec<ModelElement>,
    index: HashMap<String, usize>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    issues: Vec<StructuralAccessWarning>,
}

impl From<Vec<ModelElement>> for ModelArena {
    fn from(elements: Vec<ModelElement>) -> Self {
        Self::build(elements)
    }
}

impl From<ModelArena> for Vec<ModelElement> {
    fn from(arena: ModelArena) -> Self {
        arena.elements
    }
}

impl ModelArena {
    /// Index the elements and derive the ownership tree.
    ///
    /// Elements with a duplicate id, a dangling owner or an owner chain that
    /// never reaches a root stay in the arena (and are saved back) but are not
    /// part of the tree; each produces an issue.
    pub fn build(elements: Vec<ModelElement>) -> Self {
        let mut index = HashMap::with_capacity(elements.len());
        let mut issues = Vec::new();
        let mut indexed = vec![false; elements.len()];

        for (i, element) in elements.iter().enumerate() {
            if index.contains_key(&element.id) {
                issues.push(StructuralAccessWarning::new(
                    format!("element {}", element.id),
                    "duplicate element id, later occurrence ignored",
                ));
                continue;
            }
            index.insert(element.id.clone(), i);
            indexed[i] = true;
        }

        let mut children = vec![Vec::new(); elements.len()];
        let mut roots = Vec::new();
        for (i, element) in elements.iter().enumerate() {
            if !indexed[i] {
                continue;
            }
            match &element.owner {
                None => roots.push(i),
                Some(owner) => match index.get(owner) {
                    Some(&owner_index) => children[owner_index].push(i),
                    None => issues.push(StructuralAccessWarning::new(
                        format!("element {}", element.id),
                        format!("owner {} does not exist", owner),
                    )),
                },
            }
        }

        // Anything indexed but unreachable from a root hangs off a cycle or a
        // dangling owner
        let mut reachable = vec![false; elements.len()];
        let mut stack: Vec<usize> = roots.clone();
        while let Some(i) = stack.pop() {
            if reachable[i] {
                continue;
            }
            reachable[i] = true;
            stack.extend(children[i].iter().copied());
        }
        for (i, element) in elements.iter().enumerate() {
            let dangling = element
                .owner
                .as_ref()
                .map(|owner| !index.contains_key(owner))
                .unwrap_or(false);
            if indexed[i] && !reachable[i] && !dangling {
                issues.push(StructuralAccessWarning::new(
                    format!("element {}", element.id),
                    "owner chain never reaches a root element",
                ));
            }
        }

        Self { elements, index, children, roots, issues }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&ModelElement> {
        self.index_of(id).map(|i| &self.elements[i])
    }

    pub fn element(&self, index: usize) -> &ModelElement {
        &self.elements[index]
    }

    pub fn element_mut(&mut self, index: usize) -> &mut ModelElement {
        &mut self.elements[index]
    }

    /// Owned elements in document order
    pub fn children(&self, index: usize) -> &[usize] {
        &self.children[index]
    }

    /// Owned elements of the given kind
    pub fn children_of_kind(&self, index: usize, kind: ElementKind) -> Vec<usize> {
        self.children[index]
            .iter()
            .copied()
            .filter(|&child| self.elements[child].element_kind() == kind)
            .collect()
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Problems found while building the tree
    pub fn issues(&self) -> &[StructuralAccessWarning] {
        &self.issues
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelElement> {
        self.elements.iter()
    }
}
