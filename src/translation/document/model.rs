/*!
 * Core text-unit types shared by every document format.
 *
 * A `TextUnit` is one piece of translatable text plus the stable identifier
 * that locates it again after the document has been reloaded.
 */

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

/// Kind of a model element, as far as translation cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Package,
    Class,
    Interface,
    Attribute,
    Operation,
    Comment,
    Usecase,
    Actor,
    State,
    Activity,
    Action,
    ActivityNode,
    Flow,
    Partition,
    Interaction,
    Lifeline,
    Message,
    ErEntity,
    ErAttribute,
    Topic,
    #[serde(other)]
    Unknown,
}

impl ElementKind {
    /// Parse the `kind` member of an element, falling back to `Unknown`
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "package" | "model" => Self::Package,
            "class" => Self::Class,
            "interface" => Self::Interface,
            "attribute" => Self::Attribute,
            "operation" | "method" => Self::Operation,
            "comment" | "note" => Self::Comment,
            "usecase" | "use_case" => Self::Usecase,
            "actor" => Self::Actor,
            "state" => Self::State,
            "activity" => Self::Activity,
            "action" => Self::Action,
            "activity_node" => Self::ActivityNode,
            "flow" => Self::Flow,
            "partition" => Self::Partition,
            "interaction" => Self::Interaction,
            "lifeline" => Self::Lifeline,
            "message" => Self::Message,
            "er_entity" => Self::ErEntity,
            "er_attribute" => Self::ErAttribute,
            "topic" => Self::Topic,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Package => "package",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Attribute => "attribute",
            Self::Operation => "operation",
            Self::Comment => "comment",
            Self::Usecase => "usecase",
            Self::Actor => "actor",
            Self::State => "state",
            Self::Activity => "activity",
            Self::Action => "action",
            Self::ActivityNode => "activity_node",
            Self::Flow => "flow",
            Self::Partition => "partition",
            Self::Interaction => "interaction",
            Self::Lifeline => "lifeline",
            Self::Message => "message",
            Self::ErEntity => "er_entity",
            Self::ErAttribute => "er_attribute",
            Self::Topic => "topic",
            Self::Unknown => "unknown",
        }
    }

    /// Kinds whose owned elements the model traversal descends into
    pub fn is_container(self) -> bool {
        matches!(self, Self::Package | Self::Class | Self::Interface)
    }

    /// Activity nodes, including actions
    pub fn is_activity_node(self) -> bool {
        matches!(self, Self::Action | Self::ActivityNode)
    }
}

/// Which part of a sequence message a unit was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessagePart {
    Name,
    Argument,
    Return,
    Guard,
}

impl MessagePart {
    pub const ALL: [MessagePart; 4] = [Self::Name, Self::Argument, Self::Return, Self::Guard];

    /// Suffix appended to the message id
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Argument => "argument",
            Self::Return => "return",
            Self::Guard => "guard",
        }
    }
}

/// Structural category of a text unit.
///
/// Drives applier routing and the separator capability table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "category", content = "detail")]
pub enum UnitKind {
    /// Name of a model element
    Element(ElementKind),
    /// Body of a comment/note element
    CommentBody,
    /// Title of a diagram
    DiagramName,
    /// Label of a diagram shape, carrying the shape kind in lowercase
    Presentation(String),
    /// One of the texts of a sequence message
    SequenceMessage(MessagePart),
    /// Logical name of an ER entity or attribute
    ErLogical,
    /// Physical name of an ER entity or attribute
    ErPhysical,
    /// Mind-map topic label
    MindMapTopic,
    /// SVG `<text>` element
    SvgText,
    /// Text span inside an SVG `<foreignObject>`
    SvgForeign,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(kind) => write!(f, "{}", kind.as_str()),
            Self::CommentBody => write!(f, "comment_body"),
            Self::DiagramName => write!(f, "diagram_name"),
            Self::Presentation(kind) => write!(f, "presentation_{}", kind),
            Self::SequenceMessage(part) => write!(f, "sequence_message_{}", part.suffix()),
            Self::ErLogical => write!(f, "er_logical"),
            Self::ErPhysical => write!(f, "er_physical"),
            Self::MindMapTopic => write!(f, "mindmap_topic"),
            Self::SvgText => write!(f, "svg_text"),
            Self::SvgForeign => write!(f, "svg_foreign"),
        }
    }
}

/// One extracted piece of translatable text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextUnit {
    /// Stable identifier, reproducible on a fresh load of the same document
    pub id: String,

    /// Text as found in the document
    pub original_text: String,

    /// Translation, once known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,

    /// Enclosing container for units scoped to one (diagram titles)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_group_id: Option<String>,

    /// Structural category
    pub kind: UnitKind,

    /// Representative id when this unit repeats an earlier unit's text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<String>,
}

impl TextUnit {
    /// Create an untranslated unit
    pub fn new(id: impl Into<String>, original_text: impl Into<String>, kind: UnitKind) -> Self {
        Self {
            id: id.into(),
            original_text: original_text.into(),
            translated_text: None,
            source_group_id: None,
            kind,
            duplicate_of: None,
        }
    }

    /// Scope the unit to a container
    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.source_group_id = Some(group_id.into());
        self
    }

    /// Whether this unit reuses another unit's translation
    pub fn is_duplicate(&self) -> bool {
        self.duplicate_of.is_some()
    }
}

/// Lookup from stable id to translated text, as consumed by the appliers
#[derive(Debug, Clone, Default)]
pub struct TranslationMap {
    entries: HashMap<String, String>,
}

impl TranslationMap {
    /// Collect every unit that carries a translation
    pub fn from_units(units: &[TextUnit]) -> Self {
        let entries = units
            .iter()
            .filter_map(|unit| {
                unit.translated_text
                    .as_ref()
                    .map(|text| (unit.id.clone(), text.clone()))
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl FromIterator<(String, String)> for TranslationMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

/// Short SHA-256 digest over structural parts, used for fallback ids.
///
/// Parts are joined with a unit separator so `["ab", "c"]` and `["a", "bc"]`
/// hash differently.
pub fn structural_hash<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_ref().as_bytes());
        hasher.update([0x1f]);
    }
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}
