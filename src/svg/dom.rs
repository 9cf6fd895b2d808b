/*!
 * Lossless SVG document tree.
 *
 * The document is parsed with quick-xml into an arena of nodes. Text and
 * attribute values are kept in their escaped source form and start tags keep
 * their raw bytes until an attribute changes, so writing an untouched
 * document reproduces its input.
 */

use std::collections::HashSet;

use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub type NodeId = usize;

#[derive(Error, Debug)]
pub enum SvgError {
    #[error("XML syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    #[error("Unexpected closing tag </{0}>")]
    UnexpectedEnd(String),

    #[error("Element <{0}> is never closed")]
    Unclosed(String),

    #[error("Document has no root element")]
    NoRoot,
}

/// Start tag of an element
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    // Values in escaped form
    attrs: Vec<(String, String)>,
    // Source bytes between `<` and `>`/`/>`, dropped once an attribute changes
    raw: Option<String>,
    self_closing: bool,
}

impl Element {
    fn new(name: &str) -> Self {
        Self { name: name.to_string(), attrs: Vec::new(), raw: None, self_closing: false }
    }

    /// Name without namespace prefix
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    /// Namespace prefix including the colon, or an empty string
    pub fn prefix(&self) -> &str {
        &self.name[..self.name.len() - self.local_name().len()]
    }

    pub fn attr(&self, key: &str) -> Option<String> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| unescape_lossy(v))
    }

    /// Attribute pairs in source order, unescaped
    pub fn attrs(&self) -> Vec<(String, String)> {
        self.attrs
            .iter()
            .map(|(k, v)| (k.clone(), unescape_lossy(v)))
            .collect()
    }

    pub fn set_attr(&mut self, key: &str, value: &str) {
        let escaped = escape(value).into_owned();
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = escaped,
            None => self.attrs.push((key.to_string(), escaped)),
        }
        self.raw = None;
    }

    pub fn classes(&self) -> Vec<String> {
        self.attr("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        let mut classes = self.classes();
        if classes.iter().any(|c| c == class) {
            return;
        }
        classes.push(class.to_string());
        self.set_attr("class", &classes.join(" "));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    /// Declaration content between `<?` and `?>`, as read
    Decl(String),
    Element(Element),
    /// Escaped character data
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    DocType(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Parsed SVG document
#[derive(Debug, Clone)]
pub struct SvgDocument {
    nodes: Vec<Node>,
    bom: bool,
}

const DOCUMENT: NodeId = 0;

impl SvgDocument {
    pub fn parse(bytes: &[u8]) -> Result<Self, SvgError> {
        let (bom, body) = match bytes.strip_prefix(UTF8_BOM) {
            Some(rest) => (true, rest),
            None => (false, bytes),
        };

        let mut doc = Self {
            nodes: vec![Node { kind: NodeKind::Document, parent: None, children: Vec::new() }],
            bom,
        };

        let mut reader = Reader::from_reader(body);
        reader.config_mut().trim_text(false);

        let mut open: Vec<NodeId> = vec![DOCUMENT];
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let event = reader.read_event_into(&mut buf).map_err(|e| SvgError::Syntax {
                position: reader.buffer_position() as u64,
                message: e.to_string(),
            })?;
            let parent = open.last().copied().unwrap_or(DOCUMENT);

            match event {
                Event::Eof => break,
                Event::Decl(d) => {
                    doc.push(parent, NodeKind::Decl(bytes_to_string(&d)));
                }
                Event::Start(s) => {
                    let id = doc.push(parent, NodeKind::Element(element_from(&s, false)));
                    open.push(id);
                }
                Event::Empty(s) => {
                    doc.push(parent, NodeKind::Element(element_from(&s, true)));
                }
                Event::End(e) => {
                    if open.len() <= 1 {
                        return Err(SvgError::UnexpectedEnd(bytes_to_string(e.name().as_ref())));
                    }
                    open.pop();
                }
                Event::Text(t) => {
                    doc.push(parent, NodeKind::Text(bytes_to_string(&t.into_inner())));
                }
                Event::CData(t) => {
                    doc.push(parent, NodeKind::CData(bytes_to_string(&t.into_inner())));
                }
                Event::Comment(t) => {
                    doc.push(parent, NodeKind::Comment(bytes_to_string(&t.into_inner())));
                }
                Event::PI(t) => {
                    let content = format!("{}{}", bytes_to_string(t.target()), bytes_to_string(t.content()));
                    doc.push(parent, NodeKind::ProcessingInstruction(content));
                }
                Event::DocType(t) => {
                    doc.push(parent, NodeKind::DocType(bytes_to_string(&t.into_inner())));
                }
            }
        }

        if let Some(&unclosed) = open.get(1) {
            let name = doc.element(unclosed).map(|e| e.name.clone()).unwrap_or_default();
            return Err(SvgError::Unclosed(name));
        }
        if doc.root_element().is_none() {
            return Err(SvgError::NoRoot);
        }
        Ok(doc)
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node { kind, parent: Some(parent), children: Vec::new() });
        self.nodes[parent].children.push(id);
        id
    }

    /// Serialize the document
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        if self.bom {
            out.extend_from_slice(UTF8_BOM);
        }
        for &child in &self.nodes[DOCUMENT].children {
            self.write_node(child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut Vec<u8>) {
        let node = &self.nodes[id];
        match &node.kind {
            NodeKind::Document => {}
            NodeKind::Decl(content) => {
                out.extend_from_slice(b"<?");
                out.extend_from_slice(content.as_bytes());
                out.extend_from_slice(b"?>");
            }
            NodeKind::Element(element) => {
                out.push(b'<');
                match &element.raw {
                    Some(raw) => out.extend_from_slice(raw.as_bytes()),
                    None => {
                        out.extend_from_slice(element.name.as_bytes());
                        for (key, value) in &element.attrs {
                            out.push(b' ');
                            out.extend_from_slice(key.as_bytes());
                            out.extend_from_slice(b"=\"");
                            out.extend_from_slice(value.as_bytes());
                            out.push(b'"');
                        }
                    }
                }
                if element.self_closing && node.children.is_empty() {
                    out.extend_from_slice(b"/>");
                    return;
                }
                out.push(b'>');
                for &child in &node.children {
                    self.write_node(child, out);
                }
                out.extend_from_slice(b"</");
                out.extend_from_slice(element.name.as_bytes());
                out.push(b'>');
            }
            NodeKind::Text(text) => out.extend_from_slice(text.as_bytes()),
            NodeKind::CData(text) => {
                out.extend_from_slice(b"<![CDATA[");
                out.extend_from_slice(text.as_bytes());
                out.extend_from_slice(b"]]>");
            }
            NodeKind::Comment(text) => {
                out.extend_from_slice(b"<!--");
                out.extend_from_slice(text.as_bytes());
                out.extend_from_slice(b"-->");
            }
            NodeKind::ProcessingInstruction(content) => {
                out.extend_from_slice(b"<?");
                out.extend_from_slice(content.as_bytes());
                out.extend_from_slice(b"?>");
            }
            NodeKind::DocType(text) => {
                out.extend_from_slice(b"<!DOCTYPE");
                // quick-xml may strip the whitespace after the keyword
                if !text.starts_with(char::is_whitespace) {
                    out.push(b' ');
                }
                out.extend_from_slice(text.as_bytes());
                out.push(b'>');
            }
        }
    }

    // Navigation

    pub fn root_element(&self) -> Option<NodeId> {
        self.nodes[DOCUMENT]
            .children
            .iter()
            .copied()
            .find(|&c| matches!(self.nodes[c].kind, NodeKind::Element(_)))
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id].kind
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(id)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent.filter(|&p| p != DOCUMENT)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// Element ids below `id` in document order, `id` excluded
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id].children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if self.element(current).is_some() {
                found.push(current);
                stack.extend(self.nodes[current].children.iter().rev().copied());
            }
        }
        found
    }

    /// Elements with the given local name, in document order
    pub fn elements_by_name(&self, local_name: &str) -> Vec<NodeId> {
        self.descendants(DOCUMENT)
            .into_iter()
            .filter(|&id| self.element(id).is_some_and(|e| e.local_name() == local_name))
            .collect()
    }

    /// Unescaped character data of every descendant
    pub fn text_content(&self, id: NodeId) -> String {
        let mut text = String::new();
        self.collect_text(id, &mut text);
        text
    }

    fn collect_text(&self, id: NodeId, text: &mut String) {
        for &child in &self.nodes[id].children {
            match &self.nodes[child].kind {
                NodeKind::Text(raw) => text.push_str(&unescape_lossy(raw)),
                NodeKind::CData(raw) => text.push_str(raw),
                NodeKind::Element(_) => self.collect_text(child, text),
                _ => {}
            }
        }
    }

    /// Structural position of an element: local names with sibling indexes
    /// from the root down
    pub fn path_signature(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = id;
        let mut visited = HashSet::new();

        while let Some(parent) = self.nodes[current].parent {
            if !visited.insert(current) {
                break;
            }
            let position = self.nodes[parent]
                .children
                .iter()
                .filter(|&&c| self.element(c).is_some())
                .position(|&c| c == current)
                .unwrap_or(0);
            let name = self.element(current).map(|e| e.local_name()).unwrap_or("#");
            segments.push(format!("{}[{}]", name, position));
            current = parent;
        }

        segments.reverse();
        segments.join("/")
    }

    // Mutation

    /// Create a detached element
    pub fn create_element(&mut self, name: &str, attrs: &[(&str, &str)]) -> NodeId {
        let mut element = Element::new(name);
        for (key, value) in attrs {
            element.set_attr(key, value);
        }
        self.create(NodeKind::Element(element))
    }

    /// Create a detached text node from unescaped text
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.create(NodeKind::Text(escape(text).into_owned()))
    }

    /// Create a detached CDATA section
    pub fn create_cdata(&mut self, text: &str) -> NodeId {
        self.create(NodeKind::CData(text.replace("]]>", "]]]]><![CDATA[>")))
    }

    fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node { kind, parent: None, children: Vec::new() });
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        let children = &mut self.nodes[parent].children;
        let index = index.min(children.len());
        children.insert(index, child);
    }

    /// Put `replacement` where `old` was; `old` ends up detached
    pub fn replace_child(&mut self, old: NodeId, replacement: NodeId) {
        let Some(parent) = self.nodes[old].parent else {
            return;
        };
        self.detach(replacement);
        if let Some(slot) = self.nodes[parent].children.iter_mut().find(|c| **c == old) {
            *slot = replacement;
        }
        self.nodes[replacement].parent = Some(parent);
        self.nodes[old].parent = None;
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id].parent.take() {
            self.nodes[parent].children.retain(|&c| c != id);
        }
    }
}

fn element_from(start: &BytesStart<'_>, self_closing: bool) -> Element {
    let attrs = start
        .attributes()
        .with_checks(false)
        .filter_map(Result::ok)
        .map(|a| (bytes_to_string(a.key.as_ref()), bytes_to_string(&a.value)))
        .collect();

    Element {
        name: bytes_to_string(start.name().as_ref()),
        attrs,
        raw: Some(bytes_to_string(start)),
        self_closing,
    }
}

fn bytes_to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn unescape_lossy(raw: &str) -> String {
    unescape(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}
