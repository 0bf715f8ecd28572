//! Owned document tree the widget runs against.
//!
//! Pages are parsed once with `quick-xml` in a tolerant, HTML-flavoured mode
//! and stored in an arena indexed by [`NodeId`]. The tree is
//! small: it knows elements, text, comments and doctype/processing lines,
//! which is everything a documentation page hands to the carousel.
//!
//! ## Tolerance Rules
//!
//! - HTML void elements (`img`, `br`, `source`, ...) never take children,
//!   whether or not they were written self-closing.
//! - Attributes may be valueless (`allowfullscreen`) or unquoted.
//! - A stray end tag closes the nearest matching open element; an end tag
//!   with no open counterpart is dropped.
//! - Optional end tags are implied the HTML way (`<li>` closes an open
//!   `<li>`, a block start tag closes an open `<p>`). An end tag is only
//!   written back when the source had one.
//! - A bare `&` or a `<` that does not start a tag (`R&D`, `a < b`) is
//!   literal text.
//! - `script` and `style` bodies are kept verbatim.
//!
//! ## Round-Tripping
//!
//! Text and attribute values are stored in their escaped source form and
//! written back unchanged, so an untouched page serializes to equivalent
//! markup. [`Document::attr`] returns the entity-decoded value for logic that
//! needs it.

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::borrow::Cow;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomError {
    #[error("HTML parse error at byte {position}: {source}")]
    Parse {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },
}

/// Index of a node inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Elements whose start tag closes an open `<p>`.
const P_CLOSERS: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "main", "nav", "ol", "p", "pre", "section", "table", "ul",
];

/// Marker references standing in for a literal `&` or `<` in text.
const BARE_AMP: &str = "slideshow-bare-amp";
const BARE_LT: &str = "slideshow-bare-lt";

fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

fn closes_implicitly(open: &str, incoming: &str) -> bool {
    match open {
        "p" => P_CLOSERS.contains(&incoming),
        "li" => incoming == "li",
        "dt" | "dd" => matches!(incoming, "dt" | "dd"),
        "option" => matches!(incoming, "option" | "optgroup"),
        "tr" => incoming == "tr",
        "td" | "th" => matches!(incoming, "td" | "th" | "tr"),
        _ => false,
    }
}

fn top(stack: &[NodeId]) -> NodeId {
    stack.last().copied().unwrap_or(NodeId(0))
}

// ----------------------------------------------------------------------------
// Text protection
// ----------------------------------------------------------------------------

/// Rewrite every `&` and `<` that cannot start markup into a marker
/// reference, so the tokenizer only ever sees well-formed text. The parser
/// turns markers back into the literal character. Tags, comments and CDATA
/// are copied untouched; `script`/`style` bodies are protected wholesale.
fn protect_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len() + html.len() / 16);
    let mut rest = html;
    let mut raw_close: Option<&'static str> = None;

    while let Some(at) = rest.find(['<', '&']) {
        out.push_str(&rest[..at]);
        rest = &rest[at..];

        if rest.starts_with('&') {
            let keep = match raw_close {
                Some(_) => None,
                None => reference_len(rest),
            };
            match keep {
                Some(len) => {
                    out.push_str(&rest[..len]);
                    rest = &rest[len..];
                }
                None => {
                    push_marker(&mut out, BARE_AMP);
                    rest = &rest[1..];
                }
            }
            continue;
        }

        if let Some(close) = raw_close {
            if !starts_with_ignore_case(rest, close) {
                push_marker(&mut out, BARE_LT);
                rest = &rest[1..];
                continue;
            }
            raw_close = None;
        }

        match markup_len(rest) {
            Some(len) => {
                let markup = &rest[..len];
                raw_close = raw_text_close(markup);
                out.push_str(markup);
                rest = &rest[len..];
            }
            None => {
                push_marker(&mut out, BARE_LT);
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn push_marker(out: &mut String, name: &str) {
    out.push('&');
    out.push_str(name);
    out.push(';');
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Length of a well-formed character or entity reference at the start of
/// `text` (`&amp;`, `&#38;`, `&#x26;`).
fn reference_len(text: &str) -> Option<usize> {
    let body = text.strip_prefix('&')?;
    let (digits, valid): (&str, fn(&u8) -> bool) = if let Some(hex) = body
        .strip_prefix("#x")
        .or_else(|| body.strip_prefix("#X"))
    {
        (hex, u8::is_ascii_hexdigit)
    } else if let Some(dec) = body.strip_prefix('#') {
        (dec, u8::is_ascii_digit)
    } else {
        if !body.as_bytes().first().is_some_and(u8::is_ascii_alphabetic) {
            return None;
        }
        (body, u8::is_ascii_alphanumeric)
    };
    let run = digits.bytes().take_while(|b| valid(b)).count();
    if run == 0 || digits.as_bytes().get(run) != Some(&b';') {
        return None;
    }
    Some(text.len() - digits.len() + run + 1)
}

/// Length of the tag, comment, CDATA section or declaration starting at
/// `text`, `None` when the `<` is plain text.
fn markup_len(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    if text.starts_with("<!--") {
        return Some(text[4..].find("-->").map_or(text.len(), |end| 4 + end + 3));
    }
    if text.starts_with("<![CDATA[") {
        return Some(text[9..].find("]]>").map_or(text.len(), |end| 9 + end + 3));
    }
    match bytes.get(1).copied() {
        Some(b'!' | b'?') => text.find('>').map(|end| end + 1),
        Some(b'/') if bytes.get(2).is_some_and(u8::is_ascii_alphabetic) => tag_len(bytes),
        Some(b) if b.is_ascii_alphabetic() => tag_len(bytes),
        _ => None,
    }
}

/// Scan to the `>` closing a tag, skipping quoted attribute values.
fn tag_len(bytes: &[u8]) -> Option<usize> {
    let mut quote: Option<u8> = None;
    let mut last_significant = b'<';
    for (i, &b) in bytes.iter().enumerate().skip(1) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'>' => return Some(i + 1),
            None if (b == b'"' || b == b'\'') && last_significant == b'=' => quote = Some(b),
            None => {}
        }
        if !b.is_ascii_whitespace() {
            last_significant = b;
        }
    }
    None
}

/// Closing tag to wait for when `markup` opens a raw-text element.
fn raw_text_close(markup: &str) -> Option<&'static str> {
    if markup.ends_with("/>") {
        return None;
    }
    let name = markup[1..]
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase();
    RAW_TEXT_ELEMENTS
        .iter()
        .position(|raw| *raw == name)
        .map(|i| ["</script", "</style"][i])
}

#[derive(Debug, Clone)]
struct Element {
    /// Lowercase tag name used for matching.
    tag: String,
    /// Tag name as written, used for serialization.
    name: String,
    /// Attribute name and escaped value, in source order.
    attrs: Vec<(String, String)>,
    self_closing: bool,
    /// Whether the source closed this element with its own end tag.
    explicit_end: bool,
}

#[derive(Debug, Clone)]
enum NodeData {
    Root,
    Element(Element),
    /// Escaped text, written back verbatim.
    Text(String),
    Comment(String),
    Doctype(String),
    /// `<?...?>` declarations and processing instructions.
    Instruction(String),
    CData(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// Arena-backed document tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Root,
            }],
        }
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

impl Document {
    /// The synthetic root holding top-level nodes.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Parse an HTML string into a document.
    pub fn parse(html: &str) -> Result<Self, DomError> {
        let protected = protect_text(html);
        let mut doc = Document::default();
        let mut reader = Reader::from_str(&protected);
        {
            let config = reader.config_mut();
            config.trim_text(false);
            config.check_end_names = false;
            config.allow_unmatched_ends = true;
            config.expand_empty_elements = false;
        }

        let mut stack: Vec<NodeId> = vec![doc.root()];

        loop {
            let position = reader.buffer_position();
            let event = reader
                .read_event()
                .map_err(|source| DomError::Parse { position, source })?;
            match event {
                Event::Start(e) => {
                    let element = element_from_start(&e, false);
                    doc.close_implied(&mut stack, &element.tag);
                    let void = is_void(&element.tag);
                    let id = doc.push(top(&stack), NodeData::Element(element));
                    if !void {
                        stack.push(id);
                    }
                }
                Event::Empty(e) => {
                    let element = element_from_start(&e, true);
                    doc.close_implied(&mut stack, &element.tag);
                    doc.push(top(&stack), NodeData::Element(element));
                }
                Event::End(e) => {
                    let tag = lossy(e.local_name().as_ref()).to_ascii_lowercase();
                    if is_void(&tag) {
                        continue;
                    }
                    // Close up to the nearest matching open element.
                    let open = stack
                        .iter()
                        .rposition(|id| doc.tag(*id) == Some(tag.as_str()));
                    if let Some(depth) = open.filter(|depth| *depth > 0) {
                        if let Some(el) = doc.element_mut(stack[depth]) {
                            el.explicit_end = true;
                        }
                        stack.truncate(depth);
                    }
                }
                Event::Text(e) => {
                    doc.push_text(top(&stack), &lossy(&e));
                }
                Event::GeneralRef(e) => {
                    let name = lossy(&e);
                    let text = match name.as_str() {
                        BARE_AMP => "&".to_string(),
                        BARE_LT => "<".to_string(),
                        _ => format!("&{name};"),
                    };
                    doc.push_text(top(&stack), &text);
                }
                Event::CData(e) => {
                    doc.push(top(&stack), NodeData::CData(lossy(&e)));
                }
                Event::Comment(e) => {
                    doc.push(top(&stack), NodeData::Comment(lossy(&e)));
                }
                Event::DocType(e) => {
                    doc.push(top(&stack), NodeData::Doctype(lossy(&e).trim().to_string()));
                }
                Event::Decl(e) => {
                    doc.push(top(&stack), NodeData::Instruction(lossy(&e)));
                }
                Event::PI(e) => {
                    doc.push(top(&stack), NodeData::Instruction(lossy(&e)));
                }
                Event::Eof => break,
            }
        }

        Ok(doc)
    }

    /// Pop open elements whose end tag is implied by an incoming `tag`
    /// (`<li>` after `<li>`, a block after `<p>`, ...).
    fn close_implied(&self, stack: &mut Vec<NodeId>, tag: &str) {
        while stack.len() > 1 {
            let open = top(stack);
            if !self.tag(open).is_some_and(|t| closes_implicitly(t, tag)) {
                break;
            }
            stack.pop();
        }
    }

    fn push(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            data,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Append text, merging with a preceding text sibling (entity refs arrive
    /// as separate events).
    fn push_text(&mut self, parent: NodeId, text: &str) {
        if let Some(&last) = self.nodes[parent.0].children.last()
            && let NodeData::Text(existing) = &mut self.nodes[last.0].data
        {
            existing.push_str(text);
            return;
        }
        self.push(parent, NodeData::Text(text.to_string()));
    }

    fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes.get(id.0)?.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(id.0)?.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0)?.parent
    }

    /// All child nodes, including text and comments.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    /// Child nodes that are elements, in document order.
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.is_element(*child))
            .collect()
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Lowercase tag name, `None` for non-element nodes.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    /// Raw (still escaped) attribute value.
    pub fn raw_attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?
            .attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Entity-decoded attribute value.
    ///
    /// Values with entities `quick-xml` cannot resolve (HTML named entities
    /// beyond the XML five) are returned as written.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<Cow<'_, str>> {
        let raw = self.raw_attr(id, name)?;
        Some(quick_xml::escape::unescape(raw).unwrap_or(Cow::Borrowed(raw)))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.raw_attr(id, name).is_some()
    }

    /// Set an attribute from a plain (unescaped) value, replacing any existing one.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        let escaped = quick_xml::escape::escape(value).into_owned();
        if let Some(el) = self.element_mut(id) {
            match el.attrs.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
                Some(slot) => slot.1 = escaped,
                None => el.attrs.push((name.to_string(), escaped)),
            }
        }
    }

    pub fn classes(&self, id: NodeId) -> Vec<String> {
        self.attr(id, "class")
            .map(|value| value.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|value| value.split_whitespace().any(|c| c == class))
    }

    /// Look up one property in the element's inline `style` attribute.
    pub fn inline_style(&self, id: NodeId, property: &str) -> Option<String> {
        let style = self.attr(id, "style")?;
        style.split(';').find_map(|declaration| {
            let (key, value) = declaration.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(property)
                .then(|| value.trim().to_string())
        })
    }

    /// All elements carrying `class`, in document order.
    pub fn find_by_class(&self, class: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|id| self.has_class(*id, class))
            .collect()
    }

    /// First element with the given tag, in document order.
    pub fn find_first(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|id| self.tag(*id) == Some(tag))
    }

    fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut pending: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = pending.pop() {
            out.push(next);
            pending.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Serialized markup of the node's children.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_node(*child, &mut out, &NoSplice);
        }
        out
    }

    /// Serialized markup of the node itself.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out, &NoSplice);
        out
    }

    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        self.to_html_with(&NoSplice)
    }

    /// Serialize the whole document, letting `splice` substitute element
    /// content and append markup inside elements.
    pub fn to_html_with(&self, splice: &dyn Splice) -> String {
        let mut out = String::new();
        for child in self.children(self.root()) {
            self.write_node(*child, &mut out, splice);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String, splice: &dyn Splice) {
        let Some(node) = self.nodes.get(id.0) else {
            return;
        };
        match &node.data {
            NodeData::Root => {
                for child in &node.children {
                    self.write_node(*child, out, splice);
                }
            }
            NodeData::Text(text) => out.push_str(text),
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeData::Doctype(text) => {
                out.push_str("<!DOCTYPE ");
                out.push_str(text);
                out.push('>');
            }
            NodeData::Instruction(text) => {
                out.push_str("<?");
                out.push_str(text);
                out.push_str("?>");
            }
            NodeData::CData(text) => {
                out.push_str("<![CDATA[");
                out.push_str(text);
                out.push_str("]]>");
            }
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.name);
                for (key, value) in &el.attrs {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    out.push_str(&value.replace('"', "&quot;"));
                    out.push('"');
                }
                let replacement = splice.inner(id);
                let appended = splice.append(id);
                if replacement.is_none() && appended.is_none() && node.children.is_empty() {
                    if el.self_closing {
                        out.push_str("/>");
                        return;
                    }
                    if is_void(&el.tag) {
                        out.push('>');
                        return;
                    }
                }
                out.push('>');
                match &replacement {
                    Some(inner) => out.push_str(inner),
                    None => {
                        for child in &node.children {
                            self.write_node(*child, out, splice);
                        }
                    }
                }
                let spliced = replacement.is_some();
                if let Some(extra) = appended {
                    out.push_str(&extra);
                }
                if el.explicit_end || spliced {
                    out.push_str("</");
                    out.push_str(&el.name);
                    out.push('>');
                }
            }
        }
    }
}

/// Serialization hooks used by [`Document::to_html_with`].
pub trait Splice {
    /// Markup replacing the element's children, if any.
    fn inner(&self, id: NodeId) -> Option<String>;
    /// Markup written after the element's children, if any.
    fn append(&self, id: NodeId) -> Option<String>;
}

struct NoSplice;

impl Splice for NoSplice {
    fn inner(&self, _id: NodeId) -> Option<String> {
        None
    }

    fn append(&self, _id: NodeId) -> Option<String> {
        None
    }
}

fn element_from_start(e: &quick_xml::events::BytesStart<'_>, self_closing: bool) -> Element {
    let name = lossy(e.name().as_ref());
    let tag = lossy(e.local_name().as_ref()).to_ascii_lowercase();
    let attrs = e
        .html_attributes()
        .flatten()
        .map(|attr| (lossy(attr.key.as_ref()), lossy(&attr.value)))
        .collect();
    Element {
        tag,
        name,
        attrs,
        self_closing,
        explicit_end: false,
    }
}
