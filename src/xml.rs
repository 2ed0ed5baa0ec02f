//! Rendering and parsing for the Számla Agent XML dialect.
//!
//! Rendering works on `(tag, value)` pairs: absent values emit nothing at
//! all, never an empty element. Parsing produces a plain node tree with
//! namespace prefixes stripped, so lookups use local element names.

use quick_xml::events::Event;
use rust_decimal::Decimal;
use time::Date;

use crate::error::{Error, Result};

const INDENT: &str = "  ";

/// Two spaces per indent level.
#[must_use]
pub fn pad(level: usize) -> String {
    INDENT.repeat(level)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// A renderable element value.
#[derive(Debug, Clone)]
pub enum Value {
    Text(String),
    Bool(bool),
    Int(i64),
    Number(Decimal),
    Date(Date),
    Elements(Vec<Field>),
}

/// A tag paired with an optional value; `None` renders nothing.
pub type Field = (&'static str, Option<Value>);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Self::Number(v)
    }
}

impl From<Date> for Value {
    fn from(v: Date) -> Self {
        Self::Date(v)
    }
}

/// Shorthand for a populated field.
pub fn field(tag: &'static str, value: impl Into<Value>) -> Field {
    (tag, Some(value.into()))
}

/// Shorthand for an optional field, omitted when `None`.
pub fn opt<V: Into<Value>>(tag: &'static str, value: Option<V>) -> Field {
    (tag, value.map(Into::into))
}

/// Renders one element at the given indent level, newline-terminated.
///
/// Scalar values are written inline; `Elements` recurses with the children
/// one level deeper and the closing tag back at the current level.
#[must_use]
pub fn render_element(tag: &str, value: &Value, indent_level: usize) -> String {
    let mut out = String::new();
    out.push_str(&pad(indent_level));
    out.push('<');
    out.push_str(tag);
    out.push('>');

    match value {
        Value::Elements(children) => {
            out.push('\n');
            out.push_str(&render_fields(children, indent_level));
            out.push_str(&pad(indent_level));
        }
        Value::Date(date) => {
            out.push_str(&format!(
                "{:04}-{:02}-{:02}",
                date.year(),
                u8::from(date.month()),
                date.day()
            ));
        }
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(n) => out.push_str(&n.to_string()),
        Value::Number(n) => out.push_str(&n.normalize().to_string()),
        Value::Text(s) => out.push_str(&escape(s)),
    }

    out.push_str("</");
    out.push_str(tag);
    out.push_str(">\n");
    out
}

/// Renders a field list one level below `indent_level`, skipping absent
/// values entirely.
#[must_use]
pub fn render_fields(fields: &[Field], indent_level: usize) -> String {
    fields
        .iter()
        .filter_map(|(tag, value)| {
            value
                .as_ref()
                .map(|value| render_element(tag, value, indent_level + 1))
        })
        .collect()
}

/// A parsed XML element. Element names have their namespace prefix
/// stripped; leaf text is whitespace-trimmed.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub name: String,
    pub text: String,
    pub children: Vec<Node>,
}

impl Node {
    /// First child with the given local name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Walks a path of child names from this node.
    #[must_use]
    pub fn descendant(&self, path: &[&str]) -> Option<&Node> {
        let mut node = self;
        for name in path {
            node = node.child(name)?;
        }
        Some(node)
    }

    /// Text content of the named child, if present.
    #[must_use]
    pub fn text_of(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }
}

fn local_name(qualified: &[u8]) -> String {
    let name = String::from_utf8_lossy(qualified);
    match name.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => name.into_owned(),
    }
}

/// Parses an XML document into a [`Node`] tree rooted at the document
/// element.
pub fn parse(xml: &str) -> Result<Node> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // Sentinel container; the document element ends up as its only child.
    let mut stack: Vec<Node> = vec![Node::default()];

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                stack.push(Node {
                    name: local_name(e.name().as_ref()),
                    ..Node::default()
                });
            }
            Event::Empty(e) => {
                let node = Node {
                    name: local_name(e.name().as_ref()),
                    ..Node::default()
                };
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(node);
                }
            }
            Event::Text(t) => {
                let text = t.unescape()?;
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text);
                }
            }
            Event::CData(t) => {
                let text = String::from_utf8_lossy(&t).into_owned();
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text);
                }
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| Error::unexpected("unbalanced closing tag"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => return Err(Error::unexpected("unbalanced closing tag")),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(Error::unexpected("document ended inside an open element"));
    }
    stack
        .pop()
        .and_then(|root| root.children.into_iter().next())
        .ok_or_else(|| Error::unexpected("empty document"))
}
