//! Constant-capacity JSON document.
//!
//! # Design
//! A `Document` is an arena of `SLOTS` value nodes plus `BYTES` of string
//! storage, both `heapless` containers sized at compile time. Nodes are never
//! freed or moved; containers link their children through `next` indices in
//! document order. Running out of either pool is reported as
//! `DecodeError::CapacityExceeded` and nothing past the end is ever written.
//!
//! The document is read-only once parsed. Lookups hand out `Value` views that
//! borrow the arena.

use std::io::Read;

use crate::error::DecodeError;
use crate::json::parser::Parser;

pub(crate) type NodeId = u16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    start: u16,
    len: u16,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Children {
    first: Option<NodeId>,
    last: Option<NodeId>,
    len: u16,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Kind {
    Null,
    Bool(bool),
    Number(Span),
    String(Span),
    Array(Children),
    Object(Children),
}

#[derive(Debug, Clone, Copy)]
struct Node {
    key: Option<Span>,
    kind: Kind,
    next: Option<NodeId>,
}

/// Type of a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

pub struct Document<const SLOTS: usize, const BYTES: usize> {
    nodes: heapless::Vec<Node, SLOTS>,
    strings: heapless::Vec<u8, BYTES>,
    nesting_limit: usize,
}

impl<const SLOTS: usize, const BYTES: usize> Document<SLOTS, BYTES> {
    /// Parse one JSON value from `reader`, allowing containers nested at most
    /// `nesting_limit` deep. Bytes after the value are left unread.
    pub fn parse<R: Read>(reader: R, nesting_limit: usize) -> Result<Self, DecodeError> {
        let mut doc = Self {
            nodes: heapless::Vec::new(),
            strings: heapless::Vec::new(),
            nesting_limit,
        };
        Parser::new(reader, &mut doc).parse_document()?;
        Ok(doc)
    }

    #[cfg(test)]
    pub(crate) fn parse_slice(bytes: &[u8], nesting_limit: usize) -> Result<Self, DecodeError> {
        Self::parse(bytes, nesting_limit)
    }

    pub fn root(&self) -> Option<Value<'_, SLOTS, BYTES>> {
        (!self.nodes.is_empty()).then_some(Value { doc: self, id: 0 })
    }

    pub fn slots_used(&self) -> usize {
        self.nodes.len()
    }

    pub fn bytes_used(&self) -> usize {
        self.strings.len()
    }

    pub(crate) fn nesting_limit(&self) -> usize {
        self.nesting_limit
    }

    pub(crate) fn alloc(&mut self, key: Option<Span>, kind: Kind) -> Result<NodeId, DecodeError> {
        let id = NodeId::try_from(self.nodes.len())
            .map_err(|_| DecodeError::CapacityExceeded("value slots"))?;
        self.nodes
            .push(Node {
                key,
                kind,
                next: None,
            })
            .map_err(|_| DecodeError::CapacityExceeded("value slots"))?;
        Ok(id)
    }

    /// Link `child` as the last child of the container `parent`.
    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let previous = match &mut self.nodes[usize::from(parent)].kind {
            Kind::Array(children) | Kind::Object(children) => {
                let previous = children.last.replace(child);
                if previous.is_none() {
                    children.first = Some(child);
                }
                children.len += 1;
                previous
            }
            _ => return,
        };
        if let Some(previous) = previous {
            self.nodes[usize::from(previous)].next = Some(child);
        }
    }

    pub(crate) fn push_byte(&mut self, byte: u8) -> Result<(), DecodeError> {
        self.strings
            .push(byte)
            .map_err(|_| DecodeError::CapacityExceeded("string storage"))
    }

    pub(crate) fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        self.strings
            .extend_from_slice(bytes)
            .map_err(|_| DecodeError::CapacityExceeded("string storage"))
    }

    /// Current end of string storage, the start of the next span.
    pub(crate) fn mark(&self) -> usize {
        self.strings.len()
    }

    /// Span from `start` to the current end of string storage.
    pub(crate) fn span_from(&self, start: usize) -> Result<Span, DecodeError> {
        let overflow = || DecodeError::CapacityExceeded("string storage");
        let start_u16 = u16::try_from(start).map_err(|_| overflow())?;
        let len = u16::try_from(self.strings.len() - start).map_err(|_| overflow())?;
        Ok(Span {
            start: start_u16,
            len,
        })
    }

    pub(crate) fn span_bytes(&self, span: Span) -> &[u8] {
        let start = usize::from(span.start);
        &self.strings[start..start + usize::from(span.len)]
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[usize::from(id)]
    }
}

/// Borrowed view of one value in a `Document`.
#[derive(Clone, Copy)]
pub struct Value<'a, const SLOTS: usize, const BYTES: usize> {
    doc: &'a Document<SLOTS, BYTES>,
    id: NodeId,
}

impl<'a, const SLOTS: usize, const BYTES: usize> Value<'a, SLOTS, BYTES> {
    pub fn kind(&self) -> ValueKind {
        match self.doc.node(self.id).kind {
            Kind::Null => ValueKind::Null,
            Kind::Bool(_) => ValueKind::Bool,
            Kind::Number(_) => ValueKind::Number,
            Kind::String(_) => ValueKind::String,
            Kind::Array(_) => ValueKind::Array,
            Kind::Object(_) => ValueKind::Object,
        }
    }

    /// Member `key` of an object. The first match wins on duplicate keys.
    pub fn get(&self, key: &str) -> Option<Value<'a, SLOTS, BYTES>> {
        let Kind::Object(children) = self.doc.node(self.id).kind else {
            return None;
        };
        self.children(children).find(|child| {
            self.doc
                .node(child.id)
                .key
                .is_some_and(|span| self.doc.span_bytes(span) == key.as_bytes())
        })
    }

    /// Element `index` of an array.
    pub fn at(&self, index: usize) -> Option<Value<'a, SLOTS, BYTES>> {
        let Kind::Array(children) = self.doc.node(self.id).kind else {
            return None;
        };
        self.children(children).nth(index)
    }

    /// Number of elements or members of a container.
    pub fn len(&self) -> Option<usize> {
        match self.doc.node(self.id).kind {
            Kind::Array(children) | Kind::Object(children) => Some(usize::from(children.len)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        let Kind::String(span) = self.doc.node(self.id).kind else {
            return None;
        };
        std::str::from_utf8(self.doc.span_bytes(span)).ok()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.doc.node(self.id).kind {
            Kind::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Raw text of a number, as it appeared in the document.
    pub fn number_text(&self) -> Option<&'a str> {
        let Kind::Number(span) = self.doc.node(self.id).kind else {
            return None;
        };
        std::str::from_utf8(self.doc.span_bytes(span)).ok()
    }

    /// A number written as a plain non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        let text = self.number_text()?;
        if !text.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        text.parse().ok()
    }

    pub fn is_null(&self) -> bool {
        matches!(self.doc.node(self.id).kind, Kind::Null)
    }

    fn children(&self, children: Children) -> impl Iterator<Item = Value<'a, SLOTS, BYTES>> {
        let doc = self.doc;
        std::iter::successors(children.first, move |&id| doc.node(id).next)
            .map(move |id| Value { doc, id })
    }
}
