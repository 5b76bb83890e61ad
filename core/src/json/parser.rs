//! Incremental JSON parser feeding a `Document`.
//!
//! Pulls one byte at a time from any `Read` with a single byte of
//! lookahead, so the body never has to be buffered ahead of parsing.
//! Recursion depth is bounded by the document's nesting limit.

use std::io::{self, Read};

use crate::error::DecodeError;
use crate::json::document::{Children, Document, Kind, NodeId, Span};

const UNEXPECTED_EOF: DecodeError = DecodeError::Malformed("unexpected end of input");

pub(crate) struct Parser<'d, R, const SLOTS: usize, const BYTES: usize> {
    input: R,
    peeked: Option<u8>,
    doc: &'d mut Document<SLOTS, BYTES>,
}

impl<'d, R: Read, const SLOTS: usize, const BYTES: usize> Parser<'d, R, SLOTS, BYTES> {
    pub(crate) fn new(input: R, doc: &'d mut Document<SLOTS, BYTES>) -> Self {
        Self {
            input,
            peeked: None,
            doc,
        }
    }

    /// Parse exactly one top-level value.
    pub(crate) fn parse_document(mut self) -> Result<(), DecodeError> {
        if self.skip_whitespace()?.is_none() {
            return Err(DecodeError::Malformed("empty input"));
        }
        self.parse_value(None, 1)?;
        Ok(())
    }

    fn parse_value(&mut self, key: Option<Span>, depth: usize) -> Result<NodeId, DecodeError> {
        match self.skip_whitespace()? {
            None => Err(UNEXPECTED_EOF),
            Some(b'{') => {
                self.bump();
                self.parse_object(key, depth)
            }
            Some(b'[') => {
                self.bump();
                self.parse_array(key, depth)
            }
            Some(b'"') => {
                self.bump();
                let span = self.parse_string()?;
                self.doc.alloc(key, Kind::String(span))
            }
            Some(b'-' | b'0'..=b'9') => {
                let span = self.parse_number()?;
                self.doc.alloc(key, Kind::Number(span))
            }
            Some(b't') => {
                self.expect_literal(b"true")?;
                self.doc.alloc(key, Kind::Bool(true))
            }
            Some(b'f') => {
                self.expect_literal(b"false")?;
                self.doc.alloc(key, Kind::Bool(false))
            }
            Some(b'n') => {
                self.expect_literal(b"null")?;
                self.doc.alloc(key, Kind::Null)
            }
            Some(_) => Err(DecodeError::Malformed("unexpected character")),
        }
    }

    fn parse_object(&mut self, key: Option<Span>, depth: usize) -> Result<NodeId, DecodeError> {
        self.check_depth(depth)?;
        let id = self.doc.alloc(key, Kind::Object(Children::default()))?;
        if self.skip_whitespace()? == Some(b'}') {
            self.bump();
            return Ok(id);
        }
        loop {
            match self.skip_whitespace()? {
                Some(b'"') => self.bump(),
                None => return Err(UNEXPECTED_EOF),
                Some(_) => return Err(DecodeError::Malformed("expected object key")),
            }
            let member_key = self.parse_string()?;
            if self.skip_whitespace()? != Some(b':') {
                return Err(DecodeError::Malformed("expected `:` after object key"));
            }
            self.bump();
            let child = self.parse_value(Some(member_key), depth + 1)?;
            self.doc.append_child(id, child);
            match self.skip_whitespace()? {
                Some(b',') => self.bump(),
                Some(b'}') => {
                    self.bump();
                    return Ok(id);
                }
                None => return Err(UNEXPECTED_EOF),
                Some(_) => return Err(DecodeError::Malformed("expected `,` or `}`")),
            }
        }
    }

    fn parse_array(&mut self, key: Option<Span>, depth: usize) -> Result<NodeId, DecodeError> {
        self.check_depth(depth)?;
        let id = self.doc.alloc(key, Kind::Array(Children::default()))?;
        if self.skip_whitespace()? == Some(b']') {
            self.bump();
            return Ok(id);
        }
        loop {
            let child = self.parse_value(None, depth + 1)?;
            self.doc.append_child(id, child);
            match self.skip_whitespace()? {
                Some(b',') => self.bump(),
                Some(b']') => {
                    self.bump();
                    return Ok(id);
                }
                None => return Err(UNEXPECTED_EOF),
                Some(_) => return Err(DecodeError::Malformed("expected `,` or `]`")),
            }
        }
    }

    /// Parse string contents after the opening quote into string storage.
    fn parse_string(&mut self) -> Result<Span, DecodeError> {
        let start = self.doc.mark();
        loop {
            match self.next_byte()?.ok_or(DecodeError::Malformed("unterminated string"))? {
                b'"' => break,
                b'\\' => self.parse_escape()?,
                0x00..=0x1f => return Err(DecodeError::Malformed("control character in string")),
                byte => self.doc.push_byte(byte)?,
            }
        }
        let span = self.doc.span_from(start)?;
        if std::str::from_utf8(self.doc.span_bytes(span)).is_err() {
            return Err(DecodeError::Malformed("invalid UTF-8 in string"));
        }
        Ok(span)
    }

    fn parse_escape(&mut self) -> Result<(), DecodeError> {
        let byte = match self.next_byte()?.ok_or(UNEXPECTED_EOF)? {
            b'"' => b'"',
            b'\\' => b'\\',
            b'/' => b'/',
            b'b' => 0x08,
            b'f' => 0x0c,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'u' => {
                let ch = self.parse_unicode_escape()?;
                let mut utf8 = [0u8; 4];
                return self.doc.push_bytes(ch.encode_utf8(&mut utf8).as_bytes());
            }
            _ => return Err(DecodeError::Malformed("invalid escape")),
        };
        self.doc.push_byte(byte)
    }

    /// Decode the hex digits of `\uXXXX`, joining surrogate pairs.
    fn parse_unicode_escape(&mut self) -> Result<char, DecodeError> {
        let high = self.parse_hex4()?;
        let code = match high {
            0xD800..=0xDBFF => {
                if self.next_byte()? != Some(b'\\') || self.next_byte()? != Some(b'u') {
                    return Err(DecodeError::Malformed("unpaired surrogate"));
                }
                let low = self.parse_hex4()?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(DecodeError::Malformed("unpaired surrogate"));
                }
                0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00)
            }
            0xDC00..=0xDFFF => return Err(DecodeError::Malformed("unpaired surrogate")),
            _ => u32::from(high),
        };
        char::from_u32(code).ok_or(DecodeError::Malformed("invalid unicode escape"))
    }

    fn parse_hex4(&mut self) -> Result<u16, DecodeError> {
        let mut value = 0u16;
        for _ in 0..4 {
            let byte = self.next_byte()?.ok_or(UNEXPECTED_EOF)?;
            let digit = (byte as char)
                .to_digit(16)
                .ok_or(DecodeError::Malformed("invalid unicode escape"))?;
            value = (value << 4) | digit as u16;
        }
        Ok(value)
    }

    fn parse_number(&mut self) -> Result<Span, DecodeError> {
        let start = self.doc.mark();
        while let Some(byte) = self.peek_byte()? {
            if !matches!(byte, b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E') {
                break;
            }
            self.bump();
            self.doc.push_byte(byte)?;
        }
        let span = self.doc.span_from(start)?;
        if !is_json_number(self.doc.span_bytes(span)) {
            return Err(DecodeError::Malformed("invalid number"));
        }
        Ok(span)
    }

    fn expect_literal(&mut self, literal: &[u8]) -> Result<(), DecodeError> {
        for &expected in literal {
            if self.next_byte()? != Some(expected) {
                return Err(DecodeError::Malformed("invalid literal"));
            }
        }
        Ok(())
    }

    fn check_depth(&self, depth: usize) -> Result<(), DecodeError> {
        if depth > self.doc.nesting_limit() {
            return Err(DecodeError::CapacityExceeded("nesting depth"));
        }
        Ok(())
    }

    /// Peek the next non-whitespace byte.
    fn skip_whitespace(&mut self) -> Result<Option<u8>, DecodeError> {
        while let Some(byte) = self.peek_byte()? {
            if !matches!(byte, b' ' | b'\t' | b'\n' | b'\r') {
                return Ok(Some(byte));
            }
            self.bump();
        }
        Ok(None)
    }

    /// Consume the peeked byte.
    fn bump(&mut self) {
        self.peeked = None;
    }

    fn peek_byte(&mut self) -> Result<Option<u8>, DecodeError> {
        if self.peeked.is_none() {
            self.peeked = self.read_byte()?;
        }
        Ok(self.peeked)
    }

    fn next_byte(&mut self) -> Result<Option<u8>, DecodeError> {
        match self.peeked.take() {
            Some(byte) => Ok(Some(byte)),
            None => self.read_byte(),
        }
    }

    fn read_byte(&mut self) -> Result<Option<u8>, DecodeError> {
        let mut byte = [0u8; 1];
        loop {
            match self.input.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// `-? (0 | [1-9][0-9]*) (. [0-9]+)? ([eE] [+-]? [0-9]+)?`
fn is_json_number(text: &[u8]) -> bool {
    let mut rest = text.strip_prefix(b"-").unwrap_or(text);

    match rest.first() {
        Some(b'0') => rest = &rest[1..],
        Some(b'1'..=b'9') => rest = skip_digits(rest),
        _ => return false,
    }
    if let Some(fraction) = rest.strip_prefix(b".") {
        let after = skip_digits(fraction);
        if after.len() == fraction.len() {
            return false;
        }
        rest = after;
    }
    if let Some(exponent) = rest.strip_prefix(b"e").or_else(|| rest.strip_prefix(b"E")) {
        let exponent = exponent
            .strip_prefix(b"+")
            .or_else(|| exponent.strip_prefix(b"-"))
            .unwrap_or(exponent);
        let after = skip_digits(exponent);
        if after.len() == exponent.len() {
            return false;
        }
        rest = after;
    }
    rest.is_empty()
}

fn skip_digits(text: &[u8]) -> &[u8] {
    let n = text.iter().take_while(|b| b.is_ascii_digit()).count();
    &text[n..]
}
