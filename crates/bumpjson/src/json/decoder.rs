//! Recursive-descent JSON decoder building the tree straight into the arena.
//!
//! Besides strict JSON the grammar accepts:
//!
//! - single-quoted strings
//! - unquoted barewords (`[a-zA-Z0-9_+.-]+`) as keys and as values; values
//!   are kept as raw text and interpreted on read
//! - `//` line comments and `/* */` block comments between tokens
//!
//! The first error ends decoding. Nothing is rolled back: the arena is the
//! unit of recovery, and the caller clears the document.

use bumpjson_mem::Arena;

use crate::builder::StringBuilder;
use crate::convert::{Literal, interpret};
use crate::error::JsonError;
use crate::reader::Reader;
use crate::slot::{ArrayData, INLINE_RAW_CAPACITY, ObjectData, RawText, Slot, StrRef};

/// Which root value the caller requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Expect {
    Any,
    Array,
    Object,
}

type DecodeResult<T> = Result<T, JsonError>;

pub(crate) struct JsonDecoder<'a, R, B> {
    arena: &'a Arena,
    reader: R,
    builder: B,
    nesting_limit: u8,
}

#[inline]
fn is_bareword_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'+' | b'-' | b'.')
}

#[inline]
fn is_quote(b: u8) -> bool {
    b == b'"' || b == b'\''
}

/// Control characters produced by one-letter escapes; any other escaped
/// byte stands for itself.
#[inline]
fn unescape(b: u8) -> u8 {
    match b {
        b'b' => 0x08,
        b'f' => 0x0c,
        b'n' => b'\n',
        b'r' => b'\r',
        b't' => b'\t',
        other => other,
    }
}

impl<'a, R: Reader, B: StringBuilder> JsonDecoder<'a, R, B> {
    pub(crate) fn new(arena: &'a Arena, reader: R, builder: B, nesting_limit: u8) -> Self {
        JsonDecoder {
            arena,
            reader,
            builder,
            nesting_limit,
        }
    }

    /// Decodes one root value and stops right after it.
    pub(crate) fn parse_root(&mut self, expect: Expect) -> DecodeResult<Slot> {
        self.skip_whitespace()?;
        match (expect, self.reader.current()) {
            (Expect::Any, _) => self.parse_value(),
            (Expect::Array, Some(b'[')) => self.parse_array(),
            (Expect::Array, _) => Err(JsonError::OpeningBracketExpected),
            (Expect::Object, Some(b'{')) => self.parse_object(),
            (Expect::Object, _) => Err(JsonError::OpeningBraceExpected),
        }
    }

    fn parse_value(&mut self) -> DecodeResult<Slot> {
        self.skip_whitespace()?;
        match self.reader.current() {
            None => Err(JsonError::UnexpectedEnd),
            Some(b'[') => self.parse_array(),
            Some(b'{') => self.parse_object(),
            Some(q) if is_quote(q) => Ok(Slot::String(self.read_quoted(q)?)),
            Some(b) if is_bareword_byte(b) => self.read_bareword(),
            Some(_) => Err(JsonError::InvalidInput),
        }
    }

    /// Parses a child value one nesting level down.
    fn parse_nested(&mut self) -> DecodeResult<Slot> {
        self.nesting_limit -= 1;
        let value = self.parse_value();
        self.nesting_limit += 1;
        value
    }

    fn parse_array(&mut self) -> DecodeResult<Slot> {
        if self.nesting_limit == 0 {
            return Err(JsonError::TooDeep);
        }
        self.reader.advance(); // '['

        let ptr = self.arena.alloc(ArrayData::new())?;
        // SAFETY: freshly allocated; the arena outlives the decoder.
        let array = unsafe { ptr.as_ref() };

        if self.eat(b']')? {
            return Ok(Slot::Array(ptr));
        }
        loop {
            let value = self.parse_nested()?;
            array.push(self.arena, value)?;

            if self.eat(b']')? {
                return Ok(Slot::Array(ptr));
            }
            if !self.eat(b',')? {
                return Err(JsonError::ClosingBracketExpected);
            }
        }
    }

    fn parse_object(&mut self) -> DecodeResult<Slot> {
        if self.nesting_limit == 0 {
            return Err(JsonError::TooDeep);
        }
        self.reader.advance(); // '{'

        let ptr = self.arena.alloc(ObjectData::new())?;
        // SAFETY: freshly allocated; the arena outlives the decoder.
        let object = unsafe { ptr.as_ref() };

        if self.eat(b'}')? {
            return Ok(Slot::Object(ptr));
        }
        loop {
            let key = self.read_key()?;
            if !self.eat(b':')? {
                return Err(JsonError::ColonExpected);
            }
            let value = self.parse_nested()?;
            // A repeated key keeps its first position and takes the last
            // value. Without key text every member is kept, which can only
            // overcount.
            if self.builder.keeps_text() {
                object.insert(self.arena, key, value)?;
            } else {
                object.push(self.arena, key, value)?;
            }

            if self.eat(b'}')? {
                return Ok(Slot::Object(ptr));
            }
            if !self.eat(b',')? {
                return Err(JsonError::ClosingBraceExpected);
            }
        }
    }

    /// Keys are quoted strings or barewords; any bareword is accepted,
    /// including `null` or `true`.
    fn read_key(&mut self) -> DecodeResult<StrRef> {
        self.skip_whitespace()?;
        match self.reader.current() {
            None => Err(JsonError::UnexpectedEnd),
            Some(q) if is_quote(q) => self.read_quoted(q),
            Some(b) if is_bareword_byte(b) => {
                self.builder.start();
                while let Some(b) = self.reader.current()
                    && is_bareword_byte(b)
                {
                    self.builder.append(b);
                    self.reader.advance();
                }
                Ok(self.builder.finish()?)
            }
            Some(_) => Err(JsonError::InvalidInput),
        }
    }

    fn read_quoted(&mut self, quote: u8) -> DecodeResult<StrRef> {
        self.reader.advance(); // opening quote
        self.builder.start();

        loop {
            let b = self.reader.current().ok_or(JsonError::IncompleteInput)?;
            self.reader.advance();

            if b == quote {
                break;
            }
            if b != b'\\' {
                self.builder.append(b);
                continue;
            }

            let escaped = self.reader.current().ok_or(JsonError::IncompleteInput)?;
            self.reader.advance();
            if escaped == b'u' {
                let ch = self.read_unicode_escape()?;
                let mut buf = [0u8; 4];
                for &b in ch.encode_utf8(&mut buf).as_bytes() {
                    self.builder.append(b);
                }
            } else {
                self.builder.append(unescape(escaped));
            }
        }

        Ok(self.builder.finish()?)
    }

    /// Decodes the `XXXX` after `\u`, combining surrogate pairs.
    fn read_unicode_escape(&mut self) -> DecodeResult<char> {
        let high = self.read_hex4()?;
        let code = if (0xD800..0xDC00).contains(&high) {
            if self.reader.current() != Some(b'\\') {
                return Err(JsonError::InvalidInput);
            }
            self.reader.advance();
            if self.reader.current() != Some(b'u') {
                return Err(JsonError::InvalidInput);
            }
            self.reader.advance();
            let low = self.read_hex4()?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(JsonError::InvalidInput);
            }
            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
        } else {
            high
        };
        char::from_u32(code).ok_or(JsonError::InvalidInput)
    }

    fn read_hex4(&mut self) -> DecodeResult<u32> {
        let mut value = 0;
        for _ in 0..4 {
            let b = self.reader.current().ok_or(JsonError::IncompleteInput)?;
            let digit = (b as char).to_digit(16).ok_or(JsonError::InvalidInput)?;
            self.reader.advance();
            value = value * 16 + digit;
        }
        Ok(value)
    }

    /// Captures a bareword. Short literals stay inline in the slot; text
    /// and long words are copied to the arena.
    fn read_bareword(&mut self) -> DecodeResult<Slot> {
        let mut inline = [0u8; INLINE_RAW_CAPACITY];
        let mut len = 0;
        let mut spilled = false;

        while let Some(b) = self.reader.current()
            && is_bareword_byte(b)
        {
            self.reader.advance();
            if spilled {
                self.builder.append(b);
            } else if len < INLINE_RAW_CAPACITY {
                inline[len] = b;
                len += 1;
            } else {
                self.builder.start();
                for &pending in &inline {
                    self.builder.append(pending);
                }
                self.builder.append(b);
                spilled = true;
            }
        }

        if spilled {
            return Ok(Slot::Raw(RawText::Stored(self.builder.finish()?)));
        }

        // Bareword bytes are ASCII.
        let text = std::str::from_utf8(&inline[..len]).map_err(|_| JsonError::InvalidInput)?;
        let raw = match interpret(text) {
            Literal::Text(_) => RawText::Stored(StrRef::copy(self.arena, text)?),
            _ => RawText::inline(text).ok_or(JsonError::InvalidInput)?,
        };
        Ok(Slot::Raw(raw))
    }

    /// Skips whitespace and comments up to the next token.
    fn skip_whitespace(&mut self) -> DecodeResult<()> {
        loop {
            match self.reader.current() {
                Some(b) if b.is_ascii_whitespace() => self.reader.advance(),
                Some(b'/') => {
                    self.reader.advance();
                    match self.reader.current() {
                        Some(b'*') => {
                            self.reader.advance();
                            self.read_block_comment()?;
                        }
                        Some(b'/') => {
                            self.reader.advance();
                            self.read_line_comment();
                        }
                        _ => return Err(JsonError::InvalidInput),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_line_comment(&mut self) {
        while let Some(b) = self.reader.current() {
            self.reader.advance();
            if b == b'\n' {
                break;
            }
        }
    }

    fn read_block_comment(&mut self) -> DecodeResult<()> {
        loop {
            match self.reader.current() {
                None => return Err(JsonError::IncompleteInput),
                Some(b'*') => {
                    self.reader.advance();
                    if self.reader.current() == Some(b'/') {
                        self.reader.advance();
                        return Ok(());
                    }
                }
                Some(_) => self.reader.advance(),
            }
        }
    }

    /// Consumes `expected` if it is the next token.
    fn eat(&mut self, expected: u8) -> DecodeResult<bool> {
        self.skip_whitespace()?;
        if self.reader.current() == Some(expected) {
            self.reader.advance();
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
