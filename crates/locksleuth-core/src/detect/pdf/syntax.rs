//! Just enough PDF object syntax to read a trailer and an encryption
//! dictionary: numbers, names, strings, arrays, dictionaries and indirect
//! references. Streams and content are never decoded.

use std::fmt;

/// Nesting limit for arrays and dictionaries.
const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Name(String),
    Str(Vec<u8>),
    Array(Vec<Object>),
    Dict(Dict),
    Ref(u32, u16),
}

impl Object {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Object]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Self::Dict(d) => Some(d),
            _ => None,
        }
    }
}

/// A dictionary in source order. Lookups return the last entry for a key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dict(Vec<(String, Object)>);

impl Dict {
    pub fn get(&self, key: &str) -> Option<&Object> {
        self.0.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub offset: usize,
    pub message: &'static str,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.message, self.offset)
    }
}

impl std::error::Error for SyntaxError {}

#[inline]
fn is_whitespace(b: u8) -> bool {
    matches!(b, 0 | b'\t' | b'\n' | 0x0c | b'\r' | b' ')
}

#[inline]
fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

#[inline]
fn is_regular(b: u8) -> bool {
    !is_whitespace(b) && !is_delimiter(b)
}

/// Cursor over a byte buffer.
pub struct Parser<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn at(buf: &'a [u8], pos: usize) -> Self {
        Self {
            buf,
            pos: pos.min(buf.len()),
        }
    }

    fn error(&self, message: &'static str) -> SyntaxError {
        SyntaxError {
            offset: self.pos,
            message,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.buf.get(self.pos + ahead).copied()
    }

    /// Skip whitespace and comments.
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if is_whitespace(b) {
                self.pos += 1;
            } else if b == b'%' {
                while let Some(c) = self.peek() {
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    /// Consume `keyword` if it is the next token.
    pub fn keyword(&mut self, keyword: &[u8]) -> bool {
        self.skip_whitespace();
        let rest = &self.buf[self.pos..];
        let ends_token = rest.get(keyword.len()).map_or(true, |&b| !is_regular(b));
        if rest.starts_with(keyword) && ends_token {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    /// Consume an `N G obj` header and return the object number and generation.
    pub fn object_header(&mut self) -> Result<(u32, u16), SyntaxError> {
        let num = self.unsigned()?;
        let generation = self.unsigned()?;
        if !self.keyword(b"obj") {
            return Err(self.error("expected `obj`"));
        }
        let num = u32::try_from(num).map_err(|_| self.error("object number out of range"))?;
        let generation =
            u16::try_from(generation).map_err(|_| self.error("generation out of range"))?;
        Ok((num, generation))
    }

    fn unsigned(&mut self) -> Result<u64, SyntaxError> {
        self.skip_whitespace();
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        std::str::from_utf8(&self.buf[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| self.error("expected an unsigned integer"))
    }

    pub fn parse_object(&mut self) -> Result<Object, SyntaxError> {
        self.object(0)
    }

    fn object(&mut self, depth: usize) -> Result<Object, SyntaxError> {
        if depth > MAX_DEPTH {
            return Err(self.error("objects nested too deeply"));
        }
        self.skip_whitespace();
        match self.peek() {
            None => Err(self.error("unexpected end of data")),
            Some(b'/') => self.name().map(Object::Name),
            Some(b'(') => self.literal_string().map(Object::Str),
            Some(b'<') if self.peek_at(1) == Some(b'<') => self.dict(depth).map(Object::Dict),
            Some(b'<') => self.hex_string().map(Object::Str),
            Some(b'[') => self.array(depth),
            Some(b) if b == b'+' || b == b'-' || b == b'.' || b.is_ascii_digit() => {
                self.number_or_ref()
            }
            Some(_) => {
                if self.keyword(b"true") {
                    Ok(Object::Bool(true))
                } else if self.keyword(b"false") {
                    Ok(Object::Bool(false))
                } else if self.keyword(b"null") {
                    Ok(Object::Null)
                } else {
                    Err(self.error("unexpected token"))
                }
            }
        }
    }

    fn name(&mut self) -> Result<String, SyntaxError> {
        self.pos += 1;
        let mut out = Vec::new();
        while let Some(b) = self.peek() {
            if !is_regular(b) {
                break;
            }
            if b == b'#' {
                let hex = self
                    .buf
                    .get(self.pos + 1..self.pos + 3)
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                if let Some(decoded) = hex {
                    out.push(decoded);
                    self.pos += 3;
                    continue;
                }
            }
            out.push(b);
            self.pos += 1;
        }
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn literal_string(&mut self) -> Result<Vec<u8>, SyntaxError> {
        self.pos += 1;
        let mut out = Vec::new();
        let mut depth = 1usize;
        loop {
            let Some(b) = self.peek() else {
                return Err(self.error("unterminated string"));
            };
            self.pos += 1;
            match b {
                b'(' => {
                    depth += 1;
                    out.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                    out.push(b);
                }
                b'\\' => self.escape(&mut out)?,
                _ => out.push(b),
            }
        }
    }

    fn escape(&mut self, out: &mut Vec<u8>) -> Result<(), SyntaxError> {
        let Some(b) = self.peek() else {
            return Err(self.error("unterminated string"));
        };
        self.pos += 1;
        match b {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'0'..=b'7' => {
                let mut value = u32::from(b - b'0');
                for _ in 0..2 {
                    match self.peek() {
                        Some(d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(d - b'0');
                            self.pos += 1;
                        }
                        _ => break,
                    }
                }
                out.push((value & 0xff) as u8);
            }
            // Line continuation.
            b'\r' => {
                if self.peek() == Some(b'\n') {
                    self.pos += 1;
                }
            }
            b'\n' => {}
            other => out.push(other),
        }
        Ok(())
    }

    fn hex_string(&mut self) -> Result<Vec<u8>, SyntaxError> {
        self.pos += 1;
        let mut digits = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated hex string")),
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b) if is_whitespace(b) => self.pos += 1,
                Some(b) => {
                    let nibble = (b as char)
                        .to_digit(16)
                        .ok_or_else(|| self.error("invalid hex digit"))?;
                    digits.push(nibble as u8);
                    self.pos += 1;
                }
            }
        }
        if digits.len() % 2 == 1 {
            digits.push(0);
        }
        Ok(digits.chunks_exact(2).map(|p| (p[0] << 4) | p[1]).collect())
    }

    fn array(&mut self, depth: usize) -> Result<Object, SyntaxError> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(self.error("unterminated array")),
                Some(b']') => {
                    self.pos += 1;
                    return Ok(Object::Array(items));
                }
                Some(_) => items.push(self.object(depth + 1)?),
            }
        }
    }

    fn dict(&mut self, depth: usize) -> Result<Dict, SyntaxError> {
        self.pos += 2;
        let mut entries = Vec::new();
        loop {
            self.skip_whitespace();
            match (self.peek(), self.peek_at(1)) {
                (None, _) => return Err(self.error("unterminated dictionary")),
                (Some(b'>'), Some(b'>')) => {
                    self.pos += 2;
                    return Ok(Dict(entries));
                }
                (Some(b'/'), _) => {
                    let key = self.name()?;
                    let value = self.object(depth + 1)?;
                    entries.push((key, value));
                }
                _ => return Err(self.error("dictionary key is not a name")),
            }
        }
    }

    fn number_or_ref(&mut self) -> Result<Object, SyntaxError> {
        let start = self.pos;
        self.pos += 1;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_digit() || b == b'.')
        {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.buf[start..self.pos])
            .map_err(|_| self.error("invalid number"))?;

        if text.contains('.') {
            return text
                .parse::<f64>()
                .map(Object::Real)
                .map_err(|_| self.error("invalid number"));
        }
        let n: i64 = text.parse().map_err(|_| self.error("invalid number"))?;

        // `N G R` is a reference; anything else leaves the cursor after N.
        if let Ok(num) = u32::try_from(n) {
            let after_num = self.pos;
            if let Ok(generation) = self.unsigned() {
                if self.keyword(b"R") {
                    if let Ok(generation) = u16::try_from(generation) {
                        return Ok(Object::Ref(num, generation));
                    }
                }
            }
            self.pos = after_num;
        }
        Ok(Object::Int(n))
    }
}

/// Last occurrence of `needle` in `haystack`.
pub fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|w| w == needle)
}
