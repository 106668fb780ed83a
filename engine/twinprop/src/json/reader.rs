use super::limits::ReaderLimits;
use super::token::TokenKind;
use super::unescape::Unescape;
use crate::error::{TwinError, TwinResult};

#[derive(Clone, Copy, Debug)]
struct Token {
    kind: TokenKind,
    start: usize,
    end: usize,
    escaped: bool,
}

impl Token {
    const NONE: Token = Token {
        kind: TokenKind::None,
        start: 0,
        end: 0,
        escaped: false,
    };
}

/// Pull reader over a JSON document held in an immutable buffer.
///
/// The reader validates grammar as it goes and exposes one token at a time.
/// String and property-name tokens are exposed as raw text without the
/// surrounding quotes; escapes are only decoded on demand by
/// [`text_equals`](Self::text_equals) and [`copy_unescaped`](Self::copy_unescaped).
#[derive(Clone, Debug)]
pub struct JsonReader<'a> {
    buffer: &'a [u8],
    pos: usize,
    token: Token,
    depth: usize,
    containers: u64,
    limits: ReaderLimits,
}

impl<'a> JsonReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self::with_limits(buffer, ReaderLimits::default())
    }

    pub fn with_limits(buffer: &'a [u8], limits: ReaderLimits) -> Self {
        Self {
            buffer,
            pos: 0,
            token: Token::NONE,
            depth: 0,
            containers: 0,
            limits,
        }
    }

    /// A reader over the same buffer, positioned before the first token.
    pub fn rewound(&self) -> Self {
        Self::with_limits(self.buffer, self.limits)
    }

    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    pub fn limits(&self) -> ReaderLimits {
        self.limits
    }

    pub fn token_kind(&self) -> TokenKind {
        self.token.kind
    }

    /// Raw text of the current token, without quotes for strings and names.
    pub fn token_bytes(&self) -> &'a [u8] {
        &self.buffer[self.token.start..self.token.end]
    }

    /// Raw text of the current token as UTF-8. Escape sequences are left as written.
    pub fn token_str(&self) -> TwinResult<&'a str> {
        std::str::from_utf8(self.token_bytes()).map_err(|_| TwinError::Malformed {
            offset: self.token.start,
            reason: "invalid utf-8 in token",
        })
    }

    /// Byte offset of the current token's text within the buffer.
    pub fn token_offset(&self) -> usize {
        self.token.start
    }

    /// Whether the current string or name token contains escape sequences.
    pub fn token_has_escapes(&self) -> bool {
        self.token.escaped
    }

    /// Number of currently open containers. A begin token counts as inside its
    /// container, the matching end token as outside it.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// True once the root value has been read completely.
    pub fn is_done(&self) -> bool {
        self.token.kind != TokenKind::None && self.depth == 0
    }

    pub fn next_token(&mut self) -> TwinResult<()> {
        if self.is_done() {
            self.skip_whitespace();
            if self.pos < self.buffer.len() {
                return Err(self.malformed(self.pos, "trailing characters after document"));
            }
            return Err(TwinError::ReaderDone);
        }
        self.skip_whitespace();
        match self.token.kind {
            TokenKind::None => self.read_value(),
            TokenKind::BeginObject => {
                if self.peek() == Some(b'}') {
                    self.close(b'}')
                } else {
                    self.read_property_name()
                }
            }
            TokenKind::BeginArray => {
                if self.peek() == Some(b']') {
                    self.close(b']')
                } else {
                    self.read_value()
                }
            }
            TokenKind::PropertyName => {
                if self.peek() != Some(b':') {
                    return Err(self.malformed(self.pos, "expected ':' after property name"));
                }
                self.pos += 1;
                self.skip_whitespace();
                self.read_value()
            }
            _ => self.read_after_value(),
        }
    }

    /// Moves past the children of the current container.
    ///
    /// On a property name the reader first steps onto its value. On a begin
    /// token it advances to the matching end token and rests there. Scalars are
    /// left as they are.
    pub fn skip_children(&mut self) -> TwinResult<()> {
        if self.token.kind == TokenKind::PropertyName {
            self.next_token()?;
        }
        if !self.token.kind.is_container_start() {
            return Ok(());
        }
        let target = self.depth - 1;
        loop {
            self.next_token()?;
            if self.token.kind.is_container_end() && self.depth == target {
                return Ok(());
            }
        }
    }

    /// Compares the unescaped text of the current token with `expected`.
    pub fn text_equals(&self, expected: &str) -> bool {
        match self.token.kind {
            TokenKind::PropertyName | TokenKind::String => {}
            TokenKind::Number | TokenKind::True | TokenKind::False | TokenKind::Null => {
                return self.token_bytes() == expected.as_bytes();
            }
            _ => return false,
        }
        if !self.token.escaped {
            return self.token_bytes() == expected.as_bytes();
        }
        let mut decoder = Unescape::new(self.token_bytes());
        let mut expected = expected.bytes();
        loop {
            match decoder.next_byte() {
                Ok(Some(byte)) => {
                    if expected.next() != Some(byte) {
                        return false;
                    }
                }
                Ok(None) => return expected.next().is_none(),
                Err(_) => return false,
            }
        }
    }

    /// Writes the unescaped text of the current string or name into `out` and
    /// returns the number of bytes written. Nothing is written when `out` is too small.
    pub fn copy_unescaped(&self, out: &mut [u8]) -> TwinResult<usize> {
        if !matches!(
            self.token.kind,
            TokenKind::PropertyName | TokenKind::String
        ) {
            return Err(self.unexpected("string"));
        }
        let mut needed = 0usize;
        let mut decoder = Unescape::new(self.token_bytes());
        while self.decode_next(&mut decoder)?.is_some() {
            needed += 1;
        }
        if needed > out.len() {
            return Err(TwinError::BufferTooSmall {
                needed,
                available: out.len(),
            });
        }
        let mut decoder = Unescape::new(self.token_bytes());
        let mut written = 0usize;
        while let Some(byte) = self.decode_next(&mut decoder)? {
            out[written] = byte;
            written += 1;
        }
        Ok(written)
    }

    pub fn read_i64(&self) -> TwinResult<i64> {
        self.expect_kind(TokenKind::Number, "number")?;
        parse_integer(self.token_bytes()).ok_or(TwinError::NumberOutOfRange(self.token.start))
    }

    pub fn read_i32(&self) -> TwinResult<i32> {
        let value = self.read_i64()?;
        i32::try_from(value).map_err(|_| TwinError::NumberOutOfRange(self.token.start))
    }

    pub fn read_u32(&self) -> TwinResult<u32> {
        let value = self.read_i64()?;
        u32::try_from(value).map_err(|_| TwinError::NumberOutOfRange(self.token.start))
    }

    pub fn read_f64(&self) -> TwinResult<f64> {
        self.expect_kind(TokenKind::Number, "number")?;
        let value: f64 = self
            .token_str()?
            .parse()
            .map_err(|_| TwinError::NumberOutOfRange(self.token.start))?;
        if !value.is_finite() {
            return Err(TwinError::NumberOutOfRange(self.token.start));
        }
        Ok(value)
    }

    pub fn read_bool(&self) -> TwinResult<bool> {
        match self.token.kind {
            TokenKind::True => Ok(true),
            TokenKind::False => Ok(false),
            _ => Err(self.unexpected("boolean")),
        }
    }

    pub(crate) fn unexpected(&self, expected: &'static str) -> TwinError {
        TwinError::UnexpectedToken {
            offset: self.token.start,
            expected,
            found: self.token.kind,
        }
    }

    fn expect_kind(&self, kind: TokenKind, expected: &'static str) -> TwinResult<()> {
        if self.token.kind != kind {
            return Err(self.unexpected(expected));
        }
        Ok(())
    }

    fn decode_next(&self, decoder: &mut Unescape<'_>) -> TwinResult<Option<u8>> {
        decoder.next_byte().map_err(|reason| TwinError::Malformed {
            offset: self.token.start,
            reason,
        })
    }

    fn read_after_value(&mut self) -> TwinResult<()> {
        match self.peek() {
            Some(b',') => {
                self.pos += 1;
                self.skip_whitespace();
                if self.in_object() {
                    self.read_property_name()
                } else {
                    self.read_value()
                }
            }
            Some(byte @ (b'}' | b']')) => self.close(byte),
            Some(_) => Err(self.malformed(self.pos, "expected ',' or a closing bracket")),
            None => Err(self.malformed(self.pos, "unexpected end of input")),
        }
    }

    fn read_value(&mut self) -> TwinResult<()> {
        let start = self.pos;
        match self.peek() {
            Some(b'{') => self.open(true),
            Some(b'[') => self.open(false),
            Some(b'"') => {
                let (end, escaped) = self.scan_string()?;
                self.set_token(TokenKind::String, start + 1, end, escaped);
                Ok(())
            }
            Some(b'-' | b'0'..=b'9') => self.read_number(),
            Some(b't') => self.read_literal(b"true", TokenKind::True),
            Some(b'f') => self.read_literal(b"false", TokenKind::False),
            Some(b'n') => self.read_literal(b"null", TokenKind::Null),
            Some(_) => Err(self.malformed(start, "expected a value")),
            None => Err(self.malformed(start, "unexpected end of input")),
        }
    }

    fn read_property_name(&mut self) -> TwinResult<()> {
        let start = self.pos;
        if self.peek() != Some(b'"') {
            return Err(self.malformed(start, "expected a property name"));
        }
        let (end, escaped) = self.scan_string()?;
        self.set_token(TokenKind::PropertyName, start + 1, end, escaped);
        Ok(())
    }

    /// Scans a quoted string starting at the opening quote. Returns the offset
    /// of the closing quote and whether any escapes were seen.
    fn scan_string(&mut self) -> TwinResult<(usize, bool)> {
        self.pos += 1;
        let mut escaped = false;
        loop {
            match self.peek() {
                None => return Err(self.malformed(self.pos, "unterminated string")),
                Some(b'"') => {
                    let end = self.pos;
                    self.pos += 1;
                    return Ok((end, escaped));
                }
                Some(b'\\') => {
                    escaped = true;
                    let escape_at = self.pos;
                    self.pos += 1;
                    match self.peek() {
                        Some(b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't') => {
                            self.pos += 1;
                        }
                        Some(b'u') => {
                            self.pos += 1;
                            for _ in 0..4 {
                                match self.peek() {
                                    Some(digit) if digit.is_ascii_hexdigit() => self.pos += 1,
                                    _ => {
                                        return Err(self.malformed(escape_at, "invalid \\u escape"))
                                    }
                                }
                            }
                        }
                        _ => return Err(self.malformed(escape_at, "invalid escape sequence")),
                    }
                }
                Some(byte) if byte < 0x20 => {
                    return Err(self.malformed(self.pos, "control character in string"));
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn read_number(&mut self) -> TwinResult<()> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        match self.peek() {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => self.skip_digits(),
            _ => return Err(self.malformed(start, "invalid number")),
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            if !self.peek().is_some_and(|b| b.is_ascii_digit()) {
                return Err(self.malformed(start, "invalid number"));
            }
            self.skip_digits();
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if !self.peek().is_some_and(|b| b.is_ascii_digit()) {
                return Err(self.malformed(start, "invalid number"));
            }
            self.skip_digits();
        }
        self.expect_delimiter(start, "invalid number")?;
        self.set_token(TokenKind::Number, start, self.pos, false);
        Ok(())
    }

    fn read_literal(&mut self, literal: &'static [u8], kind: TokenKind) -> TwinResult<()> {
        let start = self.pos;
        if !self.buffer[start..].starts_with(literal) {
            return Err(self.malformed(start, "invalid literal"));
        }
        self.pos += literal.len();
        self.expect_delimiter(start, "invalid literal")?;
        self.set_token(kind, start, self.pos, false);
        Ok(())
    }

    fn expect_delimiter(&self, start: usize, reason: &'static str) -> TwinResult<()> {
        match self.peek() {
            None | Some(b' ' | b'\t' | b'\n' | b'\r' | b',' | b'}' | b']') => Ok(()),
            Some(_) => Err(self.malformed(start, reason)),
        }
    }

    fn open(&mut self, is_object: bool) -> TwinResult<()> {
        if self.depth >= self.limits.max_depth() {
            return Err(TwinError::NestingTooDeep(self.limits.max_depth()));
        }
        let bit = 1u64 << self.depth;
        if is_object {
            self.containers |= bit;
        } else {
            self.containers &= !bit;
        }
        self.depth += 1;
        let start = self.pos;
        self.pos += 1;
        let kind = if is_object {
            TokenKind::BeginObject
        } else {
            TokenKind::BeginArray
        };
        self.set_token(kind, start, self.pos, false);
        Ok(())
    }

    fn close(&mut self, byte: u8) -> TwinResult<()> {
        let start = self.pos;
        let is_object = byte == b'}';
        if self.depth == 0 || self.in_object() != is_object {
            return Err(self.malformed(start, "mismatched closing bracket"));
        }
        self.depth -= 1;
        self.pos += 1;
        let kind = if is_object {
            TokenKind::EndObject
        } else {
            TokenKind::EndArray
        };
        self.set_token(kind, start, self.pos, false);
        Ok(())
    }

    fn in_object(&self) -> bool {
        self.depth > 0 && self.containers & (1u64 << (self.depth - 1)) != 0
    }

    fn set_token(&mut self, kind: TokenKind, start: usize, end: usize, escaped: bool) {
        self.token = Token {
            kind,
            start,
            end,
            escaped,
        };
    }

    fn skip_digits(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.buffer.get(self.pos).copied()
    }

    fn malformed(&self, offset: usize, reason: &'static str) -> TwinError {
        TwinError::Malformed { offset, reason }
    }
}

fn parse_integer(bytes: &[u8]) -> Option<i64> {
    let (negative, digits) = match bytes.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, bytes),
    };
    if digits.is_empty() {
        return None;
    }
    let mut value = 0i64;
    for &digit in digits {
        if !digit.is_ascii_digit() {
            return None;
        }
        let digit = i64::from(digit - b'0');
        value = value.checked_mul(10)?;
        value = if negative {
            value.checked_sub(digit)?
        } else {
            value.checked_add(digit)?
        };
    }
    Some(value)
}
