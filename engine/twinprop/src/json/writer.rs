use super::limits::MAX_NESTING_DEPTH;
use crate::error::{TwinError, TwinResult};

/// Saved writer position. Restoring it discards everything appended since.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Checkpoint {
    len: usize,
    depth: usize,
    containers: u64,
    needs_comma: bool,
    after_name: bool,
    root_written: bool,
}

/// Push writer that appends JSON tokens into a caller-owned buffer.
///
/// Every append is atomic: space is checked before the first byte goes out,
/// so a failed append leaves [`as_bytes`](Self::as_bytes) unchanged.
#[derive(Debug)]
pub struct JsonWriter<'b> {
    buffer: &'b mut [u8],
    len: usize,
    depth: usize,
    containers: u64,
    needs_comma: bool,
    after_name: bool,
    root_written: bool,
}

impl<'b> JsonWriter<'b> {
    pub fn new(buffer: &'b mut [u8]) -> Self {
        Self {
            buffer,
            len: 0,
            depth: 0,
            containers: 0,
            needs_comma: false,
            after_name: false,
            root_written: false,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    /// Output as text. Only whole `&str` inputs and ASCII punctuation are
    /// ever appended, so the output is always valid UTF-8.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.len
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn begin_object(&mut self) -> TwinResult<()> {
        self.open(true)
    }

    pub fn end_object(&mut self) -> TwinResult<()> {
        self.close(true)
    }

    pub fn begin_array(&mut self) -> TwinResult<()> {
        self.open(false)
    }

    pub fn end_array(&mut self) -> TwinResult<()> {
        self.close(false)
    }

    /// Appends `"name":`. The next append must be the property's value.
    pub fn property_name(&mut self, name: &str) -> TwinResult<()> {
        if !self.in_object() || self.after_name {
            return Err(TwinError::InvalidWriterState("a property name"));
        }
        let comma = usize::from(self.needs_comma);
        self.reserve(comma + escaped_len(name) + 3)?;
        if self.needs_comma {
            self.push(b',');
        }
        self.push_escaped(name);
        self.push(b':');
        self.needs_comma = false;
        self.after_name = true;
        Ok(())
    }

    pub fn string(&mut self, value: &str) -> TwinResult<()> {
        self.check_value("a string")?;
        let comma = self.value_comma();
        self.reserve(comma + escaped_len(value) + 2)?;
        if comma == 1 {
            self.push(b',');
        }
        self.push_escaped(value);
        self.value_written();
        Ok(())
    }

    pub fn int32(&mut self, value: i32) -> TwinResult<()> {
        self.int64(i64::from(value))
    }

    pub fn int64(&mut self, value: i64) -> TwinResult<()> {
        let mut scratch = [0u8; 20];
        let digits = format_i64(value, &mut scratch);
        self.scalar("a number", digits)
    }

    pub fn bool(&mut self, value: bool) -> TwinResult<()> {
        let literal: &[u8] = if value { b"true" } else { b"false" };
        self.scalar("a boolean", literal)
    }

    pub fn null(&mut self) -> TwinResult<()> {
        self.scalar("null", b"null")
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            len: self.len,
            depth: self.depth,
            containers: self.containers,
            needs_comma: self.needs_comma,
            after_name: self.after_name,
            root_written: self.root_written,
        }
    }

    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        self.len = checkpoint.len;
        self.depth = checkpoint.depth;
        self.containers = checkpoint.containers;
        self.needs_comma = checkpoint.needs_comma;
        self.after_name = checkpoint.after_name;
        self.root_written = checkpoint.root_written;
    }

    fn open(&mut self, is_object: bool) -> TwinResult<()> {
        self.check_value(if is_object { "an object" } else { "an array" })?;
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(TwinError::NestingTooDeep(MAX_NESTING_DEPTH));
        }
        let comma = self.value_comma();
        self.reserve(comma + 1)?;
        if comma == 1 {
            self.push(b',');
        }
        self.push(if is_object { b'{' } else { b'[' });
        let bit = 1u64 << self.depth;
        if is_object {
            self.containers |= bit;
        } else {
            self.containers &= !bit;
        }
        self.depth += 1;
        self.needs_comma = false;
        self.after_name = false;
        Ok(())
    }

    fn close(&mut self, is_object: bool) -> TwinResult<()> {
        if self.depth == 0 || self.in_object() != is_object || self.after_name {
            return Err(TwinError::InvalidWriterState(if is_object {
                "the end of an object"
            } else {
                "the end of an array"
            }));
        }
        self.reserve(1)?;
        self.push(if is_object { b'}' } else { b']' });
        self.depth -= 1;
        self.value_written();
        Ok(())
    }

    fn scalar(&mut self, what: &'static str, text: &[u8]) -> TwinResult<()> {
        self.check_value(what)?;
        let comma = self.value_comma();
        self.reserve(comma + text.len())?;
        if comma == 1 {
            self.push(b',');
        }
        self.buffer[self.len..self.len + text.len()].copy_from_slice(text);
        self.len += text.len();
        self.value_written();
        Ok(())
    }

    fn check_value(&self, what: &'static str) -> TwinResult<()> {
        let allowed = if self.after_name {
            true
        } else if self.depth == 0 {
            !self.root_written
        } else {
            !self.in_object()
        };
        if !allowed {
            return Err(TwinError::InvalidWriterState(what));
        }
        Ok(())
    }

    fn value_comma(&self) -> usize {
        usize::from(self.needs_comma && !self.after_name)
    }

    fn value_written(&mut self) {
        self.needs_comma = true;
        self.after_name = false;
        if self.depth == 0 {
            self.root_written = true;
        }
    }

    fn in_object(&self) -> bool {
        self.depth > 0 && self.containers & (1u64 << (self.depth - 1)) != 0
    }

    fn reserve(&self, needed: usize) -> TwinResult<()> {
        let available = self.remaining();
        if needed > available {
            return Err(TwinError::BufferTooSmall { needed, available });
        }
        Ok(())
    }

    fn push(&mut self, byte: u8) {
        self.buffer[self.len] = byte;
        self.len += 1;
    }

    fn push_escaped(&mut self, text: &str) {
        self.push(b'"');
        for &byte in text.as_bytes() {
            match byte {
                b'"' => self.push_pair(b'"'),
                b'\\' => self.push_pair(b'\\'),
                b'\n' => self.push_pair(b'n'),
                b'\r' => self.push_pair(b'r'),
                b'\t' => self.push_pair(b't'),
                0x08 => self.push_pair(b'b'),
                0x0c => self.push_pair(b'f'),
                0x00..=0x1f => {
                    const HEX: &[u8; 16] = b"0123456789abcdef";
                    for out in [
                        b'\\',
                        b'u',
                        b'0',
                        b'0',
                        HEX[usize::from(byte >> 4)],
                        HEX[usize::from(byte & 0x0f)],
                    ] {
                        self.push(out);
                    }
                }
                _ => self.push(byte),
            }
        }
        self.push(b'"');
    }

    fn push_pair(&mut self, escape: u8) {
        self.push(b'\\');
        self.push(escape);
    }
}

/// Length of `text` once escaped, without the surrounding quotes.
fn escaped_len(text: &str) -> usize {
    text.bytes()
        .map(|byte| match byte {
            b'"' | b'\\' | b'\n' | b'\r' | b'\t' | 0x08 | 0x0c => 2,
            0x00..=0x1f => 6,
            _ => 1,
        })
        .sum()
}

fn format_i64(value: i64, scratch: &mut [u8; 20]) -> &[u8] {
    let mut magnitude = value.unsigned_abs();
    let mut start = scratch.len();
    loop {
        start -= 1;
        scratch[start] = b'0' + (magnitude % 10) as u8;
        magnitude /= 10;
        if magnitude == 0 {
            break;
        }
    }
    if value < 0 {
        start -= 1;
        scratch[start] = b'-';
    }
    &scratch[start..]
}
