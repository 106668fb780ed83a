/// Byte-at-a-time decoder for the raw text of an escaped JSON string.
///
/// The reader has already checked escape syntax, so the only failure left is a
/// `\u` escape that does not form a valid scalar value (lone surrogates).
pub(crate) struct Unescape<'a> {
    raw: &'a [u8],
    pos: usize,
    pending: [u8; 4],
    pending_len: usize,
    pending_idx: usize,
}

impl<'a> Unescape<'a> {
    pub(crate) fn new(raw: &'a [u8]) -> Self {
        Self {
            raw,
            pos: 0,
            pending: [0; 4],
            pending_len: 0,
            pending_idx: 0,
        }
    }

    pub(crate) fn next_byte(&mut self) -> Result<Option<u8>, &'static str> {
        if self.pending_idx < self.pending_len {
            let byte = self.pending[self.pending_idx];
            self.pending_idx += 1;
            return Ok(Some(byte));
        }
        let Some(&byte) = self.raw.get(self.pos) else {
            return Ok(None);
        };
        if byte != b'\\' {
            self.pos += 1;
            return Ok(Some(byte));
        }
        let escape = self.raw.get(self.pos + 1).copied();
        self.pos += 2;
        let decoded = match escape {
            Some(b'"') => b'"',
            Some(b'\\') => b'\\',
            Some(b'/') => b'/',
            Some(b'b') => 0x08,
            Some(b'f') => 0x0c,
            Some(b'n') => b'\n',
            Some(b'r') => b'\r',
            Some(b't') => b'\t',
            Some(b'u') => return self.decode_unicode().map(Some),
            _ => return Err("invalid escape sequence"),
        };
        Ok(Some(decoded))
    }

    fn decode_unicode(&mut self) -> Result<u8, &'static str> {
        let high = hex4(self.raw.get(self.pos..self.pos + 4)).ok_or("invalid \\u escape")?;
        self.pos += 4;
        let scalar = match high {
            0xd800..=0xdbff => {
                if self.raw.get(self.pos..self.pos + 2) != Some(b"\\u".as_slice()) {
                    return Err("unpaired surrogate");
                }
                let low = hex4(self.raw.get(self.pos + 2..self.pos + 6))
                    .ok_or("invalid \\u escape")?;
                if !(0xdc00..=0xdfff).contains(&low) {
                    return Err("unpaired surrogate");
                }
                self.pos += 6;
                0x10000 + ((high - 0xd800) << 10) + (low - 0xdc00)
            }
            0xdc00..=0xdfff => return Err("unpaired surrogate"),
            other => other,
        };
        let ch = char::from_u32(scalar).ok_or("invalid \\u escape")?;
        let encoded = ch.encode_utf8(&mut self.pending);
        self.pending_len = encoded.len();
        self.pending_idx = 1;
        Ok(self.pending[0])
    }
}

fn hex4(digits: Option<&[u8]>) -> Option<u32> {
    let digits = digits?;
    let mut value = 0u32;
    for &digit in digits {
        let nibble = match digit {
            b'0'..=b'9' => digit - b'0',
            b'a'..=b'f' => digit - b'a' + 10,
            b'A'..=b'F' => digit - b'A' + 10,
            _ => return None,
        };
        value = (value << 4) | u32::from(nibble);
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(raw: &[u8]) -> Result<Vec<u8>, &'static str> {
        let mut out = Vec::new();
        let mut decoder = Unescape::new(raw);
        while let Some(byte) = decoder.next_byte()? {
            out.push(byte);
        }
        Ok(out)
    }

    #[test]
    fn simple_escapes() {
        assert_eq!(decode(br#"a\"b\\c\/d\n\t"#).unwrap(), b"a\"b\\c/d\n\t");
    }

    #[test]
    fn unicode_escapes() {
        assert_eq!(decode(br"\u00e9").unwrap(), "é".as_bytes());
        assert_eq!(decode(br"\ud83d\ude00").unwrap(), "😀".as_bytes());
    }

    #[test]
    fn lone_surrogates_fail() {
        assert!(decode(br"\ud83d").is_err());
        assert!(decode(br"\ude00x").is_err());
    }
}
