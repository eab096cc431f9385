//! Line framing: reassemble arbitrary byte chunks into complete text lines.
//!
//! The answer body arrives in reads whose boundaries carry no meaning. A
//! single read may hold several lines, half a line, or even half of a
//! multi-byte UTF-8 character. [`LineFramer`] keeps both the incomplete
//! trailing line and any incomplete UTF-8 tail until the next read completes
//! them, and only ever hands out whole lines.

/// Incremental `\n`-delimited line splitter over raw bytes.
#[derive(Debug, Default)]
pub struct LineFramer {
    /// Bytes of a UTF-8 sequence cut off at the end of the previous chunk.
    utf8_tail: Vec<u8>,
    /// Decoded text after the last newline seen so far.
    partial_line: String,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns every line completed by it, without the
    /// terminating `\n` (and without a trailing `\r`).
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let text = self.decode(bytes);
        self.partial_line.push_str(&text);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.partial_line[start..].find('\n') {
            let end = start + offset;
            let mut line = self.partial_line[start..end].to_string();
            strip_cr(&mut line);
            lines.push(line);
            start = end + 1;
        }
        self.partial_line.drain(..start);
        lines
    }

    /// Flush whatever is left once the stream has ended.
    ///
    /// Returns the residual unterminated line, if it is non-empty.
    pub fn finish(&mut self) -> Option<String> {
        if !self.utf8_tail.is_empty() {
            let tail = std::mem::take(&mut self.utf8_tail);
            self.partial_line.push_str(&String::from_utf8_lossy(&tail));
        }
        let mut line = std::mem::take(&mut self.partial_line);
        strip_cr(&mut line);
        if line.is_empty() {
            None
        } else {
            Some(line)
        }
    }

    /// Number of bytes currently held back waiting for more input.
    pub fn buffered_len(&self) -> usize {
        self.utf8_tail.len() + self.partial_line.len()
    }

    /// Decode `bytes` prefixed by any carried-over UTF-8 tail.
    ///
    /// Invalid sequences become U+FFFD; an incomplete sequence at the very
    /// end is kept for the next call.
    fn decode(&mut self, bytes: &[u8]) -> String {
        let mut buf = std::mem::take(&mut self.utf8_tail);
        buf.extend_from_slice(bytes);

        let mut out = String::with_capacity(buf.len());
        let mut rest: &[u8] = &buf;
        loop {
            match std::str::from_utf8(rest) {
                Ok(s) => {
                    out.push_str(s);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    // `valid_up_to` guarantees this prefix is UTF-8.
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(n) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[n..];
                        }
                        None => {
                            self.utf8_tail = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }
}

fn strip_cr(line: &mut String) {
    if line.ends_with('\r') {
        line.pop();
    }
}
