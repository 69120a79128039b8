use bytes::{Buf, BytesMut};

/// Splits a raw serial byte stream into newline-terminated text lines.
///
/// Bytes after the last `\n` are kept until a later `feed` completes them.
/// Returned lines have the delimiter removed and surrounding whitespace
/// (including a trailing `\r`) trimmed.
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: BytesMut,
    limit: Option<usize>,
    discarding: bool,
    overflows: u64,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Framer that drops a partial line once it grows past `limit` bytes and
    /// skips input until the next newline.
    pub fn with_limit(limit: usize) -> Self {
        Self { limit: Some(limit), ..Self::default() }
    }

    /// Appends `data` and returns the lines it completes.
    ///
    /// Lines left unconsumed in the iterator stay buffered and come out of
    /// the next call.
    pub fn feed(&mut self, data: &[u8]) -> Lines<'_> {
        self.buf.extend_from_slice(data);
        Lines { framer: self }
    }

    /// Bytes retained while waiting for a line terminator.
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }

    pub fn discard_pending(&mut self) {
        self.buf.clear();
    }

    /// Number of partial lines dropped because they exceeded the limit.
    pub fn overflow_count(&self) -> u64 {
        self.overflows
    }

    fn next_line(&mut self) -> Option<String> {
        loop {
            let newline = self.buf.iter().position(|b| *b == b'\n');

            if self.discarding {
                match newline {
                    Some(pos) => {
                        self.buf.advance(pos + 1);
                        self.discarding = false;
                        continue;
                    }
                    None => {
                        self.buf.clear();
                        return None;
                    }
                }
            }

            let Some(pos) = newline else {
                if let Some(limit) = self.limit {
                    if self.buf.len() > limit {
                        self.buf.clear();
                        self.discarding = true;
                        self.overflows += 1;
                    }
                }
                return None;
            };

            let raw = self.buf.split_to(pos + 1);
            let text = String::from_utf8_lossy(&raw[..pos]);
            return Some(text.trim().to_string());
        }
    }
}

/// Iterator over the lines completed by one [`LineFramer::feed`] call.
pub struct Lines<'a> {
    framer: &'a mut LineFramer,
}

impl Iterator for Lines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.framer.next_line()
    }
}
