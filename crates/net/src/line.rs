/// Lines longer than this are truncated rather than buffered forever.
const MAX_LINE_LEN: usize = 1024;

/// Accumulates raw socket bytes and yields complete lines. CR is dropped,
/// LF terminates a line, and invalid UTF-8 is replaced rather than refused.
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Feed raw data. Returns any complete lines.
    pub fn feed(&mut self, data: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in data {
            match byte {
                b'\n' => lines.push(self.take_line()),
                b'\r' => {}
                _ => {
                    if self.buf.len() < MAX_LINE_LEN {
                        self.buf.push(byte);
                    }
                    // Bytes beyond the cap are dropped silently.
                }
            }
        }
        lines
    }

    fn take_line(&mut self) -> String {
        let bytes = std::mem::take(&mut self.buf);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}
