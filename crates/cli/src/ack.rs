use std::io::{self, Write};

use serde_json::Value;

/// Writes the hook acknowledgment when dropped.
///
/// Held for the whole hook run so the host gets its response on every exit
/// path, unwinding included. Write errors are ignored.
pub struct Acknowledgment<W: Write> {
    out: W,
    body: Value,
}

impl Acknowledgment<io::Stdout> {
    pub fn stdout(body: Value) -> Self {
        Self::new(io::stdout(), body)
    }
}

impl<W: Write> Acknowledgment<W> {
    pub fn new(out: W, body: Value) -> Self {
        Self { out, body }
    }
}

impl<W: Write> Drop for Acknowledgment<W> {
    fn drop(&mut self) {
        let _ = writeln!(self.out, "{}", self.body);
        let _ = self.out.flush();
    }
}
