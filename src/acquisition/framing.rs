//! Line Framing
//!
//! Reassembles newline-delimited meter output from arbitrary read chunks.
//! Serial reads return whatever happens to be in the OS buffer, so a single
//! reading may arrive split across several reads, or several readings may
//! arrive in one.
//!
//! # Example
//!
//! ```rust,ignore
//! use ec_daq::acquisition::LineFramer;
//!
//! let mut framer = LineFramer::new(4096);
//! framer.push(b"14");
//! framer.push(b"13 uS/cm\r\n");
//! assert_eq!(framer.next_line().as_deref(), Some("1413 uS/cm"));
//! ```

use bytes::BytesMut;
use tracing::warn;

/// Accumulates raw serial bytes and yields complete lines.
///
/// Lines are terminated by `\n`; a preceding `\r` is stripped. Input that
/// grows past `max_line_bytes` without a terminator is discarded wholesale,
/// so a meter stuck streaming garbage cannot grow the buffer without bound.
pub struct LineFramer {
    buf: BytesMut,
    max_line_bytes: usize,
}

impl LineFramer {
    /// Create a framer that tolerates unterminated input up to
    /// `max_line_bytes` before discarding it.
    pub fn new(max_line_bytes: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(max_line_bytes.min(4096)),
            max_line_bytes,
        }
    }

    /// Append a read chunk to the buffer.
    ///
    /// If the buffer exceeds the configured limit without containing a single
    /// newline, the whole buffer is dropped and framing resumes from the next
    /// chunk.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);

        if self.buf.len() > self.max_line_bytes && !self.buf.contains(&b'\n') {
            warn!(
                discarded_bytes = self.buf.len(),
                limit = self.max_line_bytes,
                "Unterminated serial input exceeded the line buffer, discarding"
            );
            self.buf.clear();
        }
    }

    /// Take the next complete line, without its terminator.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; meters occasionally
    /// emit stray bytes mid-line and a reading should survive them.
    pub fn next_line(&mut self) -> Option<String> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let mut line = self.buf.split_to(pos + 1);
        line.truncate(line.len() - 1);
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Bytes currently buffered without a terminator.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassembles_lines_split_across_chunks() {
        let mut framer = LineFramer::new(4096);
        framer.push(b"14");
        assert_eq!(framer.next_line(), None);
        framer.push(b"13 uS/cm\n205");
        assert_eq!(framer.next_line().as_deref(), Some("1413 uS/cm"));
        assert_eq!(framer.next_line(), None);
        framer.push(b".3 mS/cm\n");
        assert_eq!(framer.next_line().as_deref(), Some("205.3 mS/cm"));
    }

    #[test]
    fn drains_multiple_lines_from_one_chunk_in_order() {
        let mut framer = LineFramer::new(4096);
        framer.push(b"100.0 uS/cm\r\ngarbage\r\n205.3 mS/cm\r\n");
        assert_eq!(framer.next_line().as_deref(), Some("100.0 uS/cm"));
        assert_eq!(framer.next_line().as_deref(), Some("garbage"));
        assert_eq!(framer.next_line().as_deref(), Some("205.3 mS/cm"));
        assert_eq!(framer.next_line(), None);
    }

    #[test]
    fn strips_crlf_and_bare_lf_terminators() {
        let mut framer = LineFramer::new(4096);
        framer.push(b"1413 uS/cm\r\n890 uS/cm\n");
        assert_eq!(framer.next_line().as_deref(), Some("1413 uS/cm"));
        assert_eq!(framer.next_line().as_deref(), Some("890 uS/cm"));
    }

    #[test]
    fn unterminated_overflow_is_discarded_and_framing_recovers() {
        let mut framer = LineFramer::new(16);
        framer.push(b"xxxxxxxxxxxxxxxxxxxxxxxx");
        assert_eq!(framer.pending(), 0);
        framer.push(b"1413 uS/cm\n");
        assert_eq!(framer.next_line().as_deref(), Some("1413 uS/cm"));
    }

    #[test]
    fn oversized_input_with_a_terminator_is_kept() {
        let mut framer = LineFramer::new(8);
        framer.push(b"long line\nshort\n");
        assert_eq!(framer.next_line().as_deref(), Some("long line"));
        assert_eq!(framer.next_line().as_deref(), Some("short"));
    }

    #[test]
    fn invalid_utf8_does_not_panic() {
        let mut framer = LineFramer::new(4096);
        framer.push(b"\xff\xfe1413 uS/cm\n");
        let line = framer.next_line().unwrap();
        assert!(line.contains("1413 uS/cm"));
    }

    #[test]
    fn empty_lines_are_yielded_as_empty_strings() {
        let mut framer = LineFramer::new(4096);
        framer.push(b"\r\n\n");
        assert_eq!(framer.next_line().as_deref(), Some(""));
        assert_eq!(framer.next_line().as_deref(), Some(""));
        assert_eq!(framer.next_line(), None);
    }
}
