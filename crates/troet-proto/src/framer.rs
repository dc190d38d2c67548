//! Line framing for a streamed transport.
//!
//! A TCP/TLS read returns whatever bytes happen to be available, which rarely
//! lines up with protocol lines. [`LineFramer`] accumulates those chunks and
//! yields only complete, CR-LF terminated lines. Anything after the last
//! terminator is kept as the leftover fragment and prefixed to the next chunk.

use bytes::{Bytes, BytesMut};

use crate::error::{ProtocolError, Result};

/// The IRC line terminator.
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// Default upper bound on an unterminated fragment.
///
/// A 512 byte line plus 8191 bytes of IRCv3 tags is the largest legitimate
/// line; anything far beyond that is a misbehaving peer.
pub const DEFAULT_MAX_BUFFERED: usize = 16 * 1024;

/// Splits a byte stream into CR-LF terminated lines.
///
/// Lines are returned without their terminator. Bytes are never dropped: every
/// byte pushed is either part of a returned line, part of a consumed
/// terminator, or still held in [`leftover`](Self::leftover).
#[derive(Debug)]
pub struct LineFramer {
    buf: BytesMut,
    max_buffered: usize,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineFramer {
    /// Create a framer with the [default](DEFAULT_MAX_BUFFERED) fragment limit.
    pub fn new() -> Self {
        Self::with_max_buffered(DEFAULT_MAX_BUFFERED)
    }

    /// Create a framer that rejects unterminated fragments longer than
    /// `max_buffered` bytes.
    pub fn with_max_buffered(max_buffered: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max_buffered,
        }
    }

    /// Feed newly read bytes and return every line completed by them.
    ///
    /// An empty chunk (a read that timed out) yields no lines and leaves the
    /// leftover untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::BufferOverflow`] when the unterminated
    /// remainder grows past the configured limit. The buffer is cleared and
    /// complete lines found in this chunk are discarded.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Bytes>> {
        if chunk.is_empty() {
            return Ok(Vec::new());
        }

        // A terminator may straddle the previous chunk and this one, so the
        // search restarts one byte before the old end.
        let mut scan_from = self.buf.len().saturating_sub(LINE_TERMINATOR.len() - 1);
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(offset) = find_terminator(&self.buf[scan_from..]) {
            let end = scan_from + offset;
            let mut line = self.buf.split_to(end + LINE_TERMINATOR.len());
            line.truncate(end);
            lines.push(line.freeze());
            scan_from = 0;
        }

        if self.buf.len() > self.max_buffered {
            let buffered = self.buf.len();
            self.buf.clear();
            return Err(ProtocolError::BufferOverflow {
                buffered,
                limit: self.max_buffered,
            });
        }

        Ok(lines)
    }

    /// The incomplete trailing fragment held back from previous chunks.
    pub fn leftover(&self) -> &[u8] {
        &self.buf
    }

    /// Discard any held-back fragment, e.g. after the transport was replaced.
    pub fn reset(&mut self) {
        self.buf.clear();
    }
}

fn find_terminator(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(LINE_TERMINATOR.len())
        .position(|window| window == LINE_TERMINATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(lines: Vec<Bytes>) -> Vec<String> {
        lines
            .into_iter()
            .map(|l| String::from_utf8(l.to_vec()).unwrap())
            .collect()
    }

    #[test]
    fn test_single_complete_line() {
        let mut framer = LineFramer::new();
        let lines = framer.push(b"PING :irc.example\r\n").unwrap();
        assert_eq!(strings(lines), vec!["PING :irc.example"]);
        assert!(framer.leftover().is_empty());
    }

    #[test]
    fn test_partial_line_is_held_back() {
        let mut framer = LineFramer::new();
        let lines = framer.push(b"PING :a\r\nPRIVMSG #t").unwrap();
        assert_eq!(strings(lines), vec!["PING :a"]);
        assert_eq!(framer.leftover(), b"PRIVMSG #t");

        let lines = framer.push(b"roet :hi\r\n").unwrap();
        assert_eq!(strings(lines), vec!["PRIVMSG #troet :hi"]);
        assert!(framer.leftover().is_empty());
    }

    #[test]
    fn test_empty_read_leaves_leftover_untouched() {
        let mut framer = LineFramer::new();
        framer.push(b"NOTICE").unwrap();
        let lines = framer.push(b"").unwrap();
        assert!(lines.is_empty());
        assert_eq!(framer.leftover(), b"NOTICE");
    }

    #[test]
    fn test_terminator_split_across_reads() {
        let mut framer = LineFramer::new();
        assert!(framer.push(b"PING :x\r").unwrap().is_empty());
        assert_eq!(framer.leftover(), b"PING :x\r");

        let lines = framer.push(b"\n").unwrap();
        assert_eq!(strings(lines), vec!["PING :x"]);
        assert!(framer.leftover().is_empty());
    }

    #[test]
    fn test_one_byte_chunks() {
        let mut framer = LineFramer::new();
        let mut lines = Vec::new();
        for b in b"A\r\nB\r\n\r\nC" {
            lines.extend(framer.push(std::slice::from_ref(b)).unwrap());
        }
        assert_eq!(strings(lines), vec!["A", "B", ""]);
        assert_eq!(framer.leftover(), b"C");
    }

    #[test]
    fn test_bare_lf_is_not_a_terminator() {
        let mut framer = LineFramer::new();
        let lines = framer.push(b"one\ntwo\r\n").unwrap();
        assert_eq!(strings(lines), vec!["one\ntwo"]);
    }

    #[test]
    fn test_overflow_is_reported() {
        let mut framer = LineFramer::with_max_buffered(8);
        let err = framer.push(b"0123456789").unwrap_err();
        assert_eq!(
            err,
            ProtocolError::BufferOverflow {
                buffered: 10,
                limit: 8
            }
        );
        assert!(framer.leftover().is_empty());
    }

    #[test]
    fn test_reset_discards_fragment() {
        let mut framer = LineFramer::new();
        framer.push(b":old.server 00").unwrap();
        framer.reset();
        let lines = framer.push(b"PING :new\r\n").unwrap();
        assert_eq!(strings(lines), vec!["PING :new"]);
    }
}
