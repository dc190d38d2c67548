//! Pending outbound queue.
//!
//! Any task may push fully formatted protocol lines; only the connection
//! lifecycle pops them, during its drain phase. Pushing never touches the
//! network, so a dead link cannot stall application logic.
//!
//! Lines travel in two lanes. The control lane carries registration and
//! keep-alive traffic (NICK, USER, PONG, JOIN, QUIT). It is small, never
//! evicted, always drained first, and belongs to the current connection:
//! a reconnect discards whatever is left in it. The text lane carries chat
//! output. It survives reconnects, is only released once the client is in
//! the channel, and is bounded: when full, the oldest text line is
//! discarded.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::warn;

/// Which lane a line travels in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    Control,
    Text,
}

#[derive(Debug, Default)]
struct Lanes {
    control: VecDeque<String>,
    text: VecDeque<String>,
}

/// Two-lane FIFO of outbound protocol lines, without terminators.
#[derive(Clone, Debug)]
pub struct Outbox {
    inner: Arc<Mutex<Lanes>>,
    capacity: usize,
}

impl Outbox {
    /// Create a queue holding at most `capacity` text lines (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Mutex::new(Lanes {
                control: VecDeque::new(),
                text: VecDeque::with_capacity(capacity),
            })),
            capacity,
        }
    }

    /// Append a control line.
    pub fn push_control(&self, line: impl Into<String>) {
        self.inner.lock().control.push_back(line.into());
    }

    /// Append a text line. Returns how many old text lines were discarded
    /// to fit it.
    pub fn push_text(&self, line: impl Into<String>) -> usize {
        let mut lanes = self.inner.lock();
        let mut discarded = 0;
        while lanes.text.len() >= self.capacity {
            lanes.text.pop_front();
            discarded += 1;
        }
        lanes.text.push_back(line.into());
        drop(lanes);

        if discarded > 0 {
            warn!(discarded, capacity = self.capacity, "Outbound queue full, dropped oldest lines");
        }
        discarded
    }

    /// Take the next line: control lines first, then text lines if
    /// `text_ready`.
    pub fn pop(&self, text_ready: bool) -> Option<(Lane, String)> {
        let mut lanes = self.inner.lock();
        if let Some(line) = lanes.control.pop_front() {
            return Some((Lane::Control, line));
        }
        if text_ready {
            return lanes.text.pop_front().map(|line| (Lane::Text, line));
        }
        None
    }

    /// Put a line back at the head of its lane after a failed write.
    ///
    /// If producers filled the text lane in the meantime the newest text
    /// line is dropped instead, keeping FIFO order intact.
    pub fn requeue_front(&self, lane: Lane, line: String) {
        let mut lanes = self.inner.lock();
        match lane {
            Lane::Control => lanes.control.push_front(line),
            Lane::Text => {
                if lanes.text.len() >= self.capacity {
                    lanes.text.pop_back();
                }
                lanes.text.push_front(line);
            }
        }
    }

    /// Drop the control lines of a previous connection. Text lines stay.
    /// Returns the number of discarded lines.
    pub fn discard_control(&self) -> usize {
        let mut lanes = self.inner.lock();
        let n = lanes.control.len();
        lanes.control.clear();
        n
    }

    pub fn len(&self) -> usize {
        let lanes = self.inner.lock();
        lanes.control.len() + lanes.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(outbox: &Outbox, text_ready: bool) -> Vec<String> {
        std::iter::from_fn(|| outbox.pop(text_ready))
            .map(|(_, line)| line)
            .collect()
    }

    #[test]
    fn test_fifo_order() {
        let outbox = Outbox::new(8);
        outbox.push_text("one");
        outbox.push_text("two");
        outbox.push_text("three");
        assert_eq!(lines(&outbox, true), vec!["one", "two", "three"]);
        assert_eq!(outbox.pop(true), None);
    }

    #[test]
    fn test_full_text_lane_discards_oldest_without_blocking() {
        let outbox = Outbox::new(3);
        for i in 0..3 {
            assert_eq!(outbox.push_text(format!("line {i}")), 0);
        }
        assert_eq!(outbox.push_text("line 3"), 1);
        assert_eq!(outbox.push_text("line 4"), 1);

        assert_eq!(outbox.len(), 3);
        assert_eq!(lines(&outbox, true), vec!["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_control_lines_survive_text_burst_and_go_first() {
        let outbox = Outbox::new(4);
        outbox.push_control("NICK troetbot");
        outbox.push_control("USER troetbot * * :Bot");
        for i in 0..50 {
            outbox.push_text(format!("NOTICE #troet :line {i}"));
        }

        assert_eq!(outbox.pop(true), Some((Lane::Control, "NICK troetbot".into())));
        assert_eq!(
            outbox.pop(true),
            Some((Lane::Control, "USER troetbot * * :Bot".into()))
        );
        assert_eq!(
            outbox.pop(true),
            Some((Lane::Text, "NOTICE #troet :line 46".into()))
        );
    }

    #[test]
    fn test_text_held_until_ready() {
        let outbox = Outbox::new(4);
        outbox.push_text("NOTICE #troet :later");
        outbox.push_control("PONG :x");

        assert_eq!(lines(&outbox, false), vec!["PONG :x"]);
        assert_eq!(outbox.len(), 1);
        assert_eq!(lines(&outbox, true), vec!["NOTICE #troet :later"]);
    }

    #[test]
    fn test_discard_control_keeps_text() {
        let outbox = Outbox::new(4);
        outbox.push_control("JOIN #troet");
        outbox.push_control("PONG :stale");
        outbox.push_text("NOTICE #troet :keep");

        assert_eq!(outbox.discard_control(), 2);
        assert_eq!(lines(&outbox, true), vec!["NOTICE #troet :keep"]);
    }

    #[test]
    fn test_requeue_front_keeps_order() {
        let outbox = Outbox::new(2);
        outbox.push_text("a");
        outbox.push_text("b");
        let (lane, head) = outbox.pop(true).unwrap();
        outbox.push_text("c");
        outbox.requeue_front(lane, head);

        assert_eq!(outbox.len(), 2);
        assert_eq!(lines(&outbox, true), vec!["a", "b"]);
    }

    #[test]
    fn test_zero_capacity_rounds_up() {
        let outbox = Outbox::new(0);
        assert_eq!(outbox.capacity(), 1);
        outbox.push_text("x");
        assert_eq!(outbox.push_text("y"), 1);
        assert_eq!(outbox.pop(true), Some((Lane::Text, "y".into())));
    }

    #[test]
    fn test_concurrent_producers() {
        let outbox = Outbox::new(1000);
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let outbox = outbox.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        outbox.push_text(format!("{t}:{i}"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(outbox.len(), 400);
    }
}
