use std::collections::VecDeque;

pub const LOG_CAPACITY: usize = 500;

/// Bounded log tail; the oldest line is evicted first.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        while self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{LOG_CAPACITY, LogBuffer};

    #[test]
    fn keeps_the_most_recent_lines() {
        let mut buffer = LogBuffer::new();
        for n in 0..=LOG_CAPACITY {
            buffer.push(format!("line {n}"));
        }

        assert_eq!(buffer.len(), 500);
        assert_eq!(buffer.lines().next(), Some("line 1"));
        assert_eq!(buffer.last(), Some("line 500"));
    }

    #[test]
    fn preserves_insertion_order_below_capacity() {
        let mut buffer = LogBuffer::with_capacity(3);
        buffer.push("a");
        buffer.push("b");
        assert_eq!(buffer.lines().collect::<Vec<_>>(), ["a", "b"]);

        buffer.push("c");
        buffer.push("d");
        assert_eq!(buffer.lines().collect::<Vec<_>>(), ["b", "c", "d"]);
    }

    #[test]
    fn zero_capacity_still_holds_the_latest_line() {
        let mut buffer = LogBuffer::with_capacity(0);
        buffer.push("first");
        buffer.push("second");
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.last(), Some("second"));
        assert_eq!(buffer.len(), 1);
    }
}
