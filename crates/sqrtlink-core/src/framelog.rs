use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp_ms: u64,
    pub direction: Direction,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Direction {
    Rx,
    Tx,
}

/// Bounded record of the raw bytes exchanged with the peripheral.
pub struct FrameLog {
    entries: VecDeque<LogEntry>,
    max_entries: usize,
}

impl FrameLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries),
            max_entries,
        }
    }

    pub fn push(&mut self, direction: Direction, data: Vec<u8>) {
        if self.max_entries == 0 {
            return;
        }
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        if self.entries.len() == self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            timestamp_ms,
            direction,
            data,
        });
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entry travelling in `direction`.
    pub fn last(&self, direction: Direction) -> Option<&LogEntry> {
        self.entries.iter().rev().find(|e| e.direction == direction)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn to_text(&self, show_timestamp: bool) -> String {
        let mut result = String::new();
        for entry in &self.entries {
            if show_timestamp {
                let millis = entry.timestamp_ms % 1000;
                let total_secs = entry.timestamp_ms / 1000;
                let hours = (total_secs / 3600) % 24;
                let minutes = (total_secs / 60) % 60;
                let seconds = total_secs % 60;
                result.push_str(&format!("[{hours:02}:{minutes:02}:{seconds:02}.{millis:03}] "));
            }
            result.push_str(match entry.direction {
                Direction::Rx => "RX:",
                Direction::Tx => "TX:",
            });
            for byte in &entry.data {
                result.push_str(&format!(" {byte:02X}"));
            }
            result.push('\n');
        }
        result
    }
}
