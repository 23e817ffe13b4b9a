//! Progress reporting for install runs.

/// Turns byte counts into percentage events.
///
/// An event is emitted only when the integer percentage grows, so events are
/// monotonic and at most 101 per run.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    total_bytes: u64,
    copied_bytes: u64,
    last_percent: Option<u8>,
}

impl ProgressThrottle {
    pub fn new(total_bytes: u64) -> Self {
        Self {
            total_bytes,
            copied_bytes: 0,
            last_percent: None,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn copied_bytes(&self) -> u64 {
        self.copied_bytes
    }

    /// Current percentage; an empty run counts as complete.
    pub fn percent(&self) -> u8 {
        if self.total_bytes == 0 {
            return 100;
        }
        let copied = self.copied_bytes.min(self.total_bytes) as u128;
        (copied * 100 / self.total_bytes as u128) as u8
    }

    /// Records `bytes` more copied bytes. Returns the new percentage when it
    /// went up.
    pub fn advance(&mut self, bytes: u64) -> Option<u8> {
        self.copied_bytes = self.copied_bytes.saturating_add(bytes);
        self.emit()
    }

    /// Returns the current percentage unless it was already reported.
    pub fn emit(&mut self) -> Option<u8> {
        let percent = self.percent();
        match self.last_percent {
            Some(last) if percent <= last => None,
            _ => {
                self.last_percent = Some(percent);
                Some(percent)
            }
        }
    }
}
