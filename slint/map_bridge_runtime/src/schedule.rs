//! Bounded-attempt, fixed-interval timers.
//!
//! Both waiting constructs in the embedded document (the bootstrap poll and
//! the layout stabilizer) are described by a [`RetrySchedule`]. The schedule is
//! plain data: it is serialized into the injected scripts, which drive their
//! own timers and stop once `max_attempts` ticks have elapsed.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySchedule {
    pub interval_ms: u64,
    pub max_attempts: u32,
}

impl RetrySchedule {
    pub const BOOTSTRAP: RetrySchedule = RetrySchedule {
        interval_ms: 250,
        max_attempts: 40,
    };

    pub const STABILIZER: RetrySchedule = RetrySchedule {
        interval_ms: 500,
        max_attempts: 20,
    };

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Upper bound on how long the timer can stay alive in the embedded
    /// document once started.
    pub fn budget(&self) -> Duration {
        self.interval().saturating_mul(self.max_attempts)
    }

    pub fn validate(&self, name: &str) -> Result<(), String> {
        if self.interval_ms == 0 {
            return Err(format!("{name} schedule interval_ms must be > 0"));
        }

        if self.max_attempts == 0 {
            return Err(format!("{name} schedule max_attempts must be > 0"));
        }

        Ok(())
    }
}
