//! # Frequency Gate
//!
//! Per-popup show bookkeeping. The persisted record is the whole state machine:
//! `count` says how many times the popup was shown, `lastShownAt` when.

use crate::definition::{Frequency, FrequencyMode};
use serde::{Deserialize, Serialize};

pub const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Persisted show history for one popup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyState {
    #[serde(default)]
    pub count: u32,

    /// Epoch milliseconds of the most recent show
    #[serde(default)]
    pub last_shown_at: Option<i64>,
}

impl FrequencyState {
    /// Record that the popup was shown at `now` (epoch ms)
    pub fn record_show(&mut self, now: i64) {
        self.count = self.count.saturating_add(1);
        self.last_shown_at = Some(now);
    }

    pub fn recorded(mut self, now: i64) -> Self {
        self.record_show(now);
        self
    }
}

impl Frequency {
    /// Whether an automatic trigger may open the popup at `now`
    pub fn allows(&self, state: &FrequencyState, now: i64) -> bool {
        if self.max_shows > 0 && state.count >= self.max_shows {
            return false;
        }

        match self.mode {
            FrequencyMode::EveryVisit => true,
            FrequencyMode::Once => state.count == 0,
            FrequencyMode::Cooldown => match state.last_shown_at {
                None => true,
                Some(last) => {
                    let cooldown_ms = self.cooldown_hours.max(0.0) * MILLIS_PER_HOUR;
                    now.saturating_sub(last) as f64 >= cooldown_ms
                }
            },
        }
    }
}
