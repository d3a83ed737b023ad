//! # Trigger Scheduler
//!
//! Turns popup triggers into pending open attempts with absolute due times.
//!
//! The scheduler never runs timers itself. A host (the editor preview loop, or
//! the CLI's tokio loop) asks for [`TriggerScheduler::next_due`], sleeps, then
//! drains [`TriggerScheduler::take_due`]. Every reschedule bumps a generation
//! counter so an attempt handed out before a cancel can be recognised as stale.

use crate::definition::Trigger;
use tracing::debug;

/// Debounce before an `on_page_load` trigger opens its popup
pub const DEFAULT_PAGE_LOAD_DELAY_MS: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub page_load_delay_ms: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            page_load_delay_ms: DEFAULT_PAGE_LOAD_DELAY_MS,
        }
    }
}

impl SchedulerConfig {
    /// Milliseconds between scheduling and firing for `trigger`
    pub fn delay_for(&self, trigger: &Trigger) -> i64 {
        match trigger {
            Trigger::OnPageLoad => self.page_load_delay_ms.max(0),
            Trigger::AfterSeconds { seconds } => {
                let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
                (seconds * 1000.0).round() as i64
            }
        }
    }
}

/// A pending automatic open attempt
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledOpen {
    pub popup_id: String,
    pub trigger: Trigger,
    /// Epoch milliseconds
    pub due_at: i64,
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct TriggerScheduler {
    config: SchedulerConfig,
    generation: u64,
    pending: Vec<ScheduledOpen>,
}

impl TriggerScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            generation: 0,
            pending: Vec::new(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drop every pending attempt and invalidate any already handed out
    pub fn cancel_all(&mut self) {
        self.generation += 1;
        if !self.pending.is_empty() {
            debug!(cancelled = self.pending.len(), "Cancelled pending popup triggers");
        }
        self.pending.clear();
    }

    /// Queue an attempt for `popup_id` according to `trigger`
    pub fn schedule(&mut self, popup_id: &str, trigger: &Trigger, now: i64) -> &ScheduledOpen {
        let due_at = now.saturating_add(self.config.delay_for(trigger));
        debug!(popup_id = %popup_id, due_at, "Scheduled popup trigger");

        // Keep pending sorted by due time; equal times keep scheduling order
        let index = self.pending.partition_point(|p| p.due_at <= due_at);
        self.pending.insert(
            index,
            ScheduledOpen {
                popup_id: popup_id.to_string(),
                trigger: trigger.clone(),
                due_at,
                generation: self.generation,
            },
        );
        &self.pending[index]
    }

    /// Whether `attempt` survived every cancel since it was scheduled
    pub fn is_current(&self, attempt: &ScheduledOpen) -> bool {
        attempt.generation == self.generation
    }

    /// Earliest due time among pending attempts
    pub fn next_due(&self) -> Option<i64> {
        self.pending.first().map(|p| p.due_at)
    }

    /// Remove and return every attempt due at or before `now`, earliest first
    pub fn take_due(&mut self, now: i64) -> Vec<ScheduledOpen> {
        let split = self.pending.partition_point(|p| p.due_at <= now);
        self.pending.drain(..split).collect()
    }

    pub fn pending(&self) -> &[ScheduledOpen] {
        &self.pending
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}
