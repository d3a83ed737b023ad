//! # Funnel Popups
//!
//! Popup rules and the runtime that evaluates them.
//!
//! ```text
//! PopupDefinition ──► targeting::allows(path)      where may it show?
//!                 ──► Frequency::allows(state,now)  how often?
//!                 ──► TriggerScheduler              when?
//!                           │
//!                           ▼
//!                  PopupController ◄──► FrequencyStore ◄──► KeyValueStore
//! ```
//!
//! All times are epoch milliseconds passed in by the caller; [`now_millis`]
//! reads the wall clock for hosts that have one.

mod controller;
mod definition;
mod frequency;
mod scheduler;
mod store;
mod targeting;

pub use controller::{OpenRejected, PopupController, PopupSource, PreviewContext, SkipReason};
pub use definition::{
    Animation, AnimationKind, Frequency, FrequencyMode, PopupDefinition, Targeting, TargetingMode,
    Trigger,
};
pub use frequency::{FrequencyState, MILLIS_PER_HOUR};
pub use scheduler::{ScheduledOpen, SchedulerConfig, TriggerScheduler, DEFAULT_PAGE_LOAD_DELAY_MS};
pub use store::{FrequencyStore, DEFAULT_KEY_PREFIX};
pub use targeting::{pattern_matches, PathPattern};

/// Current wall-clock time in epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
