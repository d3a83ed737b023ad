//! Best-effort persistence of per-popup frequency state.
//!
//! Popups are non-critical UI: any failure reading or writing the record is
//! logged and treated as "no record" instead of being surfaced.

use crate::frequency::FrequencyState;
use funnel_common::KeyValueStore;
use tracing::{debug, warn};

pub const DEFAULT_KEY_PREFIX: &str = "funnel-builder:popup-frequency:";

/// Frequency records keyed by popup id
#[derive(Debug)]
pub struct FrequencyStore<S: KeyValueStore> {
    store: S,
    prefix: String,
}

impl<S: KeyValueStore> FrequencyStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_prefix(store, DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(store: S, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub fn key_for(&self, popup_id: &str) -> String {
        format!("{}{}", self.prefix, popup_id)
    }

    /// Current record for `popup_id`, default when absent or unreadable
    pub fn read(&self, popup_id: &str) -> FrequencyState {
        let key = self.key_for(popup_id);
        match self.store.get_json::<FrequencyState>(&key) {
            Ok(Some(state)) => state,
            Ok(None) => FrequencyState::default(),
            Err(e) => {
                warn!(popup_id = %popup_id, error = %e, "Frequency state unreadable, treating as unseen");
                FrequencyState::default()
            }
        }
    }

    /// Increment the show count and stamp `now`; returns the new record
    pub fn record_show(&mut self, popup_id: &str, now: i64) -> FrequencyState {
        let state = self.read(popup_id).recorded(now);
        self.write(popup_id, &state);
        debug!(popup_id = %popup_id, count = state.count, "Recorded popup show");
        state
    }

    /// Forget everything recorded for `popup_id`
    pub fn reset(&mut self, popup_id: &str) {
        let key = self.key_for(popup_id);
        if let Err(e) = self.store.remove(&key) {
            warn!(popup_id = %popup_id, error = %e, "Failed to reset frequency state");
        }
    }

    fn write(&mut self, popup_id: &str, state: &FrequencyState) {
        let key = self.key_for(popup_id);
        if let Err(e) = self.store.set_json(&key, state) {
            warn!(popup_id = %popup_id, error = %e, "Failed to persist frequency state");
        }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}
