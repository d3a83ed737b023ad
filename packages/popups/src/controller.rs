//! # Popup Runtime
//!
//! Owns the single "currently open popup" slot and decides when popups open.
//!
//! ## Auto triggers
//!
//! Triggers only run while previewing the page workspace and while no popup
//! is open. [`PopupController::sync`] must be called whenever the popup set,
//! the workspace, the preview flag or the path changes: it cancels everything
//! pending and schedules afresh. When an attempt comes due, the open slot,
//! targeting and frequency are checked again against the state at that moment.
//!
//! ## Manual opens
//!
//! A user action (a button wired to "open popup") skips the frequency gate but
//! not targeting, and still counts as a show.

use crate::definition::PopupDefinition;
use crate::scheduler::{ScheduledOpen, SchedulerConfig, TriggerScheduler};
use crate::store::FrequencyStore;
use funnel_common::KeyValueStore;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, info};

/// Anything popups can be looked up in
pub trait PopupSource {
    fn popup(&self, id: &str) -> Option<&PopupDefinition>;

    fn popups(&self) -> Box<dyn Iterator<Item = &PopupDefinition> + '_>;
}

impl PopupSource for BTreeMap<String, PopupDefinition> {
    fn popup(&self, id: &str) -> Option<&PopupDefinition> {
        self.get(id)
    }

    fn popups(&self) -> Box<dyn Iterator<Item = &PopupDefinition> + '_> {
        Box::new(self.values())
    }
}

impl PopupSource for HashMap<String, PopupDefinition> {
    fn popup(&self, id: &str) -> Option<&PopupDefinition> {
        self.get(id)
    }

    fn popups(&self) -> Box<dyn Iterator<Item = &PopupDefinition> + '_> {
        Box::new(self.values())
    }
}

impl PopupSource for [PopupDefinition] {
    fn popup(&self, id: &str) -> Option<&PopupDefinition> {
        self.iter().find(|p| p.id == id)
    }

    fn popups(&self) -> Box<dyn Iterator<Item = &PopupDefinition> + '_> {
        Box::new(self.iter())
    }
}

impl PopupSource for Vec<PopupDefinition> {
    fn popup(&self, id: &str) -> Option<&PopupDefinition> {
        self.as_slice().popup(id)
    }

    fn popups(&self) -> Box<dyn Iterator<Item = &PopupDefinition> + '_> {
        self.as_slice().popups()
    }
}

/// Where the visitor (or the editor preview) currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewContext {
    /// Editing the page rather than a popup or another screen
    pub in_page_workspace: bool,
    pub preview: bool,
    pub path: String,
}

impl Default for PreviewContext {
    fn default() -> Self {
        Self {
            in_page_workspace: true,
            preview: false,
            path: "/".to_string(),
        }
    }
}

impl PreviewContext {
    pub fn previewing(path: impl Into<String>) -> Self {
        Self {
            in_page_workspace: true,
            preview: true,
            path: path.into(),
        }
    }

    /// Auto triggers only run in a live page preview
    pub fn triggers_active(&self) -> bool {
        self.in_page_workspace && self.preview
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpenRejected {
    #[error("Popup {popup_id} is not targeted at {path}")]
    NotTargeted { popup_id: String, path: String },
}

/// Reason an automatic attempt did not open its popup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Stale,
    Inactive,
    AlreadyOpen,
    Missing,
    Disabled,
    NotTargeted,
    FrequencyCapped,
}

#[derive(Debug)]
pub struct PopupController<S: KeyValueStore> {
    scheduler: TriggerScheduler,
    frequency: FrequencyStore<S>,
    context: PreviewContext,
    open_popup: Option<String>,
}

impl<S: KeyValueStore> PopupController<S> {
    pub fn new(frequency: FrequencyStore<S>, config: SchedulerConfig) -> Self {
        Self {
            scheduler: TriggerScheduler::new(config),
            frequency,
            context: PreviewContext::default(),
            open_popup: None,
        }
    }

    pub fn context(&self) -> &PreviewContext {
        &self.context
    }

    pub fn open_popup(&self) -> Option<&str> {
        self.open_popup.as_deref()
    }

    pub fn scheduler(&self) -> &TriggerScheduler {
        &self.scheduler
    }

    pub fn frequency(&self) -> &FrequencyStore<S> {
        &self.frequency
    }

    pub fn frequency_mut(&mut self) -> &mut FrequencyStore<S> {
        &mut self.frequency
    }

    /// Whether `popup` would be allowed to auto-open right now
    pub fn is_eligible(&self, popup: &PopupDefinition, now: i64) -> bool {
        popup.enabled
            && popup.targeting.allows(&self.context.path)
            && popup.frequency.allows(&self.frequency.read(&popup.id), now)
    }

    /// Cancel pending attempts and schedule triggers for `context`
    pub fn sync<P: PopupSource + ?Sized>(&mut self, popups: &P, context: PreviewContext, now: i64) {
        self.scheduler.cancel_all();
        self.context = context;

        if !self.context.triggers_active() || self.open_popup.is_some() {
            return;
        }

        for popup in popups.popups() {
            if !self.is_eligible(popup, now) {
                debug!(popup_id = %popup.id, "Popup not eligible, no triggers scheduled");
                continue;
            }
            for trigger in &popup.triggers {
                self.scheduler.schedule(&popup.id, trigger, now);
            }
        }
    }

    pub fn next_due(&self) -> Option<i64> {
        self.scheduler.next_due()
    }

    /// Fire every attempt due by `now`; returns the popup that opened, if any
    pub fn tick<P: PopupSource + ?Sized>(&mut self, popups: &P, now: i64) -> Option<String> {
        let mut opened = None;
        for attempt in self.scheduler.take_due(now) {
            if let Ok(id) = self.fire(&attempt, popups, now) {
                opened = Some(id);
            }
        }
        opened
    }

    /// Run a single attempt with fire-time checks
    pub fn fire<P: PopupSource + ?Sized>(
        &mut self,
        attempt: &ScheduledOpen,
        popups: &P,
        now: i64,
    ) -> Result<String, SkipReason> {
        if !self.scheduler.is_current(attempt) {
            return Err(SkipReason::Stale);
        }
        if !self.context.triggers_active() {
            return Err(SkipReason::Inactive);
        }
        if self.open_popup.is_some() {
            return Err(SkipReason::AlreadyOpen);
        }

        let popup = popups.popup(&attempt.popup_id).ok_or(SkipReason::Missing)?;
        if !popup.enabled {
            return Err(SkipReason::Disabled);
        }
        if !popup.targeting.allows(&self.context.path) {
            return Err(SkipReason::NotTargeted);
        }
        if !popup.frequency.allows(&self.frequency.read(&popup.id), now) {
            return Err(SkipReason::FrequencyCapped);
        }

        self.show(&popup.id, now);
        Ok(popup.id.clone())
    }

    /// Open `popup` on behalf of the user
    pub fn open_manual(&mut self, popup: &PopupDefinition, now: i64) -> Result<(), OpenRejected> {
        if !popup.targeting.allows(&self.context.path) {
            return Err(OpenRejected::NotTargeted {
                popup_id: popup.id.clone(),
                path: self.context.path.clone(),
            });
        }

        self.show(&popup.id, now);
        Ok(())
    }

    /// Close whatever is open; returns the id that was open
    pub fn close(&mut self) -> Option<String> {
        let closed = self.open_popup.take();
        if let Some(id) = &closed {
            debug!(popup_id = %id, "Closed popup");
        }
        closed
    }

    fn show(&mut self, popup_id: &str, now: i64) {
        self.open_popup = Some(popup_id.to_string());
        if self.context.preview {
            let state = self.frequency.record_show(popup_id, now);
            info!(popup_id = %popup_id, count = state.count, "Opened popup");
        } else {
            info!(popup_id = %popup_id, "Opened popup outside preview");
        }
    }
}
