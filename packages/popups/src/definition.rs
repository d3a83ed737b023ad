//! # Popup Definitions
//!
//! A popup owns its own root list of sections (drawn from the same node pool as
//! the page) plus the rules deciding where, when and how often it appears.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A popup attached to a funnel page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupDefinition {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Section ids, in display order
    #[serde(default)]
    pub root_ids: Vec<String>,

    #[serde(default)]
    pub triggers: Vec<Trigger>,

    #[serde(default)]
    pub targeting: Targeting,

    #[serde(default)]
    pub frequency: Frequency,

    #[serde(default)]
    pub animation: Animation,

    /// Open bag of overlay/container styling (backdrop, width, radius...)
    #[serde(default)]
    pub style: Map<String, Value>,
}

fn default_enabled() -> bool {
    true
}

impl PopupDefinition {
    /// Create a popup with the defaults a freshly added popup starts with:
    /// enabled, opens on page load, shown on every path, every visit.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            enabled: true,
            root_ids: Vec::new(),
            triggers: vec![Trigger::OnPageLoad],
            targeting: Targeting::default(),
            frequency: Frequency::default(),
            animation: Animation::default(),
            style: default_style(),
        }
    }
}

fn default_style() -> Map<String, Value> {
    let mut style = Map::new();
    style.insert("width".to_string(), Value::from(560));
    style.insert("overlayColor".to_string(), Value::from("rgba(0,0,0,0.6)"));
    style.insert("borderRadius".to_string(), Value::from(12));
    style.insert("closeOnOverlayClick".to_string(), Value::from(true));
    style
}

/// Condition that schedules an automatic open attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    OnPageLoad,
    AfterSeconds {
        #[serde(default)]
        seconds: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetingMode {
    #[default]
    All,
    Include,
    Exclude,
}

/// Path rules deciding where a popup may appear
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Targeting {
    #[serde(default)]
    pub mode: TargetingMode,

    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyMode {
    #[default]
    EveryVisit,
    Once,
    Cooldown,
}

/// How often an auto-triggered popup may reappear to the same visitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frequency {
    #[serde(default)]
    pub mode: FrequencyMode,

    #[serde(default = "default_cooldown_hours")]
    pub cooldown_hours: f64,

    /// 0 means unlimited
    #[serde(default)]
    pub max_shows: u32,
}

fn default_cooldown_hours() -> f64 {
    24.0
}

impl Default for Frequency {
    fn default() -> Self {
        Self {
            mode: FrequencyMode::EveryVisit,
            cooldown_hours: default_cooldown_hours(),
            max_shows: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationKind {
    None,
    #[default]
    Fade,
    SlideUp,
    Zoom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animation {
    #[serde(default)]
    pub kind: AnimationKind,

    #[serde(default = "default_duration_ms")]
    pub duration_ms: u32,
}

fn default_duration_ms() -> u32 {
    250
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            kind: AnimationKind::Fade,
            duration_ms: default_duration_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_defaults() {
        let popup = PopupDefinition::new("popup-1", "Exit offer");

        assert!(popup.enabled);
        assert!(popup.root_ids.is_empty());
        assert_eq!(popup.triggers, vec![Trigger::OnPageLoad]);
        assert_eq!(popup.targeting.mode, TargetingMode::All);
        assert_eq!(popup.frequency.mode, FrequencyMode::EveryVisit);
        assert_eq!(popup.frequency.max_shows, 0);
    }

    #[test]
    fn test_wire_format() {
        let mut popup = PopupDefinition::new("p", "Promo");
        popup.triggers.push(Trigger::AfterSeconds { seconds: 5.0 });
        popup.frequency.mode = FrequencyMode::Cooldown;

        let json = serde_json::to_value(&popup).unwrap();
        assert_eq!(json["rootIds"], serde_json::json!([]));
        assert_eq!(json["triggers"][0]["type"], "on_page_load");
        assert_eq!(json["triggers"][1]["type"], "after_seconds");
        assert_eq!(json["triggers"][1]["seconds"], 5.0);
        assert_eq!(json["frequency"]["mode"], "cooldown");
        assert_eq!(json["frequency"]["cooldownHours"], 24.0);
        assert_eq!(json["targeting"]["mode"], "all");
    }

    #[test]
    fn test_sparse_popup_fills_defaults() {
        let popup: PopupDefinition =
            serde_json::from_str(r#"{"id": "p", "rootIds": ["s1"]}"#).unwrap();

        assert!(popup.enabled);
        assert_eq!(popup.root_ids, vec!["s1"]);
        assert!(popup.triggers.is_empty());
        assert_eq!(popup.frequency.cooldown_hours, 24.0);
    }
}
