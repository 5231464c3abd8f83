//! Tunable constants
//!
//! Every field has a default, so a partial settings file only overrides what
//! it names.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GestureSettings {
    pub long_press_ms: u64,
    pub double_tap_ms: u64,
    /// Movement beyond this many pixels turns a press into a drag
    pub move_tolerance_px: f64,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            long_press_ms: 500,
            double_tap_ms: 300,
            move_tolerance_px: 10.0,
        }
    }
}

impl GestureSettings {
    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn double_tap(&self) -> Duration {
        Duration::from_millis(self.double_tap_ms)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct RadiusSettings {
    pub min: u32,
    pub max: u32,
    pub step: u32,
    /// Radius new regions get when an editing session starts
    pub initial: u32,
}

impl Default for RadiusSettings {
    fn default() -> Self {
        Self {
            min: 10,
            max: 120,
            step: 10,
            initial: 20,
        }
    }
}

impl RadiusSettings {
    pub fn clamp(&self, radius: u32) -> u32 {
        radius.clamp(self.min, self.max.max(self.min))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedbackSettings {
    pub blink_interval_ms: u64,
    /// Full on/off cycles per highlight
    pub blink_cycles: u32,
    pub highlight_radius: u32,
    pub advance_delay_ms: u64,
    pub placeholder_hide_ms: u64,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            blink_interval_ms: 250,
            blink_cycles: 3,
            highlight_radius: 10,
            advance_delay_ms: 1500,
            placeholder_hide_ms: 2000,
        }
    }
}

impl FeedbackSettings {
    pub fn blink_interval(&self) -> Duration {
        Duration::from_millis(self.blink_interval_ms)
    }

    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }

    pub fn placeholder_hide(&self) -> Duration {
        Duration::from_millis(self.placeholder_hide_ms)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub gesture: GestureSettings,
    pub radius: RadiusSettings,
    pub feedback: FeedbackSettings,
    pub quiz: QuizSettings,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct QuizSettings {
    pub default_task_count: usize,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            default_task_count: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"gesture":{"longPressMs":650},"radius":{"max":80}}"#).unwrap();

        assert_eq!(settings.gesture.long_press(), Duration::from_millis(650));
        assert_eq!(settings.gesture.double_tap(), Duration::from_millis(300));
        assert_eq!(settings.radius.max, 80);
        assert_eq!(settings.radius.min, 10);
        assert_eq!(settings.feedback.blink_cycles, 3);
        assert_eq!(settings.quiz.default_task_count, 10);
    }

    #[test]
    fn test_radius_clamp() {
        let radius = RadiusSettings::default();
        assert_eq!(radius.clamp(0), 10);
        assert_eq!(radius.clamp(55), 55);
        assert_eq!(radius.clamp(500), 120);
    }
}
