//! User configuration, loaded from JSON by the front end

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::render::{hex_to_color, ColorPair, LabelNumbering, Palette, Rgb};
use crate::surface::{ToolSettings, DEFAULT_MIN_DRAG_AREA};
use crate::text_edit::DEFAULT_REPEAT_INTERVAL;

/// Colours as hex strings, `[fill, border]` per selection state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PaletteConfig {
    pub unselected: [String; 2],
    pub selected: [String; 2],
    pub label_text: String,
    pub fill: String,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            unselected: ["a2c5ac".to_string(), "92b59c".to_string()],
            selected: ["008000".to_string(), "008000".to_string()],
            label_text: "ff0000".to_string(),
            fill: "ffffff".to_string(),
        }
    }
}

impl PaletteConfig {
    /// Resolve hex strings, keeping the default colour for any that do not parse
    pub fn resolve(&self) -> Palette {
        let defaults = Palette::default();
        let color = |hex: &str, fallback: Rgb| {
            hex_to_color(hex).unwrap_or_else(|| {
                warn!(hex, "invalid colour in config, using default");
                fallback
            })
        };

        Palette {
            unselected: ColorPair {
                fill: color(&self.unselected[0], defaults.unselected.fill),
                border: color(&self.unselected[1], defaults.unselected.border),
            },
            selected: ColorPair {
                fill: color(&self.selected[0], defaults.selected.fill),
                border: color(&self.selected[1], defaults.selected.border),
            },
            label_text: color(&self.label_text, defaults.label_text),
            fill: color(&self.fill, defaults.fill),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub palette: PaletteConfig,
    pub tool: ToolSettings,
    pub label_numbering: LabelNumbering,
    pub min_drag_area: f64,
    pub repeat_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            palette: PaletteConfig::default(),
            tool: ToolSettings::default(),
            label_numbering: LabelNumbering::default(),
            min_drag_area: DEFAULT_MIN_DRAG_AREA,
            repeat_interval_ms: DEFAULT_REPEAT_INTERVAL.as_millis() as u64,
        }
    }
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn repeat_interval(&self) -> Duration {
        Duration::from_millis(self.repeat_interval_ms.max(1))
    }
}
