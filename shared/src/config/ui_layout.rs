use std::collections::HashMap;

use serde::Deserialize;

use crate::config::report::ConfigError;

/// A named control rectangle in design-resolution coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct UiControlRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// The UI layout table: a design resolution plus named control rects.
/// The renderer scales these to the actual window; the core only loads
/// and serves them.
#[derive(Debug, Default, Deserialize)]
pub struct UiLayoutConfig {
    #[serde(default = "default_design_width")]
    pub design_width: i32,
    #[serde(default = "default_design_height")]
    pub design_height: i32,
    #[serde(default)]
    pub controls: HashMap<String, UiControlRect>,
}

fn default_design_width() -> i32 {
    1280
}

fn default_design_height() -> i32 {
    720
}

impl UiLayoutConfig {
    pub fn load_from_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn control(&self, name: &str) -> Option<UiControlRect> {
        self.controls.get(name).copied()
    }

    /// Scales a design-space rect to an actual resolution.
    pub fn scale_to(&self, rect: UiControlRect, width: i32, height: i32) -> UiControlRect {
        if self.design_width <= 0 || self.design_height <= 0 {
            return rect;
        }
        let sx = width as f32 / self.design_width as f32;
        let sy = height as f32 / self.design_height as f32;
        UiControlRect {
            x: (rect.x as f32 * sx).round() as i32,
            y: (rect.y as f32 * sy).round() as i32,
            width: (rect.width as f32 * sx).round() as i32,
            height: (rect.height as f32 * sy).round() as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_and_scales_controls() {
        let yaml = r#"
design_width: 1280
design_height: 720
controls:
  login_button: { x: 640, y: 360, width: 128, height: 36 }
"#;
        let layout = UiLayoutConfig::load_from_str(yaml).unwrap();
        let rect = layout.control("login_button").unwrap();
        let scaled = layout.scale_to(rect, 2560, 1440);
        assert_eq!(scaled.x, 1280);
        assert_eq!(scaled.width, 256);
    }
}
