use serde_json::{Map, Value, json};

use crate::core::ChartTheme;

/// Default continuous view size applied by both theming paths.
pub const CONTINUOUS_WIDTH_PX: u32 = 400;
pub const CONTINUOUS_HEIGHT_PX: u32 = 350;

/// Theming transform applied to the spec's `config` block.
///
/// Implementations must treat the caller's config as authoritative: every
/// key the user set survives the transform unchanged.
pub trait SpecTheming {
    /// Full host theme substitution.
    fn apply_host_theme(&self, config: Option<&Value>, theme: &ChartTheme) -> Value;

    /// Minimal compatibility adjustments for specs that keep their own theme.
    fn apply_theme_defaults(&self, config: Option<&Value>, theme: &ChartTheme) -> Value;
}

/// Theming that mirrors the host application's look.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostTheming;

impl HostTheming {
    fn font_config(theme: &ChartTheme) -> Value {
        json!({
            "labelFont": theme.body_font,
            "titleFont": theme.body_font,
            "labelFontSize": theme.label_font_size_px,
            "titleFontSize": theme.label_font_size_px,
        })
    }
}

impl SpecTheming for HostTheming {
    fn apply_host_theme(&self, config: Option<&Value>, theme: &ChartTheme) -> Value {
        let fonts = Self::font_config(theme);
        let mut axis = json!({
            "labelColor": theme.text_color,
            "titleColor": theme.text_color,
            "gridColor": theme.grid_color,
        });
        merge_into(&mut axis, &fonts);
        let mut legend = json!({
            "labelColor": theme.text_color,
            "titleColor": theme.text_color,
        });
        merge_into(&mut legend, &fonts);

        let base = json!({
            "background": theme.background_color,
            "axis": axis,
            "legend": legend,
            "title": {
                "color": theme.text_color,
                "subtitleColor": theme.text_color,
                "font": theme.body_font,
                "fontSize": theme.title_font_size_px,
            },
            "header": {
                "labelColor": theme.text_color,
                "titleColor": theme.text_color,
            },
            "view": {
                "continuousWidth": CONTINUOUS_WIDTH_PX,
                "continuousHeight": CONTINUOUS_HEIGHT_PX,
            },
            "mark": { "tooltip": true },
            "range": {
                "category": theme.categorical_colors,
                "diverging": theme.diverging_colors,
                "ramp": theme.sequential_colors,
                "heatmap": theme.sequential_colors,
            },
        });
        with_user_config(base, config)
    }

    fn apply_theme_defaults(&self, config: Option<&Value>, theme: &ChartTheme) -> Value {
        let fonts = Self::font_config(theme);
        let base = json!({
            "axis": fonts,
            "legend": fonts,
            "header": fonts,
            "title": {
                "font": theme.body_font,
                "fontSize": theme.title_font_size_px,
            },
            "view": {
                "continuousWidth": CONTINUOUS_WIDTH_PX,
                "continuousHeight": CONTINUOUS_HEIGHT_PX,
            },
        });
        with_user_config(base, config)
    }
}

fn with_user_config(mut base: Value, config: Option<&Value>) -> Value {
    if let Some(config) = config {
        merge_into(&mut base, config);
    }
    base
}

/// Recursively merges `overrides` into `target`; `overrides` wins on conflicts.
///
/// Objects merge key by key. Any other value, arrays included, replaces the
/// target value.
pub fn merge_into(target: &mut Value, overrides: &Value) {
    let Value::Object(overrides) = overrides else {
        if !overrides.is_null() {
            *target = overrides.clone();
        }
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(target) = target {
        for (key, value) in overrides {
            let nested = value.is_object() && target.get(key).is_some_and(Value::is_object);
            match target.get_mut(key) {
                Some(existing) if nested => merge_into(existing, value),
                _ => {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
    }
}
