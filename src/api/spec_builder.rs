use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::core::{ChartProps, ChartTheme, HOST_THEME_NAME, ThemeMode};
use crate::error::{ChartError, ChartResult};
use crate::extensions::{
    EncodingSelectionPreparer, HostTheming, SelectionSpecPreparer, SpecTheming,
};

use super::BOTTOM_PADDING_PX;
use super::json_helpers::is_falsy;

/// Spec key reserved for inline datasets; data must arrive through the
/// element's dataset channel instead.
pub const RESERVED_DATASETS_KEY: &str = "datasets";

/// Sizing inputs applied to the final spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecSizing {
    pub width: u32,
    pub height: Option<u32>,
    pub is_full_screen: bool,
    pub use_container_width: bool,
}

impl SpecSizing {
    #[must_use]
    pub fn from_props(props: &ChartProps) -> Self {
        Self {
            width: props.width,
            height: props.height,
            is_full_screen: props.is_full_screen,
            use_container_width: props.element.use_container_width,
        }
    }
}

/// Produces the render-ready spec from the raw spec text and host inputs.
pub struct SpecBuilder {
    theming: Box<dyn SpecTheming>,
    selection_prep: Box<dyn SelectionSpecPreparer>,
    bottom_padding_px: u32,
}

impl Default for SpecBuilder {
    fn default() -> Self {
        Self::new(BOTTOM_PADDING_PX)
    }
}

impl SpecBuilder {
    #[must_use]
    pub fn new(bottom_padding_px: u32) -> Self {
        Self {
            theming: Box::new(HostTheming),
            selection_prep: Box::new(EncodingSelectionPreparer),
            bottom_padding_px,
        }
    }

    #[must_use]
    pub fn with_theming(mut self, theming: impl SpecTheming + 'static) -> Self {
        self.theming = Box::new(theming);
        self
    }

    #[must_use]
    pub fn with_selection_preparer(
        mut self,
        selection_prep: impl SelectionSpecPreparer + 'static,
    ) -> Self {
        self.selection_prep = Box::new(selection_prep);
        self
    }

    /// Builds the spec for one render of `props`.
    pub fn build_for(&self, props: &ChartProps) -> ChartResult<Value> {
        self.build(
            &props.element.spec,
            &props.theme,
            props.element.theme_mode,
            SpecSizing::from_props(props),
            &props.element.selection_mode,
        )
    }

    pub fn build(
        &self,
        raw_spec: &str,
        theme: &ChartTheme,
        theme_mode: ThemeMode,
        sizing: SpecSizing,
        selection_modes: &[String],
    ) -> ChartResult<Value> {
        let mut spec: Value = serde_json::from_str(raw_spec)
            .map_err(|e| ChartError::InvalidSpec(format!("spec is not valid JSON: {e}")))?;
        let Some(root) = spec.as_object_mut() else {
            return Err(ChartError::InvalidSpec(
                "spec root must be a JSON object".to_owned(),
            ));
        };
        if root
            .get(RESERVED_DATASETS_KEY)
            .is_some_and(|datasets| !is_falsy(datasets))
        {
            return Err(ChartError::InvalidSpec(
                "datasets should not be passed as part of the spec".to_owned(),
            ));
        }

        self.apply_theme(root, theme, theme_mode);
        apply_sizing(root, sizing);
        ensure_bottom_padding(root, self.bottom_padding_px);

        if !selection_modes.is_empty() {
            trace!(selectors = selection_modes.len(), "preparing spec for selections");
            self.selection_prep.prepare(&mut spec);
        }
        Ok(spec)
    }

    fn apply_theme(&self, root: &mut Map<String, Value>, theme: &ChartTheme, mode: ThemeMode) {
        let embedded_request = root
            .get("usermeta")
            .and_then(|meta| meta.pointer("/embedOptions/theme"))
            .and_then(Value::as_str)
            == Some(HOST_THEME_NAME);
        let config = root.get("config");

        let themed = if mode == ThemeMode::Host || embedded_request {
            self.theming.apply_host_theme(config, theme)
        } else {
            self.theming.apply_theme_defaults(config, theme)
        };
        root.insert("config".to_owned(), themed);

        if embedded_request {
            // The engine would otherwise apply its own theme on top.
            if let Some(embed_options) = root
                .get_mut("usermeta")
                .and_then(|meta| meta.get_mut("embedOptions"))
                .and_then(Value::as_object_mut)
            {
                embed_options.remove("theme");
            }
        }
        debug!(?mode, embedded_request, "applied chart theme");
    }
}

fn apply_sizing(root: &mut Map<String, Value>, sizing: SpecSizing) {
    if sizing.is_full_screen {
        root.insert("width".to_owned(), Value::from(sizing.width));
        match sizing.height {
            Some(height) => {
                root.insert("height".to_owned(), Value::from(height));
            }
            None => {
                root.remove("height");
            }
        }
    } else if sizing.use_container_width {
        root.insert("width".to_owned(), Value::from(sizing.width));
    } else {
        return;
    }

    if let Some(children) = root.get_mut("vconcat").and_then(Value::as_array_mut) {
        for child in children.iter_mut().filter_map(Value::as_object_mut) {
            child.insert("width".to_owned(), Value::from(sizing.width));
        }
    }
}

fn ensure_bottom_padding(root: &mut Map<String, Value>, bottom_padding_px: u32) {
    let padding = root.entry("padding").or_insert(Value::Null);
    if is_falsy(padding) {
        *padding = Value::Object(Map::new());
    }
    // A numeric padding applies to every side and is left as-is.
    if let Value::Object(sides) = padding {
        if sides.get("bottom").is_none_or(Value::is_null) {
            sides.insert("bottom".to_owned(), Value::from(bottom_padding_px));
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::{SpecBuilder, SpecSizing};
    use crate::core::{ChartTheme, ThemeMode};
    use crate::error::ChartError;

    fn fixed_sizing() -> SpecSizing {
        SpecSizing {
            width: 640,
            height: Some(480),
            is_full_screen: false,
            use_container_width: false,
        }
    }

    fn build(spec: Value, mode: ThemeMode, sizing: SpecSizing) -> Value {
        SpecBuilder::default()
            .build(&spec.to_string(), &ChartTheme::light(), mode, sizing, &[])
            .expect("build spec")
    }

    #[test]
    fn padding_rules_cover_missing_falsy_object_and_number() {
        let built = build(json!({"mark": "bar"}), ThemeMode::Default, fixed_sizing());
        assert_eq!(built["padding"], json!({"bottom": 20}));

        let built = build(json!({"padding": 0}), ThemeMode::Default, fixed_sizing());
        assert_eq!(built["padding"], json!({"bottom": 20}));

        let built = build(
            json!({"padding": {"left": 3, "bottom": null}}),
            ThemeMode::Default,
            fixed_sizing(),
        );
        assert_eq!(built["padding"], json!({"left": 3, "bottom": 20}));

        let built = build(json!({"padding": {"bottom": 2}}), ThemeMode::Default, fixed_sizing());
        assert_eq!(built["padding"], json!({"bottom": 2}));

        let built = build(json!({"padding": 5}), ThemeMode::Default, fixed_sizing());
        assert_eq!(built["padding"], json!(5));
    }

    #[test]
    fn full_screen_without_height_drops_height() {
        let sizing = SpecSizing {
            height: None,
            is_full_screen: true,
            ..fixed_sizing()
        };
        let built = build(
            json!({"height": 100, "vconcat": [{"mark": "bar"}, {"mark": "line"}]}),
            ThemeMode::Default,
            sizing,
        );
        assert_eq!(built["width"], json!(640));
        assert!(built.get("height").is_none());
        assert_eq!(built["vconcat"][1]["width"], json!(640));
    }

    #[test]
    fn non_object_spec_is_invalid() {
        let result = SpecBuilder::default().build(
            "[1, 2]",
            &ChartTheme::light(),
            ThemeMode::Default,
            fixed_sizing(),
            &[],
        );
        assert!(matches!(result, Err(ChartError::InvalidSpec(_))));
    }
}
