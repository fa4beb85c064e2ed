use std::cell::Cell;
use std::rc::Rc;

use chart_sync::ChartError;
use chart_sync::api::{SpecBuilder, SpecSizing};
use chart_sync::core::{ChartElement, ChartProps, ChartTheme, ThemeMode};
use chart_sync::extensions::SelectionSpecPreparer;
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct CountingPreparer {
    calls: Rc<Cell<usize>>,
}

impl SelectionSpecPreparer for CountingPreparer {
    fn prepare(&self, spec: &mut Value) {
        self.calls.set(self.calls.get() + 1);
        // Sizing and padding must already be final.
        assert!(spec.get("padding").is_some());
        spec["prepared"] = json!(true);
    }
}

fn sizing() -> SpecSizing {
    SpecSizing {
        width: 500,
        height: Some(300),
        is_full_screen: false,
        use_container_width: false,
    }
}

fn build(builder: &SpecBuilder, spec: Value, mode: ThemeMode, selectors: &[String]) -> Value {
    builder
        .build(&spec.to_string(), &ChartTheme::dark(), mode, sizing(), selectors)
        .expect("build spec")
}

#[test]
fn inline_datasets_are_rejected() {
    let result = SpecBuilder::default().build(
        &json!({"datasets": {"a": [{"x": 1}]}}).to_string(),
        &ChartTheme::light(),
        ThemeMode::Default,
        sizing(),
        &[],
    );
    assert!(matches!(result, Err(ChartError::InvalidSpec(_))));

    // A falsy reserved key carries no data and is accepted.
    let built = build(
        &SpecBuilder::default(),
        json!({"datasets": null, "mark": "bar"}),
        ThemeMode::Default,
        &[],
    );
    assert_eq!(built["mark"], json!("bar"));
}

#[test]
fn invalid_json_is_an_invalid_spec() {
    let result = SpecBuilder::default().build(
        "{not json",
        &ChartTheme::light(),
        ThemeMode::Default,
        sizing(),
        &[],
    );
    assert!(matches!(result, Err(ChartError::InvalidSpec(_))));
}

#[test]
fn host_theme_mode_applies_full_theme_and_keeps_user_config() {
    let built = build(
        &SpecBuilder::default(),
        json!({"config": {"axis": {"labelColor": "red"}}}),
        ThemeMode::Host,
        &[],
    );
    assert_eq!(built["config"]["background"], json!("#0e1117"));
    assert_eq!(built["config"]["axis"]["labelColor"], json!("red"));
    assert_eq!(built["config"]["axis"]["gridColor"], json!("#31333f"));
}

#[test]
fn default_theme_mode_only_adds_compatibility_defaults() {
    let built = build(
        &SpecBuilder::default(),
        json!({"config": {"background": "pink"}}),
        ThemeMode::Default,
        &[],
    );
    assert_eq!(built["config"]["background"], json!("pink"));
    assert!(built["config"].get("range").is_none());
    assert_eq!(built["config"]["view"]["continuousWidth"], json!(400));
}

#[test]
fn embedded_theme_request_is_honored_and_stripped() {
    let built = build(
        &SpecBuilder::default(),
        json!({"usermeta": {"embedOptions": {"theme": "streamlit", "actions": false}}}),
        ThemeMode::Default,
        &[],
    );
    assert_eq!(built["config"]["background"], json!("#0e1117"));
    assert_eq!(built["usermeta"]["embedOptions"], json!({"actions": false}));
}

#[test]
fn container_width_sets_width_only() {
    let built = SpecBuilder::default()
        .build(
            &json!({"height": 120, "vconcat": [{"mark": "bar"}]}).to_string(),
            &ChartTheme::light(),
            ThemeMode::Default,
            SpecSizing {
                use_container_width: true,
                ..sizing()
            },
            &[],
        )
        .expect("build spec");
    assert_eq!(built["width"], json!(500));
    assert_eq!(built["height"], json!(120));
    assert_eq!(built["vconcat"][0]["width"], json!(500));
}

#[test]
fn selection_preparer_runs_once_only_with_selectors() {
    let preparer = CountingPreparer::default();
    let builder = SpecBuilder::default().with_selection_preparer(preparer.clone());

    let built = build(&builder, json!({"mark": "point"}), ThemeMode::Default, &[]);
    assert_eq!(preparer.calls.get(), 0);
    assert!(built.get("prepared").is_none());

    let built = build(
        &builder,
        json!({"mark": "point"}),
        ThemeMode::Default,
        &["brush".to_owned(), "legend".to_owned()],
    );
    assert_eq!(preparer.calls.get(), 1);
    assert_eq!(built["prepared"], json!(true));
}

#[test]
fn build_for_reads_sizing_from_props() {
    let element = ChartElement::new(r#"{"mark": "line"}"#).with_container_width(true);
    let props = ChartProps::new(element, ChartTheme::light(), 720)
        .with_height(Some(240))
        .with_full_screen(true);
    let built = SpecBuilder::new(32).build_for(&props).expect("build spec");

    assert_eq!(built["width"], json!(720));
    assert_eq!(built["height"], json!(240));
    assert_eq!(built["padding"], json!({"bottom": 32}));
}
