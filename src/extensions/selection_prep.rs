use serde_json::{Map, Value};

/// Rewrites a spec so its selection parameters report selected points
/// through observable signals.
pub trait SelectionSpecPreparer {
    fn prepare(&self, spec: &mut Value);
}

/// Default preparer for single-view specs with top-level `params`.
///
/// - shorthand `"select": "point" | "interval"` becomes `{"type": ...}`
/// - point selections without `encodings` get every encoding channel of the
///   spec, so the selected points arrive under `vlPoint.or`
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodingSelectionPreparer;

impl SelectionSpecPreparer for EncodingSelectionPreparer {
    fn prepare(&self, spec: &mut Value) {
        let Some(root) = spec.as_object_mut() else {
            return;
        };
        let channels: Vec<Value> = match root.get("encoding").and_then(Value::as_object) {
            Some(encoding) => encoding.keys().cloned().map(Value::String).collect(),
            None => return,
        };
        let Some(params) = root.get_mut("params").and_then(Value::as_array_mut) else {
            return;
        };

        for param in params.iter_mut().filter_map(Value::as_object_mut) {
            let Some(select) = param.get_mut("select") else {
                continue;
            };
            if let Some(kind) = select.as_str().filter(|kind| matches!(*kind, "point" | "interval"))
            {
                let mut expanded = Map::new();
                expanded.insert("type".to_owned(), Value::String(kind.to_owned()));
                *select = Value::Object(expanded);
            }
            let Some(select) = select.as_object_mut() else {
                continue;
            };
            let is_point = select.get("type").and_then(Value::as_str) == Some("point");
            let has_encodings = select.get("encodings").is_some_and(|value| !value.is_null());
            if is_point && !has_encodings {
                select.insert("encodings".to_owned(), Value::Array(channels.clone()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{EncodingSelectionPreparer, SelectionSpecPreparer};

    #[test]
    fn shorthand_point_selection_gets_spec_encodings() {
        let mut spec = json!({
            "mark": "point",
            "encoding": {"x": {"field": "a"}, "color": {"field": "b"}},
            "params": [
                {"name": "pick", "select": "point"},
                {"name": "brush", "select": "interval"},
                {"name": "size", "value": 3},
            ],
        });
        EncodingSelectionPreparer.prepare(&mut spec);

        assert_eq!(
            spec["params"][0]["select"],
            json!({"type": "point", "encodings": ["x", "color"]})
        );
        assert_eq!(spec["params"][1]["select"], json!({"type": "interval"}));
        assert_eq!(spec["params"][2], json!({"name": "size", "value": 3}));
    }

    #[test]
    fn explicit_encodings_and_fields_free_specs_are_untouched() {
        let mut spec = json!({
            "encoding": {"x": {"field": "a"}},
            "params": [{"name": "pick", "select": {"type": "point", "encodings": ["y"]}}],
        });
        let before = spec.clone();
        EncodingSelectionPreparer.prepare(&mut spec);
        assert_eq!(spec, before);

        let mut layered = json!({"layer": [], "params": [{"name": "p", "select": "point"}]});
        let before = layered.clone();
        EncodingSelectionPreparer.prepare(&mut layered);
        assert_eq!(layered, before);
    }
}
