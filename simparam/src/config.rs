//! JSON overrides for description elements.
//!
//! ```json
//! {
//!   "type": "bullet",
//!   "max_step_size": 0.004,
//!   "gravity": [0, 0, -1.62]
//! }
//! ```
//!
//! Keys name an attribute or a child element. Nested objects descend into the
//! child element of that name. Values are converted to their canonical string
//! form and applied through the parameter's own string parser.

use serde_json::Value;

use crate::element::Element;
use crate::error::{ParamError, Result};

/// Apply a JSON object of overrides to `element`. Returns the number of
/// parameters written.
///
/// Overrides are applied in document order and stop at the first failure;
/// earlier overrides stay applied.
pub fn apply_json_overrides(element: &Element, json: &str) -> Result<usize> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| ParamError::Config(e.to_string()))?;
    apply_value(element, &value)
}

/// Apply an already parsed JSON object of overrides to `element`.
pub fn apply_value(element: &Element, value: &Value) -> Result<usize> {
    let Value::Object(map) = value else {
        return Err(ParamError::Config(format!(
            "overrides for <{}> must be an object",
            element.name()
        )));
    };

    let mut applied = 0;
    for (key, value) in map {
        if let Value::Object(_) = value {
            let child = element.get_element(key).ok_or_else(|| unknown(element, key))?;
            applied += apply_value(&child, value)?;
            continue;
        }

        let text = to_param_string(key, value)?;
        let param = match element.attribute(key) {
            Some(attr) => attr,
            None => element
                .get_element(key)
                .and_then(|child| child.value())
                .ok_or_else(|| unknown(element, key))?,
        };
        param
            .write()
            .try_set_from_string(&text)
            .map_err(|e| ParamError::Config(e.to_string()))?;
        tracing::debug!("Override <{}> {} = {}", element.name(), key, text);
        applied += 1;
    }
    Ok(applied)
}

fn unknown(element: &Element, key: &str) -> ParamError {
    ParamError::Config(format!(
        "<{}> has no attribute or child [{}]",
        element.name(),
        key
    ))
}

fn to_param_string(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s.clone()),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Number(n) => Ok(n.to_string()),
                _ => Err(ParamError::Config(format!(
                    "[{key}] arrays may only contain numbers"
                ))),
            })
            .collect::<Result<Vec<_>>>()
            .map(|parts| parts.join(" ")),
        Value::Null | Value::Object(_) => Err(ParamError::Config(format!(
            "[{key}] has no string form"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector3;
    use crate::value::ValueKind;

    #[test]
    fn test_apply_overrides() {
        let physics = Element::physics_template(None).unwrap();
        let applied = apply_json_overrides(
            &physics,
            r#"{ "type": "bullet", "max_step_size": 0.004, "max_contacts": 10,
                 "gravity": [0, 0, -1.62], "default": true }"#,
        )
        .unwrap();
        assert_eq!(applied, 5);
        assert_eq!(physics.get::<String>("type").unwrap(), "bullet");
        assert_eq!(physics.get::<f64>("max_step_size").unwrap(), 0.004);
        assert_eq!(physics.get::<i32>("max_contacts").unwrap(), 10);
        assert!(physics.get::<bool>("default").unwrap());
        assert_eq!(
            physics.get::<Vector3>("gravity").unwrap(),
            Vector3::new(0.0, 0.0, -1.62)
        );
    }

    #[test]
    fn test_string_vector_override() {
        let physics = Element::physics_template(None).unwrap();
        apply_json_overrides(&physics, r#"{ "magnetic_field": "0 0 0" }"#).unwrap();
        assert_eq!(physics.get::<Vector3>("magnetic_field").unwrap(), Vector3::ZERO);
    }

    #[test]
    fn test_nested_object() {
        let physics = Element::physics_template(None).unwrap();
        let mut iters = Element::new("iters");
        iters.add_value(ValueKind::Int, "50", false, "", None).unwrap();
        let ode = Element::new("ode").into_ptr();
        ode.add_child(iters.into_ptr());
        physics.add_child(ode);

        let applied = apply_json_overrides(
            &physics,
            r#"{ "real_time_factor": 2, "ode": { "iters": 80 } }"#,
        )
        .unwrap();
        assert_eq!(applied, 2);
        let ode = physics.get_element("ode").unwrap();
        assert_eq!(ode.get::<i32>("iters").unwrap(), 80);
        assert!(matches!(
            apply_json_overrides(&physics, r#"{ "ode": { "sor": 1.3 } }"#),
            Err(ParamError::Config(_))
        ));
    }

    #[test]
    fn test_document_order() {
        let physics = Element::physics_template(None).unwrap();
        // "max_step_size" sorts after "gravity" but comes first in the document
        let result = apply_json_overrides(
            &physics,
            r#"{ "max_step_size": 0.5, "gravity": [1], "default": true }"#,
        );
        assert!(matches!(result, Err(ParamError::Config(_))));
        assert_eq!(physics.get::<f64>("max_step_size").unwrap(), 0.5);
        assert!(!physics.get::<bool>("default").unwrap());
    }

    #[test]
    fn test_rejected_overrides() {
        let physics = Element::physics_template(None).unwrap();
        for json in [
            r#"{ "solver": 1 }"#,
            r#"{ "max_contacts": 1.5 }"#,
            r#"{ "gravity": [0, 0] }"#,
            r#"{ "gravity": ["a", "b", "c"] }"#,
            r#"{ "max_step_size": null }"#,
            r#"[1, 2, 3]"#,
            "not json",
        ] {
            assert!(
                matches!(apply_json_overrides(&physics, json), Err(ParamError::Config(_))),
                "{json} should be rejected"
            );
        }
        assert_eq!(physics.get::<i32>("max_contacts").unwrap(), 20);
    }
}
