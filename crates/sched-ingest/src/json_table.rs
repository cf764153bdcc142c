use serde_json::Value;

use sched_model::{ParsedInput, Row};

use crate::error::{IngestError, Result};

/// Parses a JSON document into rows.
///
/// An array of objects takes its columns from the first object's keys, in
/// document order. A single object becomes one row without columns, so it
/// carries an empty fingerprint and only feeds same-named field lookups.
pub fn parse_json(content: &str) -> Result<ParsedInput> {
    let document: Value = serde_json::from_str(content)?;
    match document {
        Value::Array(items) => {
            let columns: Vec<String> = match items.first() {
                Some(Value::Object(first)) => first.keys().cloned().collect(),
                _ => Vec::new(),
            };
            let mut rows = Vec::with_capacity(items.len());
            for (idx, item) in items.into_iter().enumerate() {
                match item {
                    Value::Object(object) => rows.push(object.into_iter().collect::<Row>()),
                    other => {
                        return Err(IngestError::JsonLayout {
                            reason: format!("element {idx} is {}", kind_of(&other)),
                        });
                    }
                }
            }
            Ok(ParsedInput::new(columns, rows))
        }
        Value::Object(object) => Ok(ParsedInput::new(
            Vec::new(),
            vec![object.into_iter().collect::<Row>()],
        )),
        other => Err(IngestError::JsonLayout {
            reason: format!("top-level value is {}", kind_of(&other)),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_of_objects_keeps_key_order() {
        let parsed = parse_json(
            r#"[{"Visit": "Screening", "Day": -14}, {"Visit": "Baseline", "Day": 0}]"#,
        )
        .unwrap();
        assert_eq!(parsed.columns(), ["Visit", "Day"]);
        assert_eq!(parsed.row_count(), 2);
        assert_eq!(parsed.rows()[1]["Day"], Value::from(0));
    }

    #[test]
    fn single_object_is_one_row_without_columns() {
        let parsed = parse_json(r#"{"visit_name": "Screening"}"#).unwrap();
        assert!(parsed.columns().is_empty());
        assert_eq!(parsed.row_count(), 1);
        assert_eq!(parsed.fingerprint(), "");
    }

    #[test]
    fn rejects_scalar_elements() {
        let err = parse_json(r#"[{"Visit": "A"}, 3]"#).unwrap_err();
        assert!(matches!(err, IngestError::JsonLayout { .. }));
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(parse_json("{not json"), Err(IngestError::Json(_))));
    }
}
