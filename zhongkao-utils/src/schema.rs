//! Response schemas for structured output.
//!
//! The record types derive [`schemars::JsonSchema`]; this module rewrites that
//! JSON Schema into the OpenAPI subset Gemini's `responseSchema` accepts
//! (upper-case type names, no `$ref`, `nullable` instead of `["x", "null"]`).

use schemars::JsonSchema;
use serde_json::{Map, Value, json};

pub fn response_schema<T: JsonSchema>() -> Value {
    let root = match serde_json::to_value(schemars::schema_for!(T)) {
        Ok(root) => root,
        Err(e) => {
            log::error!("could not serialize schema: {e:?}");
            return Value::Null;
        }
    };
    let defs = root
        .get("$defs")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    convert(&root, &defs)
}

/// Mark an optional top-level property as required anyway, so the model is
/// told to always fill it in.
pub fn with_required(mut schema: Value, property: &str) -> Value {
    if let Some(object) = schema.as_object_mut() {
        let required = object
            .entry("required")
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Some(required) = required.as_array_mut() {
            if !required.iter().any(|r| r == property) {
                required.push(Value::String(property.to_string()));
            }
        }
    }
    schema
}

fn convert(node: &Value, defs: &Map<String, Value>) -> Value {
    let Some(object) = node.as_object() else {
        return json!({ "type": "STRING" });
    };

    if let Some(target) = object.get("$ref").and_then(Value::as_str) {
        let name = target.rsplit('/').next().unwrap_or(target);
        return match defs.get(name) {
            Some(def) => convert(def, defs),
            None => {
                log::warn!("unresolved schema reference {target}");
                json!({ "type": "STRING" })
            }
        };
    }

    for key in ["anyOf", "oneOf"] {
        if let Some(variants) = object.get(key).and_then(Value::as_array) {
            let nullable = variants.iter().any(is_null_schema);
            let Some(inner) = variants.iter().find(|v| !is_null_schema(v)) else {
                return json!({ "type": "STRING", "nullable": true });
            };
            let mut converted = convert(inner, defs);
            if nullable {
                converted["nullable"] = Value::Bool(true);
            }
            return converted;
        }
    }

    let (type_name, nullable) = match object.get("type") {
        Some(Value::String(t)) => (t.as_str(), false),
        Some(Value::Array(types)) => {
            let nullable = types.iter().any(|t| t == "null");
            let first = types
                .iter()
                .filter_map(Value::as_str)
                .find(|t| *t != "null")
                .unwrap_or("string");
            (first, nullable)
        }
        _ => ("string", false),
    };

    let mut out = Map::new();
    match type_name {
        "object" => {
            out.insert("type".into(), "OBJECT".into());
            let mut properties = Map::new();
            if let Some(props) = object.get("properties").and_then(Value::as_object) {
                for (name, prop) in props {
                    properties.insert(name.clone(), convert(prop, defs));
                }
            }
            let required: Vec<Value> = object
                .get("required")
                .and_then(Value::as_array)
                .map(|r| {
                    r.iter()
                        .filter(|name| {
                            name.as_str()
                                .is_some_and(|name| properties.contains_key(name))
                        })
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            out.insert("properties".into(), Value::Object(properties));
            if !required.is_empty() {
                out.insert("required".into(), Value::Array(required));
            }
        }
        "array" => {
            out.insert("type".into(), "ARRAY".into());
            let items = object
                .get("items")
                .map(|items| convert(items, defs))
                .unwrap_or_else(|| json!({ "type": "STRING" }));
            out.insert("items".into(), items);
        }
        "integer" => {
            out.insert("type".into(), "INTEGER".into());
        }
        "number" => {
            out.insert("type".into(), "NUMBER".into());
        }
        "boolean" => {
            out.insert("type".into(), "BOOLEAN".into());
        }
        _ => {
            out.insert("type".into(), "STRING".into());
            if let Some(values) = object.get("enum") {
                out.insert("enum".into(), values.clone());
            }
        }
    }

    if let Some(description) = object.get("description") {
        out.insert("description".into(), description.clone());
    }
    if nullable {
        out.insert("nullable".into(), Value::Bool(true));
    }
    Value::Object(out)
}

fn is_null_schema(schema: &Value) -> bool {
    schema.get("type").is_some_and(|t| t == "null")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{McqData, MimicFeedback, MimicPassage, RawClozeExercise, RawClozeTest, WordData};

    fn required(schema: &Value) -> Vec<&str> {
        schema["required"]
            .as_array()
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    #[test]
    fn word_schema_uses_wire_names() {
        let schema = response_schema::<WordData>();
        assert_eq!(schema["type"], "OBJECT");
        assert_eq!(schema["properties"]["definitionCN"]["type"], "STRING");
        assert_eq!(schema["properties"]["exampleSentence"]["type"], "STRING");
        assert_eq!(schema["properties"]["collocations"]["type"], "ARRAY");
        assert_eq!(
            schema["properties"]["collocations"]["items"]["type"],
            "STRING"
        );

        let required = required(&schema);
        assert!(required.contains(&"word"));
        assert!(required.contains(&"mnemonics"));
        assert!(!required.contains(&"confusingWordsSnippet"));
        assert_eq!(
            schema["properties"]["confusingWordsSnippet"]["nullable"],
            true
        );
    }

    #[test]
    fn optional_fields_can_be_forced_required() {
        let schema = with_required(response_schema::<WordData>(), "confusingWordsSnippet");
        assert!(required(&schema).contains(&"confusingWordsSnippet"));
        let again = with_required(schema.clone(), "confusingWordsSnippet");
        assert_eq!(again, schema);
    }

    #[test]
    fn nested_records_are_inlined() {
        let schema = response_schema::<McqData>();
        let question = &schema["properties"]["questions"]["items"];
        assert_eq!(question["type"], "OBJECT");
        assert!(question.get("$ref").is_none());
        let mut fields = required(question);
        fields.sort_unstable();
        assert_eq!(fields, vec!["analysis", "answer", "options", "question"]);
    }

    #[test]
    fn numbers_and_integers_are_distinguished() {
        let feedback = response_schema::<MimicFeedback>();
        assert_eq!(feedback["properties"]["score"]["type"], "NUMBER");

        let cloze = response_schema::<RawClozeTest>();
        assert_eq!(
            cloze["properties"]["blanks"]["items"]["properties"]["id"]["type"],
            "INTEGER"
        );
    }

    #[test]
    fn raw_cloze_exercise_is_camel_case() {
        let schema = response_schema::<RawClozeExercise>();
        assert_eq!(schema["properties"]["taggedContent"]["type"], "STRING");
        let passage = response_schema::<MimicPassage>();
        assert!(required(&passage).contains(&"contentEN"));
    }

    #[test]
    fn type_arrays_become_nullable() {
        let defs = Map::new();
        let converted = convert(&json!({ "type": ["integer", "null"] }), &defs);
        assert_eq!(converted, json!({ "type": "INTEGER", "nullable": true }));
    }
}
