//! Structured-output schema for study plans.
//!
//! Every property listed is required; a reply missing any of them is
//! rejected when parsed into [`crate::models::StudyPlanResponse`].

use serde_json::{Value, json};

pub const STUDY_PLAN_SCHEMA_NAME: &str = "study_plan";

/// Schema in the OpenAPI subset accepted by Gemini's `responseSchema`
pub fn study_plan_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "planName": { "type": "string" },
            "totalDays": { "type": "integer" },
            "schedule": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "day": { "type": "integer" },
                        "topic": { "type": "string" },
                        "summary": { "type": "string" },
                        "flashcards": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "front": { "type": "string" },
                                    "back": { "type": "string" }
                                },
                                "required": ["front", "back"]
                            }
                        },
                        "quiz": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "question": { "type": "string" },
                                    "options": {
                                        "type": "array",
                                        "items": { "type": "string" }
                                    },
                                    "correctAnswerIndex": { "type": "integer" }
                                },
                                "required": ["question", "options", "correctAnswerIndex"]
                            }
                        }
                    },
                    "required": ["day", "topic", "summary", "flashcards", "quiz"]
                }
            }
        },
        "required": ["planName", "totalDays", "schedule"]
    })
}

/// Copy of `schema` with `additionalProperties: false` on every object, as
/// strict JSON-schema modes require
pub fn strict_schema(schema: &Value) -> Value {
    let mut strict = schema.clone();
    close_objects(&mut strict);
    strict
}

fn close_objects(node: &mut Value) {
    match node {
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some("object") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
            }
            for child in map.values_mut() {
                close_objects(child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(close_objects),
        _ => {}
    }
}
