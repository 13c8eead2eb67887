//! Structural validation of model documents.

use std::sync::OnceLock;

use jsonschema::Validator;
use serde_json::{json, Value};

use crate::error::SchemaError;

/// JSON Schema describing a model document.
pub fn model_document_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": ["types"],
        "properties": {
            "types": { "type": "array", "items": { "$ref": "#/$defs/type" } }
        },
        "$defs": {
            "type": {
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": { "type": "string", "minLength": 1 },
                    "kind": { "enum": ["class", "interface"] },
                    "annotations": { "$ref": "#/$defs/annotations" },
                    "interfaces": { "type": "array", "items": { "type": "string" } },
                    "members": { "type": "array", "items": { "$ref": "#/$defs/member" } }
                }
            },
            "member": {
                "type": "object",
                "required": ["name", "type"],
                "properties": {
                    "name": { "type": "string", "minLength": 1 },
                    "type": { "type": "string" },
                    "annotations": { "$ref": "#/$defs/annotations" }
                }
            },
            "annotations": { "type": "array", "items": { "$ref": "#/$defs/annotation" } },
            "annotation": {
                "type": "object",
                "required": ["kind"],
                "properties": {
                    "kind": {
                        "enum": [
                            "container", "converter", "buddy", "property",
                            "ignore", "data_contract", "data_member"
                        ]
                    }
                },
                "allOf": [
                    {
                        "if": { "properties": { "kind": { "const": "container" } } },
                        "then": {
                            "properties": {
                                "member_serialization": { "enum": ["opt_in", "opt_out"] },
                                "is_reference": { "type": "boolean" }
                            }
                        }
                    },
                    {
                        "if": { "properties": { "kind": { "const": "converter" } } },
                        "then": {
                            "required": ["converter"],
                            "properties": {
                                "converter": { "type": "string", "minLength": 1 },
                                "args": { "type": "array" }
                            }
                        }
                    },
                    {
                        "if": { "properties": { "kind": { "const": "buddy" } } },
                        "then": {
                            "required": ["type"],
                            "properties": { "type": { "type": "string", "minLength": 1 } }
                        }
                    },
                    {
                        "if": { "properties": { "kind": { "const": "property" } } },
                        "then": {
                            "properties": {
                                "name": { "type": "string" },
                                "required": { "type": "boolean" },
                                "order": { "type": "integer" }
                            }
                        }
                    }
                ]
            }
        }
    })
}

fn model_validator() -> Option<&'static Validator> {
    static VALIDATOR: OnceLock<Option<Validator>> = OnceLock::new();
    VALIDATOR
        .get_or_init(|| match jsonschema::validator_for(&model_document_schema()) {
            Ok(validator) => Some(validator),
            Err(e) => {
                log::warn!("model document schema failed to compile: {}", e);
                None
            }
        })
        .as_ref()
}

/// Validate a model document against [`model_document_schema`].
///
/// Returns every violation found, each with the JSON Pointer of the
/// offending value.
pub fn validate_model_document(document: &Value) -> Result<(), Vec<SchemaError>> {
    let Some(validator) = model_validator() else {
        return Ok(());
    };

    let errors: Vec<SchemaError> = validator
        .iter_errors(document)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
