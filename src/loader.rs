//! Model loading from files and strings.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ModelError;
use crate::model::{TypeDescriptor, TypeModel};
use crate::validator::validate_model_document;

#[derive(Debug, Deserialize)]
struct ModelDocument {
    types: Vec<TypeDescriptor>,
}

/// Load a JSON document from a file path.
///
/// # Errors
///
/// Returns `ModelError::FileNotFound` if the file doesn't exist,
/// or `ModelError::InvalidJson` if the file isn't valid JSON.
pub fn load_document(path: &Path) -> Result<Value, ModelError> {
    if !path.exists() {
        return Err(ModelError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ModelError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| ModelError::InvalidJson { source })
}

/// Load a type model from a file path.
///
/// # Errors
///
/// Returns `ModelError` if the file can't be read, isn't valid JSON, or
/// doesn't describe a valid model.
pub fn load_model(path: &Path) -> Result<TypeModel, ModelError> {
    let document = load_document(path)?;
    model_from_value(&document)
}

/// Load a type model from a JSON string.
///
/// # Errors
///
/// Returns `ModelError::InvalidJson` if the string isn't valid JSON, or
/// another `ModelError` if it doesn't describe a valid model.
pub fn load_model_str(content: &str) -> Result<TypeModel, ModelError> {
    let document: Value =
        serde_json::from_str(content).map_err(|source| ModelError::InvalidJson { source })?;
    model_from_value(&document)
}

/// Build a type model from a parsed model document.
///
/// # Errors
///
/// Returns `ModelError::InvalidModel` with every structural violation, or
/// `ModelError::DuplicateType` if a type name repeats.
pub fn model_from_value(document: &Value) -> Result<TypeModel, ModelError> {
    validate_model_document(document).map_err(|errors| ModelError::InvalidModel { errors })?;

    let document = ModelDocument::deserialize(document)
        .map_err(|source| ModelError::InvalidJson { source })?;

    let builder = document
        .types
        .into_iter()
        .fold(TypeModel::builder(), |builder, ty| builder.add(ty));
    let model = builder.build()?;
    log::debug!("loaded model with {} type(s)", model.len());
    Ok(model)
}
