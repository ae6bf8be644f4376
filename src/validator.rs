//! Record validation against schemas from the store.

use serde_json::Value;

use crate::error::{ValidateError, Violation};
use crate::loader::SchemaStore;
use crate::resolver::LocalRefResolver;
use crate::types::SCHEMA_KEY;

/// Validate a record against a schema from `store`.
///
/// With `schema_name` set to `None` the record must name its own schema
/// in its `$schema` key.
///
/// # Errors
///
/// Returns `ValidateError::SchemaKeyNotFound` if no schema can be named,
/// `ValidateError::Load` if the schema or one of its references can't be
/// loaded, `ValidateError::InvalidSchema` if the schema itself is broken,
/// and `ValidateError::Invalid` with the first violation if the record
/// does not conform.
pub fn validate(
    store: &SchemaStore,
    data: &Value,
    schema_name: Option<&str>,
) -> Result<(), ValidateError> {
    let name = match schema_name {
        Some(name) => name,
        None => data
            .get(SCHEMA_KEY)
            .and_then(Value::as_str)
            .ok_or(ValidateError::SchemaKeyNotFound)?,
    };

    tracing::debug!(schema = name, "validating record");
    let schema = store.load_schema(name)?;
    let resolved = LocalRefResolver::from_schema(&schema).resolve()?;

    validate_against_schema(&resolved, data)
}

/// Validate a record against an already-resolved schema document.
///
/// Stops at the first violation.
pub fn validate_against_schema(schema: &Value, data: &Value) -> Result<(), ValidateError> {
    let validator =
        jsonschema::validator_for(schema).map_err(|e| ValidateError::InvalidSchema {
            message: e.to_string(),
        })?;

    let first = validator.iter_errors(data).next();
    match first {
        Some(e) => {
            let violation = Violation {
                path: e.instance_path.to_string(),
                message: e.to_string(),
            };
            tracing::debug!(path = %violation.path, "record rejected: {}", violation.message);
            Err(ValidateError::Invalid(violation))
        }
        None => Ok(()),
    }
}
